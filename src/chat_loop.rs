use std::io::{BufRead, Write};

use crate::providers::{ModelProvider, TextRequest};
use crate::session::{to_wire_messages, Session, TurnRole, HISTORY_WINDOW};
use crate::tts::{play_audio_file, SpeechClient};
use crate::ui::{self, GREEN, RESET};

pub const CHAT_INSTRUCTIONS: &str = "You are a helpful chat assistant, specializing in pedagogy. ";

pub async fn run_chat_repl(
    provider: &dyn ModelProvider,
    speech: Option<&SpeechClient>,
    model: &str,
) -> anyhow::Result<()> {
    let mut session = Session::new();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    loop {
        write!(output, "{}", ui::operator_prompt())?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text == "wipe" {
            session.wipe();
            println!("{GREEN}Wiped chat history.{RESET}\n");
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }
        if text.is_empty() {
            continue;
        }
        session.append(TurnRole::Operator, text);

        let req = TextRequest {
            model: model.to_string(),
            messages: to_wire_messages(CHAT_INSTRUCTIONS, session.window(HISTORY_WINDOW)),
        };
        let reply = provider.generate_text(&req).await?;
        ui::print_reply(&reply);
        session.append(TurnRole::Assistant, reply.clone());

        if let Some(speech) = speech {
            // Playback problems should not end the conversation.
            if let Err(e) = speak_reply(speech, &reply).await {
                println!("Error playing TTS audio: {e:#}");
            }
        }
    }
    println!("Goodbye!");
    Ok(())
}

async fn speak_reply(speech: &SpeechClient, reply: &str) -> anyhow::Result<()> {
    let path = speech.tts_to_temp_file(reply).await?;
    play_audio_file(&path).await
}
