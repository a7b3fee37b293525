use clap::Parser;

use crate::anki::{AnkiClient, ANKI_CONNECT_URL};
use crate::chat_loop::run_chat_repl;
use crate::cli_args::{Cli, Commands, SpeechEngine};
use crate::debug_loop::run_debug_repl;
use crate::exec::ShellRunner;
use crate::flashcards;
use crate::gate::TerminalGate;
use crate::keys;
use crate::providers::http::HttpConfig;
use crate::providers::openai::{OpenAiProvider, CHAT_MODEL, DEFAULT_BASE_URL};
use crate::rewrite::{run_edit, run_rewrite};
use crate::tts::{play_audio_file, short_random_id, AzureSpeech, SpeechClient, DEFAULT_VOICE};

fn openai_provider() -> anyhow::Result<OpenAiProvider> {
    let api_key = keys::openai_key()?;
    OpenAiProvider::new(
        DEFAULT_BASE_URL.to_string(),
        api_key,
        HttpConfig::default(),
    )
}

fn speech_client(voice: &str) -> anyhow::Result<SpeechClient> {
    let api_key = keys::openai_key()?;
    SpeechClient::new(DEFAULT_BASE_URL.to_string(), api_key, voice.to_string())
}

fn anki_client() -> anyhow::Result<AnkiClient> {
    AnkiClient::new(ANKI_CONNECT_URL.to_string())
}

fn join_words(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

fn capitalized(language: &str) -> String {
    let trimmed = language.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Debug => {
            let provider = openai_provider()?;
            let mut gate = TerminalGate::new();
            let runner = ShellRunner::new();
            run_debug_repl(&provider, &mut gate, &runner, CHAT_MODEL).await
        }
        Commands::Chat => {
            let provider = openai_provider()?;
            run_chat_repl(&provider, None, CHAT_MODEL).await
        }
        Commands::Vchat => {
            let provider = openai_provider()?;
            let speech = speech_client(DEFAULT_VOICE)?;
            run_chat_repl(&provider, Some(&speech), CHAT_MODEL).await
        }
        Commands::Teach(args) => {
            let provider = openai_provider()?;
            let anki = anki_client()?;
            let speech = speech_client(DEFAULT_VOICE)?;
            let language = capitalized(&args.language);
            let topic = join_words(&args.topic);
            flashcards::teach(&provider, &anki, &speech, &language, &topic).await
        }
        Commands::Lecture(args) => {
            let provider = openai_provider()?;
            let anki = anki_client()?;
            let speech = speech_client(DEFAULT_VOICE)?;
            let front = capitalized(&args.front_language);
            let back = capitalized(&args.back_language);
            let topic = join_words(&args.topic);
            flashcards::lecture(
                &provider,
                &anki,
                &speech,
                args.level.as_str(),
                &front,
                &back,
                &topic,
            )
            .await
        }
        Commands::Vocab(args) => {
            let provider = openai_provider()?;
            let anki = anki_client()?;
            let speech = speech_client(DEFAULT_VOICE)?;
            let front = capitalized(&args.front_language);
            let back = capitalized(&args.back_language);
            let words = join_words(&args.words);
            flashcards::vocab(&provider, &anki, &speech, &front, &back, &words).await
        }
        Commands::Vocabfile(args) => {
            let provider = openai_provider()?;
            let anki = anki_client()?;
            let speech = speech_client(DEFAULT_VOICE)?;
            let front = capitalized(&args.front_language);
            let back = capitalized(&args.back_language);
            flashcards::vocab_from_file(&provider, &anki, &speech, &args.filepath, &front, &back)
                .await
        }
        Commands::Summarize(args) => {
            let provider = openai_provider()?;
            let anki = anki_client()?;
            let speech = speech_client(DEFAULT_VOICE)?;
            let language = capitalized(&args.language);
            flashcards::summarize(&provider, &anki, &speech, &language, &args.input_file).await
        }
        Commands::Rw(args) => {
            let provider = openai_provider()?;
            run_rewrite(&provider, &args.input_file).await
        }
        Commands::Edit(args) => {
            let provider = openai_provider()?;
            let prompt = join_words(&args.prompt);
            run_edit(&provider, &args.input_file, &prompt).await
        }
        Commands::Say(args) => {
            let text = join_words(&args.text);
            let out_path =
                std::env::temp_dir().join(format!("temp_tts_{}.mp3", short_random_id()));
            match args.engine {
                SpeechEngine::Openai => {
                    let speech = speech_client(&args.voice)?;
                    speech
                        .synthesize(
                            &text,
                            "Speak clearly and assertively in the appropriate language.",
                            &out_path,
                        )
                        .await?;
                }
                SpeechEngine::Azure => {
                    let mut azure = AzureSpeech::new(keys::azure_key()?, args.azure_voice)?;
                    azure.synthesize(&text, &out_path).await?;
                }
            }
            println!("Audio written to {}", out_path.display());
            play_audio_file(&out_path).await
        }
    }
}
