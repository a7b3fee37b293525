use std::path::Path;

use anyhow::{bail, Context};

use crate::anki::{AnkiClient, NoteSpec};
use crate::gate::ask_confirmation;
use crate::providers::openai::CHAT_MODEL;
use crate::providers::{generate_typed, ModelProvider, OutputSchema, TextRequest};
use crate::tts::SpeechClient;
use crate::types::{card_list_schema, CardList, Message};

pub const TEACH_INSTRUCTIONS_TEMPLATE: &str = "You are a helpful assistant that generates flashcards in {lang}. \
Provide a list of cards where the front is a question and the back is the answer. \
The answer field should be brief- no longer than 5 words. \
Questions should have a single correct answer. \
'Give an example of a Coelomate' is a bad question since there is not a unique answer. \
A better question would be: 'Are flatworms Coelomates, Pseudocoelomates, or Acoelomates? \
Use the question field to give background or provide inspiration. Instead of 'What does GNU stand for?', \
opt for 'GNU is an example of a recursive acronym. What does it stand for?' ";

pub const SUMMARIZE_INSTRUCTIONS: &str = "You are a pedagogical assistant. The user will provide some learning material. \
Please make a list of 10 flash cards about the facts presented in the material. \
The answer field should not have more than 4 words. ";

fn card_list_output() -> OutputSchema {
    OutputSchema {
        name: "card_list",
        schema: card_list_schema(),
    }
}

fn print_cards(cards: &CardList) {
    for card in &cards.cards {
        println!("{}\t{}", card.front, card.back);
    }
}

pub async fn translate_items(
    provider: &dyn ModelProvider,
    texts: &str,
    source_language: &str,
    target_language: &str,
) -> anyhow::Result<CardList> {
    let instructions = format!(
        "You are a {source_language} to {target_language} translator of sentence lists. \
Provide the original sentences on the front and the translations on the back. "
    );
    let req = TextRequest {
        model: CHAT_MODEL.to_string(),
        messages: vec![Message::system(instructions), Message::user(texts)],
    };
    generate_typed::<CardList>(provider, &req, &card_list_output()).await
}

pub async fn insert_into_anki(
    anki: &AnkiClient,
    speech: &SpeechClient,
    cards: &CardList,
    front_language: &str,
    back_language: &str,
) -> anyhow::Result<()> {
    for card in &cards.cards {
        println!("{}\t{}", card.front, card.back);
        let front_sound = speech.tts_to_anki_media(&card.front, front_language).await?;
        let back_sound = speech.tts_to_anki_media(&card.back, back_language).await?;
        anki.add_note(&NoteSpec {
            deck: front_language.to_string(),
            front: card.front.clone(),
            back: card.back.clone(),
            front_sound,
            back_sound,
        })
        .await?;
    }
    Ok(())
}

// Shared shape of lecture/vocab/vocabfile: sentences in the front language,
// confirmed by the operator, then translated and inserted.
async fn run_sentence_pipeline(
    provider: &dyn ModelProvider,
    anki: &AnkiClient,
    speech: &SpeechClient,
    sentences_prompt: String,
    front_language: &str,
    back_language: &str,
) -> anyhow::Result<()> {
    anki.ensure_deck(front_language).await?;

    let req = TextRequest {
        model: CHAT_MODEL.to_string(),
        messages: vec![Message::system(sentences_prompt)],
    };
    let raw = provider.generate_text(&req).await?;
    println!("{raw}");
    if !ask_confirmation("Continue?") {
        bail!("cancelled by user");
    }
    let translations = translate_items(provider, &raw, front_language, back_language).await?;
    print_cards(&translations);
    insert_into_anki(anki, speech, &translations, front_language, back_language).await
}

pub async fn teach(
    provider: &dyn ModelProvider,
    anki: &AnkiClient,
    speech: &SpeechClient,
    language: &str,
    topic: &str,
) -> anyhow::Result<()> {
    anki.ensure_deck(language).await?;

    let instructions = TEACH_INSTRUCTIONS_TEMPLATE.replace("{lang}", language);
    let req = TextRequest {
        model: CHAT_MODEL.to_string(),
        messages: vec![
            Message::system(instructions),
            Message::user(format!("Generate flashcards in {language} about: {topic}.")),
        ],
    };
    let cards = generate_typed::<CardList>(provider, &req, &card_list_output()).await?;
    print_cards(&cards);
    if !ask_confirmation("Continue?") {
        bail!("cancelled by user");
    }
    insert_into_anki(anki, speech, &cards, language, language).await
}

pub fn lecture_level_description(level: &str) -> Option<&'static str> {
    match level {
        "easy" => Some("children, aiming for ease of understanding"),
        "hard" => Some("graduate students"),
        _ => None,
    }
}

pub async fn lecture(
    provider: &dyn ModelProvider,
    anki: &AnkiClient,
    speech: &SpeechClient,
    level: &str,
    front_language: &str,
    back_language: &str,
    topic: &str,
) -> anyhow::Result<()> {
    let level_desc = lecture_level_description(level)
        .with_context(|| format!("unknown level '{level}', expected easy or hard"))?;
    let sentences_prompt = format!(
        "You are an expert teacher of {topic} in the {front_language} language. \
Provide a JSON list of strings, containing sentences about {topic} in {front_language}, \
suitable for {level_desc}. Focus on technical specifics instead of trivia, and avoid extra commentary or text."
    );
    run_sentence_pipeline(
        provider,
        anki,
        speech,
        sentences_prompt,
        front_language,
        back_language,
    )
    .await
}

pub async fn vocab(
    provider: &dyn ModelProvider,
    anki: &AnkiClient,
    speech: &SpeechClient,
    front_language: &str,
    back_language: &str,
    words: &str,
) -> anyhow::Result<()> {
    let sentences_prompt = format!(
        "You are an assistant that generates very short (5-11 word) trivia facts in {front_language}. \
Make a diverse JSON list of strings, and be sure to use the following vocab words 3 times each: {words}. \
You may change the form of the vocab words as needed to ensure the sentences are grammatical. \
For example, if the vocab word were 'brain', you might say 'Romans used mouse brains as toothpaste.' \
Do not add any extra formatting or text. "
    );
    run_sentence_pipeline(
        provider,
        anki,
        speech,
        sentences_prompt,
        front_language,
        back_language,
    )
    .await
}

pub const VOCAB_FILE_BATCH: usize = 2;

pub fn vocab_file_batch(content: &str) -> anyhow::Result<(Vec<String>, String)> {
    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if lines.is_empty() {
        bail!("No words found in vocab file.");
    }
    let words: Vec<String> = lines.iter().take(VOCAB_FILE_BATCH).cloned().collect();
    // The top word is consumed; the rest of the list is written back.
    let remaining = lines[1..]
        .iter()
        .map(|l| format!("{l}\n"))
        .collect::<String>();
    Ok((words, remaining))
}

pub async fn vocab_from_file(
    provider: &dyn ModelProvider,
    anki: &AnkiClient,
    speech: &SpeechClient,
    path: &Path,
    front_language: &str,
    back_language: &str,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading vocab file {}", path.display()))?;
    let (words, remaining) = vocab_file_batch(&content)?;
    let vocab_str = words.join(", ");
    let sentences_prompt = format!(
        "You are a helpful assistant that generates sentences for {front_language} learners. \
Provide a JSON list of sentences (each 3 to 7 words). \
The vocab in question is: {vocab_str}. Please create about 3 sentences, using these words a few times each. \
Avoid extra commentary or text."
    );
    run_sentence_pipeline(
        provider,
        anki,
        speech,
        sentences_prompt,
        front_language,
        back_language,
    )
    .await?;
    std::fs::write(path, remaining)
        .with_context(|| format!("failed rewriting vocab file {}", path.display()))?;
    Ok(())
}

pub async fn summarize(
    provider: &dyn ModelProvider,
    anki: &AnkiClient,
    speech: &SpeechClient,
    language: &str,
    path: &Path,
) -> anyhow::Result<()> {
    anki.ensure_deck(language).await?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading input file {}", path.display()))?;
    let req = TextRequest {
        model: CHAT_MODEL.to_string(),
        messages: vec![Message::system(SUMMARIZE_INSTRUCTIONS), Message::user(content)],
    };
    let cards = generate_typed::<CardList>(provider, &req, &card_list_output()).await?;
    insert_into_anki(anki, speech, &cards, language, language).await
}
