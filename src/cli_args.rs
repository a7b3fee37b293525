use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "aidesk",
    version,
    about = "Personal AI desk: gated debug shell, chat, flashcards, TTS, and code rewrites"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Debug assistant that may request gated shell commands
    Debug,

    /// Text chat assistant
    Chat,

    /// Chat assistant that speaks each reply
    Vchat,

    /// Generate Q/A flashcards about a topic and insert them into Anki
    Teach(TeachArgs),

    /// Generate level-graded sentences, translate them, insert into Anki
    Lecture(LectureArgs),

    /// Generate trivia sentences exercising given vocab words
    Vocab(VocabArgs),

    /// Run the vocab pipeline from the top of a word-list file
    Vocabfile(VocabFileArgs),

    /// Turn a file of learning material into flashcards
    Summarize(SummarizeArgs),

    /// Rewrite the marked section of a file with a model edit
    Rw(RwArgs),

    /// Whole-file edit into a .edited sibling, diffed with meld
    Edit(EditArgs),

    /// Synthesize one phrase to speech and play it
    Say(SayArgs),
}

#[derive(Debug, Parser)]
pub struct TeachArgs {
    /// The language for the flashcards
    #[arg(short, long)]
    pub language: String,

    #[arg(required = true)]
    pub topic: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LectureLevel {
    Easy,
    Hard,
}

impl LectureLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Hard => "hard",
        }
    }
}

#[derive(Debug, Parser)]
pub struct LectureArgs {
    /// Learning level
    #[arg(value_enum)]
    pub level: LectureLevel,

    /// The language for the front of the flashcards
    #[arg(short, long)]
    pub front_language: String,

    /// The language for the back of the flashcards
    #[arg(short, long)]
    pub back_language: String,

    #[arg(required = true)]
    pub topic: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct VocabArgs {
    /// The language for the front of the flashcards
    #[arg(short, long)]
    pub front_language: String,

    /// The language for the back of the flashcards
    #[arg(short, long)]
    pub back_language: String,

    /// Vocab words to exercise
    #[arg(required = true)]
    pub words: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct VocabFileArgs {
    /// File containing vocab entries, one per line
    pub filepath: PathBuf,

    /// The language for the front of the flashcards
    #[arg(short, long)]
    pub front_language: String,

    /// The language for the back of the flashcards
    #[arg(short, long)]
    pub back_language: String,
}

#[derive(Debug, Parser)]
pub struct SummarizeArgs {
    /// Deck and TTS language for the generated cards
    pub language: String,

    pub input_file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct RwArgs {
    pub input_file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct EditArgs {
    pub input_file: PathBuf,

    #[arg(required = true)]
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpeechEngine {
    Openai,
    Azure,
}

#[derive(Debug, Parser)]
pub struct SayArgs {
    #[arg(long, value_enum, default_value_t = SpeechEngine::Openai)]
    pub engine: SpeechEngine,

    /// OpenAI voice name
    #[arg(long, default_value = crate::tts::DEFAULT_VOICE)]
    pub voice: String,

    /// Azure neural voice name
    #[arg(long, default_value = "en-US-JennyNeural")]
    pub azure_voice: String,

    #[arg(required = true)]
    pub text: Vec<String>,
}
