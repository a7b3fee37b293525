pub mod anki;

pub mod chat_loop;

pub mod cli_args;

pub mod cli_dispatch;

pub mod debug_loop;

pub mod directive;

pub mod exec;

pub mod flashcards;

pub mod gate;

pub mod keys;

pub mod providers;

pub mod rewrite;

pub mod session;

pub mod tts;

pub mod types;

pub mod ui;

pub use debug_loop::{classify_operator_input, run_debug_repl, run_exchange, OperatorCommand};

pub use directive::parse_directive;

pub use exec::{dispatch, render_result, Capture, CommandResult, CommandRunner, ShellRunner};

pub use gate::{ConfirmationGate, GateDecision, TerminalGate};

pub use providers::openai::OpenAiProvider;

pub use providers::{ModelProvider, OutputSchema, TextRequest};

pub use session::{Session, Turn, TurnRole, HISTORY_WINDOW};
