use std::io::{BufRead, Write};

use crate::ui::{RED, RESET};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Approved,
    Denied { reason: String },
}

pub trait ConfirmationGate {
    fn confirm(&mut self, description: &str) -> GateDecision;
}

#[derive(Debug, Default)]
pub struct TerminalGate;

impl TerminalGate {
    pub fn new() -> Self {
        Self
    }
}

impl ConfirmationGate for TerminalGate {
    fn confirm(&mut self, description: &str) -> GateDecision {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        confirm_with(&mut stdin.lock(), &mut stdout.lock(), description)
    }
}

pub fn ask_confirmation(query: &str) -> bool {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    ask_with(&mut stdin.lock(), &mut stdout.lock(), query)
}

// Re-prompts until a recognized answer arrives; malformed input never errors.
fn ask_with<R: BufRead, W: Write>(input: &mut R, output: &mut W, query: &str) -> bool {
    loop {
        let _ = write!(output, "{RED}{query} {RESET}[y/n]: ");
        let _ = output.flush();
        let mut line = String::new();
        match input.read_line(&mut line) {
            // Closed input stream counts as a refusal, not an approval.
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return true,
            "n" | "no" => return false,
            _ => {
                let _ = writeln!(output, "Please enter 'y' or 'n'.");
            }
        }
    }
}

fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    description: &str,
) -> GateDecision {
    if ask_with(input, output, description) {
        return GateDecision::Approved;
    }
    let _ = write!(output, "What was wrong? {RED}> {RESET}");
    let _ = output.flush();
    let mut reason = String::new();
    let _ = input.read_line(&mut reason);
    GateDecision::Denied {
        reason: reason.trim().to_string(),
    }
}
