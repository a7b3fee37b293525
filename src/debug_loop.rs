use std::io::{BufRead, Write};

use crate::directive::parse_directive;
use crate::exec::{dispatch, render_result, CommandRunner};
use crate::gate::ConfirmationGate;
use crate::providers::{ModelProvider, TextRequest};
use crate::session::{to_wire_messages, Session, TurnRole, HISTORY_WINDOW};
use crate::ui::{self, GREEN, RESET};

pub const DEBUG_INSTRUCTIONS: &str = "You are a debug assistant. \
To invoke a command, send a two-line reply. \
On the first line, use this syntax: 'SHELL: `ls ~`'. \
The command must be packed into one line, and the output will be provided to you for inspection. \
On the second line, in one sentence, explain your command. \
If no command is needed, simply respond in text. ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Wipe,
    Exit,
    Prompt(String),
}

pub fn classify_operator_input(line: &str) -> OperatorCommand {
    match line.trim() {
        "wipe" => OperatorCommand::Wipe,
        "exit" | "quit" => OperatorCommand::Exit,
        other => OperatorCommand::Prompt(other.to_string()),
    }
}

// One operator turn: query, then keep dispatching while the model keeps
// embedding directives. Control returns only on a directive-free reply.
pub async fn run_exchange(
    session: &mut Session,
    provider: &dyn ModelProvider,
    gate: &mut dyn ConfirmationGate,
    runner: &dyn CommandRunner,
    model: &str,
) -> anyhow::Result<String> {
    loop {
        let req = TextRequest {
            model: model.to_string(),
            messages: to_wire_messages(DEBUG_INSTRUCTIONS, session.window(HISTORY_WINDOW)),
        };
        let reply = provider.generate_text(&req).await?;
        ui::print_reply(&reply);
        session.append(TurnRole::Assistant, reply.clone());

        match parse_directive(&reply) {
            Some(command) => {
                let result = dispatch(gate, runner, command).await;
                session.append(TurnRole::Context, render_result(&result));
            }
            None => return Ok(reply),
        }
    }
}

pub async fn run_debug_repl(
    provider: &dyn ModelProvider,
    gate: &mut dyn ConfirmationGate,
    runner: &dyn CommandRunner,
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
        match classify_operator_input(&line) {
            OperatorCommand::Wipe => {
                session.wipe();
                println!("{GREEN}Wiped chat history.{RESET}\n");
            }
            OperatorCommand::Exit => break,
            OperatorCommand::Prompt(text) => {
                if text.is_empty() {
                    continue;
                }
                session.append(TurnRole::Operator, text);
                run_exchange(&mut session, provider, gate, runner, model).await?;
            }
        }
    }
    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::{classify_operator_input, run_exchange, OperatorCommand};
    use crate::exec::{Capture, CommandRunner};
    use crate::gate::{ConfirmationGate, GateDecision};
    use crate::providers::{ModelProvider, OutputSchema, TextRequest};
    use crate::session::{Session, TurnRole, HISTORY_WINDOW};
    use crate::types::Role;

    pub struct ScriptedProvider {
        replies: Mutex<VecDeque<String>>,
        pub requests: Mutex<Vec<TextRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn generate_text(&self, req: &TextRequest) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(req.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("scripted provider exhausted"))
        }

        async fn generate_structured(
            &self,
            _req: &TextRequest,
            _schema: &OutputSchema,
        ) -> anyhow::Result<Value> {
            Err(anyhow::anyhow!("not scripted"))
        }
    }

    struct AlwaysApprove;

    impl ConfirmationGate for AlwaysApprove {
        fn confirm(&mut self, _description: &str) -> GateDecision {
            GateDecision::Approved
        }
    }

    struct AlwaysDeny {
        reason: String,
    }

    impl ConfirmationGate for AlwaysDeny {
        fn confirm(&mut self, _description: &str) -> GateDecision {
            GateDecision::Denied {
                reason: self.reason.clone(),
            }
        }
    }

    #[derive(Default)]
    struct CountingRunner {
        invocations: AtomicUsize,
    }

    #[async_trait]
    impl CommandRunner for CountingRunner {
        async fn run(&self, command: &str) -> anyhow::Result<Capture> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(Capture {
                stdout: format!("ran: {command}\n"),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn reserved_tokens_classify() {
        assert_eq!(classify_operator_input(" wipe \n"), OperatorCommand::Wipe);
        assert_eq!(classify_operator_input("exit\n"), OperatorCommand::Exit);
        assert_eq!(classify_operator_input("quit"), OperatorCommand::Exit);
        assert_eq!(
            classify_operator_input("show date\n"),
            OperatorCommand::Prompt("show date".to_string())
        );
    }

    #[tokio::test]
    async fn dispatches_exactly_k_times_then_returns_control() {
        let provider = ScriptedProvider::new(vec![
            "SHELL: `ls`\nListing the directory.",
            "SHELL: `ls -la`\nListing again with details.",
            "SHELL: `date`\nChecking the time.",
            "All done, nothing else to run.",
        ]);
        let mut gate = AlwaysApprove;
        let runner = CountingRunner::default();
        let mut session = Session::new();
        session.append(TurnRole::Operator, "inspect the directory");

        let last = run_exchange(&mut session, &provider, &mut gate, &runner, "test-model")
            .await
            .expect("exchange");
        assert_eq!(runner.invocations.load(Ordering::SeqCst), 3);
        assert_eq!(last, "All done, nothing else to run.");
        assert_eq!(provider.requests.lock().unwrap().len(), 4);
        // operator + (assistant + context) * 3 + final assistant
        assert_eq!(session.len(), 8);
    }

    #[tokio::test]
    async fn denial_feeds_the_reason_back_as_context() {
        let provider = ScriptedProvider::new(vec![
            "SHELL: `ls`\nListing the directory.",
            "Understood, I will not run it.",
        ]);
        let mut gate = AlwaysDeny {
            reason: "too risky".to_string(),
        };
        let runner = CountingRunner::default();
        let mut session = Session::new();
        session.append(TurnRole::Operator, "list files");

        run_exchange(&mut session, &provider, &mut gate, &runner, "test-model")
            .await
            .expect("exchange");
        assert_eq!(runner.invocations.load(Ordering::SeqCst), 0);

        let context_turn = session
            .turns()
            .iter()
            .find(|t| t.role == TurnRole::Context)
            .expect("context turn");
        assert!(context_turn.body.contains("not approved"));
        assert!(context_turn.body.contains("too risky"));

        // The requery after the denial saw the rejection notice.
        let requests = provider.requests.lock().unwrap();
        let second = &requests[1];
        assert!(second
            .messages
            .iter()
            .any(|m| m.role == Role::System && m.content.contains("too risky")));
    }

    #[tokio::test]
    async fn approved_result_lands_in_context_with_labeled_blocks() {
        let provider = ScriptedProvider::new(vec![
            "SHELL: `date`\nChecking system time.",
            "The date was printed above.",
        ]);
        let mut gate = AlwaysApprove;
        let runner = CountingRunner::default();
        let mut session = Session::new();
        session.append(TurnRole::Operator, "show date");

        run_exchange(&mut session, &provider, &mut gate, &runner, "test-model")
            .await
            .expect("exchange");
        let context_turn = session
            .turns()
            .iter()
            .find(|t| t.role == TurnRole::Context)
            .expect("context turn");
        assert!(context_turn.body.starts_with("STDOUT: ran: date\n"));
        assert!(context_turn.body.contains("STDERR: "));
    }

    #[tokio::test]
    async fn wiped_session_queries_with_instructions_only() {
        let provider = ScriptedProvider::new(vec!["hello"]);
        let mut gate = AlwaysApprove;
        let runner = CountingRunner::default();
        let mut session = Session::new();
        session.append(TurnRole::Operator, "old context");
        session.append(TurnRole::Assistant, "old reply");
        session.wipe();
        session.append(TurnRole::Operator, "fresh start");

        run_exchange(&mut session, &provider, &mut gate, &runner, "test-model")
            .await
            .expect("exchange");
        let requests = provider.requests.lock().unwrap();
        let first = &requests[0];
        // system instructions + the single fresh operator turn
        assert_eq!(first.messages.len(), 2);
        assert!(!first.messages.iter().any(|m| m.content.contains("old")));
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let provider = ScriptedProvider::new(vec![]);
        let mut gate = AlwaysApprove;
        let runner = CountingRunner::default();
        let mut session = Session::new();
        session.append(TurnRole::Operator, "hi");
        let err = run_exchange(&mut session, &provider, &mut gate, &runner, "test-model")
            .await
            .expect_err("exhausted provider should error");
        assert!(err.to_string().contains("exhausted"));
    }

    #[tokio::test]
    async fn window_bounds_the_submitted_turns() {
        let provider = ScriptedProvider::new(vec!["done"]);
        let mut gate = AlwaysApprove;
        let runner = CountingRunner::default();
        let mut session = Session::new();
        for i in 0..30 {
            session.append(TurnRole::Operator, format!("filler {i}"));
        }
        run_exchange(&mut session, &provider, &mut gate, &runner, "test-model")
            .await
            .expect("exchange");
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].messages.len(), HISTORY_WINDOW + 1);
    }
}
