use crate::types::{Message, Role};

pub const HISTORY_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    Operator,
    Assistant,
    Context,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: TurnRole,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub fn append(&mut self, role: TurnRole, body: impl Into<String>) {
        self.turns.push(Turn {
            role,
            body: body.into(),
        });
    }

    pub fn wipe(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

pub fn to_wire_messages(instructions: &str, turns: &[Turn]) -> Vec<Message> {
    let mut out = Vec::with_capacity(turns.len() + 1);
    out.push(Message::system(instructions));
    for turn in turns {
        out.push(match turn.role {
            TurnRole::Operator => Message::user(turn.body.clone()),
            TurnRole::Assistant => Message::assistant(turn.body.clone()),
            TurnRole::Context => Message::system(turn.body.clone()),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::types::Role;

    use super::{to_wire_messages, Session, TurnRole, HISTORY_WINDOW};

    fn filled(n: usize) -> Session {
        let mut s = Session::new();
        for i in 0..n {
            s.append(TurnRole::Operator, format!("turn {i}"));
        }
        s
    }

    #[test]
    fn window_of_short_session_is_everything() {
        let s = filled(3);
        assert_eq!(s.window(HISTORY_WINDOW).len(), 3);
        assert_eq!(s.window(HISTORY_WINDOW)[0].body, "turn 0");
    }

    #[test]
    fn window_of_long_session_is_exact_suffix_in_order() {
        let s = filled(25);
        let w = s.window(HISTORY_WINDOW);
        assert_eq!(w.len(), HISTORY_WINDOW);
        assert_eq!(w[0].body, "turn 5");
        assert_eq!(w[HISTORY_WINDOW - 1].body, "turn 24");
        assert_eq!(s.len(), 25);
    }

    #[test]
    fn wipe_empties_history() {
        let mut s = filled(4);
        s.wipe();
        assert!(s.is_empty());
        assert!(s.window(HISTORY_WINDOW).is_empty());
    }

    #[test]
    fn wire_mapping_places_instructions_first_and_maps_roles() {
        let mut s = Session::new();
        s.append(TurnRole::Operator, "list files");
        s.append(TurnRole::Assistant, "SHELL: `ls`");
        s.append(TurnRole::Context, "STDOUT: a.txt\nSTDERR: ");
        let msgs = to_wire_messages("you are a debug assistant", s.window(HISTORY_WINDOW));
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[0].content, "you are a debug assistant");
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[2].role, Role::Assistant);
        assert_eq!(msgs[3].role, Role::System);
    }

    #[test]
    fn window_zero_submits_nothing() {
        let s = filled(2);
        assert!(s.window(0).is_empty());
    }
}
