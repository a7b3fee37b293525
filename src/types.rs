use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardList {
    pub cards: Vec<Card>,
}

pub fn card_list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "cards": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "front": {"type": "string"},
                        "back": {"type": "string"}
                    },
                    "required": ["front", "back"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["cards"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::{card_list_schema, CardList, Message, Role};

    #[test]
    fn roles_serialize_lowercase() {
        let msg = Message::system("hi");
        let val = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(val.get("role").and_then(|v| v.as_str()), Some("system"));
        assert_eq!(val.get("content").and_then(|v| v.as_str()), Some("hi"));
    }

    #[test]
    fn card_list_round_trips_from_model_output() {
        let raw = r#"{"cards":[{"front":"apa kabar","back":"how are you"}]}"#;
        let list: CardList = serde_json::from_str(raw).expect("decode");
        assert_eq!(list.cards.len(), 1);
        assert_eq!(list.cards[0].front, "apa kabar");
    }

    #[test]
    fn schema_declares_both_fields_required() {
        let schema = card_list_schema();
        let required = schema["properties"]["cards"]["items"]["required"]
            .as_array()
            .expect("required");
        let names: Vec<_> = required.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["front", "back"]);
    }

    #[test]
    fn user_and_assistant_constructors_tag_roles() {
        assert_eq!(Message::user("a").role, Role::User);
        assert_eq!(Message::assistant("b").role, Role::Assistant);
    }
}
