use anyhow::{anyhow, Context};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::providers::http::HttpConfig;

pub const ANKI_CONNECT_URL: &str = "http://localhost:8765";
pub const ANKI_CONNECT_VERSION: u32 = 6;
pub const NOTE_MODEL: &str = "BasicWithTTS";

#[derive(Debug, Serialize)]
struct AnkiRequest<'a> {
    action: &'a str,
    version: u32,
    params: Value,
}

#[derive(Debug, Clone)]
pub struct NoteSpec {
    pub deck: String,
    pub front: String,
    pub back: String,
    pub front_sound: String,
    pub back_sound: String,
}

pub fn note_payload(note: &NoteSpec) -> Value {
    json!({
        "notes": [{
            "deckName": note.deck,
            "modelName": NOTE_MODEL,
            "fields": {
                "Front": note.front,
                "Back": note.back,
                "FrontTTS": format!("[sound:{}]", note.front_sound),
                "BackTTS": format!("[sound:{}]", note.back_sound),
            },
            "options": { "allowDuplicate": true },
            "tags": []
        }]
    })
}

#[derive(Debug, Clone)]
pub struct AnkiClient {
    client: Client,
    base_url: String,
}

impl AnkiClient {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let http = HttpConfig::default();
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .context("failed to build AnkiConnect HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn invoke(&self, action: &str, params: Value) -> anyhow::Result<Value> {
        let payload = AnkiRequest {
            action,
            version: ANKI_CONNECT_VERSION,
            params,
        };
        let response = self
            .client
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow!("AnkiConnect is not running. Please turn it on.")
                } else {
                    anyhow!("failed to call AnkiConnect: {e}")
                }
            })?;
        let body: Value = response
            .json()
            .await
            .context("failed to parse AnkiConnect response")?;
        if let Some(err) = body.get("error") {
            if !err.is_null() {
                return Err(anyhow!("AnkiConnect error for '{action}': {err}"));
            }
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    pub async fn deck_names(&self) -> anyhow::Result<Vec<String>> {
        let result = self.invoke("deckNames", json!({})).await?;
        let names = result
            .as_array()
            .ok_or_else(|| anyhow!("deckNames did not return a list"))?
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect();
        Ok(names)
    }

    pub async fn create_deck(&self, deck: &str) -> anyhow::Result<()> {
        self.invoke("createDeck", json!({ "deck": deck })).await?;
        Ok(())
    }

    pub async fn ensure_deck(&self, deck: &str) -> anyhow::Result<()> {
        let decks = self.deck_names().await?;
        if !decks.iter().any(|d| d == deck) {
            self.create_deck(deck).await?;
            println!("Deck '{deck}' created.");
        }
        Ok(())
    }

    pub async fn add_note(&self, note: &NoteSpec) -> anyhow::Result<()> {
        self.invoke("addNotes", note_payload(note)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{note_payload, AnkiRequest, NoteSpec, ANKI_CONNECT_VERSION};

    #[test]
    fn request_envelope_matches_anki_connect_wire_shape() {
        let req = AnkiRequest {
            action: "deckNames",
            version: ANKI_CONNECT_VERSION,
            params: json!({}),
        };
        let val = serde_json::to_value(&req).expect("serialize");
        assert_eq!(val["action"], "deckNames");
        assert_eq!(val["version"], 6);
        assert!(val["params"].is_object());
    }

    #[test]
    fn note_payload_carries_sound_references() {
        let note = NoteSpec {
            deck: "Indonesian".to_string(),
            front: "selamat pagi".to_string(),
            back: "good morning".to_string(),
            front_sound: "selamat_pagiabcd1234.mp3".to_string(),
            back_sound: "good_morningefgh5678.mp3".to_string(),
        };
        let payload = note_payload(&note);
        let first = &payload["notes"][0];
        assert_eq!(first["deckName"], "Indonesian");
        assert_eq!(first["modelName"], "BasicWithTTS");
        assert_eq!(first["fields"]["FrontTTS"], "[sound:selamat_pagiabcd1234.mp3]");
        assert_eq!(first["fields"]["BackTTS"], "[sound:good_morningefgh5678.mp3]");
        assert_eq!(first["options"]["allowDuplicate"], true);
    }
}
