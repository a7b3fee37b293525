use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::providers::http::{message_short, HttpConfig};

pub const TTS_MODEL: &str = "gpt-4o-mini-tts";
pub const DEFAULT_VOICE: &str = "nova";
pub const VOICE_POOL: [&str; 10] = [
    "alloy", "ash", "ballad", "coral", "echo", "fable", "onyx", "nova", "sage", "shimmer",
];

pub const AZURE_REGION: &str = "eastus";

pub fn short_random_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub fn media_file_name(text: &str) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let stem: String = sanitized.trim_matches('_').chars().take(30).collect();
    format!("{stem}{}.mp3", short_random_id())
}

pub fn language_instruction(language: &str) -> String {
    match language.to_lowercase().as_str() {
        "indonesian" => "Bicara dalam bahasa Indonesia.".to_string(),
        "spanish" => "Habla en español.".to_string(),
        "japanese" => "日本語で話してください。".to_string(),
        other => format!("Speak in {other}."),
    }
}

pub fn anki_media_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not resolve home directory"))?;
    Ok(home.join("anki_media"))
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    instructions: &'a str,
}

#[derive(Debug, Clone)]
pub struct SpeechClient {
    client: Client,
    base_url: String,
    api_key: String,
    voice: String,
    http: HttpConfig,
}

impl SpeechClient {
    pub fn new(base_url: String, api_key: String, voice: String) -> anyhow::Result<Self> {
        if !VOICE_POOL.contains(&voice.as_str()) {
            return Err(anyhow!(
                "unknown voice '{voice}', expected one of: {}",
                VOICE_POOL.join(", ")
            ));
        }
        let http = HttpConfig::default();
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .context("failed to build TTS HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            voice,
            http,
        })
    }

    pub async fn synthesize(
        &self,
        text: &str,
        instructions: &str,
        out_path: &Path,
    ) -> anyhow::Result<()> {
        let url = format!("{}/audio/speech", self.base_url);
        let payload = SpeechRequest {
            model: TTS_MODEL,
            voice: &self.voice,
            input: text,
            instructions,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to call TTS endpoint")?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(anyhow!(
                "TTS endpoint returned HTTP {}: {}",
                status.as_u16(),
                message_short(&body, self.http.max_error_body_chars)
            ));
        }
        stream_to_file(response, out_path).await
    }

    pub async fn tts_to_anki_media(&self, text: &str, language: &str) -> anyhow::Result<String> {
        let file_name = media_file_name(text);
        let dir = anki_media_dir()?;
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create media dir {}", dir.display()))?;
        let path = dir.join(&file_name);
        self.synthesize(text, &language_instruction(language), &path)
            .await?;
        Ok(file_name)
    }

    pub async fn tts_to_temp_file(&self, text: &str) -> anyhow::Result<PathBuf> {
        let path = std::env::temp_dir().join(format!("temp_tts_{}.mp3", short_random_id()));
        self.synthesize(
            text,
            "Speak clearly and assertively in the appropriate language.",
            &path,
        )
        .await?;
        println!("Temporary audio file created at {}", path.display());
        Ok(path)
    }
}

async fn stream_to_file(response: reqwest::Response, out_path: &Path) -> anyhow::Result<()> {
    let mut file = tokio::fs::File::create(out_path)
        .await
        .with_context(|| format!("failed to create audio file {}", out_path.display()))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.context("failed reading TTS audio stream")?;
        file.write_all(&bytes)
            .await
            .context("failed writing TTS audio file")?;
    }
    file.flush().await.context("failed flushing TTS audio file")?;
    Ok(())
}

pub async fn play_audio_file(path: &Path) -> anyhow::Result<()> {
    let status = tokio::process::Command::new("ffplay")
        .arg("-nodisp")
        .arg("-autoexit")
        .arg(path)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .context("failed to launch ffplay")?;
    if !status.success() {
        return Err(anyhow!("ffplay exited with {status}"));
    }
    Ok(())
}

// The token is cached on the client, not in a global; it lives as long as
// the command invocation that owns this value.
#[derive(Debug)]
pub struct AzureSpeech {
    client: Client,
    subscription_key: String,
    region: String,
    voice: String,
    token: Option<String>,
}

impl AzureSpeech {
    pub fn new(subscription_key: String, voice: String) -> anyhow::Result<Self> {
        let http = HttpConfig::default();
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .context("failed to build Azure TTS HTTP client")?;
        Ok(Self {
            client,
            subscription_key,
            region: AZURE_REGION.to_string(),
            voice,
            token: None,
        })
    }

    async fn token(&mut self) -> anyhow::Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let url = format!(
            "https://{}.api.cognitive.microsoft.com/sts/v1.0/issueToken",
            self.region
        );
        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .send()
            .await
            .context("failed to fetch Azure speech token")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Azure token endpoint returned HTTP {}",
                status.as_u16()
            ));
        }
        let token = response
            .text()
            .await
            .context("failed reading Azure speech token")?;
        self.token = Some(token.clone());
        Ok(token)
    }

    pub async fn synthesize(&mut self, text: &str, out_path: &Path) -> anyhow::Result<()> {
        let token = self.token().await?;
        let url = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        );
        let ssml = format!(
            "<speak version='1.0' xml:lang='en-US'><voice name='{}'>{}</voice></speak>",
            self.voice,
            xml_escape(text)
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", "audio-16khz-128kbitrate-mono-mp3")
            .body(ssml)
            .send()
            .await
            .context("failed to call Azure TTS endpoint")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Azure TTS endpoint returned HTTP {}",
                status.as_u16()
            ));
        }
        stream_to_file(response, out_path).await
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::{language_instruction, media_file_name, xml_escape, SpeechRequest, VOICE_POOL};

    #[test]
    fn media_file_name_sanitizes_and_caps() {
        let name = media_file_name("Mereka bekerja keras, serta penuh dedikasi!");
        assert!(name.ends_with(".mp3"));
        let stem = name.trim_end_matches(".mp3");
        // 30 sanitized chars + 8 random suffix chars
        assert_eq!(stem.len(), 38);
        assert!(stem.starts_with("Mereka_bekerja_keras__serta_pe"));
        assert!(stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn media_file_name_trims_edge_underscores() {
        let name = media_file_name("¡hola!");
        assert!(name.starts_with("hola"));
    }

    #[test]
    fn short_texts_keep_their_full_stem() {
        let name = media_file_name("abc");
        assert!(name.starts_with("abc"));
        assert_eq!(name.len(), "abc".len() + 8 + ".mp3".len());
    }

    #[test]
    fn two_names_for_same_text_differ() {
        assert_ne!(media_file_name("hello"), media_file_name("hello"));
    }

    #[test]
    fn language_instructions_cover_specials_and_fallback() {
        assert_eq!(language_instruction("Indonesian"), "Bicara dalam bahasa Indonesia.");
        assert_eq!(language_instruction("SPANISH"), "Habla en español.");
        assert_eq!(language_instruction("japanese"), "日本語で話してください。");
        assert_eq!(language_instruction("French"), "Speak in French.");
    }

    #[test]
    fn voice_pool_includes_default() {
        assert!(VOICE_POOL.contains(&super::DEFAULT_VOICE));
    }

    #[test]
    fn speech_request_serializes_all_fields() {
        let req = SpeechRequest {
            model: "gpt-4o-mini-tts",
            voice: "nova",
            input: "halo",
            instructions: "Bicara dalam bahasa Indonesia.",
        };
        let val = serde_json::to_value(&req).expect("serialize");
        assert_eq!(val["voice"], "nova");
        assert_eq!(val["input"], "halo");
        assert!(val["instructions"].as_str().unwrap().starts_with("Bicara"));
    }

    #[test]
    fn xml_escape_handles_markup_characters() {
        assert_eq!(xml_escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }
}
