use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

pub const OPENAI_KEY_FILE: &str = "openaikey";
pub const AZURE_KEY_FILE: &str = "azurekey";

pub fn key_file_path(file_name: &str) -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not resolve home directory"))?;
    Ok(home.join(file_name))
}

pub fn read_key(file_name: &str) -> anyhow::Result<String> {
    read_key_at(&key_file_path(file_name)?)
}

pub fn read_key_at(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading API key file {}", path.display()))?;
    let key = raw.lines().next().unwrap_or("").trim().to_string();
    if key.is_empty() {
        return Err(anyhow!("API key file {} is empty", path.display()));
    }
    Ok(key)
}

pub fn openai_key() -> anyhow::Result<String> {
    read_key(OPENAI_KEY_FILE)
}

pub fn azure_key() -> anyhow::Result<String> {
    read_key(AZURE_KEY_FILE)
}
