use std::io::{BufRead, Write as _};
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use tempfile::NamedTempFile;

use crate::gate::ask_confirmation;
use crate::providers::openai::CHAT_MODEL;
use crate::providers::{ModelProvider, TextRequest};
use crate::types::Message;
use crate::ui;

pub const REWRITE_INSTRUCTIONS: &str = "You are a helpful code assistant. The user will provide a file of code and a suggested change, \
and your job is to make a minimal edit implementing that change. \
Pay particular attention to leaving the indentation as it was, so the updated version can be directly copied to the source file. \
Avoid commentary and extra formatting, only responding with the updated file or content.";

pub const EDIT_INSTRUCTIONS: &str = "You are a helpful code assistant. The user will provide a file of code and a suggested change, \
and your job is to make a minimal edit implementing that change. Do not change unrelated parts of the file. \
Avoid commentary, only responding with the updated code.";

// Spelled via concatenation so this file can itself be run through the
// rewriter without the literals matching as markers.
pub const START_MARKER: &str = concat!("RW_", "START");
pub const END_MARKER: &str = concat!("RW_", "END");

const MIN_PROMPT_CHARS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSpan {
    Whole,
    Marked { start_line: usize, end_line: usize },
}

pub fn find_section(content: &str) -> anyhow::Result<SectionSpan> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains(START_MARKER))
        .map(|(i, _)| i)
        .collect();
    let ends: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains(END_MARKER))
        .map(|(i, _)| i)
        .collect();

    if starts.len() != ends.len() {
        bail!("Number of START lines does not match number of END lines.");
    }
    if starts.len() > 1 {
        bail!("More than one START or END found.");
    }
    match (starts.first(), ends.first()) {
        (Some(&start), Some(&end)) => {
            if start > end {
                bail!("START occurs after END.");
            }
            Ok(SectionSpan::Marked {
                start_line: start,
                end_line: end,
            })
        }
        _ => Ok(SectionSpan::Whole),
    }
}

pub fn section_text(content: &str, span: SectionSpan) -> String {
    match span {
        SectionSpan::Whole => content.to_string(),
        SectionSpan::Marked {
            start_line,
            end_line,
        } => content
            .split_inclusive('\n')
            .skip(start_line + 1)
            .take(end_line.saturating_sub(start_line + 1))
            .collect(),
    }
}

pub fn merge_section(content: &str, span: SectionSpan, updated: &str) -> String {
    let normalized = if updated.ends_with('\n') {
        updated.to_string()
    } else {
        format!("{updated}\n")
    };
    match span {
        SectionSpan::Whole => normalized,
        SectionSpan::Marked {
            start_line,
            end_line,
        } => {
            let lines: Vec<&str> = content.split_inclusive('\n').collect();
            let prefix: String = lines[..=start_line].concat();
            let suffix: String = lines[end_line..].concat();
            format!("{prefix}{normalized}{suffix}")
        }
    }
}

async fn open_meld(left: &Path, right: &Path) -> anyhow::Result<()> {
    let status = tokio::process::Command::new("meld")
        .arg(left)
        .arg(right)
        .status()
        .await
        .context("failed to launch meld")?;
    if !status.success() {
        eprintln!("WARN: meld exited with {status}");
    }
    Ok(())
}

fn read_operator_prompt() -> anyhow::Result<String> {
    let mut output = std::io::stdout();
    write!(output, "{}", ui::operator_prompt())?;
    output.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub async fn run_rewrite(provider: &dyn ModelProvider, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading input file {}", path.display()))?;
    let span = find_section(&content)?;
    let section = section_text(&content, span);

    let prompt = read_operator_prompt()?;
    if prompt.chars().count() < MIN_PROMPT_CHARS {
        return Ok(());
    }

    let req = TextRequest {
        model: CHAT_MODEL.to_string(),
        messages: vec![
            Message::system(REWRITE_INSTRUCTIONS),
            Message::user(section.clone()),
            Message::user(prompt),
        ],
    };
    let response = provider.generate_text(&req).await?;

    let mut original_tmp = NamedTempFile::new().context("failed creating temp file")?;
    original_tmp
        .write_all(section.as_bytes())
        .context("failed writing original section to temp file")?;
    original_tmp.flush()?;
    let mut rewritten_tmp = NamedTempFile::new().context("failed creating temp file")?;
    rewritten_tmp
        .write_all(response.as_bytes())
        .context("failed writing rewritten section to temp file")?;
    rewritten_tmp.flush()?;

    open_meld(original_tmp.path(), rewritten_tmp.path()).await?;

    if ask_confirmation(
        "Do you want to delete the temporary files and copy the changes back to the original file?",
    ) {
        // meld may have edited the rewritten temp in place; read it back.
        let updated = std::fs::read_to_string(rewritten_tmp.path())
            .context("failed reading back rewritten temp file")?;
        let merged = merge_section(&content, span, &updated);
        std::fs::write(path, merged)
            .with_context(|| format!("failed writing updated content to {}", path.display()))?;
        println!("Updated content copied back to {}.", path.display());
        original_tmp.close().context("failed deleting temp file")?;
        rewritten_tmp.close().context("failed deleting temp file")?;
        println!("Temporary files deleted.");
    } else {
        let original_path = original_tmp
            .keep()
            .map_err(|e| anyhow!("failed keeping temp file: {e}"))?
            .1;
        let rewritten_path = rewritten_tmp
            .keep()
            .map_err(|e| anyhow!("failed keeping temp file: {e}"))?
            .1;
        println!(
            "Temporary files at {}, {}",
            original_path.display(),
            rewritten_path.display()
        );
    }
    Ok(())
}

pub fn edited_sibling_path(path: &Path) -> anyhow::Result<std::path::PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("input file has no usable name: {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    Ok(path.with_file_name(format!("{stem}.edited{ext}")))
}

pub async fn run_edit(
    provider: &dyn ModelProvider,
    path: &Path,
    prompt: &str,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading input file {}", path.display()))?;
    let req = TextRequest {
        model: CHAT_MODEL.to_string(),
        messages: vec![
            Message::system(EDIT_INSTRUCTIONS),
            Message::user(content),
            Message::user(prompt),
        ],
    };
    let response = provider.generate_text(&req).await?;
    let out_path = edited_sibling_path(path)?;
    std::fs::write(&out_path, response)
        .with_context(|| format!("failed writing edited file {}", out_path.display()))?;
    open_meld(path, &out_path).await
}
