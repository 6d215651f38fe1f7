use crate::models::WorkItem;
use crate::persist::write_atomic;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes accepted documentation into a source file
pub trait DocWriter: Send + Sync {
    /// Insert `text` for `item`, backing the original file up under
    /// `backup_dir`. Returns the backup path.
    fn write(&self, item: &WorkItem, text: &str, backup_dir: &Path) -> Result<PathBuf>;
}

/// Inserts documentation as a comment block directly above the item
#[derive(Debug, Default)]
pub struct CommentWriter;

impl CommentWriter {
    pub fn new() -> Self {
        Self
    }

    fn render(language: &str, text: &str, indent: &str) -> Vec<String> {
        let lines: Vec<&str> = text.trim_end().lines().collect();
        let prefixed = |prefix: &str| -> Vec<String> {
            lines
                .iter()
                .map(|line| {
                    if line.is_empty() {
                        format!("{}{}", indent, prefix.trim_end())
                    } else {
                        format!("{}{}{}", indent, prefix, line)
                    }
                })
                .collect()
        };

        match language {
            "rust" => prefixed("/// "),
            "python" => prefixed("# "),
            "javascript" | "typescript" => {
                let mut block = vec![format!("{}/**", indent)];
                block.extend(prefixed(" * "));
                block.push(format!("{} */", indent));
                block
            }
            _ => prefixed("// "),
        }
    }
}

/// Line index of the item's declaration. Earlier writes in the same file
/// only ever push it down, so search forward from the recorded line.
fn locate(lines: &[String], item: &WorkItem) -> usize {
    let hint = item.line_number.saturating_sub(1).min(lines.len());
    lines[hint..]
        .iter()
        .position(|line| declares(line, &item.name))
        .map_or(hint, |offset| hint + offset)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `line` declares `name`: a whole-identifier match on a code line.
/// A line led by the name only counts when it opens a body, which keeps
/// class methods (`handler() {`) and skips bare calls (`handler(x)`).
fn declares(line: &str, name: &str) -> bool {
    let trimmed = line.trim();
    if ["#", "//", "/*", "*"].iter().any(|marker| trimmed.starts_with(marker)) {
        return false;
    }
    trimmed.match_indices(name).any(|(at, _)| {
        let before = trimmed[..at].chars().next_back();
        let after = trimmed[at + name.len()..].chars().next();
        let whole = !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char);
        whole && (at > 0 || trimmed.ends_with('{'))
    })
}

impl DocWriter for CommentWriter {
    fn write(&self, item: &WorkItem, text: &str, backup_dir: &Path) -> Result<PathBuf> {
        let path = Path::new(&item.filepath);
        let original = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", item.filepath))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string());
        let backup_path = backup_dir.join(format!("{}-{}", Uuid::new_v4(), file_name));
        fs::create_dir_all(backup_dir)
            .with_context(|| format!("Failed to create {}", backup_dir.display()))?;
        fs::write(&backup_path, &original)
            .with_context(|| format!("Failed to back up {}", item.filepath))?;

        let mut lines: Vec<String> = original.lines().map(str::to_string).collect();
        let at = locate(&lines, item);
        let indent: String = lines
            .get(at)
            .map(|line| line.chars().take_while(|c| c.is_whitespace()).collect())
            .unwrap_or_default();

        let block = Self::render(&item.language, text, &indent);
        lines.splice(at..at, block);

        let mut updated = lines.join("\n");
        if original.ends_with('\n') {
            updated.push('\n');
        }
        write_atomic(path, updated.as_bytes())?;

        Ok(backup_path)
    }
}
