use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{DocumentSection, SourceDocument};

static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link pattern"));

#[derive(Debug, Clone)]
pub struct CorpusLoader {
    extension: String,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self { extension: "md".to_string() }
    }
}

impl CorpusLoader {
    pub fn new() -> Self { Self::default() }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self { extension: extension.into() }
    }

    pub fn load_dir(&self, root: &Path) -> Result<Vec<SourceDocument>> {
        self.load_dir_limited(root, usize::MAX)
    }

    pub fn load_dir_limited(&self, root: &Path, limit: usize) -> Result<Vec<SourceDocument>> {
        let mut files = self.list_files(root);
        if files.is_empty() {
            tracing::warn!("No .{} files found under {}", self.extension, root.display());
            return Ok(vec![]);
        }
        if files.len() > limit {
            files.truncate(limit);
            tracing::info!("Limited to first {} files", limit);
        }
        let mut docs = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!("Loading file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let content = self.read_file_content(file_path)?;
            let relative = file_path.strip_prefix(root).unwrap_or(file_path);
            let id = relative.to_string_lossy().replace('\\', "/");
            docs.push(parse_markdown(&id, &file_path.to_string_lossy(), &content));
        }
        tracing::info!("Loaded {} documents from {}", docs.len(), root.display());
        Ok(docs)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some(self.extension.as_str()) {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim()))
}

fn is_fence(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(line);
}

/// Splits a markdown article into title, prose, sections and code blocks.
///
/// The first level-one heading becomes the title ("Untitled" if none). Deeper
/// headings open sections. Fenced code is kept out of the prose. Link targets
/// are dropped and only the link text is kept.
pub fn parse_markdown(id: &str, path: &str, markdown: &str) -> SourceDocument {
    let mut title: Option<String> = None;
    let mut content = String::new();
    let mut sections: Vec<DocumentSection> = Vec::new();
    let mut code_blocks = Vec::new();
    let mut code: Option<String> = None;

    for raw in markdown.lines() {
        let line = raw.trim_end();
        if is_fence(line.trim_start()) {
            match code.take() {
                Some(block) => code_blocks.push(block),
                None => code = Some(String::new()),
            }
            continue;
        }
        if let Some(block) = code.as_mut() {
            push_line(block, raw);
            continue;
        }
        match heading(line) {
            Some((1, text)) if title.is_none() => title = Some(text.to_string()),
            Some((_, text)) => sections.push(DocumentSection { title: text.to_string(), content: String::new() }),
            None => {
                let prose = LINK.replace_all(line, "$1");
                let prose = prose.trim();
                if prose.is_empty() {
                    continue;
                }
                push_line(&mut content, prose);
                if let Some(section) = sections.last_mut() {
                    push_line(&mut section.content, prose);
                }
            }
        }
    }
    // An unterminated fence still counts as code.
    if let Some(block) = code {
        code_blocks.push(block);
    }

    SourceDocument {
        id: id.to_string(),
        path: path.to_string(),
        title: title.unwrap_or_else(|| "Untitled".to_string()),
        content,
        sections,
        code_blocks,
    }
}
