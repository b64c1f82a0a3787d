//! In-memory lexical index over the role corpus, used when the semantic index is unavailable.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use cqa_core::domain::{ChunkId, Hit};
use cqa_core::error::{codes, AppError};
use cqa_core::text::normalize_text;
use regex::Regex;
use serde::Serialize;

mod keyword;

pub use keyword::{KeywordScorer, WhitespaceTokenizer};

/// Fewer role blocks than this means the corpus is not in the expected layout.
const MIN_ROLE_BLOCKS: usize = 5;

static ROLE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:-\s*)?\d{6}[ \t]+[A-Z]").unwrap());
static ROLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:-[ \t]*)?(\d{6}[ \t]+[A-Za-z].*)$").unwrap());
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

const ROLE_WORDS: [&str; 5] = ["ict", "analyst", "developer", "manager", "engineer"];

/// Parameters for turning BM25 rankings into fallback hits.
#[derive(Debug, Clone)]
pub struct LexicalSearch<'a> {
    /// Source label stamped on every hit, e.g. "OSCA ICT Roles (fallback)".
    pub source_label: &'a str,
    /// Role title used when a block names no role.
    pub default_role: &'a str,
    pub task_bonus: f32,
    pub task_hint: &'a Regex,
}

#[derive(Debug)]
pub struct LexicalIndex {
    blocks: Vec<String>,
    keyword: KeywordScorer,
}

impl LexicalIndex {
    pub fn from_text(text: &str) -> Self {
        let blocks = split_role_blocks(text);
        let keyword = KeywordScorer::new(&blocks);
        Self { blocks, keyword }
    }

    /// Read and index the corpus file. A missing file is a configuration error.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::new(
                codes::CORPUS_MISSING,
                "Lexical corpus file not found; check retrieval.corpus_path",
            )
            .with_details(format!("path={}", path.display())));
        }
        let bytes = fs::read(path).map_err(|e| {
            AppError::new(codes::CORPUS_READ_FAILED, "Failed to read lexical corpus")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let index = Self::from_text(&text);
        tracing::info!(path = %path.display(), blocks = index.len(), "Lexical corpus loaded.");
        Ok(index)
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Raw BM25 score of every block, in block order.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        self.keyword.scores(query)
    }

    /// Top `k` blocks for `query` with scores normalized into [0, 1].
    ///
    /// Looks `3k` deep, adds the task bonus to blocks that mention tasks or duties, then re-ranks.
    /// Both sorts are stable, so equal scores keep corpus order.
    pub fn search(&self, query: &str, k: usize, opts: &LexicalSearch<'_>) -> Vec<Hit> {
        let scores = self.scores(query);
        let max = scores.iter().copied().fold(0.0f32, f32::max);

        let mut ranked = scores.iter().copied().enumerate().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let depth = k.saturating_mul(3).max(k);
        let mut hits = ranked
            .into_iter()
            .take(depth)
            .map(|(idx, raw)| {
                let block = &self.blocks[idx];
                let base = if max > 0.0 { raw / max } else { 0.0 };
                let bonus = if opts.task_hint.is_match(block) {
                    opts.task_bonus
                } else {
                    0.0
                };
                Hit {
                    text: block.clone(),
                    source_id: opts.source_label.to_string(),
                    role_title: infer_role_title(block, opts.default_role),
                    chunk_id: ChunkId::Index(idx as u64),
                    score: (base + bonus).clamp(0.0, 1.0),
                }
            })
            .collect::<Vec<_>>();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        hits
    }

    /// Corpus diagnostics: which blocks mention a role and which carry a "main tasks" header.
    pub fn stats(&self, role_name: &str, task_hint: &Regex) -> CorpusStats {
        let role_blocks = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.contains(role_name))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let task_blocks = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| task_hint.is_match(b))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let previews = role_blocks
            .iter()
            .take(2)
            .chain(task_blocks.iter().take(2))
            .map(|&i| BlockPreview {
                block: i,
                head: self.blocks[i].lines().take(3).collect::<Vec<_>>().join("\n"),
            })
            .collect();

        CorpusStats {
            total_blocks: self.blocks.len(),
            role_blocks,
            task_blocks,
            previews,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BlockPreview {
    pub block: usize,
    pub head: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CorpusStats {
    pub total_blocks: usize,
    pub role_blocks: Vec<usize>,
    pub task_blocks: Vec<usize>,
    pub previews: Vec<BlockPreview>,
}

/// Unify bullet glyphs so downstream splitting only has to handle asterisks.
pub fn normalize_bullets(text: &str) -> String {
    text.replace(['•', '·', '‧', '∙'], "* ")
}

/// Split the corpus at role-start lines ("273232 ICT Business Analyst", optionally "- " prefixed).
/// Falls back to blank-line paragraphs when fewer than five role blocks are found.
pub fn split_role_blocks(text: &str) -> Vec<String> {
    let text = normalize_bullets(&normalize_text(text));

    let mut raw: Vec<String> = Vec::new();
    let mut cur = String::new();
    for line in text.split_inclusive('\n') {
        if ROLE_START.is_match(line) && !cur.is_empty() {
            raw.push(std::mem::take(&mut cur));
        }
        cur.push_str(line);
    }
    if !cur.is_empty() {
        raw.push(cur);
    }

    let blocks = clean_blocks(raw.iter().map(String::as_str));
    if blocks.len() >= MIN_ROLE_BLOCKS {
        return blocks;
    }
    clean_blocks(BLANK_RUN.split(&text))
}

fn clean_blocks<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

/// Role title for a block: its "NNNNNN Title" line, else the first line naming a typical role
/// word, else `default`.
pub fn infer_role_title(block: &str, default: &str) -> String {
    if let Some(c) = ROLE_LINE.captures(block) {
        return c[1].trim().to_string();
    }
    block
        .lines()
        .map(str::trim)
        .find(|l| {
            let low = l.to_lowercase();
            !l.is_empty() && ROLE_WORDS.iter().any(|w| low.contains(w))
        })
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_title_prefers_code_line() {
        let block = "- 261312 Developer Programmer\nWrites code.";
        assert_eq!(infer_role_title(block, "x"), "261312 Developer Programmer");
    }

    #[test]
    fn role_title_falls_back_to_role_word_then_default() {
        assert_eq!(
            infer_role_title("Intro\nThe ICT Manager oversees", "x"),
            "The ICT Manager oversees"
        );
        assert_eq!(infer_role_title("nothing relevant", "OSCA ICT Roles"), "OSCA ICT Roles");
    }

    #[test]
    fn bullets_are_unified() {
        assert_eq!(normalize_bullets("a • b · c"), "a * b * c");
    }
}
