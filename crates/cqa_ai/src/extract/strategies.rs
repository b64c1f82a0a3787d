use std::sync::LazyLock;

use cqa_core::text::{collapse_whitespace, word_count};
use regex::Regex;

use crate::lexicon::TaskLexicon;

static BULLET_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\s+").unwrap());
static BULLET_LEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•·]|\d{1,2}[.)]|–|—)\s*").unwrap());

/// Longest sentence the fallback strategy will return.
pub(crate) const MAX_SENTENCE_CHARS: usize = 220;
/// Items shorter than this are layout debris, not statements.
pub(crate) const MIN_ITEM_CHARS: usize = 6;

/// Extraction strategies in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Bullets inside "Main tasks" / "Duties" style sections.
    TaskSection,
    /// Bullets anywhere in the text.
    WholeTextBullets,
    /// Long sentences from the task sections, or the whole text when there are none.
    SentenceFallback,
}

impl Strategy {
    pub const ORDER: [Strategy; 3] = [
        Strategy::TaskSection,
        Strategy::WholeTextBullets,
        Strategy::SentenceFallback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::TaskSection => "task_section",
            Strategy::WholeTextBullets => "whole_text_bullets",
            Strategy::SentenceFallback => "sentence_fallback",
        }
    }
}

/// Bodies of the task sections in `text`, one entry per contiguous run of lines.
///
/// Blank lines split runs without closing the section; a closing header does both, whether it
/// starts a line or follows task text as in "* Documents specs Alternative title: ...".
pub(crate) fn task_sections(text: &str, lexicon: &TaskLexicon) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut in_task = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut blocks, &mut buf);
            continue;
        }
        let body = if let Some(rest) = lexicon.open_section(line) {
            flush(&mut blocks, &mut buf);
            in_task = true;
            rest
        } else if lexicon.closes_section(line) {
            flush(&mut blocks, &mut buf);
            in_task = false;
            continue;
        } else if in_task {
            line
        } else {
            continue;
        };

        match lexicon.close_inline_at(body) {
            Some(at) => {
                push_trimmed(&mut buf, &body[..at]);
                flush(&mut blocks, &mut buf);
                in_task = false;
            }
            None => push_trimmed(&mut buf, body),
        }
    }
    flush(&mut blocks, &mut buf);
    blocks
}

fn push_trimmed<'a>(buf: &mut Vec<&'a str>, part: &'a str) {
    let part = part.trim();
    if !part.is_empty() {
        buf.push(part);
    }
}

fn flush(blocks: &mut Vec<String>, buf: &mut Vec<&str>) {
    if !buf.is_empty() {
        blocks.push(buf.join("\n"));
        buf.clear();
    }
}

/// Split lines into bullet items, including inline "a * b * c" runs.
pub(crate) fn bullet_items(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| BULLET_SPLIT.split(line))
        .map(|part| clean_item(part, true))
        .filter(|item| !item.is_empty())
        .collect()
}

/// The task filter: a task verb, a domain keyword or a verb-like first word, and no negative
/// phrase.
pub(crate) fn looks_like_task(item: &str, lexicon: &TaskLexicon) -> bool {
    if item.chars().count() < MIN_ITEM_CHARS {
        return false;
    }
    let low = item.to_lowercase();
    if lexicon.has_negative_phrase(&low) {
        return false;
    }
    lexicon.starts_with_task_verb(&low)
        || lexicon.has_domain_keyword(&low)
        || lexicon.looks_like_verb(&low)
}

pub(crate) fn sentence_items(text: &str, min_tokens: usize, lexicon: &TaskLexicon) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .map(|s| clean_item(s, false))
        .filter(|s| {
            s.chars().count() >= MIN_ITEM_CHARS
                && s.chars().count() <= MAX_SENTENCE_CHARS
                && word_count(s) >= min_tokens
                && !lexicon.has_negative_phrase(&s.to_lowercase())
        })
        .collect()
}

/// Split at terminal punctuation followed by a capitalized word, and at `;` or bullet glyphs.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let chars = text.char_indices().collect::<Vec<_>>();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if matches!(c, ';' | '*' | '•') {
            out.push(&text[start..pos]);
            start = pos + c.len_utf8();
        } else if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < chars.len() && chars[j].1.is_uppercase() {
                out.push(&text[start..pos + c.len_utf8()]);
                start = chars[j].0;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    out.push(&text[start..]);
    out
}

/// Collapse whitespace, drop leading list markers and trailing separator noise.
pub(crate) fn clean_item(raw: &str, strip_period: bool) -> String {
    let collapsed = collapse_whitespace(raw);
    let stripped = BULLET_LEAD.replace(&collapsed, "");
    stripped
        .trim_end_matches(|c: char| {
            matches!(c, ' ' | '•' | '*' | ';' | ',' | '-') || (strip_period && c == '.')
        })
        .trim()
        .to_string()
}
