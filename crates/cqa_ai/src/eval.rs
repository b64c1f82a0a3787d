//! Offline evaluation against a JSONL file of gold answers and citations.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use cqa_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use crate::guardrails::check_reference_numbering;
use crate::pipeline::RagAnswerer;
use crate::synthesize::split_references;

/// Leading gold tokens that must all appear for a match.
const GOLD_TOKENS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvalItem {
    pub qid: String,
    pub question: String,
    pub gold_citation: String,
    pub gold_answer: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EvalOutcome {
    pub qid: String,
    pub citation_ok: bool,
    pub answer_ok: bool,
    pub references_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EvalReport {
    pub total: usize,
    pub citations_ok: usize,
    pub answers_ok: usize,
    pub references_ok: usize,
    pub items: Vec<EvalOutcome>,
}

pub fn read_items(path: &Path) -> Result<Vec<EvalItem>, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::new(codes::EVAL_INPUT_INVALID, "Failed to read eval file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    parse_items(&raw)
}

/// Parse JSONL, skipping blank and `#` lines. A leading BOM is tolerated.
pub fn parse_items(raw: &str) -> Result<Vec<EvalItem>, AppError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut out = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let item = serde_json::from_str(line).map_err(|e| {
            AppError::new(codes::EVAL_INPUT_INVALID, "Invalid eval item")
                .with_details(format!("line={}; err={}", i + 1, e))
        })?;
        out.push(item);
    }
    Ok(out)
}

/// Lower-case, drop ASCII punctuation, collapse whitespace.
pub fn normalize(s: &str) -> String {
    let cleaned = s
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_references(text: &str) -> &str {
    split_references(text).0
}

/// The first gold tokens all appear as words of the answer body.
pub fn answer_matches(pred: &str, gold: &str) -> bool {
    let body = normalize(strip_references(pred));
    let gold = normalize(gold);
    if body.is_empty() || gold.is_empty() {
        return false;
    }
    let words = body.split(' ').collect::<HashSet<_>>();
    gold.split(' ').take(GOLD_TOKENS).all(|w| words.contains(w))
}

/// The first gold citation tokens all appear somewhere in the full answer, references included.
pub fn contains_citation(answer: &str, gold_citation: &str) -> bool {
    let ans = normalize(answer);
    let gold = normalize(gold_citation);
    if ans.is_empty() || gold.is_empty() {
        return false;
    }
    gold.split(' ').take(GOLD_TOKENS).all(|w| ans.contains(w))
}

pub fn run_eval(items: &[EvalItem], rag: &dyn RagAnswerer) -> EvalReport {
    let mut report = EvalReport::default();
    for item in items {
        let res = rag.answer(&item.question);
        let references_ok = matches!(
            check_reference_numbering(&res.answer),
            Ok(n) if n == res.citations.len()
        );
        let outcome = EvalOutcome {
            qid: item.qid.clone(),
            citation_ok: contains_citation(&res.answer, &item.gold_citation),
            answer_ok: answer_matches(&res.answer, &item.gold_answer),
            references_ok,
            error: res.error.as_ref().map(|e| e.to_string()),
        };
        tracing::info!(
            qid = %outcome.qid,
            citation_ok = outcome.citation_ok,
            answer_ok = outcome.answer_ok,
            "Eval item scored."
        );

        report.total += 1;
        report.citations_ok += usize::from(outcome.citation_ok);
        report.answers_ok += usize::from(outcome.answer_ok);
        report.references_ok += usize::from(outcome.references_ok);
        report.items.push(outcome);
    }
    report
}
