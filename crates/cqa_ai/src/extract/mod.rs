//! Task and duty statement extraction from retrieved passages.

use std::collections::HashSet;
use std::sync::Arc;

use cqa_core::config::Extraction;
use cqa_core::text::{normalize_text, word_count};

use crate::lexical::normalize_bullets;
use crate::lexicon::TaskLexicon;

mod strategies;

pub use strategies::Strategy;

pub const POOLED_MIN_TOKENS: usize = 3;

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub max_items: usize,
    pub min_bullet_tokens: usize,
    pub min_sentence_tokens: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        (&Extraction::default()).into()
    }
}

impl From<&Extraction> for ExtractorOptions {
    fn from(cfg: &Extraction) -> Self {
        Self {
            max_items: cfg.max_items,
            min_bullet_tokens: cfg.min_bullet_tokens,
            min_sentence_tokens: cfg.min_sentence_tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskExtractor {
    lexicon: Arc<TaskLexicon>,
    opts: ExtractorOptions,
}

impl TaskExtractor {
    pub fn new(lexicon: Arc<TaskLexicon>, opts: ExtractorOptions) -> Self {
        Self { lexicon, opts }
    }

    pub fn lexicon(&self) -> &TaskLexicon {
        &self.lexicon
    }

    /// Task statements in first-appearance order, deduplicated and capped at `max_items`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.extract_with_strategy(text)
            .map(|(_, items)| items)
            .unwrap_or_default()
    }

    /// Like [`extract`](Self::extract), also reporting which strategy produced the items.
    pub fn extract_with_strategy(&self, text: &str) -> Option<(Strategy, Vec<String>)> {
        let prepared = prepare(text);
        Strategy::ORDER.into_iter().find_map(|strategy| {
            let items = self.run_prepared(strategy, &prepared);
            if items.is_empty() {
                return None;
            }
            tracing::debug!(strategy = strategy.name(), items = items.len(), "Tasks extracted.");
            Some((strategy, items))
        })
    }

    /// Looser pass for text pooled from several hits: inside task sections any bullet of
    /// [`POOLED_MIN_TOKENS`] words counts, with no verb or keyword test. Without usable section
    /// bullets this degrades to the sentence fallback.
    pub fn extract_pooled(&self, text: &str) -> Vec<String> {
        let prepared = prepare(text);
        let lx = self.lexicon.as_ref();
        let sections = strategies::task_sections(&prepared, lx);

        let mut items = Vec::new();
        if !sections.is_empty() {
            items = strategies::bullet_items(&sections.join("\n"))
                .into_iter()
                .filter(|i| word_count(i) >= POOLED_MIN_TOKENS)
                .filter(|i| !lx.has_negative_phrase(&i.to_lowercase()))
                .collect();
        }
        if items.len() <= 1 {
            let scope = if sections.is_empty() {
                prepared
            } else {
                sections.join("\n")
            };
            let sentences = strategies::sentence_items(&scope, self.opts.min_sentence_tokens, lx);
            if !sentences.is_empty() {
                items = sentences;
            }
        }
        dedupe_capped(items, self.opts.max_items)
    }

    /// Run a single strategy in isolation.
    pub fn run_strategy(&self, strategy: Strategy, text: &str) -> Vec<String> {
        self.run_prepared(strategy, &prepare(text))
    }

    fn run_prepared(&self, strategy: Strategy, text: &str) -> Vec<String> {
        let lx = self.lexicon.as_ref();
        let raw = match strategy {
            Strategy::TaskSection => {
                let sections = strategies::task_sections(text, lx);
                self.qualifying_bullets(&sections.join("\n"))
            }
            Strategy::WholeTextBullets => self.qualifying_bullets(text),
            Strategy::SentenceFallback => {
                let sections = strategies::task_sections(text, lx);
                let scope = if sections.is_empty() {
                    text.to_string()
                } else {
                    sections.join("\n")
                };
                strategies::sentence_items(&scope, self.opts.min_sentence_tokens, lx)
            }
        };
        dedupe_capped(raw, self.opts.max_items)
    }

    fn qualifying_bullets(&self, text: &str) -> Vec<String> {
        strategies::bullet_items(text)
            .into_iter()
            .filter(|item| word_count(item) >= self.opts.min_bullet_tokens)
            .filter(|item| strategies::looks_like_task(item, &self.lexicon))
            .collect()
    }
}

fn prepare(text: &str) -> String {
    normalize_bullets(&normalize_text(text))
}

fn dedupe_capped(items: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|i| seen.insert(i.clone()))
        .take(cap)
        .collect()
}
