//! Answer composition: statement ranking, citation ordering, confidence gating.

use std::collections::HashSet;

use cqa_core::config::Config;
use cqa_core::domain::{ChunkId, Citation, Hit};
use cqa_core::text::truncate_chars;
use serde::Serialize;

use crate::extract::TaskExtractor;

mod citations;
mod render;

pub use citations::{build_citations, PREVIEW_PLACEHOLDER};
pub use render::{
    reference_line, split_references, ANSWER_HEADER, BEST_EFFORT_HEADER, REFERENCES_HEADER,
};

pub const REFUSAL_MESSAGE: &str = "No relevant passages found.";
pub const LOW_CONFIDENCE_BANNER: &str =
    "⚠️ I'm not fully confident about this answer; based on retrieved snippets, it might be:";
const EMPTY_STITCH_MESSAGE: &str =
    "I retrieved passages, but couldn't compose a structured answer.";
/// Hits pooled by the combined pass for task questions.
const COMBINED_HITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Statements extracted per hit and ranked.
    Grounded,
    /// Statements extracted from the pooled text of the top hits.
    Combined,
    /// Raw passage text; nothing could be extracted.
    BestEffort,
    Refused,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synthesis {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub score: f32,
    pub kind: AnswerKind,
    pub low_confidence: bool,
}

/// A candidate statement and the hit it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedStatement {
    pub text: String,
    pub rank: usize,
    pub score: f32,
    pub source_id: String,
    pub chunk_id: ChunkId,
}

#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub threshold: f32,
    pub low_conf_score: f32,
    pub visible_points: usize,
    pub pool_size: usize,
    pub keyword_bonus: f32,
    pub verb_bonus: f32,
    pub preview_width: usize,
    pub stitch_hits: usize,
    pub stitch_chars: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SynthesisOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let s = &cfg.synthesis;
        Self {
            threshold: cfg.retrieval.threshold,
            low_conf_score: cfg.retrieval.low_conf_score,
            visible_points: s.visible_points,
            pool_size: s.pool_size,
            keyword_bonus: s.keyword_bonus,
            verb_bonus: s.verb_bonus,
            preview_width: s.preview_width,
            stitch_hits: s.stitch_hits,
            stitch_chars: s.stitch_chars,
        }
    }
}

pub struct AnswerSynthesizer {
    extractor: TaskExtractor,
    opts: SynthesisOptions,
}

impl AnswerSynthesizer {
    pub fn new(extractor: TaskExtractor, opts: SynthesisOptions) -> Self {
        Self { extractor, opts }
    }

    pub fn synthesize(&self, hits: &[Hit]) -> Synthesis {
        self.compose(None, hits)
    }

    /// As [`synthesize`](Self::synthesize), plus a pooled pass over the top hits when the query
    /// asks about tasks or duties and per-hit extraction found nothing.
    pub fn synthesize_for_query(&self, query: &str, hits: &[Hit]) -> Synthesis {
        self.compose(Some(query), hits)
    }

    /// Ranked, deduplicated statement pool (at most `pool_size`) across all hits.
    pub fn rank_statements(&self, hits: &[Hit]) -> Vec<ExtractedStatement> {
        let lx = self.extractor.lexicon();
        let mut scored = Vec::new();
        for (rank, hit) in hits.iter().enumerate() {
            let weight = 1.0 / (1.0 + rank as f32);
            for text in self.extractor.extract(&hit.text) {
                let low = text.to_lowercase();
                let mut score = weight;
                if lx.has_duty_marker(&low) {
                    score += self.opts.keyword_bonus;
                }
                if lx.starts_with_task_verb(&low) {
                    score += self.opts.verb_bonus;
                }
                scored.push(ExtractedStatement {
                    text,
                    rank,
                    score,
                    source_id: hit.source_id.clone(),
                    chunk_id: hit.chunk_id.clone(),
                });
            }
        }

        // Stable: equal scores keep hit order, then extraction order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        let mut seen = HashSet::new();
        scored.retain(|s| seen.insert(s.text.clone()));
        scored.truncate(self.opts.pool_size);
        scored
    }

    fn compose(&self, query: Option<&str>, hits: &[Hit]) -> Synthesis {
        let Some(top) = hits.first().map(|h| h.score) else {
            return refusal(0.0);
        };
        if top < self.opts.threshold {
            tracing::info!(
                top_score = top,
                threshold = self.opts.threshold,
                "Refusing: weak evidence."
            );
            return refusal(top);
        }

        let citations = build_citations(hits, self.opts.preview_width);
        let pool = self.rank_statements(hits);

        let (kind, body) = if !pool.is_empty() {
            (AnswerKind::Grounded, self.render_grounded(&pool, &citations))
        } else if let Some(answer) = query
            .filter(|q| self.extractor.lexicon().task_hint().is_match(q))
            .and_then(|_| self.render_combined(hits, &citations))
        {
            (AnswerKind::Combined, answer)
        } else {
            (AnswerKind::BestEffort, self.render_best_effort(hits, &citations))
        };

        let low_confidence = top < self.opts.low_conf_score;
        let answer = if low_confidence {
            format!("{LOW_CONFIDENCE_BANNER}\n{body}")
        } else {
            body
        };
        tracing::debug!(
            kind = ?kind,
            low_confidence,
            citations = citations.len(),
            "Answer composed."
        );

        Synthesis {
            answer,
            citations,
            score: top,
            kind,
            low_confidence,
        }
    }

    fn render_grounded(&self, pool: &[ExtractedStatement], citations: &[Citation]) -> String {
        let visible = &pool[..pool.len().min(self.opts.visible_points)];

        let mut used: Vec<(&str, &ChunkId)> = Vec::new();
        for s in visible {
            let key = (s.source_id.as_str(), &s.chunk_id);
            if !used.contains(&key) {
                used.push(key);
            }
        }
        let mut ordered: Vec<&Citation> = used
            .iter()
            .filter_map(|k| citations.iter().find(|c| c.key() == *k))
            .collect();
        ordered.extend(citations.iter().filter(|c| !used.contains(&c.key())));

        let texts = visible.iter().map(|s| s.text.as_str()).collect::<Vec<_>>();
        render::bullet_answer(None, &texts, &ordered)
    }

    fn render_combined(&self, hits: &[Hit], citations: &[Citation]) -> Option<String> {
        let top = &hits[..hits.len().min(COMBINED_HITS)];
        let combined = top
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        // Pooling lets a task header at the end of one chunk reach bullets in the next.
        let statements = self.extractor.extract_pooled(&combined);
        if statements.is_empty() {
            return None;
        }
        let role = top
            .iter()
            .map(|h| h.role_title.trim())
            .find(|r| !r.is_empty());
        let texts = statements.iter().map(String::as_str).collect::<Vec<_>>();
        let refs = citations.iter().collect::<Vec<_>>();
        Some(render::bullet_answer(role, &texts, &refs))
    }

    fn render_best_effort(&self, hits: &[Hit], citations: &[Citation]) -> String {
        let stitched = hits
            .iter()
            .take(self.opts.stitch_hits)
            .map(|h| truncate_chars(h.text.trim(), self.opts.stitch_chars))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let body = if stitched.is_empty() {
            EMPTY_STITCH_MESSAGE
        } else {
            stitched.as_str()
        };
        let refs = citations.iter().collect::<Vec<_>>();
        render::best_effort_answer(body, &refs)
    }
}

fn refusal(score: f32) -> Synthesis {
    Synthesis {
        answer: REFUSAL_MESSAGE.to_string(),
        citations: Vec::new(),
        score,
        kind: AnswerKind::Refused,
        low_confidence: false,
    }
}
