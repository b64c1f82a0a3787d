use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use cqa_core::config::Retrieval;
use cqa_core::domain::Hit;
use cqa_core::error::AppError;

use crate::lexical::{LexicalIndex, LexicalSearch};
use crate::lexicon::TaskLexicon;
use crate::semantic::{SemanticIndex, SemanticOutcome};

#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    pub corpus_path: PathBuf,
    pub source_name: String,
    pub lexical_bonus: f32,
}

impl From<&Retrieval> for RetrieverOptions {
    fn from(cfg: &Retrieval) -> Self {
        Self {
            corpus_path: cfg.corpus_path.clone(),
            source_name: cfg.source_name.clone(),
            lexical_bonus: cfg.lexical_bonus,
        }
    }
}

/// Semantic search with a lexical BM25 fallback.
///
/// The lexical corpus is read on first fallback and kept for the retriever's lifetime. A missing
/// corpus is reported to the caller and retried on the next fallback.
pub struct HybridRetriever {
    semantic: Option<Box<dyn SemanticIndex + Send + Sync>>,
    lexical: OnceLock<LexicalIndex>,
    lexicon: Arc<TaskLexicon>,
    opts: RetrieverOptions,
    fallback_label: String,
}

impl HybridRetriever {
    pub fn new(opts: RetrieverOptions, lexicon: Arc<TaskLexicon>) -> Self {
        let fallback_label = format!("{} (fallback)", opts.source_name);
        Self {
            semantic: None,
            lexical: OnceLock::new(),
            lexicon,
            opts,
            fallback_label,
        }
    }

    pub fn with_semantic(mut self, index: Box<dyn SemanticIndex + Send + Sync>) -> Self {
        self.semantic = Some(index);
        self
    }

    /// Use an already-built lexical index instead of reading `corpus_path`.
    pub fn with_lexical_index(self, index: LexicalIndex) -> Self {
        // A fresh OnceLock cannot already be set.
        let _ = self.lexical.set(index);
        self
    }

    pub fn fallback_label(&self) -> &str {
        &self.fallback_label
    }

    /// The lexical index, loading the corpus on first use.
    pub fn lexical_index(&self) -> Result<&LexicalIndex, AppError> {
        if let Some(ix) = self.lexical.get() {
            return Ok(ix);
        }
        let ix = LexicalIndex::load(&self.opts.corpus_path)?;
        Ok(self.lexical.get_or_init(|| ix))
    }

    /// Up to `k` hits ordered by descending score, each scored in [0, 1].
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>, AppError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        match self.semantic.as_ref().map(|s| s.query(query, k)) {
            Some(SemanticOutcome::Hits(mut hits)) => {
                hits.truncate(k);
                tracing::debug!(hits = hits.len(), "Semantic search answered.");
                return Ok(hits);
            }
            Some(SemanticOutcome::Unavailable(reason)) => {
                tracing::warn!(
                    code = %reason.code,
                    reason = %reason,
                    "Semantic index unavailable; using lexical fallback."
                );
            }
            None => {
                tracing::debug!("No semantic index configured; using lexical search.");
            }
        }

        let index = self.lexical_index()?;
        let hits = index.search(
            query,
            k,
            &LexicalSearch {
                source_label: &self.fallback_label,
                default_role: &self.opts.source_name,
                task_bonus: self.opts.lexical_bonus,
                task_hint: self.lexicon.task_hint(),
            },
        );
        tracing::debug!(hits = hits.len(), "Lexical fallback answered.");
        Ok(hits)
    }
}
