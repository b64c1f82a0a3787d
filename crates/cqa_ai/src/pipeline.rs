use std::sync::Arc;

use cqa_core::config::Config;
use cqa_core::domain::RagAnswer;
use cqa_core::error::AppError;

use crate::embeddings::OllamaEmbedder;
use crate::extract::{ExtractorOptions, TaskExtractor};
use crate::lexicon::TaskLexicon;
use crate::ollama::OllamaClient;
use crate::retrieve::{HybridRetriever, RetrieverOptions};
use crate::semantic::{LocalVectorIndex, SemanticIndex};
use crate::synthesize::{AnswerSynthesizer, Synthesis, SynthesisOptions};

/// The document branch as seen by the router.
pub trait RagAnswerer {
    fn answer(&self, query: &str) -> RagAnswer;
}

/// Retrieval followed by synthesis.
pub struct RagPipeline {
    retriever: HybridRetriever,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(retriever: HybridRetriever, synthesizer: AnswerSynthesizer, top_k: usize) -> Self {
        Self {
            retriever,
            synthesizer,
            top_k,
        }
    }

    /// Wire the pipeline from configuration. The semantic index is attached only when enabled.
    pub fn from_config(cfg: &Config, lexicon: Arc<TaskLexicon>) -> Result<Self, AppError> {
        let mut retriever =
            HybridRetriever::new(RetrieverOptions::from(&cfg.retrieval), lexicon.clone());
        if let Some(semantic) = semantic_from_config(cfg)? {
            retriever = retriever.with_semantic(semantic);
        }
        let extractor = TaskExtractor::new(lexicon, ExtractorOptions::from(&cfg.extraction));
        let synthesizer = AnswerSynthesizer::new(extractor, SynthesisOptions::from_config(cfg));
        Ok(Self::new(retriever, synthesizer, cfg.retrieval.top_k))
    }

    pub fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }

    pub fn run(&self, query: &str) -> Result<Synthesis, AppError> {
        let hits = self.retriever.search(query, self.top_k)?;
        Ok(self.synthesizer.synthesize_for_query(query, &hits))
    }
}

impl RagAnswerer for RagPipeline {
    fn answer(&self, query: &str) -> RagAnswer {
        match self.run(query) {
            Ok(s) => RagAnswer {
                answer: s.answer,
                citations: s.citations,
                score: s.score,
                used: true,
                error: None,
            },
            Err(e) => {
                tracing::error!(code = %e.code, err = %e, "Document branch failed.");
                RagAnswer::failed(e)
            }
        }
    }
}

/// Local vector collection behind an Ollama embedder, or `None` when semantic search is disabled.
pub fn semantic_from_config(
    cfg: &Config,
) -> Result<Option<Box<dyn SemanticIndex + Send + Sync>>, AppError> {
    let s = &cfg.semantic;
    if !s.enabled {
        return Ok(None);
    }
    let client = OllamaClient::new(&s.ollama_base_url)?;
    let index = LocalVectorIndex::open(
        &s.index_dir,
        &s.collection,
        s.embed_model.clone(),
        Box::new(OllamaEmbedder::new(client)),
    );
    Ok(Some(Box::new(index)))
}
