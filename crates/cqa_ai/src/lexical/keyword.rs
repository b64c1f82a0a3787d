//! BM25 keyword scoring over role blocks.

use std::fmt;

use bm25::{Embedder, EmbedderBuilder, Scorer, Tokenizer};

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// Lower-cased whitespace tokens, no stemming or stop words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, input_text: &str) -> Vec<String> {
        input_text.split_whitespace().map(str::to_lowercase).collect()
    }
}

pub struct KeywordScorer {
    embedder: Embedder<u32, WhitespaceTokenizer>,
    scorer: Scorer<usize>,
    len: usize,
}

impl KeywordScorer {
    pub fn new(docs: &[String]) -> Self {
        let corpus = docs.iter().map(String::as_str).collect::<Vec<_>>();
        let embedder =
            EmbedderBuilder::<u32, WhitespaceTokenizer>::with_tokenizer_and_fit_to_corpus(
                WhitespaceTokenizer,
                &corpus,
            )
            .k1(K1)
            .b(B)
            .build();

        let mut scorer = Scorer::<usize>::new();
        for (i, doc) in corpus.iter().enumerate() {
            scorer.upsert(&i, embedder.embed(doc));
        }
        Self {
            embedder,
            scorer,
            len: docs.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Score of every document in corpus order; documents sharing no query term score 0.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let mut out = vec![0.0f32; self.len];
        let q = self.embedder.embed(query);
        for m in self.scorer.matches(&q) {
            if let Some(slot) = out.get_mut(m.id) {
                *slot = m.score;
            }
        }
        out
    }
}

impl fmt::Debug for KeywordScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordScorer")
            .field("len", &self.len)
            .field("avgdl", &self.embedder.avgdl())
            .finish()
    }
}
