use std::fs;
use std::path::Path;
use std::sync::Arc;

use cqa_ai::lexical::LexicalIndex;
use cqa_ai::lexicon::TaskLexicon;
use cqa_ai::retrieve::{HybridRetriever, RetrieverOptions};
use cqa_ai::semantic::{SemanticIndex, SemanticOutcome};
use cqa_core::domain::{ChunkId, Hit};
use cqa_core::error::AppError;
use pretty_assertions::assert_eq;

const CORPUS: &str = "261111 ICT Business Analyst
Main tasks:
* Gathers requirements from stakeholders
* Maps business processes

261112 Systems Analyst
Evaluates existing ICT systems.

261311 Analyst Programmer
Writes code and tests software.

261312 Developer Programmer
Writes program code.

261313 Software Engineer
Designs and maintains software systems.
";

struct FixedSemantic {
    outcome: SemanticOutcome,
}

impl SemanticIndex for FixedSemantic {
    fn query(&self, _text: &str, _k: usize) -> SemanticOutcome {
        self.outcome.clone()
    }
}

fn opts(corpus_path: &Path) -> RetrieverOptions {
    RetrieverOptions {
        corpus_path: corpus_path.to_path_buf(),
        source_name: "OSCA ICT Roles".to_string(),
        lexical_bonus: 0.15,
    }
}

fn write_corpus(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("roles.txt");
    fs::write(&path, CORPUS).unwrap();
    path
}

fn semantic_hit(chunk: &str, score: f32) -> Hit {
    Hit {
        text: format!("text for {chunk}"),
        source_id: "OSCA ICT Roles".to_string(),
        role_title: "261111 ICT Business Analyst".to_string(),
        chunk_id: ChunkId::from(chunk),
        score,
    }
}

#[test]
fn lexical_fallback_labels_hits_and_bounds_scores() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_corpus(dir.path());
    let r = HybridRetriever::new(opts(&path), Arc::new(TaskLexicon::default()));

    let hits = r.search("business analyst requirements", 3).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk_id, ChunkId::Index(0));
    for h in &hits {
        assert_eq!(h.source_id, "OSCA ICT Roles (fallback)");
        assert!((0.0..=1.0).contains(&h.score));
    }
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn unavailable_semantic_index_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_corpus(dir.path());
    let semantic = FixedSemantic {
        outcome: SemanticOutcome::Unavailable(AppError::new("SEMANTIC_UNAVAILABLE", "down")),
    };
    let r = HybridRetriever::new(opts(&path), Arc::new(TaskLexicon::default()))
        .with_semantic(Box::new(semantic));

    let hits = r.search("software engineer", 2).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.source_id.ends_with("(fallback)")));
}

#[test]
fn semantic_hits_are_used_as_is_and_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let semantic = FixedSemantic {
        outcome: SemanticOutcome::Hits(vec![
            semantic_hit("osca:1", 0.9),
            semantic_hit("osca:2", 0.8),
            semantic_hit("osca:3", 0.7),
        ]),
    };
    // No corpus on disk: the lexical path must not be touched.
    let r = HybridRetriever::new(
        opts(&dir.path().join("absent.txt")),
        Arc::new(TaskLexicon::default()),
    )
    .with_semantic(Box::new(semantic));

    let hits = r.search("business analyst", 2).unwrap();
    assert_eq!(hits, vec![semantic_hit("osca:1", 0.9), semantic_hit("osca:2", 0.8)]);
}

#[test]
fn empty_semantic_result_is_not_a_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let semantic = FixedSemantic {
        outcome: SemanticOutcome::Hits(Vec::new()),
    };
    let r = HybridRetriever::new(
        opts(&dir.path().join("absent.txt")),
        Arc::new(TaskLexicon::default()),
    )
    .with_semantic(Box::new(semantic));
    assert_eq!(r.search("anything", 4).unwrap(), Vec::<Hit>::new());
}

#[test]
fn missing_corpus_errors_and_recovers_once_present() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roles.txt");
    let r = HybridRetriever::new(opts(&path), Arc::new(TaskLexicon::default()));

    let err = r.search("analyst", 2).unwrap_err();
    assert_eq!(err.code, "CORPUS_MISSING");

    fs::write(&path, CORPUS).unwrap();
    assert_eq!(r.search("analyst", 2).unwrap().len(), 2);
}

#[test]
fn repeated_searches_are_identical() {
    let r = HybridRetriever::new(
        opts(Path::new("unused.txt")),
        Arc::new(TaskLexicon::default()),
    )
    .with_lexical_index(LexicalIndex::from_text(CORPUS));

    let a = r.search("writes code", 4).unwrap();
    let b = r.search("writes code", 4).unwrap();
    assert_eq!(a, b);
    assert!(r.search("writes code", 0).unwrap().is_empty());
}
