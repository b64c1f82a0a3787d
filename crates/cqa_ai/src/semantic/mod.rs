use cqa_core::domain::{ChunkId, Hit};
use cqa_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod local;
mod similarity;

pub use local::{read_status, IndexStatus, LocalVectorIndex, VectorRecord};
pub use similarity::{cosine_similarity, l2_norm};

/// Result of a semantic query. `Unavailable` is an expected state, not a failure of the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Hits(Vec<Hit>),
    Unavailable(AppError),
}

pub trait SemanticIndex {
    fn query(&self, text: &str, k: usize) -> SemanticOutcome;
}

/// Raw nearest-neighbour rows as returned by a vector store: three parallel arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticRows {
    pub documents: Vec<String>,
    pub metadatas: Vec<Map<String, Value>>,
    pub distances: Vec<f32>,
}

impl SemanticRows {
    /// Validate rows into hits sorted by descending score (`1 - distance`, clamped).
    pub fn into_hits(self) -> Result<Vec<Hit>, AppError> {
        let n = self.documents.len();
        if self.metadatas.len() != n || self.distances.len() != n {
            return Err(AppError::new(
                codes::SEMANTIC_SCHEMA_MISMATCH,
                "Semantic rows are not parallel",
            )
            .with_details(format!(
                "documents={n}; metadatas={}; distances={}",
                self.metadatas.len(),
                self.distances.len()
            )));
        }

        let mut hits = Vec::with_capacity(n);
        for (i, ((text, meta), dist)) in self
            .documents
            .into_iter()
            .zip(self.metadatas)
            .zip(self.distances)
            .enumerate()
        {
            if !dist.is_finite() {
                return Err(malformed(i, "distance is not finite"));
            }
            hits.push(Hit {
                text,
                source_id: meta_str(&meta, "source").ok_or_else(|| malformed(i, "missing source"))?,
                role_title: meta_str(&meta, "role_title")
                    .ok_or_else(|| malformed(i, "missing role_title"))?,
                chunk_id: meta_chunk_id(&meta).ok_or_else(|| malformed(i, "missing chunk_id"))?,
                score: (1.0 - dist).clamp(0.0, 1.0),
            });
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }
}

fn meta_str(meta: &Map<String, Value>, key: &str) -> Option<String> {
    meta.get(key)?.as_str().map(str::to_string)
}

fn meta_chunk_id(meta: &Map<String, Value>) -> Option<ChunkId> {
    match meta.get("chunk_id")? {
        Value::String(s) => Some(ChunkId::Key(s.clone())),
        Value::Number(n) => n.as_u64().map(ChunkId::Index),
        _ => None,
    }
}

fn malformed(row: usize, what: &str) -> AppError {
    AppError::new(codes::SEMANTIC_SCHEMA_MISMATCH, "Semantic row metadata is malformed")
        .with_details(format!("row={row}; {what}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn rows_convert_to_sorted_clamped_hits() {
        let rows = SemanticRows {
            documents: vec!["far".into(), "near".into()],
            metadatas: vec![
                meta(json!({"source": "OSCA", "role_title": "A", "chunk_id": 3})),
                meta(json!({"source": "OSCA", "role_title": "B", "chunk_id": "osca:1"})),
            ],
            distances: vec![1.4, -0.2],
        };
        let hits = rows.into_hits().unwrap();
        assert_eq!(hits[0].text, "near");
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(hits[0].chunk_id, ChunkId::Key("osca:1".into()));
        assert_eq!(hits[1].score, 0.0);
        assert_eq!(hits[1].chunk_id, ChunkId::Index(3));
    }

    #[test]
    fn rows_missing_metadata_are_rejected() {
        let rows = SemanticRows {
            documents: vec!["x".into()],
            metadatas: vec![meta(json!({"source": "OSCA", "chunk_id": 1}))],
            distances: vec![0.1],
        };
        let err = rows.into_hits().unwrap_err();
        assert_eq!(err.code, codes::SEMANTIC_SCHEMA_MISMATCH);
        assert!(err.details.unwrap().contains("role_title"));
    }

    #[test]
    fn rows_must_be_parallel() {
        let rows = SemanticRows {
            documents: vec!["x".into()],
            metadatas: vec![],
            distances: vec![0.1],
        };
        assert!(rows.into_hits().is_err());
    }
}
