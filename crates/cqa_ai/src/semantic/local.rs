use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cqa_core::error::{codes, AppError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::similarity::{cosine_similarity, l2_norm};
use super::{SemanticIndex, SemanticOutcome, SemanticRows};
use crate::embeddings::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    #[serde(default)]
    pub chunk_count: u32,
}

/// Stored passage for one vector id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub document: String,
    pub metadata: Map<String, Value>,
}

/// File-backed vector collection: `index_status.json`, `index_vectors.json` and
/// `index_records.json` under `<index_dir>/<collection>/`.
pub struct LocalVectorIndex {
    dir: PathBuf,
    model: String,
    embedder: Box<dyn Embedder + Send + Sync>,
}

impl LocalVectorIndex {
    pub fn open(
        index_dir: &Path,
        collection: &str,
        model: impl Into<String>,
        embedder: Box<dyn Embedder + Send + Sync>,
    ) -> Self {
        Self {
            dir: index_dir.join(collection),
            model: model.into(),
            embedder,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn status(&self) -> Result<IndexStatus, AppError> {
        status_at(&self.dir)
    }

    fn try_query(&self, text: &str, k: usize) -> Result<SemanticRows, AppError> {
        let st = self.status()?;
        if !st.ready {
            return Err(AppError::new(codes::SEMANTIC_UNAVAILABLE, "Semantic index not ready"));
        }
        if let Some(m) = st.model.as_deref() {
            if m != self.model {
                return Err(AppError::new(
                    codes::SEMANTIC_UNAVAILABLE,
                    "Semantic index was built with a different embedding model",
                )
                .with_details(format!("index_model={m}; configured={}", self.model)));
            }
        }

        let qv = self.embedder.embed(&self.model, text)?;
        if let Some(dims) = st.dims {
            if qv.len() as u32 != dims {
                return Err(AppError::new(
                    codes::SEMANTIC_SCHEMA_MISMATCH,
                    "Query embedding dims do not match index dims",
                )
                .with_details(format!("index_dims={dims}; query_dims={}", qv.len())));
            }
        }
        let qnorm = l2_norm(&qv);
        if qnorm == 0.0 {
            return Err(AppError::new(codes::SEMANTIC_UNAVAILABLE, "Query embedding norm is zero"));
        }

        let vectors: BTreeMap<String, Vec<f32>> =
            read_json(&self.dir.join("index_vectors.json"), "index vectors")?;
        let mut records: BTreeMap<String, VectorRecord> =
            read_json(&self.dir.join("index_records.json"), "index records")?;

        let mut scored: Vec<(&String, f32)> = Vec::with_capacity(vectors.len());
        for (id, v) in &vectors {
            if v.len() != qv.len() {
                return Err(AppError::new(
                    codes::SEMANTIC_SCHEMA_MISMATCH,
                    "Index vector dims mismatch",
                )
                .with_details(format!("id={id}; expected={}; got={}", qv.len(), v.len())));
            }
            let vnorm = l2_norm(v);
            if vnorm == 0.0 {
                continue;
            }
            scored.push((id, 1.0 - cosine_similarity(&qv, v, qnorm, vnorm)));
        }
        // Nearest first; ids break ties so results are reproducible.
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(b.0))
        });
        scored.truncate(k);

        let mut rows = SemanticRows::default();
        for (id, dist) in scored {
            let rec = records.remove(id).ok_or_else(|| {
                AppError::new(codes::SEMANTIC_SCHEMA_MISMATCH, "Vector has no stored record")
                    .with_details(format!("id={id}"))
            })?;
            rows.documents.push(rec.document);
            rows.metadatas.push(rec.metadata);
            rows.distances.push(dist);
        }
        Ok(rows)
    }
}

impl SemanticIndex for LocalVectorIndex {
    fn query(&self, text: &str, k: usize) -> SemanticOutcome {
        match self.try_query(text, k).and_then(SemanticRows::into_hits) {
            Ok(hits) => SemanticOutcome::Hits(hits),
            Err(e) => SemanticOutcome::Unavailable(e),
        }
    }
}

/// Status of `<index_dir>/<collection>` without opening an embedder.
pub fn read_status(index_dir: &Path, collection: &str) -> Result<IndexStatus, AppError> {
    status_at(&index_dir.join(collection))
}

fn status_at(dir: &Path) -> Result<IndexStatus, AppError> {
    let path = dir.join("index_status.json");
    if !path.exists() {
        return Err(
            AppError::new(codes::SEMANTIC_UNAVAILABLE, "Semantic collection not found")
                .with_details(format!("path={}", dir.display())),
        );
    }
    read_json(&path, "index status")
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new(codes::SEMANTIC_UNAVAILABLE, format!("Failed to read {what}"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new(codes::SEMANTIC_SCHEMA_MISMATCH, format!("Failed to decode {what}"))
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}
