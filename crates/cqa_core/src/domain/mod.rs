use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Chunk identity as reported by the backend: the semantic index uses string ids, the lexical
/// fallback uses block positions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum ChunkId {
    Index(u64),
    Key(String),
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkId::Index(i) => write!(f, "{i}"),
            ChunkId::Key(k) => f.write_str(k),
        }
    }
}

impl From<u64> for ChunkId {
    fn from(v: u64) -> Self {
        ChunkId::Index(v)
    }
}

impl From<&str> for ChunkId {
    fn from(v: &str) -> Self {
        ChunkId::Key(v.to_string())
    }
}

impl From<String> for ChunkId {
    fn from(v: String) -> Self {
        ChunkId::Key(v)
    }
}

/// One retrieved passage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hit {
    pub text: String,
    pub source_id: String,
    pub role_title: String,
    pub chunk_id: ChunkId,
    // Always within [0, 1].
    pub score: f32,
}

impl Hit {
    pub fn citation_key(&self) -> (&str, &ChunkId) {
        (self.source_id.as_str(), &self.chunk_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub source_id: String,
    pub role_title: String,
    pub chunk_id: ChunkId,
    pub preview: String,
}

impl Citation {
    pub fn key(&self) -> (&str, &ChunkId) {
        (self.source_id.as_str(), &self.chunk_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Rag,
    Salary,
    Both,
}

/// Document branch of a routed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub score: f32,
    // false when the pipeline could not run (e.g. missing corpus).
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AppError>,
}

impl RagAnswer {
    pub fn failed(error: AppError) -> Self {
        Self {
            answer: String::new(),
            citations: Vec::new(),
            score: 0.0,
            used: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSnippet {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// Output of the numeric salary tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SalaryEstimate {
    pub query: String,
    pub estimate_aud: Option<u32>,
    pub samples_used: usize,
    pub hits: Vec<SearchSnippet>,
    pub error: Option<String>,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolBranch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<SalaryEstimate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The unit returned to callers; only the branches of the selected route are populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutedResponse {
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag: Option<RagAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolBranch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolBranch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AppError>,
}

impl RoutedResponse {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            rag: None,
            tool: None,
            tools: None,
            error: None,
        }
    }
}
