use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub retrieval: Retrieval,
    pub semantic: Semantic,
    pub extraction: Extraction,
    pub synthesis: Synthesis,
    pub salary: Salary,
    pub log: Log,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Retrieval {
    pub top_k: usize,
    /// Retrieval floor: below this the answer is a refusal.
    pub threshold: f32,
    /// Confidence floor: below this the answer carries a warning banner.
    pub low_conf_score: f32,
    pub lexical_bonus: f32,
    pub corpus_path: PathBuf,
    pub source_name: String,
}

impl Default for Retrieval {
    fn default() -> Self {
        Self {
            top_k: 4,
            threshold: 0.40,
            low_conf_score: 0.55,
            lexical_bonus: 0.15,
            corpus_path: PathBuf::from("data_processed/osca_ict_roles.utf8.txt"),
            source_name: "OSCA ICT Roles".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Semantic {
    pub enabled: bool,
    pub index_dir: PathBuf,
    pub collection: String,
    pub embed_model: String,
    pub ollama_base_url: String,
}

impl Default for Semantic {
    fn default() -> Self {
        Self {
            enabled: true,
            index_dir: PathBuf::from("index"),
            collection: "osca_ict".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            ollama_base_url: "http://127.0.0.1:11434".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Extraction {
    pub max_items: usize,
    pub min_bullet_tokens: usize,
    pub min_sentence_tokens: usize,
}

impl Default for Extraction {
    fn default() -> Self {
        Self {
            max_items: 10,
            min_bullet_tokens: 2,
            min_sentence_tokens: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Synthesis {
    pub visible_points: usize,
    pub pool_size: usize,
    pub keyword_bonus: f32,
    pub verb_bonus: f32,
    pub preview_width: usize,
    pub stitch_hits: usize,
    pub stitch_chars: usize,
}

impl Default for Synthesis {
    fn default() -> Self {
        Self {
            visible_points: 6,
            pool_size: 8,
            keyword_bonus: 0.25,
            verb_bonus: 0.25,
            preview_width: 140,
            stitch_hits: 2,
            stitch_chars: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Salary {
    pub region_hint: String,
    pub max_results: usize,
    pub attempts: u32,
}

impl Default for Salary {
    fn default() -> Self {
        Self {
            region_hint: "Australia".to_string(),
            max_results: 6,
            attempts: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Log {
    pub level: String,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
