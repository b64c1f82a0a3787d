mod types;

pub use types::{Config, Extraction, Log, Retrieval, Salary, Semantic, Synthesis};

use std::fs;
use std::path::Path;

use crate::error::{codes, AppError};

pub fn load(path: &Path) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::new(codes::CONFIG_READ_FAILED, "Failed to read config file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let cfg = parse(&raw).map_err(|e| {
        let details = match e.details.as_deref() {
            Some(d) => format!("path={}; {}", path.display(), d),
            None => format!("path={}", path.display()),
        };
        e.with_details(details)
    })?;

    // Relative corpus/index paths resolve against the config file's directory.
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(resolve_paths(cfg, base))
}

pub fn parse(raw: &str) -> Result<Config, AppError> {
    let cfg: Config = toml::from_str(raw).map_err(|e| {
        AppError::new(codes::CONFIG_INVALID, "Failed to parse config").with_details(e.to_string())
    })?;
    validate(&cfg)?;
    Ok(cfg)
}

fn resolve_paths(mut cfg: Config, base: &Path) -> Config {
    if cfg.retrieval.corpus_path.is_relative() {
        cfg.retrieval.corpus_path = base.join(&cfg.retrieval.corpus_path);
    }
    if cfg.semantic.index_dir.is_relative() {
        cfg.semantic.index_dir = base.join(&cfg.semantic.index_dir);
    }
    cfg
}

pub fn validate(cfg: &Config) -> Result<(), AppError> {
    let r = &cfg.retrieval;
    if r.top_k == 0 {
        return Err(AppError::config("retrieval.top_k must be greater than zero."));
    }
    for (name, v) in [
        ("retrieval.threshold", r.threshold),
        ("retrieval.low_conf_score", r.low_conf_score),
        ("retrieval.lexical_bonus", r.lexical_bonus),
    ] {
        if !v.is_finite() || !(0.0..=1.0).contains(&v) {
            return Err(
                AppError::config(format!("{name} must be in the range 0.0-1.0."))
                    .with_details(format!("value={v}")),
            );
        }
    }
    if r.threshold > r.low_conf_score {
        return Err(AppError::config(
            "retrieval.threshold must not exceed retrieval.low_conf_score.",
        ));
    }
    if r.source_name.trim().is_empty() {
        return Err(AppError::config("retrieval.source_name must be non-empty."));
    }

    if cfg.semantic.enabled {
        if cfg.semantic.collection.trim().is_empty() {
            return Err(AppError::config("semantic.collection must be non-empty."));
        }
        if cfg.semantic.embed_model.trim().is_empty() {
            return Err(AppError::config("semantic.embed_model must be non-empty."));
        }
    }

    let e = &cfg.extraction;
    if e.max_items == 0 || e.min_bullet_tokens == 0 || e.min_sentence_tokens == 0 {
        return Err(AppError::config(
            "extraction.max_items, min_bullet_tokens and min_sentence_tokens must be greater \
             than zero.",
        ));
    }

    let s = &cfg.synthesis;
    if s.visible_points == 0 || s.pool_size == 0 {
        return Err(AppError::config(
            "synthesis.visible_points and synthesis.pool_size must be greater than zero.",
        ));
    }
    if s.visible_points > s.pool_size {
        return Err(AppError::config(
            "synthesis.visible_points must not exceed synthesis.pool_size.",
        ));
    }
    if !s.keyword_bonus.is_finite()
        || !s.verb_bonus.is_finite()
        || s.keyword_bonus < 0.0
        || s.verb_bonus < 0.0
    {
        return Err(AppError::config(
            "synthesis.keyword_bonus and synthesis.verb_bonus must be finite and zero or greater.",
        ));
    }
    if s.preview_width < 8 {
        return Err(AppError::config("synthesis.preview_width must be at least 8."));
    }

    if cfg.salary.max_results == 0 || cfg.salary.attempts == 0 {
        return Err(AppError::config(
            "salary.max_results and salary.attempts must be greater than zero.",
        ));
    }

    Ok(())
}
