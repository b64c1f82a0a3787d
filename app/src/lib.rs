use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cqa_ai::eval::{read_items, run_eval};
use cqa_ai::lexical::CorpusStats;
use cqa_ai::lexicon::TaskLexicon;
use cqa_ai::ollama::OllamaClient;
use cqa_ai::pipeline::RagPipeline;
use cqa_ai::route::{IntentLexicon, IntentRouter};
use cqa_ai::semantic::IndexStatus;
use cqa_ai::tools::{DuckDuckGoLite, SalaryOptions, SalaryTool};
use cqa_core::config::{self, Config};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "careerqa.toml";

#[derive(Debug, Parser)]
#[command(version, about = "Grounded Q&A over ICT role descriptions", rename_all = "kebab")]
pub struct Args {
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Route a question to the documents, the salary tool, or both.
    Ask {
        #[arg(required = true, value_name = "QUERY")]
        query: Vec<String>,
    },
    /// Summarize how the corpus splits into role blocks.
    CorpusStats {
        #[arg(long, value_name = "NAME", default_value = "ICT Business Analyst")]
        role: String,
    },
    /// Score answers against a JSONL file of gold questions.
    Eval {
        #[arg(long, short = 'd', value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct CorpusReport {
    corpus_path: String,
    #[serde(flatten)]
    stats: CorpusStats,
    semantic: SemanticHealth,
}

#[derive(Debug, Serialize)]
struct SemanticHealth {
    enabled: bool,
    ollama_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<IndexStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(args: Args) -> color_eyre::Result<()> {
    let cfg = resolve_config(args.config.as_deref())?;
    init_tracing(&cfg.log.level);

    let lexicon = Arc::new(TaskLexicon::default());
    let pipeline = RagPipeline::from_config(&cfg, lexicon.clone())?;

    match args.command {
        Command::Ask { query } => {
            let query = query.join(" ");
            let salary =
                SalaryTool::new(DuckDuckGoLite::default(), SalaryOptions::from(&cfg.salary));
            let router = IntentRouter::new(IntentLexicon::default(), &pipeline, &salary);
            let resp = router.route(&query);
            print_json(&resp)
        }
        Command::CorpusStats { role } => {
            let index = pipeline.retriever().lexical_index()?;
            let report = CorpusReport {
                corpus_path: cfg.retrieval.corpus_path.display().to_string(),
                stats: index.stats(&role, lexicon.task_hint()),
                semantic: semantic_health(&cfg),
            };
            print_json(&report)
        }
        Command::Eval { path } => {
            let items = read_items(&path)?;
            if items.is_empty() {
                return Err(eyre::eyre!("Eval file must include at least one item."));
            }
            let report = run_eval(&items, &pipeline);
            tracing::info!(
                total = report.total,
                citations_ok = report.citations_ok,
                answers_ok = report.answers_ok,
                "Eval finished."
            );
            print_json(&report)
        }
    }
}

/// `--config` wins; otherwise `careerqa.toml` in the working directory, else built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> color_eyre::Result<Config> {
    if let Some(path) = explicit {
        return Ok(config::load(path)?);
    }
    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Ok(config::load(local)?);
    }
    let cfg = Config::default();
    config::validate(&cfg)?;
    Ok(cfg)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn semantic_health(cfg: &Config) -> SemanticHealth {
    let s = &cfg.semantic;
    if !s.enabled {
        return SemanticHealth {
            enabled: false,
            ollama_ok: false,
            index: None,
            error: None,
        };
    }
    let ollama = OllamaClient::new(&s.ollama_base_url).and_then(|c| c.health_check());
    let index = cqa_ai::semantic::read_status(&s.index_dir, &s.collection);
    let error = match (&ollama, &index) {
        (Err(e), _) | (_, Err(e)) => Some(e.to_string()),
        _ => None,
    };
    SemanticHealth {
        enabled: true,
        ollama_ok: ollama.is_ok(),
        index: index.ok(),
        error,
    }
}

fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
