use std::cell::Cell;

use cqa_ai::tools::salary::{extract_numbers, fallback_estimate, normalize_query};
use cqa_ai::tools::{Backoff, NumericTool, SalaryOptions, SalaryTool, WebSearch};
use cqa_core::domain::SearchSnippet;
use cqa_core::error::AppError;
use pretty_assertions::assert_eq;

fn opts() -> SalaryOptions {
    SalaryOptions {
        region_hint: "Australia".to_string(),
        max_results: 6,
        attempts: 4,
    }
}

fn snippet(title: &str, body: &str) -> SearchSnippet {
    SearchSnippet {
        title: title.to_string(),
        href: "https://example.au".to_string(),
        body: body.to_string(),
    }
}

/// Fails `failures` times, then returns `results`.
struct ScriptedSearch {
    failures: u32,
    results: Vec<SearchSnippet>,
    calls: Cell<u32>,
}

impl ScriptedSearch {
    fn new(failures: u32, results: Vec<SearchSnippet>) -> Self {
        Self {
            failures,
            results,
            calls: Cell::new(0),
        }
    }
}

impl WebSearch for ScriptedSearch {
    fn text(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchSnippet>, AppError> {
        let n = self.calls.get() + 1;
        self.calls.set(n);
        if n <= self.failures {
            return Err(AppError::new("SALARY_SEARCH_FAILED", "rate limited"));
        }
        Ok(self.results.clone())
    }
}

#[test]
fn numbers_are_extracted_and_filtered() {
    let text = "Average A$95,000 or AUD 105,000, 120k typical, $1,200 weekly, 999k nonsense";
    assert_eq!(extract_numbers(text), vec![95_000, 105_000, 120_000]);
}

#[test]
fn query_is_normalized_for_regional_search() {
    assert_eq!(
        normalize_query("Average salary for a Data Analyst in Hobart", "Australia"),
        "for a data analyst in hobart average salary Australia site:au"
    );
}

#[test]
fn estimate_is_the_mean_and_only_three_hits_are_kept() {
    let search = ScriptedSearch::new(
        0,
        vec![
            snippet("Data analyst pay", "$90,000 per year"),
            snippet("", "Up to $110,000"),
            snippet("", ""),
            snippet("Range", "around 100k"),
            snippet("Other", "no numbers here"),
        ],
    );
    let tool = SalaryTool::new(&search, opts()).with_backoff(Backoff::none());
    let est = tool.estimate("average salary for a data analyst").unwrap();

    assert_eq!(est.estimate_aud, Some(100_000));
    assert_eq!(est.samples_used, 3);
    assert_eq!(est.hits.len(), 3);
    assert!(!est.fallback_used);
    assert_eq!(est.error, None);
    assert_eq!(search.calls.get(), 1);
}

#[test]
fn persistent_failure_uses_fallback_table_after_all_attempts() {
    let search = ScriptedSearch::new(u32::MAX, Vec::new());
    let tool = SalaryTool::new(&search, opts()).with_backoff(Backoff::none());
    let est = tool.estimate("average salary for a data analyst in Hobart").unwrap();

    assert_eq!(search.calls.get(), 4);
    assert_eq!(est.estimate_aud, Some(85_000));
    assert!(est.fallback_used);
    assert_eq!(est.samples_used, 0);
    assert!(est.error.unwrap().contains("SALARY_SEARCH_FAILED"));
}

#[test]
fn transient_failures_are_retried() {
    let search = ScriptedSearch::new(2, vec![snippet("Pay", "A$120,000")]);
    let tool = SalaryTool::new(&search, opts()).with_backoff(Backoff::none());
    let est = tool.estimate("software engineer salary").unwrap();

    assert_eq!(search.calls.get(), 3);
    assert_eq!(est.estimate_aud, Some(120_000));
    assert_eq!(est.error, None);
}

#[test]
fn unknown_role_without_numbers_has_no_estimate() {
    let search = ScriptedSearch::new(0, vec![snippet("Nothing", "no figures")]);
    let tool = SalaryTool::new(&search, opts()).with_backoff(Backoff::none());
    let est = tool.estimate("salary of a lighthouse keeper").unwrap();

    assert_eq!(est.estimate_aud, None);
    assert!(!est.fallback_used);
    assert_eq!(fallback_estimate("Cybersecurity analyst pay"), Some(120_000));
}
