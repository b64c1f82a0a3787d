//! Salary estimates from web search snippets, with a small table of AU fallbacks.

use std::sync::LazyLock;
use std::time::Duration;

use cqa_core::config::Salary;
use cqa_core::domain::{SalaryEstimate, SearchSnippet};
use cqa_core::error::{codes, AppError};
use rand::Rng;
use regex::Regex;

use super::NumericTool;

pub const TOOL_NAME: &str = "salary_tool";

const MIN_PLAUSIBLE_AUD: u32 = 30_000;
const MAX_PLAUSIBLE_AUD: u32 = 400_000;
const KEPT_HITS: usize = 3;
const STRIP_TERMS: [&str; 7] = [
    "average",
    "salary",
    "pay",
    "wage",
    "per year",
    "australia",
    "aus",
];
const FALLBACK_AUD: [(&str, u32); 7] = [
    ("software engineer", 110_000),
    ("data analyst", 85_000),
    ("project manager", 120_000),
    ("teacher", 90_000),
    ("cybersecurity", 120_000),
    ("business analyst", 105_000),
    ("data engineer", 125_000),
];

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:A\$|\$)\s*([0-9][0-9,]{3,})").unwrap());
static AUD_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)AUD\s*([0-9][0-9,]{3,})").unwrap());
static K_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([1-3][0-9]{2})k\b").unwrap());

pub trait WebSearch {
    fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchSnippet>, AppError>;
}

impl<T: WebSearch + ?Sized> WebSearch for &T {
    fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchSnippet>, AppError> {
        (**self).text(query, max_results)
    }
}

/// Retry schedule for web search: fixed delays plus uniform jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub delays: Vec<Duration>,
    pub jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            delays: [700, 1400, 2800, 5000]
                .into_iter()
                .map(Duration::from_millis)
                .collect(),
            jitter: Duration::from_millis(400),
        }
    }
}

impl Backoff {
    /// Retry immediately.
    pub fn none() -> Self {
        Self {
            delays: Vec::new(),
            jitter: Duration::ZERO,
        }
    }

    /// Delay after the failed attempt `attempt` (0-based); the last delay repeats.
    pub fn delay(&self, attempt: usize) -> Duration {
        let base = self
            .delays
            .get(attempt)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO);
        if self.jitter.is_zero() {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..self.jitter.as_secs_f64());
        base + Duration::from_secs_f64(extra)
    }
}

#[derive(Debug, Clone)]
pub struct SalaryOptions {
    pub region_hint: String,
    pub max_results: usize,
    pub attempts: u32,
}

impl From<&Salary> for SalaryOptions {
    fn from(cfg: &Salary) -> Self {
        Self {
            region_hint: cfg.region_hint.clone(),
            max_results: cfg.max_results,
            attempts: cfg.attempts,
        }
    }
}

pub struct SalaryTool<S> {
    search: S,
    opts: SalaryOptions,
    backoff: Backoff,
}

impl<S: WebSearch> SalaryTool<S> {
    pub fn new(search: S, opts: SalaryOptions) -> Self {
        Self {
            search,
            opts,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Search, retrying failed attempts up to `attempts` times in total.
    pub fn search_with_backoff(&self, query: &str) -> Result<Vec<SearchSnippet>, AppError> {
        let attempts = self.opts.attempts.max(1) as usize;
        let mut attempt = 0usize;
        loop {
            match self.search.text(query, self.opts.max_results) {
                Ok(hits) => return Ok(hits),
                Err(e) if attempt + 1 >= attempts => return Err(e),
                Err(e) => {
                    let wait = self.backoff.delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        ?wait,
                        err = %e,
                        "Web search failed; retrying."
                    );
                    std::thread::sleep(wait);
                    attempt += 1;
                }
            }
        }
    }

    /// Always produces an estimate record; search failures land in `error`.
    pub fn run(&self, query: &str) -> SalaryEstimate {
        let q = normalize_query(query, &self.opts.region_hint);
        let mut hits = Vec::new();
        let mut nums: Vec<u32> = Vec::new();
        let mut error = None;

        match self.search_with_backoff(&q) {
            Ok(results) => {
                for r in results {
                    let title = r.title.trim().to_string();
                    let body = r.body.trim().to_string();
                    if title.is_empty() && body.is_empty() {
                        continue;
                    }
                    nums.extend(extract_numbers(&format!("{title} {body}")));
                    hits.push(SearchSnippet {
                        title,
                        href: r.href.trim().to_string(),
                        body,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(err = %e, "Salary search failed.");
                error = Some(e.to_string());
            }
        }

        let mut estimate = mean(&nums);
        let mut fallback_used = false;
        if estimate.is_none() {
            estimate = fallback_estimate(query);
            fallback_used = estimate.is_some();
        }
        hits.truncate(KEPT_HITS);

        SalaryEstimate {
            query: q,
            estimate_aud: estimate,
            samples_used: nums.len(),
            hits,
            error,
            fallback_used,
        }
    }
}

impl<S: WebSearch> NumericTool for SalaryTool<S> {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn estimate(&self, query: &str) -> Result<SalaryEstimate, AppError> {
        Ok(self.run(query))
    }
}

/// Strip salary words and append the regional search suffix.
pub fn normalize_query(query: &str, region_hint: &str) -> String {
    let mut ql = query.to_lowercase();
    for t in STRIP_TERMS {
        ql = ql.replace(t, "");
    }
    let ql = ql.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{ql} average salary {region_hint} site:au")
        .trim()
        .to_string()
}

/// Plausible AUD annual amounts mentioned in `text`, in pattern order.
pub fn extract_numbers(text: &str) -> Vec<u32> {
    let mut out = Vec::new();
    for re in [&*DOLLAR_AMOUNT, &*AUD_AMOUNT] {
        for c in re.captures_iter(text) {
            if let Ok(v) = c[1].replace(',', "").parse::<u32>() {
                out.push(v);
            }
        }
    }
    for c in K_AMOUNT.captures_iter(text) {
        if let Ok(v) = c[1].parse::<u32>() {
            out.push(v * 1000);
        }
    }
    out.retain(|v| (MIN_PLAUSIBLE_AUD..=MAX_PLAUSIBLE_AUD).contains(v));
    out
}

fn mean(nums: &[u32]) -> Option<u32> {
    if nums.is_empty() {
        return None;
    }
    let sum: u64 = nums.iter().map(|&n| u64::from(n)).sum();
    Some((sum / nums.len() as u64) as u32)
}

pub fn fallback_estimate(query: &str) -> Option<u32> {
    let ql = query.to_lowercase();
    FALLBACK_AUD
        .iter()
        .find(|(role, _)| ql.contains(role))
        .map(|&(_, v)| v)
}

static RESULT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*href=["']([^"']+)["'][^>]*class=["']result-link["'][^>]*>(.*?)</a>"#)
        .unwrap()
});
static RESULT_SNIPPET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<td[^>]*class=["']result-snippet["'][^>]*>(.*?)</td>"#).unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// DuckDuckGo's HTML-only endpoint, scraped for titles, links and snippets.
#[derive(Debug, Clone)]
pub struct DuckDuckGoLite {
    endpoint: String,
    region: String,
}

impl Default for DuckDuckGoLite {
    fn default() -> Self {
        Self {
            endpoint: "https://lite.duckduckgo.com/lite/".to_string(),
            region: "au-en".to_string(),
        }
    }
}

impl WebSearch for DuckDuckGoLite {
    fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchSnippet>, AppError> {
        let resp = ureq::post(&self.endpoint)
            .timeout(Duration::from_secs(10))
            .set("User-Agent", "careerqa/0.1")
            .send_form(&[("q", query), ("kl", self.region.as_str())]);

        let body = match resp {
            // 202 is DuckDuckGo's rate-limit answer.
            Ok(r) if r.status() == 200 => r.into_string().map_err(|e| {
                AppError::new(codes::SALARY_SEARCH_FAILED, "Failed to read search response")
                    .with_details(e.to_string())
            })?,
            Ok(r) => {
                return Err(AppError::new(codes::SALARY_SEARCH_FAILED, "Search request rejected")
                    .with_details(format!("status={}", r.status()))
                    .with_retryable(true))
            }
            Err(e) => {
                return Err(
                    AppError::new(codes::SALARY_SEARCH_FAILED, "Failed to call search endpoint")
                        .with_details(e.to_string())
                        .with_retryable(true),
                )
            }
        };
        Ok(parse_lite_results(&body, max_results))
    }
}

/// Pair result links with snippets by position.
pub fn parse_lite_results(html: &str, max_results: usize) -> Vec<SearchSnippet> {
    let snippets = RESULT_SNIPPET
        .captures_iter(html)
        .map(|c| html_text(&c[1]))
        .collect::<Vec<_>>();
    RESULT_LINK
        .captures_iter(html)
        .enumerate()
        .map(|(i, c)| SearchSnippet {
            title: html_text(&c[2]),
            href: c[1].to_string(),
            body: snippets.get(i).cloned().unwrap_or_default(),
        })
        .take(max_results)
        .collect()
}

fn html_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lite_results_pair_links_and_snippets() {
        let html = r#"
            <tr><td><a rel="nofollow" href="https://example.au/a" class='result-link'>Data <b>Analyst</b> pay</a></td></tr>
            <tr><td class='result-snippet'>Average $95,000 &amp; up</td></tr>
            <tr><td><a rel="nofollow" href="https://example.au/b" class='result-link'>Second</a></td></tr>
        "#;
        let hits = parse_lite_results(html, 6);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Data Analyst pay");
        assert_eq!(hits[0].href, "https://example.au/a");
        assert_eq!(hits[0].body, "Average $95,000 & up");
        assert_eq!(hits[1].body, "");
    }

    #[test]
    fn backoff_repeats_last_delay_without_jitter() {
        let b = Backoff {
            delays: vec![Duration::from_millis(1), Duration::from_millis(2)],
            jitter: Duration::ZERO,
        };
        assert_eq!(b.delay(0), Duration::from_millis(1));
        assert_eq!(b.delay(5), Duration::from_millis(2));
        assert_eq!(Backoff::none().delay(3), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let b = Backoff::default();
        for _ in 0..20 {
            let d = b.delay(0);
            assert!(d >= Duration::from_millis(700) && d < Duration::from_millis(1100), "{d:?}");
        }
    }
}
