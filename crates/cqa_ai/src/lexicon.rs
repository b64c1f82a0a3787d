//! Keyword lexicons for task extraction and the lexical task bonus.
//!
//! The word lists are plain data; [`TaskLexicon::new`] compiles them once so extractors and
//! retrievers can share the result behind an `Arc`. Tests substitute their own lists.

use regex::Regex;

use cqa_core::error::AppError;

#[derive(Debug, Clone)]
pub struct LexiconTerms {
    /// Base forms; inflections (-s, -es, -ed, -ing) are matched automatically.
    pub task_verbs: Vec<String>,
    /// Substrings that mark a line as task content regardless of its first word.
    pub domain_keywords: Vec<String>,
    /// Substrings that disqualify a line (exclusion or classification text).
    pub negative_phrases: Vec<String>,
    /// Regex fragments that open a task section.
    pub open_headers: Vec<String>,
    /// Regex fragments that close a task section.
    pub close_headers: Vec<String>,
    /// Substrings that earn the synthesizer's keyword bonus.
    pub duty_markers: Vec<String>,
    /// Regex fragments for text that talks about tasks; used by corpus stats.
    pub task_hints: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for LexiconTerms {
    fn default() -> Self {
        Self {
            task_verbs: owned(&[
                "analyse", "analyze", "assess", "evaluate", "elicit", "document", "gather", "map",
                "model", "design", "specify", "define", "facilitate", "coordinate", "collaborate",
                "communicate", "liaise", "translate", "plan", "prioritise", "prioritize",
                "validate", "verify", "test", "recommend", "implement", "monitor", "support",
                "improve", "optimise", "optimize", "manage", "lead", "present", "report",
            ]),
            domain_keywords: owned(&[
                "requirements",
                "specification",
                "user story",
                "use case",
                "process model",
                "workflow",
                "backlog",
                "acceptance criteria",
                "gap analysis",
                "feasibility",
                "business case",
            ]),
            negative_phrases: owned(&[
                "are excluded",
                "included in occupation",
                "classification",
                "business analysts (non",
            ]),
            open_headers: owned(&[
                r"main\s+tasks?",
                r"key\s+tasks?",
                r"typical\s+tasks?",
                r"job\s+tasks?",
                r"key\s+responsibilit(?:y|ies)",
                r"role\s+responsibilit(?:y|ies)",
                r"responsibilit(?:y|ies)",
                r"position\s+duties",
                r"core\s+duties",
                r"duties",
                r"what\s+you'?ll\s+do",
                r"what\s+you\s+will\s+do",
            ]),
            close_headers: owned(&[
                r"alternative\s+titles?",
                r"specialisations?",
                r"exclusions?",
                r"not\s+included",
                r"occupation\s+level",
                r"classification",
                r"overview",
                r"summary",
                r"skill\s+level",
            ]),
            duty_markers: owned(&["task", "dutie", "responsibilit"]),
            task_hints: owned(&[
                r"main\s*tasks?",
                r"dut(?:y|ies)",
                r"responsibilit(?:y|ies)",
                r"key\s*tasks?",
                r"core\s*duties?",
            ]),
        }
    }
}

/// Compiled lexicon shared by the extractor, synthesizer and lexical retriever.
#[derive(Debug, Clone)]
pub struct TaskLexicon {
    terms: LexiconTerms,
    verb_lead: Regex,
    verb_suffix: Regex,
    open_line: Regex,
    open_inline: Regex,
    close_line: Regex,
    close_inline: Regex,
    task_hint: Regex,
}

impl TaskLexicon {
    pub fn new(terms: LexiconTerms) -> Result<Self, AppError> {
        let verbs = terms
            .task_verbs
            .iter()
            .map(|v| inflections(&v.to_lowercase()))
            .collect::<Vec<_>>()
            .join("|");
        let open = terms.open_headers.join("|");
        let close = terms.close_headers.join("|");
        let hints = terms.task_hints.join("|");

        Ok(Self {
            verb_lead: compile(&format!(r"^(?:{verbs})\b"))?,
            verb_suffix: compile(r"^[a-z][a-z]+(?:e|ing|es)\b")?,
            open_line: compile(&format!(r"(?i)^(?:{open})\b\s*[:\-–—]?"))?,
            open_inline: compile(&format!(r"(?i)\b(?:{open})\b\s*[:\-–—]?\s*\*"))?,
            close_line: compile(&format!(r"(?i)^(?:{close})\b"))?,
            close_inline: compile(&format!(r"(?i)\b(?:{close})\b\s*:"))?,
            task_hint: compile(&format!(r"(?i)(?:{hints})"))?,
            terms,
        })
    }

    pub fn terms(&self) -> &LexiconTerms {
        &self.terms
    }

    /// True when the lower-cased line starts with a task verb in any common inflection.
    pub fn starts_with_task_verb(&self, lower: &str) -> bool {
        self.verb_lead.is_match(lower)
    }

    pub fn has_domain_keyword(&self, lower: &str) -> bool {
        self.terms.domain_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    pub fn has_negative_phrase(&self, lower: &str) -> bool {
        self.terms.negative_phrases.iter().any(|k| lower.contains(k.as_str()))
    }

    pub fn has_duty_marker(&self, lower: &str) -> bool {
        self.terms.duty_markers.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Crude verb detector: a leading word ending in -e, -ing or -es.
    pub fn looks_like_verb(&self, lower: &str) -> bool {
        self.verb_suffix.is_match(lower)
    }

    /// If `line` opens a task section, returns the remainder of the line after the header.
    pub fn open_section<'l>(&self, line: &'l str) -> Option<&'l str> {
        if let Some(m) = self.open_line.find(line) {
            return Some(&line[m.end()..]);
        }
        // Inline form: "... Main tasks * first * second"; keep the asterisk for the splitter.
        self.open_inline
            .find(line)
            .map(|m| &line[m.end() - 1..])
    }

    pub fn closes_section(&self, line: &str) -> bool {
        self.close_line.is_match(line)
    }

    /// Byte offset of a closing header written mid-line, as in "... Alternative title: X".
    /// Only the colon form counts; bare words like "summary" are common in task text.
    pub fn close_inline_at(&self, line: &str) -> Option<usize> {
        self.close_inline.find(line).map(|m| m.start())
    }

    /// Pattern for text that talks about tasks, duties or responsibilities.
    pub fn task_hint(&self) -> &Regex {
        &self.task_hint
    }
}

impl Default for TaskLexicon {
    fn default() -> Self {
        Self::new(LexiconTerms::default()).expect("built-in task lexicon compiles")
    }
}

fn compile(pattern: &str) -> Result<Regex, AppError> {
    Regex::new(pattern).map_err(|e| {
        AppError::config("Task lexicon pattern failed to compile")
            .with_details(format!("pattern={pattern}; err={e}"))
    })
}

/// Regex alternation for a verb and its usual inflected forms.
fn inflections(verb: &str) -> String {
    let v = regex::escape(verb);
    if let Some(stem) = v.strip_suffix('e') {
        format!("{stem}(?:e|es|ed|ing)")
    } else if let Some(stem) = v.strip_suffix('y') {
        format!("{stem}(?:y|ies|ied|ying)")
    } else {
        // The optional letter covers doubled consonants (mapped, planning).
        format!("{v}(?:s|es|ed|ing|[a-z]ed|[a-z]ing)?")
    }
}
