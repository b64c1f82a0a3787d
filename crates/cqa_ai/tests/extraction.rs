use std::sync::Arc;

use cqa_ai::extract::{ExtractorOptions, Strategy, TaskExtractor};
use cqa_ai::lexicon::TaskLexicon;
use pretty_assertions::assert_eq;

fn extractor() -> TaskExtractor {
    TaskExtractor::new(Arc::new(TaskLexicon::default()), ExtractorOptions::default())
}

#[test]
fn inline_task_list_after_role_header() {
    let text = "273232 ICT Business Analyst Identifies user needs. Main tasks \
                * Gathers requirements * Maps business processes * Documents specifications";
    let (strategy, items) = extractor().extract_with_strategy(text).unwrap();
    assert_eq!(strategy, Strategy::TaskSection);
    assert_eq!(
        items,
        vec!["Gathers requirements", "Maps business processes", "Documents specifications"]
    );
}

#[test]
fn inline_task_list_stops_at_inline_closing_header() {
    let text = "273232 ICT Business Analyst Main tasks * Gathers requirements \
                * Documents specifications Alternative title: Business Consultant \
                * Manages vendors";
    let (strategy, items) = extractor().extract_with_strategy(text).unwrap();
    assert_eq!(strategy, Strategy::TaskSection);
    assert_eq!(items, vec!["Gathers requirements", "Documents specifications"]);
}

#[test]
fn summary_word_inside_a_task_is_kept() {
    let text = "Main tasks * Writes a summary of findings * Presents options to sponsors";
    assert_eq!(
        extractor().run_strategy(Strategy::TaskSection, text),
        vec!["Writes a summary of findings", "Presents options to sponsors"]
    );
}

#[test]
fn line_bullets_stop_at_closing_header() {
    let text = "Main tasks:\n- Gathers requirements\n• Maps business processes\n\n\
                1. Tests software builds\nAlternative title: Business Consultant\n* Manages vendors";
    assert_eq!(
        extractor().run_strategy(Strategy::TaskSection, text),
        vec!["Gathers requirements", "Maps business processes", "Tests software builds"]
    );
}

#[test]
fn header_remainder_is_part_of_the_section() {
    let text = "Duties: Reports defects found\n2) Verifies fixes in staging";
    assert_eq!(
        extractor().extract(text),
        vec!["Reports defects found", "Verifies fixes in staging"]
    );
}

#[test]
fn whole_text_bullets_when_no_section() {
    let text = "Senior database staff\n* Designs database schemas\n* Monitors performance";
    let (strategy, items) = extractor().extract_with_strategy(text).unwrap();
    assert_eq!(strategy, Strategy::WholeTextBullets);
    assert_eq!(items, vec!["Designs database schemas", "Monitors performance"]);
}

#[test]
fn sentence_fallback_keeps_long_sentences_only() {
    let text = "Most workers in this group hold a degree. Staff in these roles often work in \
                large teams. Short one here. Business analysts (non ICT) are excluded from this \
                group entirely.";
    let (strategy, items) = extractor().extract_with_strategy(text).unwrap();
    assert_eq!(strategy, Strategy::SentenceFallback);
    assert_eq!(
        items,
        vec![
            "Most workers in this group hold a degree.",
            "Staff in these roles often work in large teams.",
        ]
    );
}

#[test]
fn negative_phrases_and_short_items_are_dropped() {
    let text = "Main tasks:\n* Business analysts (non ICT) are excluded\n* Plans\n* Plans releases";
    assert_eq!(extractor().extract(text), vec!["Plans releases"]);
}

#[test]
fn results_are_deduplicated_and_capped() {
    let ex = TaskExtractor::new(
        Arc::new(TaskLexicon::default()),
        ExtractorOptions {
            max_items: 2,
            ..ExtractorOptions::default()
        },
    );
    let text = "Key tasks:\n* Plans releases\n* Plans releases\n* Tests builds\n* Monitors uptime";
    assert_eq!(ex.extract(text), vec!["Plans releases", "Tests builds"]);
}

#[test]
fn nothing_extractable_yields_empty() {
    assert!(extractor().extract("Occupation codes 2611 and 2612").is_empty());
    assert!(extractor().extract("").is_empty());
}

#[test]
fn pooled_pass_accepts_plain_section_bullets() {
    let text = "261111 ICT Analyst\nMain tasks:\n\n* Stakeholder engagement across projects\n\
                * Business process improvement work";
    assert!(extractor().extract(text).is_empty());
    assert_eq!(
        extractor().extract_pooled(text),
        vec!["Stakeholder engagement across projects", "Business process improvement work"]
    );
}
