use std::collections::HashSet;

use cqa_core::domain::{Citation, Hit};
use cqa_core::text::shorten;

pub const PREVIEW_PLACEHOLDER: &str = "...";

/// One citation per distinct `(source_id, chunk_id)`, in first-seen order.
pub fn build_citations(hits: &[Hit], preview_width: usize) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for h in hits {
        if !seen.insert(h.citation_key()) {
            continue;
        }
        out.push(Citation {
            source_id: h.source_id.clone(),
            role_title: h.role_title.clone(),
            chunk_id: h.chunk_id.clone(),
            preview: shorten(h.text.trim(), preview_width, PREVIEW_PLACEHOLDER),
        });
    }
    out
}
