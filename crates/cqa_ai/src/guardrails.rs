use std::sync::LazyLock;

use cqa_core::error::{codes, AppError};
use regex::Regex;

use crate::synthesize::split_references;

static REFERENCE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(\d+)\] ").unwrap());

/// Check that the References block of a rendered answer is numbered 1..=n with no gaps.
///
/// Returns the number of references; an answer without a References block has zero.
pub fn check_reference_numbering(answer: &str) -> Result<usize, AppError> {
    let (_, Some(refs)) = split_references(answer) else {
        return Ok(0);
    };

    let mut expected = 1usize;
    for line in refs.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(c) = REFERENCE_LINE.captures(line) else {
            return Err(AppError::new(codes::REFERENCES_MALFORMED, "Unnumbered reference line")
                .with_details(format!("line={line}")));
        };
        let n: usize = c[1].parse().unwrap_or(0);
        if n != expected {
            return Err(AppError::new(
                codes::REFERENCES_MALFORMED,
                "Reference numbering is not contiguous",
            )
            .with_details(format!("expected={expected}; got={n}")));
        }
        expected += 1;
    }
    Ok(expected - 1)
}
