use cqa_core::domain::Citation;

pub const ANSWER_HEADER: &str = "**Answer:**";
pub const BEST_EFFORT_HEADER: &str = "**Answer (best-effort):**";
pub const REFERENCES_HEADER: &str = "References:";

pub fn reference_line(n: usize, c: &Citation) -> String {
    format!(
        "[{n}] {} · {} · {} — {}",
        c.source_id, c.role_title, c.chunk_id, c.preview
    )
}

/// Split a rendered answer at its References header into the body and the reference lines.
///
/// The header is the last line equal to `References:`; passage text quoted in the body may
/// contain the same word.
pub fn split_references(answer: &str) -> (&str, Option<&str>) {
    let mut cut = None;
    let mut offset = 0;
    for line in answer.split_inclusive('\n') {
        if line.trim_end() == REFERENCES_HEADER {
            cut = Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    match cut {
        Some((start, end)) => (&answer[..start], Some(&answer[end..])),
        None => (answer, None),
    }
}

/// Blank line, `References:` and one numbered line per citation, numbered from 1.
pub fn push_references(lines: &mut Vec<String>, citations: &[&Citation]) {
    lines.push(String::new());
    lines.push(REFERENCES_HEADER.to_string());
    lines.extend(
        citations
            .iter()
            .enumerate()
            .map(|(i, c)| reference_line(i + 1, c)),
    );
}

pub fn bullet_answer(role: Option<&str>, statements: &[&str], citations: &[&Citation]) -> String {
    let mut lines = vec![ANSWER_HEADER.to_string()];
    if let Some(role) = role {
        lines.push(format!("**Role:** {role}"));
    }
    lines.extend(statements.iter().map(|s| format!("- {s}")));
    push_references(&mut lines, citations);
    lines.join("\n")
}

pub fn best_effort_answer(body: &str, citations: &[&Citation]) -> String {
    let mut lines = vec![BEST_EFFORT_HEADER.to_string(), body.to_string()];
    push_references(&mut lines, citations);
    lines.join("\n")
}
