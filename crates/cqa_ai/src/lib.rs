pub mod embeddings;
pub mod eval;
pub mod extract;
pub mod guardrails;
pub mod lexical;
pub mod lexicon;
pub mod ollama;
pub mod pipeline;
pub mod retrieve;
pub mod route;
pub mod semantic;
pub mod synthesize;
pub mod tools;

#[cfg(test)]
mod tests {
    use super::guardrails::check_reference_numbering;

    #[test]
    fn reference_guard_counts_contiguous_lines() {
        let answer =
            "**Answer:**\n- Plans work\n\nReferences:\n[1] A · R · 1 — x\n[2] B · R · 2 — y";
        assert_eq!(check_reference_numbering(answer).unwrap(), 2);
        assert_eq!(check_reference_numbering("No relevant passages found.").unwrap(), 0);
    }

    #[test]
    fn reference_guard_rejects_gaps() {
        let answer = "References:\n[1] A · R · 1 — x\n[3] B · R · 2 — y";
        let err = check_reference_numbering(answer).unwrap_err();
        assert_eq!(err.code, "REFERENCES_MALFORMED");
    }
}
