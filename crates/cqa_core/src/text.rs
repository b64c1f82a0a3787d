/// Line-ending normalization applied to every corpus text before splitting.
pub fn normalize_text(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Collapse to one line and fit into `width` characters, dropping whole words from the end and
/// appending `placeholder` when the text is too long.
pub fn shorten(text: &str, width: usize, placeholder: &str) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(placeholder.chars().count());
    let mut out = String::new();
    let mut used = 0usize;
    for word in collapsed.split(' ') {
        let sep = usize::from(!out.is_empty());
        let len = word.chars().count();
        if used + sep + len > budget {
            break;
        }
        if sep == 1 {
            out.push(' ');
        }
        out.push_str(word);
        used += sep + len;
    }
    out.push_str(placeholder);
    out
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
