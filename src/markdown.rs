/// Collapse user input onto one line so it can sit inside inline emphasis or a heading.
/// Newlines would otherwise end the `**...**` span early.
pub(crate) fn sanitize_inline(s: &str) -> String {
    s.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render `text` as an italic blockquote, one `> *line*` per non-empty line.
pub(crate) fn italic_blockquote(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("> *{line}*"))
        .collect::<Vec<_>>()
        .join("\n")
}
