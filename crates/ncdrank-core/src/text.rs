/// Single-line preview of a chunk: whitespace runs collapse to one space and
/// the result is clipped to `max_chars` characters with a trailing `...`.
#[must_use]
pub fn preview_text(text: &str, max_chars: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let Some((clip_idx, _)) = flattened.char_indices().nth(max_chars) else {
        return flattened;
    };

    let mut out = flattened[..clip_idx].to_string();
    out.push_str("...");
    out
}
