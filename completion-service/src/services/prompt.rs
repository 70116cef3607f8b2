//! Prompt construction for text continuation.

/// System turn for `/generate-text`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Suggest a continuation for this prompt. \
Your reply should only be the continuation. The continuation should be grammatically \
correct and flow naturally from the prompt. The continuation should be paragraph-length.";

/// Returns the text before `cursor`, counted in Unicode scalar values.
///
/// Out-of-range positions follow slice semantics instead of failing: a cursor
/// past the end yields the whole text, and a negative cursor drops that many
/// characters from the end (everything, if it exceeds the length).
pub fn context_before_cursor(text: &str, cursor: i64) -> &str {
    let char_count = text.chars().count();
    let end = if cursor >= 0 {
        usize::try_from(cursor).map_or(char_count, |c| c.min(char_count))
    } else {
        let from_end = usize::try_from(cursor.unsigned_abs()).unwrap_or(usize::MAX);
        char_count.saturating_sub(from_end)
    };

    match text.char_indices().nth(end) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
