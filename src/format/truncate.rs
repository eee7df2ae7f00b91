/// Marker appended to truncated text
pub const ELLIPSIS: char = '…';

/// Shorten `text` to roughly `limit` characters without cutting a word.
///
/// Text that already fits is returned unchanged. Otherwise whole words are
/// kept while the kept length plus a separator and the next word stays below
/// `limit - 1`, and an ellipsis is appended. If even the first word does not
/// fit, the result is the ellipsis alone.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let budget = limit.saturating_sub(1);
    let mut kept_len = 0usize;
    let mut kept: Vec<&str> = Vec::new();

    for word in text.split(' ') {
        let word_len = word.chars().count();
        if kept_len + 1 + word_len >= budget {
            break;
        }
        kept_len += 1 + word_len;
        kept.push(word);
    }

    let mut truncated = kept.join(" ");
    truncated.push(ELLIPSIS);
    truncated
}
