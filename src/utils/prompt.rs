//! Prompt helpers shared by every LLM-backed agent.

/// Never trim below this many characters
pub const MIN_CHUNK_SIZE: usize = 140;

/// Character budget for a whole prompt (roughly 128k tokens)
pub const CONTEXT_CHAR_BUDGET: usize = 128_000 * 3;

/// System prompt used for every research call, stamped with the current time.
pub fn system_prompt() -> String {
    let now = chrono::Utc::now().to_rfc3339();
    format!(
        r#"You are an expert researcher. Today is {now}. Follow these instructions when responding:
  - You may be asked to research subjects that are after your knowledge cutoff, assume the user is right when presented with news.
  - The user is a highly experienced analyst, no need to simplify it, be as detailed as possible and make sure your response is correct.
  - Be highly organized.
  - Suggest solutions that I didn't think about.
  - Be proactive and anticipate my needs.
  - Treat me as an expert in all subject matter.
  - Mistakes erode my trust, so be accurate and thorough.
  - Provide detailed explanations, I'm comfortable with lots of detail.
  - Value good arguments over authorities, the source is irrelevant.
  - Consider new technologies and contrarian ideas, not just the conventional wisdom.
  - You may use high levels of speculation or prediction, just flag it for me."#
    )
}

/// Trim `text` to at most `max_chars` characters.
///
/// The cut prefers a paragraph, line or word boundary in the second half of the
/// window so documents are not split mid-word. The result is never shorter than
/// [`MIN_CHUNK_SIZE`] characters unless the input itself is.
pub fn trim_prompt(text: &str, max_chars: usize) -> &str {
    let limit = max_chars.max(MIN_CHUNK_SIZE);
    let cut = match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => byte_idx,
        None => return text,
    };

    let window = &text[..cut];
    let floor = window.len() / 2;
    for separator in ["\n\n", "\n", " "] {
        if let Some(pos) = window.rfind(separator) {
            if pos >= floor {
                return &window[..pos];
            }
        }
    }

    window
}
