//! Cleanup of raw completion text before it is parsed

/// Strip Markdown code-fence wrapping from a completion
///
/// Models often answer with a fenced block (optionally tagged, e.g. ```` ```json ````),
/// sometimes preceded by a line of prose. If a fence is present, the content of
/// the first fenced block is returned; otherwise the trimmed input is returned
/// unchanged. An unterminated fence yields everything after the opening line.
///
/// # Examples
///
/// ```
/// use tally_llm::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[start + 3..];
    // The language tag runs to the end of the opening line
    let body = match after_fence.find('\n') {
        Some(newline) => &after_fence[newline + 1..],
        None => after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
