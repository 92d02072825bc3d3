//! Prompt composer
//!
//! Renders cached results into one size-bounded text block for downstream
//! model consumption: most recent first, one status header per result, then
//! stderr, then the structured payload or raw stdout. Appending stops the
//! moment the character budget is exhausted.

use crate::tools::result::RunResult;

/// Marker appended exactly once when the budget cuts a result short
pub const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Compose cached results into a block of at most `max_chars` characters.
///
/// Returns `None` only when there are zero cached results.
pub fn compose(mut results: Vec<RunResult>, max_chars: usize) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    results.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    let mut out = String::new();
    let mut used = 0usize;

    for result in &results {
        let block = render_block(result);
        let block_chars = block.chars().count();

        if used + block_chars <= max_chars {
            out.push_str(&block);
            used += block_chars;
            continue;
        }

        // Budget exhausted mid-result: keep the partial text, append the
        // marker once, and omit every later result entirely.
        let marker_chars = TRUNCATION_MARKER.chars().count();
        let keep = max_chars.saturating_sub(marker_chars);
        let mut cut: String = out.chars().chain(block.chars()).take(keep).collect();
        if max_chars >= marker_chars {
            cut.push_str(TRUNCATION_MARKER);
        }
        return Some(cut);
    }

    Some(out)
}

/// One result rendered as header, stderr, then payload or stdout
fn render_block(result: &RunResult) -> String {
    let exit = result
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());

    let mut block = format!(
        "### {} [{}] {} at {} (exit {}, {} ms)\n",
        result.title,
        result.id,
        result.status_label(),
        result.started_at.to_rfc3339(),
        exit,
        result.duration_ms
    );

    if !result.stderr.is_empty() {
        block.push_str("stderr:\n");
        block.push_str(&result.stderr);
        block.push('\n');
    }

    match &result.data {
        Some(value) => {
            let payload = serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| result.stdout.clone());
            block.push_str(&payload);
            block.push('\n');
        }
        None => {
            if !result.stdout.is_empty() {
                block.push_str(&result.stdout);
                block.push('\n');
            }
        }
    }

    block.push('\n');
    block
}
