//! Free-text target submission parsing

/// Split a submission into target strings.
///
/// Targets are separated by newlines, commas or whitespace; empty pieces are
/// dropped. Order is preserved and duplicates are kept (the batch collapses
/// them).
pub fn parse_targets(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
