use super::format::{VALUES_MARKER, read_greyscale_source};
use crate::domain::SombreroResult;
use std::path::Path;

pub fn content_has_missing(content: &str) -> bool {
    content.lines().any(is_missing_marker)
}

pub fn count_missing(content: &str) -> usize {
    content.lines().filter(|line| is_missing_marker(line)).count()
}

/// Structural check: looks for a bare `values` line without decoding any series.
pub fn has_missing(path: &Path) -> SombreroResult<bool> {
    read_greyscale_source(path, "compilation").map(|content| content_has_missing(&content))
}

fn is_missing_marker(line: &str) -> bool {
    line.trim() == VALUES_MARKER
}
