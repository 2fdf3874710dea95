//! Compositor progress parsing.

/// Parse a console line from the compositor into a progress fraction.
///
/// Understands `Rendered 120/300` frame counters and trailing percentages
/// such as `Rendering 40%`. Anything else yields `None`.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("Rendered ") {
        let counter = rest.split_whitespace().next()?.trim_end_matches(',');
        let (done, total) = counter.split_once('/')?;
        let done: f64 = done.parse().ok()?;
        let total: f64 = total.parse().ok()?;
        if total <= 0.0 {
            return None;
        }
        return Some((done / total).clamp(0.0, 1.0));
    }

    let last = line.split_whitespace().last()?;
    let percent: f64 = last.strip_suffix('%')?.parse().ok()?;
    if !percent.is_finite() {
        return None;
    }
    Some((percent / 100.0).clamp(0.0, 1.0))
}
