//! Parsing of `H:MM:SS` / `M:SS` / `SS` time offsets.

// helper.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

/// Parse a time offset into seconds.
///
/// Accepted forms are `H:MM:SS`, `M:SS` and plain seconds, each optionally
/// followed by a fractional part (`1:02:03.5`). When a larger unit is
/// present, the smaller ones must stay below 60.
pub fn parse_time(s: &str) -> Option<f64> {
    let caps = regex!(r"^(?:(?:(\d+):)?(\d+):)?(\d+(?:\.\d+)?)$").captures(s.trim())?;

    let hours: Option<u64> = caps.get(1).map(|m| m.as_str().parse()).transpose().ok()?;
    let minutes: Option<u64> = caps.get(2).map(|m| m.as_str().parse()).transpose().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;

    if minutes.is_some() && seconds >= 60.0 {
        return None;
    }
    if hours.is_some() && minutes.is_some_and(|m| m >= 60) {
        return None;
    }

    let total = hours.unwrap_or(0) as f64 * 3600.0 + minutes.unwrap_or(0) as f64 * 60.0 + seconds;
    Some(total)
}
