//! Parsing of the worker's line-oriented status feed.
//!
//! yt-dlp prints human-readable progress lines, not a stable protocol. The
//! parser is lenient by design: anything it cannot make sense of is ignored
//! rather than treated as an error, so the caller survives format drift in
//! the tool's output.

mod speed;

pub use speed::SpeedTracker;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::time::Instant;

/// Marker every progress line carries.
const PROGRESS_MARKER: &str = "[download]";

/// One parsed progress line.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    /// Completion percentage, 0-100.
    pub percent: f64,
    /// Bytes downloaded so far.
    pub downloaded_bytes: f64,
    /// When the line was observed.
    pub at: Instant,
}

/// `<number><unit>` after suffix-noise stripping, e.g. `10.3M` or `100B`.
static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)([BKMG])$").expect("valid size regex"));

/// Parses one line of worker output into a progress event.
///
/// A line of interest carries the `[download]` marker together with either a
/// percentage (`% of`) or a rate (` at `) section. The second whitespace
/// token is the percentage; the byte count is the first token that parses as
/// a size. Returns `None` for everything else.
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    if !line.contains(PROGRESS_MARKER) {
        return None;
    }
    if !line.contains("% of") && !line.contains(" at ") {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let percent_token = tokens.nth(1)?;
    let percent: f64 = percent_token.trim_end_matches('%').parse().ok()?;

    let downloaded_bytes = tokens.find_map(size_to_bytes)?;

    Some(ProgressEvent {
        percent,
        downloaded_bytes,
        at: Instant::now(),
    })
}

/// Converts a size token such as `10.3MiB`, `5K` or `100B` to bytes.
///
/// The `iB`/`B` suffix noise is stripped first; what remains must be a number
/// followed by a single unit letter, where a bare `B` counts as the byte
/// unit. Unit letters are case-sensitive; anything unrecognized yields `None`.
fn size_to_bytes(token: &str) -> Option<f64> {
    let normalized = if let Some(stripped) = token.strip_suffix("iB") {
        stripped
    } else if let Some(stripped) = token.strip_suffix('B') {
        if stripped.ends_with(['K', 'M', 'G']) {
            stripped
        } else {
            token
        }
    } else {
        token
    };

    let caps = SIZE_RE.captures(normalized)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = match caps.get(2)?.as_str() {
        "B" => 1.0,
        "K" => 1024.0,
        "M" => 1024.0 * 1024.0,
        "G" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: f64 = 1024.0 * 1024.0;

    #[test]
    fn test_parse_typical_progress_line() {
        let event = parse_line("[download]  42.5% of ~ 10.3MiB at 1.2MiB/s ETA 00:05").unwrap();
        assert!((event.percent - 42.5).abs() < f64::EPSILON);
        assert!((event.downloaded_bytes - 10.3 * MIB).abs() < 1.0);
    }

    #[test]
    fn test_parse_line_without_tilde() {
        let event = parse_line("[download] 100% of 10.00MiB in 00:05 at 2.00MiB/s").unwrap();
        assert!((event.percent - 100.0).abs() < f64::EPSILON);
        assert!((event.downloaded_bytes - 10.0 * MIB).abs() < 1.0);
    }

    #[test]
    fn test_rate_token_is_never_the_byte_count() {
        // The only size-shaped token is the rate; it must not be picked up.
        assert!(parse_line("[download]  42.5% of ~ ??? at 1.2MiB/s").is_none());
    }

    #[test]
    fn test_lines_without_markers_are_ignored() {
        assert!(parse_line("[download] Destination: video.mp4").is_none());
        assert!(parse_line("[Merger] Merging formats into video.mp4").is_none());
        assert!(parse_line("ERROR: unable to download video data").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn test_malformed_percent_is_ignored() {
        assert!(parse_line("[download] garbage% of 10.3MiB at 1.2MiB/s").is_none());
    }

    #[test]
    fn test_unit_conversion_table() {
        assert_eq!(size_to_bytes("5K"), Some(5120.0));
        assert_eq!(size_to_bytes("2.5M"), Some(2_621_440.0));
        assert_eq!(size_to_bytes("1G"), Some(1_073_741_824.0));
        assert_eq!(size_to_bytes("100B"), Some(100.0));
    }

    #[test]
    fn test_unit_suffix_noise_is_stripped() {
        assert_eq!(size_to_bytes("10MiB"), Some(10.0 * MIB));
        assert_eq!(size_to_bytes("10MB"), Some(10.0 * MIB));
    }

    #[test]
    fn test_unrecognized_unit_is_ignored() {
        assert_eq!(size_to_bytes("5k"), None);
        assert_eq!(size_to_bytes("5T"), None);
        assert_eq!(size_to_bytes("~"), None);
        assert_eq!(size_to_bytes("1.2MiB/s"), None);
    }
}
