//! HTTP Range request parsing module
//!
//! Single byte-range parsing for partial content, compliant with RFC 7233.

/// Parsed Range request, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    /// Start byte position
    pub start: u64,
    /// End byte position, None means until end of content
    pub end: Option<u64>,
}

impl RangeRequest {
    /// Calculate actual end position (considering content size)
    #[inline]
    pub const fn end_position(&self, total: u64) -> u64 {
        match self.end {
            Some(end) => end,
            None => total.saturating_sub(1),
        }
    }

    /// Number of bytes covered by the range
    pub const fn content_length(&self, total: u64) -> u64 {
        self.end_position(total).saturating_sub(self.start) + 1
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Valid range request
    Valid(RangeRequest),
    /// Range not satisfiable (start >= `total`) - should return 416
    NotSatisfiable,
    /// No Range header, multi-range or malformed (ignore, return full content)
    None,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use whoami::http::range::{parse_range_header, RangeParseResult};
///
/// // Fixed range
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert!(matches!(result, RangeParseResult::Valid(_)));
///
/// // No Range header
/// let result = parse_range_header(None, 1000);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, total: u64) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(header) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::None; // Not bytes unit, ignore
    };

    // Only support single range (not multi-range)
    if header.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = header.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if total == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    // Suffix range: "-500" means last 500 bytes
    if start_str.is_empty() {
        return parse_suffix_range(end_str, total);
    }

    // Standard range: "start-" or "start-end"
    parse_standard_range(start_str, end_str, total)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, total: u64) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<u64>() else {
        return RangeParseResult::None;
    };

    if suffix == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    // Suffix larger than content is valid, just return everything as range
    let start = total.saturating_sub(suffix);
    RangeParseResult::Valid(RangeRequest {
        start,
        end: Some(total - 1),
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, total: u64) -> RangeParseResult {
    let Ok(start) = start_str.parse::<u64>() else {
        return RangeParseResult::None;
    };

    // Start beyond content size is not satisfiable
    if start >= total {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        None // Open-ended range
    } else {
        let Ok(e) = end_str.parse::<u64>() else {
            return RangeParseResult::None;
        };
        // Clamp end to total - 1
        Some(e.min(total - 1))
    };

    // Validate: start <= end
    if let Some(e) = end {
        if start > e {
            return RangeParseResult::NotSatisfiable;
        }
    }

    RangeParseResult::Valid(RangeRequest { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeParseResult::None);
    }

    #[test]
    fn test_standard_range() {
        match parse_range_header(Some("bytes=0-9"), 100) {
            RangeParseResult::Valid(r) => {
                assert_eq!(r.start, 0);
                assert_eq!(r.end, Some(9));
                assert_eq!(r.content_length(100), 10);
            }
            other => panic!("Expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn test_open_range() {
        match parse_range_header(Some("bytes=50-"), 100) {
            RangeParseResult::Valid(r) => {
                assert_eq!(r.start, 50);
                assert_eq!(r.end, None);
                assert_eq!(r.end_position(100), 99);
                assert_eq!(r.content_length(100), 50);
            }
            other => panic!("Expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn test_suffix_range() {
        match parse_range_header(Some("bytes=-20"), 100) {
            RangeParseResult::Valid(r) => {
                assert_eq!(r.start, 80);
                assert_eq!(r.end, Some(99));
            }
            other => panic!("Expected Valid, got {other:?}"),
        }
        match parse_range_header(Some("bytes=-500"), 100) {
            RangeParseResult::Valid(r) => assert_eq!(r.start, 0),
            other => panic!("Expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn test_end_clamped() {
        match parse_range_header(Some("bytes=90-1000"), 100) {
            RangeParseResult::Valid(r) => assert_eq!(r.end, Some(99)),
            other => panic!("Expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn test_terabyte_offsets() {
        let total = 1u64 << 40;
        match parse_range_header(Some("bytes=1099511627000-"), total) {
            RangeParseResult::Valid(r) => assert_eq!(r.content_length(total), 776),
            other => panic!("Expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=50-10"), 100),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 100),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_invalid_format() {
        assert_eq!(
            parse_range_header(Some("bytes=a-b"), 100),
            RangeParseResult::None
        );
        assert_eq!(
            parse_range_header(Some("bytes=0-9,20-29"), 100),
            RangeParseResult::None
        );
        assert_eq!(
            parse_range_header(Some("items=0-9"), 100),
            RangeParseResult::None
        );
        assert_eq!(parse_range_header(Some("bytes=10"), 100), RangeParseResult::None);
    }
}
