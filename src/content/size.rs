//! Payload size resolution
//!
//! Turns the `size` and `unit` query parameters into a byte count.

use super::ContentError;
use std::num::NonZeroU64;

pub const KB: u64 = 1 << 10;
pub const MB: u64 = 1 << 20;
pub const GB: u64 = 1 << 30;
pub const TB: u64 = 1 << 40;

/// Multiplier for a unit token. Unknown tokens count as plain bytes.
pub fn unit_multiplier(unit: &str) -> u64 {
    match unit.to_ascii_lowercase().as_str() {
        "kb" => KB,
        "mb" => MB,
        "gb" => GB,
        "tb" => TB,
        _ => 1,
    }
}

/// Resolve the requested byte count
///
/// - absent size defaults to 1
/// - the sign is discarded, `-10` is the same as `10`
/// - `0` is rejected
///
/// # Examples
/// ```
/// use whoami::content::size::resolve;
///
/// assert_eq!(resolve(Some("2"), Some("KB")).unwrap().get(), 2048);
/// assert_eq!(resolve(Some("-10"), None).unwrap().get(), 10);
/// assert!(resolve(Some("0"), None).is_err());
/// ```
pub fn resolve(size: Option<&str>, unit: Option<&str>) -> Result<NonZeroU64, ContentError> {
    let count = match size {
        Some(raw) => raw.parse::<i64>()?.unsigned_abs(),
        None => 1,
    };

    let count = NonZeroU64::new(count).ok_or(ContentError::ZeroSize)?;

    let Some(unit) = unit else {
        return Ok(count);
    };

    count
        .checked_mul(NonZeroU64::new(unit_multiplier(unit)).unwrap_or(NonZeroU64::MIN))
        .ok_or_else(|| ContentError::SizeTooLarge {
            size: count.get(),
            unit: unit.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(size: Option<&str>, unit: Option<&str>) -> u64 {
        resolve(size, unit).unwrap().get()
    }

    #[test]
    fn test_default_size() {
        assert_eq!(bytes(None, None), 1);
        assert_eq!(bytes(None, Some("kb")), 1024);
    }

    #[test]
    fn test_units() {
        assert_eq!(bytes(Some("2"), Some("kb")), 2048);
        assert_eq!(bytes(Some("3"), Some("MB")), 3 * MB);
        assert_eq!(bytes(Some("1"), Some("Gb")), GB);
        assert_eq!(bytes(Some("5"), Some("tb")), 5 * TB);
    }

    #[test]
    fn test_unknown_unit_means_bytes() {
        assert_eq!(bytes(Some("7"), Some("b")), 7);
        assert_eq!(bytes(Some("7"), Some("")), 7);
        assert_eq!(bytes(Some("7"), Some("pb")), 7);
    }

    #[test]
    fn test_sign_is_discarded() {
        assert_eq!(bytes(Some("-10"), None), 10);
        assert_eq!(bytes(Some("+10"), None), 10);
        assert_eq!(bytes(Some("-9223372036854775808"), None), 1 << 63);
    }

    #[test]
    fn test_zero_rejected() {
        assert!(matches!(resolve(Some("0"), None), Err(ContentError::ZeroSize)));
        assert!(matches!(resolve(Some("-0"), Some("kb")), Err(ContentError::ZeroSize)));
    }

    #[test]
    fn test_unparseable() {
        for raw in ["", "abc", "1.5", "10kb", " 10"] {
            assert!(
                matches!(resolve(Some(raw), None), Err(ContentError::InvalidSize(_))),
                "expected InvalidSize for {raw:?}"
            );
        }
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            resolve(Some("9223372036854775807"), Some("tb")),
            Err(ContentError::SizeTooLarge { .. })
        ));
        assert_eq!(bytes(Some("16777215"), Some("tb")), 16_777_215 * TB);
    }
}
