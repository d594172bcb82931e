use shared::{DEFAULT_NAME, MAX_NAME_LEN};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Get current timestamp in milliseconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

// Wall-clock seconds as sent to browser clients
pub fn timestamp_secs(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

// Keep at most `max` characters, respecting UTF-8 boundaries
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// Trim, uppercase and cap a display name, falling back to the placeholder.
// A space that lands inside the cap is kept.
pub fn sanitize_name(raw: Option<&str>) -> String {
    let name = truncate_chars(&raw.unwrap_or("").trim().to_uppercase(), MAX_NAME_LEN);
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name(Some("  viper ")), "VIPER");
        assert_eq!(sanitize_name(Some("averyveryverylongname")), "AVERYVERYVER");
        assert_eq!(sanitize_name(Some("   ")), "PLAYER");
        assert_eq!(sanitize_name(None), "PLAYER");
    }

    #[test]
    fn test_sanitize_name_keeps_space_inside_cap() {
        assert_eq!(sanitize_name(Some("abcdefghijk lmn")), "ABCDEFGHIJK ");
        assert_eq!(sanitize_name(Some(" red fox ")), "RED FOX");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("ab", 80), "ab");
    }

    #[test]
    fn test_timestamp_secs() {
        assert_eq!(timestamp_secs(1_500), 1.5);
        assert!(get_timestamp() > 0);
    }
}
