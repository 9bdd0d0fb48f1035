use regex::Regex;
use std::sync::LazyLock;

use crate::room_code::ROOM_CODE_LENGTH;

/// Round lengths offered to players, in seconds
pub const ALLOWED_DURATIONS: [u32; 3] = [15, 30, 60];
pub const MAX_PLAYER_NAME_LENGTH: usize = 24;

static ROOM_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^[A-Z0-9]{{{}}}$", ROOM_CODE_LENGTH)).expect("room code pattern")
});

pub fn is_valid_room_code(code: &str) -> bool {
    ROOM_CODE_PATTERN.is_match(code)
}

pub fn is_valid_duration(duration: u32) -> bool {
    ALLOWED_DURATIONS.contains(&duration)
}

/// Trim a display name and check it is usable. Returns the trimmed name.
pub fn validate_player_name(name: &str) -> Result<String, String> {
    let name = name.trim();

    if name.is_empty() {
        return Err("Player name is required".to_string());
    }

    if name.chars().count() > MAX_PLAYER_NAME_LENGTH {
        return Err(format!(
            "Player name must be at most {} characters",
            MAX_PLAYER_NAME_LENGTH
        ));
    }

    if name.chars().any(char::is_control) {
        return Err("Player name contains invalid characters".to_string());
    }

    Ok(name.to_string())
}

pub fn validate_duration(duration: u32) -> Result<u32, String> {
    if is_valid_duration(duration) {
        Ok(duration)
    } else {
        Err(format!(
            "Duration must be one of {:?} seconds, got {}",
            ALLOWED_DURATIONS, duration
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_format() {
        assert!(is_valid_room_code("ABC123"));
        assert!(is_valid_room_code("ZZZZZZ"));
        assert!(!is_valid_room_code("abc123")); // must be normalized first
        assert!(!is_valid_room_code("ABC12")); // too short
        assert!(!is_valid_room_code("ABC1234")); // too long
        assert!(!is_valid_room_code("ABC-12"));
        assert!(!is_valid_room_code(""));
    }

    #[test]
    fn test_durations() {
        assert!(is_valid_duration(15));
        assert!(is_valid_duration(30));
        assert!(is_valid_duration(60));
        assert!(!is_valid_duration(0));
        assert!(!is_valid_duration(45));
        assert!(validate_duration(90).unwrap_err().contains("90"));
    }

    #[test]
    fn test_player_name_trimmed() {
        assert_eq!(validate_player_name("  Alice ").unwrap(), "Alice");
    }

    #[test]
    fn test_player_name_rejections() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("    ").is_err());
        assert!(validate_player_name("tab\tname").is_err());
        assert!(validate_player_name(&"x".repeat(MAX_PLAYER_NAME_LENGTH + 1)).is_err());
        assert!(validate_player_name(&"x".repeat(MAX_PLAYER_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_player_name_counts_characters_not_bytes() {
        let name = "é".repeat(MAX_PLAYER_NAME_LENGTH);
        assert!(validate_player_name(&name).is_ok());
    }
}
