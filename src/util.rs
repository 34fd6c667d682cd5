// src/util.rs — Shared utility functions

/// Return at most the first `max_chars` characters of `s` (UTF-8 safe).
///
/// Lengths in specifications are counted in characters, not bytes, so a
/// title capped at 80 never splits a multibyte character.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Character count of a string.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Round a score to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact() {
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // "café!" is 6 bytes but 5 chars
        assert_eq!(truncate_chars("café!", 4), "café");
        assert_eq!(char_len("café!"), 5);
    }

    #[test]
    fn test_truncate_zero_max() {
        assert_eq!(truncate_chars("hello", 0), "");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.35 + 0.25), 0.6);
        assert_eq!(round2(0.45 + 0.1 + 0.05 * 2.0), 0.65);
        assert_eq!(round2(1.0), 1.0);
    }
}
