use regex::Regex;

use crate::PLACEHOLDER_NAME;

/// Digit runs at least this long look like timestamps or date stamps
/// (`YYYYMMDD`, `HHMMSS`), not meaningful words.
const MIN_DIGIT_RUN: usize = 6;

/// Hex-shaped segments at these lengths match the canonical UUID groups
/// (8-4-4-4-12 with hyphens, 32 without).
const UUID_GROUP_LENGTHS: &[usize] = &[4, 8, 12, 32];

/// Mixed-case alphanumeric tokens at least this long are treated as
/// auto-generated identifiers (upload hashes, share tokens).
const MIN_RANDOM_TOKEN_LEN: usize = 8;

/// Strips noise tokens from base filenames, keeping meaningful words.
///
/// Output is always lowercase words joined by a single underscore, which
/// makes normalization idempotent: no noise rule matches such output, so
/// a second pass is a no-op.
pub struct Normalizer {
    separators: Regex,
    hex_group: Regex,
    digit_run: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            separators: Regex::new(r"[_\-\s]+").expect("invalid separator regex"),
            hex_group: Regex::new(r"^[0-9a-fA-F]+$").expect("invalid hex regex"),
            digit_run: Regex::new(r"^[0-9]+$").expect("invalid digit regex"),
        }
    }

    /// Clean a base name (no extension): split on separators, drop noise
    /// segments, rejoin the survivors lowercased.
    ///
    /// A name that was entirely noise falls back to `PLACEHOLDER_NAME` so
    /// the file is never left nameless.
    pub fn normalize(&self, base_name: &str) -> String {
        let meaningful: Vec<String> = self
            .separators
            .split(base_name)
            .filter(|segment| !segment.is_empty())
            .filter(|segment| !self.is_noise(segment))
            .map(|segment| segment.to_lowercase())
            .collect();

        if meaningful.is_empty() {
            PLACEHOLDER_NAME.to_string()
        } else {
            meaningful.join("_")
        }
    }

    /// Noise rules, in precedence order: UUID-shaped hex group, long digit
    /// run, mixed-case random token. Everything else is meaningful.
    fn is_noise(&self, segment: &str) -> bool {
        // UUID groups carry digits in practice; requiring one keeps real
        // words that happen to be hex ("face", "deadbeef") alive.
        let has_digit = segment.chars().any(|c| c.is_ascii_digit());

        if self.hex_group.is_match(segment)
            && UUID_GROUP_LENGTHS.contains(&segment.len())
            && has_digit
        {
            return true;
        }

        if self.digit_run.is_match(segment) && segment.len() >= MIN_DIGIT_RUN {
            return true;
        }

        segment.len() >= MIN_RANDOM_TOKEN_LEN
            && segment.chars().all(|c| c.is_ascii_alphanumeric())
            && has_digit
            && segment.chars().any(|c| c.is_ascii_lowercase())
            && segment.chars().any(|c| c.is_ascii_uppercase())
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
