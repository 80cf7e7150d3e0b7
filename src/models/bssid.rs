//! Validation and parsing of access point hardware addresses.

use crate::error::{AppError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const OCTETS: usize = 6;

fn bssid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[0-9A-F]{2}(:[0-9A-F]{2}){5}$").expect("BSSID pattern is valid")
    })
}

/// Returns true if `candidate` is six colon-separated pairs of hex digits.
///
/// Case-insensitive, no surrounding whitespace allowed: `AA:bb:0C:dd:EE:01` passes,
/// `AA-BB-CC-DD-EE-FF` and `AA:BB:CC:DD:EE` do not.
pub fn is_valid_bssid(candidate: &str) -> bool {
    bssid_pattern().is_match(candidate)
}

fn parse_octets(candidate: &str) -> Option<[u8; OCTETS]> {
    if !is_valid_bssid(candidate) {
        return None;
    }

    let mut octets = [0u8; OCTETS];
    for (octet, group) in octets.iter_mut().zip(candidate.split(':')) {
        *octet = u8::from_str_radix(group, 16).ok()?;
    }
    Some(octets)
}

/// A validated BSSID.
///
/// Keeps the text the caller supplied, since that is what both providers are queried
/// with and what gets echoed back in results, alongside the decoded octets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bssid {
    text: String,
    octets: [u8; OCTETS],
}

impl Bssid {
    /// The address exactly as it was supplied.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn octets(&self) -> [u8; OCTETS] {
        self.octets
    }
}

impl FromStr for Bssid {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let octets = parse_octets(s).ok_or_else(|| AppError::InvalidBssid(s.to_string()))?;
        Ok(Self {
            text: s.to_string(),
            octets,
        })
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
