use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A parsed `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTriple {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionTriple {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// The `0.0.N` form used by the macOS and Linux channels.
    pub const fn counter(n: u32) -> Self {
        Self::new(0, 0, n)
    }

    /// Returns `None` once the patch would drop below zero.
    pub fn decrement_patch(&self, by: u32) -> Option<Self> {
        self.patch
            .checked_sub(by)
            .map(|patch| Self { patch, ..*self })
    }

    /// Zero-padded form whose lexical order matches numeric order.
    pub fn sort_key(&self) -> String {
        format!("{:010}.{:010}.{:010}", self.major, self.minor, self.patch)
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionTriple {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TypeError::MalformedVersion(s.to_owned());
        let mut parts = s.split('.');
        let mut next = || -> Result<u32, TypeError> {
            let part = parts.next().ok_or_else(malformed)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            part.parse().map_err(|_| malformed())
        };
        let triple = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(triple)
    }
}
