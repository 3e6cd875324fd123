//! Version extraction from CDN URLs and redirect targets.
//!
//! Redirect targets embed the version in different positions, so several
//! patterns are tried in order:
//!
//! 1. a path segment that is exactly `major.minor.patch`;
//! 2. the first `major.minor.patch` run inside the last segment;
//! 3. the Windows `/win/x64/<version>/` path shape.

use std::sync::LazyLock;

use dcarchive_types::UNKNOWN_VERSION;
use regex::Regex;

static EXACT_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("valid regex"));
static LOOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+\.[0-9]+\.[0-9]+)").expect("valid regex"));
static WINDOWS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/win/x64/([0-9]+\.[0-9]+\.[0-9]+)/").expect("valid regex"));

/// Returns the version embedded in `input`, or `None` when no pattern
/// matches.
pub fn extract_version(input: &str) -> Option<String> {
    let segments: Vec<&str> = input.split('/').collect();

    if let Some(segment) = segments.iter().find(|s| EXACT_SEGMENT.is_match(s)) {
        return Some((*segment).to_owned());
    }

    if let Some(last) = segments.last()
        && let Some(caps) = LOOSE.captures(last)
    {
        return Some(caps[1].to_owned());
    }

    WINDOWS_PATH.captures(input).map(|caps| caps[1].to_owned())
}

/// Like [`extract_version`], reporting [`UNKNOWN_VERSION`] on failure.
pub fn extract_version_or_unknown(input: &str) -> String {
    extract_version(input).unwrap_or_else(|| UNKNOWN_VERSION.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_segment_wins() {
        assert_eq!(
            extract_version("https://stable.dl2.discordapp.net/distro/app/stable/win/x64/1.0.9028/DiscordSetup.exe"),
            Some("1.0.9028".into())
        );
        assert_eq!(
            extract_version("https://stable.dl2.discordapp.net/apps/osx/0.0.329/Discord.dmg"),
            Some("0.0.329".into())
        );
    }

    #[test]
    fn falls_back_to_last_segment() {
        assert_eq!(
            extract_version("https://dl.discordapp.net/apps/linux/discord-0.0.77.deb"),
            Some("0.0.77".into())
        );
        assert_eq!(extract_version("DiscordSetup-1.0.9001-full.nupkg"), Some("1.0.9001".into()));
    }

    #[test]
    fn first_exact_segment_is_returned() {
        assert_eq!(extract_version("/a/1.2.3/b/4.5.6/c"), Some("1.2.3".into()));
    }

    #[test]
    fn windows_path_shape() {
        assert_eq!(
            extract_version("https://cdn/distro/app/stable/win/x64/1.0.9030/?x=1"),
            Some("1.0.9030".into())
        );
        assert_eq!(WINDOWS_PATH.captures("/win/x64/1.0.1/").map(|c| c[1].to_owned()), Some("1.0.1".into()));
    }

    #[test]
    fn unknown_input_yields_sentinel() {
        assert_eq!(extract_version("https://discord.com/api/download?platform=osx"), None);
        assert_eq!(extract_version_or_unknown("abc"), UNKNOWN_VERSION);
        assert_eq!(extract_version_or_unknown(""), UNKNOWN_VERSION);
    }

    #[test]
    fn scheme_and_host_do_not_matter() {
        let a = extract_version("https://stable.dl2.discordapp.net/apps/osx/0.0.330/Discord.dmg");
        let b = extract_version("http://mirror.example.org/apps/osx/0.0.330/Discord.dmg");
        assert_eq!(a, b);
        assert_eq!(a, Some("0.0.330".into()));
    }

    #[test]
    fn non_ascii_digits_are_not_versions() {
        assert_eq!(extract_version("https://cdn/win/x64/\u{661}.\u{662}.\u{663}/DiscordSetup.exe"), None);
        assert_eq!(extract_version("https://cdn/apps/osx/\u{660}.\u{660}.\u{663}\u{662}\u{669}/Discord.dmg"), None);
    }
}
