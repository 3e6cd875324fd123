//! The fixed catalog of downloadable desktop modules.

/// Number of entries in [`MODULE_CATALOG`].
pub const MODULE_COUNT: usize = 12;

/// Every module a desktop build may ship, in upstream order.
pub const MODULE_CATALOG: [&str; MODULE_COUNT] = [
    "discord_desktop_core",
    "discord_erlpack",
    "discord_spellcheck",
    "discord_utils",
    "discord_voice",
    "discord_zstd",
    "discord_krisp",
    "discord_game_utils",
    "discord_cloudsync",
    "discord_rpc",
    "discord_dispatch",
    "discord_modules",
];

pub fn is_catalog_module(name: &str) -> bool {
    MODULE_CATALOG.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_names_are_unique() {
        let unique: HashSet<_> = MODULE_CATALOG.iter().collect();
        assert_eq!(unique.len(), MODULE_COUNT);
    }

    #[test]
    fn catalog_lookup() {
        assert!(is_catalog_module("discord_voice"));
        assert!(!is_catalog_module("discord_voice_2"));
    }
}
