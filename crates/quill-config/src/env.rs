//! Environment overrides.
//!
//! These variables take precedence over `quill.toml` but not over CLI flags.

/// CDN base for image paths. Wins over `image_paths.base_url` even when empty.
pub const ASSET_HOST: &str = "ASSET_HOST";
/// `1` enables archive lookups for link cards.
pub const LINKCARD_ARCHIVE: &str = "LINKCARD_ARCHIVE";
/// `1` enables SavePageNow submissions (and lookups).
pub const LINKCARD_ARCHIVE_SAVE: &str = "LINKCARD_ARCHIVE_SAVE";
/// Full User-Agent for archive requests.
pub const LINKCARD_ARCHIVE_UA: &str = "LINKCARD_ARCHIVE_UA";
/// Contact placed in the default archive User-Agent.
pub const LINKCARD_ARCHIVE_CONTACT: &str = "LINKCARD_ARCHIVE_CONTACT";

/// Environment settings that override configuration file values.
///
/// `None` means the variable is unset and the file value stays.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    pub asset_host: Option<String>,
    pub archive_enabled: Option<bool>,
    pub archive_save: Option<bool>,
    pub archive_user_agent: Option<String>,
    pub archive_contact: Option<String>,
}

impl EnvSettings {
    /// Read overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| lookup(name).map(|value| value == "1");
        Self {
            asset_host: lookup(ASSET_HOST),
            archive_enabled: flag(LINKCARD_ARCHIVE),
            archive_save: flag(LINKCARD_ARCHIVE_SAVE),
            archive_user_agent: lookup(LINKCARD_ARCHIVE_UA),
            archive_contact: lookup(LINKCARD_ARCHIVE_CONTACT),
        }
    }
}
