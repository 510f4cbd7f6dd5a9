//! Archive behavior switches.

use crate::consts::{UNKNOWN_CONTACT, USER_AGENT_PRODUCT};

/// Effective archive settings for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
    /// Look up existing captures.
    pub enabled: bool,
    /// Submit URLs to SavePageNow (implies lookup).
    pub save: bool,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            save: false,
            user_agent: default_user_agent(None),
        }
    }
}

impl ArchiveSettings {
    /// Whether any archive request may be made.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled || self.save
    }
}

/// `quill:linkcard-archive (+<contact>)`, with `mailto:unknown` when no
/// contact is given.
#[must_use]
pub fn default_user_agent(contact: Option<&str>) -> String {
    format!(
        "{USER_AGENT_PRODUCT} (+{})",
        contact.unwrap_or(UNKNOWN_CONTACT)
    )
}
