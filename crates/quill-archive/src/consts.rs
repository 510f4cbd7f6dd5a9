//! Internal constants for archive requests.

use std::time::Duration;

/// Wayback Machine origin; archive URLs are built on top of it.
pub const WAYBACK_ORIGIN: &str = "https://web.archive.org";

/// CDX search endpoint for existing captures.
pub const CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

/// SavePageNow endpoint; the encoded URL is appended.
pub const SAVE_ENDPOINT: &str = "https://web.archive.org/save/";

/// Connect timeout for archive requests (10 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read timeout for archive requests (30 seconds).
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Product token of the default User-Agent.
pub const USER_AGENT_PRODUCT: &str = "quill:linkcard-archive";

/// Contact used in the default User-Agent when none is configured.
pub const UNKNOWN_CONTACT: &str = "mailto:unknown";
