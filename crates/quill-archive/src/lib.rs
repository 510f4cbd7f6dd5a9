//! Archive links for external URLs via the Wayback Machine.
//!
//! [`ArchiveResolver`] finds (and optionally requests) a snapshot of a URL and
//! memoizes the answer for the rest of the process. Network access sits behind
//! the [`ArchiveService`] trait; [`WaybackClient`] is the real implementation.
//!
//! Archive lookups are best effort. Failures never surface as errors: they are
//! logged at debug level and resolve to an empty string.

mod cache;
mod consts;
mod error;
mod resolver;
mod settings;
mod wayback;

pub use cache::ArchiveCache;
pub use error::ArchiveError;
pub use resolver::ArchiveResolver;
pub use settings::{ArchiveSettings, default_user_agent};
pub use wayback::{ArchiveService, WaybackClient, cdx_query_url, encode_component, parse_cdx};
