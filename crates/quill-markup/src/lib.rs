//! Markup passes for static-site documents.
//!
//! Every pass is a plain function or small struct over a text buffer: source
//! passes run on markdown before rendering, output passes on the rendered
//! HTML. None of them parse HTML into a tree. They locate tags with
//! attribute-aware regular expressions (see [`tag`]) and rely on the renderer
//! producing well-formed, single-line opening tags.
//!
//! Source passes:
//! - [`TagExpander`]: `{% linkcard %}` and `{% email %}` tags
//! - [`sizing::preprocess`]: `![alt](src =WxH)` sizing syntax
//!
//! Output passes:
//! - [`ImagePaths`]: site-absolute and CDN-prefixed image paths
//! - [`SizingAnnotator`]: sizing markers to attributes, then image links
//! - [`HrefDecorator`]: configured attributes on matching links
//! - [`email::inject_assets`]: decoding script for obfuscated addresses
//!
//! All passes are idempotent.

pub mod anchor;
pub mod attrs;
pub mod decorate;
pub mod email;
mod error;
pub mod fence;
pub mod linkcard;
pub mod paths;
pub mod sizing;
pub mod tag;
pub mod tags;

pub use anchor::{AnchorScope, BackwardScan};
pub use attrs::{AttrValue, AttributeSet};
pub use decorate::{HrefDecorator, PatternRule};
pub use email::ObfuscationKeys;
pub use error::MarkupError;
pub use linkcard::LinkCard;
pub use paths::{ImagePaths, build_absolute_src, relative_directory, resolve};
pub use sizing::{ImageSize, SizingAnnotator};
pub use tag::{RegexTagExtractor, ScannedTag, TagExtractor, TagName};
pub use tags::TagExpander;
