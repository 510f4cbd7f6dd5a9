//! Extended image sizing syntax: `![alt](src =WxH)`.
//!
//! Sizing spans both build phases. [`preprocess`] runs on markdown source and
//! replaces the suffix with a marker comment; [`SizingAnnotator`] runs on the
//! rendered HTML and turns the marker into `width`/`height` attributes.

mod annotate;
mod marker;
mod preprocess;

pub use annotate::SizingAnnotator;
pub use marker::ImageSize;
pub use preprocess::preprocess;
