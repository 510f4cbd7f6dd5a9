//! Document model, hook pipeline and build driver for Quill.
//!
//! A build loads every markdown source below the source directory, checks
//! front matter tags, then runs each document through the [`Pipeline`]:
//!
//! 1. pre-render hooks over the markdown (embedded tags, image sizing syntax)
//! 2. the [`Renderer`]
//! 3. post-render hooks over the HTML (image paths, sizing annotation, link
//!    decoration, email assets)
//!
//! Documents are processed in parallel; the [`BuildContext`] is shared.

mod builder;
mod document;
mod pipeline;
mod renderer;
mod scanner;
mod validate;

pub use builder::{BuildError, BuildSummary, SiteBuilder};
pub use document::{Document, DocumentError, FrontMatter};
pub use pipeline::{
    BuildContext, EmailAssetsHook, Hook, HookError, HrefDecoratorHook, ImagePathsHook, Phase,
    Pipeline, SizingAnnotateHook, SizingPreprocessHook, TagExpansionHook,
};
pub use renderer::{MarkdownRenderer, Renderer};
pub use scanner::{Scanner, SourceRef, output_path};
pub use validate::{InvalidTags, TagReport, validate_tags};
