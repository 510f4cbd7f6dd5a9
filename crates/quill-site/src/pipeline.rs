//! Ordered hooks run around the renderer.
//!
//! Pre-render hooks rewrite [`Document::content`]; post-render hooks rewrite
//! [`Document::output`]. Each hook is a named pass and the first failing hook
//! stops the document.

use std::borrow::Cow;
use std::fmt;

use quill_archive::ArchiveResolver;
use quill_markup::email::inject_assets;
use quill_markup::{
    HrefDecorator, ImagePaths, MarkupError, ObfuscationKeys, SizingAnnotator, TagExpander,
};

use crate::document::Document;
use crate::renderer::Renderer;

/// Build phase a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreRender,
    PostRender,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreRender => "pre_render",
            Self::PostRender => "post_render",
        })
    }
}

/// State shared by every document of one build.
pub struct BuildContext {
    pub archive: ArchiveResolver,
    pub keys: ObfuscationKeys,
}

impl BuildContext {
    /// Context with freshly generated obfuscation keys.
    pub fn new(archive: ArchiveResolver) -> Self {
        Self {
            archive,
            keys: ObfuscationKeys::generate(),
        }
    }

    #[must_use]
    pub fn with_keys(mut self, keys: ObfuscationKeys) -> Self {
        self.keys = keys;
        self
    }
}

/// A named pass over one document.
pub trait Hook: Send + Sync {
    fn name(&self) -> &'static str;

    fn phase(&self) -> Phase;

    fn run(&self, doc: &mut Document, ctx: &BuildContext) -> Result<(), MarkupError>;
}

/// Replace `target` when the pass produced new text.
fn apply(target: &mut String, pass: impl FnOnce(&str) -> Cow<'_, str>) {
    let updated = match pass(target.as_str()) {
        Cow::Owned(text) => Some(text),
        Cow::Borrowed(_) => None,
    };
    if let Some(text) = updated {
        *target = text;
    }
}

/// Expands `{% linkcard %}` and `{% email %}` tags.
pub struct TagExpansionHook;

impl Hook for TagExpansionHook {
    fn name(&self) -> &'static str {
        "embedded_tags"
    }

    fn phase(&self) -> Phase {
        Phase::PreRender
    }

    fn run(&self, doc: &mut Document, ctx: &BuildContext) -> Result<(), MarkupError> {
        let expander = TagExpander::new(&ctx.archive, &ctx.keys);
        let updated = match expander.expand(&doc.content)? {
            Cow::Owned(text) => Some(text),
            Cow::Borrowed(_) => None,
        };
        if let Some(text) = updated {
            doc.content = text;
        }
        Ok(())
    }
}

/// Rewrites `![alt](src =WxH)` into markdown plus a size marker.
pub struct SizingPreprocessHook;

impl Hook for SizingPreprocessHook {
    fn name(&self) -> &'static str {
        "image_sizing_preprocess"
    }

    fn phase(&self) -> Phase {
        Phase::PreRender
    }

    fn run(&self, doc: &mut Document, _ctx: &BuildContext) -> Result<(), MarkupError> {
        apply(&mut doc.content, quill_markup::sizing::preprocess);
        Ok(())
    }
}

/// Makes image paths site-absolute and CDN-prefixed.
pub struct ImagePathsHook {
    paths: ImagePaths,
}

impl ImagePathsHook {
    pub fn new(paths: ImagePaths) -> Self {
        Self { paths }
    }
}

impl Hook for ImagePathsHook {
    fn name(&self) -> &'static str {
        "image_paths"
    }

    fn phase(&self) -> Phase {
        Phase::PostRender
    }

    fn run(&self, doc: &mut Document, _ctx: &BuildContext) -> Result<(), MarkupError> {
        let relative_path = doc.relative_path.as_str();
        apply(&mut doc.output, |html| self.paths.rewrite(html, relative_path));
        Ok(())
    }
}

/// Turns size markers into attributes and links sized images.
#[derive(Default)]
pub struct SizingAnnotateHook {
    annotator: SizingAnnotator,
}

impl SizingAnnotateHook {
    pub fn new(annotator: SizingAnnotator) -> Self {
        Self { annotator }
    }
}

impl Hook for SizingAnnotateHook {
    fn name(&self) -> &'static str {
        "image_sizing_annotate"
    }

    fn phase(&self) -> Phase {
        Phase::PostRender
    }

    fn run(&self, doc: &mut Document, _ctx: &BuildContext) -> Result<(), MarkupError> {
        apply(&mut doc.output, |html| self.annotator.annotate(html));
        Ok(())
    }
}

/// Adds configured attributes to matching links.
pub struct HrefDecoratorHook {
    decorator: HrefDecorator,
}

impl HrefDecoratorHook {
    pub fn new(decorator: HrefDecorator) -> Self {
        Self { decorator }
    }
}

impl Hook for HrefDecoratorHook {
    fn name(&self) -> &'static str {
        "href_decorator"
    }

    fn phase(&self) -> Phase {
        Phase::PostRender
    }

    fn run(&self, doc: &mut Document, _ctx: &BuildContext) -> Result<(), MarkupError> {
        apply(&mut doc.output, |html| self.decorator.decorate(html));
        Ok(())
    }
}

/// Inserts the email decoding assets before the first obfuscated link.
pub struct EmailAssetsHook;

impl Hook for EmailAssetsHook {
    fn name(&self) -> &'static str {
        "email_assets"
    }

    fn phase(&self) -> Phase {
        Phase::PostRender
    }

    fn run(&self, doc: &mut Document, ctx: &BuildContext) -> Result<(), MarkupError> {
        if let Some(html) = inject_assets(&doc.output, &ctx.keys) {
            doc.output = html;
        }
        Ok(())
    }
}

/// Error from a hook, tagged with the hook that raised it.
#[derive(Debug, thiserror::Error)]
#[error("{hook} failed: {source}")]
pub struct HookError {
    pub hook: &'static str,
    #[source]
    pub source: MarkupError,
}

/// Ordered hook list.
pub struct Pipeline {
    hooks: Vec<Box<dyn Hook>>,
}

impl Pipeline {
    /// Pipeline with no hooks.
    pub fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Default hooks in build order.
    pub fn new(paths: ImagePaths, decorator: HrefDecorator) -> Self {
        Self::empty()
            .with_hook(Box::new(TagExpansionHook))
            .with_hook(Box::new(SizingPreprocessHook))
            .with_hook(Box::new(ImagePathsHook::new(paths)))
            .with_hook(Box::new(SizingAnnotateHook::default()))
            .with_hook(Box::new(HrefDecoratorHook::new(decorator)))
            .with_hook(Box::new(EmailAssetsHook))
    }

    /// Append a hook; hooks run in insertion order within their phase.
    #[must_use]
    pub fn with_hook(mut self, hook: Box<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Hook names for `phase`, in run order.
    pub fn hook_names(&self, phase: Phase) -> Vec<&'static str> {
        self.hooks
            .iter()
            .filter(|hook| hook.phase() == phase)
            .map(|hook| hook.name())
            .collect()
    }

    /// Run every hook of `phase` over `doc`.
    pub fn run_phase(
        &self,
        phase: Phase,
        doc: &mut Document,
        ctx: &BuildContext,
    ) -> Result<(), HookError> {
        for hook in self.hooks.iter().filter(|hook| hook.phase() == phase) {
            tracing::debug!(hook = hook.name(), %phase, path = %doc.relative_path, "Running hook");
            hook.run(doc, ctx).map_err(|source| HookError {
                hook: hook.name(),
                source,
            })?;
        }
        Ok(())
    }

    /// Pre-render hooks, renderer, then post-render hooks.
    pub fn process(
        &self,
        doc: &mut Document,
        renderer: &dyn Renderer,
        ctx: &BuildContext,
    ) -> Result<(), HookError> {
        self.run_phase(Phase::PreRender, doc, ctx)?;
        doc.output = renderer.render(&doc.content);
        self.run_phase(Phase::PostRender, doc, ctx)
    }
}
