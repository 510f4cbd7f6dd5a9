//! Build driver: scan, validate, render in parallel and write HTML.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use quill_archive::ArchiveResolver;
use quill_config::Config;
use quill_markup::{ImagePaths, MarkupError};
use rayon::prelude::*;

use crate::document::{Document, DocumentError};
use crate::pipeline::{BuildContext, HookError, Pipeline};
use crate::renderer::{MarkdownRenderer, Renderer};
use crate::scanner::{Scanner, output_path};
use crate::validate::{TagReport, validate_tags};

/// Error returned when a build stops.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Source directory missing.
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// I/O error reading a source or writing output.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Invalid pipeline configuration.
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Tags with spaces, reported for all documents at once.
    #[error("{0}")]
    InvalidTags(#[from] TagReport),
    /// A hook failed for one document.
    #[error("Failed to process {path}: {source}")]
    Process {
        path: String,
        #[source]
        source: HookError,
    },
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub documents: usize,
    pub output_dir: PathBuf,
}

/// Renders every markdown source of a site.
pub struct SiteBuilder {
    source_dir: PathBuf,
    output_dir: PathBuf,
    pipeline: Pipeline,
    renderer: Box<dyn Renderer>,
    context: BuildContext,
}

impl SiteBuilder {
    /// Builder wired from configuration.
    ///
    /// Fails when an href pattern does not compile.
    pub fn from_config(config: &Config) -> Result<Self, BuildError> {
        let decorator = config.href_decorator.decorator()?;
        let pipeline = Pipeline::new(ImagePaths::new(config.cdn_base()), decorator);
        let archive = ArchiveResolver::new(config.archive.settings());

        Ok(Self {
            source_dir: config.build_resolved.source_dir.clone(),
            output_dir: config.build_resolved.output_dir.clone(),
            pipeline,
            renderer: Box::new(MarkdownRenderer::new()),
            context: BuildContext::new(archive),
        })
    }

    /// Builder with an explicit pipeline and context.
    pub fn new(
        source_dir: PathBuf,
        output_dir: PathBuf,
        pipeline: Pipeline,
        context: BuildContext,
    ) -> Self {
        Self {
            source_dir,
            output_dir,
            pipeline,
            renderer: Box::new(MarkdownRenderer::new()),
            context,
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Read and parse every source document.
    pub fn load_documents(&self) -> Result<Vec<Document>, BuildError> {
        if !self.source_dir.is_dir() {
            return Err(BuildError::SourceNotFound(self.source_dir.clone()));
        }

        Scanner::new(self.source_dir.clone())
            .with_exclude(self.output_dir.clone())
            .scan()
            .into_par_iter()
            .map(|source| -> Result<Document, BuildError> {
                let text = fs::read_to_string(&source.path).map_err(|e| BuildError::Io {
                    path: source.path.clone(),
                    source: e,
                })?;
                Ok(Document::parse(source.relative_path, &text)?)
            })
            .collect()
    }

    /// Load documents and validate their tags without rendering.
    ///
    /// Returns the number of documents checked.
    pub fn check(&self) -> Result<usize, BuildError> {
        let documents = self.load_documents()?;
        validate_tags(&documents)?;
        Ok(documents.len())
    }

    /// Run the full build.
    pub fn build(&self) -> Result<BuildSummary, BuildError> {
        let start = Instant::now();
        let mut documents = self.load_documents()?;
        validate_tags(&documents)?;

        documents
            .par_iter_mut()
            .try_for_each(|doc| -> Result<(), BuildError> {
                self.pipeline
                    .process(doc, self.renderer.as_ref(), &self.context)
                    .map_err(|source| BuildError::Process {
                        path: doc.relative_path.clone(),
                        source,
                    })?;
                self.write(doc)
            })?;

        tracing::info!(
            documents = documents.len(),
            archived = self.context.archive.cache().len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Build complete"
        );

        Ok(BuildSummary {
            documents: documents.len(),
            output_dir: self.output_dir.clone(),
        })
    }

    fn write(&self, doc: &Document) -> Result<(), BuildError> {
        let path = output_path(&self.output_dir, &doc.relative_path);
        let io_error = |source| BuildError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&path, &doc.output).map_err(io_error)?;
        tracing::debug!(path = %path.display(), "Wrote document");
        Ok(())
    }
}
