//! Source discovery by filesystem walking.
//!
//! The scanner only finds files; reading and parsing happens in the builder.

use std::fs;
use std::path::{Path, PathBuf};

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Location of one markdown source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Path relative to the source directory, `/`-separated.
    pub relative_path: String,
    /// Absolute path on disk.
    pub path: PathBuf,
}

/// Finds markdown files below a source directory.
///
/// Hidden entries are skipped, as is the excluded directory (usually the
/// output directory when it lives inside the source tree).
pub struct Scanner {
    source_dir: PathBuf,
    exclude: Option<PathBuf>,
}

impl Scanner {
    pub fn new(source_dir: PathBuf) -> Self {
        Self {
            source_dir,
            exclude: None,
        }
    }

    #[must_use]
    pub fn with_exclude(mut self, dir: PathBuf) -> Self {
        self.exclude = Some(dir);
        self
    }

    /// Sources sorted by relative path.
    ///
    /// Returns an empty Vec if the source directory doesn't exist.
    pub fn scan(&self) -> Vec<SourceRef> {
        let mut refs = Vec::new();
        if self.source_dir.exists() {
            self.scan_directory(&self.source_dir, "", &mut refs);
        }
        refs.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        refs
    }

    fn scan_directory(&self, dir_path: &Path, prefix: &str, refs: &mut Vec<SourceRef>) {
        let Ok(entries) = fs::read_dir(dir_path) else {
            return;
        };

        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let path = entry.path();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };

            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                if self.exclude.as_deref() == Some(path.as_path()) {
                    continue;
                }
                self.scan_directory(&path, &relative, refs);
            } else if is_markdown(&path) {
                refs.push(SourceRef {
                    relative_path: relative,
                    path,
                });
            }
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
}

/// Output path for a source: same relative location with an `.html` extension.
pub fn output_path(output_dir: &Path, relative_path: &str) -> PathBuf {
    output_dir.join(relative_path).with_extension("html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relative_paths(refs: &[SourceRef]) -> Vec<&str> {
        refs.iter().map(|r| r.relative_path.as_str()).collect()
    }

    #[test]
    fn test_scan_finds_markdown() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "index.md");
        touch(dir.path(), "blog/_posts/2020-01-01-post.markdown");
        touch(dir.path(), "notes/readme.MD");
        touch(dir.path(), "assets/dog.jpg");

        let refs = Scanner::new(dir.path().to_path_buf()).scan();

        assert_eq!(
            relative_paths(&refs),
            vec!["blog/_posts/2020-01-01-post.markdown", "index.md", "notes/readme.MD"]
        );
        assert_eq!(refs[1].path, dir.path().join("index.md"));
    }

    #[test]
    fn test_scan_skips_hidden_and_excluded() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".git/notes.md");
        touch(dir.path(), ".draft.md");
        touch(dir.path(), "_site/old.md");
        touch(dir.path(), "page.md");

        let refs = Scanner::new(dir.path().to_path_buf())
            .with_exclude(dir.path().join("_site"))
            .scan();

        assert_eq!(relative_paths(&refs), vec!["page.md"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let refs = Scanner::new(PathBuf::from("/nonexistent/quill-src")).scan();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/out"), "blog/post.markdown"),
            PathBuf::from("/out/blog/post.html")
        );
    }
}
