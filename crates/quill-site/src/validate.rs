//! Front matter tag validation.
//!
//! Tags with spaces slugify to the same archive page as their hyphenated
//! twin, so the build refuses them.

use std::collections::HashSet;
use std::fmt;

use crate::document::Document;

/// Documents holding tags with spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTags {
    pub path: String,
    pub tags: Vec<String>,
}

/// Aggregated validation failure for a whole build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReport {
    pub documents: Vec<InvalidTags>,
}

impl fmt::Display for TagReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tag validation failed: tags cannot contain spaces")?;
        writeln!(f)?;
        writeln!(
            f,
            "Found {} document(s) with invalid tags:",
            self.documents.len()
        )?;
        writeln!(f)?;
        for doc in &self.documents {
            writeln!(f, "  - {}", doc.path)?;
            writeln!(f, "    Invalid tags: {}", doc.tags.join(", "))?;
            writeln!(f)?;
        }
        writeln!(
            f,
            "Please replace spaces with hyphens (e.g., 'vintage web' -> 'vintage-web')."
        )
    }
}

impl std::error::Error for TagReport {}

/// Check every document's tags, visiting each relative path once.
pub fn validate_tags<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Result<(), TagReport> {
    let mut seen = HashSet::new();
    let mut invalid = Vec::new();

    for doc in documents {
        if !seen.insert(doc.relative_path.as_str()) {
            continue;
        }
        let tags: Vec<String> = doc
            .data
            .tags()
            .into_iter()
            .filter(|tag| tag.contains(' '))
            .collect();
        if !tags.is_empty() {
            invalid.push(InvalidTags {
                path: doc.relative_path.clone(),
                tags,
            });
        }
    }

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(TagReport { documents: invalid })
    }
}
