//! Source documents and their front matter.

use std::collections::BTreeMap;

use serde::Deserialize;

const FRONT_MATTER_FENCE: &str = "---";

/// Error returned when a document's front matter cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Invalid front matter in {path}: {source}")]
pub struct DocumentError {
    pub path: String,
    #[source]
    pub source: serde_yaml::Error,
}

/// Front matter fields read by the build.
///
/// Keys other than `title` and `tags` are kept untouched in `extra`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub tags: Option<serde_yaml::Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Tags as strings. A single value counts as one tag.
    pub fn tags(&self) -> Vec<String> {
        match &self.tags {
            None | Some(serde_yaml::Value::Null) => Vec::new(),
            Some(serde_yaml::Value::Sequence(items)) => {
                items.iter().filter_map(scalar_to_string).collect()
            }
            Some(value) => scalar_to_string(value).into_iter().collect(),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One document moving through the pipeline.
///
/// `content` holds the markdown body during the pre-render phase and
/// `output` the rendered HTML during the post-render phase.
#[derive(Debug, Default)]
pub struct Document {
    /// Source-relative path with `/` separators.
    pub relative_path: String,
    pub content: String,
    pub output: String,
    pub data: FrontMatter,
}

impl Document {
    /// Document with no front matter.
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Split leading `---` front matter from `source` and parse it.
    ///
    /// Sources without a closing fence are treated as plain content.
    pub fn parse(relative_path: impl Into<String>, source: &str) -> Result<Self, DocumentError> {
        let relative_path = relative_path.into();
        let Some((yaml, body)) = split_front_matter(source) else {
            return Ok(Self::new(relative_path, source));
        };

        let data = if yaml.trim().is_empty() {
            FrontMatter::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|source| DocumentError {
                path: relative_path.clone(),
                source,
            })?
        };

        Ok(Self {
            relative_path,
            content: body.to_owned(),
            output: String::new(),
            data,
        })
    }
}

/// Returns `(yaml, body)` when `source` opens with a front matter block.
fn split_front_matter(source: &str) -> Option<(&str, &str)> {
    let after_fence = source.strip_prefix(FRONT_MATTER_FENCE)?;
    let rest = after_fence
        .strip_prefix('\n')
        .or_else(|| after_fence.strip_prefix("\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
