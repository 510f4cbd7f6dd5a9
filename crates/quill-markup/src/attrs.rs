//! Ordered attribute sets with merge-and-remove semantics.

use std::fmt::Write as _;

/// Attribute value as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Boolean value. `true` renders a bare attribute, `false` removes it.
    Flag(bool),
    /// Any other value, rendered as `name="value"`.
    Text(String),
}

impl AttrValue {
    /// Whether this value removes the attribute (`false` or `"false"`).
    #[must_use]
    pub fn is_removal(&self) -> bool {
        match self {
            Self::Flag(flag) => !flag,
            Self::Text(text) => text == "false",
        }
    }

    /// Whether this value renders as a bare attribute (`true` or `"true"`).
    #[must_use]
    pub fn is_bare(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => text == "true",
        }
    }

    fn is_nil(&self) -> bool {
        matches!(self, Self::Text(text) if text == "nil")
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Insertion-ordered mapping from attribute name to value.
///
/// Setting an existing key replaces its value in place, so the render order is
/// the order in which keys were first declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`AttributeSet::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(key, _)| key != name);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Merge `other` over `self`: removal values delete keys, anything else
    /// sets them.
    pub fn merge_over(&mut self, other: &Self) {
        for (name, value) in &other.entries {
            if value.is_removal() {
                self.remove(name);
            } else {
                self.set(name.clone(), value.clone());
            }
        }
    }

    /// Render as an attribute string with a leading space per attribute.
    ///
    /// Attributes for which `skip` returns `true` are left out, as are removal
    /// and `"nil"` values.
    #[must_use]
    pub fn render_filtered(&self, mut skip: impl FnMut(&str, &AttrValue) -> bool) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            if value.is_removal() || value.is_nil() || skip(name, value) {
                continue;
            }
            match value {
                _ if value.is_bare() => {
                    let _ = write!(out, " {name}");
                }
                AttrValue::Text(text) => {
                    let _ = write!(
                        out,
                        " {name}=\"{}\"",
                        html_escape::encode_double_quoted_attribute(text)
                    );
                }
                AttrValue::Flag(_) => {}
            }
        }
        out
    }

    /// Render every attribute.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.render_filtered(|_, _| false)
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use std::fmt;

    use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

    use super::{AttrValue, AttributeSet};

    impl<'de> Deserialize<'de> for AttrValue {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct ValueVisitor;

            impl Visitor<'_> for ValueVisitor {
                type Value = AttrValue;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("a string, number or boolean")
                }

                fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                    Ok(AttrValue::Flag(v))
                }

                fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                    Ok(AttrValue::Text(v.to_string()))
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                    Ok(AttrValue::Text(v.to_string()))
                }

                fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                    Ok(AttrValue::Text(v.to_string()))
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                    Ok(AttrValue::Text(v.to_owned()))
                }

                fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                    Ok(AttrValue::Text(v))
                }
            }

            deserializer.deserialize_any(ValueVisitor)
        }
    }

    /// Accepts a table (`{ target = "_blank" }`) or a list of single-key
    /// tables (`[{ target = "_blank" }, { rel = "noopener" }]`).
    impl<'de> Deserialize<'de> for AttributeSet {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct SetVisitor;

            impl<'de> Visitor<'de> for SetVisitor {
                type Value = AttributeSet;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("a table of attributes or a list of tables")
                }

                fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                    let mut set = AttributeSet::new();
                    while let Some((name, value)) = map.next_entry::<String, AttrValue>()? {
                        set.set(name, value);
                    }
                    Ok(set)
                }

                fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                    let mut set = AttributeSet::new();
                    while let Some(part) = seq.next_element::<AttributeSet>()? {
                        for (name, value) in part.entries {
                            set.set(name, value);
                        }
                    }
                    Ok(set)
                }
            }

            deserializer.deserialize_any(SetVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_keeps_first_position() {
        let mut set = AttributeSet::new().with("target", "_blank").with("rel", "noopener");
        set.set("target", "_self");

        let names: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["target", "rel"]);
        assert_eq!(set.get("target"), Some(&AttrValue::from("_self")));
    }

    #[test]
    fn test_merge_over_false_removes() {
        let mut base = AttributeSet::new().with("target", "_blank").with("rel", "noopener");
        let pattern = AttributeSet::new().with("target", false).with("class", "ext");

        base.merge_over(&pattern);

        assert_eq!(base.to_html(), r#" rel="noopener" class="ext""#);
    }

    #[test]
    fn test_merge_over_string_false_removes() {
        let mut base = AttributeSet::new().with("rel", "noopener");
        base.merge_over(&AttributeSet::new().with("rel", "false"));
        assert!(base.is_empty());
    }

    #[test]
    fn test_render_bare_and_escaped() {
        let set = AttributeSet::new()
            .with("download", true)
            .with("hidden", "true")
            .with("title", r#"say "hi" & <go>"#);

        assert_eq!(
            set.to_html(),
            r#" download hidden title="say &quot;hi&quot; &amp; &lt;go&gt;""#
        );
    }

    #[test]
    fn test_render_skips_nil_and_false() {
        let set = AttributeSet::new()
            .with("a", "nil")
            .with("b", false)
            .with("c", "x");
        assert_eq!(set.to_html(), r#" c="x""#);
    }

    #[test]
    fn test_render_filtered() {
        let set = AttributeSet::new().with("target", "_blank").with("rel", "noopener");
        assert_eq!(set.render_filtered(|name, _| name == "target"), r#" rel="noopener""#);
    }
}
