//! Configuration management for Quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! Values are layered, lowest precedence first:
//! 1. `quill.toml` (or built-in defaults when no file is found)
//! 2. environment overrides ([`EnvSettings`])
//! 3. CLI settings ([`CliSettings`])
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `build.source_dir`
//! - `build.output_dir`
//! - `image_paths.base_url`
//! - `archive.user_agent`
//! - `archive.contact`

pub mod env;
mod expand;

use std::fmt;
use std::path::{Path, PathBuf};

use quill_archive::{ArchiveSettings, default_user_agent};
use quill_markup::{AttributeSet, HrefDecorator};
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

pub use env::EnvSettings;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override markdown source directory.
    pub source_dir: Option<PathBuf>,
    /// Override HTML output directory.
    pub output_dir: Option<PathBuf>,
    /// Override CDN base for image paths.
    pub base_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build paths (relative strings from TOML).
    build: BuildConfigRaw,
    /// Image path rewriting.
    pub image_paths: ImagePathsConfig,
    /// Link decoration rules.
    pub href_decorator: HrefDecoratorConfig,
    /// Link card archive lookups.
    pub archive: ArchiveConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default)]
pub struct BuildConfig {
    /// Directory scanned for markdown documents.
    pub source_dir: PathBuf,
    /// Directory receiving rendered HTML.
    pub output_dir: PathBuf,
}

/// Image path rewriting configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImagePathsConfig {
    /// CDN prefix for site-relative image paths; empty for none.
    pub base_url: String,
}

/// Link decoration configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HrefDecoratorConfig {
    /// Attributes applied to every link that matches at least one pattern.
    pub properties: AttributeSet,
    /// Ordered pattern rules; later rules override earlier ones per key.
    #[serde(deserialize_with = "deserialize_patterns")]
    pub patterns: Vec<PatternConfig>,
}

impl HrefDecoratorConfig {
    /// Compile the configured rules.
    pub fn decorator(&self) -> Result<HrefDecorator, quill_markup::MarkupError> {
        HrefDecorator::new(
            self.properties.clone(),
            self.patterns
                .iter()
                .map(|rule| (rule.pattern.as_str(), rule.properties.clone())),
        )
    }
}

/// One href pattern with its attribute overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConfig {
    /// Regular expression matched against the href.
    pub pattern: String,
    /// Attributes merged over the global properties on match.
    pub properties: AttributeSet,
}

/// Archive configuration for link cards.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Look up existing captures.
    pub enabled: bool,
    /// Submit URLs to SavePageNow (implies lookup).
    pub save: bool,
    /// Full User-Agent; built from `contact` when unset or blank.
    pub user_agent: Option<String>,
    /// Contact placed in the default User-Agent.
    pub contact: Option<String>,
}

impl ArchiveConfig {
    /// Effective archive settings.
    #[must_use]
    pub fn settings(&self) -> ArchiveSettings {
        ArchiveSettings {
            enabled: self.enabled,
            save: self.save,
            user_agent: self
                .user_agent
                .as_deref()
                .map(str::trim)
                .filter(|user_agent| !user_agent.is_empty())
                .map_or_else(|| default_user_agent(self.contact.as_deref()), str::to_owned),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PatternBody {
    #[serde(default)]
    properties: AttributeSet,
}

/// `[[href_decorator.patterns]]` entries: each table maps one or more
/// regexes to `{ properties = ... }`. Key order is kept.
fn deserialize_patterns<'de, D>(deserializer: D) -> Result<Vec<PatternConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PatternTable(Vec<PatternConfig>);

    impl<'de> Deserialize<'de> for PatternTable {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct TableVisitor;

            impl<'de> Visitor<'de> for TableVisitor {
                type Value = PatternTable;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("a table mapping regex patterns to { properties }")
                }

                fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                    let mut rules = Vec::new();
                    while let Some((pattern, body)) = map.next_entry::<String, PatternBody>()? {
                        rules.push(PatternConfig {
                            pattern,
                            properties: body.properties,
                        });
                    }
                    Ok(PatternTable(rules))
                }
            }

            deserializer.deserialize_map(TableVisitor)
        }
    }

    let tables = Vec::<PatternTable>::deserialize(deserializer)?;
    Ok(tables.into_iter().flat_map(|table| table.0).collect())
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`image_paths.base_url`").
        field: String,
        /// Error message (e.g., "${`CDN_HOST`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with environment and CLI overrides.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, &EnvSettings::from_env(), cli_settings)
    }

    /// [`Config::load`] with explicit environment overrides.
    pub fn load_with_env(
        config_path: Option<&Path>,
        env_settings: &EnvSettings,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        config.apply_env_settings(env_settings);
        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.normalize();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides to the configuration.
    fn apply_env_settings(&mut self, settings: &EnvSettings) {
        if let Some(asset_host) = &settings.asset_host {
            self.image_paths.base_url.clone_from(asset_host);
        }
        if let Some(enabled) = settings.archive_enabled {
            self.archive.enabled = enabled;
        }
        if let Some(save) = settings.archive_save {
            self.archive.save = save;
        }
        if let Some(user_agent) = &settings.archive_user_agent {
            self.archive.user_agent = Some(user_agent.clone());
        }
        if let Some(contact) = &settings.archive_contact {
            self.archive.contact = Some(contact.clone());
        }
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(base_url) = &settings.base_url {
            self.image_paths.base_url.clone_from(base_url);
        }
    }

    /// Drop trailing `/` from the CDN base so joined image paths never
    /// contain `//`.
    fn normalize(&mut self) {
        let trimmed = self.image_paths.base_url.trim_end_matches('/').len();
        self.image_paths.base_url.truncate(trimmed);
    }

    /// Effective CDN base for image paths.
    #[must_use]
    pub fn cdn_base(&self) -> &str {
        &self.image_paths.base_url
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            build: BuildConfigRaw::default(),
            image_paths: ImagePathsConfig::default(),
            href_decorator: HrefDecoratorConfig::default(),
            archive: ArchiveConfig::default(),
            build_resolved: BuildConfig {
                source_dir: base.join("docs"),
                output_dir: base.join("_site"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically at the end of [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_href_decorator()
    }

    /// Every pattern must compile; errors name the offending pattern.
    fn validate_href_decorator(&self) -> Result<(), ConfigError> {
        self.href_decorator
            .decorator()
            .map(|_| ())
            .map_err(|e| ConfigError::Validation(format!("href_decorator.patterns: {e}")))
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_opt(&mut self.build.source_dir, "build.source_dir")?;
        expand::expand_opt(&mut self.build.output_dir, "build.output_dir")?;
        self.image_paths.base_url =
            expand::expand_env(&self.image_paths.base_url, "image_paths.base_url")?;
        expand::expand_opt(&mut self.archive.user_agent, "archive.user_agent")?;
        expand::expand_opt(&mut self.archive.contact, "archive.contact")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "docs"),
            output_dir: resolve(self.build.output_dir.as_deref(), "_site"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_markup::AttrValue;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/test/_site"));
        assert_eq!(config.cdn_base(), "");
        assert!(config.href_decorator.patterns.is_empty());
        assert!(!config.archive.settings().is_active());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.image_paths.base_url, "");
        assert!(!config.archive.enabled);
    }

    #[test]
    fn test_parse_href_decorator() {
        let toml = r#"
[href_decorator]
properties = [{ target = "_blank" }, { rel = "noopener" }]

[[href_decorator.patterns]]
"^https?://" = { properties = [{ class = "external" }] }

[[href_decorator.patterns]]
"/assets/" = { properties = { download = true, target = false } }
"\\.pdf$" = { properties = { type = "application/pdf" } }
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let decorator = &config.href_decorator;

        assert_eq!(
            decorator.properties,
            AttributeSet::new().with("target", "_blank").with("rel", "noopener")
        );
        let patterns: Vec<&str> = decorator.patterns.iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["^https?://", "/assets/", "\\.pdf$"]);
        assert_eq!(
            decorator.patterns[1].properties.get("target"),
            Some(&AttrValue::Flag(false))
        );
        assert_eq!(decorator.decorator().unwrap().rule_count(), 3);
    }

    #[test]
    fn test_parse_numeric_attribute() {
        let toml = r#"
[[href_decorator.patterns]]
"/" = { properties = { tabindex = -1 } }
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.href_decorator.patterns[0].properties.get("tabindex"),
            Some(&AttrValue::from("-1"))
        );
    }

    #[test]
    fn test_parse_archive_config() {
        let toml = r#"
[archive]
enabled = true
contact = "mailto:me@example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let settings = config.archive.settings();
        assert!(settings.enabled);
        assert!(!settings.save);
        assert_eq!(
            settings.user_agent,
            "quill:linkcard-archive (+mailto:me@example.com)"
        );
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[build]
source_dir = "content"
output_dir = "public"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/project/content"));
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/project/public"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: Config = toml::from_str(
            r#"
[image_paths]
base_url = "https://cdn.example.com"

[archive]
enabled = true
user_agent = "file-agent"
"#,
        )
        .unwrap();

        config.apply_env_settings(&EnvSettings {
            asset_host: Some(String::new()),
            archive_enabled: Some(false),
            archive_save: Some(true),
            archive_user_agent: Some("env-agent".to_owned()),
            archive_contact: None,
        });

        assert_eq!(config.cdn_base(), "");
        let settings = config.archive.settings();
        assert!(!settings.enabled);
        assert!(settings.save);
        assert!(settings.is_active());
        assert_eq!(settings.user_agent, "env-agent");
    }

    #[test]
    fn test_env_contact_builds_user_agent() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_env_settings(&EnvSettings {
            archive_contact: Some("https://example.com".to_owned()),
            ..Default::default()
        });
        assert_eq!(
            config.archive.settings().user_agent,
            "quill:linkcard-archive (+https://example.com)"
        );
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_env_settings(&EnvSettings {
            asset_host: Some("https://env.example.com".to_owned()),
            ..Default::default()
        });
        config.apply_cli_settings(&CliSettings {
            base_url: Some("https://cli.example.com".to_owned()),
            output_dir: Some(PathBuf::from("/out")),
            ..Default::default()
        });

        assert_eq!(config.cdn_base(), "https://cli.example.com");
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/out"));
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test/docs"));
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.cdn_base(), "");
    }

    #[test]
    fn test_expand_env_vars_base_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("QUILL_TEST_CDN", "https://cdn.test.com");
        }

        let mut config: Config = toml::from_str(
            r#"
[image_paths]
base_url = "${QUILL_TEST_CDN}"

[archive]
contact = "${QUILL_TEST_CONTACT:-mailto:ops@example.com}"
"#,
        )
        .unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.cdn_base(), "https://cdn.test.com");
        assert_eq!(config.archive.contact.as_deref(), Some("mailto:ops@example.com"));

        unsafe {
            std::env::remove_var("QUILL_TEST_CDN");
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[build]
source_dir = "src"

[image_paths]
base_url = "/cdn"
"#,
        )
        .unwrap();

        let config = Config::load_with_env(Some(&path), &EnvSettings::default(), None).unwrap();

        assert_eq!(config.build_resolved.source_dir, dir.path().join("src"));
        assert_eq!(config.build_resolved.output_dir, dir.path().join("_site"));
        assert_eq!(config.cdn_base(), "/cdn");
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load_with_env(
            Some(Path::new("/nonexistent/quill.toml")),
            &EnvSettings::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[[href_decorator.patterns]]
"(unclosed" = { properties = { rel = "noopener" } }
"#,
        )
        .unwrap();

        let err = Config::load_with_env(Some(&path), &EnvSettings::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("(unclosed"));
    }

    // Validation tests

    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(msg.contains(s), "Expected error to contain '{s}', got: {msg}");
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_names_bad_pattern() {
        let config: Config = toml::from_str(
            r#"
[[href_decorator.patterns]]
"[a-" = { properties = { target = "_blank" } }
"#,
        )
        .unwrap();
        assert_validation_error(&config, &["href_decorator.patterns", "[a-"]);
    }

    #[test]
    fn test_asset_host_trailing_slash_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[image_paths]\nbase_url = \"/cdn/\"\n").unwrap();

        let env = EnvSettings {
            asset_host: Some("https://cdn.example.com/".to_owned()),
            ..Default::default()
        };
        let config = Config::load_with_env(Some(&path), &env, None).unwrap();

        assert_eq!(config.cdn_base(), "https://cdn.example.com");
        let src = quill_markup::resolve("dog.jpg", "blog/2020", config.cdn_base());
        assert_eq!(src, "https://cdn.example.com/blog/2020/dog.jpg");
        assert!(!src["https://".len()..].contains("//"));
    }

    #[test]
    fn test_file_and_cli_base_url_trailing_slash_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[image_paths]\nbase_url = \"/cdn/\"\n").unwrap();

        let config = Config::load_with_env(Some(&path), &EnvSettings::default(), None).unwrap();
        assert_eq!(config.cdn_base(), "/cdn");

        let cli = CliSettings {
            base_url: Some("/".to_owned()),
            ..Default::default()
        };
        let config = Config::load_with_env(Some(&path), &EnvSettings::default(), Some(&cli)).unwrap();
        assert_eq!(config.cdn_base(), "");
    }

    #[test]
    fn test_empty_user_agent_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[archive]\nenabled = true\n").unwrap();

        let env = EnvSettings {
            archive_user_agent: Some(String::new()),
            archive_contact: Some("https://example.com".to_owned()),
            ..Default::default()
        };
        let config = Config::load_with_env(Some(&path), &env, None).unwrap();

        assert_eq!(
            config.archive.settings().user_agent,
            "quill:linkcard-archive (+https://example.com)"
        );
    }

    #[test]
    fn test_blank_user_agent_uses_default() {
        let archive = ArchiveConfig {
            user_agent: Some("   ".to_owned()),
            ..Default::default()
        };
        assert_eq!(archive.settings().user_agent, default_user_agent(None));
    }
}
