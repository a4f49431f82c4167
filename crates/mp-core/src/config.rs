//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `meta-publish.toml` (or the file passed with `--config`)
//! 3. Defaults
//!
//! `${VAR_NAME}` inside the TOML file is expanded from the environment
//! before parsing, so credentials can stay out of the file.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::secret::SecretString;

/// Caption used when `POST_MESSAGE` is unset or empty
pub const DEFAULT_MESSAGE: &str = "RobCo Weather Watch — automated post ✅";

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "meta-publish.toml";

const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v25.0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Graph API connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Base URL without version segment
    pub base_url: String,

    /// Versioned path prefix, e.g. `v25.0`
    pub api_version: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GraphConfig {
    /// Build the full URL for a Graph path such as `123/feed`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Run parameters for a single publish
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Facebook Page id
    pub page_id: String,

    /// Long-lived system user token, exchanged for a Page token
    pub system_token: SecretString,

    /// Text of the feed post, also used as photo and Instagram caption
    pub message: String,

    /// Publicly reachable image; `None` skips photo and Instagram steps
    pub image_url: Option<String>,

    /// Instagram business account override; `None` means look it up
    pub ig_user_id: Option<String>,

    /// Whether to publish the plain text feed post
    pub text_post: bool,

    pub graph: GraphConfig,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            page_id: String::new(),
            system_token: SecretString::default(),
            message: DEFAULT_MESSAGE.to_string(),
            image_url: None,
            ig_user_id: None,
            text_post: true,
            graph: GraphConfig::default(),
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Trimmed value, or `None` when blank
fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Only the literal `true` (any case) enables a flag
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

impl PublishConfig {
    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        Self::from_lookup(&env_lookup)
    }

    /// Load from an explicit file, `./meta-publish.toml`, or the environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, Path::new(DEFAULT_CONFIG_FILE), &env_lookup)
    }

    fn load_with(
        explicit: Option<&Path>,
        default_file: &Path,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_toml_file_with(path, lookup);
        }

        if default_file.exists() {
            return Self::from_toml_file_with(default_file, lookup);
        }

        Ok(Self::from_lookup(lookup))
    }

    /// Load a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_file_with(path.as_ref(), &env_lookup)
    }

    fn from_toml_file_with(path: &Path, lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::from_toml_str(&content, lookup)
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        cfg.apply_overrides(lookup);
        cfg
    }

    fn from_toml_str(content: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let expanded = expand_env_vars(content, lookup);
        let file: TomlConfig = toml::from_str(&expanded)?;

        let mut cfg = Self::default();

        if let Some(page) = file.page {
            if let Some(id) = page.id {
                cfg.page_id = id.trim().to_string();
            }
            if let Some(token) = page.system_token {
                cfg.system_token = SecretString::new(token.trim().to_string());
            }
        }

        if let Some(post) = file.post {
            if let Some(message) = post.message.filter(|m| !m.is_empty()) {
                cfg.message = message;
            }
            cfg.image_url = post.image_url.as_deref().and_then(non_blank);
            if let Some(text_post) = post.text_post {
                cfg.text_post = text_post;
            }
        }

        if let Some(instagram) = file.instagram {
            cfg.ig_user_id = instagram.user_id.as_deref().and_then(non_blank);
        }

        if let Some(graph) = file.graph {
            if let Some(base_url) = graph.base_url {
                cfg.graph.base_url = base_url;
            }
            if let Some(api_version) = graph.api_version {
                cfg.graph.api_version = api_version;
            }
            if let Some(timeout_secs) = graph.timeout_secs {
                cfg.graph.timeout_secs = timeout_secs;
            }
        }

        cfg.apply_overrides(lookup);
        Ok(cfg)
    }

    /// Override with environment values that are set and non-empty
    fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = get("FB_PAGE_ID") {
            self.page_id = id.trim().to_string();
        }
        if let Some(token) = get("META_SYSTEM_TOKEN") {
            self.system_token = SecretString::new(token.trim().to_string());
        }
        if let Some(message) = lookup("POST_MESSAGE").filter(|m| !m.is_empty()) {
            self.message = message;
        }
        if let Some(url) = get("IMAGE_URL") {
            self.image_url = non_blank(&url);
        }
        if let Some(id) = get("IG_USER_ID") {
            self.ig_user_id = non_blank(&id);
        }
        if let Some(flag) = get("FB_TEXT_POST") {
            self.text_post = parse_flag(&flag);
        }
        if let Some(url) = get("GRAPH_API_URL") {
            self.graph.base_url = url.trim().to_string();
        }
        if let Some(version) = get("GRAPH_API_VERSION") {
            self.graph.api_version = version.trim().to_string();
        }
        if let Some(secs) = get("GRAPH_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            self.graph.timeout_secs = secs;
        }
    }

    /// Page id and system token must both be present, timeout non-zero
    pub fn validate(&self) -> Result<()> {
        if self.page_id.trim().is_empty() || self.system_token.is_empty() {
            return Err(Error::Config(
                "Missing FB_PAGE_ID or META_SYSTEM_TOKEN".to_string(),
            ));
        }
        if self.graph.timeout_secs == 0 {
            return Err(Error::Config(
                "GRAPH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// Replace `${VAR_NAME}` with the variable's value; unknown variables become empty.
fn expand_env_vars(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }

            if let Some(env_value) = lookup(&var_name) {
                result.push_str(&env_value);
            }
        } else {
            result.push(c);
        }
    }

    result
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    page: Option<TomlPageConfig>,
    post: Option<TomlPostConfig>,
    instagram: Option<TomlInstagramConfig>,
    graph: Option<TomlGraphConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlPageConfig {
    id: Option<String>,
    system_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlPostConfig {
    message: Option<String>,
    image_url: Option<String>,
    text_post: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlInstagramConfig {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlGraphConfig {
    base_url: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
}
