//! Credential resolution.
//!
//! Values come from two layers:
//! - the process environment (`CANVAS_API_URL`, `CANVAS_API_TOKEN`), which always wins;
//! - the first `.env` file found in the project root, the home directory or the
//!   current working directory, in that order. Later files are never consulted once
//!   one is found.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the API base URL (including `/api/v1`).
pub const URL_VAR: &str = "CANVAS_API_URL";
/// Environment variable holding the API token.
pub const TOKEN_VAR: &str = "CANVAS_API_TOKEN";
/// Name of the configuration file searched for.
pub const CONFIG_FILE_NAME: &str = ".env";

/// A Canvas API token, wrapped so it is never printed by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Reveal the token, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiToken(***)")
    }
}

/// Resolved, validated Canvas credentials. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    base_url: Url,
    api_token: ApiToken,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if either value is blank and
    /// [`ConfigError::InvalidUrl`] if the URL is not an absolute http(s) URL.
    pub fn new(base_url: &str, api_token: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.trim();
        let api_token = api_token.trim();

        let missing: Vec<&str> = [(URL_VAR, base_url), (TOKEN_VAR, api_token)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| key)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing {
                missing: missing.join(", "),
            });
        }

        let url = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) URL such as https://school.instructure.com/api/v1"
                    .to_string(),
            });
        }

        Ok(Self {
            base_url: url,
            api_token: ApiToken(api_token.to_string()),
        })
    }

    /// The API base URL, e.g. `https://school.instructure.com/api/v1`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The API token.
    #[must_use]
    pub fn api_token(&self) -> &ApiToken {
        &self.api_token
    }
}

/// Resolves [`Credentials`] from an environment snapshot and a list of search directories.
///
/// Both inputs are explicit so resolution can be exercised without touching the
/// real process environment; [`CredentialResolver::from_process`] wires the real ones.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    env: HashMap<String, String>,
    search_dirs: Vec<PathBuf>,
}

impl CredentialResolver {
    /// A resolver with no environment and no search directories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver reading the process environment and the default search directories.
    #[must_use]
    pub fn from_process() -> Self {
        let env = [URL_VAR, TOKEN_VAR]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self {
            env,
            search_dirs: default_search_dirs(),
        }
    }

    /// Set an environment value.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Append a directory to the search list.
    #[must_use]
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Directories searched for a configuration file, in order.
    #[must_use]
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// The first configuration file that exists, if any.
    #[must_use]
    pub fn config_file(&self) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Resolve credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the chosen configuration file cannot be parsed,
    /// if either value is still unset, or if the URL is invalid.
    pub fn resolve(&self) -> Result<Credentials, ConfigError> {
        let env_url = self.env_value(URL_VAR);
        let env_token = self.env_value(TOKEN_VAR);

        let file_values = if env_url.is_some() && env_token.is_some() {
            HashMap::new()
        } else if let Some(path) = self.config_file() {
            tracing::debug!(path = %path.display(), "reading Canvas configuration file");
            read_config_file(&path)?
        } else {
            HashMap::new()
        };

        let from_file = |key: &str| {
            file_values
                .get(key)
                .map(String::as_str)
                .filter(|value| !value.trim().is_empty())
        };

        let url = env_url.or_else(|| from_file(URL_VAR)).unwrap_or_default();
        let token = env_token.or_else(|| from_file(TOKEN_VAR)).unwrap_or_default();
        Credentials::new(url, token)
    }

    fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

/// The default search order: project root, home directory, current directory.
#[must_use]
pub fn default_search_dirs() -> Vec<PathBuf> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let project_root = manifest_dir.parent().unwrap_or(manifest_dir).to_path_buf();

    let mut dirs = vec![project_root];
    dirs.extend(dirs::home_dir());
    dirs.extend(std::env::current_dir().ok());
    dirs
}

fn read_config_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let to_error = |e: dotenvy::Error| ConfigError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = item.map_err(to_error)?;
        values.insert(key, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const URL: &str = "https://school.instructure.com/api/v1";

    fn write_env(dir: &TempDir, contents: &str) {
        fs::write(dir.path().join(CONFIG_FILE_NAME), contents).expect("write .env");
    }

    #[test]
    fn test_env_only() {
        let creds = CredentialResolver::new()
            .with_env(URL_VAR, URL)
            .with_env(TOKEN_VAR, "abc")
            .resolve()
            .expect("credentials");
        assert_eq!(creds.base_url().as_str(), URL);
        assert_eq!(creds.api_token().expose(), "abc");
    }

    #[test]
    fn test_env_overrides_file_per_key() {
        let dir = TempDir::new().expect("tempdir");
        write_env(
            &dir,
            "CANVAS_API_URL=https://file.example.edu/api/v1\nCANVAS_API_TOKEN=file-token\n",
        );

        let creds = CredentialResolver::new()
            .with_env(TOKEN_VAR, "env-token")
            .with_search_dir(dir.path())
            .resolve()
            .expect("credentials");
        assert_eq!(creds.api_token().expose(), "env-token");
        assert_eq!(creds.base_url().as_str(), "https://file.example.edu/api/v1");
    }

    #[test]
    fn test_first_file_wins_without_merging() {
        let first = TempDir::new().expect("tempdir");
        let second = TempDir::new().expect("tempdir");
        write_env(&first, "CANVAS_API_URL=https://first.example.edu/api/v1\n");
        write_env(
            &second,
            "CANVAS_API_URL=https://second.example.edu/api/v1\nCANVAS_API_TOKEN=second\n",
        );

        let resolver = CredentialResolver::new()
            .with_search_dir(first.path())
            .with_search_dir(second.path());
        assert_eq!(
            resolver.config_file(),
            Some(first.path().join(CONFIG_FILE_NAME))
        );

        let err = resolver.resolve().expect_err("token only lives in the second file");
        assert_eq!(
            err,
            ConfigError::Missing {
                missing: TOKEN_VAR.to_string()
            }
        );
    }

    #[test]
    fn test_missing_directories_are_skipped() {
        let empty = TempDir::new().expect("tempdir");
        let configured = TempDir::new().expect("tempdir");
        write_env(
            &configured,
            "# Canvas\nCANVAS_API_URL=\"https://quoted.example.edu/api/v1\"\nCANVAS_API_TOKEN=t0k3n\n",
        );

        let creds = CredentialResolver::new()
            .with_search_dir(empty.path().join("does-not-exist"))
            .with_search_dir(empty.path())
            .with_search_dir(configured.path())
            .resolve()
            .expect("credentials");
        assert_eq!(creds.base_url().host_str(), Some("quoted.example.edu"));
    }

    #[test]
    fn test_blank_env_counts_as_unset() {
        let dir = TempDir::new().expect("tempdir");
        write_env(&dir, &format!("CANVAS_API_URL={URL}\nCANVAS_API_TOKEN=from-file\n"));

        let creds = CredentialResolver::new()
            .with_env(TOKEN_VAR, "   ")
            .with_search_dir(dir.path())
            .resolve()
            .expect("credentials");
        assert_eq!(creds.api_token().expose(), "from-file");
    }

    #[test]
    fn test_nothing_configured() {
        let err = CredentialResolver::new().resolve().expect_err("no sources");
        assert_eq!(
            err,
            ConfigError::Missing {
                missing: format!("{URL_VAR}, {TOKEN_VAR}")
            }
        );
        assert!(err.to_string().contains(".env"));
    }

    #[test]
    fn test_invalid_url() {
        let err = Credentials::new("canvas.example.edu", "abc").expect_err("relative url");
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = Credentials::new("ftp://canvas.example.edu/api/v1", "abc").expect_err("ftp");
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_token_is_redacted() {
        let creds = Credentials::new(URL, "super-secret").expect("credentials");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }
}
