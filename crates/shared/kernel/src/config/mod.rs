use config::{Config, Environment, File, Map};
use portal_domain::config::PortalConfig;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `PORTAL__FETCH__TIMEOUT_SECONDS`.
pub const ENV_PREFIX: &str = "PORTAL";
/// Config file looked up when no explicit path is given (any supported extension).
pub const DEFAULT_CONFIG_FILE: &str = "portal";

/// Custom error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

impl ConfigError {
    fn with_context(context: &'static str) -> impl FnOnce(config::ConfigError) -> Self {
        move |source| Self::Config { source, context: Some(Cow::Borrowed(context)) }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// 1. **Base File**: an explicit `path` must exist. Without a path the loader
///    looks for `portal.{toml,json,yaml}` in the working directory and falls
///    back to defaults when it is absent.
/// 2. **Environment Overrides**: values from variables prefixed with `PORTAL__`;
///    nesting uses double underscores (`PORTAL__SETTINGS__SOURCE` maps to `settings.source`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicit file is missing, the sources are
/// malformed, or deserialization into `T` fails.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_config_with_env(path, None)
}

/// Same as [`load_config`], reading overrides from `env` instead of the
/// process environment when it is given.
fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    env: Option<Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let (effective_path, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.as_ref().to_path_buf(), true),
    );

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("bootstrap.optional")
                .convert_case(config::Case::Snake)
                .source(env),
        );

    info!(path = %effective_path.display(), required, "Loading config");

    let config = builder
        .build()
        .map_err(ConfigError::with_context("Failed to build config"))?
        .try_deserialize::<T>()
        .map_err(ConfigError::with_context("Failed to deserialize config"))?;

    Ok(config)
}

/// Loads the [`PortalConfig`] used by the shell and the bootstrap launchers.
///
/// # Errors
/// See [`load_config`].
pub fn load_portal_config(path: Option<impl AsRef<Path>>) -> Result<PortalConfig, ConfigError> {
    load_config::<PortalConfig>(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let missing = dir.path().join("absent.toml");

        let err = load_portal_config(Some(&missing)).expect_err("missing file must fail");
        assert!(err.to_string().contains("Failed to build config"));
    }

    #[test]
    #[serial]
    fn file_values_override_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("portal.toml");
        fs::write(
            &path,
            r#"
mode = "local"

[settings]
source = "https://example.org/settings.json"

[bootstrap]
readiness_timeout_seconds = 20
optional = ["quota", "capabilities"]
"#,
        )
        .expect("write config");

        let cfg = load_portal_config(Some(&path)).expect("config loads");
        assert_eq!(cfg.mode, "local");
        assert_eq!(cfg.settings.source, "https://example.org/settings.json");
        assert_eq!(cfg.bootstrap.readiness_timeout_seconds, Some(20));
        assert_eq!(cfg.fetch.timeout_seconds, 30);
        assert_eq!(cfg.bootstrap.optional, Some(vec!["quota".to_owned(), "capabilities".to_owned()]));
    }

    #[test]
    #[serial]
    fn optional_list_is_read_from_a_comma_separated_env_var() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("portal.toml");
        fs::write(&path, "[bootstrap]\noptional = [\"quota\"]\n").expect("write config");

        let env = Map::from([
            ("PORTAL__BOOTSTRAP__OPTIONAL".to_owned(), "logging,compatibility".to_owned()),
            ("PORTAL__FETCH__RETRY_DELAY_MS".to_owned(), "250".to_owned()),
        ]);
        let cfg: PortalConfig = load_config_with_env(Some(&path), Some(env)).expect("config loads");

        assert_eq!(cfg.bootstrap.optional, Some(vec!["logging".to_owned(), "compatibility".to_owned()]));
        assert_eq!(cfg.fetch.retry_delay_ms, 250);
    }
}
