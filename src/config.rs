use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Deployment environment. Each environment carries fixed base URLs for the
/// two backends; explicit configuration (file or env vars) overrides them.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  Dev,
  Test,
  #[default]
  Production,
}

impl Environment {
  /// Resolve an environment from a host name.
  ///
  /// `localhost`, `127.0.0.1`, or a host containing `dev` or
  /// `kenilworthinternational.com` resolve to `Dev`; a host containing
  /// `test` resolves to `Test`; anything else is `Production`. The dev
  /// checks run first, so a host containing both `dev` and `test` resolves
  /// to `Dev` (see DESIGN.md).
  pub fn from_host(host: &str) -> Self {
    let host = host.to_lowercase();
    if host == "localhost"
      || host == "127.0.0.1"
      || host.contains("dev")
      || host.contains("kenilworthinternational.com")
    {
      Environment::Dev
    } else if host.contains("test") {
      Environment::Test
    } else {
      Environment::Production
    }
  }

  /// Fixed base URL of the primary API for this environment.
  pub fn primary_url(&self) -> &'static str {
    match self {
      Environment::Dev => "https://dsms-api-dev.kenilworthinternational.com/api",
      Environment::Test => "https://dsms-api-test.kenilworthinternational.com/api",
      Environment::Production => "https://dsms-api.kenilworthinternational.com/api",
    }
  }

  /// Fixed base URL of the Node backend for this environment.
  pub fn node_url(&self) -> &'static str {
    match self {
      Environment::Dev => "https://dsms-web-api-dev.kenilworthinternational.com",
      Environment::Test => "https://dsms-web-api-test.kenilworthinternational.com",
      Environment::Production => "https://dsms-web-api.kenilworthinternational.com",
    }
  }
}

/// Resolved backend base URLs.
#[derive(Debug, Clone)]
pub struct ApiBases {
  pub primary: Url,
  pub node: Url,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
  /// Deployment environment selecting the fixed base URLs.
  pub environment: Option<Environment>,
  /// Explicit primary API base, overriding the environment default.
  pub primary_url: Option<Url>,
  /// Explicit Node backend base, overriding the environment default.
  pub node_url: Option<Url>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Default estate preselected by list commands.
  pub default_estate: Option<String>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./dsms.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/dsms/config.yaml
  ///
  /// A missing file yields the default configuration; environment variables
  /// still apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("dsms.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("dsms").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Build a configuration pointing both backends at explicit base URLs.
  pub fn for_bases(primary: Url, node: Url) -> Self {
    Self {
      api: ApiConfig {
        environment: None,
        primary_url: Some(primary),
        node_url: Some(node),
      },
      default_estate: None,
    }
  }

  /// Resolve the backend base URLs.
  ///
  /// Precedence per backend: `DSMS_API_URL` / `DSMS_NODE_API_URL` env vars,
  /// then explicit config values, then the fixed URL of the configured
  /// environment (`DSMS_ENV` overrides the file's environment).
  pub fn api_bases(&self) -> Result<ApiBases> {
    let environment = match std::env::var("DSMS_ENV") {
      Ok(name) => parse_environment(&name)?,
      Err(_) => self.api.environment.unwrap_or_default(),
    };

    let primary = resolve_base(
      "DSMS_API_URL",
      self.api.primary_url.as_ref(),
      environment.primary_url(),
    )?;
    let node = resolve_base(
      "DSMS_NODE_API_URL",
      self.api.node_url.as_ref(),
      environment.node_url(),
    )?;

    Ok(ApiBases { primary, node })
  }
}

fn parse_environment(name: &str) -> Result<Environment> {
  match name.to_lowercase().as_str() {
    "dev" => Ok(Environment::Dev),
    "test" => Ok(Environment::Test),
    "production" | "prod" => Ok(Environment::Production),
    other => Err(eyre!("Unknown DSMS_ENV value: {}", other)),
  }
}

fn resolve_base(var: &str, configured: Option<&Url>, fixed: &str) -> Result<Url> {
  if let Ok(value) = std::env::var(var) {
    return Url::parse(&value).map_err(|e| eyre!("Invalid {} value {}: {}", var, value, e));
  }
  if let Some(url) = configured {
    return Ok(url.clone());
  }
  Url::parse(fixed).map_err(|e| eyre!("Invalid base URL {}: {}", fixed, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn localhost_resolves_dev() {
    assert_eq!(Environment::from_host("localhost"), Environment::Dev);
    assert_eq!(Environment::from_host("127.0.0.1"), Environment::Dev);
  }

  #[test]
  fn dev_host_resolves_dev() {
    assert_eq!(
      Environment::from_host("dsms-web-api-dev.kenilworthinternational.com"),
      Environment::Dev
    );
  }

  #[test]
  fn test_host_resolves_test() {
    assert_eq!(
      Environment::from_host("dsms-test.example.com"),
      Environment::Test
    );
  }

  #[test]
  fn unknown_host_resolves_production() {
    assert_eq!(
      Environment::from_host("app.example.com"),
      Environment::Production
    );
  }

  #[test]
  fn dev_wins_over_test() {
    // Documented precedence: the dev checks run before the test check.
    assert_eq!(
      Environment::from_host("dev-test.example.com"),
      Environment::Dev
    );
  }

  #[test]
  fn explicit_bases_override_environment() {
    let config = Config::for_bases(
      Url::parse("http://primary.local/api").unwrap(),
      Url::parse("http://node.local").unwrap(),
    );
    let bases = config.api_bases().unwrap();
    assert_eq!(bases.primary.as_str(), "http://primary.local/api");
    assert_eq!(bases.node.as_str(), "http://node.local/");
  }
}
