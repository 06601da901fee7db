use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;

use crate::{DEFAULT_DEV_ACCOUNTS, LEGACY_DECIMALS, LEGACY_INITIAL_SUPPLY, TOKEN_NAME, TOKEN_SYMBOL};

/// Serde adapter for u128 ↔ TOML: serialize as string, deserialize from string or integer.
/// TOML crate doesn't natively support u128, so we round-trip through strings.
mod u128_toml {
    use super::*;

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        use serde::de::{self, Visitor};
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                if v >= 0 {
                    Ok(v as u128)
                } else {
                    Err(E::custom("negative value for u128"))
                }
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("environment variable {var}: {reason}")]
    Env { var: &'static str, reason: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Constructor arguments of the legacy token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTokenConfig {
    /// Supply in raw units, credited to the deployer
    #[serde(with = "u128_toml")]
    pub initial_supply: u128,
    pub name: String,
    pub decimals: u8,
    pub symbol: String,
}

impl Default for LegacyTokenConfig {
    fn default() -> Self {
        Self {
            initial_supply: LEGACY_INITIAL_SUPPLY,
            name: TOKEN_NAME.to_string(),
            decimals: LEGACY_DECIMALS,
            symbol: TOKEN_SYMBOL.to_string(),
        }
    }
}

/// Deployment configuration: what the deploy script creates and how many
/// dev accounts a fresh chain starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub legacy: LegacyTokenConfig,
    #[serde(default = "default_dev_accounts")]
    pub dev_accounts: usize,
}

fn default_dev_accounts() -> usize {
    DEFAULT_DEV_ACCOUNTS
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            legacy: LegacyTokenConfig::default(),
            dev_accounts: DEFAULT_DEV_ACCOUNTS,
        }
    }
}

impl DeployConfig {
    /// Load deploy config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: DeployConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load deploy config from environment variables, falling back to the
    /// default deployment for anything unset.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::load_from_vars(|var| std::env::var(var).ok())
    }

    /// Same as [`DeployConfig::load_from_env`], reading variables through
    /// `lookup`.
    pub fn load_from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LegacyTokenConfig::default();

        let initial_supply = var_parse(&lookup, "SUB_LEGACY_SUPPLY", defaults.initial_supply)?;
        let decimals = var_parse(&lookup, "SUB_LEGACY_DECIMALS", defaults.decimals)?;
        let dev_accounts = var_parse(&lookup, "SUB_DEV_ACCOUNTS", DEFAULT_DEV_ACCOUNTS)?;
        let name = lookup("SUB_LEGACY_NAME").unwrap_or(defaults.name);
        let symbol = lookup("SUB_LEGACY_SYMBOL").unwrap_or(defaults.symbol);

        let config = Self {
            legacy: LegacyTokenConfig {
                initial_supply,
                name,
                decimals,
                symbol,
            },
            dev_accounts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save deploy config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.legacy.name.is_empty() || self.legacy.name.len() > 64 {
            return Err(ConfigError::Invalid(
                "legacy.name must be 1-64 characters".to_string(),
            ));
        }
        if self.legacy.symbol.is_empty() || self.legacy.symbol.len() > 8 {
            return Err(ConfigError::Invalid(
                "legacy.symbol must be 1-8 characters".to_string(),
            ));
        }
        if self.legacy.decimals > 18 {
            return Err(ConfigError::Invalid(
                "legacy.decimals must be 0-18".to_string(),
            ));
        }
        if self.legacy.initial_supply == 0 {
            return Err(ConfigError::Invalid(
                "legacy.initial_supply must be > 0".to_string(),
            ));
        }
        if self.dev_accounts == 0 {
            return Err(ConfigError::Invalid(
                "dev_accounts must be at least 1 (the deployer)".to_string(),
            ));
        }
        Ok(())
    }
}

fn var_parse<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Env {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = DeployConfig::default();
        assert_eq!(config.legacy.initial_supply, 59_200_000_000);
        assert_eq!(config.legacy.name, "Substratum");
        assert_eq!(config.legacy.decimals, 2);
        assert_eq!(config.legacy.symbol, "SUB");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_string_and_integer_supply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deploy.toml");

        fs::write(
            &path,
            r#"
dev_accounts = 5

[legacy]
initial_supply = "59200000000"
name = "Substratum"
decimals = 2
symbol = "SUB"
"#,
        )
        .unwrap();
        let config = DeployConfig::load_from_file(&path).unwrap();
        assert_eq!(config.legacy.initial_supply, 59_200_000_000);
        assert_eq!(config.dev_accounts, 5);

        fs::write(
            &path,
            r#"
[legacy]
initial_supply = 1000
name = "Old"
decimals = 2
symbol = "OLD"
"#,
        )
        .unwrap();
        let config = DeployConfig::load_from_file(&path).unwrap();
        assert_eq!(config.legacy.initial_supply, 1000);
        assert_eq!(config.dev_accounts, DEFAULT_DEV_ACCOUNTS);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deploy.toml");
        let config = DeployConfig::default();
        config.save_to_file(&path).unwrap();
        assert_eq!(DeployConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DeployConfig::default();
        config.legacy.symbol = "TOOLONGSYM".to_string();
        assert!(config.validate().is_err());

        let mut config = DeployConfig::default();
        config.legacy.initial_supply = 0;
        assert!(config.validate().is_err());

        let mut config = DeployConfig::default();
        config.dev_accounts = 0;
        assert!(config.validate().is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_env_unset_gives_defaults() {
        let config = DeployConfig::load_from_vars(vars(&[])).unwrap();
        assert_eq!(config, DeployConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = DeployConfig::load_from_vars(vars(&[
            ("SUB_LEGACY_SUPPLY", " 1000 "),
            ("SUB_LEGACY_DECIMALS", "4"),
            ("SUB_LEGACY_NAME", "Old"),
            ("SUB_LEGACY_SYMBOL", "OLD"),
            ("SUB_DEV_ACCOUNTS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.legacy.initial_supply, 1000);
        assert_eq!(config.legacy.decimals, 4);
        assert_eq!(config.legacy.name, "Old");
        assert_eq!(config.legacy.symbol, "OLD");
        assert_eq!(config.dev_accounts, 3);
    }

    #[test]
    fn test_env_parse_errors() {
        let result = DeployConfig::load_from_vars(vars(&[("SUB_LEGACY_SUPPLY", "lots")]));
        assert!(matches!(
            result,
            Err(ConfigError::Env {
                var: "SUB_LEGACY_SUPPLY",
                ..
            })
        ));

        let result = DeployConfig::load_from_vars(vars(&[("SUB_LEGACY_DECIMALS", "300")]));
        assert!(matches!(
            result,
            Err(ConfigError::Env {
                var: "SUB_LEGACY_DECIMALS",
                ..
            })
        ));

        // Parses, but fails validation
        let result = DeployConfig::load_from_vars(vars(&[("SUB_DEV_ACCOUNTS", "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = DeployConfig::load_from_file(Path::new("/nonexistent/deploy.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
