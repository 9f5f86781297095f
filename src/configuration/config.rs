#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

#[cfg(target_os = "macos")]
use std::env;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    AccessToken,
    ApiKey,
    ConfigFile,
    EndpointURL,
    HealthCheckTimeout,
    Model,
    Provider,
    RateLimitMaxRequests,
    RateLimitWindow,
    RequireAuth,
    SandboxURL,
    ServerAddr,
    SynthesisDelay,
    TeamID,
    Template,
    TrustForwardedFor,
    UpstreamURL,
    UserID,
}

/// Parses window lengths such as `60s`, `30m`, `12h` or `1d`. A bare number is
/// read as seconds.
pub fn parse_window(value: &str) -> Result<Duration> {
    let value = value.trim();
    if value.is_empty() {
        bail!("Window must not be empty");
    }

    let (amount, unit) = match value.find(|c: char| return !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };

    let amount = amount.parse::<u64>()?;
    let multiplier: u64 = match unit.trim() {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        other => bail!(format!("Unknown window unit '{other}' in {value}")),
    };

    let seconds = match amount.checked_mul(multiplier) {
        Some(seconds) => seconds,
        None => bail!(format!("Window {value} is too long")),
    };

    return Ok(Duration::from_secs(seconds));
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    /// Same as `get`, but empty values come back as `None`.
    pub fn get_opt(key: ConfigKey) -> Option<String> {
        let val = Config::get(key);
        if val.is_empty() {
            return None;
        }

        return Some(val);
    }

    pub fn get_bool(key: ConfigKey) -> bool {
        return ["true", "1", "yes"].contains(&Config::get(key).to_lowercase().as_str());
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("shopfloor/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = path::PathBuf::from(env::var("HOME").unwrap_or_default())
            .join(".config/shopfloor/config.toml");

        let res = match key {
            ConfigKey::AccessToken => "",
            ConfigKey::ApiKey => "",
            ConfigKey::EndpointURL => "http://localhost:3000",
            ConfigKey::HealthCheckTimeout => "1000",
            ConfigKey::Model => "gpt-4o-mini",
            ConfigKey::Provider => "openai",
            ConfigKey::RateLimitMaxRequests => "10",
            ConfigKey::RateLimitWindow => "1d",
            ConfigKey::RequireAuth => "false",
            ConfigKey::SandboxURL => "http://localhost:3000",
            ConfigKey::ServerAddr => "127.0.0.1:3000",
            ConfigKey::SynthesisDelay => "2000",
            ConfigKey::TeamID => "",
            ConfigKey::Template => "auto",
            ConfigKey::TrustForwardedFor => "false",
            ConfigKey::UpstreamURL => "http://localhost:8080/v1/fragments",
            ConfigKey::UserID => "",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_bool) = val.as_bool() {
                        Config::set(key, &val_bool.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        Config::validate()?;

        tracing::debug!(
            endpoint_url = %Config::get(ConfigKey::EndpointURL),
            sandbox_url = %Config::get(ConfigKey::SandboxURL),
            model = %Config::get(ConfigKey::Model),
            provider = %Config::get(ConfigKey::Provider),
            template = %Config::get(ConfigKey::Template),
            require_auth = %Config::get(ConfigKey::RequireAuth),
            "config"
        );

        return Ok(());
    }

    fn validate() -> Result<()> {
        for key in [
            ConfigKey::HealthCheckTimeout,
            ConfigKey::RateLimitMaxRequests,
            ConfigKey::SynthesisDelay,
        ] {
            let val = Config::get(key);
            if val.parse::<u64>().is_err() {
                bail!(format!("'{key}' must be a whole number, got: {val}"));
            }
        }

        parse_window(&Config::get(ConfigKey::RateLimitWindow))?;

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg.get_help()?.to_string();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() || val.parse::<bool>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
