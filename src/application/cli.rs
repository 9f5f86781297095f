#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use super::repl::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::IntentClassifier;

/// What `main` should run once arguments are parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Launch {
    Chat,
    Serve,
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn log_path() -> path::PathBuf {
    if let Ok(dir) = std::env::var("SHOPFLOOR_LOG_DIR") {
        return path::PathBuf::from(dir).join("debug.log");
    }

    return dirs::cache_dir()
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("shopfloor/debug.log");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Shopfloor")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Shopfloor with environment variable RUST_LOG=shopfloor")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        )
        .subcommand(
            Command::new("classify")
                .about("Prints the fragment kind a message would be routed to.")
                .arg(
                    clap::Arg::new("text")
                        .help("Message to classify")
                        .num_args(1..)
                        .required(true),
                )
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start a new chat session. This is the default.");
}

fn subcommand_serve() -> Command {
    return Command::new("serve")
        .about("Serves the generation endpoint, applying rate limits and provider credentials before forwarding to the upstream.");
}

fn arg_global(key: ConfigKey, env: &'static str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("shopfloor")
        .about(about)
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_serve())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("SHOPFLOOR_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(arg_global(
            ConfigKey::EndpointURL,
            "SHOPFLOOR_ENDPOINT_URL",
            format!("Base URL of the service exposing the streaming generation endpoint. [default: {}]", Config::default(ConfigKey::EndpointURL)),
        ))
        .arg(arg_global(
            ConfigKey::SandboxURL,
            "SHOPFLOOR_SANDBOX_URL",
            format!("Base URL of the sandbox execution service. [default: {}]", Config::default(ConfigKey::SandboxURL)),
        ))
        .arg(arg_global(
            ConfigKey::HealthCheckTimeout,
            "SHOPFLOOR_HEALTH_CHECK_TIMEOUT",
            format!("Time to wait in milliseconds before timing out when health checking the generation endpoint. [default: {}]", Config::default(ConfigKey::HealthCheckTimeout)),
        ))
        .arg(
            arg_global(
                ConfigKey::Model,
                "SHOPFLOOR_MODEL",
                format!("Model used for generative requests. [default: {}]", Config::default(ConfigKey::Model)),
            )
            .short('m'),
        )
        .arg(
            arg_global(
                ConfigKey::Provider,
                "SHOPFLOOR_PROVIDER",
                format!("Provider hosting the model. [default: {}]", Config::default(ConfigKey::Provider)),
            )
            .short('p'),
        )
        .arg(arg_global(
            ConfigKey::ApiKey,
            "SHOPFLOOR_API_KEY",
            "Your own provider API key. Requests carrying one skip the rate limit.".to_string(),
        ))
        .arg(
            arg_global(
                ConfigKey::Template,
                "SHOPFLOOR_TEMPLATE",
                format!("Template the generated code targets. [default: {}]", Config::default(ConfigKey::Template)),
            )
            .short('t'),
        )
        .arg(arg_global(
            ConfigKey::SynthesisDelay,
            "SHOPFLOOR_SYNTHESIS_DELAY",
            format!("Milliseconds to wait before answering canned store requests. [default: {}]", Config::default(ConfigKey::SynthesisDelay)),
        ))
        .arg(
            arg_global(
                ConfigKey::RequireAuth,
                "SHOPFLOOR_REQUIRE_AUTH",
                format!("Whether a signed in user is required before generating. [default: {}]", Config::default(ConfigKey::RequireAuth)),
            )
            .value_parser(PossibleValuesParser::new(["true", "false"])),
        )
        .arg(arg_global(
            ConfigKey::UserID,
            "SHOPFLOOR_USER_ID",
            "User to sign in as at start.".to_string(),
        ))
        .arg(arg_global(
            ConfigKey::TeamID,
            "SHOPFLOOR_TEAM_ID",
            "Team of the signed in user.".to_string(),
        ))
        .arg(arg_global(
            ConfigKey::AccessToken,
            "SHOPFLOOR_ACCESS_TOKEN",
            "Access token forwarded to the sandbox service.".to_string(),
        ))
        .arg(arg_global(
            ConfigKey::ServerAddr,
            "SHOPFLOOR_SERVER_ADDR",
            format!("Address the gate server listens on. [default: {}]", Config::default(ConfigKey::ServerAddr)),
        ))
        .arg(
            arg_global(
                ConfigKey::TrustForwardedFor,
                "SHOPFLOOR_TRUST_FORWARDED_FOR",
                format!("Key gate rate limits by the first X-Forwarded-For hop instead of the peer address. Only enable behind a proxy that sets it. [default: {}]", Config::default(ConfigKey::TrustForwardedFor)),
            )
            .value_parser(PossibleValuesParser::new(["true", "false"])),
        )
        .arg(arg_global(
            ConfigKey::UpstreamURL,
            "SHOPFLOOR_UPSTREAM_URL",
            format!("URL the gate server forwards admitted generation requests to. [default: {}]", Config::default(ConfigKey::UpstreamURL)),
        ))
        .arg(arg_global(
            ConfigKey::RateLimitMaxRequests,
            "RATE_LIMIT_MAX_REQUESTS",
            format!("Requests allowed per caller within the rate limit window when serving the gate. [default: {}]", Config::default(ConfigKey::RateLimitMaxRequests)),
        ))
        .arg(arg_global(
            ConfigKey::RateLimitWindow,
            "RATE_LIMIT_WINDOW",
            format!("Rate limit window length, such as 60s, 30m, 12h or 1d. [default: {}]", Config::default(ConfigKey::RateLimitWindow)),
        ));
}

/// Handles one-shot subcommands. Returns what to launch, or `None` when the
/// command already did its work.
pub async fn parse() -> Result<Option<Launch>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_path().to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                Some(("classify", classify_matches)) => {
                    let text = classify_matches
                        .get_many::<String>("text")
                        .map(|values| return values.cloned().collect::<Vec<String>>().join(" "))
                        .unwrap_or_default();
                    println!("{}", IntentClassifier::classify(&text));
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("serve", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Launch::Serve));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Some(Launch::Chat));
}
