#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::path;
use std::process;
use std::time::Duration;

use anyhow::Error;
use anyhow::Result;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::application::cli;
use crate::application::cli::Launch;
use crate::application::repl;
use crate::application::server;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Event;
use crate::domain::models::GenerationConfig;
use crate::domain::models::GenerationSettings;
use crate::domain::models::ModelDescriptor;
use crate::domain::models::Session;
use crate::domain::services::ConversationState;
use crate::domain::services::GenerationService;
use crate::infrastructure::backends::BackendManager;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! Shopfloor has failed with the following app version and error.\n\nVersion: {}\nError: {:#}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn generation_settings() -> GenerationSettings {
    let model = Config::get(ConfigKey::Model);
    let provider = Config::get(ConfigKey::Provider);

    return GenerationSettings {
        template: Config::get(ConfigKey::Template),
        model: ModelDescriptor {
            id: model.to_string(),
            provider: provider.to_string(),
            provider_id: provider.to_lowercase(),
            name: model.to_string(),
        },
        config: GenerationConfig {
            model,
            api_key: Config::get_opt(ConfigKey::ApiKey),
            ..Default::default()
        },
    };
}

fn session() -> Session {
    let mut session = Session {
        auth_required: Config::get_bool(ConfigKey::RequireAuth),
        ..Default::default()
    };

    if let Some(user_id) = Config::get_opt(ConfigKey::UserID) {
        session.login(
            &user_id,
            Config::get_opt(ConfigKey::TeamID),
            Config::get_opt(ConfigKey::AccessToken),
        );
    }

    return session;
}

async fn chat() -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let synthesis_delay = Config::get(ConfigKey::SynthesisDelay).parse::<u64>()?;
    let generations = GenerationService::new(
        BackendManager::generation(),
        BackendManager::sandbox(),
        generation_settings(),
        Duration::from_millis(synthesis_delay),
        event_tx,
    );

    let state = ConversationState::new(generations, session());
    return repl::start(state, &mut event_rx).await;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = env::var("SHOPFLOOR_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("shopfloor")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("shopfloor")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let launch = match cli::parse().await {
        Ok(Some(launch)) => launch,
        Ok(None) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let res = match launch {
        Launch::Chat => chat().await,
        Launch::Serve => server::serve().await,
    };

    if let Err(err) = res {
        handle_error(err);
    }

    process::exit(0);
}
