// # ddns-agent
//
// Reports this host's public IPv4 to the edge once and exits. Schedule it
// with cron or a systemd timer.
//
// ```bash
// export DDNS_SHARED_KEY=change-me
// export DDNS_ENDPOINT_URL=ddns.example.workers.dev
//
// ddns-agent
// ```

use ddns_agent::{Agent, AgentSettings};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes, same meaning as the daemon's
#[derive(Debug, Clone, Copy)]
enum AgentExitCode {
    /// Update accepted
    Success = 0,
    /// Configuration error
    ConfigError = 1,
    /// Lookup or update failed
    RuntimeError = 2,
}

impl From<AgentExitCode> for ExitCode {
    fn from(code: AgentExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let settings = match AgentSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return AgentExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return AgentExitCode::ConfigError.into();
    }

    let log_level = match settings.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AgentExitCode::ConfigError.into();
    }

    let agent = match Agent::from_settings(&settings) {
        Ok(agent) => agent,
        Err(e) => {
            error!("Failed to create agent: {}", e);
            return AgentExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AgentExitCode::RuntimeError.into();
        }
    };

    match rt.block_on(agent.run_once()) {
        Ok(addr) => {
            info!("Reported {}", addr);
            AgentExitCode::Success.into()
        }
        Err(e) => {
            error!("Failed to update DNS record: {}", e);
            AgentExitCode::RuntimeError.into()
        }
    }
}
