//! Binary entry point: parse flags, wire logging, run the control loop.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use waveroam::cli_app::Cli;
use waveroam::core::config::Config;
use waveroam::core::errors::Result;
use waveroam::daemon::loop_main::RoamController;
use waveroam::daemon::signals::register_shutdown_flag;
use waveroam::proc::command::SystemRunner;
use waveroam::supervise::DaemonSupervisor;

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "exiting on error");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(tick_ms) = cli.tick_ms {
        config.roam.tick_ms = tick_ms;
    }
    if let Some(cooldown_ms) = cli.cooldown_ms {
        config.roam.cooldown_ms = cooldown_ms;
    }
    config.validate()?;

    let shutdown = register_shutdown_flag()?;
    let runner = SystemRunner;
    let supervisor = DaemonSupervisor::new(cli.interface.clone(), &config, &runner);
    let mut controller = RoamController::new(
        supervisor,
        &runner,
        &config,
        f64::from(cli.roam_threshold),
        !cli.no_dhcp,
    );
    controller.run(&shutdown)
}
