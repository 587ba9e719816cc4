//! Command handlers

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use plategate_app::context::{build_pipeline, load_registry};
use plategate_app::{AppContext, Config, GateController, HardwareBackend};
use plategate_domain::repository::PlateRegistry;
use plategate_domain::service::{decide, normalize_plate};
use plategate_infra::{load_allow_list, FileAuditLog};
use plategate_types::{Error, OutputFormat, Result};
use plategate_vision::{Camera, StillImageCamera};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands};
use crate::output;

pub fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let config = Config::load(config_path)?;
    let output_format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Run { simulate } => cmd_run(&config, simulate),
        Commands::Recognize { image } => cmd_recognize(&config, image, output_format),
        Commands::Check { plate } => cmd_check(&config, &plate, output_format),
        Commands::Plates => cmd_plates(&config, output_format),
        Commands::Sweep => cmd_sweep(&config, output_format),
        Commands::Audit { date } => cmd_audit(&config, date, output_format),
        Commands::Config {
            show,
            set_allow_list,
            set_relay_pin,
            set_motion_pin,
            set_hardware,
            set_output,
            reset,
        } => cmd_config(
            config_path,
            config,
            show,
            set_allow_list,
            set_relay_pin,
            set_motion_pin,
            set_hardware,
            set_output,
            reset,
        ),
    }
}

fn cmd_run(config: &Config, simulate: bool) -> Result<()> {
    let ctx = AppContext::from_config(config, simulate)?;
    let mut controller = GateController::new(ctx);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let shutdown_token = CancellationToken::new();

    // Signal listener runs on its own thread; the controller keeps the main one
    let signal_token = shutdown_token.clone();
    let listener = std::thread::spawn(move || {
        runtime.block_on(async {
            tokio::select! {
                _ = shutdown_signal(signal_token.clone()) => {}
                _ = signal_token.cancelled() => {}
            }
        });
    });

    let result = controller.run(&shutdown_token);
    shutdown_token.cancel();
    if listener.join().is_err() {
        tracing::warn!("Signal listener thread panicked");
    }

    match &result {
        Ok(()) => tracing::info!("Gate controller shut down gracefully"),
        Err(e) => tracing::error!(error = %e, "Gate controller exiting with error"),
    }
    result.map_err(Error::from)
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }

    token.cancel();
}

fn cmd_recognize(config: &Config, image: PathBuf, output_format: OutputFormat) -> Result<()> {
    if !image.exists() {
        return Err(Error::FileNotFound(image.display().to_string()));
    }

    let frame = StillImageCamera::new(&image).capture()?;
    let pipeline = build_pipeline(config);
    let result = pipeline.recognize(&frame);

    let registry = load_registry(config);
    let decision = decide(&result, &registry);

    output::output_recognition(output_format, &image, &result, &decision)
}

fn cmd_check(config: &Config, raw: &str, output_format: OutputFormat) -> Result<()> {
    let registry = load_registry(config);
    let normalized = normalize_plate(raw);
    let record = normalized.as_deref().and_then(|plate| registry.lookup(plate));
    output::output_check(output_format, raw, normalized.as_deref(), record)
}

fn cmd_plates(config: &Config, output_format: OutputFormat) -> Result<()> {
    let registry = load_allow_list(&config.allow_list_path)?;
    output::output_plates(output_format, &registry.all_records())
}

fn cmd_sweep(config: &Config, output_format: OutputFormat) -> Result<()> {
    let retention = config.retention();
    let report = retention.sweep(Local::now().date_naive())?;
    output::output_sweep(output_format, &retention.photos_dir, &report)
}

fn cmd_audit(config: &Config, date: Option<NaiveDate>, output_format: OutputFormat) -> Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let audit = FileAuditLog::open(&config.logs_dir)?;
    let events = audit.read_all_for_day(date)?;
    output::output_audit(output_format, date, &events)
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    path: Option<&Path>,
    mut config: Config,
    show: bool,
    set_allow_list: Option<PathBuf>,
    set_relay_pin: Option<u32>,
    set_motion_pin: Option<u32>,
    set_hardware: Option<String>,
    set_output: Option<OutputFormat>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save(path)?;
        println!("Configuration reset to defaults");
        print_config(path, &config)?;
        return Ok(());
    }

    let mut modified = false;

    if let Some(allow_list) = set_allow_list {
        config.allow_list_path = allow_list;
        modified = true;
    }

    if let Some(pin) = set_relay_pin {
        config.relay_pin = pin;
        modified = true;
    }

    if let Some(pin) = set_motion_pin {
        config.motion_pin = pin;
        modified = true;
    }

    if let Some(hardware) = set_hardware {
        config.hardware = hardware.parse::<HardwareBackend>()?;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save(path)?;
        println!("Configuration updated");
    }

    if show || !modified {
        print_config(path, &config)?;
    }

    Ok(())
}

fn print_config(path: Option<&Path>, config: &Config) -> Result<()> {
    println!("\n{}", config);
    println!("Config file:      {}", Config::resolve_path(path)?.display());
    Ok(())
}
