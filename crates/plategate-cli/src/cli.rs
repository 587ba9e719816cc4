//! CLI definition using clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use plategate_types::OutputFormat;

#[derive(Parser)]
#[command(name = "plategate")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "License-plate gate controller: motion, capture, OCR, allow-list, relay")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/plategate/config.json)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gate controller until interrupted
    Run {
        /// Simulated relay and sensor (press Enter to trigger)
        #[arg(long)]
        simulate: bool,
    },

    /// Recognize the plate in a still image and show the access decision
    Recognize {
        /// Path to image file
        image: PathBuf,
    },

    /// Normalize a plate string and look it up in the allow-list
    Check {
        /// Plate text, e.g. "A123BC77" or "a 12O bc 77"
        plate: String,
    },

    /// List the allow-list
    Plates,

    /// Delete expired photo directories now
    Sweep,

    /// Show audit events for a day
    Audit {
        /// Day to show (YYYY-MM-DD), default today
        #[arg(long, short = 'd')]
        date: Option<NaiveDate>,
    },

    /// Show or modify configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set allow-list CSV path
        #[arg(long)]
        set_allow_list: Option<PathBuf>,

        /// Set relay output pin
        #[arg(long)]
        set_relay_pin: Option<u32>,

        /// Set motion sensor input pin
        #[arg(long)]
        set_motion_pin: Option<u32>,

        /// Set hardware backend (sysfs, simulated)
        #[arg(long)]
        set_hardware: Option<String>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["plategate", "check", "A123BC77", "-f", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Check { ref plate } if plate == "A123BC77"));
    }

    #[test]
    fn test_parse_audit_date() {
        let cli = Cli::try_parse_from(["plategate", "audit", "--date", "2026-10-16"]).unwrap();
        match cli.command {
            Commands::Audit { date } => assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 16)),
            _ => panic!("expected audit"),
        }
    }

    #[test]
    fn test_parse_run_simulate() {
        let cli = Cli::try_parse_from(["plategate", "--config", "/etc/plategate.json", "run", "--simulate"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/plategate.json")));
        assert!(matches!(cli.command, Commands::Run { simulate: true }));
    }
}
