//! Headless run of the performance manager against a synthetic renderer.
//!
//! Configuration is loaded from `vantage.ron` in the config directory and can
//! be overridden via CLI flags. Run with
//! `cargo run -p vantage-app --bin vantage-sim -- --scene-cost-ms 30 --overlay`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use vantage_app::sim::{self, SimRenderer};
use vantage_config::{CliArgs, Config};
use vantage_quality::DeviceProfile;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vantage")
    });

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    vantage_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let profile = DeviceProfile::preset(&config.sim.device).unwrap_or_else(|| {
        warn!(device = %config.sim.device, "unknown device preset, using desktop");
        DeviceProfile::desktop()
    });
    info!(
        frames = config.sim.frames,
        scene_cost_ms = config.sim.scene_cost_ms,
        device = %config.sim.device,
        "starting simulation"
    );

    let renderer = SimRenderer::new(config.sim.scene_cost_ms);
    let report = match sim::run(&config, renderer, &profile, args.level.as_deref()) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Simulation failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.debug.show_overlay {
        for snapshot in &report.snapshots {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(%e, "failed to encode snapshot"),
            }
        }
    }
    match serde_json::to_string_pretty(&report.transitions) {
        Ok(transitions) => println!("{transitions}"),
        Err(e) => warn!(%e, "failed to encode transitions"),
    }
    info!(
        final_level = %report.final_level,
        transitions = report.transitions.len(),
        "simulation finished"
    );
    ExitCode::SUCCESS
}
