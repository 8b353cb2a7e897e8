//! Command-line argument parsing for the `vantage-sim` harness.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Simulation command-line arguments.
///
/// CLI values override settings loaded from `vantage.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "vantage-sim", about = "Headless adaptive-quality simulation")]
pub struct CliArgs {
    /// Frame rate the quality controller steers towards.
    #[arg(long)]
    pub target_fps: Option<f32>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Frame cost in milliseconds at cost multiplier 1.0.
    #[arg(long)]
    pub scene_cost_ms: Option<f64>,

    /// Device preset (desktop, hidpi, tablet, mobile).
    #[arg(long)]
    pub device: Option<String>,

    /// Pin a quality tier by name and disable adaptation.
    #[arg(long)]
    pub level: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print a quality snapshot line every `sim.report_every` frames.
    #[arg(long)]
    pub overlay: bool,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(fps) = args.target_fps {
            self.quality.target_fps = fps;
        }
        if let Some(frames) = args.frames {
            self.sim.frames = frames;
        }
        if let Some(cost) = args.scene_cost_ms {
            self.sim.scene_cost_ms = cost;
        }
        if let Some(ref device) = args.device {
            self.sim.device = device.clone();
        }
        if args.level.is_some() {
            self.quality.adaptive = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if args.overlay {
            self.debug.show_overlay = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            target_fps: Some(30.0),
            device: Some("mobile".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.quality.target_fps, 30.0);
        assert_eq!(config.sim.device, "mobile");
        // Non-overridden fields retain defaults
        assert_eq!(config.sim.frames, 600);
        assert!(config.quality.adaptive);
    }

    #[test]
    fn test_pinned_level_disables_adaptation() {
        let mut config = Config::default();
        let args = CliArgs {
            level: Some("low".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert!(!config.quality.adaptive);
    }

    #[test]
    fn test_overlay_flag_enables_overlay() {
        let args = CliArgs::parse_from(["vantage-sim", "--overlay"]);
        let mut config = Config::default();
        assert!(!config.debug.show_overlay);
        config.apply_cli_overrides(&args);
        assert!(config.debug.show_overlay);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["vantage-sim", "--frames", "120", "--level", "high"]);
        assert_eq!(args.frames, Some(120));
        assert_eq!(args.level.as_deref(), Some("high"));
    }
}
