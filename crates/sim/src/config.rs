//! Simulation configuration: environment first, command-line flags on top.
use std::env;
use std::path::PathBuf;

use clap::Parser;

/// How the final report is printed.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputFormat {
    /// Human-readable timeline and final state
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

/// Command-line overrides. Unset flags keep the environment's value.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "ability-sim")]
#[command(about = "Runs a scripted two-combatant ability encounter", long_about = None)]
#[command(version)]
pub struct SimArgs {
    /// Directory holding the RON content files
    #[arg(short, long, value_name = "DIR")]
    pub content_dir: Option<PathBuf>,

    /// Simulation ticks per second
    #[arg(short, long, value_name = "HZ")]
    pub tick_rate: Option<u32>,

    /// Simulated seconds to run
    #[arg(short, long, value_name = "SECONDS")]
    pub seconds: Option<f32>,

    /// Also write logs to `sim.log` in this directory
    #[arg(short, long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub content_dir: PathBuf,
    pub tick_rate: u32,
    pub seconds: f32,
    pub log_dir: Option<PathBuf>,
    pub output: OutputFormat,
}

impl SimConfig {
    pub const DEFAULT_TICK_RATE: u32 = 20;
    pub const DEFAULT_SECONDS: f32 = 8.0;

    /// Content shipped with this crate.
    pub fn default_content_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("content")
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIM_CONTENT_DIR` - RON content directory (default: the crate's `content/`)
    /// - `SIM_TICK_RATE` - Ticks per second (default: 20)
    /// - `SIM_SECONDS` - Simulated seconds (default: 8)
    /// - `SIM_LOG_DIR` - Directory for `sim.log` (default: none)
    /// - `SIM_OUTPUT` - `text` or `json` (default: text)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env::var_os("SIM_CONTENT_DIR") {
            config.content_dir = PathBuf::from(dir);
        }
        if let Some(rate) = read_env::<u32>("SIM_TICK_RATE") {
            config.tick_rate = rate.max(1);
        }
        if let Some(seconds) = read_env::<f32>("SIM_SECONDS") {
            config.seconds = seconds.max(0.0);
        }
        config.log_dir = env::var_os("SIM_LOG_DIR").map(PathBuf::from);
        if let Some(output) = read_env::<OutputFormat>("SIM_OUTPUT") {
            config.output = output;
        }

        config
    }

    /// Applies command-line overrides.
    pub fn with_args(mut self, args: SimArgs) -> Self {
        if let Some(dir) = args.content_dir {
            self.content_dir = dir;
        }
        if let Some(rate) = args.tick_rate {
            self.tick_rate = rate.max(1);
        }
        if let Some(seconds) = args.seconds {
            self.seconds = seconds.max(0.0);
        }
        if args.log_dir.is_some() {
            self.log_dir = args.log_dir;
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        self
    }

    pub fn with_seconds(mut self, seconds: f32) -> Self {
        self.seconds = seconds.max(0.0);
        self
    }

    pub fn with_tick_rate(mut self, rate: u32) -> Self {
        self.tick_rate = rate.max(1);
        self
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    pub fn total_ticks(&self) -> u32 {
        (self.seconds * self.tick_rate as f32).round() as u32
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            content_dir: Self::default_content_dir(),
            tick_rate: Self::DEFAULT_TICK_RATE,
            seconds: Self::DEFAULT_SECONDS,
            log_dir: None,
            output: OutputFormat::default(),
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = SimArgs::parse_from([
            "ability-sim",
            "--tick-rate",
            "0",
            "--seconds",
            "2.5",
            "-o",
            "json",
        ]);
        let config = SimConfig::default().with_args(args);

        assert_eq!(config.tick_rate, 1);
        assert_eq!(config.seconds, 2.5);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.content_dir, SimConfig::default_content_dir());
    }

    #[test]
    fn tick_math() {
        let config = SimConfig::default().with_tick_rate(20).with_seconds(3.0);
        assert_eq!(config.total_ticks(), 60);
        assert!((config.dt() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>().ok(), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }
}
