//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "field-timer")]
#[command(about = "A control panel server for competition countdown timers and a serial enable switch")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Serial device driving the enable/mode pins (configure 9600 baud with stty)
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    pub serial: PathBuf,

    /// Match period in seconds
    #[arg(long, default_value = "105")]
    pub match_secs: u64,

    /// Skills period in seconds
    #[arg(long, default_value = "60")]
    pub skills_secs: u64,

    /// Cue played 15 seconds before the end
    #[arg(long, default_value = "audio/warning.wav")]
    pub warning_sound: PathBuf,

    /// Cue played when a timer completes
    #[arg(long, default_value = "audio/complete.wav")]
    pub complete_sound: PathBuf,

    /// Cue volume, 0-100
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: u8,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Periods handed to newly created timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub match_ms: u64,
    pub skills_ms: u64,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            match_ms: self.match_secs.max(1) * 1000,
            skills_ms: self.skills_secs.max(1) * 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_competition_periods() {
        let config = Config::try_parse_from(["field-timer"]).unwrap();
        assert_eq!(
            config.timer_settings(),
            TimerSettings {
                match_ms: 105_000,
                skills_ms: 60_000
            }
        );
        assert_eq!(config.address(), "0.0.0.0:20554");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.warning_sound, PathBuf::from("audio/warning.wav"));
        assert_eq!(config.volume, 100);
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::try_parse_from([
            "field-timer",
            "--skills-secs",
            "90",
            "--serial",
            "/dev/ttyACM0",
            "--volume",
            "40",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.timer_settings().skills_ms, 90_000);
        assert_eq!(config.serial, PathBuf::from("/dev/ttyACM0"));
        assert_eq!(config.volume, 40);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn volume_above_full_scale_is_rejected() {
        assert!(Config::try_parse_from(["field-timer", "--volume", "150"]).is_err());
    }
}
