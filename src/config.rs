use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::catalog::Catalog;
use crate::constants::*;
use crate::error::{PovError, Result};

#[derive(Parser, Debug, Clone)]
#[command(name = "morning-pov", version, about = WINDOW_DESCRIPTION)]
pub struct Config {
    /// Time each scene stays on screen, in milliseconds
    #[arg(long, env = "POV_DWELL_MS", default_value_t = DEFAULT_DWELL_MS)]
    pub dwell_ms: u64,

    /// TOML scene catalog to play instead of the built-in morning sequence
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Scene to start on
    #[arg(long, default_value_t = 0)]
    pub start: usize,

    /// Render at a fixed frame rate and encode to this video file with ffmpeg
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Number of full passes through the catalog to record
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub cycles: u32,

    /// TTF/OTF used for headlines
    #[arg(long)]
    pub font_display: Option<PathBuf>,

    /// TTF/OTF used for everything else
    #[arg(long)]
    pub font_sans: Option<PathBuf>,

    /// Initial window width
    #[arg(long, default_value_t = RENDER_WIDTH / 2)]
    pub width: i32,

    /// Initial window height
    #[arg(long, default_value_t = RENDER_HEIGHT / 2)]
    pub height: i32,

    /// Tracing filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,
}

impl Config {
    pub fn dwell(&self) -> Result<Duration> {
        if self.dwell_ms == 0 {
            return Err(PovError::ZeroDwell);
        }
        Ok(Duration::from_millis(self.dwell_ms))
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(path),
            None => Catalog::builtin(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.record.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_play_the_builtin_sequence() {
        let config = Config::try_parse_from(["morning-pov"]).unwrap();
        assert_eq!(config.dwell().unwrap(), Duration::from_millis(7_500));
        assert_eq!(config.start, 0);
        assert_eq!(config.cycles, 1);
        assert!(!config.is_recording());
        assert_eq!(config.load_catalog().unwrap().len(), 5);
    }

    #[test]
    fn zero_dwell_is_rejected() {
        let config = Config::try_parse_from(["morning-pov", "--dwell-ms", "0"]).unwrap();
        assert!(matches!(config.dwell(), Err(PovError::ZeroDwell)));
    }

    #[test]
    fn zero_cycles_is_rejected_by_the_parser() {
        assert!(Config::try_parse_from(["morning-pov", "--cycles", "0"]).is_err());
    }

    #[test]
    fn record_flags() {
        let config = Config::try_parse_from(["morning-pov", "--record", "out.mp4", "--cycles", "2", "--start", "3"]).unwrap();
        assert!(config.is_recording());
        assert_eq!(config.record, Some(PathBuf::from("out.mp4")));
        assert_eq!(config.cycles, 2);
        assert_eq!(config.start, 3);
    }
}
