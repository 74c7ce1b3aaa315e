//! Command line and engine configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use sparring_explorer::DEFAULT_BASE_URL;
use sparring_ledger::Color;
use sparring_uci::SessionConfig;

/// Side the user plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Color {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Where the opponent's replies come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OpponentKind {
    /// Moves sampled from real games in the opening explorer.
    Explorer,
    /// Moves chosen by the UCI engine.
    Engine,
}

#[derive(Parser, Debug)]
#[command(
    name = "sparring",
    version,
    about = "Practice openings against replies drawn from real games"
)]
pub struct Args {
    /// UCI engine binary used for evaluation and as the engine opponent
    #[arg(long, value_name = "PATH")]
    pub engine: Option<PathBuf>,

    /// Side you play
    #[arg(long, value_enum, default_value_t = Side::White)]
    pub color: Side,

    /// Source of the opponent's moves
    #[arg(long, value_enum, default_value_t = OpponentKind::Explorer)]
    pub opponent: OpponentKind,

    /// Search depth of the engine opponent
    #[arg(long, default_value_t = 3)]
    pub opponent_depth: u32,

    /// Skill level of the engine opponent (0-20)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=20))]
    pub opponent_skill: u8,

    /// Engine hash table size in MB
    #[arg(long, default_value_t = 16)]
    pub hash: u32,

    /// Engine search threads
    #[arg(long, default_value_t = 1)]
    pub threads: u32,

    /// Opening explorer endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub explorer_url: String,

    /// Attempts per explorer request before giving up
    #[arg(long, default_value_t = 5)]
    pub max_attempts: u32,

    /// Preferences file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    pub preferences: Option<PathBuf>,

    /// Override the stored evaluation depth (0 disables evaluation)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=30))]
    pub eval_depth: Option<u8>,

    /// Starting position
    #[arg(long)]
    pub fen: Option<String>,

    /// Moves to replay before starting
    #[arg(long)]
    pub pgn: Option<String>,
}

impl Args {
    /// Preferences path from the command line or the platform config dir.
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences.clone().or_else(|| {
            ProjectDirs::from("org", "sparring", "sparring")
                .map(|dirs| dirs.config_dir().join("preferences.json"))
        })
    }

    /// Configuration for an engine session named `name`.
    pub fn session_config(&self, name: &str, reference: Color) -> SessionConfig {
        SessionConfig {
            reference,
            ..SessionConfig::new(name)
        }
        .with_option("Hash", self.hash)
        .with_option("Threads", self.threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["sparring"]);
        assert_eq!(args.color, Side::White);
        assert_eq!(args.opponent, OpponentKind::Explorer);
        assert_eq!(args.opponent_depth, 3);
        assert_eq!(args.max_attempts, 5);
        assert_eq!(args.explorer_url, DEFAULT_BASE_URL);
        assert!(args.engine.is_none());
    }

    #[test]
    fn engine_options_reach_session_config() {
        let args = Args::parse_from(["sparring", "--hash", "128", "--threads", "4"]);
        let config = args.session_config("eval", Color::White);
        assert_eq!(config.name, "eval");
        assert_eq!(
            config.options,
            [
                ("Hash".to_string(), "128".to_string()),
                ("Threads".to_string(), "4".to_string())
            ]
        );
    }

    #[test]
    fn explicit_preferences_path_wins() {
        let args = Args::parse_from(["sparring", "--preferences", "/tmp/prefs.json"]);
        assert_eq!(args.preferences_path(), Some(PathBuf::from("/tmp/prefs.json")));
    }

    #[test]
    fn skill_is_range_checked() {
        assert!(Args::try_parse_from(["sparring", "--opponent-skill", "21"]).is_err());
        assert!(Args::try_parse_from(["sparring", "--color", "black", "--opponent", "engine"]).is_ok());
    }
}
