//! UCI wire format: commands sent to the engine and lines read back.

use std::fmt;

use crate::position::PositionDescriptor;
use crate::score::Score;

/// A command sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci` -- start the handshake.
    Uci,
    /// `setoption name <name> value <value>`
    SetOption { name: String, value: String },
    /// `isready` -- synchronization ping.
    IsReady,
    /// `position <descriptor>`
    Position(PositionDescriptor),
    /// `go depth <n>`
    GoDepth(u32),
    /// `stop` -- advisory cancellation of the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
}

impl Command {
    pub fn set_option(name: impl Into<String>, value: impl ToString) -> Self {
        Command::SetOption {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Uci => f.write_str("uci"),
            Command::SetOption { name, value } => write!(f, "setoption name {name} value {value}"),
            Command::IsReady => f.write_str("isready"),
            Command::Position(pos) => write!(f, "position {pos}"),
            Command::GoDepth(depth) => write!(f, "go depth {depth}"),
            Command::Stop => f.write_str("stop"),
            Command::Quit => f.write_str("quit"),
        }
    }
}

/// The fields of an `info` line the session cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: u32,
    /// Score from the point of view of the side to move.
    pub score: Score,
}

/// A parsed line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    /// `uciok` -- handshake acknowledged.
    UciOk,
    /// `readyok` -- ready check acknowledged.
    ReadyOk,
    /// `info ... depth <d> ... score (cp <c> | mate <m>) ...`
    Info(InfoLine),
    /// `bestmove <move> [ponder <move>]`
    BestMove { mv: String, ponder: Option<String> },
    /// Anything else, including `info` lines without a depth and score.
    Unknown(String),
}

/// Parse a single line of engine output into an [`EngineMessage`].
///
/// Never fails: unrecognized lines come back as [`EngineMessage::Unknown`].
pub fn parse_message(line: &str) -> EngineMessage {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let unknown = || EngineMessage::Unknown(line.trim().to_string());

    match tokens.first() {
        Some(&"uciok") => EngineMessage::UciOk,
        Some(&"readyok") => EngineMessage::ReadyOk,
        Some(&"info") => parse_info(&tokens[1..]).map_or_else(unknown, EngineMessage::Info),
        Some(&"bestmove") => parse_bestmove(&tokens[1..]).unwrap_or_else(unknown),
        _ => unknown(),
    }
}

/// Extract depth and score from `info` arguments. Tokens the session does
/// not use are skipped; a `string` token ends the line.
fn parse_info(tokens: &[&str]) -> Option<InfoLine> {
    let mut depth: Option<u32> = None;
    let mut score = None;

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                depth = Some(tokens.get(i + 1)?.parse().ok()?);
                i += 2;
            }
            "score" => {
                let value: i32 = tokens.get(i + 2)?.parse().ok()?;
                score = match *tokens.get(i + 1)? {
                    "cp" => Some(Score::Centipawns(value)),
                    "mate" => Some(Score::Mate(value)),
                    _ => return None,
                };
                i += 3;
            }
            "string" => break,
            _ => {
                i += 1;
            }
        }
    }

    Some(InfoLine {
        depth: depth?,
        score: score?,
    })
}

fn parse_bestmove(tokens: &[&str]) -> Option<EngineMessage> {
    let mv = tokens.first()?.to_string();
    let ponder = match tokens.get(1..3) {
        Some(["ponder", m]) => Some(m.to_string()),
        _ => None,
    };
    Some(EngineMessage::BestMove { mv, ponder })
}
