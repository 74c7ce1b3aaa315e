//! Terminal trainer: keeps the engine sessions and the explorer in step
//! with the move ledger.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sparring_explorer::{
    ExplorerClient, ExplorerError, ExplorerQuery, ExplorerResult, Preferences,
    preferences::MAX_EVAL_DEPTH, select_weighted_move,
};
use sparring_ledger::{Color, MoveLedger};
use sparring_uci::{
    EngineHandle, EvalRequest, Evaluation, MAX_SKILL, PositionDescriptor, UciError, spawn_engine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Args, OpponentKind};

/// Descriptor of the ledger's current position for the engine.
pub fn position_descriptor(ledger: &MoveLedger) -> PositionDescriptor {
    let moves = ledger.lan_history();
    if ledger.starts_from_standard() {
        PositionDescriptor::StartPos { moves }
    } else {
        PositionDescriptor::Fen {
            fen: ledger.start_fen(),
            moves,
        }
    }
}

/// Statistics query for the line played so far.
pub fn explorer_query(ledger: &MoveLedger, prefs: &Preferences) -> ExplorerQuery {
    ExplorerQuery::from_preferences(ledger.start_fen(), ledger.lan_history(), prefs)
}

pub fn opponent_to_move(ledger: &MoveLedger, player: Color) -> bool {
    ledger.turn() != player
}

/// Depth for the engine opponent: searching only on its own turn in a live game.
pub fn opponent_depth(ledger: &MoveLedger, player: Color, depth: u32) -> u32 {
    if opponent_to_move(ledger, player) && !ledger.status().is_over() {
        depth
    } else {
        0
    }
}

/// Line shown above the position: the moves so far, or the start position.
pub fn moves_line(ledger: &MoveLedger) -> String {
    if ledger.is_empty() {
        "Starting Position".to_string()
    } else {
        ledger.san_history().join(" ")
    }
}

/// Opening name and game count reported by the explorer.
pub fn explorer_heading(result: &ExplorerResult) -> Vec<String> {
    result
        .opening_label()
        .into_iter()
        .chain(result.games_summary())
        .collect()
}

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainerCommand {
    Move(String),
    Undo,
    Reset,
    Flip,
    Fen,
    Pgn,
    Depth(u8),
    Help,
    Quit,
}

impl FromStr for TrainerCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Err("empty command".to_string());
        };
        let command = match first {
            "undo" => TrainerCommand::Undo,
            "reset" => TrainerCommand::Reset,
            "flip" => TrainerCommand::Flip,
            "fen" => TrainerCommand::Fen,
            "pgn" => TrainerCommand::Pgn,
            "help" | "?" => TrainerCommand::Help,
            "quit" | "exit" => TrainerCommand::Quit,
            "depth" => {
                let value = words.next().ok_or("usage: depth <0-30>")?;
                let depth: u8 = value
                    .parse()
                    .map_err(|_| format!("invalid depth: {value}"))?;
                if depth > MAX_EVAL_DEPTH {
                    return Err(format!("depth must be at most {MAX_EVAL_DEPTH}"));
                }
                TrainerCommand::Depth(depth)
            }
            mv => TrainerCommand::Move(mv.to_string()),
        };
        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument: {extra}"));
        }
        Ok(command)
    }
}

const HELP: &str = "\
commands:
  <move>     play a move (e4, Nf3, e2e4, O-O)
  undo       take back to your last move
  reset      start over
  flip       switch sides
  fen        print the position
  pgn        print the moves
  depth <n>  evaluation depth (0 disables)
  quit       leave";

type FetchOutcome = (String, Result<ExplorerResult, ExplorerError>);

struct PendingFetch {
    fen: String,
    task: JoinHandle<()>,
}

pub struct Trainer {
    ledger: MoveLedger,
    player: Color,
    opponent: OpponentKind,
    opponent_depth: u32,
    opponent_skill: u8,
    max_attempts: u32,
    prefs: Preferences,
    prefs_path: Option<PathBuf>,
    explorer: ExplorerClient,
    evaluator: Option<EngineHandle>,
    engine_opponent: Option<EngineHandle>,
    fetch: Option<PendingFetch>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    rng: StdRng,
}

impl Trainer {
    /// Build the trainer from the command line, starting engine processes.
    pub fn start(args: Args) -> Result<Self> {
        let ledger = MoveLedger::load(args.fen.as_deref(), args.pgn.as_deref())
            .context("cannot load the starting position")?;

        let prefs_path = args.preferences_path();
        let mut prefs = match &prefs_path {
            Some(path) => Preferences::load(path)
                .with_context(|| format!("cannot read preferences from {}", path.display()))?,
            None => Preferences::default(),
        };
        if let Some(depth) = args.eval_depth {
            prefs.eval_depth = depth;
        }

        let explorer = ExplorerClient::new(&args.explorer_url)
            .with_context(|| format!("cannot use explorer at {}", args.explorer_url))?;

        let player = Color::from(args.color);
        let (evaluator, engine_opponent) = match &args.engine {
            Some(path) => {
                let program = path.to_string_lossy();
                let evaluator = spawn_engine(&program, args.session_config("eval", Color::White))
                    .context("cannot start the evaluation engine")?;
                let opponent = match args.opponent {
                    OpponentKind::Engine => Some(
                        spawn_engine(&program, args.session_config("opponent", Color::White))
                            .context("cannot start the opponent engine")?,
                    ),
                    OpponentKind::Explorer => None,
                };
                (Some(evaluator), opponent)
            }
            None if args.opponent == OpponentKind::Engine => {
                bail!("--opponent engine needs --engine <PATH>")
            }
            None => (None, None),
        };

        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        Ok(Trainer {
            ledger,
            player,
            opponent: args.opponent,
            opponent_depth: args.opponent_depth,
            opponent_skill: args.opponent_skill,
            max_attempts: args.max_attempts,
            prefs,
            prefs_path,
            explorer,
            evaluator,
            engine_opponent,
            fetch: None,
            fetch_tx,
            fetch_rx,
            rng: StdRng::from_os_rng(),
        })
    }

    pub async fn run(mut self) -> Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut evaluations = self.evaluator.as_ref().map(EngineHandle::evaluation);
        let mut best_moves = self.engine_opponent.as_ref().map(EngineHandle::best_move);

        println!("{HELP}");
        self.after_change().await?;

        loop {
            tokio::select! {
                line = input.next_line() => {
                    let Some(line) = line.context("cannot read input")? else {
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<TrainerCommand>() {
                        Ok(TrainerCommand::Quit) => break,
                        Ok(command) => self.execute(command).await?,
                        Err(e) => println!("{e}"),
                    }
                }
                Some((fen, outcome)) = self.fetch_rx.recv() => {
                    self.on_explorer_result(fen, outcome).await?;
                }
                changed = next_change(evaluations.as_mut()) => {
                    match changed {
                        Some(eval) => self.on_evaluation(eval),
                        None => {
                            warn!("evaluation engine stopped");
                            evaluations = None;
                            self.evaluator = None;
                        }
                    }
                }
                changed = next_change(best_moves.as_mut()) => {
                    match changed {
                        Some(Some(mv)) => self.on_engine_move(&mv).await?,
                        Some(None) => {}
                        None => {
                            warn!("opponent engine stopped");
                            println!("the opponent engine stopped; flip or undo to keep practising");
                            best_moves = None;
                            self.engine_opponent = None;
                        }
                    }
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn execute(&mut self, command: TrainerCommand) -> Result<()> {
        match command {
            TrainerCommand::Move(notation) => {
                if opponent_to_move(&self.ledger, self.player) && !self.ledger.status().is_over() {
                    println!("waiting for the opponent's move");
                    return Ok(());
                }
                match self.ledger.apply(&notation) {
                    Ok(record) => {
                        debug!(san = %record.san, "player move");
                        self.after_change().await?;
                    }
                    Err(e) => println!("{e}"),
                }
            }
            TrainerCommand::Undo => {
                self.ledger.undo_to_player(self.player);
                self.after_change().await?;
            }
            TrainerCommand::Reset => {
                self.ledger.reset();
                self.after_change().await?;
            }
            TrainerCommand::Flip => {
                self.player = !self.player;
                println!("you now play {}", color_name(self.player));
                self.after_change().await?;
            }
            TrainerCommand::Fen => println!("{}", self.ledger.fen()),
            TrainerCommand::Pgn => {
                let snapshot = self.ledger.serialize();
                println!("{}", snapshot.pgn);
                println!("bookmark: {}", snapshot.compact_pgn());
            }
            TrainerCommand::Depth(depth) => {
                self.prefs.eval_depth = depth;
                if let Some(path) = &self.prefs_path
                    && let Err(e) = self.prefs.save(path)
                {
                    warn!(error = %e, "cannot save preferences");
                }
                println!("evaluation depth {depth}");
                self.sync_engines().await?;
            }
            TrainerCommand::Help => println!("{HELP}"),
            TrainerCommand::Quit => {}
        }
        Ok(())
    }

    /// Push the ledger's new state to every collaborator.
    async fn after_change(&mut self) -> Result<()> {
        self.show_position();
        self.sync_engines().await?;
        self.sync_explorer();
        Ok(())
    }

    fn show_position(&self) {
        println!("{}", moves_line(&self.ledger));
        let status = self.ledger.status();
        if status.is_over() {
            println!("{status}");
        } else if opponent_to_move(&self.ledger, self.player) {
            println!("{} to move (opponent)", color_name(self.ledger.turn()));
        } else {
            println!("{} to move (you)", color_name(self.ledger.turn()));
        }
    }

    async fn sync_engines(&mut self) -> Result<()> {
        let position = position_descriptor(&self.ledger);
        let eval_request =
            EvalRequest::new(position.clone(), self.prefs.eval_depth.into(), MAX_SKILL);
        request_or_release(&mut self.evaluator, eval_request).await?;

        let depth = opponent_depth(&self.ledger, self.player, self.opponent_depth);
        let opponent_request = EvalRequest::new(position, depth, self.opponent_skill);
        request_or_release(&mut self.engine_opponent, opponent_request).await
    }

    fn sync_explorer(&mut self) {
        if let Some(pending) = self.fetch.take() {
            pending.task.abort();
        }
        if self.opponent != OpponentKind::Explorer
            || !opponent_to_move(&self.ledger, self.player)
            || self.ledger.status().is_over()
        {
            return;
        }

        let fen = self.ledger.fen();
        let query = explorer_query(&self.ledger, &self.prefs);
        let client = self.explorer.clone();
        let max_attempts = self.max_attempts;
        let tx = self.fetch_tx.clone();
        let tag = fen.clone();
        let task = tokio::spawn(async move {
            let outcome = client.fetch_with_retry(&query, max_attempts).await;
            let _ = tx.send((tag, outcome));
        });
        self.fetch = Some(PendingFetch { fen, task });
    }

    async fn on_explorer_result(
        &mut self,
        fen: String,
        outcome: Result<ExplorerResult, ExplorerError>,
    ) -> Result<()> {
        if !self.is_current_fetch(&fen) {
            debug!(%fen, "discarding explorer result for an old position");
            return Ok(());
        }
        self.fetch = None;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                println!("explorer unavailable: {e}; flip or undo to keep practising");
                return Ok(());
            }
        };
        for line in explorer_heading(&result) {
            println!("{line}");
        }
        if !result.has_moves() {
            println!("no games in the database from here; flip or undo");
            return Ok(());
        }

        let choice = match select_weighted_move(&result, &mut self.rng) {
            Ok(choice) => choice.clone(),
            Err(e) => {
                warn!(error = %e, "cannot choose an explorer move");
                return Ok(());
            }
        };
        let share = choice.total_games() as f64 * 100.0 / result.move_games() as f64;
        match self.ledger.apply(&choice.lan) {
            Ok(record) => {
                println!("opponent plays {} ({share:.0}% of games)", record.san);
                self.after_change().await?;
            }
            Err(e) => warn!(error = %e, lan = %choice.lan, "explorer move rejected"),
        }
        Ok(())
    }

    /// `true` when `fen` tags the outstanding fetch and the ledger is still there.
    fn is_current_fetch(&self, fen: &str) -> bool {
        self.ledger.fen() == fen && self.fetch.as_ref().is_some_and(|p| p.fen == fen)
    }

    async fn on_engine_move(&mut self, mv: &str) -> Result<()> {
        if !opponent_to_move(&self.ledger, self.player) || self.ledger.status().is_over() {
            debug!(mv, "ignoring engine move on the player's turn");
            return Ok(());
        }
        match self.ledger.apply(mv) {
            Ok(record) => {
                println!("opponent plays {}", record.san);
                self.after_change().await?;
            }
            Err(e) => warn!(error = %e, mv, "engine move rejected"),
        }
        Ok(())
    }

    fn on_evaluation(&self, eval: Option<Evaluation>) {
        if let Some(eval) = eval
            && eval.depth >= u32::from(self.prefs.eval_depth)
        {
            println!("eval {eval}");
        }
    }

    async fn shutdown(mut self) {
        if let Some(pending) = self.fetch.take() {
            pending.task.abort();
        }
        for handle in [self.evaluator.take(), self.engine_opponent.take()]
            .into_iter()
            .flatten()
        {
            let name = handle.name().to_string();
            if let Err(e) = handle.close().await {
                warn!(session = %name, error = %e, "engine did not close cleanly");
            }
        }
        info!("sparring stopped");
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Send `request` to the engine in `slot`, if any. An engine that has gone
/// away is released and the trainer carries on without it.
async fn request_or_release(slot: &mut Option<EngineHandle>, request: EvalRequest) -> Result<()> {
    let Some(handle) = slot.as_ref() else {
        return Ok(());
    };
    match handle.request_evaluation(request).await {
        Ok(()) => Ok(()),
        Err(UciError::ChannelClosed | UciError::SessionClosed) => {
            warn!(session = %handle.name(), "engine is gone, continuing without it");
            *slot = None;
            Ok(())
        }
        Err(e) => {
            Err(e).with_context(|| format!("{} engine rejected the position", handle.name()))
        }
    }
}

/// Wait for the next value on `rx`. `None` once the sender is gone; never
/// resolves when there is no receiver.
async fn next_change<T: Clone>(rx: Option<&mut watch::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}
