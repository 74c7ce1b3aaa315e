//! Sans-IO engine session.
//!
//! [`EngineSession`] owns one engine channel and drives the UCI handshake,
//! the ready check that gates every new search, and the delivery of
//! evaluations and best moves to observers. It never blocks and never reads
//! from the engine itself: the caller feeds every line the engine prints to
//! [`EngineSession::handle_line`].
//!
//! Requests are coalesced. The most recent request wins, and it is only sent
//! once the engine acknowledges `isready`:
//!
//! ```text
//! Initializing --uciok--> AwaitingReady --readyok--> Running
//!                              ^                        |
//!                              +--request_evaluation----+
//! ```
//!
//! `stop` is advisory, so output of a superseded search can arrive after a
//! new one has been accepted. Each `go` opens a numbered search and each
//! `bestmove` retires the oldest one still open; lines are attributed to
//! the oldest open search and only reach observers when that search is the
//! one started for the accepted request.

use shakmaty::Color;
use tracing::{debug, info, warn};

use crate::command::{Command, EngineMessage, InfoLine, parse_message};
use crate::error::UciError;
use crate::observer::{Observers, SubscriptionId};
use crate::position::PositionDescriptor;
use crate::score::Evaluation;

/// Highest `Skill Level` the engine accepts.
pub const MAX_SKILL: u8 = 20;

/// Where the session is in the UCI protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    /// `uci` sent, waiting for `uciok`.
    Initializing,
    /// `isready` sent, waiting for `readyok`.
    AwaitingReady,
    /// The accepted request has been sent (or needs nothing sent).
    Running,
}

/// What the session should be computing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub position: PositionDescriptor,
    /// Search depth. Zero disables searching.
    pub depth: u32,
    /// `Skill Level` option, 0..=20.
    pub skill: u8,
}

impl EvalRequest {
    pub fn new(position: PositionDescriptor, depth: u32, skill: u8) -> Self {
        Self {
            position,
            depth,
            skill,
        }
    }

    /// The request every session starts with: the start position, no search.
    pub fn idle() -> Self {
        Self::new(PositionDescriptor::startpos(), 0, MAX_SKILL)
    }
}

impl Default for EvalRequest {
    fn default() -> Self {
        Self::idle()
    }
}

/// Outbound half of an engine connection.
///
/// Sends are fire-and-forget and must reach the engine in call order.
pub trait EngineChannel {
    fn send(&mut self, command: Command) -> Result<(), UciError>;
}

/// Static configuration of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Used in log output to tell sessions apart.
    pub name: String,
    /// Scores are reported from this side's point of view.
    pub reference: Color,
    /// `setoption` pairs sent after the handshake.
    pub options: Vec<(String, String)>,
}

impl SessionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set an option, replacing an earlier value for the same name.
    pub fn with_option(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.options.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.options.push((name, value)),
        }
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "engine".to_string(),
            reference: Color::White,
            options: vec![
                ("Hash".to_string(), "16".to_string()),
                ("Threads".to_string(), "1".to_string()),
            ],
        }
    }
}

/// One engine conversation. See the [module docs](self).
pub struct EngineSession<C: EngineChannel> {
    config: SessionConfig,
    channel: Option<C>,
    state: ProtocolState,
    pending: EvalRequest,
    side_factor: i32,
    /// `go` commands sent so far.
    searches_started: u64,
    /// `bestmove` lines received so far.
    searches_finished: u64,
    /// Number of the search started for the accepted request.
    accepted_search: Option<u64>,
    evaluation: Option<Evaluation>,
    best_move: Option<String>,
    evaluation_observers: Observers<Evaluation>,
    best_move_observers: Observers<String>,
}

impl<C: EngineChannel> EngineSession<C> {
    /// Open a session over `channel` and start the handshake.
    pub fn create(channel: C, config: SessionConfig) -> Result<Self, UciError> {
        let mut session = Self {
            config,
            channel: Some(channel),
            state: ProtocolState::Initializing,
            pending: EvalRequest::idle(),
            side_factor: 1,
            searches_started: 0,
            searches_finished: 0,
            accepted_search: None,
            evaluation: None,
            best_move: None,
            evaluation_observers: Observers::new(),
            best_move_observers: Observers::new(),
        };
        info!(session = %session.config.name, "opening engine session");
        session.send(Command::Uci)?;
        Ok(session)
    }

    /// Ask for `request` to be computed.
    ///
    /// Returns `Ok(false)` when the request equals the one already pending,
    /// in which case nothing is sent. A searching request whose position
    /// cannot be replayed is rejected before anything changes.
    pub fn request_evaluation(&mut self, request: EvalRequest) -> Result<bool, UciError> {
        self.ensure_open()?;
        if request == self.pending {
            return Ok(false);
        }
        if request.depth > 0 {
            request.position.side_to_move()?;
        }

        debug!(
            session = %self.config.name,
            state = ?self.state,
            position = %request.position,
            depth = request.depth,
            skill = request.skill,
            "new evaluation request"
        );
        self.pending = request;

        if self.state == ProtocolState::Running {
            self.send(Command::Stop)?;
            self.send(Command::IsReady)?;
            self.state = ProtocolState::AwaitingReady;
        }
        Ok(true)
    }

    /// Process one line of engine output. Unrecognized lines are ignored.
    pub fn handle_line(&mut self, line: &str) -> Result<(), UciError> {
        self.ensure_open()?;
        debug!(session = %self.config.name, state = ?self.state, line = %line.trim_end(), "engine >");

        match (self.state, parse_message(line)) {
            (ProtocolState::Initializing, EngineMessage::UciOk) => self.on_handshake(),
            (ProtocolState::AwaitingReady, EngineMessage::ReadyOk) => self.on_ready(),
            (_, EngineMessage::Info(info)) => {
                self.on_info(info);
                Ok(())
            }
            (_, EngineMessage::BestMove { mv, .. }) => {
                self.on_best_move(mv);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn on_handshake(&mut self) -> Result<(), UciError> {
        let options = self.config.options.clone();
        for (name, value) in options {
            self.send(Command::SetOption { name, value })?;
        }
        self.send(Command::IsReady)?;
        self.state = ProtocolState::AwaitingReady;
        Ok(())
    }

    fn on_ready(&mut self) -> Result<(), UciError> {
        let request = self.pending.clone();
        self.accepted_search = None;
        self.best_move = None;

        if request.depth > 0 {
            match request.position.side_to_move() {
                Ok(side) => {
                    self.send(Command::set_option("Skill Level", request.skill))?;
                    self.send(Command::Position(request.position))?;
                    self.send(Command::GoDepth(request.depth))?;
                    self.searches_started += 1;
                    self.accepted_search = Some(self.searches_started);
                    self.side_factor = if side == self.config.reference { 1 } else { -1 };
                }
                Err(e) => {
                    warn!(session = %self.config.name, error = %e, "cannot search pending position");
                }
            }
        }

        self.state = ProtocolState::Running;
        Ok(())
    }

    fn on_info(&mut self, info: InfoLine) {
        let search = self.searches_finished + 1;
        if search > self.searches_started || !self.delivers(search) {
            debug!(session = %self.config.name, search, "dropping stale info");
            return;
        }
        let evaluation = Evaluation {
            depth: info.depth,
            score: info.score.absolute(self.side_factor),
        };
        self.evaluation = Some(evaluation);
        self.evaluation_observers.notify(&evaluation);
    }

    fn on_best_move(&mut self, mv: String) {
        if self.searches_finished >= self.searches_started {
            debug!(session = %self.config.name, %mv, "bestmove without an open search");
            return;
        }
        self.searches_finished += 1;
        let search = self.searches_finished;
        if !self.delivers(search) {
            debug!(session = %self.config.name, search, %mv, "dropping stale bestmove");
            return;
        }
        self.best_move = Some(mv.clone());
        self.best_move_observers.notify(&mv);
    }

    fn delivers(&self, search: u64) -> bool {
        self.state == ProtocolState::Running && self.accepted_search == Some(search)
    }

    pub fn subscribe_evaluation(
        &mut self,
        callback: impl FnMut(&Evaluation) + Send + 'static,
    ) -> SubscriptionId {
        self.evaluation_observers.subscribe(callback)
    }

    pub fn unsubscribe_evaluation(&mut self, id: SubscriptionId) -> bool {
        self.evaluation_observers.unsubscribe(id)
    }

    pub fn subscribe_best_move(
        &mut self,
        callback: impl FnMut(&String) + Send + 'static,
    ) -> SubscriptionId {
        self.best_move_observers.subscribe(callback)
    }

    pub fn unsubscribe_best_move(&mut self, id: SubscriptionId) -> bool {
        self.best_move_observers.unsubscribe(id)
    }

    /// Latest evaluation, relative to the reference side.
    pub fn current_evaluation(&self) -> Option<Evaluation> {
        self.evaluation
    }

    /// Best move found for the accepted request, if its search finished.
    pub fn current_best_move(&self) -> Option<&str> {
        self.best_move.as_deref()
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    pub fn pending_request(&self) -> &EvalRequest {
        &self.pending
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_none()
    }

    /// Send `quit` and release the channel. Every later call fails with
    /// [`UciError::SessionClosed`].
    pub fn close(&mut self) -> Result<(), UciError> {
        self.ensure_open()?;
        let result = self.send(Command::Quit);
        self.channel = None;
        self.evaluation_observers = Observers::new();
        self.best_move_observers = Observers::new();
        info!(session = %self.config.name, "engine session closed");
        result
    }

    fn ensure_open(&self) -> Result<(), UciError> {
        if self.channel.is_none() {
            return Err(UciError::SessionClosed);
        }
        Ok(())
    }

    fn send(&mut self, command: Command) -> Result<(), UciError> {
        let channel = self.channel.as_mut().ok_or(UciError::SessionClosed)?;
        debug!(session = %self.config.name, state = ?self.state, %command, "engine <");
        channel.send(command)
    }
}

impl<C: EngineChannel> std::fmt::Debug for EngineSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("pending", &self.pending)
            .field("closed", &self.channel.is_none())
            .finish()
    }
}
