//! Async driver running an [`EngineSession`] against a child process.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::UciError;
use crate::score::Evaluation;
use crate::session::{EngineChannel, EngineSession, EvalRequest, SessionConfig};

/// How long `close` waits for the engine to exit after `quit`.
const EXIT_TIMEOUT: Duration = Duration::from_secs(2);

/// [`EngineChannel`] handing rendered commands to a writer task.
#[derive(Debug, Clone)]
pub struct ProcessChannel {
    tx: mpsc::UnboundedSender<String>,
}

impl ProcessChannel {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl EngineChannel for ProcessChannel {
    fn send(&mut self, command: Command) -> Result<(), UciError> {
        self.tx
            .send(command.to_string())
            .map_err(|_| UciError::ChannelClosed)
    }
}

enum Op {
    Request {
        request: EvalRequest,
        reply: oneshot::Sender<Result<(), UciError>>,
    },
    Close {
        reply: oneshot::Sender<Result<(), UciError>>,
    },
}

/// Handle to an engine session running on its own task.
#[derive(Debug)]
pub struct EngineHandle {
    name: String,
    ops: mpsc::UnboundedSender<Op>,
    evaluation: watch::Receiver<Option<Evaluation>>,
    best_move: watch::Receiver<Option<String>>,
    task: JoinHandle<Result<(), UciError>>,
}

impl std::fmt::Debug for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Request { request, .. } => f.debug_tuple("Request").field(request).finish(),
            Op::Close { .. } => f.write_str("Close"),
        }
    }
}

/// Launch `program` and open a session with it.
pub fn spawn_engine(program: &str, config: SessionConfig) -> Result<EngineHandle, UciError> {
    let mut child = tokio::process::Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| UciError::Spawn {
            program: program.to_string(),
            source,
        })?;
    let stdin = child.stdin.take().ok_or(UciError::ChannelClosed)?;
    let stdout = child.stdout.take().ok_or(UciError::ChannelClosed)?;
    info!(program, session = %config.name, "engine started");

    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_commands(stdin, line_rx));

    let name = config.name.clone();
    let mut session = EngineSession::create(ProcessChannel::new(line_tx), config)?;

    let (eval_tx, evaluation) = watch::channel(None);
    let (best_tx, best_move) = watch::channel(None);
    let best_tx = Arc::new(best_tx);
    session.subscribe_evaluation(move |eval| {
        eval_tx.send_replace(Some(*eval));
    });
    let observer_tx = Arc::clone(&best_tx);
    session.subscribe_best_move(move |mv| {
        observer_tx.send_replace(Some(mv.clone()));
    });

    let (ops, ops_rx) = mpsc::unbounded_channel();
    let lines = BufReader::new(stdout).lines();
    let task = tokio::spawn(run_session(session, child, writer, lines, ops_rx, best_tx));

    Ok(EngineHandle {
        name,
        ops,
        evaluation,
        best_move,
        task,
    })
}

async fn write_commands(mut stdin: ChildStdin, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = rx.recv().await {
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        };
        if let Err(e) = written.await {
            warn!(error = %e, "failed to write to engine");
            break;
        }
    }
}

async fn run_session(
    mut session: EngineSession<ProcessChannel>,
    mut child: Child,
    writer: JoinHandle<()>,
    mut lines: tokio::io::Lines<BufReader<tokio::process::ChildStdout>>,
    mut ops: mpsc::UnboundedReceiver<Op>,
    best_tx: Arc<watch::Sender<Option<String>>>,
) -> Result<(), UciError> {
    loop {
        tokio::select! {
            op = ops.recv() => match op {
                Some(Op::Request { request, reply }) => {
                    let result = session.request_evaluation(request);
                    if let Ok(true) = result {
                        best_tx.send_replace(None);
                    }
                    let _ = reply.send(result.map(|_| ()));
                }
                Some(Op::Close { reply }) => {
                    let _ = reply.send(session.close());
                    break;
                }
                None => {
                    let _ = session.close();
                    break;
                }
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Err(e) = session.handle_line(&line) {
                        warn!(session = %session.name(), error = %e, "engine line failed");
                    }
                }
                Ok(None) => {
                    warn!(session = %session.name(), "engine closed its output");
                    break;
                }
                Err(e) => {
                    warn!(session = %session.name(), error = %e, "failed to read from engine");
                    break;
                }
            },
        }
    }

    let name = session.name().to_string();
    drop(session);
    let _ = writer.await;

    match tokio::time::timeout(EXIT_TIMEOUT, child.wait()).await {
        Ok(status) => {
            let status = status?;
            debug!(session = %name, %status, "engine exited");
        }
        Err(_) => {
            warn!(session = %name, "engine did not exit after quit, killing it");
            child.kill().await?;
        }
    }
    Ok(())
}

impl EngineHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the engine to compute `request`; see
    /// [`EngineSession::request_evaluation`].
    pub async fn request_evaluation(&self, request: EvalRequest) -> Result<(), UciError> {
        let (reply, rx) = oneshot::channel();
        self.ops
            .send(Op::Request { request, reply })
            .map_err(|_| UciError::ChannelClosed)?;
        rx.await.map_err(|_| UciError::ChannelClosed)?
    }

    /// Receiver that changes whenever a new evaluation arrives.
    pub fn evaluation(&self) -> watch::Receiver<Option<Evaluation>> {
        self.evaluation.clone()
    }

    /// Receiver holding the best move for the latest request, `None` until
    /// its search finishes.
    pub fn best_move(&self) -> watch::Receiver<Option<String>> {
        self.best_move.clone()
    }

    pub fn current_evaluation(&self) -> Option<Evaluation> {
        *self.evaluation.borrow()
    }

    pub fn current_best_move(&self) -> Option<String> {
        self.best_move.borrow().clone()
    }

    /// Send `quit` and wait for the engine process to exit.
    pub async fn close(self) -> Result<(), UciError> {
        let (reply, rx) = oneshot::channel();
        let closed = if self.ops.send(Op::Close { reply }).is_ok() {
            rx.await.unwrap_or(Ok(()))
        } else {
            Ok(())
        };
        match self.task.await {
            Ok(result) => closed.and(result),
            Err(e) => {
                warn!(session = %self.name, error = %e, "engine task failed");
                Err(UciError::ChannelClosed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionDescriptor;

    #[test]
    fn process_channel_renders_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut channel = ProcessChannel::new(tx);
        channel.send(Command::IsReady).unwrap();
        channel
            .send(Command::Position(PositionDescriptor::from_moves(["d2d4"])))
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), "isready");
        assert_eq!(rx.try_recv().unwrap(), "position startpos moves d2d4");
    }

    #[test]
    fn process_channel_reports_closed_writer() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut channel = ProcessChannel::new(tx);
        assert!(matches!(
            channel.send(Command::Quit),
            Err(UciError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let err = spawn_engine("/nonexistent/sparring-engine", SessionConfig::new("t")).unwrap_err();
        assert!(matches!(err, UciError::Spawn { .. }));
    }
}
