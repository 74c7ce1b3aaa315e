//! UCI engine sessions for sparring.

pub mod command;
pub mod driver;
pub mod error;
pub mod observer;
pub mod position;
pub mod score;
pub mod session;

pub use command::{Command, EngineMessage, InfoLine, parse_message};
pub use driver::{EngineHandle, ProcessChannel, spawn_engine};
pub use error::UciError;
pub use observer::{Observers, SubscriptionId};
pub use position::PositionDescriptor;
pub use score::{Evaluation, Score};
pub use session::{
    EngineChannel, EngineSession, EvalRequest, MAX_SKILL, ProtocolState, SessionConfig,
};
