//! Resource-negotiation and crisis-state engine for a three-team emergency
//! response exercise.
//!
//! The [`orchestrator::TurnOrchestrator`] owns a single [`game_state::GameState`]
//! and advances it one tick at a time. Text for each team comes from an
//! external [`policy::Policy`]; everything observable leaves through a
//! [`notice::NotificationSink`].

pub mod allocation;
pub mod classifier;
pub mod config;
pub mod crisis_state;
pub mod error;
pub mod game_state;
pub mod location;
pub mod message;
pub mod notice;
pub mod orchestrator;
pub mod policy;
pub mod rescue;
pub mod score;
pub mod team;
pub mod updater;
pub mod vocabulary;

pub use allocation::{EvacRoute, Lease, Resource, ResourceAllocation};
pub use config::GameConfig;
pub use game_state::GameState;
pub use location::Location;
pub use message::{CoordinationEvent, CoordinationKind, Message, MessageKind};
pub use notice::{NotificationSink, Notice, StatusReport};
pub use orchestrator::{Control, EndReason, GameReport, Phase, TurnOrchestrator};
pub use policy::Policy;
pub use score::GameResult;
pub use team::{Team, TeamStatus};
