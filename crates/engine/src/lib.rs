//! The dialogue routing engine: the heart of Maestro.
//!
//! For every inbound room message the engine:
//!
//! 1. **Learns** the sender (participant registry)
//! 2. **Records** the message (bounded conversation backlog)
//! 3. **Asks** the oracle who should receive it next, and validates the answer
//! 4. **Falls back** to a random participant, then to the sender, when the
//!    answer is unusable
//! 5. **Dispatches** one visible send to the target and silent copies to
//!    everyone else
//!
//! A presence poller independently adds newly connected participants.

pub mod backlog;
pub mod dispatch;
pub mod draw;
pub mod maestro;
pub mod poller;
pub mod prompt;
pub mod registry;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use backlog::{ConversationBacklog, DEFAULT_MAX_BACKLOG, SharedBacklog};
pub use dispatch::{DispatchCoordinator, SendInstruction};
pub use draw::{RandomDraw, TargetDraw};
pub use maestro::{Maestro, MaestroSettings};
pub use poller::{DEFAULT_POLL_INTERVAL, PresencePoller};
pub use registry::{Participant, ParticipantRegistry, SharedRegistry};
pub use resolver::{MAX_FALLBACK_DRAWS, ResolvedTarget, TargetResolver, TargetSource};
