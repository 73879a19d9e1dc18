//! Conversation handling for the chat channel.
//!
//! `engine::transition` is a pure function over `Session`; the stores and the
//! link guard are the only stateful pieces and sit behind traits so the API
//! crate can back them with Postgres.

pub mod engine;
pub mod join;
pub mod links;
pub mod memory;
pub mod session;
pub mod state;

pub use engine::{transition, Effect, EngineConfig, InboundMessage, Media, Reply, Transition};
pub use join::parse_join_details;
pub use links::{link_status, CaptureLink, CaptureLinkStore, LinkError, LinkStatus, LinkTokenGuard};
pub use memory::{InMemoryLinkStore, InMemorySessionStore};
pub use session::{SaveOutcome, Session, SessionStore};
pub use state::ConversationState;
