//! livechat_state - Lifecycle state machine for live-chat sessions
//!
//! A session moves from `Uninitialized` through registration into an active
//! conversation (bot or live agent) and finally to `Ended`. `Reset` returns
//! to `Uninitialized` from anywhere.

pub mod machine;

// Re-export commonly used types
pub use machine::{ChatEvent, ChatPhase, PhaseTransition, StateMachine, TransitionError};
