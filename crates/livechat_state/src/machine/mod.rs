//! State machine module
//!
//! Contains the FSM implementation for the chat session lifecycle.

mod events;
mod states;
mod transitions;

pub use events::ChatEvent;
pub use states::ChatPhase;
pub use transitions::{PhaseTransition, StateMachine, TransitionError};
