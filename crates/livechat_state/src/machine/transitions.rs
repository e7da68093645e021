//! Phase transitions - FSM transition logic
//!
//! Implements the state machine that handles event-driven phase transitions.

use thiserror::Error;
use tracing::debug;

use super::events::ChatEvent;
use super::states::ChatPhase;

/// Error type for rejected transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} with event {event:?}")]
    InvalidTransition { from: ChatPhase, event: ChatEvent },
}

/// Represents a phase transition result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    /// The phase before the transition.
    pub from: ChatPhase,
    /// The phase after the transition.
    pub to: ChatPhase,
    /// The event that triggered the transition.
    pub event: ChatEvent,
    /// Whether the phase actually changed.
    pub changed: bool,
}

/// State machine for the session lifecycle.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current phase.
    current: ChatPhase,
    /// Transition history (limited).
    history: Vec<PhaseTransition>,
    /// Max history entries to keep.
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine in the `Uninitialized` phase.
    pub fn new() -> Self {
        Self::with_phase(ChatPhase::Uninitialized)
    }

    /// Create a state machine with a specific initial phase.
    pub fn with_phase(phase: ChatPhase) -> Self {
        Self {
            current: phase,
            history: Vec::new(),
            max_history: 50,
        }
    }

    pub fn phase(&self) -> ChatPhase {
        self.current
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Handle an event. Events that do not apply to the current phase leave
    /// it unchanged and are still recorded with `changed == false`.
    pub fn handle_event(&mut self, event: ChatEvent) -> PhaseTransition {
        let from = self.current;
        let to = Self::next_phase(from, event).unwrap_or(from);
        let changed = from != to;

        if changed {
            debug!(?from, ?to, ?event, "chat phase transition");
        }
        self.current = to;

        let transition = PhaseTransition {
            from,
            to,
            event,
            changed,
        };

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    /// Like `handle_event`, but rejects events that do not apply.
    pub fn try_handle_event(&mut self, event: ChatEvent) -> Result<PhaseTransition, TransitionError> {
        if Self::next_phase(self.current, event).is_none() {
            return Err(TransitionError::InvalidTransition {
                from: self.current,
                event,
            });
        }
        Ok(self.handle_event(event))
    }

    /// Compute the next phase; `None` when the event does not apply.
    fn next_phase(phase: ChatPhase, event: ChatEvent) -> Option<ChatPhase> {
        use ChatEvent::*;
        use ChatPhase::*;

        let next = match (phase, event) {
            // ========== Reset ==========
            (_, Reset) => Uninitialized,

            // ========== Registration ==========
            (Uninitialized, RegistrationSubmitted) => Initializing,
            (Initializing, RegistrationConfirmed) => Active {
                mode: livechat_core::ChatMode::Bot,
            },
            (Initializing, RegistrationFailed) => Uninitialized,
            (Uninitialized, SessionRestored { mode }) => Active { mode },

            // ========== Service-driven ==========
            (Active { .. }, ModeChanged { mode }) => Active { mode },
            (Ended { .. }, ModeChanged { mode }) => Ended { mode },
            (Active { mode }, ChatEnded) => Ended { mode },
            (Ended { mode }, ChatEnded) => Ended { mode },

            _ => return None,
        };
        Some(next)
    }

    /// Reset to `Uninitialized`, recording the transition.
    pub fn reset(&mut self) -> PhaseTransition {
        self.handle_event(ChatEvent::Reset)
    }
}
