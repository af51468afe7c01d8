//! Phase state machines
//!
//! Small flat state machines over caller-defined state and event types:
//! a transition table plus the history of transitions taken.
//!
//! Unknown events are ignored: sending an event with no matching transition
//! leaves the machine where it is, which makes duplicate deliveries harmless.

use smallvec::SmallVec;
use std::fmt::Debug;

/// Builder for phase machines
pub struct PhaseMachineBuilder<S, E> {
    initial: S,
    transitions: Vec<(S, E, S)>,
}

impl<S, E> PhaseMachineBuilder<S, E>
where
    S: Copy + Eq + Debug,
    E: Copy + Eq + Debug,
{
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            transitions: Vec::new(),
        }
    }

    /// Add a transition (from, event, to)
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.transitions.push((from, event, to));
        self
    }

    pub fn build(self) -> PhaseMachine<S, E> {
        PhaseMachine {
            current: self.initial,
            transitions: self.transitions,
            history: SmallVec::new(),
        }
    }
}

/// A flat state machine instance
pub struct PhaseMachine<S, E> {
    current: S,
    transitions: Vec<(S, E, S)>,
    history: SmallVec<[(S, E, S); 4]>,
}

impl<S, E> PhaseMachine<S, E>
where
    S: Copy + Eq + Debug,
    E: Copy + Eq + Debug,
{
    pub fn builder(initial: S) -> PhaseMachineBuilder<S, E> {
        PhaseMachineBuilder::new(initial)
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    /// Every transition taken so far, oldest first
    pub fn history(&self) -> &[(S, E, S)] {
        &self.history
    }

    /// Send an event, returning the state after it was handled
    pub fn send(&mut self, event: E) -> S {
        let from = self.current;
        let Some(&(_, _, to)) = self
            .transitions
            .iter()
            .find(|(f, e, _)| *f == from && *e == event)
        else {
            tracing::trace!(?from, ?event, "no transition; event ignored");
            return from;
        };

        self.current = to;
        self.history.push((from, event, to));
        to
    }
}
