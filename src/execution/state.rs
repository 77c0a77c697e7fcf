use crate::errors::SwapError;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::debug;

/// Lifecycle of one swap request.
///
/// `Idle -> Quoting -> (Approving -> Swapping) x legs -> Completing -> Success`, with
/// `Failed` reachable from every non-terminal state. A request whose receipt never shows
/// up simply stays in the state it was waiting in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SwapState {
    Idle,
    Quoting,
    Approving { leg: usize },
    Swapping { leg: usize },
    Completing,
    Success,
    Failed,
}

impl Display for SwapState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapState::Idle => write!(f, "Idle"),
            SwapState::Quoting => write!(f, "Quoting"),
            SwapState::Approving { leg } => write!(f, "Approving({leg})"),
            SwapState::Swapping { leg } => write!(f, "Swapping({leg})"),
            SwapState::Completing => write!(f, "Completing"),
            SwapState::Success => write!(f, "Success"),
            SwapState::Failed => write!(f, "Failed"),
        }
    }
}

impl SwapState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapState::Success | SwapState::Failed)
    }

    /// Legal successors for a path of `legs` legs
    pub fn can_transition(&self, to: SwapState, legs: usize) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (*self, to) {
            (_, SwapState::Failed) => true,
            (SwapState::Idle, SwapState::Quoting) => true,
            (SwapState::Quoting, SwapState::Approving { leg: 1 }) => true,
            (SwapState::Approving { leg: from }, SwapState::Swapping { leg: to }) => from == to,
            (SwapState::Swapping { leg: from }, SwapState::Approving { leg: to }) => to == from + 1 && to <= legs,
            (SwapState::Swapping { leg }, SwapState::Completing) => leg == legs,
            (SwapState::Completing, SwapState::Success) => true,
            _ => false,
        }
    }
}

/// Enforces the legal transitions of one request and keeps the states it went through
#[derive(Debug, Clone)]
pub struct SwapStateMachine {
    state: SwapState,
    legs: usize,
    history: Vec<SwapState>,
}

impl Default for SwapStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapStateMachine {
    pub fn new() -> Self {
        Self { state: SwapState::Idle, legs: 1, history: vec![SwapState::Idle] }
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    pub fn history(&self) -> &[SwapState] {
        &self.history
    }

    /// Number of swap legs the machine expects; fixed once the path is known
    pub fn set_legs(&mut self, legs: usize) {
        self.legs = legs;
    }

    pub fn transition(&mut self, to: SwapState) -> Result<(), SwapError> {
        if !self.state.can_transition(to, self.legs) {
            return Err(SwapError::IllegalTransition { from: self.state, to });
        }
        debug!("Swap state {} -> {}", self.state, to);
        self.state = to;
        self.history.push(to);
        Ok(())
    }

    /// Move to `Failed` unless already terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = SwapState::Failed;
            self.history.push(SwapState::Failed);
        }
    }
}
