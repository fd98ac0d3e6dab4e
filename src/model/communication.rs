//! Cross-lifeline message pairing.

use super::identifiers::{CorrelationId, EntityRef};

/// A message between two lifelines, matched by correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Communication {
    correlation: CorrelationId,
    send: Option<EntityRef>,
    recv: Option<EntityRef>,
}

/// Pairing state as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationState {
    /// Only one side has arrived so far.
    NotReady,
    /// Both sides are known.
    Complete {
        /// Sending entity.
        send: EntityRef,
        /// Receiving entity.
        recv: EntityRef,
    },
}

/// Which side of a communication an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `SND`
    Send,
    /// `RCV`
    Recv,
}

impl Communication {
    pub(crate) fn open(correlation: CorrelationId, side: Direction, entity: EntityRef) -> Self {
        let mut comm = Self {
            correlation,
            send: None,
            recv: None,
        };
        comm.attach(side, entity);
        comm
    }

    pub(crate) fn attach(&mut self, side: Direction, entity: EntityRef) {
        match side {
            Direction::Send => self.send = Some(entity),
            Direction::Recv => self.recv = Some(entity),
        }
    }

    /// Correlation id.
    pub fn correlation(&self) -> &CorrelationId {
        &self.correlation
    }

    /// Sending entity, once seen.
    pub fn send(&self) -> Option<EntityRef> {
        self.send
    }

    /// Receiving entity, once seen.
    pub fn recv(&self) -> Option<EntityRef> {
        self.recv
    }

    /// Pairing state. Never an error: an unmatched side is just not ready.
    pub fn state(&self) -> CommunicationState {
        match (self.send, self.recv) {
            (Some(send), Some(recv)) => CommunicationState::Complete { send, recv },
            _ => CommunicationState::NotReady,
        }
    }

    /// Whether both sides are known.
    pub fn is_complete(&self) -> bool {
        matches!(self.state(), CommunicationState::Complete { .. })
    }
}
