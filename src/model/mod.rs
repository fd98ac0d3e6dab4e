//! Domain model.
//!
//! Lifelines own their entity history and stack frames in append-only
//! arenas; everything else refers to them by handle. `SequenceModel` ties
//! lifelines, message pairing, lane allocation and the journal together.

pub mod communication;
pub mod entity;
pub mod error;
pub mod identifiers;
pub mod journal;
pub mod lanes;
pub mod lifeline;
pub mod sequence;
pub mod shared;
pub mod timeline;

// Re-export for convenience
pub use communication::{Communication, CommunicationState, Direction};
pub use entity::{EntityKind, LifelineEntity, StackFrame, StackSnapshot};
pub use error::{AppError, IngestError, InputError, ParseError};
pub use identifiers::{
    CommunicationId, CorrelationId, EntityIndex, EntityRef, FrameId, FrameRef,
    InvalidSourceGroup, Lane, LifelineId, LifelineKey, SelectedObject, SourceGroup, YPos,
};
pub use journal::{JournalRecord, RawLog};
pub use lanes::LanePool;
pub use lifeline::Lifeline;
pub use sequence::{IngestOutcome, SequenceModel};
pub use shared::SharedModel;
pub use timeline::{LayoutPolicy, Timeline};
