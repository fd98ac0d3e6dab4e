//! Event primitives: entities, stack frames, stack snapshots.

use super::identifiers::{CommunicationId, EntityIndex, FrameId, LifelineKey, YPos};
use crate::parser::TraceTime;
use std::sync::Arc;

/// Copy-on-write view of a lifeline's active stack, outermost frame first.
///
/// Entities share the snapshot that was live when they were recorded; the
/// lifeline clones the vector only when it mutates a shared snapshot.
pub type StackSnapshot = Arc<Vec<FrameId>>;

/// What happened at an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// First entity of every lifeline (title box).
    LifelineStart,
    /// Function entry.
    Call,
    /// Function exit.
    Return,
    /// Frame replaced in place.
    Phase,
    /// Message sent.
    Send,
    /// Message received.
    Recv,
    /// Marker.
    Event,
    /// Lifeline ended.
    Terminate,
}

impl EntityKind {
    /// Vertical space the entity occupies, in model pixels.
    pub fn extent(self) -> u64 {
        match self {
            EntityKind::LifelineStart => 30,
            EntityKind::Call | EntityKind::Phase | EntityKind::Event => 20,
            EntityKind::Return
            | EntityKind::Send
            | EntityKind::Recv
            | EntityKind::Terminate => 10,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::LifelineStart => "lifeline start",
            EntityKind::Call => "call",
            EntityKind::Return => "return",
            EntityKind::Phase => "phase",
            EntityKind::Send => "send",
            EntityKind::Recv => "recv",
            EntityKind::Event => "event",
            EntityKind::Terminate => "terminate",
        }
    }
}

/// One recorded point in time on a lifeline.
#[derive(Debug, Clone)]
pub struct LifelineEntity {
    lifeline: LifelineKey,
    y: YPos,
    kind: EntityKind,
    stack: StackSnapshot,
    label: Option<String>,
    time: Option<TraceTime>,
    info: Vec<String>,
    communication: Option<CommunicationId>,
}

impl LifelineEntity {
    pub(crate) fn new(
        lifeline: LifelineKey,
        y: YPos,
        kind: EntityKind,
        stack: StackSnapshot,
        label: Option<String>,
        time: Option<TraceTime>,
    ) -> Self {
        Self {
            lifeline,
            y,
            kind,
            stack,
            label,
            time,
            info: Vec::new(),
            communication: None,
        }
    }

    /// Owning lifeline.
    pub fn lifeline(&self) -> LifelineKey {
        self.lifeline
    }

    /// Vertical position.
    pub fn y(&self) -> YPos {
        self.y
    }

    /// Entity kind.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Active stack right after this entity took effect.
    pub fn stack(&self) -> &StackSnapshot {
        &self.stack
    }

    /// Stack depth right after this entity took effect.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Function name, phase name, correlation id or marker label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Producer time stamp, if the command carried one.
    pub fn time(&self) -> Option<TraceTime> {
        self.time
    }

    /// Free-text annotations attached with `INF`.
    pub fn info(&self) -> &[String] {
        &self.info
    }

    /// Communication this send/recv belongs to.
    pub fn communication(&self) -> Option<CommunicationId> {
        self.communication
    }

    pub(crate) fn push_info(&mut self, text: String) {
        self.info.push(text);
    }

    pub(crate) fn set_communication(&mut self, id: CommunicationId) {
        self.communication = Some(id);
    }
}

/// A function activation on a lifeline's stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    function_name: String,
    call_entity: EntityIndex,
    return_entity: Option<EntityIndex>,
}

impl StackFrame {
    pub(crate) fn new(function_name: String, call_entity: EntityIndex) -> Self {
        Self {
            function_name,
            call_entity,
            return_entity: None,
        }
    }

    /// Function (or phase) name.
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Entity that opened the frame.
    pub fn call_entity(&self) -> EntityIndex {
        self.call_entity
    }

    /// Entity that closed the frame, once matched.
    pub fn return_entity(&self) -> Option<EntityIndex> {
        self.return_entity
    }

    /// Whether the frame is still open.
    pub fn is_open(&self) -> bool {
        self.return_entity.is_none()
    }

    pub(crate) fn close(&mut self, at: EntityIndex) {
        self.return_entity = Some(at);
    }
}
