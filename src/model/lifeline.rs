//! A single thread of execution and its recorded history.

use super::entity::{EntityKind, LifelineEntity, StackFrame, StackSnapshot};
use super::error::IngestError;
use super::identifiers::{
    CommunicationId, EntityIndex, FrameId, Lane, LifelineId, LifelineKey, SourceGroup, YPos,
};
use super::timeline::Timeline;
use crate::parser::TraceTime;
use std::sync::Arc;

/// One lifeline: entity history plus the live call stack.
#[derive(Debug, Clone)]
pub struct Lifeline {
    key: LifelineKey,
    id: LifelineId,
    group: SourceGroup,
    display_name: String,
    lane: Lane,
    start_y: YPos,
    end_y: Option<YPos>,
    cursor: YPos,
    entities: Vec<LifelineEntity>,
    frames: Vec<StackFrame>,
    stack: StackSnapshot,
    terminated: bool,
}

impl Lifeline {
    /// Create a lifeline and record its start entity.
    pub(crate) fn new(
        key: LifelineKey,
        id: LifelineId,
        group: SourceGroup,
        lane: Lane,
        timeline: &mut Timeline,
    ) -> Self {
        let mut cursor = timeline.birth_position();
        let start_y = timeline.place(&mut cursor, EntityKind::LifelineStart.extent());
        let stack: StackSnapshot = Arc::new(Vec::new());
        let start = LifelineEntity::new(
            key,
            start_y,
            EntityKind::LifelineStart,
            Arc::clone(&stack),
            None,
            None,
        );
        Self {
            key,
            display_name: id.raw().to_string(),
            id,
            group,
            lane,
            start_y,
            end_y: None,
            cursor,
            entities: vec![start],
            frames: Vec::new(),
            stack,
            terminated: false,
        }
    }

    /// Arena key.
    pub fn key(&self) -> LifelineKey {
        self.key
    }

    /// Qualified id.
    pub fn id(&self) -> &LifelineId {
        &self.id
    }

    /// Source group the lifeline was created under.
    pub fn group(&self) -> &SourceGroup {
        &self.group
    }

    /// Title shown in the diagram; the raw thread id until renamed.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Lane held (or last held, once terminated).
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// y of the start entity.
    pub fn start_y(&self) -> YPos {
        self.start_y
    }

    /// y of the terminate entity, once terminated.
    pub fn end_y(&self) -> Option<YPos> {
        self.end_y
    }

    /// Lowest point this lifeline has reserved.
    pub fn cursor(&self) -> YPos {
        self.cursor
    }

    /// Whether `TRM` (or a disconnect) has ended the lifeline.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Full history, in increasing y.
    pub fn entities(&self) -> &[LifelineEntity] {
        &self.entities
    }

    /// Entity by index.
    pub fn entity(&self, index: EntityIndex) -> Option<&LifelineEntity> {
        self.entities.get(index.get())
    }

    /// Every frame ever opened on this lifeline.
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Frame by id.
    pub fn frame(&self, id: FrameId) -> Option<&StackFrame> {
        self.frames.get(id.get())
    }

    /// Currently open frames, outermost first.
    pub fn active_stack(&self) -> &[FrameId] {
        &self.stack
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Index of the first entity with `y >= at`.
    ///
    /// Entities are stored in increasing y, so this is a binary search.
    pub fn first_at_or_after(&self, at: YPos) -> usize {
        self.entities.partition_point(|e| e.y() < at)
    }

    /// Stack that was open just before `at`: the snapshot of the last entity
    /// strictly above it, or empty.
    pub fn stack_before(&self, at: YPos) -> StackSnapshot {
        match self.first_at_or_after(at) {
            0 => Arc::new(Vec::new()),
            n => Arc::clone(self.entities[n - 1].stack()),
        }
    }

    /// Enter a function.
    pub(crate) fn call(
        &mut self,
        timeline: &mut Timeline,
        name: String,
        time: TraceTime,
    ) -> Result<EntityIndex, IngestError> {
        self.ensure_live()?;
        let index = self.next_index();
        self.open_frame(name.clone(), index);
        Ok(self.record(timeline, EntityKind::Call, Some(name), Some(time)))
    }

    /// Leave the innermost function.
    pub(crate) fn ret(
        &mut self,
        timeline: &mut Timeline,
        time: TraceTime,
    ) -> Result<EntityIndex, IngestError> {
        self.ensure_live()?;
        let index = self.next_index();
        if !self.close_frame(index) {
            return Err(IngestError::OverReturn {
                lifeline: self.id.to_string(),
            });
        }
        Ok(self.record(timeline, EntityKind::Return, None, Some(time)))
    }

    /// Replace the innermost frame (or open one on an empty stack).
    pub(crate) fn phase(
        &mut self,
        timeline: &mut Timeline,
        name: String,
        time: TraceTime,
    ) -> Result<EntityIndex, IngestError> {
        self.ensure_live()?;
        let index = self.next_index();
        self.close_frame(index);
        self.open_frame(name.clone(), index);
        Ok(self.record(timeline, EntityKind::Phase, Some(name), Some(time)))
    }

    /// Record a send or receive; the caller links the communication.
    pub(crate) fn message(
        &mut self,
        timeline: &mut Timeline,
        kind: EntityKind,
        correlation: String,
        time: TraceTime,
    ) -> Result<EntityIndex, IngestError> {
        debug_assert!(matches!(kind, EntityKind::Send | EntityKind::Recv));
        self.ensure_live()?;
        Ok(self.record(timeline, kind, Some(correlation), Some(time)))
    }

    /// Record a marker.
    pub(crate) fn event(
        &mut self,
        timeline: &mut Timeline,
        label: String,
        time: TraceTime,
    ) -> Result<EntityIndex, IngestError> {
        self.ensure_live()?;
        Ok(self.record(timeline, EntityKind::Event, Some(label), Some(time)))
    }

    /// Change the title.
    pub(crate) fn rename(&mut self, name: String) -> Result<(), IngestError> {
        self.ensure_live()?;
        self.display_name = name;
        Ok(())
    }

    /// Attach free text to the latest entity.
    pub(crate) fn annotate(&mut self, text: String) -> Result<EntityIndex, IngestError> {
        let index = self.entities.len().checked_sub(1).ok_or_else(|| {
            IngestError::NoPriorEntity {
                lifeline: self.id.to_string(),
            }
        })?;
        self.entities[index].push_info(text);
        Ok(EntityIndex::new(index))
    }

    /// End the lifeline, closing every open frame at the terminate entity.
    pub(crate) fn terminate(
        &mut self,
        timeline: &mut Timeline,
    ) -> Result<EntityIndex, IngestError> {
        self.ensure_live()?;
        let index = self.next_index();
        while self.close_frame(index) {}
        let index = self.record(timeline, EntityKind::Terminate, None, None);
        self.end_y = Some(self.entities[index.get()].y());
        self.terminated = true;
        Ok(index)
    }

    pub(crate) fn link_communication(&mut self, index: EntityIndex, id: CommunicationId) {
        if let Some(entity) = self.entities.get_mut(index.get()) {
            entity.set_communication(id);
        }
    }

    fn ensure_live(&self) -> Result<(), IngestError> {
        if self.terminated {
            Err(IngestError::LifelineTerminated {
                lifeline: self.id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn next_index(&self) -> EntityIndex {
        EntityIndex::new(self.entities.len())
    }

    fn open_frame(&mut self, name: String, opened_at: EntityIndex) {
        let id = FrameId::new(self.frames.len());
        self.frames.push(StackFrame::new(name, opened_at));
        Arc::make_mut(&mut self.stack).push(id);
    }

    /// Pop the innermost frame, recording where it closed. False if empty.
    fn close_frame(&mut self, closed_at: EntityIndex) -> bool {
        match Arc::make_mut(&mut self.stack).pop() {
            Some(id) => {
                self.frames[id.get()].close(closed_at);
                true
            }
            None => false,
        }
    }

    fn record(
        &mut self,
        timeline: &mut Timeline,
        kind: EntityKind,
        label: Option<String>,
        time: Option<TraceTime>,
    ) -> EntityIndex {
        let y = timeline.place(&mut self.cursor, kind.extent());
        let index = self.next_index();
        self.entities.push(LifelineEntity::new(
            self.key,
            y,
            kind,
            Arc::clone(&self.stack),
            label,
            time,
        ));
        index
    }
}
