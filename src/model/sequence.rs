//! The sequence model: lifelines, message pairing, lanes and journal.
//!
//! `SequenceModel` is the single mutable state of the application. It is not
//! internally synchronized; concurrent sources go through
//! [`SharedModel`](super::shared::SharedModel), whose lock serializes every
//! `ingest` and every `draw`.

use super::communication::{Communication, Direction};
use super::entity::EntityKind;
use super::error::{IngestError, InputError};
use super::identifiers::{
    CommunicationId, CorrelationId, EntityRef, LifelineId, LifelineKey, SelectedObject,
    SourceGroup,
};
use super::journal::RawLog;
use super::lanes::LanePool;
use super::lifeline::Lifeline;
use super::timeline::{LayoutPolicy, Timeline};
use super::YPos;
use crate::parser::{parse_line, Command, CommandKind, ParsedLine};
use crate::view_state::{traversal, DrawSink, LayoutParams, Point, Viewport};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// What `ingest` did with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Command applied to the model.
    Applied(CommandKind),
    /// Comment journaled.
    Comment,
    /// Whitespace only; ignored.
    Blank,
    /// Thread id `""` or `-`: journaled, not applied.
    Unroutable,
    /// Journaled but not applied.
    Rejected(IngestError),
}

impl IngestOutcome {
    /// Whether the model changed shape.
    pub fn is_applied(&self) -> bool {
        matches!(self, IngestOutcome::Applied(_))
    }
}

/// Live execution-trace model.
#[derive(Debug)]
pub struct SequenceModel {
    lifelines: Vec<Lifeline>,
    index: HashMap<LifelineId, LifelineKey>,
    aliases: HashMap<(SourceGroup, LifelineId), LifelineId>,
    timeline: Timeline,
    lanes: LanePool,
    communications: Vec<Communication>,
    pending_send: HashMap<CorrelationId, CommunicationId>,
    pending_recv: HashMap<CorrelationId, CommunicationId>,
    journal: RawLog,
    params: LayoutParams,
    click_point: Option<Point>,
    selected: Option<SelectedObject>,
    revision: u64,
    groups_issued: u64,
}

impl Default for SequenceModel {
    fn default() -> Self {
        Self::new(LayoutPolicy::Synchronized, LayoutParams::default())
    }
}

impl SequenceModel {
    /// Empty model.
    pub fn new(policy: LayoutPolicy, params: LayoutParams) -> Self {
        Self {
            lifelines: Vec::new(),
            index: HashMap::new(),
            aliases: HashMap::new(),
            timeline: Timeline::new(policy),
            lanes: LanePool::new(),
            communications: Vec::new(),
            pending_send: HashMap::new(),
            pending_recv: HashMap::new(),
            journal: RawLog::new(),
            params,
            click_point: None,
            selected: None,
            revision: 0,
            groups_issued: 0,
        }
    }

    /// Apply one wire line.
    ///
    /// Never fails: every problem is reported through the outcome, logged, and
    /// leaves other lifelines untouched. Every non-blank line is journaled,
    /// command lines with their qualified lifeline id.
    pub fn ingest(&mut self, line: &str, group: &SourceGroup) -> IngestOutcome {
        let outcome = match parse_line(line) {
            ParsedLine::Blank => return IngestOutcome::Blank,
            ParsedLine::Comment(text) => {
                self.journal.push_comment(text);
                IngestOutcome::Comment
            }
            ParsedLine::Invalid { fields, error } => {
                warn!(group = %group, line, "Rejected line: {}", error);
                self.journal.push_fields(fields);
                IngestOutcome::Rejected(error.into())
            }
            ParsedLine::Command(command) if command.is_unroutable() => {
                debug!(group = %group, line, "Unroutable line journaled");
                self.journal
                    .push_fields(command.to_fields(command.thread()));
                IngestOutcome::Unroutable
            }
            ParsedLine::Command(command) => {
                let id = self.route(group, command.thread());
                self.journal.push_fields(command.to_fields(id.as_str()));
                let kind = command.kind();
                match self.apply(&id, group, command) {
                    Ok(()) => {
                        debug!(lifeline = %id, command = kind.mnemonic(), "Applied");
                        IngestOutcome::Applied(kind)
                    }
                    Err(error) => {
                        warn!(lifeline = %id, line, "Rejected command: {}", error);
                        IngestOutcome::Rejected(error)
                    }
                }
            }
        };
        self.revision += 1;
        outcome
    }

    fn apply(
        &mut self,
        id: &LifelineId,
        group: &SourceGroup,
        command: Command,
    ) -> Result<(), IngestError> {
        match command {
            Command::Terminate { .. } => {
                let key = self.lookup(id)?;
                self.terminate_key(key)
            }
            Command::Info { text, .. } => {
                let key = self.index.get(id).copied().ok_or_else(|| {
                    IngestError::NoPriorEntity {
                        lifeline: id.to_string(),
                    }
                })?;
                self.lifelines[key.get()].annotate(text).map(|_| ())
            }
            Command::Call { name, time, .. } => {
                let key = self.resolve(id, group);
                self.lifelines[key.get()]
                    .call(&mut self.timeline, name, time)
                    .map(|_| ())
            }
            Command::Return { time, .. } => {
                let key = self.resolve(id, group);
                self.lifelines[key.get()]
                    .ret(&mut self.timeline, time)
                    .map(|_| ())
            }
            Command::Phase { name, time, .. } => {
                let key = self.resolve(id, group);
                self.lifelines[key.get()]
                    .phase(&mut self.timeline, name, time)
                    .map(|_| ())
            }
            Command::ThreadName { name, .. } => {
                let key = self.resolve(id, group);
                self.lifelines[key.get()].rename(name)
            }
            Command::Event { label, time, .. } => {
                let key = self.resolve(id, group);
                self.lifelines[key.get()]
                    .event(&mut self.timeline, label, time)
                    .map(|_| ())
            }
            Command::Send {
                correlation, time, ..
            } => self.message(id, group, Direction::Send, correlation, time),
            Command::Recv {
                correlation, time, ..
            } => self.message(id, group, Direction::Recv, correlation, time),
        }
    }

    fn message(
        &mut self,
        id: &LifelineId,
        group: &SourceGroup,
        side: Direction,
        correlation: String,
        time: u64,
    ) -> Result<(), IngestError> {
        let key = self.resolve(id, group);
        let kind = match side {
            Direction::Send => EntityKind::Send,
            Direction::Recv => EntityKind::Recv,
        };
        let entity = self.lifelines[key.get()].message(
            &mut self.timeline,
            kind,
            correlation.clone(),
            time,
        )?;
        let comm = self.pair(
            CorrelationId::new(correlation),
            side,
            EntityRef {
                lifeline: key,
                entity,
            },
        );
        self.lifelines[key.get()].link_communication(entity, comm);
        Ok(())
    }

    /// Register one side of a message; completes a pending opposite side.
    fn pair(
        &mut self,
        correlation: CorrelationId,
        side: Direction,
        entity: EntityRef,
    ) -> CommunicationId {
        let (own, opposite) = match side {
            Direction::Send => (&mut self.pending_send, &mut self.pending_recv),
            Direction::Recv => (&mut self.pending_recv, &mut self.pending_send),
        };
        if let Some(id) = opposite.remove(&correlation) {
            self.communications[id.get()].attach(side, entity);
            debug!(correlation = %correlation, "Communication complete");
            return id;
        }
        let id = CommunicationId::new(self.communications.len());
        if own.insert(correlation.clone(), id).is_some() {
            debug!(correlation = %correlation, "Pending side superseded");
        }
        self.communications
            .push(Communication::open(correlation, side, entity));
        id
    }

    /// Lifeline id that lines from `group` naming `raw` are applied to.
    ///
    /// A qualified id already owned by a different group (a replayed `g1/t1`
    /// meeting a live source tagged `g1`) is never shared: the newcomer gets
    /// the first free `~n` suffix and keeps it for the rest of the session.
    fn route(&mut self, group: &SourceGroup, raw: &str) -> LifelineId {
        let id = group.qualify(raw);
        if !matches!(self.owner_of(&id), Some(owner) if owner != group) {
            return id;
        }
        let alias_key = (group.clone(), id);
        if let Some(alias) = self.aliases.get(&alias_key) {
            return alias.clone();
        }
        let mut n = 2u64;
        let alias = loop {
            let candidate = LifelineId::new(format!("{}~{}", alias_key.1, n));
            if self.owner_of(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };
        info!(
            group = %group,
            lifeline = %alias_key.1,
            alias = %alias,
            "Lifeline id owned by another group"
        );
        self.aliases.insert(alias_key, alias.clone());
        alias
    }

    /// Group holding `id`: its lifeline's group, or the group an alias was
    /// reserved for before any lifeline was created under it.
    fn owner_of(&self, id: &LifelineId) -> Option<&SourceGroup> {
        match self.index.get(id) {
            Some(key) => Some(self.lifelines[key.get()].group()),
            None => self
                .aliases
                .iter()
                .find(|(_, alias)| *alias == id)
                .map(|((group, _), _)| group),
        }
    }

    fn lookup(&self, id: &LifelineId) -> Result<LifelineKey, IngestError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| IngestError::UnknownLifeline {
                lifeline: id.to_string(),
            })
    }

    /// Existing lifeline for `id`, or a new one in the lowest free lane.
    fn resolve(&mut self, id: &LifelineId, group: &SourceGroup) -> LifelineKey {
        if let Some(key) = self.index.get(id) {
            return *key;
        }
        if group.is_unscoped() {
            // replayed ids carry their group; keep fresh groups clear of them
            if let Some(n) = id
                .as_str()
                .split_once('/')
                .and_then(|(tag, _)| SourceGroup::sequence_number(tag))
            {
                self.groups_issued = self.groups_issued.max(n);
            }
        }
        let key = LifelineKey::new(self.lifelines.len());
        let lane = self.lanes.acquire();
        self.lifelines.push(Lifeline::new(
            key,
            id.clone(),
            group.clone(),
            lane,
            &mut self.timeline,
        ));
        self.index.insert(id.clone(), key);
        info!(
            lifeline = %id,
            lane = lane.get(),
            live = self.lanes.in_use_count(),
            "Lifeline created"
        );
        key
    }

    fn terminate_key(&mut self, key: LifelineKey) -> Result<(), IngestError> {
        let lifeline = &mut self.lifelines[key.get()];
        lifeline.terminate(&mut self.timeline)?;
        if !self.lanes.release(lifeline.lane()) {
            warn!(lifeline = %lifeline.id(), lane = lifeline.lane().get(), "Lane was not held");
        }
        info!(
            lifeline = %lifeline.id(),
            live = self.lanes.in_use_count(),
            "Lifeline terminated"
        );
        Ok(())
    }

    /// Terminate every live lifeline created under `group`.
    ///
    /// Each termination is journaled as a `TRM` line so a replay ends in the
    /// same state. Returns how many lifelines were terminated.
    pub fn terminate_group(&mut self, group: &SourceGroup) -> usize {
        let keys: Vec<LifelineKey> = self
            .lifelines
            .iter()
            .filter(|l| l.group() == group && !l.is_terminated())
            .map(Lifeline::key)
            .collect();
        for &key in &keys {
            let id = self.lifelines[key.get()].id().clone();
            self.journal
                .push_fields(Command::Terminate {
                    thread: id.to_string(),
                }
                .to_fields(id.as_str()));
            if let Err(error) = self.terminate_key(key) {
                warn!(lifeline = %id, "Group terminate failed: {}", error);
            }
        }
        if !keys.is_empty() {
            self.revision += 1;
            info!(group = %group, count = keys.len(), "Source group terminated");
        }
        keys.len()
    }

    /// Fresh source group tag (`g1`, `g2`, ...).
    pub fn allocate_source_group(&mut self) -> SourceGroup {
        self.groups_issued += 1;
        SourceGroup::sequential(self.groups_issued)
    }

    /// Mutation counter; changes whenever a line is ingested.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Placement policy.
    pub fn policy(&self) -> LayoutPolicy {
        self.timeline.policy()
    }

    /// Layout parameters.
    pub fn layout_params(&self) -> &LayoutParams {
        &self.params
    }

    /// All lifelines ever created, in creation order.
    pub fn lifelines(&self) -> &[Lifeline] {
        &self.lifelines
    }

    /// Lifeline by arena key.
    pub fn lifeline(&self, key: LifelineKey) -> Option<&Lifeline> {
        self.lifelines.get(key.get())
    }

    /// Lifeline by qualified id.
    pub fn lifeline_by_id(&self, id: &LifelineId) -> Option<&Lifeline> {
        self.index.get(id).and_then(|key| self.lifeline(*key))
    }

    /// Lowest drawn point of `lifeline`: its end, or where time currently is.
    pub fn lifeline_bottom(&self, lifeline: &Lifeline) -> YPos {
        match (lifeline.end_y(), self.timeline.policy()) {
            (Some(end), _) => end.advanced(EntityKind::Terminate.extent()),
            (None, LayoutPolicy::Synchronized) => self.timeline.global_y(),
            (None, LayoutPolicy::FreeRunning) => lifeline.cursor(),
        }
    }

    /// All communications, complete or not.
    pub fn communications(&self) -> &[Communication] {
        &self.communications
    }

    /// Communication by id.
    pub fn communication(&self, id: CommunicationId) -> Option<&Communication> {
        self.communications.get(id.get())
    }

    /// Most recent communication using `correlation`.
    pub fn communication_for(&self, correlation: &CorrelationId) -> Option<&Communication> {
        self.communications
            .iter()
            .rev()
            .find(|c| c.correlation() == correlation)
    }

    /// Journal of accepted lines.
    pub fn journal(&self) -> &RawLog {
        &self.journal
    }

    /// Diagram width: one lane width per lane ever used.
    pub fn get_width(&self) -> f64 {
        self.params.width_for(self.lanes.high_water())
    }

    /// Diagram height: the lowest position reached.
    pub fn get_height(&self) -> f64 {
        self.timeline.global_y().as_f64()
    }

    /// Paint the viewport into `sink` (screen coordinates).
    ///
    /// A pending click point is resolved first with a pick pass over the
    /// same viewport, updating the selection.
    pub fn draw(&mut self, viewport: Viewport, sink: &mut dyn DrawSink) {
        if let Some(point) = self.click_point.take() {
            self.selected = traversal::pick(self, viewport, point).target();
            debug!(selected = ?self.selected, "Pick resolved");
        }
        traversal::paint(self, viewport, self.selected, sink);
    }

    /// Store a click (screen coordinates) for the next `draw`.
    pub fn set_click_point(&mut self, x: f64, y: f64) {
        self.click_point = Some(Point::new(x, y));
    }

    /// Current selection.
    pub fn get_selected_object(&self) -> Option<SelectedObject> {
        self.selected
    }

    /// Replace the selection directly.
    pub fn set_selected_object(&mut self, selected: Option<SelectedObject>) {
        self.selected = selected;
    }

    /// Inspector text for `object`; `None` if the handle is stale.
    pub fn get_info_text(&self, object: SelectedObject) -> Option<String> {
        match object {
            SelectedObject::Entity(entity) => self.entity_info(entity),
            SelectedObject::Frame(frame) => {
                let lifeline = self.lifeline(frame.lifeline)?;
                let f = lifeline.frame(frame.frame)?;
                let mut text =
                    format!("call {} on {}\n", f.function_name(), lifeline.display_name());
                let called = lifeline.entity(f.call_entity())?;
                let _ = writeln!(text, "called at y={}", called.y().get());
                match f.return_entity().and_then(|r| lifeline.entity(r)) {
                    Some(ret) => {
                        let _ = writeln!(
                            text,
                            "returned at y={} ({})",
                            ret.y().get(),
                            ret.kind().name()
                        );
                    }
                    None => text.push_str("still open\n"),
                }
                Some(text)
            }
            SelectedObject::Communication(id) => {
                let comm = self.communication(id)?;
                let mut text = format!("message {}\n", comm.correlation());
                for (side, end) in [("send", comm.send()), ("recv", comm.recv())] {
                    match end.and_then(|e| Some((self.lifeline(e.lifeline)?, e))) {
                        Some((lifeline, e)) => {
                            let y = lifeline.entity(e.entity).map_or(0, |x| x.y().get());
                            let _ = writeln!(text, "{}: {} y={}", side, lifeline.id(), y);
                        }
                        None => {
                            let _ = writeln!(text, "{}: not ready", side);
                        }
                    }
                }
                Some(text)
            }
        }
    }

    fn entity_info(&self, entity: EntityRef) -> Option<String> {
        let lifeline = self.lifeline(entity.lifeline)?;
        let e = lifeline.entity(entity.entity)?;
        let mut text = format!(
            "{} on {} ({})\n",
            e.kind().name(),
            lifeline.display_name(),
            lifeline.id()
        );
        let _ = write!(text, "y={}", e.y().get());
        if let Some(time) = e.time() {
            let _ = write!(text, " time={}", time);
        }
        text.push('\n');
        if let Some(label) = e.label() {
            let _ = writeln!(text, "label: {}", label);
        }
        let stack: Vec<&str> = e
            .stack()
            .iter()
            .filter_map(|f| lifeline.frame(*f).map(|f| f.function_name()))
            .collect();
        if !stack.is_empty() {
            let _ = writeln!(text, "stack: {}", stack.join(" > "));
        }
        if let Some(comm) = e.communication().and_then(|c| self.communication(c)) {
            let state = if comm.is_complete() { "complete" } else { "not ready" };
            let _ = writeln!(text, "message {}: {}", comm.correlation(), state);
        }
        for line in e.info() {
            let _ = writeln!(text, "  {}", line);
        }
        Some(text)
    }

    /// Write the journal, one shell-quoted line per record.
    pub fn write_journal<W: Write>(&self, writer: W) -> Result<(), InputError> {
        self.journal.write_to(writer)?;
        Ok(())
    }

    /// Save the journal to `path`, replacing it.
    pub fn save_journal(&self, path: &Path) -> Result<(), InputError> {
        self.journal.save(path)?;
        info!(path = %path.display(), records = self.journal.len(), "Journal saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrameId, Lane};

    fn group() -> SourceGroup {
        SourceGroup::new("g1").unwrap()
    }

    fn ingest_all(model: &mut SequenceModel, lines: &[&str]) -> Vec<IngestOutcome> {
        let group = group();
        lines.iter().map(|l| model.ingest(l, &group)).collect()
    }

    fn lifeline<'a>(model: &'a SequenceModel, raw: &str) -> &'a Lifeline {
        model
            .lifeline_by_id(&group().qualify(raw))
            .expect("lifeline exists")
    }

    mod ingest {
        use super::*;

        #[test]
        fn blank_is_ignored_and_not_journaled() {
            let mut model = SequenceModel::default();
            assert_eq!(model.ingest("   ", &group()), IngestOutcome::Blank);
            assert!(model.journal().is_empty());
            assert_eq!(model.revision(), 0);
        }

        #[test]
        fn comment_is_journaled() {
            let mut model = SequenceModel::default();
            assert_eq!(model.ingest("#   hi  there", &group()), IngestOutcome::Comment);
            let lines: Vec<String> = model.journal().lines().collect();
            assert_eq!(lines, vec!["#   hi  there"]);
        }

        #[test]
        fn unknown_command_is_rejected_and_journaled() {
            let mut model = SequenceModel::default();
            let outcome = model.ingest("XYZ t1 1", &group());
            assert!(matches!(outcome, IngestOutcome::Rejected(IngestError::Parse(_))));
            assert_eq!(model.journal().len(), 1);
            assert!(model.lifelines().is_empty());
        }

        #[test]
        fn unroutable_is_journaled_not_applied() {
            let mut model = SequenceModel::default();
            assert_eq!(model.ingest("CAL - 1 foo", &group()), IngestOutcome::Unroutable);
            assert_eq!(model.ingest(r#"CAL "" 1 foo"#, &group()), IngestOutcome::Unroutable);
            assert!(model.lifelines().is_empty());
            assert_eq!(model.journal().len(), 2);
        }

        #[test]
        fn journal_uses_qualified_ids() {
            let mut model = SequenceModel::default();
            model.ingest(r#"CAL t1 1 "main loop""#, &group());
            let lines: Vec<String> = model.journal().lines().collect();
            assert_eq!(lines, vec![r#"CAL g1/t1 1 "main loop""#]);
        }

        #[test]
        fn lifeline_created_lazily_with_raw_title() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["EVT t1 1 start"]);
            let t1 = lifeline(&model, "t1");
            assert_eq!(t1.display_name(), "t1");
            assert_eq!(t1.entities().len(), 2);
        }

        #[test]
        fn thread_name_renames() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["TNM t1 Main Thread"]);
            assert_eq!(lifeline(&model, "t1").display_name(), "Main Thread");
        }

        #[test]
        fn info_without_lifeline_is_rejected() {
            let mut model = SequenceModel::default();
            let outcome = model.ingest("INF t9 hello", &group());
            assert!(matches!(
                outcome,
                IngestOutcome::Rejected(IngestError::NoPriorEntity { .. })
            ));
            assert!(model.lifelines().is_empty());
        }

        #[test]
        fn terminate_unknown_is_rejected() {
            let mut model = SequenceModel::default();
            assert!(matches!(
                model.ingest("TRM ghost", &group()),
                IngestOutcome::Rejected(IngestError::UnknownLifeline { .. })
            ));
        }

        #[test]
        fn over_return_is_noop() {
            let mut model = SequenceModel::default();
            let outcomes = ingest_all(&mut model, &["CAL t1 1 a", "RET t1 2", "RET t1 3"]);
            assert!(matches!(
                outcomes[2],
                IngestOutcome::Rejected(IngestError::OverReturn { .. })
            ));
            assert_eq!(lifeline(&model, "t1").entities().len(), 3);
        }

        #[test]
        fn same_raw_id_from_two_groups_is_two_lifelines() {
            let mut model = SequenceModel::default();
            let a = model.allocate_source_group();
            let b = model.allocate_source_group();
            model.ingest("CAL 1234 1 f", &a);
            model.ingest("CAL 1234 1 f", &b);
            assert_eq!(model.lifelines().len(), 2);
            assert_ne!(model.lifelines()[0].lane(), model.lifelines()[1].lane());
        }
    }

    mod placement {
        use super::*;

        #[test]
        fn synchronized_interleaves_on_one_clock() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["CAL A 1 a", "CAL B 2 b", "RET A 3"]);
            let a = lifeline(&model, "A");
            let b = lifeline(&model, "B");
            // A start 0, A call 30, B start 50, B call 80, A ret 100
            assert_eq!(a.entities()[1].y(), YPos::new(30));
            assert_eq!(b.entities()[1].y(), YPos::new(80));
            assert_eq!(a.entities()[2].y(), YPos::new(100));
            assert_eq!(model.get_height(), 110.0);
        }

        #[test]
        fn free_running_lifelines_start_at_top() {
            let mut model = SequenceModel::new(LayoutPolicy::FreeRunning, LayoutParams::default());
            ingest_all(&mut model, &["CAL A 1 a", "CAL B 2 b"]);
            assert_eq!(lifeline(&model, "A").entities()[1].y(), YPos::new(30));
            assert_eq!(lifeline(&model, "B").entities()[1].y(), YPos::new(30));
            assert_eq!(model.get_height(), 50.0);
        }

        #[test]
        fn terminate_advances_global_clock() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["CAL A 1 a", "TRM A"]);
            assert_eq!(model.get_height(), 60.0);
        }

        #[test]
        fn width_tracks_highest_lane() {
            let mut model = SequenceModel::default();
            assert_eq!(model.get_width(), 0.0);
            ingest_all(&mut model, &["CAL A 1 a", "CAL B 1 b"]);
            assert_eq!(model.get_width(), model.layout_params().width_for(Some(Lane::new(1))));
        }
    }

    mod pairing {
        use super::*;

        #[test]
        fn send_then_recv_completes() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["SND t1 1 m1", "RCV t2 2 m1"]);
            assert_eq!(model.communications().len(), 1);
            let comm = &model.communications()[0];
            assert!(comm.is_complete());
            assert_eq!(comm.send().unwrap().lifeline, lifeline(&model, "t1").key());
            assert_eq!(comm.recv().unwrap().lifeline, lifeline(&model, "t2").key());
        }

        #[test]
        fn completed_id_reuse_starts_fresh() {
            let mut model = SequenceModel::default();
            ingest_all(
                &mut model,
                &["SND t1 1 m1", "RCV t2 2 m1", "SND t1 3 m1"],
            );
            assert_eq!(model.communications().len(), 2);
            let latest = model.communication_for(&CorrelationId::new("m1")).unwrap();
            assert!(!latest.is_complete());
        }

        #[test]
        fn entities_link_to_their_communication() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["RCV t2 1 m2", "SND t1 2 m2"]);
            let t1 = lifeline(&model, "t1");
            let send = t1.entities().last().unwrap();
            assert_eq!(send.communication(), Some(CommunicationId::new(0)));
        }
    }

    mod groups {
        use super::*;

        #[test]
        fn allocates_sequential_tags() {
            let mut model = SequenceModel::default();
            assert_eq!(model.allocate_source_group().as_str(), "g1");
            assert_eq!(model.allocate_source_group().as_str(), "g2");
        }

        #[test]
        fn terminate_group_ends_only_that_group() {
            let mut model = SequenceModel::default();
            let a = model.allocate_source_group();
            let b = model.allocate_source_group();
            model.ingest("CAL t1 1 f", &a);
            model.ingest("CAL t2 1 f", &a);
            model.ingest("CAL t1 1 f", &b);
            assert_eq!(model.terminate_group(&a), 2);
            let live: Vec<bool> = model.lifelines().iter().map(|l| l.is_terminated()).collect();
            assert_eq!(live, vec![true, true, false]);
            assert_eq!(model.terminate_group(&a), 0);
        }

        #[test]
        fn terminate_group_is_journaled() {
            let mut model = SequenceModel::default();
            let a = model.allocate_source_group();
            model.ingest("CAL t1 1 f", &a);
            model.terminate_group(&a);
            let last = model.journal().lines().last().unwrap();
            assert_eq!(last, "TRM g1/t1");
        }

        #[test]
        fn replayed_groups_are_not_reissued() {
            let mut model = SequenceModel::default();
            model.ingest("CAL g4/t1 1 f", &SourceGroup::unscoped());
            assert_eq!(model.allocate_source_group().as_str(), "g5");
        }

        #[test]
        fn replayed_id_is_not_shared_with_live_group() {
            // GIVEN: a live source tagged g1 and a replayed, finished g1/t1
            let mut model = SequenceModel::default();
            let live = model.allocate_source_group();
            let replay = SourceGroup::unscoped();
            model.ingest("CAL g1/t1 1 old", &replay);
            model.ingest("TRM g1/t1", &replay);

            // WHEN: the live source speaks as t1
            let outcome = model.ingest("CAL t1 2 live", &live);

            // THEN: it gets a lifeline of its own
            assert_eq!(outcome, IngestOutcome::Applied(CommandKind::Call));
            assert_eq!(model.lifelines().len(), 2);
            let fresh = &model.lifelines()[1];
            assert_eq!(fresh.id().as_str(), "g1/t1~2");
            assert_eq!(fresh.group(), &live);
            assert!(!fresh.is_terminated());
            assert_eq!(
                model.ingest("RET t1 3", &live),
                IngestOutcome::Applied(CommandKind::Return)
            );
            assert_eq!(model.terminate_group(&live), 1);
            assert!(model.lifelines().iter().all(Lifeline::is_terminated));
        }

        #[test]
        fn live_lifeline_is_not_joined_by_replay() {
            let mut model = SequenceModel::default();
            let live = model.allocate_source_group();
            model.ingest("CAL t1 1 live", &live);
            model.ingest("CAL g1/t1 2 old", &SourceGroup::unscoped());

            assert_eq!(model.lifelines().len(), 2);
            assert_eq!(model.lifelines()[0].depth(), 1);
            assert_eq!(model.lifelines()[1].id().as_str(), "g1/t1~2");
            assert_eq!(model.terminate_group(&live), 1);
            assert!(!model.lifelines()[1].is_terminated());
        }

        #[test]
        fn reserved_alias_is_not_taken_by_its_raw_spelling() {
            // GIVEN: a replayed TRM that reserved g1/t1~2 without creating it
            let mut model = SequenceModel::default();
            let live = model.allocate_source_group();
            let replay = SourceGroup::unscoped();
            model.ingest("CAL t1 1 live", &live);
            model.ingest("TRM g1/t1", &replay);

            // WHEN: the live group spells that id itself, then the replay calls
            model.ingest("CAL t1~2 2 x", &live);
            model.ingest("CAL g1/t1 3 y", &replay);

            // THEN: three lifelines, each owned by exactly one group
            let owners: Vec<(&str, bool)> = model
                .lifelines()
                .iter()
                .map(|l| (l.id().as_str(), l.group().is_unscoped()))
                .collect();
            assert_eq!(
                owners,
                vec![("g1/t1", false), ("g1/t1~2~2", false), ("g1/t1~2", true)]
            );
            assert_eq!(model.terminate_group(&live), 2);
        }

        #[test]
        fn aliased_lines_replay_to_the_same_shape() {
            let mut model = SequenceModel::default();
            let live = model.allocate_source_group();
            let replay = SourceGroup::unscoped();
            model.ingest("CAL g1/t1 1 old", &replay);
            model.ingest("CAL t1 2 live", &live);
            model.terminate_group(&live);

            let mut again = SequenceModel::default();
            for line in model.journal().lines() {
                again.ingest(&line, &replay);
            }
            let ids: Vec<&str> = again.lifelines().iter().map(|l| l.id().as_str()).collect();
            assert_eq!(ids, vec!["g1/t1", "g1/t1~2"]);
            assert!(again.lifelines()[1].is_terminated());
        }
    }

    mod selection {
        use super::*;
        use crate::view_state::{Anchor, DrawPrimitive};

        #[test]
        fn click_then_draw_selects_frame() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["CAL t1 1 Foo", "RET t1 2"]);
            let x = model.layout_params().bar_xpos(0, Lane::new(0), Anchor::Center);
            let viewport = Viewport::new(0.0, 0.0, 400.0, 100.0);
            model.set_click_point(x, 40.0);
            let mut prims: Vec<DrawPrimitive> = Vec::new();
            model.draw(viewport, &mut prims);
            let selected = model.get_selected_object();
            assert!(
                matches!(selected, Some(SelectedObject::Frame(f)) if f.frame == FrameId::new(0))
            );
            let info = model.get_info_text(selected.unwrap()).unwrap();
            assert!(info.starts_with("call Foo on t1"));
        }

        #[test]
        fn click_on_empty_space_clears_selection() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["CAL t1 1 Foo", "RET t1 2"]);
            model.set_selected_object(Some(SelectedObject::Communication(CommunicationId::new(0))));
            model.set_click_point(390.0, 95.0);
            let mut prims: Vec<DrawPrimitive> = Vec::new();
            model.draw(Viewport::new(0.0, 0.0, 400.0, 100.0), &mut prims);
            assert_eq!(model.get_selected_object(), None);
        }

        #[test]
        fn entity_info_lists_stack_and_annotations() {
            let mut model = SequenceModel::default();
            ingest_all(
                &mut model,
                &["CAL t1 1 outer", "CAL t1 2 inner", "INF t1 hello world"],
            );
            let t1 = lifeline(&model, "t1");
            let entity = EntityRef {
                lifeline: t1.key(),
                entity: crate::model::EntityIndex::new(2),
            };
            let info = model.get_info_text(SelectedObject::Entity(entity)).unwrap();
            assert!(info.contains("stack: outer > inner"));
            assert!(info.contains("hello world"));
        }

        #[test]
        fn communication_info_reports_not_ready() {
            let mut model = SequenceModel::default();
            ingest_all(&mut model, &["SND t1 1 m9"]);
            let info = model
                .get_info_text(SelectedObject::Communication(CommunicationId::new(0)))
                .unwrap();
            assert!(info.contains("recv: not ready"));
        }
    }
}
