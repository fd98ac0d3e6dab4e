//! Property-based tests for model and traversal invariants.
//!
//! Tests validate:
//! 1. Stack depth always matches the open frames, whatever the input order
//! 2. Entity positions strictly increase along every lifeline
//! 3. Message pairing does not depend on arrival order
//! 4. Live lifelines never share a lane
//! 5. A viewport starting inside a call still shows that call's bar

use proptest::prelude::*;
use std::collections::HashSet;
use vizexec::model::{EntityKind, LifelineId, SequenceModel, SourceGroup};
use vizexec::view_state::{Color, DrawPrimitive, Viewport};

#[derive(Debug, Clone)]
enum Op {
    Call(usize),
    Ret(usize),
    Phase(usize),
    Event(usize),
    Terminate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..4usize).prop_map(Op::Call),
        4 => (0..4usize).prop_map(Op::Ret),
        1 => (0..4usize).prop_map(Op::Phase),
        2 => (0..4usize).prop_map(Op::Event),
        1 => (0..4usize).prop_map(Op::Terminate),
    ]
}

fn line(op: &Op, time: usize) -> String {
    match op {
        Op::Call(t) => format!("CAL t{} {} f{}", t, time, time),
        Op::Ret(t) => format!("RET t{} {}", t, time),
        Op::Phase(t) => format!("PHS t{} {} p{}", t, time, time),
        Op::Event(t) => format!("EVT t{} {} e", t, time),
        Op::Terminate(t) => format!("TRM t{}", t),
    }
}

fn run(ops: &[Op]) -> SequenceModel {
    let mut model = SequenceModel::default();
    let group = SourceGroup::unscoped();
    for (time, op) in ops.iter().enumerate() {
        model.ingest(&line(op, time), &group);
    }
    model
}

// ===== Property 1 and 2: Stack and Position Invariants =====

proptest! {
    #[test]
    fn depth_matches_open_frames(ops in prop::collection::vec(op(), 0..200)) {
        let model = run(&ops);
        for lifeline in model.lifelines() {
            let open = lifeline.frames().iter().filter(|f| f.is_open()).count();
            prop_assert_eq!(lifeline.depth(), open);
            if lifeline.is_terminated() {
                prop_assert_eq!(lifeline.depth(), 0);
            }
            for entity in lifeline.entities() {
                prop_assert_eq!(entity.depth(), entity.stack().len());
            }
        }
        // every line is journaled, applied or not
        prop_assert_eq!(model.journal().len(), ops.len());
    }

    #[test]
    fn positions_strictly_increase(ops in prop::collection::vec(op(), 0..200)) {
        let model = run(&ops);
        for lifeline in model.lifelines() {
            let ys: Vec<u64> = lifeline.entities().iter().map(|e| e.y().get()).collect();
            prop_assert!(ys.windows(2).all(|w| w[0] < w[1]), "{:?}", ys);
            prop_assert!(ys.last().copied().unwrap_or(0) as f64 <= model.get_height());
        }
    }

    #[test]
    fn depth_counts_unmatched_calls(calls in 0usize..20, rets in 0usize..30) {
        let ops: Vec<Op> = std::iter::repeat_n(Op::Call(0), calls)
            .chain(std::iter::repeat_n(Op::Ret(0), rets))
            .collect();
        let model = run(&ops);
        if let Some(lifeline) = model.lifeline_by_id(&LifelineId::new("t0")) {
            prop_assert_eq!(lifeline.depth(), calls.saturating_sub(rets));
            let returns = lifeline
                .entities()
                .iter()
                .filter(|e| e.kind() == EntityKind::Return)
                .count();
            prop_assert_eq!(returns, rets.min(calls));
        }
    }
}

// ===== Property 3: Pairing Order Independence =====

proptest! {
    #[test]
    fn pairing_ignores_arrival_order(
        lines in (1usize..20).prop_flat_map(|n| {
            let mut lines = Vec::new();
            for i in 0..n {
                lines.push(format!("SND sender {} m{}", i, i));
                lines.push(format!("RCV receiver {} m{}", i, i));
            }
            Just(lines).prop_shuffle()
        })
    ) {
        let mut model = SequenceModel::default();
        let group = SourceGroup::unscoped();
        for line in &lines {
            model.ingest(line, &group);
        }
        prop_assert_eq!(model.communications().len(), lines.len() / 2);
        for comm in model.communications() {
            let (Some(send), Some(recv)) = (comm.send(), comm.recv()) else {
                return Err(TestCaseError::fail("unpaired communication"));
            };
            let sender = model.lifeline(send.lifeline).unwrap();
            let receiver = model.lifeline(recv.lifeline).unwrap();
            prop_assert_eq!(sender.id().as_str(), "sender");
            prop_assert_eq!(receiver.id().as_str(), "receiver");
            prop_assert_eq!(
                sender.entity(send.entity).unwrap().label(),
                Some(comm.correlation().as_str())
            );
        }
    }
}

// ===== Property 4: Lane Uniqueness =====

proptest! {
    #[test]
    fn live_lifelines_have_distinct_lanes(ops in prop::collection::vec(op(), 0..200)) {
        let mut model = SequenceModel::default();
        let group = SourceGroup::unscoped();
        for (time, op) in ops.iter().enumerate() {
            model.ingest(&line(op, time), &group);
            let mut lanes = HashSet::new();
            for lifeline in model.lifelines().iter().filter(|l| !l.is_terminated()) {
                prop_assert!(lanes.insert(lifeline.lane()), "lane {:?} shared", lifeline.lane());
            }
        }
    }
}

// ===== Property 5: Open Bars at the Viewport Top =====

proptest! {
    #[test]
    fn bar_open_above_viewport_is_drawn(events in 1usize..40, offset in 0u64..10_000) {
        let mut model = SequenceModel::default();
        let group = SourceGroup::unscoped();
        model.ingest("CAL t1 0 outer", &group);
        for i in 0..events {
            model.ingest(&format!("EVT t1 {} tick", i + 1), &group);
        }
        model.ingest("RET t1 1000", &group);

        let lifeline = &model.lifelines()[0];
        let call_y = lifeline.entities()[1].y().get();
        let ret_y = lifeline.entities().last().unwrap().y().get();
        prop_assume!(ret_y > call_y + 1);
        let top = call_y + 1 + offset % (ret_y - call_y - 1);

        let viewport = Viewport::new(0.0, top as f64, model.get_width(), 50.0);
        let mut primitives: Vec<DrawPrimitive> = Vec::new();
        model.draw(viewport, &mut primitives);

        let bar = primitives.iter().find_map(|p| match p {
            DrawPrimitive::Rect { rect, style } if style.fill == Some(Color::BAR) => Some(*rect),
            _ => None,
        });
        let Some(bar) = bar else {
            return Err(TestCaseError::fail("no call bar painted"));
        };
        prop_assert!(bar.y <= 0.0, "bar starts below the viewport top: {:?}", bar);
        prop_assert!(bar.bottom() > 0.0);
    }
}
