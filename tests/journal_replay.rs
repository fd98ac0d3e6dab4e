//! Saving the journal and reading it back reproduces the model.

use vizexec::model::{IngestOutcome, SequenceModel, SourceGroup};

const TRACE: &[&str] = &[
    "# session start",
    r#"CAL main 100 "run loop""#,
    r#"TNM main "main thread""#,
    "SND main 110 req-1",
    r#"CAL worker 105 "handle request""#,
    "RCV worker 112 req-1",
    r#"PHS worker 120 "encode reply""#,
    r#"INF worker "payload 3 KiB""#,
    "SND worker 130 rsp-1",
    "RET worker 131",
    "RCV main 133 rsp-1",
    "EVT main 140 tick",
    "RET main 150",
    "TRM worker",
];

fn journal_lines(model: &SequenceModel) -> Vec<String> {
    let mut out = Vec::new();
    model.write_journal(&mut out).expect("write journal");
    String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(str::to_string)
        .collect()
}

fn replay(lines: &[String]) -> SequenceModel {
    let mut model = SequenceModel::default();
    let group = SourceGroup::unscoped();
    for line in lines {
        model.ingest(line, &group);
    }
    model
}

fn assert_same_shape(a: &SequenceModel, b: &SequenceModel) {
    assert_same_shape_under(a, b, "");
}

/// Like `assert_same_shape`, with every id of `b` carrying `prefix`.
fn assert_same_shape_under(a: &SequenceModel, b: &SequenceModel, prefix: &str) {
    assert_eq!(a.lifelines().len(), b.lifelines().len());
    for (x, y) in a.lifelines().iter().zip(b.lifelines()) {
        assert_eq!(format!("{}{}", prefix, x.id()), y.id().as_str());
        assert_eq!(x.display_name(), y.display_name());
        assert_eq!(x.lane(), y.lane());
        assert_eq!(x.depth(), y.depth());
        assert_eq!(x.is_terminated(), y.is_terminated());
        assert_eq!(x.entities().len(), y.entities().len());
        for (ex, ey) in x.entities().iter().zip(y.entities()) {
            assert_eq!(ex.kind(), ey.kind());
            assert_eq!(ex.y(), ey.y());
            assert_eq!(ex.depth(), ey.depth());
            assert_eq!(ex.label(), ey.label());
            assert_eq!(ex.info(), ey.info());
        }
    }
    let complete = |m: &SequenceModel| {
        m.communications()
            .iter()
            .filter(|c| c.is_complete())
            .count()
    };
    assert_eq!(complete(a), complete(b));
}

#[test]
fn replay_of_unscoped_trace_matches() {
    let mut original = SequenceModel::default();
    let group = SourceGroup::unscoped();
    for line in TRACE {
        original.ingest(line, &group);
    }

    let journal = journal_lines(&original);
    assert_eq!(journal.len(), TRACE.len());
    assert_eq!(journal[0], "# session start");

    let replayed = replay(&journal);
    assert_same_shape(&original, &replayed);
    assert_eq!(journal_lines(&replayed), journal);
}

#[test]
fn replay_keeps_qualified_ids_of_scoped_sources() {
    // GIVEN two sources whose thread ids collide
    let mut original = SequenceModel::default();
    let g1 = original.allocate_source_group();
    let g2 = original.allocate_source_group();
    for line in ["CAL t1 1 a", "SND t1 2 x"] {
        original.ingest(line, &g1);
    }
    for line in ["CAL t1 1 b", "RCV t1 3 x", "RET t1 4"] {
        original.ingest(line, &g2);
    }
    assert_eq!(original.lifelines().len(), 2);

    // WHEN the journal is read back without a group
    let replayed = replay(&journal_lines(&original));

    // THEN the lifelines stay apart under their qualified ids
    assert_same_shape(&original, &replayed);
    let ids: Vec<&str> = replayed.lifelines().iter().map(|l| l.id().as_str()).collect();
    assert_eq!(ids, vec!["g1/t1", "g2/t1"]);

    // AND new groups do not collide with the replayed ones
    let mut replayed = replayed;
    assert_eq!(replayed.allocate_source_group().as_str(), "g3");
}

#[test]
fn rejected_lines_survive_the_round_trip() {
    let mut original = SequenceModel::default();
    let group = SourceGroup::unscoped();
    let outcomes: Vec<IngestOutcome> = ["CAL t1 x main", "RET t1 1", "CAL t1 2 main"]
        .iter()
        .map(|l| original.ingest(l, &group))
        .collect();
    assert!(!outcomes[0].is_applied());
    assert!(!outcomes[1].is_applied());

    let journal = journal_lines(&original);
    assert_eq!(journal.len(), 3);
    let replayed = replay(&journal);
    assert_same_shape(&original, &replayed);
}

#[test]
fn saved_file_reloads_through_file_source() {
    use vizexec::model::SharedModel;
    use vizexec::source::{spawn_file_source, FileSourceOptions};

    let mut original = SequenceModel::default();
    let group = SourceGroup::unscoped();
    for line in TRACE {
        original.ingest(line, &group);
    }

    let dir = std::env::temp_dir().join(format!("vizexec_replay_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("saved.log");
    original.save_journal(&path).unwrap();

    // a reopened file is a source like any other and gets its own group
    let shared = SharedModel::new(SequenceModel::default());
    let stats = spawn_file_source(&path, shared.clone(), FileSourceOptions::default())
        .unwrap()
        .join();
    assert_eq!(stats.lines, TRACE.len() as u64);
    assert_eq!(stats.rejected, 0);

    assert_same_shape_under(&original, &shared.lock(), "g1/");
    let _ = std::fs::remove_dir_all(&dir);
}
