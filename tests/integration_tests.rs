// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for scoreparts
//!
//! These tests drive the editor through its public API on scores loaded from
//! YAML, the way the command line tool does.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use scoreparts::score::{Instrument, InstrumentId, PartId, StaffId, Tick};
use scoreparts::{Channel, ChangeEvent, EditScript, InsertMode, PartsEditor, ScoreFile, ScoreView};

const ORCHESTRA: &str = r#"
score:
  title: Test
  measures: 3
parts:
  - id: flute
    instruments:
      - { id: flute, name: Flute }
  - id: violin
    instruments:
      - { id: violin, name: Violin }
    staves:
      - id: vn-1
        notes:
          - { tick: 0, duration: 1920, pitches: [67] }
          - { tick: 1920, duration: 960, pitches: [69, 72] }
          - { tick: 2880, duration: 960 }
          - { tick: 3840, duration: 1920, pitches: [71] }
  - id: piano
    instruments:
      - { id: piano, name: Piano, staff_count: 2 }
  - id: cello
    instruments:
      - { id: cello, name: Cello }
excerpts:
  - title: Strings
    parts: [violin, cello]
  - title: Winds
    parts: [flute]
"#;

fn orchestra() -> PartsEditor {
    let file = ScoreFile::from_yaml(ORCHESTRA).expect("valid score yaml");
    PartsEditor::new(file.build(100).expect("score builds"))
}

fn record<E: Clone + 'static>(channel: &Channel<E>) -> Rc<RefCell<Vec<E>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    channel.subscribe(move |e: &E| sink.borrow_mut().push(e.clone()));
    seen
}

fn part_order(editor: &PartsEditor) -> Vec<String> {
    editor
        .current_score()
        .parts()
        .iter()
        .map(|p| p.id.to_string())
        .collect()
}

fn mapping(editor: &PartsEditor, part: &str) -> Vec<(Tick, String)> {
    editor
        .current_score()
        .part(&PartId::from(part))
        .map(|p| p.instruments.iter().map(|(t, i)| (*t, i.id.to_string())).collect())
        .unwrap_or_default()
}

/// Musical content of a staff, without element ids
fn content(editor: &PartsEditor, staff: &StaffId) -> Vec<(Tick, Tick, usize, Vec<u8>)> {
    editor
        .current_score()
        .staff_content(staff)
        .iter()
        .map(|cr| (cr.tick, cr.duration, cr.voice, cr.pitches.clone()))
        .collect()
}

fn instruments(names: &[&str]) -> Vec<Instrument> {
    names.iter().map(|n| Instrument::new(*n, *n)).collect()
}

/// Replacing the instrument set twice with the same list changes nothing the
/// second time, whatever the list order
#[test]
fn test_set_instruments_twice_is_idempotent() {
    let pool = ["flute", "violin", "piano", "cello", "oboe", "horn"];
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..12 {
        let mut names = pool.to_vec();
        names.shuffle(&mut rng);
        let keep = 1 + (names.len() - 1) * 2 / 3;
        let target = instruments(&names[..keep]);

        let mut editor = orchestra();
        editor.set_instruments(&target);
        let after_first = editor.current_score().clone();
        let steps = editor.score().undo_stack().undo_count();

        let structure = record(&editor.parts_changed());
        let parts = record(editor.part_list().notifier().expect("parts channel"));
        editor.set_instruments(&target);

        assert_eq!(editor.current_score(), &after_first, "order {:?}", names);
        assert_eq!(editor.score().undo_stack().undo_count(), steps);
        assert!(structure.borrow().is_empty());
        assert!(parts.borrow().is_empty());

        let primaries: Vec<&str> = editor
            .current_score()
            .parts()
            .iter()
            .filter_map(|p| p.instrument_id().map(InstrumentId::as_str))
            .collect();
        assert_eq!(primaries, names[..keep].to_vec());
    }
}

/// A part whose every instrument leaves the set leaves the part list
#[test]
fn test_emptied_part_is_removed() {
    let mut editor = orchestra();
    editor.set_instruments(&instruments(&["flute", "violin", "cello"]));

    assert_eq!(part_order(&editor), vec!["flute", "violin", "cello"]);
    assert!(!editor.part_list().iter().any(|p| p.id.as_str() == "piano"));
}

#[test]
fn test_part_list_has_unique_ids() {
    let editor = orchestra();
    let listed: Vec<String> = editor.part_list().iter().map(|p| p.id.to_string()).collect();
    assert_eq!(listed, vec!["flute", "violin", "piano", "cello"]);
}

/// Moving staves between parts keeps the staff count and the content
#[test]
fn test_move_staves_preserves_count_and_content() {
    let mut editor = orchestra();
    let violin_staff = StaffId::from("vn-1");
    let before = content(&editor, &violin_staff);
    let piano = PartId::from("piano");
    let piano_staves: Vec<StaffId> = editor
        .current_score()
        .part_staves(&piano)
        .iter()
        .map(|s| s.id.clone())
        .collect();
    let total = editor.current_score().nstaves();

    editor.move_staves(&[violin_staff.clone()], &piano_staves[1], InsertMode::Before);

    let score = editor.current_score();
    assert_eq!(score.nstaves(), total);
    assert!(score.staff(&violin_staff).is_none());
    assert!(score.part_staves(&PartId::from("violin")).is_empty());

    let staves: Vec<StaffId> = score.part_staves(&piano).iter().map(|s| s.id.clone()).collect();
    assert_eq!(staves.len(), 3);
    assert_eq!(staves[0], piano_staves[0]);
    assert_eq!(staves[2], piano_staves[1]);
    assert_eq!(content(&editor, &staves[1]), before);
    assert_eq!(score.staff(&staves[1]).map(|s| s.part.clone()), Some(piano));
}

#[test]
fn test_move_staves_after_keeps_links() {
    let mut editor = orchestra();
    let violin = PartId::from("violin");
    let cello_staff = editor.current_score().part_staves(&PartId::from("cello"))[0].id.clone();

    editor.append_linked_staff(&StaffId::from("vn-1"));
    let linked = editor.current_score().part_staves(&violin)[1].id.clone();
    editor.move_staves(&[linked.clone()], &cello_staff, InsertMode::After);

    let score = editor.current_score();
    let moved = score.part_staves(&PartId::from("cello"))[1];
    assert!(moved.is_linked());
    assert_eq!(
        score.linked_staves(&StaffId::from("vn-1")).iter().map(|s| s.id.clone()).collect::<Vec<_>>(),
        vec![moved.id.clone()]
    );
    assert_eq!(content(&editor, &moved.id), content(&editor, &StaffId::from("vn-1")));
}

/// Doubling always lands after every existing tick
#[test]
fn test_doubling_tick_exceeds_existing_ticks() {
    let mut editor = orchestra();
    let cello = PartId::from("cello");
    let mut rng = StdRng::seed_from_u64(42);

    for round in 0..8 {
        let before: Vec<Tick> = mapping(&editor, "cello").iter().map(|(t, _)| *t).collect();
        let id = format!("double-{}", round);
        editor.append_doubling_instrument(Instrument::new(id.as_str(), "Double"), &cello);

        let after = mapping(&editor, "cello");
        assert_eq!(after.len(), before.len() + 1);
        let (tick, added) = after.last().cloned().expect("entry added");
        assert_eq!(added, id);
        assert!(before.iter().all(|t| tick > *t));

        // Occasionally anchor the newest entry further along
        if rng.gen_bool(0.5) {
            let target: Tick = 1920 * (1 + round % 2);
            if let Some(rest) = editor.current_score().chord_rest_at(&cello, target) {
                let rest = rest.id;
                editor.set_selection(vec![rest]);
                editor.assign_instrument_to_selected_chord(&InstrumentId::from(id.as_str()), &cello);
            }
        }
    }
}

/// Violin gains a viola one tick after its last entry, with a part change
/// and an instrument-added notification
#[test]
fn test_violin_doubles_viola() {
    let mut editor = orchestra();
    let violin = PartId::from("violin");
    let parts = record(editor.part_list().notifier().expect("parts channel"));
    let instrument_list = editor.instrument_list(&violin);
    let added = record(instrument_list.notifier().expect("instrument channel"));
    let structure = record(&editor.parts_changed());

    let viola = Instrument::new("viola", "Viola");
    editor.append_doubling_instrument(viola.clone(), &violin);

    assert_eq!(mapping(&editor, "violin"), vec![(0, "violin".to_string()), (1, "viola".to_string())]);
    assert_eq!(*added.borrow(), vec![ChangeEvent::Added(viola)]);
    assert_eq!(parts.borrow().len(), 1);
    assert!(matches!(&parts.borrow()[0], ChangeEvent::Changed(p) if p.id == violin));
    assert_eq!(structure.borrow().len(), 1);
}

/// Removing the viola leaves the primary violin; emptying the set through
/// the instrument list removes the part
#[test]
fn test_remove_viola_then_violin() {
    let mut editor = orchestra();
    let violin = PartId::from("violin");
    editor.append_doubling_instrument(Instrument::new("viola", "Viola"), &violin);

    editor.remove_instruments(&[InstrumentId::from("viola")], &violin);
    assert_eq!(mapping(&editor, "violin"), vec![(0, "violin".to_string())]);

    editor.set_instruments(&instruments(&["flute", "piano", "cello"]));
    assert!(editor.current_score().part(&violin).is_none());
    let strings = &editor.score().excerpts()[0];
    assert_eq!(strings.title, "Strings");
    assert!(strings.score.part(&violin).is_none());
}

/// Moving an instrument before another part's instrument puts it in front,
/// bumping the colliding tick
#[test]
fn test_move_instrument_before_destination() {
    let mut editor = orchestra();
    let flute = PartId::from("flute");
    let cello = PartId::from("cello");
    editor.append_doubling_instrument(Instrument::new("piccolo", "Piccolo"), &flute);
    editor.append_doubling_instrument(Instrument::new("bass", "Bass"), &cello);

    editor.move_instruments(
        &[InstrumentId::from("piccolo")],
        &flute,
        &cello,
        &InstrumentId::from("bass"),
        InsertMode::Before,
    );

    let cello_map = mapping(&editor, "cello");
    let ids: Vec<&str> = cello_map.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(ids, vec!["cello", "piccolo", "bass"]);
    let ticks: Vec<Tick> = cello_map.iter().map(|(t, _)| *t).collect();
    assert_eq!(ticks, vec![0, 1, 2]);
    assert_eq!(mapping(&editor, "flute"), vec![(0, "flute".to_string())]);
}

#[test]
fn test_one_undo_step_per_operation() {
    let mut editor = orchestra();
    let original = editor.current_score().clone();

    editor.move_parts(&[PartId::from("cello")], &PartId::from("flute"), InsertMode::Before);
    editor.set_part_name(&PartId::from("piano"), "Keys");
    assert_eq!(part_order(&editor), vec!["cello", "flute", "violin", "piano"]);
    assert_eq!(editor.score().undo_stack().undo_count(), 2);

    editor.undo();
    editor.undo();
    assert_eq!(editor.current_score(), &original);

    editor.redo();
    assert_eq!(part_order(&editor), vec!["cello", "flute", "violin", "piano"]);
}

#[test]
fn test_excerpt_view_edits_stay_local() {
    let mut editor = orchestra();
    let strings = editor.score().excerpts()[0].id;
    editor.set_current_view(ScoreView::Excerpt(strings));

    editor.set_staff_visible(&StaffId::from("vn-1"), false);
    editor.move_parts(&[PartId::from("cello")], &PartId::from("violin"), InsertMode::Before);

    assert_eq!(part_order(&editor), vec!["cello", "violin"]);
    editor.set_current_view(ScoreView::Master);
    assert_eq!(part_order(&editor), vec!["flute", "violin", "piano", "cello"]);
    assert!(editor.current_score().staff(&StaffId::from("vn-1")).map_or(false, |s| s.visible));
}

#[test]
fn test_script_round_trip_through_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let score_path = dir.path().join("score.yaml");
    let script_path = dir.path().join("script.yaml");
    std::fs::write(&score_path, ORCHESTRA).expect("write score");
    std::fs::write(
        &script_path,
        r#"
ops:
  - op: append_doubling_instrument
    part: violin
    instrument: { id: viola, name: Viola }
  - op: remove_parts
    parts: [piano]
  - op: set_view
    excerpt: Winds
  - op: set_part_name
    part: flute
    name: Flauto
"#,
    )
    .expect("write script");

    let file = ScoreFile::load(&score_path).expect("load score");
    let mut editor = PartsEditor::new(file.build(100).expect("build"));
    let applied = EditScript::load(&script_path)
        .expect("load script")
        .apply(&mut editor)
        .expect("apply");
    assert_eq!(applied, 4);

    let saved = ScoreFile::from_score(editor.score());
    let out = dir.path().join("out.yaml");
    saved.save(&out).expect("save");
    let reloaded = ScoreFile::load(&out).expect("reload");

    let ids: Vec<&str> = reloaded.parts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["flute", "violin", "cello"]);
    assert_eq!(reloaded.parts[1].name.as_deref(), Some("Violin & Viola"));
    assert_eq!(reloaded.parts[0].name.as_deref(), Some("Flute"));
    assert_eq!(reloaded.excerpts.len(), 2);
}
