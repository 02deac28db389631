//! Picker roundtrip: the output file's non-empty lines are exactly the
//! selection set (FILES) or the focused entry (FILE/DIR) at Enter time.

use minase::app::pane::PaneState;
use minase::app::types::{FilterKind, PickerMode, SortKey, SortOrder, ViewStyle};
use minase::runner::picker;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

static SELECTION_LOCK: Mutex<()> = Mutex::new(());

fn pane(dir: &Path) -> PaneState {
    PaneState::new(
        dir,
        ViewStyle::Simple,
        SortKey::Name,
        SortOrder::Ascending,
        FilterKind::Substring,
    )
    .unwrap()
}

#[test]
fn files_mode_roundtrips_the_selection_set() {
    let _guard = SELECTION_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    for i in 0..7 {
        fs::write(tmp.path().join(format!("f{}", i)), b"").unwrap();
    }
    PaneState::clear_selection();

    let p = pane(tmp.path());
    let mut expected = BTreeSet::new();
    for i in [0usize, 2, 5] {
        let e = p.entry(i);
        expected.insert(e.path().display().to_string());
        PaneState::select(&e);
    }

    let out = out_dir.path().join("chosen");
    assert!(picker::write_output(PickerMode::Files, &out, &p).unwrap());

    let got: BTreeSet<String> = fs::read_to_string(&out)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect();
    assert_eq!(got, expected);
    PaneState::clear_selection();
}

#[test]
fn file_mode_writes_exactly_the_focused_entry() {
    let _guard = SELECTION_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("picked"), b"").unwrap();
    PaneState::clear_selection();

    let p = pane(tmp.path());
    let out = out_dir.path().join("chosen");
    assert!(picker::write_output(PickerMode::File, &out, &p).unwrap());
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        format!("{}\n", tmp.path().join("picked").display())
    );
}

#[test]
fn dir_mode_requires_a_directory_under_the_cursor() {
    let _guard = SELECTION_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a-file"), b"").unwrap();
    fs::create_dir(tmp.path().join("z-dir")).unwrap();
    PaneState::clear_selection();

    let mut p = pane(tmp.path());
    // Cursor starts on "z-dir" (directories sort first).
    let out = out_dir.path().join("chosen");
    assert!(picker::write_output(PickerMode::Dir, &out, &p).unwrap());

    p.set_cursor(1); // "a-file"
    assert!(!picker::write_output(PickerMode::Dir, &out, &p).unwrap());
    assert!(picker::write_output(PickerMode::File, &out, &p).unwrap());
}
