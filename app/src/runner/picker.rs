//! File-chooser output: when started with `--choosefile`/`--choosefiles`/
//! `--choosedir`, Enter writes the chosen path(s) to the caller's output
//! file and the program exits cleanly.

use std::fs;
use std::io;
use std::path::Path;

use crate::app::pane::PaneState;
use crate::app::types::PickerMode;

/// Write the picker result for the focused pane. Returns `Ok(true)` when
/// something was written and the program should exit.
///
/// FILES mode prefers the selection set (one absolute path per line);
/// with no selection every mode falls back to the focused entry, which
/// must be a file for FILE mode and a directory for DIR mode.
pub fn write_output(mode: PickerMode, output: &Path, pane: &PaneState) -> io::Result<bool> {
    if mode == PickerMode::Files {
        let selected = PaneState::selected_paths();
        if !selected.is_empty() {
            let mut body = String::new();
            for path in &selected {
                body.push_str(&path.to_string_lossy());
                body.push('\n');
            }
            fs::write(output, body)?;
            return Ok(true);
        }
    }

    let Some(entry) = pane.current() else {
        return Ok(false);
    };
    let eligible = match mode {
        PickerMode::File => !entry.is_dir(),
        PickerMode::Dir => entry.is_dir(),
        PickerMode::Files => true,
        PickerMode::None => false,
    };
    if !eligible {
        return Ok(false);
    }

    fs::write(output, format!("{}\n", entry.path().display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::types::{FilterKind, SortKey, SortOrder, ViewStyle};

    fn pane_for(dir: &Path) -> PaneState {
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
    fn files_mode_writes_selection_lines() {
        let _guard = crate::app::pane::selection_test_guard();
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        fs::write(tmp.path().join("b"), b"").unwrap();
        PaneState::clear_selection();

        let pane = pane_for(tmp.path());
        PaneState::select(&pane.entry(0));
        PaneState::select(&pane.entry(1));

        let out = tmp.path().join("out");
        assert!(write_output(PickerMode::Files, &out, &pane).unwrap());

        let body = fs::read_to_string(&out).unwrap();
        let mut lines: Vec<&str> = body.lines().filter(|l| !l.is_empty()).collect();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                tmp.path().join("a").to_str().unwrap(),
                tmp.path().join("b").to_str().unwrap()
            ]
        );
        PaneState::clear_selection();
    }

    #[test]
    fn files_mode_falls_back_to_focused_entry() {
        let _guard = crate::app::pane::selection_test_guard();
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("only"), b"").unwrap();
        PaneState::clear_selection();

        let pane = pane_for(tmp.path());
        let out = tmp.path().join("out");
        assert!(write_output(PickerMode::Files, &out, &pane).unwrap());
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            format!("{}\n", tmp.path().join("only").display())
        );
    }

    #[test]
    fn file_mode_rejects_directories() {
        let _guard = crate::app::pane::selection_test_guard();
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        PaneState::clear_selection();

        let pane = pane_for(tmp.path());
        let out = tmp.path().join("out");
        assert!(!write_output(PickerMode::File, &out, &pane).unwrap());
        assert!(write_output(PickerMode::Dir, &out, &pane).unwrap());
    }

    #[test]
    fn empty_listing_writes_nothing() {
        let _guard = crate::app::pane::selection_test_guard();
        let tmp = tempfile::tempdir().unwrap();
        PaneState::clear_selection();
        let pane = pane_for(tmp.path());
        let out = tmp.path().join("out");
        assert!(!write_output(PickerMode::File, &out, &pane).unwrap());
        assert!(!out.exists());
    }
}
