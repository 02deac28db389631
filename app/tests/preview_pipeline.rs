//! Preview engine behaviour against a real filesystem: dispatch, the
//! at-most-one guarantee, cancellation, and the reload-while-loading
//! interaction the controller occasionally produces.

use minase::app::entry::FileEntry;
use minase::app::settings::Config;
use minase::app::types::{FilterKind, SortKey, SortOrder, ViewStyle};
use minase::highlight::SyntaxSet;
use minase::preview::PreviewEngine;
use minase::PaneState;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn engine(nanorc_dir: &Path) -> PreviewEngine {
    let mut cfg = Config::default();
    cfg.nanorc_path = nanorc_dir.to_string_lossy().into_owned();
    let syntax = Arc::new(SyntaxSet::load_dir(nanorc_dir));
    PreviewEngine::new(Arc::new(cfg), syntax)
}

fn wait_done(e: &PreviewEngine) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while e.is_loading() {
        assert!(Instant::now() < deadline, "preview did not finish");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn rapid_retargeting_yields_only_the_last_payload() {
    let tmp = tempfile::tempdir().unwrap();
    let rules = tempfile::tempdir().unwrap();
    for i in 0..20 {
        let body: String = (0..200).map(|j| format!("{} {}\n", i, j)).collect();
        fs::write(tmp.path().join(format!("f{:02}", i)), body).unwrap();
    }

    let mut eng = engine(rules.path());
    for i in 0..20 {
        let entry = FileEntry::read(tmp.path(), &format!("f{:02}", i)).unwrap();
        eng.set_load_file(Some(entry));
    }
    wait_done(&eng);

    assert_eq!(eng.loaded_name(), "f19");
    let lines = eng.payload_lines();
    assert!(lines[1].starts_with("19 "), "stale payload surfaced: {:?}", &lines[..2]);
}

#[test]
fn pane_reload_while_preview_in_flight_is_benign() {
    // The controller occasionally re-enters reload() while a preview job
    // is mid-flight; the pane and the engine share no state, so both
    // must finish unperturbed.
    let tmp = tempfile::tempdir().unwrap();
    let rules = tempfile::tempdir().unwrap();
    let body: String = (0..5000).map(|i| format!("line {}\n", i)).collect();
    fs::write(tmp.path().join("big.txt"), body).unwrap();

    let mut pane = PaneState::new(
        tmp.path(),
        ViewStyle::Simple,
        SortKey::Name,
        SortOrder::Ascending,
        FilterKind::Substring,
    )
    .unwrap();

    let mut eng = engine(rules.path());
    eng.set_load_file(Some(FileEntry::read(tmp.path(), "big.txt").unwrap()));

    pane.reload();
    pane.reload();
    assert_eq!(pane.current().unwrap().name, "big.txt");

    wait_done(&eng);
    assert_eq!(eng.loaded_name(), "big.txt");
    assert!(!eng.payload_lines().is_empty());
}

#[test]
fn archive_magic_dispatch_does_not_reach_text_path() {
    // A gzip body would be garbage as text; with no lister installed the
    // payload degrades to the binary stub rather than mojibake.
    let tmp = tempfile::tempdir().unwrap();
    let rules = tempfile::tempdir().unwrap();
    let mut gz: Vec<u8> = vec![0x1F, 0x8B, 0x08, 0, 0, 0, 0, 0, 0, 3];
    gz.extend_from_slice(&[0xABu8, 0xCD, 0xEF, 0x42].repeat(16));
    fs::write(tmp.path().join("blob.gz"), &gz).unwrap();

    let mut eng = engine(rules.path());
    eng.set_load_file(Some(FileEntry::read(tmp.path(), "blob.gz").unwrap()));
    wait_done(&eng);

    let lines = eng.payload_lines();
    assert!(!lines.is_empty());
    assert!(
        !lines[0].starts_with("[Charset:"),
        "archive fell through to the text path: {:?}",
        lines[0]
    );
}

#[test]
fn highlighted_text_preview_reports_syntax() {
    let tmp = tempfile::tempdir().unwrap();
    let rules = tempfile::tempdir().unwrap();
    fs::write(
        rules.path().join("sh.nanorc"),
        "syntax \"sh\" \"\\.sh$\"\ncolor green \"\\b(if|then|fi)\\b\"\n",
    )
    .unwrap();
    fs::write(tmp.path().join("run.sh"), "if true; then echo hi; fi\n").unwrap();

    let mut eng = engine(rules.path());
    eng.set_load_file(Some(FileEntry::read(tmp.path(), "run.sh").unwrap()));
    wait_done(&eng);

    let lines = eng.payload_lines();
    assert_eq!(lines[0], "[Charset: ASCII] - sh");
    assert!(lines[1].contains("\x1b[32m"));
}

#[test]
fn disabled_engine_stays_disabled_until_next_target() {
    let rules = tempfile::tempdir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("t"), b"x\n").unwrap();

    let mut eng = engine(rules.path());
    eng.set_load_file(None);
    assert!(eng.is_disabled());

    eng.set_load_file(Some(FileEntry::read(tmp.path(), "t").unwrap()));
    assert!(!eng.is_disabled());
    wait_done(&eng);
}
