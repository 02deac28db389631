//! Listing policies end to end: sort keys, order wrapping, filters and
//! the directories-first invariant.

use minase::app::dir_list::DirectoryListing;
use minase::{FilterKind, SortKey, SortOrder};
use std::fs;
use std::path::Path;

fn names(l: &DirectoryListing) -> Vec<String> {
    (0..l.count()).map(|i| l.at(i).name.clone()).collect()
}

fn open(dir: &Path) -> DirectoryListing {
    let mut l = DirectoryListing::new(SortKey::Name, SortOrder::Ascending, FilterKind::Substring);
    l.open(dir, None).unwrap();
    l
}

#[test]
fn name_asc_puts_directories_first() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a"), b"").unwrap();
    fs::create_dir(tmp.path().join("b")).unwrap();
    fs::write(tmp.path().join("c.txt"), b"").unwrap();

    let l = open(tmp.path());
    assert_eq!(names(&l), vec!["b", "a", "c.txt"]);
}

#[test]
fn size_desc_keeps_directories_first_then_files_by_size() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a"), vec![0u8; 10]).unwrap();
    fs::create_dir(tmp.path().join("b")).unwrap();
    fs::write(tmp.path().join("c.txt"), vec![0u8; 500]).unwrap();

    let mut l = open(tmp.path());
    l.set_sort(SortKey::Size, SortOrder::Descending);
    assert_eq!(names(&l), vec!["b", "c.txt", "a"]);
}

#[test]
fn date_sort_breaks_ties_on_name() {
    let tmp = tempfile::tempdir().unwrap();
    for n in ["x", "y", "z"] {
        fs::write(tmp.path().join(n), b"").unwrap();
    }
    // Timestamps may collide on fast filesystems, which is exactly the
    // case the tie-break covers.
    let mut l = open(tmp.path());
    l.set_sort(SortKey::Date, SortOrder::Ascending);
    let sorted = names(&l);
    let mut resorted = sorted.clone();
    resorted.sort_by(|a, b| {
        let ea = (0..l.count()).map(|i| l.at(i)).find(|e| &e.name == a).unwrap();
        let eb = (0..l.count()).map(|i| l.at(i)).find(|e| &e.name == b).unwrap();
        (ea.mtime_secs, ea.mtime_nsecs, ea.name.clone()).cmp(&(
            eb.mtime_secs,
            eb.mtime_nsecs,
            eb.name.clone(),
        ))
    });
    assert_eq!(sorted, resorted);
}

#[test]
fn substring_filter_requires_all_tokens() {
    // Filter "tx t": only names whose upper-cased form contains both
    // "TX" and "T" survive.
    let tmp = tempfile::tempdir().unwrap();
    for n in ["a.txt", "b.md", "TXT-notes", "plain"] {
        fs::write(tmp.path().join(n), b"").unwrap();
    }

    let mut l = open(tmp.path());
    l.set_filter("tx t", FilterKind::Substring);
    let got = names(&l);
    assert!(got.contains(&"a.txt".to_string()));
    assert!(got.contains(&"TXT-notes".to_string()));
    assert!(!got.contains(&"b.md".to_string()));
    assert!(!got.contains(&"plain".to_string()));
}

#[test]
fn filter_monotonicity_over_random_tokens() {
    let tmp = tempfile::tempdir().unwrap();
    let names_pool = [
        "alpha.rs", "beta.rs", "alpha.txt", "readme.md", "beta.txt", "gamma.log",
    ];
    for n in names_pool {
        fs::write(tmp.path().join(n), b"").unwrap();
    }

    let mut l = open(tmp.path());
    for base in ["a", "al", "be", "rs", "txt"] {
        l.set_filter(base, FilterKind::Substring);
        let wide = names(&l);
        for extra in ["a", "t", "x", "rs"] {
            let superset = format!("{} {}", base, extra);
            l.set_filter(&superset, FilterKind::Substring);
            let narrow = names(&l);
            assert!(
                narrow.iter().all(|n| wide.contains(n)),
                "{:?} should be a subset of {:?} (filters {:?} ⊇ {:?})",
                narrow,
                wide,
                superset,
                base
            );
        }
    }
}

#[test]
fn every_policy_keeps_directories_before_files() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join("dir1")).unwrap();
    fs::create_dir(tmp.path().join("dir2")).unwrap();
    for (i, n) in ["f1", "f2", "f3"].iter().enumerate() {
        fs::write(tmp.path().join(n), vec![0u8; i * 10]).unwrap();
    }

    let mut l = open(tmp.path());
    for key in [SortKey::Name, SortKey::Size, SortKey::Date] {
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            l.set_sort(key, order);
            let dirs_done: Vec<bool> = (0..l.count()).map(|i| l.at(i).is_dir()).collect();
            let first_file = dirs_done.iter().position(|d| !d).unwrap();
            assert!(
                dirs_done[first_file..].iter().all(|d| !d),
                "a directory appeared after a file under {:?}/{:?}",
                key,
                order
            );
        }
    }
}
