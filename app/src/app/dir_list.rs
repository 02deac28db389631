use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use walkdir::WalkDir;

use super::entry::FileEntry;
use super::types::{FilterKind, SortKey, SortOrder};

/// One directory's worth of entries plus the view policies applied to them.
///
/// `filtered` always reflects the current hidden/filter/sort settings;
/// every mutator rebuilds it. Directories precede files under every policy
/// and ties break on name. The listing is replaced wholesale on `open`.
pub struct DirectoryListing {
    path: PathBuf,
    all: Vec<Arc<FileEntry>>,
    filtered: Vec<Arc<FileEntry>>,
    hidden: bool,
    sort_key: SortKey,
    sort_order: SortOrder,
    filter: String,
    filter_kind: FilterKind,
}

impl DirectoryListing {
    pub fn new(sort_key: SortKey, sort_order: SortOrder, filter_kind: FilterKind) -> Self {
        DirectoryListing {
            path: PathBuf::new(),
            all: Vec::new(),
            filtered: Vec::new(),
            hidden: false,
            sort_key,
            sort_order,
            filter: String::new(),
            filter_kind,
        }
    }

    /// Read `path` and replace the whole listing. Changing directory clears
    /// the filter text. Per-entry stat failures drop the entry (it vanished
    /// under us); only the directory-open failure is reported.
    pub fn open(&mut self, path: &Path, cancel: Option<&AtomicBool>) -> io::Result<()> {
        // Probe the directory first so a failed open leaves the previous
        // listing intact for the caller's fallback logic.
        std::fs::read_dir(path)?;

        if self.path != path {
            self.filter.clear();
        }
        self.path = path.to_path_buf();
        self.all.clear();
        self.filtered.clear();

        for dent in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            if let Some(flag) = cancel {
                if flag.load(AtomicOrdering::Relaxed) {
                    return Ok(());
                }
            }
            let dent = match dent {
                Ok(d) => d,
                Err(_) => continue,
            };
            let name = dent.file_name().to_string_lossy().into_owned();
            match FileEntry::read(path, &name) {
                Ok(e) => self.all.push(Arc::new(e)),
                Err(_) => continue,
            }
        }

        self.rebuild();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    pub fn at(&self, i: usize) -> Arc<FileEntry> {
        Arc::clone(&self.filtered[i])
    }

    pub fn get(&self, i: usize) -> Option<Arc<FileEntry>> {
        self.filtered.get(i).cloned()
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden != hidden {
            self.hidden = hidden;
            self.rebuild();
        }
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn set_sort(&mut self, key: SortKey, order: SortOrder) {
        if self.sort_key != key || self.sort_order != order {
            self.sort_key = key;
            self.sort_order = order;
            self.rebuild();
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.filter_kind
    }

    pub fn set_filter(&mut self, filter: &str, kind: FilterKind) {
        self.filter = filter.to_string();
        self.filter_kind = kind;
        self.rebuild();
    }

    /// Index of the entry named `name`, under the current policies.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.filtered.iter().position(|e| e.name == name)
    }

    fn rebuild(&mut self) {
        let matcher = NameFilter::compile(&self.filter, self.filter_kind);

        self.filtered = self
            .all
            .iter()
            .filter(|e| matcher.is_match(&e.name))
            .filter(|e| self.hidden || !e.name.starts_with('.'))
            .cloned()
            .collect();

        let key = self.sort_key;
        let order = self.sort_order;
        self.filtered.sort_by(|a, b| {
            let cmp = compare_entries(a, b, key);
            // Reversal wraps the whole comparator, tie-break included.
            match order {
                SortOrder::Ascending => cmp,
                SortOrder::Descending => cmp.reverse(),
            }
        });
        // Stable partition: directories first, preserving within-partition order.
        self.filtered.sort_by_key(|e| !e.is_dir());
    }
}

fn compare_entries(a: &FileEntry, b: &FileEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Size => a.size.cmp(&b.size).then_with(|| a.name.cmp(&b.name)),
        SortKey::Date => a
            .mtime_secs
            .cmp(&b.mtime_secs)
            .then_with(|| a.mtime_nsecs.cmp(&b.mtime_nsecs))
            .then_with(|| a.name.cmp(&b.name)),
    }
}

enum NameFilter {
    All,
    Tokens(Vec<String>),
    Regex(Regex),
    #[cfg(feature = "migemo")]
    Expanded(Vec<Regex>),
}

impl NameFilter {
    fn compile(filter: &str, kind: FilterKind) -> NameFilter {
        if filter.is_empty() {
            return NameFilter::All;
        }
        match kind {
            FilterKind::Substring => NameFilter::Tokens(
                filter
                    .split(' ')
                    .filter(|t| !t.is_empty())
                    .map(|t| t.to_uppercase())
                    .collect(),
            ),
            FilterKind::Regexp => match build_icase_regex(filter) {
                // A broken pattern matches everything rather than hiding the
                // directory behind a typo.
                Some(re) => NameFilter::Regex(re),
                None => NameFilter::All,
            },
            #[cfg(feature = "migemo")]
            FilterKind::Dictionary => NameFilter::Expanded(
                filter
                    .split(' ')
                    .filter(|t| !t.is_empty())
                    .filter_map(|t| dictionary_expand(t).as_deref().and_then(build_icase_regex))
                    .collect(),
            ),
        }
    }

    fn is_match(&self, name: &str) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Tokens(tokens) => {
                let upper = name.to_uppercase();
                tokens.iter().all(|t| upper.contains(t.as_str()))
            }
            NameFilter::Regex(re) => re.is_match(name),
            #[cfg(feature = "migemo")]
            NameFilter::Expanded(res) => res.iter().all(|re| re.is_match(name)),
        }
    }
}

fn build_icase_regex(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .ok()
}

/// Expand one token to a regex via an external `cmigemo` query.
#[cfg(feature = "migemo")]
fn dictionary_expand(token: &str) -> Option<String> {
    use std::process::Command;

    let out = Command::new("cmigemo")
        .args(["-q", "-w", token])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn listing_for(dir: &Path) -> DirectoryListing {
        let mut l = DirectoryListing::new(SortKey::Name, SortOrder::Ascending, FilterKind::Substring);
        l.open(dir, None).unwrap();
        l
    }

    fn names(l: &DirectoryListing) -> Vec<String> {
        (0..l.count()).map(|i| l.at(i).name.clone()).collect()
    }

    #[test]
    fn directories_sort_before_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        fs::create_dir(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("c.txt"), b"").unwrap();

        let l = listing_for(tmp.path());
        assert_eq!(names(&l), vec!["b", "a", "c.txt"]);
    }

    #[test]
    fn size_sort_keeps_directories_first_and_ties_on_name() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dir")).unwrap();
        fs::write(tmp.path().join("big"), vec![0u8; 100]).unwrap();
        fs::write(tmp.path().join("small"), vec![0u8; 10]).unwrap();
        fs::write(tmp.path().join("also_big"), vec![0u8; 100]).unwrap();

        let mut l = listing_for(tmp.path());
        l.set_sort(SortKey::Size, SortOrder::Descending);
        // Sizes descend; the 100-byte tie breaks on the wrapped name order.
        assert_eq!(names(&l), vec!["dir", "big", "also_big", "small"]);
    }

    #[test]
    fn hidden_files_skipped_unless_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(".hidden"), b"").unwrap();
        fs::write(tmp.path().join("shown"), b"").unwrap();

        let mut l = listing_for(tmp.path());
        assert_eq!(names(&l), vec!["shown"]);
        l.set_hidden(true);
        assert_eq!(names(&l), vec![".hidden", "shown"]);
    }

    #[test]
    fn substring_filter_requires_every_token() {
        let tmp = tempfile::tempdir().unwrap();
        for n in ["notes.txt", "todo.txt", "text.md"] {
            fs::write(tmp.path().join(n), b"").unwrap();
        }

        let mut l = listing_for(tmp.path());
        l.set_filter("tx t", FilterKind::Substring);
        // Both tokens ("TX", "T") must appear in the upper-cased name;
        // "TEXT.MD" never has T and X adjacent, so it drops out.
        assert_eq!(names(&l), vec!["notes.txt", "todo.txt"]);

        l.set_filter("notes tx", FilterKind::Substring);
        assert_eq!(names(&l), vec!["notes.txt"]);
    }

    #[test]
    fn filter_monotonicity_supersets_shrink_results() {
        let tmp = tempfile::tempdir().unwrap();
        for n in ["alpha", "beta", "alphabet", "gamma"] {
            fs::write(tmp.path().join(n), b"").unwrap();
        }

        let mut l = listing_for(tmp.path());
        l.set_filter("al", FilterKind::Substring);
        let small: Vec<String> = names(&l);
        l.set_filter("al be", FilterKind::Substring);
        let smaller: Vec<String> = names(&l);
        assert!(smaller.iter().all(|n| small.contains(n)));
    }

    #[test]
    fn broken_regex_matches_everything() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        fs::write(tmp.path().join("b"), b"").unwrap();

        let mut l = listing_for(tmp.path());
        l.set_filter("[", FilterKind::Regexp);
        assert_eq!(l.count(), 2);
    }

    #[test]
    fn regex_filter_is_case_insensitive() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("README"), b"").unwrap();
        fs::write(tmp.path().join("other"), b"").unwrap();

        let mut l = listing_for(tmp.path());
        l.set_filter("^read", FilterKind::Regexp);
        assert_eq!(names(&l), vec!["README"]);
    }

    #[test]
    fn open_failure_preserves_previous_listing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("keep"), b"").unwrap();

        let mut l = listing_for(tmp.path());
        assert_eq!(l.count(), 1);
        let err = l.open(Path::new("/nonexistent-minase-test"), None);
        assert!(err.is_err());
        assert_eq!(l.count(), 1);
    }

    #[test]
    fn changing_directory_clears_filter() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        fs::write(a.path().join("x.txt"), b"").unwrap();
        fs::write(b.path().join("y.txt"), b"").unwrap();

        let mut l = listing_for(a.path());
        l.set_filter("x", FilterKind::Substring);
        assert_eq!(l.count(), 1);
        l.open(b.path(), None).unwrap();
        assert_eq!(l.filter(), "");
        assert_eq!(l.count(), 1);
    }

    #[test]
    fn descending_name_sort_reverses_ties_too() {
        let tmp = tempfile::tempdir().unwrap();
        for n in ["a", "b", "c"] {
            fs::write(tmp.path().join(n), b"").unwrap();
        }

        let mut l = listing_for(tmp.path());
        l.set_sort(SortKey::Name, SortOrder::Descending);
        assert_eq!(names(&l), vec!["c", "b", "a"]);
    }
}
