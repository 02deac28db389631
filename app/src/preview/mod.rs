//! Background renderer for the entry under the cursor.
//!
//! At most one job is ever live. Retargeting cancels the previous job
//! fully (flag first, then SIGKILL to any external converter in a spin
//! until the worker acknowledges) before the next one starts, so stale
//! results can never surface. The engine paints straight to stdout: sixel data has
//! to reach the terminal verbatim, bypassing the cell buffer.

pub mod audio;
pub mod charset;
pub mod filetype;
pub mod image;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::app::dir_list::DirectoryListing;
use crate::app::entry::FileEntry;
use crate::app::settings::Config;
use crate::app::types::{FileKind, FilterKind, SortKey, SortOrder};
use crate::highlight::SyntaxSet;
use crate::util;

const LOADING_DELAY: Duration = Duration::from_millis(200);
const REVERSE_STUB: (&str, &str) = ("\x1b[7;1m", "\x1b[27;22m");

/// Result of one preview job: either styled text lines or raw sixel bytes.
#[derive(Default)]
pub struct Payload {
    pub file_name: String,
    pub lines: Vec<String>,
    pub sixel: bool,
}

impl Payload {
    fn clear(&mut self) {
        self.file_name.clear();
        self.lines.clear();
        self.sixel = false;
    }
}

struct Shared {
    cancel: AtomicBool,
    done: AtomicBool,
    child: AtomicI32,
    payload: Mutex<Payload>,
}

/// Pixel box available to the sixel converter, captured on the UI thread
/// at job start.
#[derive(Clone, Copy, Debug, Default)]
struct PixelBox {
    width: u32,
    height: u32,
    known: bool,
}

pub struct PreviewEngine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    target_name: String,
    disabled: bool,
    image_preview: bool,
    entry: Option<FileEntry>,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    scroll: usize,
    load_started: Instant,
    loading_drawn: bool,
    config: Arc<Config>,
    syntax: Arc<SyntaxSet>,
}

impl PreviewEngine {
    pub fn new(config: Arc<Config>, syntax: Arc<SyntaxSet>) -> Self {
        PreviewEngine {
            shared: Arc::new(Shared {
                cancel: AtomicBool::new(false),
                done: AtomicBool::new(true),
                child: AtomicI32::new(0),
                payload: Mutex::new(Payload::default()),
            }),
            worker: None,
            target_name: String::new(),
            disabled: true,
            image_preview: true,
            entry: None,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            scroll: 0,
            load_started: Instant::now(),
            loading_drawn: false,
            config,
            syntax,
        }
    }

    /// Name of the entry the engine was last pointed at; the controller
    /// compares it against the cursor to decide when to retarget.
    pub fn loaded_name(&self) -> &str {
        &self.target_name
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn image_preview(&self) -> bool {
        self.image_preview
    }

    pub fn toggle_image_preview(&mut self) {
        self.image_preview = !self.image_preview;
    }

    pub fn is_loading(&self) -> bool {
        !self.shared.done.load(Ordering::Acquire)
    }

    pub fn is_sixel(&self) -> bool {
        self.shared.payload.lock().unwrap().sixel
    }

    pub fn set_position(&mut self, x: u16, y: u16) {
        self.x = x;
        self.y = y;
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        // A sixel payload was rendered for the old pixel box; drop it
        // rather than paint it at the wrong scale.
        let mut payload = self.shared.payload.lock().unwrap();
        if payload.sixel {
            payload.clear();
        }
    }

    /// Block until the in-flight job is gone: set the flag, SIGKILL any
    /// live child in a spin until the worker reports done, then join.
    pub fn cancel(&mut self) {
        if !self.shared.done.load(Ordering::Acquire) {
            while !self.shared.done.load(Ordering::Acquire) {
                let pid = self.shared.child.load(Ordering::Acquire);
                if pid > 0 {
                    let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
                }
                self.shared.cancel.store(true, Ordering::Release);
                thread::yield_now();
            }
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        self.shared.cancel.store(false, Ordering::Release);
        self.shared.done.store(false, Ordering::Release);
        self.load_started = Instant::now();
        self.loading_drawn = false;
        self.scroll = 0;
        self.shared.payload.lock().unwrap().clear();
    }

    /// Cancel the current job and start one for `entry`. `None` marks the
    /// pane disabled (empty directory stub).
    pub fn set_load_file(&mut self, entry: Option<FileEntry>) {
        self.cancel();
        match entry {
            Some(e) => {
                self.disabled = false;
                self.target_name = e.name.clone();
                self.entry = Some(e);
                self.spawn_worker();
            }
            None => {
                self.disabled = true;
                self.target_name.clear();
                self.entry = None;
                self.shared.done.store(true, Ordering::Release);
            }
        }
    }

    /// Re-run the job for the current target (image-preview toggle, return
    /// from an editor).
    pub fn reload(&mut self) {
        self.cancel();
        match self.entry.clone() {
            Some(_) => self.spawn_worker(),
            None => self.shared.done.store(true, Ordering::Release),
        }
    }

    fn spawn_worker(&mut self) {
        let Some(entry) = self.entry.clone() else {
            self.shared.done.store(true, Ordering::Release);
            return;
        };
        let shared = Arc::clone(&self.shared);
        let config = Arc::clone(&self.config);
        let syntax = Arc::clone(&self.syntax);
        let image_preview = self.image_preview;
        let pixel_box = self.pixel_box();

        self.worker = Some(thread::spawn(move || {
            run_job(&entry, &shared, &config, &syntax, image_preview, pixel_box);
        }));
    }

    /// Pixel budget for the converter: the preview pane minus padding.
    fn pixel_box(&self) -> PixelBox {
        let Some((cols, rows, xpx, ypx)) = image::terminal_pixel_size() else {
            return PixelBox::default();
        };
        if cols == 0 || rows == 0 || xpx == 0 || ypx == 0 {
            return PixelBox::default();
        }
        let cw = (xpx / cols) as u32;
        let ch = (ypx / rows) as u32;
        let width = (xpx as u32).saturating_sub(self.x as u32 * cw + cw * 2);
        let height = (ypx as u32).saturating_sub(self.y as u32 * ch + ch * 3);
        PixelBox {
            width,
            height,
            known: width > 0 && height > 0,
        }
    }

    pub fn scroll_down(&mut self) -> bool {
        if !self.is_loading() {
            let payload = self.shared.payload.lock().unwrap();
            if !payload.sixel && payload.lines.len() > self.scroll + self.height as usize {
                self.scroll += 1;
                return true;
            }
        }
        false
    }

    pub fn scroll_up(&mut self) -> bool {
        if !self.is_loading() && self.scroll > 0 {
            self.scroll -= 1;
            return true;
        }
        false
    }

    /// Paint the payload. Returns whether anything final was drawn this
    /// frame; `false` keeps the controller calling back until the job
    /// lands. A job older than 200 ms shows a loading stub once.
    pub fn draw(&mut self) -> io::Result<bool> {
        let mut out = io::stdout().lock();

        if self.disabled {
            self.clear_region(&mut out)?;
            queue!(out, MoveTo(self.x, self.y))?;
            write!(out, "{}empty{}\x1b[K", REVERSE_STUB.0, REVERSE_STUB.1)?;
            out.flush()?;
            return Ok(true);
        }

        if !self.is_loading() {
            let payload = self.shared.payload.lock().unwrap();
            if payload.sixel {
                drop(payload);
                self.clear_region(&mut out)?;
                let payload = self.shared.payload.lock().unwrap();
                queue!(out, MoveTo(self.x, self.y))?;
                out.flush()?;
                for chunk in &payload.lines {
                    out.write_all(chunk.as_bytes())?;
                }
            } else {
                for row in 0..self.height {
                    queue!(out, MoveTo(self.x, self.y + row))?;
                    if payload.lines.is_empty() && row == 0 {
                        write!(out, "{}empty{}\x1b[K", REVERSE_STUB.0, REVERSE_STUB.1)?;
                        continue;
                    }
                    let idx = self.scroll + row as usize;
                    match payload.lines.get(idx) {
                        Some(line) => {
                            let expanded = util::tab_to_space(line);
                            let (clipped, _) = util::clip_width(
                                &expanded,
                                self.width as usize,
                                self.config.wcwidth_cjk,
                            );
                            write!(out, "{}\x1b[m\x1b[K", clipped)?;
                        }
                        None => write!(out, "\x1b[K")?,
                    }
                }
            }
            out.flush()?;
            return Ok(true);
        }

        if !self.loading_drawn && self.load_started.elapsed() >= LOADING_DELAY {
            self.clear_region(&mut out)?;
            queue!(out, MoveTo(self.x, self.y))?;
            write!(out, "Loading...")?;
            out.flush()?;
            self.loading_drawn = true;
        }
        Ok(false)
    }

    /// Blank the preview pane's rows.
    pub fn clear(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.clear_region(&mut out)?;
        out.flush()
    }

    fn clear_region(&self, out: &mut impl Write) -> io::Result<()> {
        for row in 0..self.height {
            queue!(out, MoveTo(self.x, self.y + row))?;
            write!(out, "\x1b[K")?;
        }
        Ok(())
    }

    /// Wait for the current job without cancelling it (tests and teardown).
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    /// Snapshot of the current payload lines (tests, log inspection).
    pub fn payload_lines(&self) -> Vec<String> {
        self.shared.payload.lock().unwrap().lines.clone()
    }
}

impl Drop for PreviewEngine {
    fn drop(&mut self) {
        // Workers poll the flag at every I/O boundary; don't leave one
        // running against a dead engine.
        self.shared.cancel.store(true, Ordering::Release);
        let pid = self.shared.child.load(Ordering::Acquire);
        if pid > 0 {
            let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

// ----------------------------------------------------------------------
// Worker side

fn run_job(
    entry: &FileEntry,
    shared: &Shared,
    config: &Config,
    syntax: &SyntaxSet,
    image_preview: bool,
    pixel_box: PixelBox,
) {
    let mut sixel = false;
    let lines = match entry.kind {
        _ if entry.is_dir() => preview_dir(entry, shared, config),
        FileKind::Fifo => vec![reverse_stub("fifo")],
        FileKind::Socket => vec![reverse_stub("sock")],
        _ => match filetype::FileHead::read(&entry.path()) {
            Err(_) => Vec::new(),
            Ok(head) => {
                if image_preview && image::detect(&head.head).is_some() {
                    let (lines, ok) = preview_image(entry, shared, &head, pixel_box);
                    sixel = ok;
                    lines
                } else if entry.suffix().map(filetype::is_audio_suffix).unwrap_or(false) {
                    audio::tag_lines(&entry.path())
                } else if filetype::is_archive(&head.head) {
                    preview_archive(entry, shared)
                } else if !filetype::is_binary(&head) {
                    preview_text(entry, shared, config, syntax)
                } else {
                    vec![reverse_stub("binary")]
                }
            }
        },
    };

    let mut payload = shared.payload.lock().unwrap();
    payload.file_name = entry.name.clone();
    payload.lines = lines;
    payload.sixel = sixel;
    drop(payload);
    shared.done.store(true, Ordering::Release);
}

fn reverse_stub(label: &str) -> String {
    format!("{}{}{}", REVERSE_STUB.0, label, REVERSE_STUB.1)
}

fn cancelled(shared: &Shared) -> bool {
    shared.cancel.load(Ordering::Relaxed)
}

/// Bounded listing of the target directory, coloured like the pane rows.
fn preview_dir(entry: &FileEntry, shared: &Shared, config: &Config) -> Vec<String> {
    let mut dir = DirectoryListing::new(
        SortKey::from_config(config.sort_type),
        SortOrder::from_config(config.sort_order),
        FilterKind::from_config(config.filter_type),
    );
    if dir.open(&entry.path(), Some(&shared.cancel)).is_err() {
        return Vec::new();
    }

    let max = if config.preview_max_lines < 0 {
        dir.count()
    } else {
        dir.count().min(config.preview_max_lines as usize)
    };

    let mut lines = Vec::with_capacity(max);
    for i in 0..max {
        let e = dir.at(i);
        let color = if e.is_dir() {
            if e.is_link() {
                "\x1b[36;1m"
            } else {
                "\x1b[34;1m"
            }
        } else if e.is_exe() {
            "\x1b[32;1m"
        } else if e.kind == FileKind::Fifo {
            "\x1b[33m"
        } else if e.kind == FileKind::Socket {
            "\x1b[35;1m"
        } else if e.is_link() {
            "\x1b[36;1m"
        } else {
            ""
        };
        lines.push(format!("{}{}", color, e.display_name()));
        if cancelled(shared) {
            return lines;
        }
    }
    lines
}

/// Sixel conversion via the external converter, bounded by the pane's
/// pixel box. TGA is structural, so the header match is only trusted when
/// the suffix agrees.
fn preview_image(
    entry: &FileEntry,
    shared: &Shared,
    head: &filetype::FileHead,
    pixel_box: PixelBox,
) -> (Vec<String>, bool) {
    let Some(format) = image::detect(&head.head) else {
        return (vec![reverse_stub("binary")], false);
    };

    if format == image::ImageFormat::Tga {
        let tga_suffix = entry
            .suffix()
            .map(|s| s.eq_ignore_ascii_case("tga"))
            .unwrap_or(false);
        if !tga_suffix {
            return (vec![reverse_stub("binary")], false);
        }
    }

    let dims = std::fs::File::open(entry.path())
        .ok()
        .and_then(|mut f| image::dimensions(&mut f, format).ok().flatten());
    let Some((src_w, src_h)) = dims else {
        return (Vec::new(), false);
    };

    let mut args: Vec<String> = vec!["-S".to_string()];
    if pixel_box.known && !(src_w < pixel_box.width && src_h < pixel_box.height) {
        let (w, h) = image::scale_to_fit(src_w, src_h, pixel_box.width, pixel_box.height);
        args.push(format!("-w{}", w));
        args.push(format!("-h{}", h));
    }
    args.push(entry.path().to_string_lossy().into_owned());

    if cancelled(shared) {
        return (Vec::new(), false);
    }
    match capture_raw(shared, "img2sixel", &args) {
        Some(bytes) if !bytes.is_empty() => {
            (vec![String::from_utf8_lossy(&bytes).into_owned()], true)
        }
        _ => (Vec::new(), false),
    }
}

/// External archive listers; an empty listing falls back to the binary stub.
fn preview_archive(entry: &FileEntry, shared: &Shared) -> Vec<String> {
    let path = entry.path().to_string_lossy().into_owned();
    let mut lines = capture_lines(shared, "lsar", &[path.clone()]);
    if lines.is_empty() {
        lines = capture_lines(shared, "bsdtar", &["-tf".to_string(), path]);
    }
    if lines.is_empty() {
        lines.push(reverse_stub("binary"));
    }
    lines
}

fn preview_text(
    entry: &FileEntry,
    shared: &Shared,
    config: &Config,
    syntax: &SyntaxSet,
) -> Vec<String> {
    let Ok(file) = std::fs::File::open(entry.path()) else {
        return Vec::new();
    };
    let mut reader = BufReader::new(file);
    let mut raw: Vec<u8> = Vec::new();
    let mut line: Vec<u8> = Vec::new();
    let mut count: i64 = 0;

    loop {
        line.clear();
        let n = match reader.read_until(b'\n', &mut line) {
            Ok(n) => n,
            Err(_) => break,
        };
        if n == 0 {
            break;
        }
        if cancelled(shared) {
            return Vec::new();
        }

        // Normalise CR/LF endings to a single newline.
        while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
            line.pop();
        }
        raw.extend_from_slice(&line);
        raw.push(b'\n');

        count += 1;
        if config.preview_max_lines != -1 && count > config.preview_max_lines {
            break;
        }
    }
    if cancelled(shared) {
        return Vec::new();
    }

    let detected = charset::detect(&raw);
    let text = charset::to_local(&raw);
    let (highlighted, syntax_name) = syntax.highlight(&entry.name, &text, &shared.cancel);

    let mut lines = Vec::with_capacity(count as usize + 1);
    lines.push(format!(
        "[Charset: {}] - {}",
        detected,
        syntax_name.as_deref().unwrap_or("PlainText")
    ));
    for l in highlighted.split('\n') {
        lines.push(l.to_string());
    }
    if lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }
    lines
}

/// Run a command, publish its pid for the cancel path, and collect stdout
/// lines, honouring cancellation between reads.
fn capture_lines(shared: &Shared, cmd: &str, args: &[String]) -> Vec<String> {
    let child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    shared.child.store(child.id() as i32, Ordering::Release);

    let mut lines = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            match line {
                Ok(l) => lines.push(l),
                Err(_) => break,
            }
            if cancelled(shared) {
                break;
            }
        }
    }
    let _ = child.wait();
    shared.child.store(0, Ordering::Release);
    lines
}

/// Like `capture_lines` but byte-exact, for sixel payloads.
fn capture_raw(shared: &Shared, cmd: &str, args: &[String]) -> Option<Vec<u8>> {
    let child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(c) => c,
        Err(_) => return None,
    };
    shared.child.store(child.id() as i32, Ordering::Release);

    let mut bytes = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = [0u8; 4096];
        loop {
            match stdout.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => bytes.extend_from_slice(&buf[..n]),
                Err(_) => break,
            }
            if cancelled(shared) {
                break;
            }
        }
    }
    let _ = child.wait();
    shared.child.store(0, Ordering::Release);
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn engine_for(dir: &Path) -> (PreviewEngine, tempfile::TempDir) {
        let rules = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.nanorc_path = rules.path().to_string_lossy().into_owned();
        let syntax = Arc::new(SyntaxSet::load_dir(Path::new(&cfg.nanorc_path)));
        let engine = PreviewEngine::new(Arc::new(cfg), syntax);
        let _ = dir;
        (engine, rules)
    }

    fn entry_for(dir: &Path, name: &str) -> FileEntry {
        FileEntry::read(dir, name).unwrap()
    }

    fn wait_done(engine: &PreviewEngine) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while engine.is_loading() {
            assert!(Instant::now() < deadline, "preview job timed out");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn text_file_payload_has_charset_header() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), "alpha\nbeta\n").unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());

        engine.set_load_file(Some(entry_for(tmp.path(), "notes.txt")));
        wait_done(&engine);

        let lines = engine.payload_lines();
        assert_eq!(lines[0], "[Charset: ASCII] - PlainText");
        assert_eq!(&lines[1..], &["alpha", "beta"]);
    }

    #[test]
    fn crlf_normalised() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("dos.txt"), "one\r\ntwo\r\n").unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());

        engine.set_load_file(Some(entry_for(tmp.path(), "dos.txt")));
        wait_done(&engine);

        assert_eq!(&engine.payload_lines()[1..], &["one", "two"]);
    }

    #[test]
    fn binary_file_gets_stub() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("blob"), [0u8, 1, 2, 3]).unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());

        engine.set_load_file(Some(entry_for(tmp.path(), "blob")));
        wait_done(&engine);

        assert_eq!(engine.payload_lines(), vec![reverse_stub("binary")]);
    }

    #[test]
    fn directory_listing_is_bounded_and_colored() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::create_dir(sub.join("childdir")).unwrap();
        fs::write(sub.join("file"), b"x").unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());

        engine.set_load_file(Some(entry_for(tmp.path(), "sub")));
        wait_done(&engine);

        let lines = engine.payload_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("childdir/"));
        assert!(lines[0].starts_with("\x1b[34;1m"));
        assert_eq!(lines[1], "file");
    }

    #[test]
    fn at_most_one_payload_and_always_the_last() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(tmp.path().join(format!("f{}", i)), format!("body {}\n", i)).unwrap();
        }
        let (mut engine, _rules) = engine_for(tmp.path());

        for i in 0..5 {
            engine.set_load_file(Some(entry_for(tmp.path(), &format!("f{}", i))));
        }
        wait_done(&engine);

        let lines = engine.payload_lines();
        assert_eq!(lines[1], "body 4");
        assert_eq!(engine.loaded_name(), "f4");
    }

    #[test]
    fn cancel_blocks_until_acknowledged_and_resets_state() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "text\n").unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());

        engine.set_load_file(Some(entry_for(tmp.path(), "a.txt")));
        engine.cancel();
        assert!(engine.payload_lines().is_empty());

        // The engine is reusable after a cancel.
        engine.set_load_file(Some(entry_for(tmp.path(), "a.txt")));
        wait_done(&engine);
        assert_eq!(&engine.payload_lines()[1..], &["text"]);
    }

    #[test]
    fn empty_target_disables_pane() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());
        engine.set_load_file(None);
        assert!(engine.is_disabled());
        assert!(!engine.is_loading());
    }

    #[test]
    fn preview_line_cap_honoured() {
        let tmp = tempfile::tempdir().unwrap();
        let body: String = (0..100).map(|i| format!("line{}\n", i)).collect();
        fs::write(tmp.path().join("long.txt"), body).unwrap();

        let rules = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.preview_max_lines = 10;
        cfg.nanorc_path = rules.path().to_string_lossy().into_owned();
        let syntax = Arc::new(SyntaxSet::load_dir(rules.path()));
        let mut engine = PreviewEngine::new(Arc::new(cfg), syntax);

        engine.set_load_file(Some(entry_for(tmp.path(), "long.txt")));
        wait_done(&engine);

        // Header plus the capped line count.
        assert_eq!(engine.payload_lines().len(), 1 + 11);
    }

    #[test]
    fn scroll_only_applies_to_text() {
        let tmp = tempfile::tempdir().unwrap();
        let body: String = (0..50).map(|i| format!("l{}\n", i)).collect();
        fs::write(tmp.path().join("t.txt"), body).unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());
        engine.set_size(40, 10);

        engine.set_load_file(Some(entry_for(tmp.path(), "t.txt")));
        wait_done(&engine);

        assert!(engine.scroll_down());
        assert!(engine.scroll_up());
        assert!(!engine.scroll_up());
    }

    #[test]
    fn fifo_gets_stub() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pipe");
        nix::unistd::mkfifo(&path, nix::sys::stat::Mode::from_bits_truncate(0o644)).unwrap();
        let (mut engine, _rules) = engine_for(tmp.path());

        engine.set_load_file(Some(entry_for(tmp.path(), "pipe")));
        wait_done(&engine);
        assert_eq!(engine.payload_lines(), vec![reverse_stub("fifo")]);
    }
}
