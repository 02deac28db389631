//! Serial background worker for file operations.
//!
//! A single FIFO of tagged tasks, drained by one worker thread that is
//! spawned lazily on enqueue and exits when the queue runs dry. File
//! operations shell out to `cp`/`mv`/`rm` (or the trash helper) and feed
//! the combined output into a bounded log deque; `Reload` tasks do no work
//! themselves, they push a path for the controller to pick up on its next
//! tick. No two operations ever run in parallel, so log lines from
//! operation N never interleave with those of N+1.

use std::collections::VecDeque;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::app::entry::mode_string;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Copy { src: PathBuf, dst: PathBuf },
    Move { src: PathBuf, dst: PathBuf },
    Delete { src: PathBuf },
    Reload(PathBuf),
    Log(String),
    /// Zero-work task that drops a blank separator line into the log,
    /// scoping bursts of related operations.
    Marker,
}

struct Inner {
    queue: Mutex<VecDeque<Task>>,
    running: AtomicBool,
    kill: AtomicBool,
    task_count: AtomicUsize,
    log: Mutex<VecDeque<String>>,
    log_updated: AtomicBool,
    reload: Mutex<VecDeque<PathBuf>>,
    log_max_lines: usize,
    use_trash: bool,
}

pub struct TaskQueue {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TaskQueue {
    pub fn new(log_max_lines: usize, use_trash: bool) -> Self {
        TaskQueue {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::new()),
                running: AtomicBool::new(false),
                kill: AtomicBool::new(false),
                task_count: AtomicUsize::new(0),
                log: Mutex::new(VecDeque::new()),
                log_updated: AtomicBool::new(false),
                reload: Mutex::new(VecDeque::new()),
                log_max_lines: log_max_lines.max(1),
                use_trash,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Pending file operations (copy/move/delete). Drives the `[N]` badge.
    pub fn task_count(&self) -> usize {
        self.inner.task_count.load(Ordering::Acquire)
    }

    pub fn copy_file(&self, src: &Path, dst: &Path) {
        self.inner.task_count.fetch_add(1, Ordering::AcqRel);
        self.enqueue(Task::Copy {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        });
    }

    pub fn move_file(&self, src: &Path, dst: &Path) {
        self.inner.task_count.fetch_add(1, Ordering::AcqRel);
        self.enqueue(Task::Move {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        });
    }

    pub fn delete_file(&self, src: &Path) {
        self.inner.task_count.fetch_add(1, Ordering::AcqRel);
        self.enqueue(Task::Delete {
            src: src.to_path_buf(),
        });
    }

    /// Queue a reload notification for `path`; the controller drains these
    /// on its tick and reloads every pane showing that directory.
    pub fn reload_path(&self, path: &Path) {
        self.enqueue(Task::Reload(path.to_path_buf()));
    }

    pub fn add_log_message(&self, line: &str) {
        self.enqueue(Task::Log(line.to_string()));
    }

    /// Open a new visual group in the log.
    pub fn start_task(&self) {
        self.enqueue(Task::Marker);
    }

    // ------------------------------------------------------------------
    // Synchronous operations: quick metadata calls that report through the
    // same log but never enter the queue.

    /// Rename without replacing an existing target.
    pub fn rename_file(&self, dir: &Path, src: &str, dst: &str) -> bool {
        let from = dir.join(src);
        let to = dir.join(dst);
        let result = nix::fcntl::renameat2(
            None,
            &from,
            None,
            &to,
            nix::fcntl::RenameFlags::RENAME_NOREPLACE,
        );

        self.start_task();
        if result.is_ok() {
            self.add_log_message(&format!("rename: {} -> {}", from.display(), to.display()));
        } else {
            self.add_log_message(&format!(
                "Can't rename file/dir: {} -> {}",
                from.display(),
                to.display()
            ));
        }
        result.is_ok()
    }

    pub fn chmod_file(&self, path: &Path, mode: u32) -> bool {
        use std::os::unix::fs::PermissionsExt;
        let result = fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777));

        self.start_task();
        if result.is_ok() {
            self.add_log_message(&format!("chmod[ {}]: {}", mode_string(mode), path.display()));
        } else {
            self.add_log_message(&format!(
                "Can't chmod[ {}]: {}",
                mode_string(mode),
                path.display()
            ));
        }
        result.is_ok()
    }

    /// Create an empty file or a directory under `dir`.
    pub fn create_entry(&self, dir: &Path, name: &str, file: bool) -> bool {
        let path = dir.join(name);
        let result = if file {
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map(|_| ())
        } else {
            fs::create_dir(&path)
        };

        self.start_task();
        if result.is_ok() {
            self.add_log_message(&format!("Create to file/dir: {}", path.display()));
        } else {
            self.add_log_message(&format!("Can't create to file/dir: {}", path.display()));
        }
        result.is_ok()
    }

    // ------------------------------------------------------------------
    // Controller-facing views

    /// Snapshot the log (newest first) and clear the update flag.
    pub fn log_snapshot(&self) -> Vec<String> {
        self.inner.log_updated.store(false, Ordering::Release);
        self.inner.log.lock().unwrap().iter().cloned().collect()
    }

    pub fn log_updated(&self) -> bool {
        self.inner.log_updated.load(Ordering::Acquire)
    }

    pub fn has_reload_path(&self) -> bool {
        !self.inner.reload.lock().unwrap().is_empty()
    }

    pub fn pop_reload_path(&self) -> Option<PathBuf> {
        self.inner.reload.lock().unwrap().pop_front()
    }

    /// Wait until the queue is drained (tests, shutdown).
    pub fn drain(&self) {
        let handle = self.worker.lock().unwrap().take();
        if let Some(h) = handle {
            let _ = h.join();
        }
    }

    fn enqueue(&self, task: Task) {
        self.inner.queue.lock().unwrap().push_back(task);
        if !self.inner.running.swap(true, Ordering::AcqRel) {
            let mut slot = self.worker.lock().unwrap();
            // The previous worker has exited; reap it before respawning.
            if let Some(h) = slot.take() {
                let _ = h.join();
            }
            let inner = Arc::clone(&self.inner);
            *slot = Some(thread::spawn(move || worker_loop(inner)));
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        // Finish the task in flight; in-flight children are not killed
        // (a half-copied tree is worse than a slow exit).
        self.inner.kill.store(true, Ordering::Release);
        let handle = self.worker.lock().unwrap().take();
        if let Some(h) = handle {
            let _ = h.join();
        }
    }
}

fn worker_loop(inner: Arc<Inner>) {
    loop {
        loop {
            let task = inner.queue.lock().unwrap().pop_front();
            let Some(task) = task else { break };
            inner.run(task);
            if inner.kill.load(Ordering::Acquire) {
                inner.running.store(false, Ordering::Release);
                return;
            }
        }

        inner.running.store(false, Ordering::Release);
        // An enqueue may have raced the drain; reclaim the worker role
        // rather than strand the task until the next enqueue.
        if inner.kill.load(Ordering::Acquire)
            || inner.queue.lock().unwrap().is_empty()
            || inner
                .running
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return;
        }
    }
}

impl Inner {
    fn run(&self, task: Task) {
        match task {
            Task::Copy { src, dst } => {
                let (src, dst) = (src.to_string_lossy(), dst.to_string_lossy());
                self.exec("cp", &["-bfvrp", src.as_ref(), dst.as_ref()]);
                self.task_count.fetch_sub(1, Ordering::AcqRel);
            }
            Task::Move { src, dst } => {
                let (src, dst) = (src.to_string_lossy(), dst.to_string_lossy());
                self.exec("mv", &["-bfv", src.as_ref(), dst.as_ref()]);
                self.task_count.fetch_sub(1, Ordering::AcqRel);
            }
            Task::Delete { src } => {
                let src = src.to_string_lossy();
                if self.use_trash {
                    self.exec("trash-put", &["-vrf", src.as_ref()]);
                } else {
                    self.exec("rm", &["-vrf", src.as_ref()]);
                }
                self.task_count.fetch_sub(1, Ordering::AcqRel);
            }
            Task::Reload(path) => {
                self.reload.lock().unwrap().push_back(path);
            }
            Task::Log(line) => self.add_log_line(&line),
            Task::Marker => self.add_log_line(""),
        }
    }

    /// Run the command and stream its combined stdout+stderr into the log
    /// line by line.
    fn exec(&self, cmd: &str, args: &[&str]) {
        let child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match child {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(cmd, error = %e, "failed to spawn file-operation command");
                self.add_log_line(&format!("can not exec command: {}", cmd));
                return;
            }
        };

        let stderr = child.stderr.take();
        let stdout = child.stdout.take();
        thread::scope(|s| {
            if let Some(err) = stderr {
                s.spawn(move || {
                    for line in BufReader::new(err).lines().map_while(Result::ok) {
                        self.add_log_line(&line);
                    }
                });
            }
            if let Some(out) = stdout {
                for line in BufReader::new(out).lines().map_while(Result::ok) {
                    self.add_log_line(&line);
                }
            }
        });
        let _ = child.wait();
    }

    fn add_log_line(&self, line: &str) {
        let mut log = self.log.lock().unwrap();
        if log.len() >= self.log_max_lines {
            log.pop_back();
        }
        log.push_front(line.to_string());
        self.log_updated.store(true, Ordering::Release);
    }
}
