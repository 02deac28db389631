use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use super::types::FileKind;

/// Immutable snapshot of one directory entry, taken at `readdir` time with
/// `lstat` (and a follow-up `stat` for symlinks so we know whether the link
/// points at a directory).
///
/// Entries are identified by their full path; panes never hold references
/// into each other's listings, only paths.
#[derive(Clone, Debug)]
pub struct FileEntry {
    /// Directory the entry lives in.
    pub parent: PathBuf,
    /// Base name without any decoration.
    pub name: String,
    pub kind: FileKind,
    /// Raw permission bits from `st_mode` (type bits included).
    pub mode: u32,
    /// Owner-executable regular file.
    pub owner_exec: bool,
    pub size: u64,
    pub mtime_secs: i64,
    pub mtime_nsecs: i64,
    /// Symlink whose target is a directory.
    pub link_dir: bool,
}

impl FileEntry {
    /// Stat `parent/name` and build the snapshot. Entries that vanish
    /// between `readdir` and `lstat` surface the error to the caller, which
    /// simply drops them.
    pub fn read(parent: &Path, name: &str) -> io::Result<FileEntry> {
        let path = parent.join(name);
        let meta = fs::symlink_metadata(&path)?;
        let ft = meta.file_type();

        let kind = if ft.is_dir() {
            FileKind::Directory
        } else if ft.is_symlink() {
            FileKind::Symlink
        } else if ft.is_file() {
            FileKind::Regular
        } else {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_fifo() {
                FileKind::Fifo
            } else if ft.is_socket() {
                FileKind::Socket
            } else {
                FileKind::Other
            }
        };

        // For symlinks a second, following stat decides directory-ness.
        let link_dir = kind == FileKind::Symlink
            && fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);

        let mode = meta.mode();
        Ok(FileEntry {
            parent: parent.to_path_buf(),
            name: name.to_string(),
            kind,
            mode,
            owner_exec: ft.is_file() && mode & libc::S_IXUSR != 0,
            size: meta.size(),
            mtime_secs: meta.mtime(),
            mtime_nsecs: meta.mtime_nsec(),
            link_dir,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    /// Directory for navigation purposes: a real directory or a symlink to one.
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory || self.link_dir
    }

    pub fn is_link(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    pub fn is_exe(&self) -> bool {
        self.owner_exec
    }

    /// Displayed name; directories carry a trailing `/`.
    pub fn display_name(&self) -> String {
        if self.is_dir() {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Filename suffix after the last dot. Directories and dotfiles with no
    /// other dot have none.
    pub fn suffix(&self) -> Option<&str> {
        if self.is_dir() {
            return None;
        }
        match self.name.rfind('.') {
            Some(0) | None => None,
            Some(i) => Some(&self.name[i + 1..]),
        }
    }

    /// `ls -l`-style mode string, e.g. `drwxr-xr-x`.
    pub fn mode_string(&self) -> String {
        mode_string(self.mode)
    }

    /// Human-readable size, `coolsize` style: 1024 divisor, fractional
    /// digits growing with magnitude.
    pub fn size_string(&self) -> String {
        human_size(self.size)
    }

    pub fn mtime_string(&self) -> String {
        let dt: DateTime<Local> = Local
            .timestamp_opt(self.mtime_secs, self.mtime_nsecs.clamp(0, 999_999_999) as u32)
            .earliest()
            .unwrap_or_else(|| Local.timestamp_opt(0, 0).earliest().unwrap());
        dt.format("%Y/%m/%d %H:%M:%S").to_string()
    }
}

/// Render `st_mode` the way `strmode(3)` does, minus the trailing space.
pub fn mode_string(mode: u32) -> String {
    let mut s = String::with_capacity(10);
    s.push(match mode & libc::S_IFMT {
        libc::S_IFDIR => 'd',
        libc::S_IFLNK => 'l',
        libc::S_IFIFO => 'p',
        libc::S_IFSOCK => 's',
        libc::S_IFBLK => 'b',
        libc::S_IFCHR => 'c',
        libc::S_IFREG => '-',
        _ => '?',
    });

    let rwx = |r: u32, w: u32, x: u32, special: u32, set_ch: char, clear_ch: char| {
        let mut part = String::with_capacity(3);
        part.push(if mode & r != 0 { 'r' } else { '-' });
        part.push(if mode & w != 0 { 'w' } else { '-' });
        part.push(if mode & special != 0 {
            if mode & x != 0 {
                set_ch
            } else {
                clear_ch
            }
        } else if mode & x != 0 {
            'x'
        } else {
            '-'
        });
        part
    };

    s.push_str(&rwx(libc::S_IRUSR, libc::S_IWUSR, libc::S_IXUSR, libc::S_ISUID, 's', 'S'));
    s.push_str(&rwx(libc::S_IRGRP, libc::S_IWGRP, libc::S_IXGRP, libc::S_ISGID, 's', 'S'));
    s.push_str(&rwx(libc::S_IROTH, libc::S_IWOTH, libc::S_IXOTH, libc::S_ISVTX, 't', 'T'));
    s
}

/// Human-readable byte count with the rounding scheme the pane columns
/// expect: one fractional digit at K, two at M, up to four above that.
pub fn human_size(size: u64) -> String {
    const UNITS: &[u8] = b"BKMGTPEZY";

    let mut size = size;
    let mut rem: u64 = 0;
    let mut i = 0usize;
    while size > 1024 {
        rem = size & 0x3FF;
        size >>= 10;
        i += 1;
    }

    if i == 1 {
        rem = (rem * 1000) >> 10;
        rem /= 10;
        if rem % 10 >= 5 {
            rem = rem / 10 + 1;
            if rem == 10 {
                size += 1;
                rem = 0;
            }
        } else {
            rem /= 10;
        }
    } else if i == 2 {
        rem = (rem * 1000) >> 10;
        if rem % 10 >= 5 {
            rem = rem / 10 + 1;
            if rem == 100 {
                size += 1;
                rem = 0;
            }
        } else {
            rem /= 10;
        }
    } else if i > 0 {
        rem = (rem * 10000) >> 10;
        if rem % 10 >= 5 {
            rem = rem / 10 + 1;
            if rem == 1000 {
                size += 1;
                rem = 0;
            }
        } else {
            rem /= 10;
        }
    }

    if i > 0 && i < 6 {
        format!("{}.{:0w$}{}", size, rem, UNITS[i] as char, w = i)
    } else {
        format!("{}{}", size, UNITS[i] as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn reads_regular_file_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("hello.txt"), b"hello").unwrap();

        let e = FileEntry::read(tmp.path(), "hello.txt").unwrap();
        assert_eq!(e.kind, FileKind::Regular);
        assert_eq!(e.size, 5);
        assert!(!e.is_dir());
        assert_eq!(e.display_name(), "hello.txt");
        assert_eq!(e.suffix(), Some("txt"));
        assert_eq!(e.path(), tmp.path().join("hello.txt"));
    }

    #[test]
    fn directory_gets_trailing_slash_and_no_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub.d")).unwrap();

        let e = FileEntry::read(tmp.path(), "sub.d").unwrap();
        assert!(e.is_dir());
        assert_eq!(e.display_name(), "sub.d/");
        assert_eq!(e.suffix(), None);
    }

    #[test]
    fn symlink_to_directory_is_navigable() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("target")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("target"), tmp.path().join("link")).unwrap();

        let e = FileEntry::read(tmp.path(), "link").unwrap();
        assert_eq!(e.kind, FileKind::Symlink);
        assert!(e.link_dir);
        assert!(e.is_dir());
        assert!(e.is_link());
    }

    #[test]
    fn owner_exec_flag_tracks_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("run.sh");
        fs::write(&p, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&p, fs::Permissions::from_mode(0o755)).unwrap();

        let e = FileEntry::read(tmp.path(), "run.sh").unwrap();
        assert!(e.is_exe());
        assert!(e.mode_string().starts_with("-rwxr-xr-x"));
    }

    #[test]
    fn dotfile_has_no_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(".bashrc"), b"x").unwrap();
        let e = FileEntry::read(tmp.path(), ".bashrc").unwrap();
        assert_eq!(e.suffix(), None);
    }

    #[test]
    fn human_size_sample_points() {
        assert_eq!(human_size(0), "0B");
        assert_eq!(human_size(1023), "1023B");
        assert_eq!(human_size(2048), "2.0K");
        assert_eq!(human_size(5 * 1024 * 1024), "5.00M");
    }
}
