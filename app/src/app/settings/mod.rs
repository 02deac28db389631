use anyhow::{Context, Result};
use ini::Ini;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Read-once application options, an immutable snapshot taken at startup
/// and passed around by reference. Loaded from the `[Options]` section of
/// `$HOME/.config/Minase/config.ini`; every key has a default so a missing
/// file is not an error.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bound on the task-log deque.
    pub log_max_lines: usize,
    /// Line cap for text/directory previews; -1 means unlimited.
    pub preview_max_lines: i64,
    pub use_trash: bool,
    /// Directory holding nano syntax rule files.
    pub nanorc_path: String,
    pub wcwidth_cjk: bool,
    /// Generic opener command.
    pub opener: String,
    pub file_view_type: i64,
    pub sort_type: i64,
    pub sort_order: i64,
    pub filter_type: i64,
    /// Root directory for archive mounts (may start with `~/`).
    pub archive_mnt_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_max_lines: 100,
            preview_max_lines: 50,
            use_trash: false,
            nanorc_path: "/usr/share/nano".to_string(),
            wcwidth_cjk: false,
            opener: "xdg-open".to_string(),
            file_view_type: 0,
            sort_type: 0,
            sort_order: 0,
            filter_type: 0,
            archive_mnt_dir: "~/.config/Minase/mnt".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let ini = Ini::load_from_file(path)
            .with_context(|| format!("can't load {}", path.display()))?;
        let mut cfg = Config::default();
        let Some(opts) = ini.section(Some("Options")) else {
            return Ok(cfg);
        };

        let get_i64 = |key: &str, default: i64| -> i64 {
            opts.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
        };
        let get_bool = |key: &str, default: bool| -> bool {
            opts.get(key)
                .map(|v| matches!(v.trim(), "true" | "True" | "TRUE" | "1" | "yes" | "on"))
                .unwrap_or(default)
        };
        let get_str = |key: &str, default: &str| -> String {
            opts.get(key).unwrap_or(default).to_string()
        };

        cfg.log_max_lines = get_i64("LogMaxLines", 100).max(1) as usize;
        cfg.preview_max_lines = get_i64("PreViewMaxLines", 50);
        cfg.use_trash = get_bool("UseTrash", false);
        cfg.nanorc_path = get_str("NanorcPath", "/usr/share/nano");
        cfg.wcwidth_cjk = get_bool("wcwidth-cjk", false);
        cfg.opener = get_str("Opener", "xdg-open");
        cfg.file_view_type = get_i64("FileViewType", 0);
        cfg.sort_type = get_i64("SortType", 0);
        cfg.sort_order = get_i64("SortOrder", 0);
        cfg.filter_type = get_i64("FilterType", 0);
        cfg.archive_mnt_dir = get_str("ArchiveMntDir", "~/.config/Minase/mnt");
        Ok(cfg)
    }
}

/// One entry of the plugin manifest. The operation code and silent bit are
/// derived from the script basename: a leading `_` asks for a text prompt,
/// the first (or post-underscore) character selects the operation, a
/// trailing `%` suppresses the terminal handover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: String,
    pub file_path: String,
    pub gui: bool,
    pub key: Option<char>,
    pub input_text: bool,
    pub silent: bool,
    pub operation: PluginOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluginOp {
    #[default]
    None,
    /// Read one path from the temp file and change into it.
    ChangeDirectory,
    /// Change directory and reposition the cursor on a named entry.
    ChangeCurrentFile,
}

pub fn load_plugins(path: &Path) -> Result<Vec<Plugin>> {
    let ini = Ini::load_from_file(path)
        .with_context(|| format!("can't load {}", path.display()))?;

    let mut plugins = Vec::new();
    for (section, props) in ini.iter() {
        let Some(name) = section else { continue };
        let file_path = props.get("filePath").unwrap_or("").to_string();
        let mut gui = props
            .get("gui")
            .map(|v| matches!(v.trim(), "true" | "True" | "1"))
            .unwrap_or(false);
        let key = props.get("key").and_then(|k| k.chars().next());

        let mut input_text = false;
        let mut silent = false;
        let mut operation = PluginOp::None;

        if let Some(basename) = Path::new(&file_path).file_name().and_then(|n| n.to_str()) {
            if !basename.is_empty() {
                let mut op = basename.chars().next().unwrap();
                if op == '_' {
                    input_text = true;
                    if basename.len() > 2 {
                        op = basename.chars().nth(1).unwrap();
                    }
                }
                silent = basename.ends_with('%');

                operation = match op {
                    '1' => PluginOp::ChangeDirectory,
                    '2' => PluginOp::ChangeCurrentFile,
                    _ => PluginOp::None,
                };
                // Directory/cursor plugins must run with the terminal held.
                if operation != PluginOp::None {
                    gui = false;
                }
            }
        }

        plugins.push(Plugin {
            name: name.to_string(),
            file_path,
            gui,
            key,
            input_text,
            silent,
            operation,
        });
    }
    Ok(plugins)
}

/// Bookmarks: one path per line, blank lines skipped.
pub fn load_bookmarks(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("can't load {}", path.display()))?;
    Ok(raw
        .lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// `$HOME/.config/Minase`.
pub fn config_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(|h| PathBuf::from(h).join(".config").join("Minase"))
}

/// Expand a leading `~/` using `$HOME`. Paths without the prefix pass
/// through untouched.
pub fn tilde_expand(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
        return PathBuf::from("/").join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.log_max_lines, 100);
        assert_eq!(cfg.preview_max_lines, 50);
        assert!(!cfg.use_trash);
        assert_eq!(cfg.nanorc_path, "/usr/share/nano");
        assert_eq!(cfg.opener, "xdg-open");
        assert_eq!(cfg.archive_mnt_dir, "~/.config/Minase/mnt");
    }

    #[test]
    fn loads_options_section() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.ini");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[Options]").unwrap();
        writeln!(f, "LogMaxLines=250").unwrap();
        writeln!(f, "PreViewMaxLines=-1").unwrap();
        writeln!(f, "UseTrash=true").unwrap();
        writeln!(f, "SortType=2").unwrap();
        writeln!(f, "Opener=mimeopen").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.log_max_lines, 250);
        assert_eq!(cfg.preview_max_lines, -1);
        assert!(cfg.use_trash);
        assert_eq!(cfg.sort_type, 2);
        assert_eq!(cfg.opener, "mimeopen");
        // Untouched keys keep their defaults.
        assert_eq!(cfg.filter_type, 0);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(Config::load(Path::new("/nonexistent/minase.ini")).is_err());
    }

    #[test]
    fn plugin_codes_derive_from_basename() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plugin.ini");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[fzf-cd]").unwrap();
        writeln!(f, "filePath=~/.config/Minase/plugins/1_fzf_cd.sh").unwrap();
        writeln!(f, "gui=true").unwrap();
        writeln!(f, "key=f").unwrap();
        writeln!(f, "[locate]").unwrap();
        writeln!(f, "filePath=~/.config/Minase/plugins/_2locate.sh").unwrap();
        writeln!(f, "[notify]").unwrap();
        writeln!(f, "filePath=~/.config/Minase/plugins/0notify%").unwrap();

        let plugins = load_plugins(&path).unwrap();
        assert_eq!(plugins.len(), 3);

        let fzf = plugins.iter().find(|p| p.name == "fzf-cd").unwrap();
        assert_eq!(fzf.operation, PluginOp::ChangeDirectory);
        // Directory plugins force gui off.
        assert!(!fzf.gui);
        assert_eq!(fzf.key, Some('f'));
        assert!(!fzf.input_text);

        let locate = plugins.iter().find(|p| p.name == "locate").unwrap();
        assert_eq!(locate.operation, PluginOp::ChangeCurrentFile);
        assert!(locate.input_text);

        let notify = plugins.iter().find(|p| p.name == "notify").unwrap();
        assert_eq!(notify.operation, PluginOp::None);
        assert!(notify.silent);
    }

    #[test]
    fn bookmarks_skip_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bookmarks");
        fs::write(&path, "/home\n\n/tmp\r\n").unwrap();
        let bm = load_bookmarks(&path).unwrap();
        assert_eq!(bm, vec!["/home", "/tmp"]);
    }

    #[test]
    fn tilde_expansion() {
        let home = env::var("HOME").unwrap_or_else(|_| "/".into());
        assert_eq!(tilde_expand("~/x"), Path::new(&home).join("x"));
        assert_eq!(tilde_expand("/abs/x"), PathBuf::from("/abs/x"));
    }
}
