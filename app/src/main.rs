use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use minase::app::settings::{self, Config};
use minase::app::types::PickerMode;
use minase::runner::terminal::{force_restore, init_terminal};
use minase::runner::{event_loop, Controller};

#[derive(Parser, Debug)]
#[command(name = "minase", about = "Dual-pane terminal file manager", disable_version_flag = true)]
struct Cli {
    /// Write the chosen file to this path and exit on Enter.
    #[arg(long, value_name = "OUT")]
    choosefile: Option<PathBuf>,

    /// Write the chosen files (selection set) to this path and exit.
    #[arg(long, value_name = "OUT")]
    choosefiles: Option<PathBuf>,

    /// Write the chosen directory to this path and exit.
    #[arg(long, value_name = "OUT")]
    choosedir: Option<PathBuf>,

    /// Start directory; falls back to the working directory.
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            // Unrecognised arguments: usage on stderr, exit 1.
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
        Err(e) => {
            // --help and friends.
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            force_restore();
            eprintln!("minase: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_dir = settings::config_dir();
    init_logging(config_dir.as_deref());

    let mut config = Config::default();
    let mut bookmarks = Vec::new();
    let mut plugins = Vec::new();
    if let Some(dir) = &config_dir {
        if let Ok(loaded) = Config::load(&dir.join("config.ini")) {
            config = loaded;
        }
        bookmarks = settings::load_bookmarks(&dir.join("bookmarks")).unwrap_or_default();
        plugins = settings::load_plugins(&dir.join("plugin.ini")).unwrap_or_default();
    }

    let start_path = resolve_start_path(cli.path.as_deref());

    let (picker_mode, picker_output) = if let Some(out) = cli.choosefiles {
        (PickerMode::Files, Some(settings::tilde_expand(&out.to_string_lossy())))
    } else if let Some(out) = cli.choosedir {
        (PickerMode::Dir, Some(settings::tilde_expand(&out.to_string_lossy())))
    } else if let Some(out) = cli.choosefile {
        (PickerMode::File, Some(settings::tilde_expand(&out.to_string_lossy())))
    } else {
        (PickerMode::None, None)
    };

    let ctrl = Controller::new(
        &start_path,
        picker_mode,
        picker_output,
        Arc::new(config),
        bookmarks,
        plugins,
    )?;

    let terminal = init_terminal().map_err(|e| anyhow::anyhow!("terminal init failed: {}", e))?;
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        force_restore();
        default_hook(info);
    }));

    event_loop::run(terminal, ctrl)
}

/// The CLI path when it names a directory, the working directory otherwise.
fn resolve_start_path(arg: Option<&Path>) -> PathBuf {
    if let Some(path) = arg {
        if path.is_dir() {
            return path.to_path_buf();
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))
}

/// File-backed tracing; the terminal belongs to the UI.
fn init_logging(config_dir: Option<&Path>) {
    use tracing_subscriber::EnvFilter;

    let Some(dir) = config_dir else {
        return;
    };
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }
    let appender = tracing_appender::rolling::never(dir, "minase.log");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(appender)
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
