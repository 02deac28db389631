//! Minase: a dual-pane terminal file manager.
//!
//! The left half of the screen lists a directory; the right half renders
//! a rich preview of the entry under the cursor (text with nano-style
//! highlighting, sixel images, archive listings, audio tags, directory
//! listings), built by a cancellable background worker. File operations
//! run through a serial background queue feeding a bounded log. Up to
//! four tabs share one process-wide selection set.

pub mod app;
pub mod highlight;
pub mod input;
pub mod preview;
pub mod runner;
pub mod tasks;
pub mod ui;
pub mod util;

pub use crate::app::{
    Clipboard, ClipboardOp, Config, DirectoryListing, FileEntry, FileKind, FilterKind, PaneState,
    PickerMode, Plugin, PluginOp, SortKey, SortOrder, ViewStyle,
};
pub use crate::runner::Controller;
