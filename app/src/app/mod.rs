//! Core state: directory entries, listings, pane state and configuration.

pub mod dir_list;
pub mod entry;
pub mod pane;
pub mod settings;
pub mod types;

pub use dir_list::DirectoryListing;
pub use entry::FileEntry;
pub use pane::PaneState;
pub use settings::{Config, Plugin, PluginOp};
pub use types::{
    Clipboard, ClipboardOp, FileKind, FilterKind, PickerMode, SortKey, SortOrder, ViewStyle,
};
