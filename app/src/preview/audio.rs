//! Audio tag lines for the preview pane.

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;

/// Decode tag and stream properties into the preview's fixed line layout.
/// Any probe or parse failure collapses to a single stub line.
pub fn tag_lines(path: &Path) -> Vec<String> {
    let tagged = match Probe::open(path).and_then(|p| p.read()) {
        Ok(t) => t,
        Err(_) => return vec!["No audio properties".to_string()],
    };

    let props = tagged.properties();
    let secs = props.duration().as_secs();

    let mut lines = Vec::with_capacity(12);
    lines.push(format!("Length    : {:02}:{:02}", secs / 60, secs % 60));
    lines.push(String::new());
    lines.push(format!(
        "SampleRate: {}hz",
        props.sample_rate().unwrap_or(0)
    ));
    lines.push(format!(
        "Bitrate   : {}kb/s",
        props.audio_bitrate().unwrap_or(0)
    ));
    lines.push(String::new());

    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
    let text = |v: Option<std::borrow::Cow<'_, str>>| v.map(|s| s.into_owned()).unwrap_or_default();

    match tag {
        Some(tag) => {
            lines.push(format!("Title     : {}", text(tag.title())));
            lines.push(format!("Artist    : {}", text(tag.artist())));
            lines.push(format!("Album     : {}", text(tag.album())));
            lines.push(format!("Comment   : {}", text(tag.comment())));
            lines.push(format!("Genre     : {}", text(tag.genre())));
            lines.push(format!("Year      : {}", tag.year().unwrap_or(0)));
            lines.push(format!("Track     : {}", tag.track().unwrap_or(0)));
        }
        None => {
            for label in ["Title", "Artist", "Album", "Comment", "Genre"] {
                lines.push(format!("{:<10}: ", label));
            }
            lines.push("Year      : 0".to_string());
            lines.push("Track     : 0".to_string());
        }
    }

    lines
}
