//! Display helpers shared by every view that lists posts.

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

pub const HUMAN_DATETIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none] [month repr:long] [year], [hour]:[minute]");

/// Length of the body excerpt shown as a post's heading in listings.
pub const PREVIEW_CHAR_COUNT: usize = 15;

/// First [`PREVIEW_CHAR_COUNT`] characters of a post body, with an
/// ellipsis when anything was cut. Counts characters, not bytes, so
/// multi-byte text never splits mid-glyph.
pub fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHAR_COUNT).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

pub fn format_human_datetime(when: OffsetDateTime) -> String {
    when.format(HUMAN_DATETIME_FORMAT).unwrap_or_default()
}
