mod builder;
mod content;
mod record;
mod title;

pub use builder::{BuildOptions, build_entry, callout_id, fallback_record};
pub use content::{clean_content, unquote};
pub use record::{CalloutMetadata, Record, Source, count_words};
pub use title::{
    MAX_TITLE_CHARS, PLACEHOLDER_TITLE, TitleMatch, TitleSource, extract_title, find_title,
};
