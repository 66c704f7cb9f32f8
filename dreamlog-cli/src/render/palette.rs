//! Colors of the terminal output, named after what they mark in a journal.
use termimad::{
    MadSkin,
    crossterm::style::{Attribute, Color},
};

pub struct Palette;

impl Palette {
    pub const TEXT: Color = rgb(0xC0, 0xCA, 0xF5);
    /// Entry dates.
    pub const DATE: Color = rgb(0x7A, 0xA2, 0xF7);
    pub const TITLE: Color = rgb(0xE0, 0xAF, 0x68);
    /// Titles of fallback records, and the document error list.
    pub const RECOVERED: Color = rgb(0xF7, 0x76, 0x8E);
    pub const METRIC: Color = rgb(0x9E, 0xCE, 0x6A);
    /// Validation warnings and the missing-date note.
    pub const NOTE: Color = rgb(0x56, 0x5F, 0x89);
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

/// Skin for the markdown that `entry_markdown` and `print_problems` produce.
pub fn journal_skin() -> MadSkin {
    let mut skin = MadSkin::default();

    skin.paragraph.set_fg(Palette::TEXT);
    skin.bold.set_fg(Palette::TEXT);
    // `*no date found in entry*`
    skin.italic.set_fg(Palette::NOTE);

    // `# Errors:` and `# Warnings:`
    skin.headers[0].set_fg(Palette::RECOVERED);
    skin.headers[0].add_attr(Attribute::Bold);
    // `## <date>: <title>`
    skin.headers[1].set_fg(Palette::TITLE);
    skin.headers[1].add_attr(Attribute::Bold);

    skin.table.set_fg(Palette::METRIC);
    skin.bullet.set_fg(Palette::RECOVERED);
    // Validation warnings are rendered as `> ...` lines.
    skin.quote_mark.set_char('!');
    skin.quote_mark.set_fg(Palette::NOTE);
    skin.horizontal_rule.set_fg(Palette::NOTE);
    skin.inline_code.set_fg(Palette::METRIC);

    skin
}
