//! Finds the date a callout block talks about.
use crate::months::Months;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

/// `chrono` format of every date the crate hands out.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// The grammar that produced a resolved date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGrammar {
    /// `YYYY-MM-DD` or `YYYY/MM/DD`.
    Iso,
    /// `MM/DD/YYYY`.
    Us,
    /// `January 15, 2023`, `Jan 15th 2023`.
    LongForm,
}

/// Digit boundaries are checked by [`digit_bounded`], so a match never
/// consumes the text around it.
static ISO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").expect("valid iso regex")
});

static US_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid us regex"));

static LONG_FORM_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b",
        Months::pattern()
    );
    Regex::new(&pattern).expect("valid long-form regex")
});

/// Resolves the first date found in `span`.
///
/// Grammars are tried in priority order, and the first one yielding a real
/// calendar date wins:
///
/// 1. **ISO-like**: `YYYY-MM-DD` or `YYYY/MM/DD` anywhere in the text.
/// 2. **US**: `MM/DD/YYYY`.
/// 3. **Long form**: an English month name or abbreviation, a day with an
///    optional ordinal suffix, and a year (`January 15, 2023`, `Sept 3rd 2021`).
///
/// Matches that are not valid dates (`2023-13-45`) are skipped, and the search
/// continues with the next match. Results of different grammars are never
/// cross-checked.
///
/// # Returns
///
/// `Some(NaiveDate)` on success, `None` when nothing in `span` looks like a date.
/// Picking a fallback is up to the caller, see [`fallback_date`].
pub fn resolve_date(span: &str) -> Option<NaiveDate> {
    resolve_date_with_grammar(span).map(|(date, _)| date)
}

/// Same as [`resolve_date`], also reporting which grammar matched.
pub fn resolve_date_with_grammar(span: &str) -> Option<(NaiveDate, DateGrammar)> {
    first_valid(&ISO_RE, span, digit_bounded, |c| ymd(c, 1, 2, 3))
        .map(|d| (d, DateGrammar::Iso))
        .or_else(|| {
            first_valid(&US_RE, span, us_bounded, |c| ymd(c, 3, 1, 2)).map(|d| (d, DateGrammar::Us))
        })
        .or_else(|| {
            first_valid(&LONG_FORM_RE, span, |_, _| true, long_form)
                .map(|d| (d, DateGrammar::LongForm))
        })
}

/// The date used when a block carries none: `reference`, or today.
pub fn fallback_date(reference: Option<NaiveDate>) -> NaiveDate {
    reference.unwrap_or_else(|| Local::now().date_naive())
}

/// Formats `date` as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// First match of `re` that sits on acceptable boundaries and is a real date.
/// A rejected match only moves the search one character forward, so a date
/// right after it is still found.
fn first_valid(
    re: &Regex,
    span: &str,
    bounded: fn(&str, Range<usize>) -> bool,
    to_date: impl Fn(&Captures) -> Option<NaiveDate>,
) -> Option<NaiveDate> {
    let mut at = 0;
    while let Some(caps) = re.captures_at(span, at) {
        let whole = caps.get(0)?;
        if bounded(span, whole.range()) {
            if let Some(date) = to_date(&caps) {
                return Some(date);
            }
        }
        at = whole.start() + span[whole.start()..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// No digit right before or right after `range`.
fn digit_bounded(span: &str, range: Range<usize>) -> bool {
    let bytes = span.as_bytes();
    let before = range.start.checked_sub(1).and_then(|i| bytes.get(i));
    !before.is_some_and(u8::is_ascii_digit) && !bytes.get(range.end).is_some_and(u8::is_ascii_digit)
}

/// Like [`digit_bounded`], and not the tail of a longer `a/b/c` run.
fn us_bounded(span: &str, range: Range<usize>) -> bool {
    let slash_before = range.start > 0 && span.as_bytes().get(range.start - 1) == Some(&b'/');
    digit_bounded(span, range) && !slash_before
}

fn ymd(caps: &Captures, year: usize, month: usize, day: usize) -> Option<NaiveDate> {
    let y = caps.get(year)?.as_str().parse::<i32>().ok()?;
    let m = caps.get(month)?.as_str().parse::<u32>().ok()?;
    let d = caps.get(day)?.as_str().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn long_form(caps: &Captures) -> Option<NaiveDate> {
    let month = Months::lookup(caps.get(1)?.as_str())?;
    let d = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let y = caps.get(3)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(y, month.number(), d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_dates_anywhere_in_the_text() {
        assert_eq!(resolve_date("Dreamt on 2023-01-15."), Some(date(2023, 1, 15)));
        assert_eq!(resolve_date("2023/02/03 night"), Some(date(2023, 2, 3)));
        assert_eq!(resolve_date("at 2024-03-09T04:00"), Some(date(2024, 3, 9)));
    }

    #[test]
    fn us_dates() {
        assert_eq!(
            resolve_date_with_grammar("night of 12/31/2022"),
            Some((date(2022, 12, 31), DateGrammar::Us))
        );
    }

    #[test]
    fn long_form_dates_with_ordinals() {
        assert_eq!(resolve_date("January 15, 2023"), Some(date(2023, 1, 15)));
        assert_eq!(resolve_date("on sept 3rd 2021 I woke"), Some(date(2021, 9, 3)));
        assert_eq!(
            resolve_date_with_grammar("Dec. 1st, 1999"),
            Some((date(1999, 12, 1), DateGrammar::LongForm))
        );
    }

    #[test]
    fn iso_wins_over_later_grammars() {
        let span = "January 1, 2020 then 2021-06-07 then 05/05/2019";
        assert_eq!(
            resolve_date_with_grammar(span),
            Some((date(2021, 6, 7), DateGrammar::Iso))
        );
    }

    #[test]
    fn impossible_matches_are_skipped() {
        assert_eq!(resolve_date("2023-13-45 and 2023-02-30"), None);
        assert_eq!(resolve_date("bad 2023-13-45, good 2023-04-05"), Some(date(2023, 4, 5)));
        assert_eq!(resolve_date("Feb 30, 2023"), None);
    }

    #[test]
    fn rejected_match_does_not_hide_the_next_date() {
        assert_eq!(resolve_date("2023-13-45 2023-04-05"), Some(date(2023, 4, 5)));
        assert_eq!(resolve_date("2023-02-30 2023-04-05"), Some(date(2023, 4, 5)));
        assert_eq!(resolve_date("13/45/2023 04/05/2023"), Some(date(2023, 4, 5)));
    }

    #[test]
    fn dates_glued_to_other_digits_are_ignored() {
        assert_eq!(resolve_date("ref 12023-04-05"), None);
        assert_eq!(resolve_date("2023-04-051"), None);
        assert_eq!(resolve_date("id 1/04/05/2023"), None);
        assert_eq!(resolve_date("(2023-04-05)"), Some(date(2023, 4, 5)));
    }

    #[test]
    fn no_date_means_none() {
        assert_eq!(resolve_date("I flew over water."), None);
        assert_eq!(resolve_date("Clarity: 4/5"), None);
        assert_eq!(resolve_date(""), None);
    }

    #[test]
    fn fallback_prefers_the_reference_date() {
        assert_eq!(fallback_date(Some(date(2020, 5, 5))), date(2020, 5, 5));
        assert_eq!(fallback_date(None), Local::now().date_naive());
    }

    #[test]
    fn canonical_format_is_zero_padded() {
        assert_eq!(format_date(date(2023, 1, 5)), "2023-01-05");
    }
}
