use super::common::{fixed_date, full_entry, hostile_inputs, minimal_entries, mk_options};
use crate::entry::{count_words, extract_title};
use crate::metrics::MetricValue;
use crate::{CollectingSink, Level, ParseOptions, TracingSink, parse, parse_with_sink, sanitize};
use regex::Regex;

#[test]
fn hundred_minimal_entries_in_input_order() {
    let result = parse(&minimal_entries(100), &mk_options("dream")).unwrap();

    assert_eq!(result.entries.len(), 100);
    assert_eq!(result.metadata.total_entries, 100);
    assert_eq!(result.metadata.error_count, 0);
    for (i, entry) in result.entries.iter().enumerate() {
        assert_eq!(entry.title, format!("Dream {}", i + 1));
        assert_eq!(entry.content, format!("Minimal content for dream {}.", i + 1));
    }
    assert_eq!(result.metadata.total_word_count, 500);
    assert_eq!(result.metadata.average_word_count, 5.0);
}

#[test]
fn full_entries_carry_every_field() {
    let text = format!(
        "Some preamble that is not an entry.\n\n{}{}",
        full_entry("Harbour lights", "2023-01-15", "I walked along the docks at night."),
        full_entry("The long staircase", "January 20th, 2023", "Stairs went down forever."),
    );
    let result = parse(&text, &mk_options("dream")).unwrap();
    assert_eq!(result.entries.len(), 2);

    let first = &result.entries[0];
    assert_eq!(first.title, "Harbour lights");
    assert_eq!(first.date_string(), "2023-01-15");
    assert!(first.content.contains("I walked along the docks at night."));
    assert!(!first.content.contains("Clarity"));
    assert_eq!(first.metrics["Clarity"], MetricValue::Number(4.0));
    assert_eq!(first.metrics["Mood"], MetricValue::Text("calm".to_string()));
    assert!(!first.metrics.contains_key("Date"));
    assert_eq!(first.source.file(), "journal/dreams.md");
    assert!(!first.callout_metadata.date_fallback);

    assert_eq!(result.entries[1].date_string(), "2023-01-20");
    assert_eq!(result.entries[1].title, "The long staircase");
}

#[test]
fn malformed_middle_block_does_not_block_its_siblings() {
    let text = format!(
        "{}[!dream] Broken\n```\nunterminated fence\n\n{}",
        full_entry("Before", "2023-02-01", "A quiet field."),
        full_entry("After", "2023-02-03", "A noisy market."),
    );

    let lenient = parse(&text, &mk_options("dream")).unwrap();
    assert_eq!(lenient.entries.len(), 3);
    assert_eq!(lenient.entries[0].title, "Before");
    assert!(lenient.entries[1].is_recovered());
    assert_eq!(lenient.entries[2].title, "After");
    assert_eq!(lenient.metadata.error_count, 1);
    assert!(!lenient.metadata.success);

    let strict = parse(&text, &mk_options("dream").strict(true));
    assert!(strict.is_err());
}

#[test]
fn missing_dates_fall_back_to_a_canonical_date() {
    let canonical = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    let text = "[!dream] No date anywhere\nJust a dream about a train.\nClarity: 2";

    let result = parse(text, &mk_options("dream")).unwrap();
    let entry = &result.entries[0];
    assert!(canonical.is_match(&entry.date_string()));
    assert_eq!(entry.date, fixed_date());
    assert!(entry.callout_metadata.date_fallback);

    let today = parse(text, &ParseOptions::default()).unwrap();
    assert!(canonical.is_match(&today.entries[0].date_string()));
}

#[test]
fn hostile_input_never_fails_in_lenient_mode() {
    for input in hostile_inputs() {
        let result = parse(&input, &mk_options("dream"))
            .unwrap_or_else(|err| panic!("{input:?} failed: {err}"));
        assert_eq!(result.metadata.total_entries, result.entries.len());
        assert_eq!(result.metadata.success, result.metadata.error_count == 0);
        assert!(result.entries.len() <= crate::scanner::DEFAULT_MAX_MATCHES);
    }
}

#[test]
fn thousands_of_markers_hit_the_cap() {
    let text = "[!dream] x ".repeat(3_000);
    let result = parse(&text, &mk_options("dream")).unwrap();
    assert_eq!(result.entries.len(), 1000);
    assert!(result.metadata.warnings.iter().any(|w| w.contains("1000")));
}

#[test]
fn empty_input_gives_an_empty_successful_result() {
    let result = parse("", &mk_options("dream")).unwrap();
    assert!(result.entries.is_empty());
    assert!(result.metadata.success);
    assert_eq!(result.metadata.warning_count, 0);
}

#[test]
fn word_counts_match_content() {
    let mut text = minimal_entries(5);
    text.push_str(&full_entry("Counting", "2023-03-03", "one two  three\tfour\nfive"));
    text.push_str("[!dream] Broken\n~~~\n");
    for input in hostile_inputs().into_iter().chain([text]) {
        let result = parse(&input, &mk_options("dream")).unwrap();
        for entry in &result.entries {
            assert_eq!(entry.word_count, count_words(entry.content.trim()), "{entry:?}");
        }
    }
}

#[test]
fn sanitizing_twice_changes_nothing() {
    let mut inputs = hostile_inputs();
    inputs.push("\u{2018}a\u{2019} \u{2014} b\u{00A0}c\u{200B}d\re".to_string());
    for input in inputs {
        let once = sanitize(&input);
        assert_eq!(sanitize(&once), once);
    }
}

#[test]
fn short_heading_is_the_title() {
    let long = "x".repeat(50);
    for title in [
        "Flying",
        "A dream about 3 cats",
        "Learning C#",
        "**Bold**",
        "#hashtag night",
        long.as_str(),
    ] {
        assert_eq!(extract_title(&format!("# {title}\nbody text")), title);
        assert_eq!(extract_title(&format!("# {title}   \nbody text")), title);
    }
}

#[test]
fn diagnostics_reach_the_sink() {
    let sink = CollectingSink::new();
    let text = format!("{}[!dream] Broken\n```\n", minimal_entries(2));
    parse_with_sink(&text, &mk_options("dream"), &sink).unwrap();

    let records = sink.take();
    assert!(records.iter().any(|d| d.category == "builder" && d.level == Level::Error));
    assert!(records.iter().any(|d| d.category == "parser" && d.level == Level::Info));

    // No subscriber installed: tracing output simply goes nowhere.
    parse_with_sink(&text, &mk_options("dream"), &TracingSink).unwrap();
}

#[test]
fn independent_parses_run_concurrently() {
    let text = &minimal_entries(50);
    let options = &mk_options("dream");
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || parse(text, options)))
            .collect();
        for handle in handles {
            let result = handle.join().unwrap().unwrap();
            assert_eq!(result.entries.len(), 50);
        }
    });
}
