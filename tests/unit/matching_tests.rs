/*!
 * Alignment matcher tests covering the cascade guarantees
 */

use std::collections::HashSet;

use doctrans::document::{TextUnit, UnitKind, UnitLocation};
use doctrans::translation::matching::{
    match_unit, match_units, MatchStatus, MatchStrategy, MatchThresholds,
};
use doctrans::translation::TranslationMapping;

fn mapping(pairs: &[(&str, &str)]) -> TranslationMapping {
    pairs.iter().map(|(s, t)| (s.to_string(), t.to_string())).collect()
}

fn units(texts: &[&str]) -> Vec<TextUnit> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| TextUnit::new(t.to_string(), UnitLocation::paragraph(0, 0, i), "zh"))
        .collect()
}

#[test]
fn test_exact_match_wins_over_a_more_similar_but_inexact_entry() {
    // The mapping holds both the verbatim source and a close variant
    let mapping = mapping(&[
        ("Revenue increased by 12%!", "收入增长了12%！"),
        ("Revenue increased by 12%.", "收入增长了12%。"),
    ]);
    let mut used = HashSet::new();

    let result = match_unit(
        "Revenue increased by 12%.",
        UnitKind::Paragraph,
        &mapping,
        &mut used,
        &MatchThresholds::default(),
    )
    .unwrap();

    assert_eq!(result.strategy, MatchStrategy::Exact);
    assert_eq!(result.translation, "收入增长了12%。");
    assert_eq!(result.confidence, 1.0);
}

#[test]
fn test_markup_echoed_by_the_model_still_matches_exactly() {
    let mapping = mapping(&[("**Revenue grew**", "收入增长")]);
    let mut used = HashSet::new();

    let result = match_unit(
        "Revenue grew",
        UnitKind::Paragraph,
        &mapping,
        &mut used,
        &MatchThresholds::default(),
    )
    .unwrap();

    assert_eq!(result.strategy, MatchStrategy::Exact);
}

#[test]
fn test_each_unit_gets_its_own_entry_when_counts_allow() {
    // Two near-duplicate units, two near-duplicate entries: strict
    // consumption forces a one-to-one assignment
    let units = units(&["Net income", "Net incom"]);
    let mapping = mapping(&[("Net income", "净收入"), ("Net incom", "净收")]);
    let mut used = HashSet::new();

    let results = match_units(&units, &mapping, &mut used, &MatchThresholds::default());

    let translations: Vec<&str> = results
        .iter()
        .filter_map(|r| r.result.as_ref().map(|m| m.translation.as_str()))
        .collect();
    assert_eq!(translations, vec!["净收入", "净收"]);
    assert_eq!(used.len(), 2);
}

#[test]
fn test_consumed_entry_is_gone_for_later_units() {
    let units = units(&["Net income", "Net incom"]);
    let mapping = mapping(&[("Net income", "净收入")]);
    let mut used = HashSet::new();

    let results = match_units(&units, &mapping, &mut used, &MatchThresholds::default());

    assert_eq!(results[0].status, MatchStatus::Matched);
    // The second unit would similarity-match the same entry; it stays
    // unmatched instead of reusing it
    assert_eq!(results[1].status, MatchStatus::Unmatched);
}

#[test]
fn test_trailing_punctuation_difference_is_a_normalized_match() {
    let mapping = mapping(&[("Revenue increased by 12%", "收入增长了12%")]);
    let mut used = HashSet::new();

    let result = match_unit(
        "Revenue increased by 12%.",
        UnitKind::Paragraph,
        &mapping,
        &mut used,
        &MatchThresholds::default(),
    )
    .unwrap();

    assert_eq!(result.strategy, MatchStrategy::Normalized);
    assert!((result.confidence - 0.9).abs() < f32::EPSILON);
}

#[test]
fn test_unmatched_unit_consumes_nothing() {
    let units = units(&["Completely unrelated heading"]);
    let mapping = mapping(&[("Quarterly figures table", "季度数据表")]);
    let mut used = HashSet::new();

    let results = match_units(&units, &mapping, &mut used, &MatchThresholds::default());

    assert_eq!(results[0].status, MatchStatus::Unmatched);
    assert!(used.is_empty());
}
