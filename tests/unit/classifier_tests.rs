/*!
 * Fragment classification tests over realistic deck content
 */

use doctrans::classifier::{classify, Classification, SkipReason};

#[test]
fn test_classify_typical_slide_contents() {
    // A realistic slide: title, bullet, page number, decorative rule
    assert!(classify("Q3 Financial Highlights", "zh").is_translatable());
    assert!(classify("Revenue increased by 12% year over year", "zh").is_translatable());
    assert_eq!(classify("17", "zh"), Classification::Skip(SkipReason::PageNumber));
    assert_eq!(classify("----------", "zh"), Classification::Skip(SkipReason::NumericOnly));
}

#[test]
fn test_classify_table_cells() {
    assert!(classify("Net income", "zh").is_translatable());
    assert_eq!(classify("1,234.5", "zh"), Classification::Skip(SkipReason::NumericOnly));
    assert_eq!(classify("12.5%", "zh"), Classification::Skip(SkipReason::NumericOnly));
    assert_eq!(classify("??", "zh"), Classification::Skip(SkipReason::PunctuationOnly));
}

#[test]
fn test_classify_footnote_reference_line() {
    assert_eq!(
        classify("3 Andersson & Lee, 2021, p. 14", "zh"),
        Classification::Skip(SkipReason::Reference)
    );
}

#[test]
fn test_classify_depends_on_target_script() {
    let mixed = "本季度收入增长了12%";
    // Already in the target script for a zh job
    assert_eq!(classify(mixed, "zh"), Classification::Skip(SkipReason::AlreadyTargetScript));
    assert_eq!(classify(mixed, "zh-CN"), Classification::Skip(SkipReason::AlreadyTargetScript));
    // The same text is work to do for an en job
    assert!(classify(mixed, "en").is_translatable());
    // Latin-script targets never trip the heuristic
    assert!(classify("Résumé détaillé des résultats", "fr").is_translatable());
}
