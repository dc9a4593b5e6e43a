//! Adaptive threshold behavior through the public API

mod helpers;

use std::sync::Arc;

use helpers::*;
use tsa_cascade::thresholds::default_threshold;
use tsa_cascade::{AdaptiveThresholdCalculator, LanguageModels};
use tsa_common::taxonomy::{self, Tier};

fn calculator() -> AdaptiveThresholdCalculator {
    AdaptiveThresholdCalculator::new(Arc::new(LanguageModels::standard()))
}

#[test]
fn test_complex_text_never_raises_thresholds() {
    let calc = calculator();
    let simple = calc.calculate(SIMPLE_TEXT, SIMPLE_TEXT);
    let complex = calc.calculate(COMPLEX_TEXT, COMPLEX_TEXT);

    let mut strictly_lower = 0;
    for (code, simple_threshold) in simple.iter() {
        let complex_threshold = complex.get(code).unwrap();
        assert!(
            complex_threshold <= simple_threshold,
            "{}: {} > {}",
            code,
            complex_threshold,
            simple_threshold
        );
        if complex_threshold < simple_threshold {
            strictly_lower += 1;
        }
    }
    assert_eq!(strictly_lower, simple.len());
}

#[test]
fn test_complexity_profile_orders_texts() {
    let calc = calculator();
    let simple = calc.analyze(SIMPLE_TEXT, SIMPLE_TEXT);
    let complex = calc.analyze(COMPLEX_TEXT, COMPLEX_TEXT);
    assert!(complex.complexity.score > simple.complexity.score);
    assert!(complex.complexity.technical_density > 0.0);
    assert_eq!(simple.complexity.technical_density, 0.0);
}

#[test]
fn test_every_automatic_code_within_tier_bounds() {
    let calc = calculator();
    for (source, target) in sample_pairs() {
        let thresholds = calc.calculate(source, target);
        assert_eq!(thresholds.len(), 12);
        for (code, threshold) in thresholds.iter() {
            let descriptor = taxonomy::lookup(code).unwrap();
            assert!(!descriptor.manual_only, "{} is manual-only", code);
            let (low, high) = match descriptor.tier {
                Tier::Macro => (0.3, 0.9),
                Tier::Meso => (0.25, 0.85),
                Tier::Micro => (0.2, 0.8),
            };
            assert!(
                (low..=high).contains(&threshold),
                "{} threshold {} outside [{}, {}]",
                code,
                threshold,
                low,
                high
            );
        }
    }
}

#[test]
fn test_empty_source_uses_base_values() {
    let calc = calculator();
    let thresholds = calc.calculate("", "");
    assert_eq!(thresholds.len(), 12);
    assert!(thresholds.iter().all(|(_, t)| t > 0.0));
    assert_eq!(default_threshold(Tier::Macro), 0.60);
    assert_eq!(default_threshold(Tier::Micro), 0.50);
}
