//! Extraction of probability estimates from the checker's free-text report.

use std::sync::OnceLock;

use psn_core::ProbabilitySample;
use regex::Regex;
use tracing::warn;

/// Bounded-reward property followed by its estimate.
///
/// Group 1 is the cycle bound encoded at the end of the property name,
/// group 2 the estimated probability.
const PROPERTY_PATTERN: &str = r"Property \w*Probability\w*RewardBounded(\d+)\s+Estimated probability:\s+([0-9.]+(?:[eE][-+]?[0-9]+)?)";

fn property_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PROPERTY_PATTERN).expect("property pattern compiles"))
}

/// Parses every bounded-reward estimate in `text`, sorted by cycle bound.
///
/// Unrelated lines are ignored. A report without any matching property yields
/// an empty vector.
pub fn parse_report(text: &str) -> Vec<ProbabilitySample> {
    let mut samples = Vec::new();
    for captures in property_regex().captures_iter(text) {
        let (_, [cycle, probability]) = captures.extract();
        let Ok(cycle) = cycle.parse::<u64>() else {
            warn!(cycle, "skipping property with unrepresentable cycle bound");
            continue;
        };
        let Ok(probability) = probability.parse::<f64>() else {
            warn!(cycle, probability, "skipping unparsable probability estimate");
            continue;
        };
        samples.push(ProbabilitySample::new(cycle, probability));
    }
    samples.sort_by_key(|sample| sample.cycle);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_spans_line_breaks() {
        let text = "+ Property NocResistiveProbabilityRewardBounded4\n  Estimated probability: 0.25\n";
        assert_eq!(parse_report(text), vec![ProbabilitySample::new(4, 0.25)]);
    }

    #[test]
    fn malformed_float_is_skipped() {
        let text = "Property XProbabilityYRewardBounded1 Estimated probability: 1.2.3\n\
                    Property XProbabilityYRewardBounded2 Estimated probability: 0.5";
        assert_eq!(parse_report(text), vec![ProbabilitySample::new(2, 0.5)]);
    }
}
