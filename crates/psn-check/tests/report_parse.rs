use psn_check::parse_report;
use psn_core::ProbabilitySample;

fn property(cycle: u64, probability: &str) -> String {
    format!(
        "+ Property NocInductiveProbabilityRewardBounded{cycle}\n  Estimated probability: {probability}\n"
    )
}

#[test]
fn samples_are_sorted_by_cycle_bound() {
    let report = [property(7, "0.7"), property(3, "0.3"), property(21, "0.21")].concat();
    let samples = parse_report(&report);
    let cycles: Vec<u64> = samples.iter().map(|s| s.cycle).collect();
    assert_eq!(cycles, vec![3, 7, 21]);
    assert_eq!(samples[0].probability, 0.3);
    assert_eq!(samples[2].probability, 0.21);
}

#[test]
fn report_without_properties_is_empty() {
    let report = "Modest Toolset\nSimulating 7000 runs\nDone.\n";
    assert!(parse_report(report).is_empty());
    assert!(parse_report("").is_empty());
}

#[test]
fn unrelated_lines_are_ignored() {
    let report = format!(
        "warning: unused variable\n{}progress: 50%\n+ Property DeadlineMet\n  Estimated probability: 0.9\n{}",
        property(2, "0.125"),
        property(1, "0.0625"),
    );
    assert_eq!(
        parse_report(&report),
        vec![
            ProbabilitySample::new(1, 0.0625),
            ProbabilitySample::new(2, 0.125),
        ]
    );
}

#[test]
fn property_name_needs_both_markers() {
    let report = "Property NocRewardBounded5\n  Estimated probability: 0.5\n\
                  Property NocProbabilityBounded6\n  Estimated probability: 0.6\n";
    assert!(parse_report(report).is_empty());
}

#[test]
fn exponent_notation_is_accepted() {
    let report = property(40, "1E-05");
    assert_eq!(parse_report(&report), vec![ProbabilitySample::new(40, 1e-5)]);
}

#[test]
fn certainty_is_parsed_exactly() {
    let report = [property(100, "1"), property(99, "0.999999")].concat();
    let samples = parse_report(&report);
    assert_eq!(samples[0], ProbabilitySample::new(99, 0.999999));
    assert_eq!(samples[1], ProbabilitySample::new(100, 1.0));
}
