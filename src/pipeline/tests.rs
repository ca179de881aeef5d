use std::collections::BTreeSet;

use super::*;
use crate::model::PLACEHOLDER;

fn lead(company: &str, score: f64, propensity: f64, stage: &str, signals: &str) -> LeadRecord {
    LeadRecord {
        company: company.to_string(),
        lead_score: Some(score),
        propensity_pct: Some(propensity),
        stage: stage.to_string(),
        top_signals: Signals::parse(signals),
        last_news_date: String::new(),
        next_best_action: String::new(),
        news_date: None,
    }
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn spec(min_score: i64, stages: &[&str], signals: &[&str]) -> FilterSpec {
    FilterSpec {
        min_score,
        allowed_stages: set(stages),
        required_signals: set(signals),
        signal_match: SignalMatch::Any,
    }
}

fn scenario_dataset() -> Vec<LeadRecord> {
    vec![
        lead("Acme", 85.0, 60.0, "Qualified", "Funding"),
        lead("Beta", 60.0, 40.0, "New", ""),
    ]
}

fn companies(records: &[&LeadRecord]) -> Vec<String> {
    records.iter().map(|lead| lead.company.clone()).collect()
}

fn mixed_dataset() -> Vec<LeadRecord> {
    vec![
        lead("Acme", 85.0, 60.0, "Qualified", "Funding; Hiring"),
        lead("Beta", 60.0, 40.0, "New", ""),
        lead("Cobalt", 92.0, 35.0, "Contacted", "Hiring; Expansion"),
        lead("Dyad", 85.0, 72.5, "Qualified", "Expansion"),
        lead("Ember", 78.0, 50.0, "New", "Funding; Leadership change"),
        lead("Fjord", 85.0, 60.0, "Contacted", "Funding"),
        lead("Gale", 70.0, 55.0, "Proposal", "Hiring"),
        lead("Halo", 99.5, 81.0, "Proposal", "Funding; Expansion; Hiring"),
    ]
}

fn all_stages(leads: &[LeadRecord]) -> BTreeSet<String> {
    stage_options(leads).into_iter().collect()
}

#[test]
fn scenario_a_min_score_keeps_only_acme() {
    let data = scenario_dataset();
    let view = evaluate(&data, &spec(70, &["Qualified", "New"], &[]));

    assert_eq!(companies(&view.records), vec!["Acme"]);
    assert_eq!(view.kpis.count, 1);
    assert_eq!(view.kpis.avg_score_display(), "85.0");
    assert_eq!(view.kpis.avg_propensity_display(), "60.0");
    assert_eq!(view.kpis.stages_display(), "Qualified");
}

#[test]
fn scenario_b_required_signal_counts_funding_once() {
    let data = scenario_dataset();
    let view = evaluate(&data, &spec(0, &["Qualified", "New"], &["Funding"]));

    assert_eq!(companies(&view.records), vec!["Acme"]);
    assert_eq!(view.signal_histogram.buckets().len(), 1);
    assert_eq!(view.signal_histogram.count_of("Funding"), Some(1));
}

#[test]
fn scenario_c_unreachable_threshold_degrades_to_placeholders() {
    let data = scenario_dataset();
    let view = evaluate(&data, &spec(100, &["Qualified", "New"], &[]));

    assert!(view.records.is_empty());
    assert_eq!(view.kpis.count, 0);
    assert_eq!(view.kpis.avg_score_display(), PLACEHOLDER);
    assert_eq!(view.kpis.avg_propensity_display(), PLACEHOLDER);
    assert_eq!(view.kpis.stages_display(), PLACEHOLDER);
    assert!(view.stage_histogram.is_empty());
    assert!(view.signal_histogram.is_empty());
}

#[test]
fn empty_allowed_stages_yields_empty_view() {
    let data = mixed_dataset();
    let view = evaluate(&data, &spec(0, &[], &[]));

    assert!(view.records.is_empty());
    assert_eq!(view.kpis.avg_score, None);
    assert_eq!(view.kpis.avg_propensity, None);
    assert!(view.kpis.stages.is_empty());
}

#[test]
fn min_score_is_inclusive_and_accepts_out_of_range_values() {
    let data = mixed_dataset();
    let stages = all_stages(&data);

    let at_seventy = FilterSpec {
        allowed_stages: stages.clone(),
        ..spec(70, &[], &[])
    };
    assert!(companies(&filter(&data, &at_seventy)).contains(&"Gale".to_string()));

    let negative = FilterSpec {
        allowed_stages: stages.clone(),
        ..spec(-5, &[], &[])
    };
    assert_eq!(filter(&data, &negative).len(), data.len());

    let above_range = FilterSpec {
        allowed_stages: stages,
        ..spec(250, &[], &[])
    };
    assert!(filter(&data, &above_range).is_empty());
}

#[test]
fn filter_sorts_by_score_then_propensity_descending() {
    let data = mixed_dataset();
    let view = filter(&data, &default_filter(&data, 0));

    assert_eq!(
        companies(&view),
        vec!["Halo", "Cobalt", "Dyad", "Acme", "Fjord", "Ember", "Gale", "Beta"]
    );

    for pair in view.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (score_a, score_b) = (a.lead_score.unwrap(), b.lead_score.unwrap());
        assert!(
            score_a > score_b
                || (score_a == score_b && a.propensity_pct.unwrap() >= b.propensity_pct.unwrap()),
            "{} must not precede {}",
            a.company,
            b.company
        );
    }
}

#[test]
fn full_ties_keep_input_order() {
    let data = mixed_dataset();
    let view = filter(&data, &default_filter(&data, 85));
    let acme = view.iter().position(|lead| lead.company == "Acme").unwrap();
    let fjord = view.iter().position(|lead| lead.company == "Fjord").unwrap();
    assert!(acme < fjord);
}

#[test]
fn filter_is_idempotent() {
    let data = mixed_dataset();
    let spec = FilterSpec {
        allowed_stages: all_stages(&data),
        ..spec(75, &[], &["Funding", "Hiring"])
    };

    let first = filter(&data, &spec);
    let second = filter(&data, &spec);
    assert_eq!(first, second);
}

#[test]
fn filter_returns_subset_of_input() {
    let data = mixed_dataset();
    let specs = [
        default_filter(&data, 0),
        default_filter(&data, 80),
        spec(0, &["New", "Proposal"], &["Hiring"]),
        spec(90, &["Contacted"], &["Expansion"]),
    ];

    for spec in &specs {
        for record in filter(&data, spec) {
            assert!(data.iter().any(|lead| lead == record));
        }
    }
}

#[test]
fn histograms_conserve_counts() {
    let data = mixed_dataset();
    let view = evaluate(&data, &default_filter(&data, 70));

    assert_eq!(view.stage_histogram.total(), view.kpis.count);
    let tokens: usize = view.records.iter().map(|lead| lead.top_signals.len()).sum();
    assert_eq!(view.signal_histogram.total(), tokens);
}

#[test]
fn stage_histogram_omits_absent_stages() {
    let data = mixed_dataset();
    let view = evaluate(&data, &spec(0, &["Qualified", "Proposal", "Lost"], &[]));

    assert_eq!(view.stage_histogram.count_of("Qualified"), Some(2));
    assert_eq!(view.stage_histogram.count_of("Proposal"), Some(2));
    assert_eq!(view.stage_histogram.count_of("Lost"), None);
    assert_eq!(view.stage_histogram.count_of("New"), None);
}

#[test]
fn signal_histogram_orders_by_frequency() {
    let data = mixed_dataset();
    let view = evaluate(&data, &default_filter(&data, 0));
    let labels: Vec<_> = view
        .signal_histogram
        .buckets()
        .iter()
        .map(|bucket| (bucket.label.as_str(), bucket.count))
        .collect();

    assert_eq!(
        labels,
        vec![
            ("Funding", 4),
            ("Hiring", 4),
            ("Expansion", 3),
            ("Leadership change", 1),
        ]
    );
}

#[test]
fn any_signal_match_passes_records_with_one_selected_signal() {
    let data = mixed_dataset();
    let spec = FilterSpec {
        allowed_stages: all_stages(&data),
        ..spec(0, &[], &["Funding", "Expansion"])
    };

    assert_eq!(
        companies(&filter(&data, &spec)),
        vec!["Halo", "Cobalt", "Dyad", "Acme", "Fjord", "Ember"]
    );
}

#[test]
fn all_signal_match_requires_every_selected_signal() {
    let data = mixed_dataset();
    let spec = FilterSpec {
        allowed_stages: all_stages(&data),
        signal_match: SignalMatch::All,
        ..spec(0, &[], &["Funding", "Expansion"])
    };

    assert_eq!(companies(&filter(&data, &spec)), vec!["Halo"]);
}

#[test]
fn missing_scores_never_pass_and_missing_propensity_sorts_last() {
    let mut data = mixed_dataset();
    data.push(LeadRecord {
        lead_score: None,
        ..lead("Ion", 0.0, 90.0, "New", "Funding")
    });
    data.push(LeadRecord {
        propensity_pct: None,
        ..lead("Jet", 85.0, 0.0, "New", "")
    });

    let view = evaluate(&data, &default_filter(&data, -100));
    let names = companies(&view.records);
    assert!(!names.contains(&"Ion".to_string()));

    let jet = names.iter().position(|name| name == "Jet").unwrap();
    let fjord = names.iter().position(|name| name == "Fjord").unwrap();
    assert_eq!(jet, fjord + 1);
    assert_eq!(view.kpis.count, data.len() - 1);
}

#[test]
fn kpis_average_present_values_only() {
    let mut data = scenario_dataset();
    data.push(LeadRecord {
        propensity_pct: None,
        ..lead("Cove", 75.0, 0.0, "New", "")
    });
    let records: Vec<&LeadRecord> = data.iter().collect();
    let kpis = kpis(&records);

    assert_eq!(kpis.count, 3);
    assert_eq!(kpis.avg_score_display(), "73.3");
    assert_eq!(kpis.avg_propensity, Some(50.0));
    assert_eq!(kpis.stages, vec!["New".to_string(), "Qualified".to_string()]);
}

#[test]
fn options_list_sorted_distinct_values() {
    let data = mixed_dataset();
    assert_eq!(
        stage_options(&data),
        vec!["Contacted", "New", "Proposal", "Qualified"]
    );
    assert_eq!(
        signal_options(&data),
        vec!["Expansion", "Funding", "Hiring", "Leadership change"]
    );
}

#[test]
fn default_filter_allows_every_stage() {
    let data = mixed_dataset();
    let spec = default_filter(&data, 70);
    assert_eq!(spec.min_score, 70);
    assert_eq!(spec.allowed_stages, all_stages(&data));
    assert!(spec.required_signals.is_empty());
    assert_eq!(spec.signal_match, SignalMatch::Any);
}
