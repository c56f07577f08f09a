use crate::error::ConfigError;
use crate::error_model::{
    BpskErrorModel, ErrorModel, ErrorModelSpec, TableErrorModel, ber_to_per, q_function,
};

const TABLE: [(f64, f64); 5] = [
    (-80.0, 1.0),
    (-79.0, 0.75),
    (-78.0, 0.5),
    (-77.0, 0.25),
    (-76.0, 0.0),
];

fn table_from(points: &[(f64, f64)]) -> TableErrorModel {
    let mut m = TableErrorModel::default();
    for &(snr, per) in points {
        m.add_value(snr, per).expect("valid control point");
    }
    m
}

#[test]
fn q_function_matches_reference_values() {
    assert!((q_function(0.0) - 0.5).abs() < 5e-3);
    assert!((q_function(0.5) - 0.30854).abs() < 5e-3);
    assert!((q_function(1.0) - 0.15866).abs() < 5e-3);
    assert!((q_function(1.5) - 0.066807).abs() < 5e-3);
}

#[test]
fn ber_to_per_for_a_kilobyte() {
    assert!((ber_to_per(0.0001, 1000) - 0.550689).abs() < 1e-6);
    assert_eq!(ber_to_per(0.0, 1000), 0.0);
    assert_eq!(ber_to_per(0.3, 0), 0.0);
}

#[test]
fn bpsk_is_clean_at_high_snr_and_lossy_at_low_snr() {
    let mut m = BpskErrorModel;
    assert!(m.error_probability(30.0, 1024) < 1e-9);
    assert!(m.error_probability(-10.0, 1024) > 0.999);
    let mid = m.error_probability(8.0, 100);
    assert!(mid > 0.0 && mid < 1.0, "mid={mid}");
}

#[test]
fn table_lookup_exact_interpolated_and_out_of_range() {
    let mut m = table_from(&TABLE);
    assert_eq!(m.len(), 5);
    assert_eq!(m.error_probability(-80.0, 0), 1.0);
    assert_eq!(m.error_probability(-76.0, 0), 0.0);
    assert_eq!(m.error_probability(-78.0, 0), 0.5);
    assert!((m.error_probability(-77.5, 0) - 0.375).abs() < 1e-12);
    assert_eq!(m.error_probability(-82.0, 0), 1.0);
    assert_eq!(m.error_probability(-60.0, 0), 0.0);
}

#[test]
fn table_results_do_not_depend_on_insertion_order() {
    let mut reversed = TABLE;
    reversed.reverse();
    let mut shuffled = TABLE;
    shuffled.swap(0, 3);
    shuffled.swap(1, 4);

    let mut a = table_from(&TABLE);
    let mut b = table_from(&reversed);
    let mut c = table_from(&shuffled);
    for q in [-85.0, -80.0, -79.3, -78.0, -77.5, -76.2, -50.0] {
        let expected = a.error_probability(q, 0);
        assert_eq!(b.error_probability(q, 0), expected, "snr {q}");
        assert_eq!(c.error_probability(q, 0), expected, "snr {q}");
    }
}

#[test]
fn table_is_monotonically_non_increasing() {
    let mut m = table_from(&[(-10.0, 0.9), (0.0, 0.6), (5.0, 0.6), (12.0, 0.05), (20.0, 0.0)]);
    let mut prev = f64::INFINITY;
    let mut snr = -15.0;
    while snr <= 25.0 {
        let per = m.error_probability(snr, 0);
        assert!(per <= prev, "per rose at snr {snr}: {prev} -> {per}");
        prev = per;
        snr += 0.25;
    }
}

#[test]
fn empty_table_assumes_total_loss() {
    let mut m = TableErrorModel::default();
    assert!(m.is_empty());
    for q in [-100.0, 0.0, 100.0] {
        assert_eq!(m.error_probability(q, 1500), 1.0);
    }
}

#[test]
fn table_caches_last_query_and_invalidates_on_insert() {
    let mut m = table_from(&TABLE);
    assert_eq!(m.cached(), None);
    let first = m.error_probability(-77.5, 0);
    assert_eq!(m.cached(), Some((-77.5, first)));
    assert_eq!(m.error_probability(-77.5, 0), first);

    m.add_value(-77.5, 0.1).expect("valid control point");
    assert_eq!(m.cached(), None);
    assert_eq!(m.error_probability(-77.5, 0), 0.1);
}

#[test]
fn table_keeps_first_value_for_duplicate_snr() {
    let mut m = table_from(&[(0.0, 0.4)]);
    m.add_value(0.0, 0.9).expect("valid control point");
    assert_eq!(m.len(), 1);
    assert_eq!(m.error_probability(0.0, 0), 0.4);
}

#[test]
fn table_rejects_out_of_bounds_control_points() {
    let mut m = TableErrorModel::default();
    assert_eq!(m.add_value(0.0, 1.5), Err(ConfigError::InvalidPer(1.5)));
    assert_eq!(m.add_value(0.0, -0.1), Err(ConfigError::InvalidPer(-0.1)));
    assert_eq!(m.add_value(120.0, 0.5), Err(ConfigError::InvalidSnr(120.0)));
    assert_eq!(m.add_value(-100.5, 0.5), Err(ConfigError::InvalidSnr(-100.5)));
    assert!(m.is_empty());
}

#[test]
fn error_model_spec_builds_from_json() {
    let spec: ErrorModelSpec = serde_json::from_str(
        r#"{ "kind": "table", "points": [[-76.0, 0.0], [-80.0, 1.0]] }"#,
    )
    .expect("parse error model spec");
    let mut m = spec.build().expect("valid table");
    assert_eq!(m.name(), "table");
    assert_eq!(m.error_probability(-78.0, 0), 0.5);

    let bad = ErrorModelSpec::Table {
        points: vec![(0.0, 2.0)],
    };
    assert_eq!(bad.build().err(), Some(ConfigError::InvalidPer(2.0)));

    let spec: ErrorModelSpec = serde_json::from_str(r#"{ "kind": "bpsk" }"#).expect("parse bpsk");
    assert_eq!(spec.build().expect("bpsk").name(), "bpsk");
}
