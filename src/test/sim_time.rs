use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_from_float_seconds_rounds_and_clamps() {
    assert_eq!(SimTime::from_secs_f64(1.5e-6), SimTime(1_500));
    assert_eq!(SimTime::from_secs_f64(0.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(1e30), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(250).as_secs_f64(), 0.25);
}

#[test]
fn sim_time_saturating_since_never_goes_negative() {
    assert_eq!(SimTime(10).saturating_since(SimTime(4)), SimTime(6));
    assert_eq!(SimTime(4).saturating_since(SimTime(10)), SimTime::ZERO);
}
