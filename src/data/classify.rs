//! Status, trend and health classification.
//!
//! Everything here is a pure, total function: no input panics, and
//! thresholds that break the usual ordering are applied literally.

use fieldwatch_types::{
    DisplayReading, GrowthPrediction, NormalizedSensor, Status, SystemStatus, Thresholds, Trend,
};

/// Score at the edge of the optimal band, where the linear ramps peak.
const RAMP_PEAK: f64 = 80.0;

/// Classify a value against its absolute and optimal bands.
///
/// An absolute-range breach always wins over the optimal band.
pub fn classify_status(
    value: f64,
    min: f64,
    max: f64,
    optimal_min: f64,
    optimal_max: f64,
) -> Status {
    if value < min || value > max {
        Status::Critical
    } else if value >= optimal_min && value <= optimal_max {
        Status::Optimal
    } else {
        Status::Warning
    }
}

/// [`classify_status`] with the bands taken from `thresholds`.
pub fn classify_with(thresholds: &Thresholds, value: f64) -> Status {
    classify_status(
        value,
        thresholds.min,
        thresholds.max,
        thresholds.optimal_min,
        thresholds.optimal_max,
    )
}

/// Health score (0..=100) of a value relative to its optimal band.
///
/// 100 inside the band, inclusive of its edges. Outside, the score ramps
/// linearly from 80 at the band edge down to 0 at the absolute bound, and
/// stays 0 beyond it.
pub fn score_parameter(
    value: f64,
    optimal_min: f64,
    optimal_max: f64,
    abs_min: f64,
    abs_max: f64,
) -> u8 {
    if value >= optimal_min && value <= optimal_max {
        return 100;
    }

    let ratio = if value < optimal_min {
        (value - abs_min) / (optimal_min - abs_min)
    } else {
        (abs_max - value) / (abs_max - optimal_max)
    };

    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    (ratio * RAMP_PEAK).round().min(RAMP_PEAK) as u8
}

/// Health score of a sensor's current value against its own thresholds.
pub fn score_sensor(sensor: &NormalizedSensor) -> u8 {
    score_parameter(
        sensor.value,
        sensor.optimal_min,
        sensor.optimal_max,
        sensor.min,
        sensor.max,
    )
}

/// Trend between the two most recent history entries.
///
/// With fewer than two entries, `previous` is returned unchanged.
pub fn classify_trend(history: &[DisplayReading], previous: Trend) -> Trend {
    match history {
        [.., before, last] => {
            if last.value > before.value {
                Trend::Increasing
            } else if last.value < before.value {
                Trend::Decreasing
            } else {
                Trend::Stable
            }
        }
        _ => previous,
    }
}

/// Recompute a sensor's trend from its history.
pub fn update_trend(sensor: &mut NormalizedSensor) {
    sensor.trend = classify_trend(&sensor.history, sensor.trend);
}

/// Recompute a sensor's status from its current value and thresholds.
pub fn update_status(sensor: &mut NormalizedSensor) {
    sensor.status = classify_with(&sensor.thresholds(), sensor.value);
}

/// Worst-of reduction over sensor statuses. Unknown counts as normal.
pub fn system_status<I>(statuses: I) -> SystemStatus
where
    I: IntoIterator<Item = Status>,
{
    statuses
        .into_iter()
        .map(SystemStatus::from)
        .max()
        .unwrap_or(SystemStatus::Normal)
}

/// Band a health score into a growth outlook.
pub fn growth_prediction(score: u8) -> GrowthPrediction {
    match score {
        90..=u8::MAX => GrowthPrediction::Excellent,
        75..=89 => GrowthPrediction::Good,
        60..=74 => GrowthPrediction::Fair,
        40..=59 => GrowthPrediction::Poor,
        _ => GrowthPrediction::Critical,
    }
}

/// Smallest and largest value in a history, or `(0, 0)` when empty.
pub fn observed_range(history: &[DisplayReading]) -> (f64, f64) {
    let mut values = history.iter().map(|r| r.value);
    let Some(first) = values.next() else {
        return (0.0, 0.0);
    };
    values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Rounded mean of parameter scores, or 0 when there are none.
pub fn overall_health<I>(scores: I) -> u8
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), s| (sum + u32::from(s), count + 1));
    if count == 0 {
        return 0;
    }
    (f64::from(sum) / f64::from(count)).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn history(values: &[f64]) -> Vec<DisplayReading> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DisplayReading {
                time: start + Duration::hours(i as i64),
                value,
                label: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_status_scenarios() {
        assert_eq!(classify_status(5.0, 0.0, 10.0, 4.0, 6.0), Status::Optimal);
        assert_eq!(classify_status(11.0, 0.0, 10.0, 4.0, 6.0), Status::Critical);
        assert_eq!(classify_status(3.0, 0.0, 10.0, 4.0, 6.0), Status::Warning);
    }

    #[test]
    fn test_status_boundaries() {
        let s = |v| classify_status(v, 0.0, 10.0, 4.0, 6.0);
        assert_eq!(s(-0.001), Status::Critical);
        assert_eq!(s(0.0), Status::Warning);
        assert_eq!(s(4.0), Status::Optimal);
        assert_eq!(s(6.0), Status::Optimal);
        assert_eq!(s(6.001), Status::Warning);
        assert_eq!(s(10.0), Status::Warning);
        assert_eq!(s(10.001), Status::Critical);
    }

    #[test]
    fn unordered_thresholds_are_applied_literally() {
        // Optimal band outside the absolute range: breach still wins
        assert_eq!(classify_status(12.0, 0.0, 10.0, 11.0, 13.0), Status::Critical);
        // Inverted optimal band can never be optimal
        assert_eq!(classify_status(5.0, 0.0, 10.0, 6.0, 4.0), Status::Warning);
    }

    #[test]
    fn nan_value_is_warning() {
        assert_eq!(classify_status(f64::NAN, 0.0, 10.0, 4.0, 6.0), Status::Warning);
    }

    #[test]
    fn test_score_parameter() {
        assert_eq!(score_parameter(5.0, 4.0, 6.0, 0.0, 10.0), 100);
        assert_eq!(score_parameter(4.0, 4.0, 6.0, 0.0, 10.0), 100);
        assert_eq!(score_parameter(2.0, 4.0, 6.0, 0.0, 10.0), 40);
        assert_eq!(score_parameter(8.0, 4.0, 6.0, 0.0, 10.0), 40);
        assert_eq!(score_parameter(0.0, 4.0, 6.0, 0.0, 10.0), 0);
        assert_eq!(score_parameter(-5.0, 4.0, 6.0, 0.0, 10.0), 0);
        assert_eq!(score_parameter(15.0, 4.0, 6.0, 0.0, 10.0), 0);
        // Just outside the band the ramp approaches 80, not 100
        assert_eq!(score_parameter(3.99, 4.0, 6.0, 0.0, 10.0), 80);
    }

    #[test]
    fn degenerate_ramps_score_zero() {
        assert_eq!(score_parameter(1.0, 4.0, 6.0, 4.0, 10.0), 0);
        assert_eq!(score_parameter(f64::NAN, 4.0, 6.0, 0.0, 10.0), 0);
    }

    #[test]
    fn test_trend_scenarios() {
        assert_eq!(classify_trend(&history(&[10.0, 15.0]), Trend::Stable), Trend::Increasing);
        assert_eq!(classify_trend(&history(&[15.0, 10.0]), Trend::Stable), Trend::Decreasing);
        assert_eq!(classify_trend(&history(&[10.0, 10.0]), Trend::Increasing), Trend::Stable);
        assert_eq!(classify_trend(&history(&[10.0]), Trend::Decreasing), Trend::Decreasing);
        assert_eq!(classify_trend(&[], Trend::Increasing), Trend::Increasing);
    }

    #[test]
    fn trend_uses_last_two_only() {
        assert_eq!(
            classify_trend(&history(&[1.0, 50.0, 20.0, 21.0]), Trend::Stable),
            Trend::Increasing
        );
    }

    #[test]
    fn test_update_in_place() {
        let mut sensor = NormalizedSensor::new("%", Thresholds::new(0.0, 100.0, 40.0, 70.0));
        sensor.history = history(&[50.0, 80.0]);
        sensor.value = 80.0;

        update_status(&mut sensor);
        update_trend(&mut sensor);
        assert_eq!(sensor.status, Status::Warning);
        assert_eq!(sensor.trend, Trend::Increasing);
        assert_eq!(score_sensor(&sensor), 53);
    }

    #[test]
    fn test_system_status() {
        use Status::*;
        assert_eq!(system_status([Optimal, Warning, Critical]), SystemStatus::Critical);
        assert_eq!(system_status([Critical, Optimal]), SystemStatus::Critical);
        assert_eq!(system_status([Optimal, Warning]), SystemStatus::Warning);
        assert_eq!(system_status([Optimal, Unknown]), SystemStatus::Normal);
        assert_eq!(system_status(Vec::new()), SystemStatus::Normal);
    }

    #[test]
    fn test_growth_prediction_bands() {
        assert_eq!(growth_prediction(100), GrowthPrediction::Excellent);
        assert_eq!(growth_prediction(90), GrowthPrediction::Excellent);
        assert_eq!(growth_prediction(89), GrowthPrediction::Good);
        assert_eq!(growth_prediction(75), GrowthPrediction::Good);
        assert_eq!(growth_prediction(74), GrowthPrediction::Fair);
        assert_eq!(growth_prediction(60), GrowthPrediction::Fair);
        assert_eq!(growth_prediction(59), GrowthPrediction::Poor);
        assert_eq!(growth_prediction(40), GrowthPrediction::Poor);
        assert_eq!(growth_prediction(39), GrowthPrediction::Critical);
        assert_eq!(growth_prediction(0), GrowthPrediction::Critical);
    }

    #[test]
    fn test_observed_range() {
        assert_eq!(observed_range(&[]), (0.0, 0.0));
        assert_eq!(observed_range(&history(&[3.0, -1.0, 7.5, 2.0])), (-1.0, 7.5));
    }

    #[test]
    fn test_overall_health() {
        assert_eq!(overall_health(Vec::new()), 0);
        assert_eq!(overall_health([100, 80, 41]), 74);
        assert_eq!(overall_health([100, 100]), 100);
    }

    fn ordered_thresholds() -> impl Strategy<Value = Thresholds> {
        (-100.0f64..100.0, 0.1f64..50.0, 0.0f64..50.0, 0.1f64..50.0).prop_map(
            |(min, below, band, above)| {
                let optimal_min = min + below;
                let optimal_max = optimal_min + band;
                Thresholds::new(min, optimal_max + above, optimal_min, optimal_max)
            },
        )
    }

    proptest! {
        #[test]
        fn status_matches_band(t in ordered_thresholds(), frac in -0.5f64..1.5) {
            let value = t.min + frac * (t.max - t.min);
            let expected = if value < t.min || value > t.max {
                Status::Critical
            } else if value >= t.optimal_min && value <= t.optimal_max {
                Status::Optimal
            } else {
                Status::Warning
            };
            prop_assert_eq!(classify_with(&t, value), expected);
        }

        #[test]
        fn score_is_100_inside_band(t in ordered_thresholds(), frac in 0.0f64..=1.0) {
            let value = (t.optimal_min + frac * (t.optimal_max - t.optimal_min)).min(t.optimal_max);
            prop_assert_eq!(score_parameter(value, t.optimal_min, t.optimal_max, t.min, t.max), 100);
        }

        #[test]
        fn score_never_increases_away_from_band(t in ordered_thresholds(), a in 0.0f64..200.0, b in 0.0f64..200.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            let score = |v| score_parameter(v, t.optimal_min, t.optimal_max, t.min, t.max);

            // Below the band
            prop_assert!(score(t.optimal_min - far) <= score(t.optimal_min - near));
            // Above the band
            prop_assert!(score(t.optimal_max + far) <= score(t.optimal_max + near));
        }

        #[test]
        fn score_is_zero_beyond_bounds(t in ordered_thresholds(), past in 0.0f64..100.0) {
            let score = |v| score_parameter(v, t.optimal_min, t.optimal_max, t.min, t.max);
            prop_assert_eq!(score(t.min - past), 0);
            prop_assert_eq!(score(t.max + past), 0);
        }

        #[test]
        fn system_status_ignores_order(mut statuses in proptest::collection::vec(
            prop_oneof![
                Just(Status::Optimal),
                Just(Status::Warning),
                Just(Status::Critical),
                Just(Status::Unknown),
            ],
            0..12,
        )) {
            let forward = system_status(statuses.clone());
            statuses.reverse();
            prop_assert_eq!(forward, system_status(statuses));
        }
    }
}
