//! Additive 0–100 performance score.

use autopilot_core::PerformanceRecord;

const BASE_SCORE: i32 = 50;

fn cpl_points(cpl: f64) -> i32 {
    // 0 means no leads: no signal either way.
    if cpl <= 0.0 {
        0
    } else if cpl < 5.0 {
        20
    } else if cpl < 8.0 {
        10
    } else if cpl > 15.0 {
        -20
    } else if cpl > 10.0 {
        -10
    } else {
        0
    }
}

fn hook_rate_points(hook_rate: f64) -> i32 {
    if hook_rate > 25.0 {
        15
    } else if hook_rate > 15.0 {
        10
    } else if hook_rate < 10.0 {
        -10
    } else {
        0
    }
}

fn hold_rate_points(hold_rate: f64) -> i32 {
    if hold_rate > 50.0 {
        10
    } else if hold_rate > 30.0 {
        5
    } else if hold_rate < 20.0 {
        -5
    } else {
        0
    }
}

fn frequency_points(frequency: f64) -> i32 {
    if frequency > 8.0 {
        -15
    } else if frequency > 6.0 {
        -10
    } else if frequency < 2.0 {
        5
    } else {
        0
    }
}

/// Score a record from 50, adjusted by whichever of CPL, hook rate,
/// hold rate and frequency it carries. Clamped to `[0, 100]`.
pub fn performance_score(record: &PerformanceRecord) -> u8 {
    let mut score = BASE_SCORE;
    score += record.cpl.map_or(0, cpl_points);
    score += record.hook_rate.map_or(0, hook_rate_points);
    score += record.hold_rate.map_or(0, hold_rate_points);
    score += record.frequency.map_or(0, frequency_points);
    score.clamp(0, 100) as u8
}

/// Attach `performance_score` to every record in the batch.
pub fn apply_scores(mut records: Vec<PerformanceRecord>) -> Vec<PerformanceRecord> {
    for record in records.iter_mut() {
        record.performance_score = Some(performance_score(record));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(cpl: Option<f64>, hook: Option<f64>, hold: Option<f64>, freq: Option<f64>) -> u8 {
        performance_score(&PerformanceRecord {
            cpl,
            hook_rate: hook,
            hold_rate: hold,
            frequency: freq,
            ..Default::default()
        })
    }

    #[test]
    fn test_best_case_clamps_to_100() {
        assert_eq!(scored(Some(4.0), Some(30.0), Some(60.0), Some(1.0)), 100);
    }

    #[test]
    fn test_worst_case() {
        // 50 - 20 - 10 - 5 - 15
        assert_eq!(scored(Some(20.0), Some(5.0), Some(10.0), Some(9.0)), 0);
    }

    #[test]
    fn test_absent_metrics_skip_contribution() {
        assert_eq!(scored(None, None, None, None), 50);
        assert_eq!(scored(Some(4.0), None, None, None), 70);
        assert_eq!(scored(None, None, None, Some(7.0)), 40);
    }

    #[test]
    fn test_zero_cpl_is_neutral() {
        assert_eq!(scored(Some(0.0), None, None, None), 50);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(scored(Some(5.0), None, None, None), 60);
        assert_eq!(scored(Some(8.0), None, None, None), 50);
        assert_eq!(scored(Some(10.0), None, None, None), 50);
        assert_eq!(scored(Some(12.0), None, None, None), 40);
        assert_eq!(scored(None, Some(20.0), None, None), 60);
        assert_eq!(scored(None, Some(12.0), None, None), 50);
        assert_eq!(scored(None, None, Some(40.0), None), 55);
        assert_eq!(scored(None, None, Some(25.0), None), 50);
        assert_eq!(scored(None, None, None, Some(4.0)), 50);
    }

    #[test]
    fn test_score_bounds_over_grid() {
        let values = [0.0, 1.0, 4.9, 5.0, 7.5, 9.0, 12.0, 16.0, 25.5, 40.0, 55.0, 200.0];
        for &a in &values {
            for &b in &values {
                let s = scored(Some(a), Some(b), Some(a), Some(b));
                assert!(s <= 100);
            }
        }
    }

    #[test]
    fn test_apply_scores() {
        let records = vec![
            PerformanceRecord {
                cpl: Some(4.0),
                ..Default::default()
            },
            PerformanceRecord::default(),
        ];
        let out = apply_scores(records);
        assert_eq!(out[0].performance_score, Some(70));
        assert_eq!(out[1].performance_score, Some(50));
    }
}
