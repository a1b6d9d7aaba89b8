use chrono::{DateTime, Utc};

/// Score recency of activity against an explicit evaluation instant.
///
/// A missing timestamp scores 0.3 rather than zero: absence of signal is
/// not punished as harshly as confirmed staleness. `now` is threaded in by
/// the caller so results stay deterministic under test.
pub fn score_activity(last_active: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (f64, &'static str) {
    let Some(last_active) = last_active else {
        return (0.3, "activity unknown");
    };

    let age_hours = (now - last_active).num_seconds() as f64 / 3600.0;
    if age_hours <= 24.0 {
        (1.0, "active within 24h")
    } else if age_hours <= 72.0 {
        (0.7, "active within 3d")
    } else if age_hours <= 168.0 {
        (0.45, "active within 7d")
    } else {
        (0.2, "inactive recently")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn missing_timestamp_scores_the_unknown_default() {
        assert_eq!(score_activity(None, fixed_now()), (0.3, "activity unknown"));
    }

    #[test]
    fn tiers_step_down_with_age() {
        let now = fixed_now();
        let cases = [
            (Duration::hours(1), 1.0, "active within 24h"),
            (Duration::hours(24), 1.0, "active within 24h"),
            (Duration::hours(25), 0.7, "active within 3d"),
            (Duration::hours(72), 0.7, "active within 3d"),
            (Duration::hours(100), 0.45, "active within 7d"),
            (Duration::hours(168), 0.45, "active within 7d"),
            (Duration::hours(169), 0.2, "inactive recently"),
            (Duration::days(30), 0.2, "inactive recently"),
        ];

        for (age, expected_score, expected_reason) in cases {
            let (score, reason) = score_activity(Some(now - age), now);
            assert_eq!(score, expected_score, "age {age}");
            assert_eq!(reason, expected_reason, "age {age}");
        }
    }

    #[test]
    fn future_timestamps_count_as_fresh() {
        let now = fixed_now();
        let (score, reason) = score_activity(Some(now + Duration::hours(2)), now);
        assert_eq!(score, 1.0);
        assert_eq!(reason, "active within 24h");
    }
}
