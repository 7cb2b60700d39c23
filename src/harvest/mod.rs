use chrono::NaiveDate;

/// Days from sowing to harvest per crop.
pub const CROP_DURATIONS: &[(&str, u32)] = &[
    ("Wheat", 120),
    ("Rice", 150),
    ("Maize", 100),
    ("Sugarcane", 365),
    ("Cotton", 180),
    ("Soybean", 100),
    ("Chickpea", 110),
    ("Mustard", 115),
];

pub fn duration_days(crop: &str) -> Option<u32> {
    let crop = crop.trim();
    CROP_DURATIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(crop))
        .map(|(_, days)| *days)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    pub duration_days: u32,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    /// Fraction of the growing period elapsed, in `0.0..=1.0`.
    pub progress: f64,
}

/// Countdown for a known crop; `None` when the crop has no duration entry.
pub fn countdown(crop: &str, sowing_date: NaiveDate, today: NaiveDate) -> Option<Countdown> {
    duration_days(crop).map(|d| countdown_for(d, sowing_date, today))
}

pub fn countdown_for(duration_days: u32, sowing_date: NaiveDate, today: NaiveDate) -> Countdown {
    // A sowing date in the future counts as not started.
    let days_elapsed = (today - sowing_date).num_days().max(0);
    let duration = i64::from(duration_days);
    let progress = if duration == 0 {
        1.0
    } else {
        (days_elapsed as f64 / duration as f64).min(1.0)
    };

    Countdown {
        duration_days,
        days_elapsed,
        days_remaining: (duration - days_elapsed).max(0),
        progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn wheat_sown_45_days_ago() {
        let c = countdown("Wheat", today() - Duration::days(45), today()).unwrap();
        assert_eq!(c.duration_days, 120);
        assert_eq!(c.days_remaining, 75);
        assert_eq!(c.progress, 0.375);
    }

    #[test]
    fn overdue_harvest_clamps() {
        let c = countdown("Wheat", today() - Duration::days(200), today()).unwrap();
        assert_eq!(c.days_remaining, 0);
        assert_eq!(c.progress, 1.0);
    }

    #[test]
    fn future_sowing_has_not_started() {
        let c = countdown("Rice", today() + Duration::days(10), today()).unwrap();
        assert_eq!(c.days_elapsed, 0);
        assert_eq!(c.days_remaining, 150);
        assert_eq!(c.progress, 0.0);
    }

    #[test]
    fn zero_duration_is_complete() {
        let c = countdown_for(0, today() - Duration::days(3), today());
        assert_eq!(c.days_remaining, 0);
        assert_eq!(c.progress, 1.0);
    }

    #[test]
    fn crop_lookup_ignores_case() {
        assert_eq!(duration_days(" sugarcane "), Some(365));
        assert_eq!(duration_days("Dragonfruit"), None);
        assert!(countdown("Dragonfruit", today(), today()).is_none());
    }
}
