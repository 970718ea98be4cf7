//! Timeline slider mapping and playback.
//!
//! The single user-facing control is a fraction in [0, 1] that maps
//! linearly onto the sampled date range.

use chrono::{DateTime, Duration, Utc};

pub struct Timeline {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    pub fraction: f64,
    pub playing: bool,
    pub speed_days_per_sec: f64,
}

impl Timeline {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            fraction: 0.0,
            playing: false,
            speed_days_per_sec: 2.0,
        }
    }

    pub fn span_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds().max(1)
    }

    pub fn date_at(&self, fraction: f64) -> DateTime<Utc> {
        let f = fraction.clamp(0.0, 1.0);
        self.start + Duration::milliseconds((self.span_ms() as f64 * f).round() as i64)
    }

    pub fn fraction_of(&self, date: DateTime<Utc>) -> f64 {
        let offset = (date - self.start).num_milliseconds() as f64;
        (offset / self.span_ms() as f64).clamp(0.0, 1.0)
    }

    pub fn current_date(&self) -> DateTime<Utc> {
        self.date_at(self.fraction)
    }

    /// Advance playback by `dt` wall seconds. Saturates at the end of the
    /// range and pauses there.
    pub fn advance(&mut self, dt_seconds: f64) {
        if !self.playing {
            return;
        }
        let ms = self.speed_days_per_sec * dt_seconds * 86_400_000.0;
        self.fraction += ms / self.span_ms() as f64;
        if self.fraction >= 1.0 {
            self.fraction = 1.0;
            self.playing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::parse_sample_timestamp;

    fn tl() -> Timeline {
        Timeline::new(
            parse_sample_timestamp("2024-01-01").unwrap(),
            parse_sample_timestamp("2024-12-31").unwrap(),
        )
    }

    #[test]
    fn endpoints_map_to_range_bounds() {
        let t = tl();
        assert_eq!(t.date_at(0.0), parse_sample_timestamp("2024-01-01").unwrap());
        assert_eq!(t.date_at(1.0), parse_sample_timestamp("2024-12-31").unwrap());
    }

    #[test]
    fn mapping_is_a_monotonic_bijection() {
        let t = tl();
        let mut prev = t.date_at(0.0);
        for i in 1..=10 {
            let f = i as f64 / 10.0;
            let d = t.date_at(f);
            assert!(d > prev);
            assert!((t.fraction_of(d) - f).abs() < 1e-9);
            prev = d;
        }
    }

    #[test]
    fn out_of_range_input_clamps() {
        let t = tl();
        assert_eq!(t.date_at(-0.5), t.date_at(0.0));
        assert_eq!(t.date_at(1.5), t.date_at(1.0));
        let before = parse_sample_timestamp("2023-06-01").unwrap();
        assert_eq!(t.fraction_of(before), 0.0);
    }

    #[test]
    fn playback_saturates_and_pauses() {
        let mut t = tl();
        t.playing = true;
        t.speed_days_per_sec = 10_000.0;
        t.advance(10.0);
        assert_eq!(t.fraction, 1.0);
        assert!(!t.playing);
    }

    #[test]
    fn paused_timeline_does_not_move() {
        let mut t = tl();
        t.fraction = 0.25;
        t.advance(5.0);
        assert_eq!(t.fraction, 0.25);
    }
}
