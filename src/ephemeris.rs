//! Time-keyed position samples and interpolation.
//!
//! The position document maps timestamp strings to per-body ecliptic
//! coordinates in AU. Slow movers are sampled daily (`YYYY-MM-DD`), fast
//! movers (Moon, Mercury, Venus) hourly (`YYYY-MM-DD HH:MM:SS`). Each body
//! keeps its own chronologically sorted track, so interpolation always
//! brackets a query against that body's own cadence.

use crate::celestial::Body;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub t: DateTime<Utc>,
    pub pos: [f64; 3],
}

pub struct Ephemeris {
    tracks: HashMap<Body, Vec<Sample>>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parse a position-document timestamp. Date-only keys mean midnight UTC.
pub fn parse_sample_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc())
        .map_err(|e| format!("Bad timestamp '{}': {}", s, e))
}

impl Ephemeris {
    pub fn from_json(text: &str) -> Result<Self, String> {
        // BTreeMap keeps keys in lexical order, which for these timestamp
        // shapes is chronological order.
        let raw: BTreeMap<String, BTreeMap<String, [f64; 3]>> =
            serde_json::from_str(text).map_err(|e| format!("JSON error: {}", e))?;

        let mut tracks: HashMap<Body, Vec<Sample>> = HashMap::new();
        for (stamp, positions) in &raw {
            let t = parse_sample_timestamp(stamp)?;
            for (key, pos) in positions {
                let body = match Body::from_key(key) {
                    Some(b) => b,
                    None => {
                        log::warn!("Position document names unknown body '{}'", key);
                        continue;
                    }
                };
                tracks.entry(body).or_default().push(Sample { t, pos: *pos });
            }
        }

        // Daily and hourly keys interleave lexically but not always
        // chronologically within one body, and a date-only key can coexist
        // with an equal midnight key. Sort and keep the first of each pair.
        for track in tracks.values_mut() {
            track.sort_by_key(|s| s.t);
            track.dedup_by_key(|s| s.t);
        }

        let start = tracks
            .values()
            .filter_map(|tr| tr.first().map(|s| s.t))
            .min()
            .ok_or("Position document contains no samples")?;
        let end = tracks
            .values()
            .filter_map(|tr| tr.last().map(|s| s.t))
            .max()
            .ok_or("Position document contains no samples")?;

        Ok(Self { tracks, start, end })
    }

    pub fn sample_count(&self) -> usize {
        self.tracks.values().map(|tr| tr.len()).sum()
    }

    /// Position of `body` at `t`: linear blend of the two samples bracketing
    /// `t` on this body's track. Queries outside the sampled range clamp to
    /// the endpoint sample; a query exactly on a sample returns that
    /// sample's stored coordinate unchanged.
    pub fn position_at(&self, body: Body, t: DateTime<Utc>) -> Option<[f64; 3]> {
        let track = self.tracks.get(&body)?;
        let (first, last) = (track.first()?, track.last()?);
        if t <= first.t {
            return Some(first.pos);
        }
        if t >= last.t {
            return Some(last.pos);
        }

        // Index of the first sample strictly after t; the bracket is
        // [idx - 1, idx]. Both exist because of the clamps above.
        let idx = track.partition_point(|s| s.t <= t);
        let lo = &track[idx - 1];
        let hi = &track[idx];

        let span = (hi.t - lo.t).num_milliseconds() as f64;
        let frac = (t - lo.t).num_milliseconds() as f64 / span;
        Some(lerp3(lo.pos, hi.pos, frac))
    }
}

pub fn lerp3(a: [f64; 3], b: [f64; 3], frac: f64) -> [f64; 3] {
    [
        a[0] + (b[0] - a[0]) * frac,
        a[1] + (b[1] - a[1]) * frac,
        a[2] + (b[2] - a[2]) * frac,
    ]
}

/// A satellite's position expressed relative to its primary body.
pub fn geocentric_offset(satellite: [f64; 3], primary: [f64; 3]) -> [f64; 3] {
    [
        satellite[0] - primary[0],
        satellite[1] - primary[1],
        satellite[2] - primary[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Ephemeris {
        let json = r#"{
            "2024-01-01": {"earth": [1.0, 0.0, 0.0], "mars": [0.0, 1.5, 0.0]},
            "2024-01-02": {"earth": [1.0, 0.2, 0.0], "mars": [0.1, 1.5, 0.0]},
            "2024-01-03": {"earth": [1.0, 0.4, 0.1], "mars": [0.2, 1.5, 0.0]},
            "2024-01-01 00:00:00": {"moon": [1.002, 0.0, 0.0]},
            "2024-01-01 01:00:00": {"moon": [1.002, 0.001, 0.0]},
            "2024-01-01 02:00:00": {"moon": [1.002, 0.002, 0.0]}
        }"#;
        Ephemeris::from_json(json).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        parse_sample_timestamp(s).unwrap()
    }

    #[test]
    fn exact_sample_returns_stored_coordinate() {
        let eph = fixture();
        assert_eq!(
            eph.position_at(Body::Earth, at("2024-01-02")).unwrap(),
            [1.0, 0.2, 0.0]
        );
        assert_eq!(
            eph.position_at(Body::Moon, at("2024-01-01 01:00:00")).unwrap(),
            [1.002, 0.001, 0.0]
        );
    }

    #[test]
    fn midpoint_is_componentwise_between_brackets() {
        let eph = fixture();
        let p = eph.position_at(Body::Earth, at("2024-01-01 12:00:00")).unwrap();
        assert!((p[0] - 1.0).abs() < 1e-12);
        assert!((p[1] - 0.1).abs() < 1e-12);
        for (i, (lo, hi)) in [(1.0, 1.0), (0.0, 0.2), (0.0, 0.0)].iter().enumerate() {
            assert!(p[i] >= *lo - 1e-12 && p[i] <= *hi + 1e-12);
        }
    }

    #[test]
    fn queries_outside_range_clamp_to_endpoints() {
        let eph = fixture();
        assert_eq!(
            eph.position_at(Body::Earth, at("2023-12-25")).unwrap(),
            [1.0, 0.0, 0.0]
        );
        assert_eq!(
            eph.position_at(Body::Earth, at("2024-06-01")).unwrap(),
            [1.0, 0.4, 0.1]
        );
    }

    #[test]
    fn tracks_keep_their_own_cadence() {
        let eph = fixture();
        // The moon track ends at 02:00; a noon query clamps to it rather
        // than interpolating against the daily earth samples.
        assert_eq!(
            eph.position_at(Body::Moon, at("2024-01-01 12:00:00")).unwrap(),
            [1.002, 0.002, 0.0]
        );
    }

    #[test]
    fn missing_body_yields_none() {
        let eph = fixture();
        assert!(eph.position_at(Body::Pluto, at("2024-01-01")).is_none());
    }

    #[test]
    fn range_spans_all_tracks() {
        let eph = fixture();
        assert_eq!(eph.start, at("2024-01-01"));
        assert_eq!(eph.end, at("2024-01-03"));
    }

    #[test]
    fn duplicate_midnight_keys_are_deduplicated() {
        let json = r#"{
            "2024-01-01": {"earth": [1.0, 0.0, 0.0]},
            "2024-01-01 00:00:00": {"earth": [9.0, 9.0, 9.0]},
            "2024-01-02": {"earth": [1.0, 0.2, 0.0]}
        }"#;
        let eph = Ephemeris::from_json(json).unwrap();
        let p = eph.position_at(Body::Earth, at("2024-01-01")).unwrap();
        // First occurrence wins; either way there is exactly one bracket.
        assert_eq!(p[0], 1.0);
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(Ephemeris::from_json("{}").is_err());
        assert!(Ephemeris::from_json("not json").is_err());
    }

    #[test]
    fn geocentric_offset_is_difference() {
        let off = geocentric_offset([1.002, 0.001, 0.0], [1.0, 0.0, 0.0]);
        assert!((off[0] - 0.002).abs() < 1e-12);
        assert!((off[1] - 0.001).abs() < 1e-12);
        assert_eq!(off[2], 0.0);
    }
}
