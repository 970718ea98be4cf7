//! Astronomical event feeds.
//!
//! Two JSON documents are parsed, merged, and sorted chronologically: the
//! general feed (retrogrades, aspects, sign changes) and the moon feed
//! (lunar days, moon aspects, phases). Events carry no decision logic;
//! they are shown next to the timeline.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::Deserialize;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventKind {
    Point,
    Period,
}

#[derive(Clone, Debug)]
pub struct Event {
    pub kind: EventKind,
    pub at: DateTime<Utc>,
    /// Set for period events only.
    pub span: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub description: String,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    datetime: String,
    #[serde(default)]
    datetime_start: Option<String>,
    #[serde(default)]
    datetime_end: Option<String>,
    description: String,
}

/// The generator emits two datetime shapes: naive minutes
/// (`2025-03-05 14:07`) and full stamps with a UTC offset
/// (`2025-03-05 14:07:00+00:00`).
pub fn parse_event_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    Err(format!("Bad event datetime '{}'", s))
}

pub fn parse_feed(text: &str) -> Result<Vec<Event>, String> {
    let raw: Vec<RawEvent> =
        serde_json::from_str(text).map_err(|e| format!("JSON error: {}", e))?;

    let mut events = Vec::with_capacity(raw.len());
    for r in raw {
        let at = parse_event_datetime(&r.datetime)?;
        let kind = match r.kind.as_str() {
            "period" => EventKind::Period,
            _ => EventKind::Point,
        };
        let span = if kind == EventKind::Period {
            let start = r
                .datetime_start
                .as_deref()
                .map(parse_event_datetime)
                .transpose()?
                .unwrap_or(at);
            let end = r
                .datetime_end
                .as_deref()
                .map(parse_event_datetime)
                .transpose()?;
            end.map(|e| (start, e))
        } else {
            None
        };
        events.push(Event {
            kind,
            at,
            span,
            description: r.description,
        });
    }
    Ok(events)
}

/// Merge the general and moon feeds into one chronological list. Sorting is
/// stable so same-instant events keep their feed order.
pub fn merge_feeds(mut general: Vec<Event>, moon: Vec<Event>) -> Vec<Event> {
    general.extend(moon);
    general.sort_by_key(|e| e.at);
    general
}

impl Event {
    /// Period events are active while `t` falls inside their span; point
    /// events light up for their UTC calendar day.
    pub fn is_active_at(&self, t: DateTime<Utc>) -> bool {
        match self.span {
            Some((start, end)) => start <= t && t < end,
            None => {
                self.at.year() == t.year() && self.at.ordinal() == t.ordinal()
            }
        }
    }
}

/// Index of the first event after `t`, for keeping the feed view pinned to
/// the timeline position.
pub fn index_after(events: &[Event], t: DateTime<Utc>) -> usize {
    events.partition_point(|e| e.at <= t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(dt: &str, desc: &str) -> String {
        format!(
            r#"{{"type": "point", "datetime": "{}", "description": "{}"}}"#,
            dt, desc
        )
    }

    #[test]
    fn parses_both_datetime_shapes() {
        let a = parse_event_datetime("2025-03-05 14:07").unwrap();
        let b = parse_event_datetime("2025-03-05 14:07:00+00:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_event_datetime("last tuesday").is_err());
    }

    #[test]
    fn parses_point_and_period_records() {
        let json = format!(
            r#"[
                {},
                {{"type": "period",
                  "datetime": "2024-12-01 08:30:00+00:00",
                  "datetime_start": "2024-12-01 08:30:00+00:00",
                  "datetime_end": "2024-12-02 00:00:00+00:00",
                  "description": "12 Moon day"}}
            ]"#,
            point("2024-12-05 03:00", "Mercury enters Capricorn")
        );
        let events = parse_feed(&json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Point);
        assert_eq!(events[1].kind, EventKind::Period);
        assert!(events[1].span.is_some());
    }

    #[test]
    fn merged_feed_is_chronological() {
        let general = parse_feed(&format!(
            "[{}, {}]",
            point("2024-12-10 00:00", "Mars turns retrograde"),
            point("2024-12-01 12:00", "Sun in Trine with Jupiter")
        ))
        .unwrap();
        let moon = parse_feed(&format!(
            "[{}]",
            point("2024-12-04 18:00", "Moon is Full Moon")
        ))
        .unwrap();

        let merged = merge_feeds(general, moon);
        let dates: Vec<_> = merged.iter().map(|e| e.at).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(merged[1].description, "Moon is Full Moon");
    }

    #[test]
    fn period_active_inside_span_only() {
        let events = parse_feed(
            r#"[{"type": "period",
                 "datetime": "2024-12-01 08:30:00+00:00",
                 "datetime_start": "2024-12-01 08:30:00+00:00",
                 "datetime_end": "2024-12-02 00:00:00+00:00",
                 "description": "12 Moon day"}]"#,
        )
        .unwrap();
        let e = &events[0];
        assert!(e.is_active_at(parse_event_datetime("2024-12-01 10:00").unwrap()));
        assert!(!e.is_active_at(parse_event_datetime("2024-12-02 00:00").unwrap()));
        assert!(!e.is_active_at(parse_event_datetime("2024-12-01 08:00").unwrap()));
    }

    #[test]
    fn point_active_on_its_calendar_day() {
        let events =
            parse_feed(&format!("[{}]", point("2024-12-05 03:00", "x"))).unwrap();
        let e = &events[0];
        assert!(e.is_active_at(parse_event_datetime("2024-12-05 23:59").unwrap()));
        assert!(!e.is_active_at(parse_event_datetime("2024-12-06 00:00").unwrap()));
    }

    #[test]
    fn index_after_tracks_timeline_position() {
        let merged = merge_feeds(
            parse_feed(&format!(
                "[{}, {}]",
                point("2024-12-01 00:00", "a"),
                point("2024-12-03 00:00", "b")
            ))
            .unwrap(),
            Vec::new(),
        );
        let mid = parse_event_datetime("2024-12-02 00:00").unwrap();
        assert_eq!(index_after(&merged, mid), 1);
    }
}
