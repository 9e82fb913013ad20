//! Calendar windows used to query and bucket reflections.
//!
//! Offsets are whole hours as captured in the capability token. None of these functions
//! validate the offset; absurd values produce well-defined but unusual boundaries.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Length of the report chart: the prior full week plus the current one.
pub const REPORT_SPAN_DAYS: i64 = 14;

/// A half-open `[start, end)` range of UTC instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// January 1, 00:00:00 UTC of the UTC year containing `now`.
pub fn start_of_year(now: DateTime<Utc>) -> DateTime<Utc> {
    utc_midnight(NaiveDate::from_yo_opt(now.year(), 1).unwrap_or(now.date_naive()))
}

/// Heatmap window: `[Jan 1 00:00 UTC, tomorrow 00:00 UTC)`, so all of today is included.
///
/// Not shifted by the viewer offset; it is a coarse "this year" filter.
pub fn year_to_date(now: DateTime<Utc>) -> TimeWindow {
    let tomorrow = now.date_naive() + Duration::days(1);
    TimeWindow { start: start_of_year(now), end: utc_midnight(tomorrow) }
}

/// UTC instant of local midnight on the Monday of the week strictly before the week
/// containing `now`.
///
/// The Monday is chosen on the UTC calendar (7 to 13 days back), then shifted by the viewer
/// offset: `utc = local_midnight_as_if_utc - tz_offset_hours`.
pub fn monday_of_week_before(now: DateTime<Utc>, tz_offset_hours: i32) -> DateTime<Utc> {
    let weekday = i64::from(now.weekday().num_days_from_monday());
    let mut day_offset = weekday.rem_euclid(7) + 7;
    while day_offset <= 0 {
        day_offset += 7;
    }

    let monday = now.date_naive() - Duration::days(day_offset);
    utc_midnight(monday) - Duration::hours(i64::from(tz_offset_hours))
}

/// Report window: two weeks starting at [`monday_of_week_before`].
pub fn report_window(now: DateTime<Utc>, tz_offset_hours: i32) -> TimeWindow {
    let start = monday_of_week_before(now, tz_offset_hours);
    TimeWindow { start, end: start + Duration::days(REPORT_SPAN_DAYS) }
}

/// Re-expresses a stored UTC timestamp as the viewer's calendar date.
pub fn local_date(stored: DateTime<Utc>, tz_offset_hours: i32) -> NaiveDate {
    (stored - Duration::hours(i64::from(tz_offset_hours))).date_naive()
}

/// Converts a Slack `tz_offset` in seconds into whole hours, truncating toward zero.
pub fn offset_hours_from_seconds(tz_offset_secs: i64) -> i32 {
    i32::try_from(tz_offset_secs / 3600).unwrap_or(0)
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

    use super::{
        local_date, monday_of_week_before, offset_hours_from_seconds, report_window,
        start_of_year, year_to_date,
    };

    fn at(value: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
            .expect("test timestamp should parse")
            .and_utc()
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("test date should parse")
    }

    #[test]
    fn monday_of_week_before_matches_reference_cases() {
        let cases = [
            ("2021-07-02 14:25:01", 0, "2021-06-21 00:00:00"),
            ("2021-03-02 01:22:01", 0, "2021-02-22 00:00:00"),
            ("2020-03-02 01:22:01", 0, "2020-02-24 00:00:00"),
            ("2021-03-02 01:22:01", -4, "2021-02-22 04:00:00"),
            ("2021-03-02 01:22:01", 6, "2021-02-21 18:00:00"),
        ];

        for (now, offset, expected) in cases {
            assert_eq!(
                monday_of_week_before(at(now), offset),
                at(expected),
                "now={now} offset={offset}"
            );
        }
    }

    #[test]
    fn monday_of_week_before_is_always_previous_week() {
        let first = at("2021-03-01 00:00:00");
        for day in 0..14 {
            for hour in [0, 11, 23] {
                let now = first + Duration::days(day) + Duration::hours(hour);
                for offset in -12..=14 {
                    let shifted = monday_of_week_before(now, offset);
                    let monday = shifted + Duration::hours(i64::from(offset));
                    let back = (now.date_naive() - monday.date_naive()).num_days();

                    assert_eq!(monday.format("%A").to_string(), "Monday");
                    assert_eq!(monday.time(), chrono::NaiveTime::MIN);
                    assert!((7..=13).contains(&back), "now={now} offset={offset} back={back}");
                }
            }
        }
    }

    #[test]
    fn report_window_spans_two_weeks() {
        let window = report_window(at("2021-03-02 01:22:01"), -4);

        assert_eq!(window.start, at("2021-02-22 04:00:00"));
        assert_eq!(window.end, at("2021-03-08 04:00:00"));
        assert!(window.contains(at("2021-03-02 01:22:01")));
    }

    #[test]
    fn start_of_year_is_utc_midnight_january_first() {
        assert_eq!(start_of_year(at("2021-07-02 14:25:01")), at("2021-01-01 00:00:00"));
        assert_eq!(start_of_year(at("2020-01-01 00:00:00")), at("2020-01-01 00:00:00"));
    }

    #[test]
    fn year_to_date_includes_today_and_excludes_tomorrow() {
        let window = year_to_date(at("2021-07-02 14:25:01"));

        assert_eq!(window.start, at("2021-01-01 00:00:00"));
        assert_eq!(window.end, at("2021-07-03 00:00:00"));
        assert!(window.contains(at("2021-07-02 23:59:59")));
        assert!(!window.contains(at("2021-07-03 00:00:00")));
        assert!(!window.contains(at("2020-12-31 23:59:59")));
    }

    #[test]
    fn year_to_date_on_new_years_eve_ends_at_next_year() {
        let window = year_to_date(at("2021-12-31 18:00:00"));

        assert_eq!(window.start, at("2021-01-01 00:00:00"));
        assert_eq!(window.end, at("2022-01-01 00:00:00"));
    }

    #[test]
    fn local_date_buckets_by_viewer_offset() {
        let stored = at("2021-03-02 02:00:00");

        assert_eq!(local_date(stored, 6), date("2021-03-01"));
        assert_eq!(local_date(stored, -6), date("2021-03-02"));
        assert_eq!(local_date(stored, 0), date("2021-03-02"));
    }

    #[test]
    fn slack_offsets_truncate_to_whole_hours() {
        assert_eq!(offset_hours_from_seconds(-18_000), -5);
        assert_eq!(offset_hours_from_seconds(19_800), 5);
        assert_eq!(offset_hours_from_seconds(0), 0);
    }
}
