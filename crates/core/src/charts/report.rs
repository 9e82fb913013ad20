use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::calendar::{local_date, TimeWindow};
use crate::charts::DATE_FORMAT;
use crate::domain::reflection::{
    Reflection, ReflectionField, AMOUNT_OF_DAY_OPTIONS, NUMBER_OPTIONS,
};

const MARK_AREA_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Quality score at or above which a day is shaded as good.
pub const GOOD_DAY_SCORE: u8 = 3;

const PALETTE: [&str; 15] = [
    "#c1232b", "#27727b", "#fcce10", "#e87c25", "#b5c334", "#fe8463", "#9bca63", "#fad860",
    "#f3a43b", "#60c0dd", "#d7504b", "#c6e579", "#f4e001", "#f0805a", "#26c0c0",
];

/// One reflection as plotted on the report, dated in the viewer's calendar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub meetings: &'static str,
    pub interruptions: &'static str,
    pub good_day: bool,
}

impl ReportRow {
    pub fn from_reflection(reflection: &Reflection, tz_offset_hours: i32) -> Self {
        let quality = reflection.answer(ReflectionField::WorkDayQuality).score();
        Self {
            date: local_date(reflection.submitted_at, tz_offset_hours),
            meetings: NUMBER_OPTIONS.text_for(reflection.answer(ReflectionField::MeetingNumber)),
            interruptions: AMOUNT_OF_DAY_OPTIONS
                .text_for(reflection.answer(ReflectionField::InterruptedAmount)),
            good_day: quality.is_some_and(|score| score >= GOOD_DAY_SCORE),
        }
    }
}

/// Meetings and interruptions over `window`, with good days shaded.
pub fn interruptions_meetings_chart(rows: &[ReportRow], window: TimeWindow) -> Value {
    json!({
        "title": {
            "text": "Meetings and interruptions",
            "subtext": "Shaded days are good days",
        },
        "legend": { "type": "plain", "top": "bottom", "left": "center" },
        "xAxis": { "type": "time" },
        "yAxis": [
            {
                "type": "category",
                "data": NUMBER_OPTIONS.texts(),
                "axisLine": { "lineStyle": { "color": "#c1232b", "type": "dotted" } },
            },
            {
                "type": "category",
                "data": AMOUNT_OF_DAY_OPTIONS.texts(),
                "axisLine": { "lineStyle": { "color": "#27727b", "type": "dashed" } },
            },
        ],
        "dataset": {
            "dimensions": [
                { "name": "date", "type": "time" },
                { "name": "interruptions", "type": "ordinal" },
                { "name": "meetings", "type": "ordinal" },
            ],
            "source": source_data(rows, window),
        },
        "series": [
            {
                "name": "Meetings",
                "type": "line",
                "encode": { "x": "date", "y": "meetings" },
                "symbol": "emptySquare",
                "symbolSize": 10,
                "lineStyle": { "type": "dotted" },
            },
            {
                "name": "Interruptions",
                "type": "line",
                "encode": { "x": "date", "y": "interruptions" },
                "yAxisIndex": 1,
                "symbol": "emptyCircle",
                "symbolSize": 10,
                "lineStyle": { "type": "dashed" },
                "markArea": { "data": mark_areas(rows) },
            },
        ],
        "color": PALETTE,
    })
}

// Window edges are plotted as empty points so the time axis always spans the full window.
fn source_data(rows: &[ReportRow], window: TimeWindow) -> Vec<Value> {
    let mut source = Vec::with_capacity(rows.len() + 2);
    source.push(json!({ "date": window.start.format(DATE_FORMAT).to_string() }));
    source.extend(rows.iter().map(|row| {
        json!({
            "date": row.date.format(DATE_FORMAT).to_string(),
            "meetings": row.meetings,
            "interruptions": row.interruptions,
        })
    }));
    source.push(json!({ "date": window.end.format(DATE_FORMAT).to_string() }));
    source
}

fn mark_areas(rows: &[ReportRow]) -> Vec<Value> {
    rows.iter()
        .filter(|row| row.good_day)
        .map(|row| {
            let end = row.date.and_hms_opt(12, 0, 0).unwrap_or_default();
            let start = end - Duration::days(1);
            json!([
                { "xAxis": start.format(MARK_AREA_FORMAT).to_string() },
                { "xAxis": end.format(MARK_AREA_FORMAT).to_string() },
            ])
        })
        .collect()
}
