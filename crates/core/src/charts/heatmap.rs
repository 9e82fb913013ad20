use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::calendar::{local_date, TimeWindow};
use crate::charts::DATE_FORMAT;
use crate::domain::reflection::{Reflection, ReflectionField, QUALITY_OPTIONS};

const EMPTY_DAY_COLOR: &str = "#EEEEEE";
const BORDER_COLOR: &str = "#C8C8C8";
const QUALITY_COLORS: [&str; 5] = ["#FF9F1C", "#FFBF69", "#FFFFFF", "#CBF3F0", "#2EC4B6"];

/// Work-day quality per viewer-local date. When a day has several reflections the latest one
/// wins; reflections without a scored quality answer are skipped.
pub fn daily_quality(reflections: &[Reflection], tz_offset_hours: i32) -> BTreeMap<NaiveDate, u8> {
    let mut ordered: Vec<&Reflection> = reflections.iter().collect();
    ordered.sort_by_key(|reflection| reflection.submitted_at);

    let mut days = BTreeMap::new();
    for reflection in ordered {
        if let Some(score) = reflection.answer(ReflectionField::WorkDayQuality).score() {
            days.insert(local_date(reflection.submitted_at, tz_offset_hours), score);
        }
    }
    days
}

/// Calendar heatmap covering `window`, one cell per day.
pub fn heatmap_chart(days: &BTreeMap<NaiveDate, u8>, window: TimeWindow) -> Value {
    let first = window.start.date_naive();
    let last = (window.end - Duration::seconds(1)).date_naive();

    let data: Vec<Value> = days
        .iter()
        .filter(|(date, _)| (first..=last).contains(*date))
        .map(|(date, score)| json!([date.format(DATE_FORMAT).to_string(), score]))
        .collect();

    let pieces: Vec<Value> = QUALITY_OPTIONS
        .options
        .iter()
        .zip(QUALITY_COLORS)
        .enumerate()
        .map(|(score, (option, color))| {
            json!({ "value": score, "label": option.text, "color": color })
        })
        .collect();

    json!({
        "visualMap": {
            "type": "piecewise",
            "orient": "horizontal",
            "left": "center",
            "bottom": 0,
            "pieces": pieces,
        },
        "calendar": {
            "range": [first.format(DATE_FORMAT).to_string(), last.format(DATE_FORMAT).to_string()],
            "cellSize": ["auto", 20],
            "splitLine": { "show": true },
            "dayLabel": { "firstDay": 1, "nameMap": "en" },
            "monthLabel": { "nameMap": "en" },
            "itemStyle": { "color": EMPTY_DAY_COLOR, "borderColor": BORDER_COLOR },
        },
        "series": {
            "type": "heatmap",
            "coordinateSystem": "calendar",
            "data": data,
        },
    })
}
