pub mod calendar;
pub mod capability;
pub mod charts;
pub mod config;
pub mod domain;
pub mod errors;

pub use calendar::{
    local_date, monday_of_week_before, offset_hours_from_seconds, report_window, start_of_year,
    year_to_date, TimeWindow,
};
pub use capability::{
    token_from_path, CapabilityEngine, CapabilityParams, KeyError, SigningKey, TokenError,
};
pub use charts::{daily_quality, heatmap_chart, interruptions_meetings_chart, ReportRow};
pub use domain::reflection::{AnswerCode, Answers, Reflection, ReflectionField, QUESTIONS};
pub use errors::{ApplicationError, InterfaceError};
