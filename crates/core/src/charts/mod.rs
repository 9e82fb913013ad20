//! Declarative chart descriptions handed to the render service.
//!
//! Builders here only shape data into ECharts option objects; turning them into pixels is the
//! renderer's job.

pub mod heatmap;
pub mod report;

pub use heatmap::{daily_quality, heatmap_chart};
pub use report::{interruptions_meetings_chart, ReportRow};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
