//! Survey analytics: distribution statistics and chart rasterization.
//!
//! [`compute_analytics`] folds a canonical model into one [`Analytics`]
//! structure; [`render_chart`] turns a question's distribution into a PNG.
//! Every analytics-flavored artifact is generated from these two calls.

pub mod chart;
pub mod stats;

pub use chart::{render_chart, ChartError, CHART_HEIGHT, CHART_WIDTH};
pub use stats::{
    compute_analytics, format_percentage, Analytics, ChartKind, FrequencyEntry, QuestionStats,
    StatsDetail, TEXT_SAMPLE_LIMIT,
};
