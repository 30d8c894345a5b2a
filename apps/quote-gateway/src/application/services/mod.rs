//! Composing services.

mod chart;

pub use chart::ChartService;
