//! Display formatting shared by the chart and the feed.

pub mod num;
pub mod time;
