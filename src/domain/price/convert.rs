//! Conversions from wire types to chart points.

use super::wire::MarketChartPoint;
use super::PricePoint;
use crate::shared::fmt::time::chart_label;
use crate::shared::Granularity;
use chrono::TimeZone;
use std::fmt::Display;

impl PricePoint {
    /// Label a market-chart pair at `granularity` in `tz`.
    pub fn from_chart<Tz>(point: MarketChartPoint, granularity: Granularity, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            time: point.time_ms,
            label: chart_label(point.time_ms, granularity, tz),
            value: point.price,
        }
    }
}

/// Label a whole upstream series, preserving its order.
pub fn label_series<Tz>(
    points: Vec<MarketChartPoint>,
    granularity: Granularity,
    tz: &Tz,
) -> Vec<PricePoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    points
        .into_iter()
        .map(|p| PricePoint::from_chart(p, granularity, tz))
        .collect()
}
