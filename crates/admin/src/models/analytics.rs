//! Sales and traffic reporting.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pazar_core::{OrderStatus, round_money};

pub const DEFAULT_DAYS: u32 = 30;
pub const MAX_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}

impl AnalyticsQuery {
    /// Reporting window in days, clamped to `1..=MAX_DAYS`.
    #[must_use]
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub day: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
    pub visitors: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub days: u32,
    /// Revenue from orders that are not cancelled.
    pub revenue: Decimal,
    pub order_count: i64,
    pub average_order_value: Decimal,
    pub status_breakdown: Vec<StatusCount>,
    pub top_products: Vec<TopProduct>,
    pub daily: Vec<DailyPoint>,
    pub unique_visitors: i64,
    pub page_views: i64,
    /// Orders per unique visitor, as a percentage.
    pub conversion_rate: Decimal,
}

/// Revenue divided by order count, zero when there are no orders.
#[must_use]
pub fn average_order_value(revenue: Decimal, orders: i64) -> Decimal {
    if orders <= 0 {
        return Decimal::ZERO;
    }
    round_money(revenue / Decimal::from(orders))
}

/// `orders / visitors * 100`, zero without visitors.
#[must_use]
pub fn conversion_rate(orders: i64, visitors: i64) -> Decimal {
    if visitors <= 0 {
        return Decimal::ZERO;
    }
    round_money(Decimal::from(orders) * Decimal::ONE_HUNDRED / Decimal::from(visitors))
}

/// Fill days with no activity so the series has one point per day from
/// `start` to `end` inclusive. `points` must be sorted by day.
#[must_use]
pub fn fill_daily_series(start: NaiveDate, end: NaiveDate, points: &[DailyPoint]) -> Vec<DailyPoint> {
    let mut out = Vec::new();
    let mut known = points.iter().peekable();
    let mut day = start;
    while day <= end {
        match known.peek() {
            Some(p) if p.day == day => {
                out.push((*p).clone());
                known.next();
            }
            _ => out.push(DailyPoint {
                day,
                orders: 0,
                revenue: Decimal::ZERO,
                visitors: 0,
            }),
        }
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    #[test]
    fn test_days_clamped() {
        assert_eq!(AnalyticsQuery::default().days(), DEFAULT_DAYS);
        assert_eq!(AnalyticsQuery { days: Some(0) }.days(), 1);
        assert_eq!(AnalyticsQuery { days: Some(9999) }.days(), MAX_DAYS);
    }

    #[test]
    fn test_average_and_conversion() {
        assert_eq!(average_order_value(Decimal::new(10000, 2), 3), Decimal::new(3333, 2));
        assert_eq!(average_order_value(Decimal::new(500, 2), 0), Decimal::ZERO);
        assert_eq!(conversion_rate(3, 200), Decimal::new(150, 2));
        assert_eq!(conversion_rate(3, 0), Decimal::ZERO);
    }

    #[test]
    fn test_fill_daily_series() {
        let known = vec![DailyPoint {
            day: d(2),
            orders: 4,
            revenue: Decimal::new(4000, 2),
            visitors: 10,
        }];
        let series = fill_daily_series(d(1), d(3), &known);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].orders, 0);
        assert_eq!(series[1], known[0]);
        assert_eq!(series[2].day, d(3));
    }
}
