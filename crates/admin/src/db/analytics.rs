//! Sales and traffic aggregates over a trailing window of days (UTC).

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pazar_core::OrderStatus;

use super::RepositoryError;
use crate::models::analytics::{average_order_value, conversion_rate, fill_daily_series};
use crate::models::{AnalyticsSummary, DailyPoint, StatusCount, TopProduct};

const TOP_PRODUCTS: i64 = 10;

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    revenue: Decimal,
    order_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    product_name: String,
    quantity: i64,
    revenue: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct TrafficRow {
    unique_visitors: i64,
    page_views: i64,
}

/// First day of a window of `days` days ending today.
fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today - Duration::days(i64::from(days.saturating_sub(1)))
}

/// Repository for reporting queries.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Summary of the last `days` days, today included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` for an unknown order status.
    #[tracing::instrument(skip(self))]
    pub async fn summary(&self, days: u32) -> Result<AnalyticsSummary, RepositoryError> {
        let today = Utc::now().date_naive();
        let start = window_start(today, days);

        let totals = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT COALESCE(SUM(total), 0) AS revenue, COUNT(*) AS order_count
            FROM orders
            WHERE status <> 'cancelled'
              AND (created_at AT TIME ZONE 'UTC')::DATE >= $1
            ",
        )
        .bind(start)
        .fetch_one(self.pool)
        .await?;

        let statuses: Vec<(String, i64)> = sqlx::query_as(
            r"
            SELECT status, COUNT(*)
            FROM orders
            WHERE (created_at AT TIME ZONE 'UTC')::DATE >= $1
            GROUP BY status
            ORDER BY COUNT(*) DESC, status
            ",
        )
        .bind(start)
        .fetch_all(self.pool)
        .await?;

        let status_breakdown = statuses
            .into_iter()
            .map(|(status, count)| {
                status
                    .parse::<OrderStatus>()
                    .map(|status| StatusCount { status, count })
                    .map_err(RepositoryError::DataCorruption)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let top_products = sqlx::query_as::<_, TopProductRow>(
            r"
            SELECT i.product_name, SUM(i.quantity)::BIGINT AS quantity,
                   SUM(i.line_total) AS revenue
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            WHERE o.status <> 'cancelled'
              AND (o.created_at AT TIME ZONE 'UTC')::DATE >= $1
            GROUP BY i.product_name
            ORDER BY quantity DESC, revenue DESC, i.product_name
            LIMIT $2
            ",
        )
        .bind(start)
        .bind(TOP_PRODUCTS)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|r| TopProduct {
            product_name: r.product_name,
            quantity: r.quantity,
            revenue: r.revenue,
        })
        .collect();

        let daily_sales: Vec<(NaiveDate, i64, Decimal)> = sqlx::query_as(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*),
                   COALESCE(SUM(total), 0)
            FROM orders
            WHERE status <> 'cancelled'
              AND (created_at AT TIME ZONE 'UTC')::DATE >= $1
            GROUP BY day
            ",
        )
        .bind(start)
        .fetch_all(self.pool)
        .await?;

        let daily_visitors: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(DISTINCT visitor_hash)
            FROM visitor_events
            WHERE (created_at AT TIME ZONE 'UTC')::DATE >= $1
            GROUP BY day
            ",
        )
        .bind(start)
        .fetch_all(self.pool)
        .await?;

        let traffic = sqlx::query_as::<_, TrafficRow>(
            r"
            SELECT COUNT(DISTINCT visitor_hash) AS unique_visitors, COUNT(*) AS page_views
            FROM visitor_events
            WHERE (created_at AT TIME ZONE 'UTC')::DATE >= $1
            ",
        )
        .bind(start)
        .fetch_one(self.pool)
        .await?;

        let known = merge_daily(daily_sales, daily_visitors);
        Ok(AnalyticsSummary {
            days,
            average_order_value: average_order_value(totals.revenue, totals.order_count),
            conversion_rate: conversion_rate(totals.order_count, traffic.unique_visitors),
            revenue: totals.revenue,
            order_count: totals.order_count,
            status_breakdown,
            top_products,
            daily: fill_daily_series(start, today, &known),
            unique_visitors: traffic.unique_visitors,
            page_views: traffic.page_views,
        })
    }
}

/// Join per-day sales and visitor counts into points sorted by day.
fn merge_daily(
    sales: Vec<(NaiveDate, i64, Decimal)>,
    visitors: Vec<(NaiveDate, i64)>,
) -> Vec<DailyPoint> {
    let mut by_day: BTreeMap<NaiveDate, DailyPoint> = BTreeMap::new();
    for (day, orders, revenue) in sales {
        let point = by_day.entry(day).or_insert_with(|| empty_point(day));
        point.orders = orders;
        point.revenue = revenue;
    }
    for (day, count) in visitors {
        by_day.entry(day).or_insert_with(|| empty_point(day)).visitors = count;
    }
    by_day.into_values().collect()
}

const fn empty_point(day: NaiveDate) -> DailyPoint {
    DailyPoint {
        day,
        orders: 0,
        revenue: Decimal::ZERO,
        visitors: 0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_window_start_includes_today() {
        assert_eq!(window_start(d(10), 1), d(10));
        assert_eq!(window_start(d(10), 7), d(4));
    }

    #[test]
    fn test_merge_daily_sorts_and_combines() {
        let merged = merge_daily(
            vec![(d(3), 2, Decimal::new(5000, 2)), (d(1), 1, Decimal::TEN)],
            vec![(d(3), 40), (d(2), 7)],
        );
        let days: Vec<_> = merged.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![d(1), d(2), d(3)]);
        assert_eq!(merged[1].orders, 0);
        assert_eq!(merged[1].visitors, 7);
        assert_eq!(merged[2].orders, 2);
        assert_eq!(merged[2].visitors, 40);
    }
}
