//! Builds the health score input snapshot from the database.

use chrono::{Datelike, Days, NaiveDate};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::AppError;
use crate::invoices::metrics::dashboard_metrics;
use crate::models::targets::ProfitTargetsRow;
use crate::models::time_entry::TimeEntryRow;
use crate::targets::schedule::days_in_month;
use crate::time::stats::fetch_time_stats;

use super::inputs::{
    ClientRevenueSnapshot, ClientShareWindow, HealthScoreInputs, MtdCalculations,
    TargetsSnapshot, TopClient, WindowPair,
};

/// Top-client concentration over the rolling windows, computed from
/// billable time entry values per client.
pub fn client_revenue_snapshot(
    entries: &[TimeEntryRow],
    client_names: &HashMap<Uuid, String>,
    today: NaiveDate,
) -> ClientRevenueSnapshot {
    fn share_window(
        entries: &[TimeEntryRow],
        from: NaiveDate,
        to: NaiveDate,
    ) -> (ClientShareWindow, Option<Uuid>) {
        let mut by_client: HashMap<Uuid, f64> = HashMap::new();
        let mut total = 0.0;

        for entry in entries {
            if entry.entry_date < from || entry.entry_date > to || !entry.billable {
                continue;
            }
            let value = entry.value();
            total += value;
            if let Some(client_id) = entry.client_id {
                *by_client.entry(client_id).or_insert(0.0) += value;
            }
        }

        let top = by_client
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let share = match (&top, total > 0.0) {
            (Some((_, revenue)), true) => revenue / total * 100.0,
            _ => 0.0,
        };

        (
            ClientShareWindow {
                top_client_share: share,
                total_revenue: total,
            },
            top.map(|(id, _)| id),
        )
    }

    let (current, current_top) = share_window(entries, today - Days::new(29), today);
    let (previous, _) = share_window(entries, today - Days::new(59), today - Days::new(30));

    let top_client = current_top.and_then(|id| {
        client_names.get(&id).map(|name| TopClient {
            name: name.clone(),
            revenue_share: current.top_client_share,
        })
    });

    ClientRevenueSnapshot {
        top_client,
        rolling: Some(WindowPair { current, previous }),
    }
}

pub fn mtd_calculations(targets: Option<&TargetsSnapshot>, today: NaiveDate) -> MtdCalculations {
    let current_day = today.day();
    let total_days = days_in_month(today);
    let month_progress = current_day as f64 / total_days as f64;

    MtdCalculations {
        current_day,
        days_in_month: total_days,
        month_progress,
        mtd_revenue_target: targets
            .map(|t| t.monthly_revenue_target * month_progress)
            .unwrap_or(0.0),
        mtd_hours_target: targets
            .map(|t| t.monthly_hours_target * month_progress)
            .unwrap_or(0.0),
    }
}

pub async fn assemble_inputs(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<HealthScoreInputs, AppError> {
    let dashboard = dashboard_metrics(pool, user_id, today).await?;
    let time_stats = fetch_time_stats(pool, user_id, today).await?;

    let targets_row: Option<ProfitTargetsRow> =
        sqlx::query_as("SELECT * FROM profit_targets WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let profit_targets = targets_row.as_ref().map(TargetsSnapshot::from);

    let entries: Vec<TimeEntryRow> = sqlx::query_as(
        "SELECT * FROM time_entries WHERE user_id = $1 AND entry_date >= $2 AND entry_date <= $3",
    )
    .bind(user_id)
    .bind(today - Days::new(59))
    .bind(today)
    .fetch_all(pool)
    .await?;

    let client_names: HashMap<Uuid, String> =
        sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM clients WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let client_revenue = client_revenue_snapshot(&entries, &client_names, today);
    let mtd = mtd_calculations(profit_targets.as_ref(), today);

    Ok(HealthScoreInputs {
        dashboard,
        time_stats,
        mtd,
        profit_targets,
        client_revenue: Some(client_revenue),
    })
}
