pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::{clients, expenses, health_score, invoices, recurring, targets, time, timer};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Clients
        .route(
            "/api/clients",
            get(clients::handlers::list_clients).post(clients::handlers::create_client),
        )
        .route("/api/clients/stats", get(clients::handlers::client_stats))
        .route(
            "/api/clients/:id",
            get(clients::handlers::get_client)
                .put(clients::handlers::update_client)
                .delete(clients::handlers::delete_client),
        )
        .route(
            "/api/clients/:id/time-entry-summary",
            get(time::handlers::client_status_summary),
        )
        // Time entries
        .route(
            "/api/time-entries",
            get(time::handlers::list_time_entries).post(time::handlers::create_time_entry),
        )
        .route("/api/time-entries/stats", get(time::handlers::time_entry_stats))
        .route("/api/time-entries/today", get(time::handlers::today_entries))
        .route("/api/time-entries/unbilled", get(time::handlers::unbilled_entries))
        .route(
            "/api/time-entries/:id",
            put(time::handlers::update_time_entry).delete(time::handlers::delete_time_entry),
        )
        // Timer
        .route("/api/timer", get(timer::handlers::current_session))
        .route("/api/timer/start", post(timer::handlers::start_timer))
        .route("/api/timer/pause", post(timer::handlers::pause_timer))
        .route("/api/timer/resume", post(timer::handlers::resume_timer))
        .route("/api/timer/stop", post(timer::handlers::stop_timer))
        // Expenses
        .route(
            "/api/expenses",
            get(expenses::handlers::list_expenses).post(expenses::handlers::create_expense),
        )
        .route("/api/expenses/metrics", get(expenses::handlers::expense_metrics))
        .route(
            "/api/expenses/:id",
            put(expenses::handlers::update_expense).delete(expenses::handlers::delete_expense),
        )
        // Recurring expense templates
        .route(
            "/api/recurring-expenses",
            get(recurring::handlers::list_templates).post(recurring::handlers::create_template),
        )
        .route("/api/recurring-expenses/due", get(recurring::handlers::due_occurrences))
        .route("/api/recurring-expenses/forecast", get(recurring::handlers::forecast))
        .route(
            "/api/recurring-expenses/:id",
            put(recurring::handlers::update_template).delete(recurring::handlers::delete_template),
        )
        .route(
            "/api/recurring-expenses/:id/preview",
            get(recurring::handlers::preview_template),
        )
        .route(
            "/api/recurring-expenses/:id/post",
            post(recurring::handlers::post_occurrence),
        )
        // Invoices
        .route(
            "/api/invoices",
            get(invoices::handlers::list_invoices).post(invoices::handlers::create_invoice),
        )
        .route(
            "/api/invoices/dashboard-metrics",
            get(invoices::handlers::dashboard_metrics),
        )
        .route(
            "/api/invoices/:id",
            get(invoices::handlers::get_invoice).delete(invoices::handlers::delete_invoice),
        )
        .route("/api/invoices/:id/status", patch(invoices::handlers::update_status))
        // Profit targets
        .route(
            "/api/profit-targets",
            get(targets::handlers::get_targets).put(targets::handlers::upsert_targets),
        )
        // Business health dashboard
        .route(
            "/api/dashboard/health-score",
            get(health_score::handlers::health_score),
        )
        .with_state(state)
}
