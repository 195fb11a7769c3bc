use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::charts::ChartBoard;
use crate::client::PrinterFilter;
use crate::dashboard::DashboardController;

/// One entry in the printer filter dropdown.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterOption {
    pub id: String,
    pub name: String,
}

#[derive(Clone)]
pub struct ViewState {
    controller: Arc<DashboardController>,
    board: ChartBoard,
    printers: Arc<Vec<PrinterOption>>,
}

pub async fn start_view_server(
    controller: Arc<DashboardController>,
    board: ChartBoard,
    printers: Vec<PrinterOption>,
    port: u16,
) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = ViewState {
        controller,
        board,
        printers: Arc::new(printers),
    };

    let app = Router::new()
        .route("/", get(dashboard_page))
        .route("/view/charts", get(charts_handler))
        .route("/view/filters", get(filters_handler).post(set_filters_handler))
        .route("/view/refresh", post(refresh_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Dashboard view listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// Latest painted state of the four charts.
async fn charts_handler(State(state): State<ViewState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "charts": state.board.charts()
    }))
}

async fn filters_handler(State(state): State<ViewState>) -> impl IntoResponse {
    let filters = state.controller.filters().state();
    Json(serde_json::json!({
        "success": true,
        "days": filters.days,
        "printer_id": filters.printer.as_param(),
        "printers": &*state.printers
    }))
}

#[derive(Deserialize)]
struct FilterChange {
    days: Option<u32>,
    printer_id: Option<String>,
}

/// A filter control changed: record the new values, then run exactly one
/// fetch cycle. A failed cycle still answers 200 with the stale charts; the
/// failure shows up only in the logs.
async fn set_filters_handler(
    State(state): State<ViewState>,
    Json(change): Json<FilterChange>,
) -> impl IntoResponse {
    let filters = state.controller.filters();
    if let Some(days) = change.days {
        filters.set_days(days);
    }
    if let Some(printer_id) = change.printer_id {
        filters.set_printer(PrinterFilter::parse(&printer_id));
    }

    state.controller.run_cycle().await;

    Json(serde_json::json!({
        "success": true,
        "charts": state.board.charts()
    }))
}

/// The refresh button: one fetch cycle with the current filters.
async fn refresh_handler(State(state): State<ViewState>) -> impl IntoResponse {
    state.controller.run_cycle().await;

    Json(serde_json::json!({
        "success": true,
        "charts": state.board.charts()
    }))
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Print Shop Analytics</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .chart-container { position: relative; height: 300px; }
    </style>
</head>
<body class="bg-gray-900 text-gray-100 min-h-screen">
    <div class="container mx-auto px-4 py-6">
        <header class="mb-8 flex justify-between items-end">
            <div>
                <h1 class="text-3xl font-bold text-white mb-2">Print Shop Analytics</h1>
                <p class="text-gray-400">Orders, filament and printer utilization</p>
            </div>
            <div class="flex gap-3 items-end">
                <div>
                    <label for="daysFilter" class="text-gray-400 text-sm font-medium mb-1 block">Period</label>
                    <select id="daysFilter" class="bg-gray-700 border border-gray-600 rounded px-3 py-2 text-sm">
                        <option value="7">Last 7 days</option>
                        <option value="14">Last 14 days</option>
                        <option value="30" selected>Last 30 days</option>
                        <option value="90">Last 90 days</option>
                    </select>
                </div>
                <div>
                    <label for="printerFilter" class="text-gray-400 text-sm font-medium mb-1 block">Printer</label>
                    <select id="printerFilter" class="bg-gray-700 border border-gray-600 rounded px-3 py-2 text-sm min-w-[160px]">
                        <option value="all">All Printers</option>
                    </select>
                </div>
                <button id="refreshBtn" class="bg-blue-600 hover:bg-blue-700 px-4 py-2 rounded text-sm">Refresh</button>
            </div>
        </header>

        <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
            <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
                <h3 class="text-lg font-semibold mb-4">Orders Per Day</h3>
                <div class="chart-container">
                    <canvas id="ordersChart"></canvas>
                </div>
            </div>

            <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
                <h3 class="text-lg font-semibold mb-4">Order Status</h3>
                <div class="chart-container">
                    <canvas id="statusChart"></canvas>
                </div>
            </div>

            <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
                <h3 class="text-lg font-semibold mb-4">Filament Usage (grams)</h3>
                <div class="chart-container">
                    <canvas id="filamentChart"></canvas>
                </div>
            </div>

            <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
                <h3 class="text-lg font-semibold mb-4">Printer Utilization</h3>
                <div class="chart-container">
                    <canvas id="printerChart"></canvas>
                </div>
            </div>
        </div>
    </div>

    <script>
        // Chart instances keyed by surface id. The page is a dumb surface:
        // it paints whatever chart state the view hands it and forwards
        // control events; fetch and mapping logic live server-side.
        let charts = {};

        function buildChart(spec) {
            const ctx = document.getElementById(spec.id).getContext('2d');
            const options = { responsive: true, maintainAspectRatio: false };
            if (spec.kind === 'horizontal_bar') options.indexAxis = 'y';
            return new Chart(ctx, {
                type: spec.kind === 'horizontal_bar' ? 'bar' : spec.kind,
                data: {
                    labels: spec.labels.slice(),
                    datasets: [{
                        label: spec.dataset_label || undefined,
                        data: spec.data.slice(),
                        backgroundColor: spec.colors.length === 1 ? spec.colors[0] : spec.colors
                    }]
                },
                options
            });
        }

        function render(specs) {
            for (const spec of specs) {
                const chart = charts[spec.id];
                if (!chart) {
                    charts[spec.id] = buildChart(spec);
                    continue;
                }
                chart.data.labels = spec.labels.slice();
                chart.data.datasets[0].data = spec.data.slice();
                chart.update();
            }
        }

        async function loadFilters() {
            const response = await fetch('/view/filters');
            const result = await response.json();
            const printerSelect = document.getElementById('printerFilter');
            printerSelect.innerHTML = '<option value="all">All Printers</option>' +
                result.printers.map(p => `<option value="${p.id}">${p.name}</option>`).join('');
            printerSelect.value = result.printer_id;
            document.getElementById('daysFilter').value = String(result.days);
        }

        async function refresh() {
            try {
                const response = await fetch('/view/refresh', { method: 'POST' });
                const result = await response.json();
                if (result.success) render(result.charts);
            } catch (error) {
                console.error('Error refreshing analytics:', error);
            }
        }

        async function applyFilters(change) {
            try {
                const response = await fetch('/view/filters', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(change)
                });
                const result = await response.json();
                if (result.success) render(result.charts);
            } catch (error) {
                console.error('Error updating filters:', error);
            }
        }

        document.addEventListener('DOMContentLoaded', async () => {
            try {
                await loadFilters();
                const response = await fetch('/view/charts');
                const result = await response.json();
                if (result.success) render(result.charts);
            } catch (error) {
                console.error('Error loading dashboard:', error);
            }

            document.getElementById('refreshBtn').addEventListener('click', refresh);
            document.getElementById('daysFilter').addEventListener('change',
                e => applyFilters({ days: parseInt(e.target.value, 10) }));
            document.getElementById('printerFilter').addEventListener('change',
                e => applyFilters({ printer_id: e.target.value }));
        });
    </script>
</body>
</html>
"##;
