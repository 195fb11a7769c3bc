use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::charts::{self, ChartBoard, ChartHandle, ChartSurface};
use crate::client::{PrinterFilter, StatsQuery, StatsSource};
use crate::stats::StatsSnapshot;

/// Current values of the dashboard's filter controls.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub days: u32,
    pub printer: PrinterFilter,
}

/// Shared handle to the filter controls. The view layer writes on control
/// changes; the controller reads at the start of each fetch cycle.
#[derive(Clone)]
pub struct Filters {
    inner: Arc<Mutex<FilterState>>,
}

impl Filters {
    pub fn new(days: u32, printer: PrinterFilter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FilterState { days, printer })),
        }
    }

    pub fn state(&self) -> FilterState {
        self.inner.lock().unwrap().clone()
    }

    pub fn query(&self) -> StatsQuery {
        let state = self.inner.lock().unwrap();
        StatsQuery {
            days: state.days,
            printer: state.printer.clone(),
        }
    }

    pub fn set_days(&self, days: u32) {
        self.inner.lock().unwrap().days = days;
    }

    pub fn set_printer(&self, printer: PrinterFilter) {
        self.inner.lock().unwrap().printer = printer;
    }
}

/// Constructor-injected rendering surfaces, one per chart.
pub struct ChartSurfaces {
    pub orders: Box<dyn ChartSurface>,
    pub status: Box<dyn ChartSurface>,
    pub filament: Box<dyn ChartSurface>,
    pub printer: Box<dyn ChartSurface>,
}

impl ChartSurfaces {
    /// All four surfaces publishing onto the same board.
    pub fn publishing(board: &ChartBoard) -> Self {
        Self {
            orders: board.surface(),
            status: board.surface(),
            filament: board.surface(),
            printer: board.surface(),
        }
    }
}

/// Owns the four chart handles and keeps them synchronized with the latest
/// backend snapshot. Everything user-visible goes through here: startup runs
/// one cycle, after which cycles happen only on control events.
pub struct DashboardController {
    source: Arc<dyn StatsSource>,
    filters: Filters,
    orders: ChartHandle,
    status: ChartHandle,
    filament: ChartHandle,
    printer: ChartHandle,
}

impl DashboardController {
    /// Builds the four charts against their surfaces, empty, and paints the
    /// initial state. Runs exactly once, before any update.
    pub fn new(
        source: Arc<dyn StatsSource>,
        filters: Filters,
        surfaces: ChartSurfaces,
    ) -> anyhow::Result<Self> {
        let controller = Self {
            source,
            filters,
            orders: ChartHandle::new(charts::orders_chart(), surfaces.orders),
            status: ChartHandle::new(charts::status_chart(), surfaces.status),
            filament: ChartHandle::new(charts::filament_chart(), surfaces.filament),
            printer: ChartHandle::new(charts::printer_chart(), surfaces.printer),
        };
        controller.orders.redraw()?;
        controller.status.redraw()?;
        controller.filament.redraw()?;
        controller.printer.redraw()?;
        Ok(controller)
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// One fetch cycle: read the filter values now, issue one request, and
    /// either apply the snapshot to every chart or leave all of them
    /// untouched.
    ///
    /// Overlapping cycles are not deduplicated or cancelled; the charts end
    /// up reflecting whichever response resolved last, regardless of trigger
    /// order. The correlation id makes out-of-order completions visible in
    /// the logs.
    pub async fn run_cycle(&self) {
        let cycle = Uuid::new_v4();
        let query = self.filters.query();
        debug!(%cycle, days = query.days, printer = %query.printer, "fetch cycle started");

        match self.source.fetch(&query).await {
            Ok(snapshot) => {
                if let Err(e) = self.apply_snapshot(&snapshot) {
                    warn!(%cycle, error = %e, "chart redraw failed");
                    return;
                }
                info!(
                    %cycle,
                    days_plotted = snapshot.orders_per_day.len(),
                    statuses = snapshot.order_status.len(),
                    materials = snapshot.filament_usage.len(),
                    printers = snapshot.printer_utilization.len(),
                    "charts updated"
                );
            }
            Err(e) => {
                warn!(%cycle, error = %e, "fetch cycle failed, charts keep previous state");
            }
        }
    }

    /// Fire-and-forget trigger for the view layer's control events.
    pub fn spawn_cycle(self: Arc<Self>) {
        tokio::spawn(async move { self.run_cycle().await });
    }

    /// Projects the snapshot's fields into the charts' label/data arrays, in
    /// source order, then redraws each chart. No client-side sorting,
    /// filtering, or aggregation; the backend already aggregated.
    fn apply_snapshot(&self, snapshot: &StatsSnapshot) -> anyhow::Result<()> {
        self.orders.update(
            snapshot
                .orders_per_day
                .iter()
                .map(|d| d.date.clone())
                .collect(),
            snapshot
                .orders_per_day
                .iter()
                .map(|d| d.count as f64)
                .collect(),
        )?;
        self.status.update(
            snapshot
                .order_status
                .iter()
                .map(|s| s.status.clone())
                .collect(),
            snapshot
                .order_status
                .iter()
                .map(|s| s.count as f64)
                .collect(),
        )?;
        self.filament.update(
            snapshot
                .filament_usage
                .iter()
                .map(|f| f.material.clone())
                .collect(),
            snapshot.filament_usage.iter().map(|f| f.grams).collect(),
        )?;
        self.printer.update(
            snapshot
                .printer_utilization
                .iter()
                .map(|p| p.printer.clone())
                .collect(),
            snapshot
                .printer_utilization
                .iter()
                .map(|p| p.jobs as f64)
                .collect(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchError;
    use crate::stats::{DailyOrders, FilamentUsage, PrinterUtilization, StatusCount};
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    /// Answers fetches from a fixed script of responses.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<StatsSnapshot, FetchError>>>,
        seen: Mutex<Vec<StatsQuery>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<StatsSnapshot, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl StatsSource for ScriptedSource {
        async fn fetch(&self, query: &StatsQuery) -> Result<StatsSnapshot, FetchError> {
            self.seen.lock().unwrap().push(query.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted fetch")
        }
    }

    /// Each fetch blocks on its gate, so a test decides resolution order.
    struct GatedSource {
        gates: Mutex<VecDeque<(oneshot::Receiver<()>, StatsSnapshot)>>,
    }

    #[async_trait::async_trait]
    impl StatsSource for GatedSource {
        async fn fetch(&self, _query: &StatsQuery) -> Result<StatsSnapshot, FetchError> {
            let (gate, snapshot) = self
                .gates
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted fetch");
            gate.await.expect("gate dropped");
            Ok(snapshot)
        }
    }

    fn decode_error() -> FetchError {
        serde_json::from_str::<StatsSnapshot>("not json")
            .unwrap_err()
            .into()
    }

    fn single_entry_snapshot() -> StatsSnapshot {
        StatsSnapshot {
            orders_per_day: vec![DailyOrders {
                date: "2024-01-01".into(),
                count: 3,
            }],
            order_status: vec![StatusCount {
                status: "done".into(),
                count: 5,
            }],
            filament_usage: vec![FilamentUsage {
                material: "PLA".into(),
                grams: 120.5,
            }],
            printer_utilization: vec![PrinterUtilization {
                printer: "P1".into(),
                jobs: 2,
            }],
        }
    }

    fn week_snapshot() -> StatsSnapshot {
        StatsSnapshot {
            orders_per_day: vec![
                DailyOrders {
                    date: "2024-02-01".into(),
                    count: 0,
                },
                DailyOrders {
                    date: "2024-02-02".into(),
                    count: 4,
                },
                DailyOrders {
                    date: "2024-02-03".into(),
                    count: 1,
                },
            ],
            order_status: vec![
                StatusCount {
                    status: "pending".into(),
                    count: 2,
                },
                StatusCount {
                    status: "printing".into(),
                    count: 3,
                },
            ],
            filament_usage: vec![FilamentUsage {
                material: "PETG".into(),
                grams: 80.0,
            }],
            printer_utilization: vec![
                PrinterUtilization {
                    printer: "P1".into(),
                    jobs: 4,
                },
                PrinterUtilization {
                    printer: "P2".into(),
                    jobs: 1,
                },
            ],
        }
    }

    fn published(board: &ChartBoard, id: &str) -> crate::charts::ChartModel {
        board
            .charts()
            .into_iter()
            .find(|c| c.id == id)
            .expect("chart never drawn")
    }

    fn controller_with(
        source: Arc<dyn StatsSource>,
        board: &ChartBoard,
    ) -> DashboardController {
        DashboardController::new(
            source,
            Filters::new(30, PrinterFilter::All),
            ChartSurfaces::publishing(board),
        )
        .unwrap()
    }

    #[test]
    fn applies_single_entry_snapshot_to_all_four_charts() {
        let source = ScriptedSource::new(vec![Ok(single_entry_snapshot())]);
        let board = ChartBoard::default();
        let controller = controller_with(source, &board);

        tokio_test::block_on(controller.run_cycle());

        let orders = published(&board, charts::ORDERS_CHART);
        assert_eq!(orders.labels, vec!["2024-01-01"]);
        assert_eq!(orders.data, vec![3.0]);

        let status = published(&board, charts::STATUS_CHART);
        assert_eq!(status.labels, vec!["done"]);
        assert_eq!(status.data, vec![5.0]);

        let filament = published(&board, charts::FILAMENT_CHART);
        assert_eq!(filament.labels, vec!["PLA"]);
        assert_eq!(filament.data, vec![120.5]);

        let printer = published(&board, charts::PRINTER_CHART);
        assert_eq!(printer.labels, vec!["P1"]);
        assert_eq!(printer.data, vec![2.0]);
    }

    #[test]
    fn chart_arrays_correspond_positionally() {
        let source = ScriptedSource::new(vec![Ok(week_snapshot())]);
        let board = ChartBoard::default();
        let controller = controller_with(source, &board);

        tokio_test::block_on(controller.run_cycle());

        let orders = published(&board, charts::ORDERS_CHART);
        assert_eq!(orders.labels.len(), 3);
        assert_eq!(orders.data.len(), 3);
        assert_eq!(orders.labels[1], "2024-02-02");
        assert_eq!(orders.data[1], 4.0);
        assert_eq!(orders.labels[2], "2024-02-03");
        assert_eq!(orders.data[2], 1.0);
    }

    #[test]
    fn second_snapshot_fully_replaces_first() {
        let source =
            ScriptedSource::new(vec![Ok(week_snapshot()), Ok(single_entry_snapshot())]);
        let board = ChartBoard::default();
        let controller = controller_with(source, &board);

        tokio_test::block_on(controller.run_cycle());
        tokio_test::block_on(controller.run_cycle());

        let orders = published(&board, charts::ORDERS_CHART);
        assert_eq!(orders.labels, vec!["2024-01-01"]);
        assert_eq!(orders.data, vec![3.0]);

        let status = published(&board, charts::STATUS_CHART);
        assert_eq!(status.labels, vec!["done"]);
    }

    #[test]
    fn failed_cycle_leaves_charts_untouched() {
        let source = ScriptedSource::new(vec![
            Ok(single_entry_snapshot()),
            Err(decode_error()),
        ]);
        let board = ChartBoard::default();
        let controller = controller_with(source, &board);

        tokio_test::block_on(controller.run_cycle());
        let before = board.charts();

        tokio_test::block_on(controller.run_cycle());
        let after = board.charts();

        assert_eq!(before, after);
    }

    #[test]
    fn cycle_reads_filter_values_at_start() {
        let source = ScriptedSource::new(vec![Ok(single_entry_snapshot())]);
        let board = ChartBoard::default();
        let controller = controller_with(source.clone(), &board);

        controller.filters().set_days(7);
        tokio_test::block_on(controller.run_cycle());

        let seen = source.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].to_query_string(), "days=7&printer_id=all");
    }

    #[tokio::test]
    async fn overlapping_cycles_end_on_last_resolved_response() {
        let (release_first, first_gate) = oneshot::channel();
        let (release_second, second_gate) = oneshot::channel();
        let source = Arc::new(GatedSource {
            gates: Mutex::new(VecDeque::from([
                (first_gate, week_snapshot()),
                (second_gate, single_entry_snapshot()),
            ])),
        });
        let board = ChartBoard::default();
        let controller = Arc::new(controller_with(source, &board));

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.run_cycle().await })
        };
        tokio::task::yield_now().await;
        let second = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.run_cycle().await })
        };
        tokio::task::yield_now().await;

        // The second trigger resolves first; the first trigger resolves last
        // and therefore wins.
        release_second.send(()).unwrap();
        second.await.unwrap();
        release_first.send(()).unwrap();
        first.await.unwrap();

        let orders = published(&board, charts::ORDERS_CHART);
        assert_eq!(orders.labels.len(), 3);
        assert_eq!(orders.labels[0], "2024-02-01");
    }
}
