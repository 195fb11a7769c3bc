use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Surface ids the dashboard page binds its canvases to.
pub const ORDERS_CHART: &str = "ordersChart";
pub const STATUS_CHART: &str = "statusChart";
pub const FILAMENT_CHART: &str = "filamentChart";
pub const PRINTER_CHART: &str = "printerChart";

/// How a chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Pie,
    Doughnut,
    HorizontalBar,
}

/// State of one chart: a surface id and kind fixed at construction, plus the
/// label/data arrays that are wholly replaced on each applied snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartModel {
    pub id: &'static str,
    pub kind: ChartKind,
    pub dataset_label: Option<&'static str>,
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub colors: Vec<&'static str>,
}

impl ChartModel {
    pub fn new(
        id: &'static str,
        kind: ChartKind,
        dataset_label: Option<&'static str>,
        colors: Vec<&'static str>,
    ) -> Self {
        Self {
            id,
            kind,
            dataset_label,
            labels: Vec::new(),
            data: Vec::new(),
            colors,
        }
    }

    /// Full in-place replacement of the label/data arrays. No merging.
    pub fn replace(&mut self, labels: Vec<String>, data: Vec<f64>) {
        self.labels = labels;
        self.data = data;
    }
}

/// Daily order volume, vertical bars.
pub fn orders_chart() -> ChartModel {
    ChartModel::new(ORDERS_CHART, ChartKind::Bar, Some("Orders"), vec!["#0d6efd"])
}

/// Order status distribution.
pub fn status_chart() -> ChartModel {
    ChartModel::new(
        STATUS_CHART,
        ChartKind::Pie,
        None,
        vec!["#ffc107", "#198754", "#0dcaf0", "#6c757d"],
    )
}

/// Filament grams by material.
pub fn filament_chart() -> ChartModel {
    ChartModel::new(
        FILAMENT_CHART,
        ChartKind::Doughnut,
        None,
        vec!["#fd7e14", "#20c997", "#6610f2"],
    )
}

/// Jobs per printer, horizontal bars.
pub fn printer_chart() -> ChartModel {
    ChartModel::new(
        PRINTER_CHART,
        ChartKind::HorizontalBar,
        Some("Jobs Assigned"),
        vec!["#6f42c1"],
    )
}

/// Where a chart's current state gets painted. Production surfaces publish
/// to the view layer; tests substitute recording fakes so the controller can
/// run without any UI runtime.
pub trait ChartSurface: Send + Sync {
    fn draw(&self, chart: &ChartModel) -> anyhow::Result<()>;
}

/// A chart model bound to its rendering surface.
///
/// Mutation goes through [`ChartHandle::update`], which swaps the arrays and
/// redraws inside one lock scope, so overlapping fetch cycles interleave at
/// whole-chart granularity. Redrawing with unchanged data is idempotent.
pub struct ChartHandle {
    model: Mutex<ChartModel>,
    surface: Box<dyn ChartSurface>,
}

impl ChartHandle {
    pub fn new(model: ChartModel, surface: Box<dyn ChartSurface>) -> Self {
        Self {
            model: Mutex::new(model),
            surface,
        }
    }

    pub fn update(&self, labels: Vec<String>, data: Vec<f64>) -> anyhow::Result<()> {
        let mut model = self.model.lock().unwrap();
        model.replace(labels, data);
        self.surface.draw(&model)
    }

    pub fn redraw(&self) -> anyhow::Result<()> {
        let model = self.model.lock().unwrap();
        self.surface.draw(&model)
    }
}

/// Production surface target: the latest drawn state of every chart, served
/// to the dashboard page by the view layer.
#[derive(Clone, Default)]
pub struct ChartBoard {
    inner: Arc<Mutex<BTreeMap<&'static str, ChartModel>>>,
}

impl ChartBoard {
    /// A surface that publishes draws onto this board.
    pub fn surface(&self) -> Box<dyn ChartSurface> {
        Box::new(BoardSurface {
            board: self.clone(),
        })
    }

    /// Latest published state of every chart, in the fixed dashboard order.
    pub fn charts(&self) -> Vec<ChartModel> {
        let board = self.inner.lock().unwrap();
        [ORDERS_CHART, STATUS_CHART, FILAMENT_CHART, PRINTER_CHART]
            .iter()
            .filter_map(|id| board.get(id).cloned())
            .collect()
    }
}

struct BoardSurface {
    board: ChartBoard,
}

impl ChartSurface for BoardSurface {
    fn draw(&self, chart: &ChartModel) -> anyhow::Result<()> {
        self.board
            .inner
            .lock()
            .unwrap()
            .insert(chart.id, chart.clone());
        Ok(())
    }
}
