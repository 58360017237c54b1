use serde::{Deserialize, Serialize};

use super::health::{BmiCategory, Severity, WaistAssessment};

/// A chart data set or the placeholder shown instead of it.
///
/// The core produces these; the frontend only renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChartView<T> {
    Ready { data: T },
    /// No records yet
    Empty { message: String },
    /// Loading failed
    Error { message: String },
}

impl<T> ChartView<T> {
    pub fn empty(message: impl Into<String>) -> Self {
        ChartView::Empty {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChartView::Error {
            message: message.into(),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ChartView::Ready { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ChartView::Error { .. })
    }
}

/// One slice of the expense-by-category doughnut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub label: String,
    pub value: f64,
    /// Share of the total, one decimal
    pub percentage: f64,
    pub color: String,
}

/// One bar of the monthly expense chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBar {
    /// `YYYY-MM`
    pub month: String,
    /// Display label (`YYYY/MM`)
    pub label: String,
    pub total: f64,
}

/// Current month / today totals shown above the expense charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub month_total: f64,
    pub day_total: f64,
    pub month_total_display: String,
    pub day_total_display: String,
}

/// A point on a line series. `y` is `None` for gaps (e.g. missing waist).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// `YYYY-MM-DD HH:MM`
    pub x: String,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub color: String,
    /// Unit appended to tooltip values (e.g. "kg", "mmHg")
    pub unit: String,
    pub points: Vec<SeriesPoint>,
}

/// A horizontal guide line (e.g. normal blood pressure limit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub series: Vec<LineSeries>,
    #[serde(default)]
    pub reference_lines: Vec<ReferenceLine>,
}

/// BMI/waist panel shown next to the weight chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub waist: Option<f64>,
    pub waist_assessment: Option<WaistAssessment>,
    /// Worst severity among the shown classifications
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDashboard {
    pub summary: Option<ExpenseSummary>,
    pub categories: ChartView<Vec<CategorySlice>>,
    pub monthly: ChartView<Vec<MonthlyBar>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightDashboard {
    pub chart: ChartView<LineChart>,
    /// Hidden when there is no record or no height setting
    pub health: Option<HealthInfo>,
}

/// Everything one tab displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tab", rename_all = "snake_case")]
pub enum TabView {
    Expense(ExpenseDashboard),
    Weight(WeightDashboard),
    BloodPressure { chart: ChartView<LineChart> },
}
