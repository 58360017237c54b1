use chrono::NaiveDate;

use crate::config::{AppConfig, ChartColors};
use crate::models::chart::{
    CategorySlice, ChartView, ExpenseDashboard, ExpenseSummary, HealthInfo, LineChart,
    LineSeries, MonthlyBar, ReferenceLine, SeriesPoint, WeightDashboard,
};
use crate::models::health::Severity;
use crate::models::record::{BloodPressureRecord, WeightRecord};
use crate::models::settings::UserSettings;
use crate::models::stats::ExpenseStats;
use crate::services::health_service::HealthCalculator;
use crate::utils::{format_currency, format_timestamp};

/// Builds chart-ready data sets from backend data.
///
/// The core computes all the numbers, the frontend only renders. Every
/// builder returns an empty-state placeholder instead of an empty chart.
#[derive(Debug, Clone)]
pub struct ChartService {
    colors: ChartColors,
    max_data_points: usize,
    health: HealthCalculator,
}

impl ChartService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            colors: config.chart_colors.clone(),
            max_data_points: config.ui.max_data_points,
            health: HealthCalculator::new(config.health.clone()),
        }
    }

    // ── Expenses ────────────────────────────────────────────────────

    /// Totals for the month of `today` and for `today` itself.
    pub fn expense_summary(&self, stats: &ExpenseStats, today: NaiveDate) -> ExpenseSummary {
        let month_total = stats.month_total(today);
        let day_total = stats.day_total(today);
        ExpenseSummary {
            month_total,
            day_total,
            month_total_display: format_currency(month_total),
            day_total_display: format_currency(day_total),
        }
    }

    /// Doughnut slices per category, colours cycling through the palette.
    pub fn category_chart(&self, stats: &ExpenseStats) -> ChartView<Vec<CategorySlice>> {
        if stats.categories.is_empty() {
            return ChartView::empty("No expense records yet");
        }
        let total: f64 = stats.categories.values().sum();

        let slices = stats
            .categories
            .iter()
            .enumerate()
            .map(|(i, (label, value))| CategorySlice {
                label: label.clone(),
                value: *value,
                percentage: if total > 0.0 {
                    (value / total * 1000.0).round() / 10.0
                } else {
                    0.0
                },
                color: self.palette_color(i),
            })
            .collect();
        ChartView::Ready { data: slices }
    }

    /// One bar per month, oldest first.
    pub fn monthly_chart(&self, stats: &ExpenseStats) -> ChartView<Vec<MonthlyBar>> {
        if stats.monthly.is_empty() {
            return ChartView::empty("No monthly data yet");
        }
        // BTreeMap iteration is already sorted by `YYYY-MM`.
        let bars = stats
            .monthly
            .iter()
            .map(|(month, total)| MonthlyBar {
                month: month.clone(),
                label: month.replacen('-', "/", 1),
                total: *total,
            })
            .collect();
        ChartView::Ready { data: bars }
    }

    pub fn expense_dashboard(&self, stats: &ExpenseStats, today: NaiveDate) -> ExpenseDashboard {
        ExpenseDashboard {
            summary: Some(self.expense_summary(stats, today)),
            categories: self.category_chart(stats),
            monthly: self.monthly_chart(stats),
        }
    }

    /// Placeholder dashboard shown when expense data cannot be loaded.
    pub fn expense_error(&self) -> ExpenseDashboard {
        ExpenseDashboard {
            summary: None,
            categories: ChartView::error("Failed to load expense statistics"),
            monthly: ChartView::error("Failed to load monthly statistics"),
        }
    }

    // ── Weight ──────────────────────────────────────────────────────

    /// Weight line over the most recent records, plus a waist line when any
    /// record carries a waist measurement.
    pub fn weight_chart(&self, records: &[WeightRecord]) -> ChartView<LineChart> {
        if records.is_empty() {
            return ChartView::empty("No weight records yet");
        }
        let mut sorted: Vec<&WeightRecord> = records.iter().collect();
        sorted.sort_by_key(|r| (r.date, r.time));
        let recent = self.tail(&sorted);

        let mut series = vec![LineSeries {
            name: "Weight (kg)".into(),
            color: self.colors.weight.clone(),
            unit: "kg".into(),
            points: recent
                .iter()
                .map(|r| SeriesPoint {
                    x: format_timestamp(r.date, r.time),
                    y: Some(r.weight),
                })
                .collect(),
        }];

        if recent.iter().any(|r| r.waist.is_some()) {
            series.push(LineSeries {
                name: "Waist (cm)".into(),
                color: self.colors.waist.clone(),
                unit: "cm".into(),
                points: recent
                    .iter()
                    .map(|r| SeriesPoint {
                        x: format_timestamp(r.date, r.time),
                        y: r.waist,
                    })
                    .collect(),
            });
        }

        ChartView::Ready {
            data: LineChart {
                series,
                reference_lines: Vec::new(),
            },
        }
    }

    /// BMI and waist panel for the latest weight record.
    ///
    /// `None` (panel hidden) without records or without a height setting.
    pub fn health_info(
        &self,
        records: &[WeightRecord],
        settings: &UserSettings,
    ) -> Option<HealthInfo> {
        let latest = records.iter().max_by_key(|r| (r.date, r.time))?;
        let height = settings.height?;

        let bmi = self.health.calculate_bmi(latest.weight, height);
        let bmi_category = bmi.and_then(|b| self.health.bmi_category(b));
        let waist_assessment = match (latest.waist, settings.gender) {
            (Some(waist), Some(gender)) => self.health.waist_category(waist, gender),
            _ => None,
        };

        let severity = bmi_category
            .map(|c| c.severity())
            .into_iter()
            .chain(waist_assessment.as_ref().map(|w| w.category.severity()))
            .max()
            .unwrap_or(Severity::Info);

        Some(HealthInfo {
            bmi,
            bmi_category,
            waist: latest.waist,
            waist_assessment,
            severity,
        })
    }

    pub fn weight_dashboard(
        &self,
        records: &[WeightRecord],
        settings: &UserSettings,
    ) -> WeightDashboard {
        WeightDashboard {
            chart: self.weight_chart(records),
            health: self.health_info(records, settings),
        }
    }

    pub fn weight_error(&self) -> WeightDashboard {
        WeightDashboard {
            chart: ChartView::error("Failed to load weight data"),
            health: None,
        }
    }

    // ── Blood pressure ──────────────────────────────────────────────

    /// Systolic/diastolic lines split into morning (before noon) and evening
    /// readings, with guide lines at the normal limits.
    pub fn blood_pressure_chart(&self, records: &[BloodPressureRecord]) -> ChartView<LineChart> {
        if records.is_empty() {
            return ChartView::empty("No blood pressure records yet");
        }
        let mut sorted: Vec<&BloodPressureRecord> = records.iter().collect();
        sorted.sort_by_key(|r| (r.date, r.time));
        let recent = self.tail(&sorted);

        let (morning, evening): (Vec<&BloodPressureRecord>, Vec<&BloodPressureRecord>) =
            recent.iter().partition(|r| r.is_morning());

        let colors = &self.colors.blood_pressure;
        let series = vec![
            pressure_series("Systolic (morning)", &colors.morning_systolic, &morning, |r| {
                r.systolic
            }),
            pressure_series("Diastolic (morning)", &colors.morning_diastolic, &morning, |r| {
                r.diastolic
            }),
            pressure_series("Systolic (evening)", &colors.evening_systolic, &evening, |r| {
                r.systolic
            }),
            pressure_series("Diastolic (evening)", &colors.evening_diastolic, &evening, |r| {
                r.diastolic
            }),
        ];

        let normal = &self.health.standards().blood_pressure.normal;
        let reference_lines = vec![
            ReferenceLine {
                value: normal.systolic as f64,
                label: format!("Systolic normal limit ({})", normal.systolic),
            },
            ReferenceLine {
                value: normal.diastolic as f64,
                label: format!("Diastolic normal limit ({})", normal.diastolic),
            },
        ];

        ChartView::Ready {
            data: LineChart {
                series,
                reference_lines,
            },
        }
    }

    pub fn blood_pressure_error(&self) -> ChartView<LineChart> {
        ChartView::error("Failed to load blood pressure data")
    }

    // ── Internal ────────────────────────────────────────────────────

    fn palette_color(&self, index: usize) -> String {
        if self.colors.expense.is_empty() {
            return "#999999".to_string();
        }
        self.colors.expense[index % self.colors.expense.len()].clone()
    }

    fn tail<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = items.len().saturating_sub(self.max_data_points);
        &items[start..]
    }
}

fn pressure_series(
    name: &str,
    color: &str,
    records: &[&BloodPressureRecord],
    value: impl Fn(&BloodPressureRecord) -> u32,
) -> LineSeries {
    LineSeries {
        name: name.to_string(),
        color: color.to_string(),
        unit: "mmHg".to_string(),
        points: records
            .iter()
            .map(|r| SeriesPoint {
                x: format_timestamp(r.date, r.time),
                y: Some(value(r) as f64),
            })
            .collect(),
    }
}
