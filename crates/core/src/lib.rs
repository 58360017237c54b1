pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use api::client::ApiClient;
use api::transport::Transport;
use config::AppConfig;
use errors::CoreError;
use models::chart::TabView;
use models::health::{HealthReport, HealthSnapshot};
use models::record::RecordKind;
use models::settings::UserSettings;
use services::{
    chart_service::ChartService,
    form_service::{FormFields, FormService},
    health_service::HealthCalculator,
    tab_service::{Tab, TabService},
};
use storage::{manager::StorageManager, store::KeyValueStore};
use utils::Debouncer;

/// Snapshot of the tracker's runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerStatus {
    pub initialized: bool,
    pub current_tab: Tab,
    pub cache_size: usize,
    pub version: String,
}

/// Main entry point for the Daily Tracker core library.
/// Wires the API client, local storage and the tab/form/chart services together.
#[must_use]
pub struct DailyTracker {
    config: AppConfig,
    api: ApiClient,
    storage: StorageManager,
    tabs: TabService,
    forms: FormService,
    charts: ChartService,
    health: HealthCalculator,
    /// Pending draft saves, one debouncer per form.
    drafts: HashMap<RecordKind, Debouncer>,
    initialized: bool,
}

impl std::fmt::Debug for DailyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyTracker")
            .field("api", &self.api)
            .field("current_tab", &self.tabs.current_tab())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl DailyTracker {
    /// Build a tracker talking HTTP to the configured backend.
    pub fn new(config: AppConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, CoreError> {
        config.validate()?;
        let storage = StorageManager::new(store);
        let api = ApiClient::new(&config, storage.clone());
        Ok(Self::build(config, api, storage))
    }

    /// Build a tracker on top of a custom transport.
    pub fn with_transport(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let storage = StorageManager::new(store);
        let api = ApiClient::with_transport(&config, transport, storage.clone());
        Ok(Self::build(config, api, storage))
    }

    fn build(config: AppConfig, api: ApiClient, storage: StorageManager) -> Self {
        Self {
            tabs: TabService::new(storage.clone()),
            forms: FormService::new(
                config.validation.clone(),
                storage.clone(),
                config.features.auto_save,
            ),
            charts: ChartService::new(&config),
            health: HealthCalculator::new(config.health.clone()),
            drafts: RecordKind::ALL
                .into_iter()
                .map(|kind| (kind, Debouncer::new(config.ui.validation_delay())))
                .collect(),
            initialized: false,
            config,
            api,
            storage,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut ApiClient {
        &mut self.api
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn tabs(&self) -> &TabService {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabService {
        &mut self.tabs
    }

    pub fn forms(&self) -> &FormService {
        &self.forms
    }

    pub fn charts(&self) -> &ChartService {
        &self.charts
    }

    pub fn health(&self) -> &HealthCalculator {
        &self.health
    }

    pub fn current_tab(&self) -> Tab {
        self.tabs.current_tab()
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Restore the saved tab and load its data.
    pub async fn init(&mut self) -> TabView {
        self.tabs.load_saved_tab();
        let view = self.load_tab_view(self.tabs.current_tab()).await;
        self.initialized = true;
        info!(tab = %self.tabs.current_tab(), "tracker initialized");
        view
    }

    pub fn status(&self) -> TrackerStatus {
        TrackerStatus {
            initialized: self.initialized,
            current_tab: self.tabs.current_tab(),
            cache_size: self.api.cache_len(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Drop cached responses and pending drafts.
    pub fn cleanup(&mut self) {
        self.drafts.values().for_each(Debouncer::cancel);
        self.api.cache_clear_all();
        self.initialized = false;
        debug!("tracker cleaned up");
    }

    // ── Forms ───────────────────────────────────────────────────────

    /// Validate and save a form, then reload the tab it belongs to.
    ///
    /// A form that fails validation never reaches the backend.
    pub async fn submit(
        &mut self,
        kind: RecordKind,
        fields: &FormFields,
    ) -> Result<TabView, CoreError> {
        self.submit_on(kind, fields, Local::now().date_naive()).await
    }

    /// [`submit`](Self::submit) with an explicit date anchoring validation.
    pub async fn submit_on(
        &mut self,
        kind: RecordKind,
        fields: &FormFields,
        today: NaiveDate,
    ) -> Result<TabView, CoreError> {
        let record = self.forms.build_record(kind, fields, today)?;
        self.api.save_record(&record).await?;
        info!(kind = %kind, "record saved");

        if let Some(drafts) = self.drafts.get(&kind) {
            drafts.cancel();
        }
        self.forms.clear_draft(kind);

        let tab = Tab::for_record(kind);
        self.invalidate(tab);
        if self.config.features.notifications && !self.tabs.is_active(tab) {
            let count = self.tabs.badge_count(tab) + 1;
            self.tabs.set_badge(tab, count);
        }
        Ok(self.load_tab_view(tab).await)
    }

    /// Save a draft of `fields` once input pauses for the validation delay.
    pub fn queue_draft(&self, kind: RecordKind, fields: FormFields) {
        if !self.forms.auto_save_enabled() {
            return;
        }
        let Some(drafts) = self.drafts.get(&kind) else {
            return;
        };
        let forms = self.forms.clone();
        drafts.call(move || {
            forms.save_draft(kind, &fields);
        });
    }

    pub fn load_draft(&self, kind: RecordKind) -> Option<FormFields> {
        self.forms.load_draft(kind)
    }

    // ── Tabs ────────────────────────────────────────────────────────

    /// Activate `tab` with fresh data. `None` if nothing changed.
    pub async fn switch_tab(&mut self, tab: Tab) -> Option<TabView> {
        self.tabs.switch_tab(tab)?;
        self.tabs.clear_badge(tab);
        self.invalidate(tab);
        Some(self.load_tab_view(tab).await)
    }

    /// Ctrl/Cmd + digit.
    pub async fn handle_shortcut(&mut self, key: char) -> Option<TabView> {
        let tab = Tab::from_shortcut(key)?;
        self.switch_tab(tab).await
    }

    /// Drop every cached response and reload the active tab.
    pub async fn refresh_current_tab(&self) -> TabView {
        self.api.cache_clear_all();
        self.load_tab_view(self.tabs.current_tab()).await
    }

    /// Build the view of `tab`. Load failures become error placeholders.
    pub async fn load_tab_view(&self, tab: Tab) -> TabView {
        match tab {
            Tab::Expense => match self.api.get_expense_stats().await {
                Ok(stats) => TabView::Expense(
                    self.charts
                        .expense_dashboard(&stats, Local::now().date_naive()),
                ),
                Err(e) => {
                    warn!(error = %e, "failed to load expense statistics");
                    TabView::Expense(self.charts.expense_error())
                }
            },
            Tab::Weight => {
                let (records, settings) =
                    tokio::join!(self.api.get_weight_data(), self.api.get_settings());
                match records {
                    Ok(records) => {
                        let settings = settings.unwrap_or_else(|e| {
                            warn!(error = %e, "failed to load settings");
                            UserSettings::default()
                        });
                        TabView::Weight(self.charts.weight_dashboard(&records, &settings))
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to load weight data");
                        TabView::Weight(self.charts.weight_error())
                    }
                }
            }
            Tab::BloodPressure => match self.api.get_blood_pressure_data().await {
                Ok(records) => TabView::BloodPressure {
                    chart: self.charts.blood_pressure_chart(&records),
                },
                Err(e) => {
                    warn!(error = %e, "failed to load blood pressure data");
                    TabView::BloodPressure {
                        chart: self.charts.blood_pressure_error(),
                    }
                }
            },
        }
    }

    fn invalidate(&self, tab: Tab) {
        for key in tab.cache_keys() {
            self.api.cache_clear(key);
        }
    }

    // ── Health ──────────────────────────────────────────────────────

    /// Classify the latest readings and collect advice.
    ///
    /// Weight data and settings are required; blood pressure is optional.
    pub async fn health_report(&self) -> Result<HealthReport, CoreError> {
        let (weights, settings, pressure) = tokio::join!(
            self.api.get_weight_data(),
            self.api.get_settings(),
            self.api.get_blood_pressure_data(),
        );
        let mut weights = weights?;
        let settings = settings?;
        let mut pressure = pressure.unwrap_or_else(|e| {
            warn!(error = %e, "blood pressure data unavailable");
            Vec::new()
        });
        weights.sort_by_key(|r| (r.date, r.time));
        pressure.sort_by_key(|r| (r.date, r.time));

        let latest_weight = weights.last();
        let latest_pressure = pressure.last();
        let snapshot = HealthSnapshot {
            bmi: match (latest_weight, settings.height) {
                (Some(w), Some(h)) => self.health.calculate_bmi(w.weight, h),
                _ => None,
            },
            waist: latest_weight.and_then(|w| w.waist),
            gender: settings.gender,
            systolic: latest_pressure.map(|p| p.systolic),
            diastolic: latest_pressure.map(|p| p.diastolic),
        };

        Ok(HealthReport {
            bmi_category: snapshot.bmi.and_then(|b| self.health.bmi_category(b)),
            waist: match (snapshot.waist, snapshot.gender) {
                (Some(waist), Some(gender)) => self.health.waist_category(waist, gender),
                _ => None,
            },
            blood_pressure: match (snapshot.systolic, snapshot.diastolic) {
                (Some(s), Some(d)) => self.health.blood_pressure_category(s, d),
                _ => None,
            },
            ideal_weight: settings
                .height
                .and_then(|h| self.health.ideal_weight_range(h)),
            trend: self.health.analyze_weight_trend(&weights),
            advice: self.health.health_advice(&snapshot),
            snapshot,
        })
    }

    // ── Export ──────────────────────────────────────────────────────

    /// All backend data as one JSON document.
    pub async fn export_data(&self) -> Result<Value, CoreError> {
        if !self.config.features.data_export {
            return Err(CoreError::Config("data export is disabled".to_string()));
        }
        let expense = self.api.get_expense_stats().await?;
        let weight = self.api.get_weight_data().await?;
        let blood_pressure = self.api.get_blood_pressure_data().await?;
        let settings = self.api.get_settings().await?;

        Ok(json!({
            "exportedAt": Local::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "expenseStats": expense,
            "weight": weight,
            "bloodPressure": blood_pressure,
            "settings": settings,
        }))
    }
}
