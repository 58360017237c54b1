// ═══════════════════════════════════════════════════════════════════
// Integration Tests: DailyTracker facade over a scripted backend
// ═══════════════════════════════════════════════════════════════════

mod common;

use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use common::{param, test_config, MockTransport, Reply};
use daily_tracker_core::config::AppConfig;
use daily_tracker_core::errors::CoreError;
use daily_tracker_core::models::chart::{ChartView, TabView};
use daily_tracker_core::models::health::{BloodPressureCategory, BmiCategory, TrendDirection};
use daily_tracker_core::models::record::RecordKind;
use daily_tracker_core::services::form_service::FormFields;
use daily_tracker_core::services::tab_service::Tab;
use daily_tracker_core::storage::manager::{draft_key, ACTIVE_TAB_KEY};
use daily_tracker_core::storage::store::{KeyValueStore, MemoryStore};
use daily_tracker_core::DailyTracker;

fn tracker_with(config: AppConfig) -> (DailyTracker, Arc<MockTransport>, Arc<MemoryStore>) {
    let transport = MockTransport::new();
    let store = Arc::new(MemoryStore::new());
    let tracker = DailyTracker::with_transport(config, transport.clone(), store.clone()).unwrap();
    (tracker, transport, store)
}

fn tracker() -> (DailyTracker, Arc<MockTransport>, Arc<MemoryStore>) {
    tracker_with(test_config())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn expense_stats() -> Value {
    json!({
        "success": true,
        "categories": {"Food": 120.0, "Rent": 800.0},
        "monthly": {"2024-05": 700.0, "2024-06": 920.0}
    })
}

fn weight_data() -> Value {
    json!({"success": true, "data": [
        {"date": "2024-06-01", "time": "07:00", "weight": 80.0, "waist": 92},
        {"date": "2024-06-08", "time": "07:00", "weight": 78.5, "waist": 91},
        {"date": "2024-06-15", "time": "07:00", "weight": 76.0, "waist": 89}
    ]})
}

fn settings() -> Value {
    json!({"success": true, "height": 175, "gender": "M"})
}

fn pressure_data() -> Value {
    json!([
        {"date": "2024-06-14", "time": "08:00", "systolic": 118, "diastolic": 76},
        {"date": "2024-06-15", "time": "21:00", "systolic": 132, "diastolic": 85}
    ])
}

fn expense_form(date: NaiveDate) -> FormFields {
    [
        ("date", date.format("%Y-%m-%d").to_string()),
        ("category", "Food".to_string()),
        ("amount", "12.50".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

// ── Construction ────────────────────────────────────────────────────

#[test]
fn rejects_config_without_endpoint() {
    let result = DailyTracker::with_transport(
        AppConfig::default(),
        MockTransport::new(),
        Arc::new(MemoryStore::new()),
    );
    assert!(matches!(result, Err(CoreError::Config(_))));
}

#[tokio::test]
async fn init_loads_default_tab() {
    let (mut tracker, transport, _) = tracker();
    transport.reply_ok("expenseStats", expense_stats());

    assert!(!tracker.status().initialized);
    let view = tracker.init().await;

    match view {
        TabView::Expense(dashboard) => {
            assert_eq!(dashboard.categories.data().unwrap().len(), 2);
            assert_eq!(dashboard.monthly.data().unwrap().len(), 2);
        }
        other => panic!("unexpected view {other:?}"),
    }
    let status = tracker.status();
    assert!(status.initialized);
    assert_eq!(status.current_tab, Tab::Expense);
    assert_eq!(status.cache_size, 1);
    assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn init_restores_saved_tab() {
    let (mut tracker, transport, store) = tracker();
    store.set(ACTIVE_TAB_KEY, json!("bpTab")).unwrap();
    transport.reply_ok("bloodPressure", pressure_data());

    let view = tracker.init().await;
    assert_eq!(tracker.current_tab(), Tab::BloodPressure);
    let TabView::BloodPressure { chart } = view else {
        panic!("expected blood pressure view");
    };
    assert_eq!(chart.data().unwrap().series.len(), 4);
    assert_eq!(transport.count("expenseStats"), 0);
}

#[tokio::test]
async fn load_failure_becomes_error_view() {
    let (mut tracker, transport, _) = tracker();
    transport.reply("expenseStats", Reply::Network("down".into()));

    let TabView::Expense(dashboard) = tracker.init().await else {
        panic!("expected expense view");
    };
    assert!(dashboard.categories.is_error());
    assert!(dashboard.monthly.is_error());
    assert!(tracker.status().initialized);
}

// ── Tabs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn switching_tab_loads_weight_dashboard() {
    let (mut tracker, transport, store) = tracker();
    transport
        .reply_ok("weight", weight_data())
        .reply_ok("settings", settings());

    let view = tracker.switch_tab(Tab::Weight).await.unwrap();
    let TabView::Weight(dashboard) = view else {
        panic!("expected weight view");
    };
    assert_eq!(dashboard.chart.data().unwrap().series.len(), 2);
    let health = dashboard.health.unwrap();
    assert_eq!(health.bmi, Some(24.8));
    assert_eq!(health.bmi_category, Some(BmiCategory::Overweight));

    assert_eq!(store.get(ACTIVE_TAB_KEY).unwrap(), Some(json!("weightTab")));
    assert!(tracker.switch_tab(Tab::Weight).await.is_none());
}

#[tokio::test]
async fn weight_view_without_settings_hides_health_panel() {
    let (mut tracker, transport, _) = tracker();
    transport
        .reply_ok("weight", weight_data())
        .reply("settings", Reply::Api("no settings sheet".into()));

    let TabView::Weight(dashboard) = tracker.switch_tab(Tab::Weight).await.unwrap() else {
        panic!("expected weight view");
    };
    assert!(dashboard.chart.data().is_some());
    assert!(dashboard.health.is_none());
}

#[tokio::test]
async fn reentering_tab_refetches_its_data() {
    let (mut tracker, transport, _) = tracker();
    transport
        .reply_ok("expenseStats", expense_stats())
        .reply_ok("bloodPressure", pressure_data());

    tracker.init().await;
    tracker.switch_tab(Tab::BloodPressure).await.unwrap();
    tracker.switch_tab(Tab::Expense).await.unwrap();
    assert_eq!(transport.count("expenseStats"), 2);
}

#[tokio::test]
async fn shortcut_switches_tab() {
    let (mut tracker, transport, _) = tracker();
    transport.reply_ok("bloodPressure", pressure_data());
    assert!(tracker.handle_shortcut('3').await.is_some());
    assert_eq!(tracker.current_tab(), Tab::BloodPressure);
    assert!(tracker.handle_shortcut('x').await.is_none());
}

#[tokio::test]
async fn refresh_bypasses_cache() {
    let (mut tracker, transport, _) = tracker();
    transport.reply_ok("expenseStats", expense_stats());

    tracker.init().await;
    tracker.load_tab_view(Tab::Expense).await;
    assert_eq!(transport.count("expenseStats"), 1);

    tracker.refresh_current_tab().await;
    assert_eq!(transport.count("expenseStats"), 2);
}

// ── Submit ──────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_saves_and_reloads_tab() {
    let (mut tracker, transport, _) = tracker();
    transport
        .reply_ok("expenseStats", expense_stats())
        .reply_ok("save", json!({"success": true, "message": "saved"}));

    tracker.init().await;
    let view = tracker
        .submit(RecordKind::Expense, &expense_form(today()))
        .await
        .unwrap();
    assert!(matches!(view, TabView::Expense(_)));

    let saves: Vec<_> = transport
        .calls()
        .into_iter()
        .filter(|q| param(q, "sheet").is_some())
        .collect();
    assert_eq!(saves.len(), 1);
    assert_eq!(param(&saves[0], "sheet"), Some("expense"));
    assert_eq!(param(&saves[0], "amount"), Some("12.5"));
    assert_eq!(param(&saves[0], "apiKey"), Some(common::TEST_KEY));

    // The tab's cache entry was dropped, so stats were fetched again.
    assert_eq!(transport.count("expenseStats"), 2);
}

#[tokio::test]
async fn invalid_form_never_reaches_backend() {
    let (mut tracker, transport, _) = tracker();
    let mut form = expense_form(today());
    form.insert("amount".into(), "lots".into());

    let err = tracker.submit(RecordKind::Expense, &form).await.unwrap_err();
    assert_eq!(err.field_errors()[0].field, "amount");
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn submit_on_anchors_date_window() {
    let (mut tracker, transport, _) = tracker();
    transport
        .reply_ok("save", json!({"success": true}))
        .reply_ok("expenseStats", expense_stats());
    let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    assert!(tracker
        .submit_on(RecordKind::Expense, &expense_form(day), day)
        .await
        .is_ok());
    let tomorrow = day.succ_opt().unwrap();
    assert!(tracker
        .submit_on(RecordKind::Expense, &expense_form(tomorrow), day)
        .await
        .is_err());
}

#[tokio::test]
async fn rejected_save_keeps_draft() {
    let mut config = test_config();
    config.features.auto_save = true;
    let (mut tracker, transport, store) = tracker_with(config);
    transport.reply_ok(
        "save",
        json!({"success": false, "error": "Invalid API key", "code": "INVALID_API_KEY"}),
    );

    let form = expense_form(today());
    assert!(tracker.forms().save_draft(RecordKind::Expense, &form));

    let err = tracker.submit(RecordKind::Expense, &form).await.unwrap_err();
    assert!(matches!(err, CoreError::Permission(_)));
    assert!(store.get(&draft_key("expenseForm")).unwrap().is_some());
}

#[tokio::test]
async fn successful_save_clears_draft() {
    let mut config = test_config();
    config.features.auto_save = true;
    let (mut tracker, transport, store) = tracker_with(config);
    transport
        .reply_ok("save", json!({"success": true}))
        .reply_ok("expenseStats", expense_stats());

    let form = expense_form(today());
    tracker.forms().save_draft(RecordKind::Expense, &form);
    tracker.submit(RecordKind::Expense, &form).await.unwrap();
    assert!(store.get(&draft_key("expenseForm")).unwrap().is_none());
}

#[tokio::test]
async fn notifications_badge_inactive_tab() {
    let mut config = test_config();
    config.features.notifications = true;
    let (mut tracker, transport, _) = tracker_with(config);
    transport
        .reply_ok("save", json!({"success": true}))
        .reply_ok("weight", weight_data())
        .reply_ok("settings", settings());

    let form: FormFields = [
        ("date", today().format("%Y-%m-%d").to_string()),
        ("time", "07:30".to_string()),
        ("weight", "75.5".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    tracker.submit(RecordKind::Weight, &form).await.unwrap();
    assert_eq!(tracker.tabs().badge_text(Tab::Weight).as_deref(), Some("1"));

    tracker.switch_tab(Tab::Weight).await.unwrap();
    assert_eq!(tracker.tabs().badge_text(Tab::Weight), None);
}

// ── Drafts ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn queued_drafts_are_debounced() {
    let mut config = test_config();
    config.features.auto_save = true;
    let (tracker, _, store) = tracker_with(config);

    let mut first = FormFields::new();
    first.insert("category".into(), "Fo".into());
    let mut second = FormFields::new();
    second.insert("category".into(), "Food".into());

    tracker.queue_draft(RecordKind::Expense, first);
    tokio::time::sleep(Duration::from_millis(100)).await;
    tracker.queue_draft(RecordKind::Expense, second);
    assert!(store.get(&draft_key("expenseForm")).unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(
        store.get(&draft_key("expenseForm")).unwrap(),
        Some(json!({"category": "Food"}))
    );
    assert_eq!(
        tracker.load_draft(RecordKind::Expense).unwrap()["category"],
        "Food"
    );
}

#[tokio::test(start_paused = true)]
async fn each_form_keeps_its_own_pending_draft() {
    let mut config = test_config();
    config.features.auto_save = true;
    let (tracker, _, _) = tracker_with(config);

    let mut expense = FormFields::new();
    expense.insert("category".into(), "Food".into());
    let mut weight = FormFields::new();
    weight.insert("weight".into(), "70".into());

    tracker.queue_draft(RecordKind::Expense, expense);
    tokio::time::sleep(Duration::from_millis(100)).await;
    tracker.queue_draft(RecordKind::Weight, weight);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        tracker.load_draft(RecordKind::Expense).unwrap()["category"],
        "Food"
    );
    assert_eq!(tracker.load_draft(RecordKind::Weight).unwrap()["weight"], "70");
}

#[tokio::test(start_paused = true)]
async fn submit_leaves_other_forms_pending_drafts_alone() {
    let mut config = test_config();
    config.features.auto_save = true;
    let (mut tracker, transport, _) = tracker_with(config);
    transport
        .reply_ok("save", json!({"success": true}))
        .reply_ok("expenseStats", expense_stats());

    let mut weight = FormFields::new();
    weight.insert("weight".into(), "70".into());
    tracker.queue_draft(RecordKind::Weight, weight);

    tracker
        .submit(RecordKind::Expense, &expense_form(today()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(tracker.load_draft(RecordKind::Weight).unwrap()["weight"], "70");
    assert!(tracker.load_draft(RecordKind::Expense).is_none());
}

#[tokio::test(start_paused = true)]
async fn cleanup_cancels_every_pending_draft() {
    let mut config = test_config();
    config.features.auto_save = true;
    let (mut tracker, _, store) = tracker_with(config);

    for kind in RecordKind::ALL {
        let mut fields = FormFields::new();
        fields.insert("date".into(), "2024-06-01".into());
        tracker.queue_draft(kind, fields);
    }
    tracker.cleanup();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(store.keys().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn queued_drafts_ignored_without_autosave() {
    let (tracker, _, store) = tracker();
    tracker.queue_draft(RecordKind::Expense, FormFields::new());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(store.keys().unwrap().is_empty());
}

// ── Health report ───────────────────────────────────────────────────

#[tokio::test]
async fn health_report_combines_latest_readings() {
    let (tracker, transport, _) = tracker();
    transport
        .reply_ok("weight", weight_data())
        .reply_ok("settings", settings())
        .reply_ok("bloodPressure", pressure_data());

    let report = tracker.health_report().await.unwrap();
    assert_eq!(report.snapshot.bmi, Some(24.8));
    assert_eq!(report.snapshot.systolic, Some(132));
    assert_eq!(report.blood_pressure, Some(BloodPressureCategory::Elevated));
    assert_eq!(report.ideal_weight.unwrap().max, 73.5);
    assert_eq!(report.trend.unwrap().direction, TrendDirection::Down);
    assert!(report.advice.len() >= 2);
}

#[tokio::test]
async fn health_report_tolerates_missing_pressure() {
    let (tracker, transport, _) = tracker();
    transport
        .reply_ok("weight", weight_data())
        .reply_ok("settings", settings())
        .reply("bloodPressure", Reply::Api("no sheet".into()));

    let report = tracker.health_report().await.unwrap();
    assert!(report.blood_pressure.is_none());
    assert!(report.bmi_category.is_some());
}

#[tokio::test]
async fn health_report_requires_weight_data() {
    let (tracker, transport, _) = tracker();
    transport
        .reply("weight", Reply::Network("down".into()))
        .reply_ok("settings", settings())
        .reply_ok("bloodPressure", pressure_data());
    assert!(tracker.health_report().await.is_err());
}

// ── Export / cleanup ────────────────────────────────────────────────

#[tokio::test]
async fn export_collects_everything() {
    let (tracker, transport, _) = tracker();
    transport
        .reply_ok("expenseStats", expense_stats())
        .reply_ok("weight", weight_data())
        .reply_ok("bloodPressure", pressure_data())
        .reply_ok("settings", settings());

    let export = tracker.export_data().await.unwrap();
    assert_eq!(export["weight"].as_array().unwrap().len(), 3);
    assert_eq!(export["bloodPressure"][1]["time"], "21:00");
    assert_eq!(export["settings"]["gender"], "M");
    assert_eq!(export["expenseStats"]["categories"]["Rent"], 800.0);
}

#[tokio::test]
async fn export_can_be_disabled() {
    let mut config = test_config();
    config.features.data_export = false;
    let (tracker, transport, _) = tracker_with(config);
    assert!(matches!(tracker.export_data().await, Err(CoreError::Config(_))));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn cleanup_resets_state() {
    let (mut tracker, transport, _) = tracker();
    transport.reply_ok("expenseStats", expense_stats());
    tracker.init().await;
    assert_eq!(tracker.api().cache_len(), 1);

    tracker.cleanup();
    let status = tracker.status();
    assert!(!status.initialized);
    assert_eq!(status.cache_size, 0);
}

#[tokio::test]
async fn views_serialize_with_tags() {
    let (mut tracker, transport, _) = tracker();
    transport.reply_ok("bloodPressure", json!([]));
    let view = tracker.switch_tab(Tab::BloodPressure).await.unwrap();
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["tab"], "blood_pressure");
    assert_eq!(value["chart"]["state"], "empty");
    assert!(matches!(
        view,
        TabView::BloodPressure {
            chart: ChartView::Empty { .. }
        }
    ));
}
