use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueHint};
use daily_tracker_core::{
    config::AppConfig,
    models::{health::ActivityLevel, record::RecordKind, settings::Gender},
    services::{form_service::FormFields, health_service::HealthCalculator, tab_service::Tab},
    storage::store::FileStore,
    utils::default_date_time,
    DailyTracker,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Log expenses, weight and blood pressure", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "DAILY_TRACKER_CONFIG", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Local state file (active tab, drafts, offline backups)
    #[arg(
        long,
        env = "DAILY_TRACKER_DATA",
        default_value = "daily-tracker-data.json",
        value_hint = ValueHint::FilePath
    )]
    data: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a new record
    #[command(subcommand)]
    Add(AddCommand),
    /// Print a tab's dashboard as JSON (defaults to the active tab)
    Show { tab: Option<Tab> },
    /// Make a tab active and print its dashboard
    Tab { tab: Tab },
    /// Classify the latest readings and print advice
    Health,
    /// Offline health calculations
    #[command(subcommand)]
    Calc(CalcCommand),
    /// Dump all backend data as JSON
    Export,
    /// Print tracker status
    Status,
    /// Refresh the active tab periodically until Ctrl-C
    Watch,
}

#[derive(Subcommand, Debug)]
enum AddCommand {
    Expense {
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        note: Option<String>,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    Weight {
        #[arg(long)]
        weight: String,
        #[arg(long)]
        waist: Option<String>,
        #[arg(long)]
        date: Option<String>,
        /// HH:MM, defaults to now
        #[arg(long)]
        time: Option<String>,
    },
    #[command(alias = "blood-pressure")]
    Bp {
        #[arg(long)]
        systolic: String,
        #[arg(long)]
        diastolic: String,
        #[arg(long)]
        pulse: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CalcCommand {
    Bmi {
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        height: f64,
    },
    Waist {
        #[arg(long)]
        waist: f64,
        #[arg(long)]
        gender: Gender,
    },
    Bp {
        #[arg(long)]
        systolic: u32,
        #[arg(long)]
        diastolic: u32,
    },
    IdealWeight {
        #[arg(long)]
        height: f64,
    },
    Bmr {
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        height: f64,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        gender: Gender,
        #[arg(long, default_value = "sedentary")]
        activity: ActivityLevel,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = AppConfig::read(cli.config.as_deref()).context("loading configuration")?;
    let data = cli.data;

    match cli.command {
        // Calculations never reach the backend, so they work without an API URL.
        Command::Calc(calc) => handle_calc(&HealthCalculator::new(config.health), &calc),
        Command::Add(add) => handle_add(&mut open_tracker(config, &data)?, add).await,
        Command::Show { tab } => {
            let mut tracker = open_tracker(config, &data)?;
            tracker.tabs_mut().load_saved_tab();
            let tab = tab.unwrap_or_else(|| tracker.current_tab());
            print_json(&tracker.load_tab_view(tab).await)
        }
        Command::Tab { tab } => {
            let mut tracker = open_tracker(config, &data)?;
            tracker.tabs_mut().load_saved_tab();
            match tracker.switch_tab(tab).await {
                Some(view) => print_json(&view),
                None => {
                    info!(%tab, "tab already active");
                    print_json(&tracker.load_tab_view(tab).await)
                }
            }
        }
        Command::Health => print_json(&open_tracker(config, &data)?.health_report().await?),
        Command::Export => print_json(&open_tracker(config, &data)?.export_data().await?),
        Command::Status => {
            let mut tracker = open_tracker(config, &data)?;
            tracker.tabs_mut().load_saved_tab();
            print_json(&tracker.status())
        }
        Command::Watch => watch(&mut open_tracker(config, &data)?).await,
    }
}

fn open_tracker(config: AppConfig, data: &Path) -> Result<DailyTracker> {
    let store = Arc::new(FileStore::new(data));
    DailyTracker::new(config, store).context("building tracker")
}

async fn handle_add(tracker: &mut DailyTracker, add: AddCommand) -> Result<()> {
    let (today, now) = default_date_time(Local::now().naive_local());
    let mut fields = FormFields::new();
    let mut put = |name: &str, value: Option<String>| {
        if let Some(v) = value {
            fields.insert(name.to_string(), v);
        }
    };

    let kind = match add {
        AddCommand::Expense {
            category,
            amount,
            note,
            date,
        } => {
            put("date", Some(date.unwrap_or(today)));
            put("category", Some(category));
            put("amount", Some(amount));
            put("note", note);
            RecordKind::Expense
        }
        AddCommand::Weight {
            weight,
            waist,
            date,
            time,
        } => {
            put("date", Some(date.unwrap_or(today)));
            put("time", Some(time.unwrap_or(now)));
            put("weight", Some(weight));
            put("waist", waist);
            RecordKind::Weight
        }
        AddCommand::Bp {
            systolic,
            diastolic,
            pulse,
            date,
            time,
        } => {
            put("date", Some(date.unwrap_or(today)));
            put("time", Some(time.unwrap_or(now)));
            put("systolic", Some(systolic));
            put("diastolic", Some(diastolic));
            put("pulse", pulse);
            RecordKind::BloodPressure
        }
    };

    tracker.tabs_mut().load_saved_tab();
    match tracker.submit(kind, &fields).await {
        Ok(view) => print_json(&view),
        Err(e) => {
            for field in e.field_errors() {
                warn!(field = %field.field, "{}", field.message);
            }
            Err(e.into())
        }
    }
}

fn handle_calc(health: &HealthCalculator, calc: &CalcCommand) -> Result<()> {
    match *calc {
        CalcCommand::Bmi { weight, height } => {
            let Some(bmi) = health.calculate_bmi(weight, height) else {
                bail!("weight and height must be positive");
            };
            print_json(&serde_json::json!({
                "bmi": bmi,
                "category": health.bmi_category(bmi),
            }))
        }
        CalcCommand::Waist { waist, gender } => match health.waist_category(waist, gender) {
            Some(assessment) => print_json(&assessment),
            None => bail!("waist must be positive"),
        },
        CalcCommand::Bp {
            systolic,
            diastolic,
        } => match health.blood_pressure_category(systolic, diastolic) {
            Some(category) => print_json(&category),
            None => bail!("readings must be positive"),
        },
        CalcCommand::IdealWeight { height } => match health.ideal_weight_range(height) {
            Some(range) => print_json(&range),
            None => bail!("height must be positive"),
        },
        CalcCommand::Bmr {
            weight,
            height,
            age,
            gender,
            activity,
        } => {
            let Some(bmr) = health.calculate_bmr(weight, height, age, gender) else {
                bail!("weight, height and age must be positive");
            };
            print_json(&serde_json::json!({
                "bmr": bmr,
                "tdee": health.calculate_tdee(bmr, activity),
            }))
        }
    }
}

async fn watch(tracker: &mut DailyTracker) -> Result<()> {
    let Some(period) = tracker.config().ui.data_refresh_interval() else {
        bail!("data refresh is disabled (ui.data_refresh_interval_ms = 0)");
    };

    print_json(&tracker.init().await)?;
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately; init already loaded the view.
    ticker.tick().await;

    info!(interval_ms = period.as_millis() as u64, "watching, Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = tracker.api().cache_cleanup();
                if removed > 0 {
                    info!(removed, "expired cache entries dropped");
                }
                print_json(&tracker.refresh_current_tab().await)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping");
                break;
            }
        }
    }
    tracker.cleanup();
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
