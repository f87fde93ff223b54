//! Move Me - work/break reminder
//!
//! This is the main entry point for the move-me application.

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use move_me::{
    api::create_router,
    config::{Cli, Command, Settings},
    services::{CommandOverlay, DesktopNotifier, HeadlessOverlay, OverlaySurface},
    state::{AppState, StateStore, Stats, TimerEngine},
    tasks::{status_report_task, timer_driver_task, TICK_PERIOD},
    utils::{shutdown_signal, SystemClock},
};

const STATUS_REPORT_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("move_me={},tower_http=info", cli.log_level()))
        .init();

    match cli.command.clone().unwrap_or(Command::Run) {
        Command::Run => run(&cli).await,
        Command::Status => show_status(&cli),
        Command::Config { show, reset } => manage_config(&cli, show, reset),
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<(Settings, std::path::PathBuf)> {
    let config_path = cli.config_path()?;
    let mut settings = Settings::load(&config_path)?;
    cli.apply_to(&mut settings);
    Ok((settings, config_path))
}

fn build_overlay(settings: &Settings) -> anyhow::Result<Box<dyn OverlaySurface>> {
    if !settings.auto_lock_enabled {
        info!("DRY RUN MODE: break overlay disabled");
        return Ok(Box::new(HeadlessOverlay::new()));
    }
    match &settings.overlay_command {
        Some(argv) => Ok(Box::new(CommandOverlay::new(argv)?)),
        None => {
            warn!("No overlay_command configured, breaks will only be notified");
            Ok(Box::new(HeadlessOverlay::new()))
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    info!("Starting move-me v{}", env!("CARGO_PKG_VERSION"));

    let (settings, config_path) = load_settings(cli)?;
    let timer_settings = settings.timer_settings()?;
    info!(
        "Configuration: work={}min, break={}min, warning={}s, overrides={}/day",
        settings.work_duration_minutes,
        settings.break_duration_minutes,
        settings.warning_time_seconds,
        settings.daily_override_limit
    );

    let state_path = settings.state_file_path(&config_path);
    let (store, issue) = StateStore::open(&state_path);
    if let Some(e) = issue {
        warn!("{}; starting from default state", e);
    }

    let engine = TimerEngine::new(
        timer_settings,
        store,
        Box::new(DesktopNotifier::new(settings.notification_sound)),
        build_overlay(&settings)?,
    );

    // Create application state and start the first work period
    let state = Arc::new(AppState::new(
        engine,
        Arc::new(SystemClock),
        cli.port,
        cli.host.clone(),
    ));
    state.start()?;

    // Start the background tasks
    let driver_state = Arc::clone(&state);
    tokio::spawn(async move {
        timer_driver_task(driver_state, TICK_PERIOD).await;
    });
    let report_state = Arc::clone(&state);
    tokio::spawn(async move {
        status_report_task(report_state, STATUS_REPORT_PERIOD).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    let addr = cli.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Status API on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /override - End the current break early");
    info!("  POST /pause    - Pause the work timer");
    info!("  POST /resume   - Resume the work timer");
    info!("  POST /break    - Start a break now");
    info!("  POST /start    - Start the timer");
    info!("  POST /stop     - Stop the timer");
    info!("  GET  /status   - Current phase and time remaining");
    info!("  GET  /stats    - Break and override statistics");
    info!("  GET  /health   - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = state.shutdown() {
        error!("Failed to save state on shutdown: {}", e);
    }

    info!("move-me stopped");
    Ok(())
}

fn show_status(cli: &Cli) -> anyhow::Result<()> {
    let (settings, config_path) = load_settings(cli)?;
    let state_path = settings.state_file_path(&config_path);

    if !state_path.exists() {
        println!("No state file found. Run the application first.");
        return Ok(());
    }

    let (store, issue) = StateStore::open(&state_path);
    if let Some(e) = issue {
        warn!("{}", e);
    }
    let stats = Stats::from(store.state());
    let remaining = store
        .state()
        .remaining_on(chrono::Local::now().date_naive(), settings.daily_override_limit);

    println!("Move Me Status:");
    println!("  Config file: {}", config_path.display());
    println!("  State file: {}", state_path.display());
    println!("  Work duration: {} minutes", settings.work_duration_minutes);
    println!("  Break duration: {} minutes", settings.break_duration_minutes);
    println!("  Overrides remaining today: {}", remaining);
    println!("  Breaks completed: {}", stats.total_breaks_completed);
    println!("  Overrides used (total): {}", stats.total_overrides_used);
    if let Some(at) = stats.last_break_at {
        println!("  Last break: {}", at);
    }
    Ok(())
}

fn manage_config(cli: &Cli, show: bool, reset: bool) -> anyhow::Result<()> {
    let config_path = cli.config_path()?;

    if reset {
        Settings::default().save(&config_path)?;
        println!("Configuration reset to defaults at {}", config_path.display());
        return Ok(());
    }

    if show {
        let settings = Settings::load(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    println!("Use --show to display configuration or --reset to reset to defaults");
    Ok(())
}
