//! radimgr - radiko authorization and program schedule CLI.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};
use radimgr_api::radiko::{
    LocalRadikoApi, Program, RadikoClient, StationSchedule, broadcast_date,
    find_program_by_start_time, parse_jst_datetime,
};

/// User-Agent sent when the config does not override it.
const DEFAULT_USER_AGENT: &str = concat!("radimgr/", env!("CARGO_PKG_VERSION"));

/// Display format of program start/end times (JST).
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run the radiko authorization handshake.
    Auth,
    /// Detect the broadcast area of the current IP address.
    Area,
    /// List every station's programs of one broadcast date.
    Stations(StationsArgs),
    /// List the programs currently on air.
    Now(NowArgs),
    /// Show the weekly schedule of one station.
    Weekly(WeeklyArgs),
    /// Find the program starting exactly at a given time.
    Prog(ProgArgs),
    /// Manage the config file.
    Config(ConfigCommand),
}

/// Arguments for the `stations` subcommand.
#[derive(clap::Args)]
struct StationsArgs {
    /// Area ID (e.g. "JP13"). Falls back to the configured area if omitted.
    #[arg(long)]
    area: Option<String>,

    /// Broadcast date (default: today's broadcast date).
    /// Formats: "2024-01-01", "20240101".
    #[arg(long)]
    date: Option<String>,
}

/// Arguments for the `now` subcommand.
#[derive(clap::Args)]
struct NowArgs {
    /// Area ID (e.g. "JP13"). Falls back to the configured area if omitted.
    #[arg(long)]
    area: Option<String>,
}

/// Arguments for the `weekly` subcommand.
#[derive(clap::Args)]
struct WeeklyArgs {
    /// Station ID (e.g. "LFR").
    #[arg(long, required = true)]
    station: String,
}

/// Arguments for the `prog` subcommand.
#[derive(clap::Args)]
struct ProgArgs {
    /// Station ID (e.g. "LFR").
    #[arg(long, required = true)]
    station: String,

    /// Program start time in JST.
    /// Formats: "2024-01-01T01:00:00", "2024-01-01 01:00:00", "20240101010000".
    #[arg(long, required = true)]
    start: String,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Save the default area ID.
    SetArea(SetAreaArgs),
    /// Print the current settings.
    Show,
}

/// Arguments for the `config set-area` subcommand.
#[derive(clap::Args)]
struct SetAreaArgs {
    /// Area ID (e.g. "JP13").
    area_id: String,
}

/// Loads the config file selected by `--dir`.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved or the file is invalid.
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Builds the radiko client from config.
///
/// # Errors
///
/// Returns an error if the client fails to build.
#[instrument(skip_all)]
fn build_client(config: &AppConfig) -> Result<RadikoClient> {
    let user_agent = config
        .radiko
        .user_agent
        .as_deref()
        .unwrap_or(DEFAULT_USER_AGENT);

    let mut builder = RadikoClient::builder().user_agent(user_agent);
    if let Some(area_id) = &config.radiko.area_id {
        builder = builder.area_id(area_id.as_str());
    }
    builder.build().context("failed to build radiko client")
}

/// Resolves the area ID from CLI args or config fallback.
///
/// # Errors
///
/// Returns an error if neither names an area.
fn resolve_area(area: Option<&str>, config: &AppConfig) -> Result<String> {
    area.or(config.radiko.area_id.as_deref())
        .filter(|a| !a.is_empty())
        .map(str::to_owned)
        .context("area id is required: pass --area or run `radimgr config set-area <ID>`")
}

/// Parses a `--date` value, defaulting to the current broadcast date.
///
/// # Errors
///
/// Returns an error if the value matches no supported format.
fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    let Some(s) = date else {
        return Ok(broadcast_date(&Utc::now()));
    };
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .with_context(|| format!("invalid date format: {s}"))
}

/// Logs a station header line.
fn log_station(station: &StationSchedule) {
    tracing::info!("{}\t{}", station.station_id, station.station_name);
}

/// Logs one program line.
fn log_program(program: &Program) {
    tracing::info!(
        "{}\t{}\t{}\t{}\t{}",
        program.start.format(TIME_FORMAT),
        program.end.format(TIME_FORMAT),
        program.station_id,
        program.title,
        program.performers.as_deref().unwrap_or("-"),
    );
}

/// Runs the `auth` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the handshake fails.
#[instrument(skip_all)]
async fn run_auth(dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_client(&config)?;

    let token = client
        .authorize_token()
        .await
        .context("radiko authorization failed")?;
    tracing::info!("Token: {token}");

    Ok(())
}

/// Runs the `area` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the area is unknown.
#[instrument(skip_all)]
async fn run_area(dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_client(&config)?;

    let area = client
        .detect_area()
        .await
        .context("failed to detect area")?;
    tracing::info!("{}\t{}", area.id, area.name);

    Ok(())
}

/// Runs the `stations` subcommand.
///
/// # Errors
///
/// Returns an error if no area is known, the date is invalid, or the
/// handshake or API request fails.
#[instrument(skip_all)]
async fn run_stations(args: &StationsArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let area = resolve_area(args.area.as_deref(), &config)?;
    let date = resolve_date(args.date.as_deref())?;
    let client = build_client(&config)?;

    client
        .authorize_token()
        .await
        .context("radiko authorization failed")?;

    let stations = client
        .programs_by_date(date, Some(area.as_str()))
        .await
        .context("failed to fetch programs")?;

    tracing::info!("Area: {area}, date: {date}");
    for station in &stations {
        log_station(station);
        for program in station.programs() {
            log_program(program);
        }
    }
    tracing::info!("Total: {} stations", stations.len());

    Ok(())
}

/// Runs the `now` subcommand.
///
/// # Errors
///
/// Returns an error if no area is known or the API request fails.
#[instrument(skip_all)]
async fn run_now(args: &NowArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let area = resolve_area(args.area.as_deref(), &config)?;
    let client = build_client(&config)?;

    let stations = client
        .now_programs(Some(area.as_str()))
        .await
        .context("failed to fetch programs")?;

    for station in &stations {
        for program in station.programs() {
            log_program(program);
        }
    }
    tracing::info!("Total: {} stations", stations.len());

    Ok(())
}

/// Runs the `weekly` subcommand.
///
/// # Errors
///
/// Returns an error if the station ID is empty or the API request fails.
#[instrument(skip_all)]
async fn run_weekly(args: &WeeklyArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_client(&config)?;

    let weekly = client
        .weekly_programs(&args.station)
        .await
        .context("failed to fetch weekly programs")?;

    log_station(&weekly);
    for day in &weekly.days {
        tracing::info!("[{}]", day.date);
        for program in &day.programs {
            log_program(program);
        }
    }
    tracing::info!("Total: {} programs", weekly.programs().count());

    Ok(())
}

/// Runs the `prog` subcommand.
///
/// # Errors
///
/// Returns an error if the start time is invalid, the station ID is empty,
/// no program starts at that time, or the API request fails.
#[instrument(skip_all)]
async fn run_prog(args: &ProgArgs, dir: Option<&PathBuf>) -> Result<()> {
    let start = parse_jst_datetime(&args.start)?;
    let config = load_config(dir)?;
    let client = build_client(&config)?;

    match find_program_by_start_time(&client, &args.station, start).await {
        Ok(program) => {
            log_program(&program);
            if let Some(url) = &program.url {
                tracing::info!("URL: {url}");
            }
            if let Some(desc) = &program.desc {
                tracing::info!("{desc}");
            }
            Ok(())
        }
        Err(e) if e.is_program_not_found() => bail!(
            "program not found: station={} start={}",
            args.station,
            start.format(TIME_FORMAT)
        ),
        Err(e) => Err(anyhow::Error::new(e).context("failed to find program")),
    }
}

/// Runs the `config set-area` subcommand.
///
/// # Errors
///
/// Returns an error if the area ID is malformed or the config cannot be saved.
#[instrument(skip_all)]
fn run_config_set_area(args: &SetAreaArgs, dir: Option<&PathBuf>) -> Result<()> {
    if !args.area_id.starts_with("JP") {
        bail!("invalid area id: {} (expected e.g. JP13)", args.area_id);
    }

    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let mut config = AppConfig::load(&config_path).context("failed to load config")?;
    config.radiko.area_id = Some(args.area_id.clone());
    config.save(&config_path).context("failed to save config")?;

    tracing::info!(
        "Saved area_id = {} to {}",
        args.area_id,
        config_path.display()
    );
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded.
#[instrument(skip_all)]
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;

    tracing::info!("Config: {}", config_path.display());
    tracing::info!(
        "area_id = {}",
        config.radiko.area_id.as_deref().unwrap_or("(unset)")
    );
    tracing::info!(
        "user_agent = {}",
        config
            .radiko
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT)
    );
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Auth => run_auth(dir).await,
        Commands::Area => run_area(dir).await,
        Commands::Stations(args) => run_stations(&args, dir).await,
        Commands::Now(args) => run_now(&args, dir).await,
        Commands::Weekly(args) => run_weekly(&args, dir).await,
        Commands::Prog(args) => run_prog(&args, dir).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::SetArea(args) => run_config_set_area(&args, dir),
            ConfigSubcommands::Show => run_config_show(dir),
        },
    }
}
