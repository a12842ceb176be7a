//! # demand-forecast
//!
//! Command-line front end for the demand forecasting pipeline.

use clap::{Parser, Subcommand};
use demand_forecast::models::additive::AdditiveModel;
use demand_forecast::{
    AppConfig, ForecastError, Horizon, OptionsLoad, Outcome, Pipeline, Report, SelectionInput,
    Session, Severity, Upload,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type CliResult<T> = std::result::Result<T, ForecastError>;

#[derive(Parser)]
#[command(name = "demand-forecast")]
#[command(about = "Forecast monthly demand per class and route", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the classes and ports available in a file
    Options {
        /// Semicolon-delimited input file
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Forecast demand for one class and route
    Forecast {
        /// Semicolon-delimited input file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reservation class (default: first available)
        #[arg(long)]
        class: Option<String>,

        /// Arrival port (default: first available)
        #[arg(long)]
        arr_port: Option<String>,

        /// Departure port (default: first available)
        #[arg(long)]
        dep_port: Option<String>,

        /// Months to forecast, 1 to 24
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=24))]
        horizon: Option<u32>,

        /// Directory to save the chart into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Skip rendering the chart image
        #[arg(long)]
        no_chart: bool,

        /// Also write the forecast table to this CSV file
        #[arg(long)]
        table_csv: Option<PathBuf>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };

    init_tracing(&config, cli.verbose);

    // Show the whole forecast table rather than a truncated preview
    if std::env::var_os("POLARS_FMT_MAX_ROWS").is_none() {
        std::env::set_var("POLARS_FMT_MAX_ROWS", Horizon::MAX.to_string());
    }

    let result = match cli.command {
        Commands::Options { input } => run_options(&config, input.as_deref()),
        Commands::Forecast {
            input,
            class,
            arr_port,
            dep_port,
            horizon,
            output_dir,
            no_chart,
            table_csv,
            json,
        } => {
            let selection = SelectionInput {
                rez_class: class,
                arr_port,
                dep_port,
            };
            let args = ForecastArgs {
                input,
                selection,
                horizon,
                output_dir,
                no_chart,
                table_csv,
                json,
            };
            run_forecast(&config, args)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &AppConfig, verbose: u8) {
    let default_level = match verbose {
        0 => config.log_level.as_str(),
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn pipeline(config: &AppConfig) -> Pipeline<AdditiveModel> {
    Pipeline::new(AdditiveModel::new(), config.future_dates)
}

fn read_upload(input: Option<&Path>) -> CliResult<Option<Upload>> {
    input.map(Upload::from_path).transpose()
}

/// Print a notice and map its severity to an exit code
fn report_notice(severity: Severity, message: &str) -> ExitCode {
    eprintln!("{}: {}", severity, message);
    match severity {
        Severity::Error => ExitCode::FAILURE,
        Severity::Info | Severity::Warning => ExitCode::SUCCESS,
    }
}

fn run_options(config: &AppConfig, input: Option<&Path>) -> CliResult<ExitCode> {
    let Some(upload) = read_upload(input)? else {
        return Ok(report_notice(
            Severity::Info,
            demand_forecast::pipeline::UPLOAD_PROMPT,
        ));
    };

    match pipeline(config).options(&upload)? {
        OptionsLoad::Ready(options) => {
            let mut out = io::stdout().lock();
            writeln!(out, "Rez Class: {}", options.rez_classes.join(", "))?;
            writeln!(out, "Seg Arr Port: {}", options.arr_ports.join(", "))?;
            writeln!(out, "Seg Dep Port: {}", options.dep_ports.join(", "))?;
            Ok(ExitCode::SUCCESS)
        }
        OptionsLoad::Halted(notice) => Ok(report_notice(notice.severity, &notice.message)),
    }
}

struct ForecastArgs {
    input: Option<PathBuf>,
    selection: SelectionInput,
    horizon: Option<u32>,
    output_dir: Option<PathBuf>,
    no_chart: bool,
    table_csv: Option<PathBuf>,
    json: bool,
}

fn run_forecast(config: &AppConfig, args: ForecastArgs) -> CliResult<ExitCode> {
    let horizon = match args.horizon {
        Some(months) => Horizon::new(months)?,
        None => config.horizon()?,
    };
    let session = Session {
        upload: read_upload(args.input.as_deref())?,
        selection: args.selection,
        horizon,
    };
    debug!(horizon = horizon.months(), "running pipeline");

    let report = match pipeline(config).run(&session)? {
        Outcome::Rendered(report) => report,
        Outcome::AwaitingUpload(notice) | Outcome::Halted(notice) => {
            return Ok(report_notice(notice.severity, &notice.message));
        }
    };

    if !args.no_chart {
        let dir = args.output_dir.as_deref().unwrap_or(&config.output_dir);
        let path = report.save_chart(dir, config.chart_size())?;
        eprintln!("Chart saved to {}", path.display());
    }

    if let Some(path) = &args.table_csv {
        report.table.write_csv(File::create(path)?)?;
    }

    if args.json {
        print_json(&report)?;
    } else {
        print_text(&report)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn print_text(report: &Report) -> CliResult<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", report.title)?;
    writeln!(out)?;
    writeln!(out, "Future forecasts:")?;
    writeln!(out, "{}", report.table.to_dataframe()?)?;
    Ok(())
}

fn print_json(report: &Report) -> CliResult<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}
