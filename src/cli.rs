//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::domain::backtest::{validate_window, BacktestResult};
use crate::domain::config_validation::{validate_backtest_config, validate_data_config};
use crate::domain::error::TradelogicError;
use crate::domain::lesson::Lesson;
use crate::domain::metrics::{format_percent, Metrics};
use crate::domain::runner::{
    parse_ticker, run_for_request, BacktestRequest, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW,
    DEFAULT_TICKER,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceSource;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_SOURCE: &str = "csv";
pub const DEFAULT_CSV_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(
    name = "tradelogic",
    about = "Moving-average crossover backtester for a single stock"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where prices come from; flags win over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// csv, sqlite or yahoo
    #[arg(long)]
    pub source: Option<String>,
    /// Directory of <TICKER>.csv files for the csv source
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RequestOverrides {
    #[arg(long)]
    pub ticker: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub short_window: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    pub long_window: Option<i64>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// YYYY-MM-DD, inclusive
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        overrides: RequestOverrides,
        /// Write an HTML report here
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a lesson, or all of them
    Lesson { topic: Option<String> },
    /// List tickers available in a local source
    ListTickers {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show the stored date range for a ticker
    Info {
        #[arg(long)]
        ticker: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Load a CSV file into the SQLite source
    Import {
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        csv: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Start the web dashboard
    Serve {
        #[command(flatten)]
        source: SourceArgs,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            source,
            overrides,
            output,
            dry_run,
        } => run_backtest(&source, &overrides, output.as_deref(), dry_run),
        Command::Lesson { topic } => run_lesson(topic.as_deref()),
        Command::ListTickers { source } => run_list_tickers(&source),
        Command::Info { ticker, source } => run_info(&ticker, &source),
        Command::Import {
            ticker,
            csv,
            config,
        } => run_import(&ticker, &csv, config.as_deref()),
        Command::Serve { source } => run_serve(&source),
    }
}

fn fail(err: &TradelogicError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// A missing path means "no config file": every key takes its default.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TradelogicError> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn load_validated_config(path: Option<&Path>) -> Result<FileConfigAdapter, TradelogicError> {
    let config = load_config(path)?;
    validate_backtest_config(&config)?;
    validate_data_config(&config)?;
    Ok(config)
}

/// Flags over config over defaults.
pub fn build_request(
    config: &dyn ConfigPort,
    overrides: &RequestOverrides,
) -> Result<BacktestRequest, TradelogicError> {
    let raw_ticker = overrides
        .ticker
        .clone()
        .or_else(|| config.get_string("backtest", "ticker"))
        .unwrap_or_else(|| DEFAULT_TICKER.to_string());
    let ticker = parse_ticker(&raw_ticker)?;

    let short_window = validate_window(
        "short_window",
        overrides.short_window.unwrap_or_else(|| {
            config.get_int("backtest", "short_window", DEFAULT_SHORT_WINDOW as i64)
        }),
    )?;
    let long_window = validate_window(
        "long_window",
        overrides.long_window.unwrap_or_else(|| {
            config.get_int("backtest", "long_window", DEFAULT_LONG_WINDOW as i64)
        }),
    )?;

    let start_date = match overrides.start_date {
        Some(d) => d,
        None => config
            .get_date("backtest", "start_date")?
            .unwrap_or_else(BacktestRequest::default_start_date),
    };
    let end_date = match overrides.end_date {
        Some(d) => d,
        None => config
            .get_date("backtest", "end_date")?
            .unwrap_or_else(BacktestRequest::default_end_date),
    };

    Ok(BacktestRequest {
        ticker,
        short_window,
        long_window,
        start_date,
        end_date,
    })
}

pub fn resolve_source_name(config: &dyn ConfigPort, args: &SourceArgs) -> String {
    args.source
        .clone()
        .or_else(|| config.get_string("data", "source"))
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string())
}

#[cfg_attr(
    all(feature = "sqlite", feature = "yahoo", feature = "web"),
    allow(dead_code)
)]
fn feature_missing(what: &str, feature: &str) -> TradelogicError {
    TradelogicError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: format!("'{}' needs the '{}' feature", what, feature),
    }
}

pub fn open_price_source(
    config: &dyn ConfigPort,
    args: &SourceArgs,
) -> Result<Box<dyn PriceSource + Send + Sync>, TradelogicError> {
    let source = resolve_source_name(config, args);
    tracing::debug!(%source, "opening price source");

    match source.as_str() {
        "csv" => {
            let dir = args
                .data_dir
                .clone()
                .or_else(|| config.get_string("data", "csv_dir").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_DIR));
            Ok(Box::new(CsvAdapter::new(dir)))
        }
        "sqlite" => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                Ok(Box::new(SqliteAdapter::from_config(config)?))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(feature_missing(&source, "sqlite"))
            }
        }
        "yahoo" => {
            #[cfg(feature = "yahoo")]
            {
                use crate::adapters::yahoo_adapter::YahooAdapter;
                Ok(Box::new(YahooAdapter::from_config(config)?))
            }
            #[cfg(not(feature = "yahoo"))]
            {
                Err(feature_missing(&source, "yahoo"))
            }
        }
        other => Err(TradelogicError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}'", other),
        }),
    }
}

fn run_backtest(
    source_args: &SourceArgs,
    overrides: &RequestOverrides,
    output: Option<&Path>,
    dry_run: bool,
) -> ExitCode {
    // Stage 1: config
    let config = match load_validated_config(source_args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    // Stage 2: resolve parameters
    let request = match build_request(&config, overrides) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let output_path = output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    if dry_run {
        print_request(&request, &resolve_source_name(&config, source_args));
        if let Some(path) = &output_path {
            eprintln!("  report:       {}", path.display());
        }
        eprintln!("\nDry run complete: configuration is valid");
        return ExitCode::SUCCESS;
    }

    // Stage 3: run
    let source = match open_price_source(&config, source_args) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Running backtest: {} SMA {}/{} from {} to {}",
        request.ticker, request.short_window, request.long_window, request.start_date,
        request.end_date
    );
    run_backtest_pipeline(source.as_ref(), &request, output_path.as_deref())
}

/// Fetch, run, summarise and optionally write the report.
pub fn run_backtest_pipeline(
    source: &dyn PriceSource,
    request: &BacktestRequest,
    output_path: Option<&Path>,
) -> ExitCode {
    let result = match run_for_request(source, request) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_summary(&result);

    if let Some(path) = output_path {
        let path_str = path.to_string_lossy();
        if let Err(e) = HtmlReportAdapter::new().write(&result, &path_str) {
            return fail(&e);
        }
        eprintln!("\nReport written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn print_request(request: &BacktestRequest, source: &str) {
    eprintln!("Resolved backtest:");
    eprintln!("  ticker:       {}", request.ticker);
    eprintln!("  short window: {}", request.short_window);
    eprintln!("  long window:  {}", request.long_window);
    eprintln!("  start date:   {}", request.start_date);
    eprintln!("  end date:     {}", request.end_date);
    eprintln!("  source:       {}", source);
}

pub fn print_summary(result: &BacktestResult) {
    let metrics = Metrics::compute(result);

    eprintln!("\n=== {} SMA {}/{} ===", result.ticker, result.short_window, result.long_window);
    if let (Some(first), Some(last)) = (result.dates.first(), result.dates.last()) {
        eprintln!("Period:           {} to {} ({} days)", first, last, result.len());
    }
    eprintln!("Strategy return:  {}", format_percent(metrics.strategy_return));
    eprintln!("Market return:    {}", format_percent(metrics.market_return));
    eprintln!("Excess return:    {}", format_percent(metrics.excess_return));
    eprintln!(
        "Annualized:       {} (market {})",
        format_percent(metrics.annualized_strategy_return),
        format_percent(metrics.annualized_market_return)
    );
    eprintln!("Max Drawdown:     {}", format_percent(-metrics.max_drawdown));
    eprintln!("Position changes: {}", metrics.position_changes);
    eprintln!(
        "Days long/short/flat: {}/{}/{}",
        metrics.days_long, metrics.days_short, metrics.days_flat
    );
}

fn run_lesson(topic: Option<&str>) -> ExitCode {
    let lessons: Vec<Lesson> = match topic {
        Some(t) => match Lesson::from_str(t) {
            Ok(l) => vec![l],
            Err(e) => {
                let slugs: Vec<&str> = Lesson::all().iter().map(|l| l.slug()).collect();
                eprintln!("available topics: {}", slugs.join(", "));
                return fail(&e);
            }
        },
        None => Lesson::all().to_vec(),
    };

    for (i, lesson) in lessons.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", lesson.title());
        println!("{}", lesson.body());
    }
    ExitCode::SUCCESS
}

fn run_list_tickers(source_args: &SourceArgs) -> ExitCode {
    let config = match load_config(source_args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let source = match open_price_source(&config, source_args) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let tickers = match source.list_tickers() {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    if tickers.is_empty() {
        eprintln!("No tickers found");
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    ExitCode::SUCCESS
}

fn run_info(ticker: &str, source_args: &SourceArgs) -> ExitCode {
    let config = match load_config(source_args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let source = match open_price_source(&config, source_args) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let ticker = match parse_ticker(ticker) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    match source.get_data_range(&ticker) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} prices, {} to {}", ticker, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", ticker);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_import(ticker: &str, csv_path: &Path, config_path: Option<&Path>) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };
        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        };

        let ticker = match parse_ticker(ticker) {
            Ok(t) => t,
            Err(e) => return fail(&e),
        };
        let series = match CsvAdapter::load_file(&ticker, csv_path) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        };

        match store.insert_prices(&series) {
            Ok(rows) => {
                eprintln!("Imported {} prices for {}", rows, ticker);
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (ticker, csv_path, config_path);
        fail(&feature_missing("sqlite", "sqlite"))
    }
}

fn run_serve(source_args: &SourceArgs) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{serve, AppState, DEFAULT_LISTEN};
        use std::sync::Arc;

        let config = match load_validated_config(source_args.config.as_deref()) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };
        let defaults = match build_request(&config, &RequestOverrides::default()) {
            Ok(r) => r,
            Err(e) => return fail(&e),
        };
        let price_source: Arc<dyn PriceSource + Send + Sync> =
            match open_price_source(&config, source_args) {
                Ok(s) => Arc::from(s),
                Err(e) => return fail(&e),
            };

        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        eprintln!("Starting web server on {}", listen);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return fail(&TradelogicError::Io(e)),
        };
        let state = AppState {
            price_source,
            defaults,
        };
        match runtime.block_on(serve(state, &listen)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = source_args;
        fail(&feature_missing("web", "web"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "tradelogic",
            "backtest",
            "--ticker",
            "msft",
            "--short-window",
            "5",
            "--long-window",
            "10",
            "--start-date",
            "2020-01-01",
            "--source",
            "csv",
            "--data-dir",
            "prices",
            "-o",
            "out.html",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Command::Backtest {
                source,
                overrides,
                output,
                dry_run,
            } => {
                assert_eq!(overrides.ticker.as_deref(), Some("msft"));
                assert_eq!(overrides.short_window, Some(5));
                assert_eq!(overrides.long_window, Some(10));
                assert_eq!(overrides.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
                assert_eq!(overrides.end_date, None);
                assert_eq!(source.source.as_deref(), Some("csv"));
                assert_eq!(source.data_dir, Some(PathBuf::from("prices")));
                assert_eq!(output, Some(PathBuf::from("out.html")));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_negative_window_for_validation() {
        let cli =
            Cli::try_parse_from(["tradelogic", "backtest", "--short-window", "-3"]).unwrap();
        match cli.command {
            Command::Backtest { overrides, .. } => assert_eq!(overrides.short_window, Some(-3)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["tradelogic", "backtest", "--end-date", "2020/01/01"]).is_err());
    }

    #[test]
    fn cli_parses_lesson_topic() {
        let cli = Cli::try_parse_from(["tradelogic", "lesson", "returns"]).unwrap();
        assert!(matches!(cli.command, Command::Lesson { topic: Some(ref t) } if t == "returns"));
    }

    #[test]
    fn build_request_defaults() {
        let request = build_request(&FileConfigAdapter::empty(), &RequestOverrides::default())
            .unwrap();
        assert_eq!(request, BacktestRequest::default());
    }

    #[test]
    fn build_request_flags_override_config() {
        let config = FileConfigAdapter::from_string(
            "[backtest]\nticker = tsla\nshort_window = 10\nlong_window = 30\nend_date = 2023-06-30\n",
        )
        .unwrap();
        let overrides = RequestOverrides {
            short_window: Some(3),
            ..Default::default()
        };

        let request = build_request(&config, &overrides).unwrap();
        assert_eq!(request.ticker, "TSLA");
        assert_eq!(request.short_window, 3);
        assert_eq!(request.long_window, 30);
        assert_eq!(request.start_date, BacktestRequest::default_start_date());
        assert_eq!(request.end_date, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
    }

    #[test]
    fn build_request_rejects_zero_window() {
        let overrides = RequestOverrides {
            long_window: Some(0),
            ..Default::default()
        };
        let err = build_request(&FileConfigAdapter::empty(), &overrides).unwrap_err();
        assert!(matches!(err, TradelogicError::InvalidWindow { ref name, value: 0 } if name == "long_window"));
    }

    #[test]
    fn build_request_rejects_blank_ticker_flag() {
        let overrides = RequestOverrides {
            ticker: Some("   ".into()),
            ..Default::default()
        };
        let err = build_request(&FileConfigAdapter::empty(), &overrides).unwrap_err();
        assert!(matches!(err, TradelogicError::ConfigInvalid { ref key, .. } if key == "ticker"));
    }

    #[test]
    fn build_request_rejects_path_like_ticker() {
        let overrides = RequestOverrides {
            ticker: Some("../private/keys".into()),
            ..Default::default()
        };
        let err = build_request(&FileConfigAdapter::empty(), &overrides).unwrap_err();
        assert!(matches!(err, TradelogicError::ConfigInvalid { ref key, .. } if key == "ticker"));
    }

    #[test]
    fn source_name_resolution() {
        let config = FileConfigAdapter::from_string("[data]\nsource = SQLite\n").unwrap();
        assert_eq!(resolve_source_name(&config, &SourceArgs::default()), "sqlite");

        let args = SourceArgs {
            source: Some("yahoo".into()),
            ..Default::default()
        };
        assert_eq!(resolve_source_name(&config, &args), "yahoo");
        assert_eq!(
            resolve_source_name(&FileConfigAdapter::empty(), &SourceArgs::default()),
            DEFAULT_SOURCE
        );
    }

    #[test]
    fn unknown_source_is_config_error() {
        let args = SourceArgs {
            source: Some("bloomberg".into()),
            ..Default::default()
        };
        let err = open_price_source(&FileConfigAdapter::empty(), &args).err().unwrap();
        assert!(matches!(err, TradelogicError::ConfigInvalid { ref key, .. } if key == "source"));
    }
}
