//! TRYDT Farmstead command line
//!
//! Loads the herd and its records from the hosted backend and prints
//! dashboard figures, day reports, sales totals, or exports a report file.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Arg, ArgAction, ArgMatches, Command};
use farm_core::clients::LogNotifier;
use farm_core::report::{
    DocumentRenderer, JsonRenderer, PdfServiceRenderer, ReportExporter, TextRenderer,
};
use farm_core::services::record_table::{cow_columns, COW_SEARCH_KEYS};
use farm_core::services::{
    DailyReport, DashboardSummary, RecordTable, SalesSummary, SortConfig, TableQuery,
};
use farm_core::{FarmConfig, FarmDataStore, FarmSnapshot, PdfService, PostgrestClient};
use farm_types::{CowFilter, DateRange, Scope};
use std::path::PathBuf;
use std::sync::Arc;

/// Days before today covered by the default range
const DEFAULT_RANGE_DAYS: i64 = 7;

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}

fn parse_cow_filter(value: &str) -> std::result::Result<CowFilter, String> {
    value.parse::<CowFilter>().map_err(|e| e.to_string())
}

fn cow_arg() -> Arg {
    Arg::new("cow")
        .long("cow")
        .value_name("ID")
        .help("Cow id, or 'all' for the whole herd")
        .value_parser(parse_cow_filter)
        .default_value("all")
}

fn date_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("DATE")
        .help(help)
        .value_parser(parse_date)
}

fn build_cli() -> Command {
    Command::new("farm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("TRYDT Farmstead records, analytics and reports")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .env("FARM_CONFIG")
                .default_value("config/farm.json")
                .global(true),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Production, herd and record figures for a scope")
                .arg(cow_arg())
                .arg(date_arg("from", "First day of the range"))
                .arg(date_arg("to", "Last day of the range (default: today)")),
        )
        .subcommand(
            Command::new("daily")
                .about("Per-cow milk, feed and health for one day")
                .arg(cow_arg())
                .arg(date_arg("date", "Report day (default: today)")),
        )
        .subcommand(
            Command::new("sales")
                .about("Milk sales totals by payment method")
                .arg(date_arg("from", "First day of the range"))
                .arg(date_arg("to", "Last day of the range (default: today)")),
        )
        .subcommand(
            Command::new("export")
                .about("Write the farm analytics report to a file")
                .arg(cow_arg())
                .arg(date_arg("from", "First day of the range"))
                .arg(date_arg("to", "Last day of the range (default: today)"))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format")
                        .value_parser(["text", "json", "pdf"])
                        .default_value("pdf"),
                )
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .value_name("DIR")
                        .help("Directory for the report file (default: from config)")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("cows")
                .about("List the herd")
                .arg(Arg::new("search").long("search").value_name("TEXT").help("Filter by name, breed or status"))
                .arg(Arg::new("sort").long("sort").value_name("COLUMN").help("Sort by column key"))
                .arg(
                    Arg::new("desc")
                        .long("desc")
                        .help("Sort descending")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                ),
        )
}

/// `--from`/`--to` with the default of the last week ending on `today`
fn date_range(matches: &ArgMatches, today: NaiveDate) -> Result<DateRange> {
    let to = matches.get_one::<NaiveDate>("to").copied().unwrap_or(today);
    match matches.get_one::<NaiveDate>("from").copied() {
        Some(from) => DateRange::new(from, to).context("Invalid date range"),
        None => Ok(DateRange::ending_on(to, DEFAULT_RANGE_DAYS)),
    }
}

fn cow_filter(matches: &ArgMatches) -> CowFilter {
    matches.get_one::<CowFilter>("cow").cloned().unwrap_or(CowFilter::All)
}

fn scope(matches: &ArgMatches, today: NaiveDate) -> Result<Scope> {
    Ok(Scope::new(cow_filter(matches), date_range(matches, today)?))
}

async fn load_snapshot(config: &FarmConfig) -> Result<Arc<FarmSnapshot>> {
    let backend = Arc::new(PostgrestClient::new(config.backend.clone())?);
    let store = FarmDataStore::new(backend, Arc::new(LogNotifier));

    if !store.refresh().await {
        bail!("Could not load farm data from {}", config.backend.url);
    }
    Ok(store.snapshot())
}

fn print_dashboard(summary: &DashboardSummary) {
    println!("Scope: {} ({} - {})", summary.scope.cow_filter, summary.scope.range.from(), summary.scope.range.to());
    println!("Total milk:       {:.2} L", summary.total_milk);
    println!("Active cows:      {}", summary.active_cows);
    println!("Average per cow:  {:.2} L", summary.average_per_cow);
    println!("Herd size:        {}", summary.herd_size);
    if let Some(status) = summary.selected_status {
        println!("Selected cow:     {}", status.label());
    }

    println!();
    println!("Daily production");
    for point in &summary.time_series {
        println!("  {}  {:>8.2} L", point.date, point.litres);
    }

    println!();
    println!("Top producers");
    for (rank, entry) in summary.leaderboard.iter().enumerate() {
        println!("  {:>2}. {:<20} {:>8.2} L", rank + 1, entry.name, entry.litres);
    }

    println!();
    println!("Herd status");
    for entry in &summary.status_breakdown {
        println!("  {:<10} {}", entry.status.label(), entry.count);
    }

    println!();
    println!("Records ({} total)", summary.total_records());
    for (label, count) in summary.record_counts.entries() {
        println!("  {:<15} {}", label, count);
    }
}

fn print_daily(report: &DailyReport) {
    println!("Daily report for {} ({})", report.date, report.cow_filter);
    if report.is_empty() {
        println!("No cows to report");
        return;
    }

    for row in &report.rows {
        println!();
        println!("{} ({}, {})", row.cow.name, row.cow.breed, row.cow.status.label());
        match &row.milk_detail {
            Some(m) => println!(
                "  Milk: {:.1} L (morning {:.1}, midday {:.1}, evening {:.1})",
                row.milk_litres, m.morning_litres, m.noon_litres, m.evening_litres
            ),
            None => println!("  Milk: no record"),
        }
        for feed in &row.feed {
            println!("  Feed: {} {:.1} {}", feed.feed_type, feed.quantity, feed.unit);
        }
        match &row.health {
            Some(h) => println!(
                "  Health: {}{}",
                h.health_status,
                h.illness.as_deref().map(|i| format!(" ({})", i)).unwrap_or_default()
            ),
            None => println!("  Health: no record"),
        }
    }

    println!();
    println!("Total milk: {:.2} L   Total feed: {:.1}", report.total_milk, report.total_feed);
}

fn print_sales(summary: &SalesSummary) {
    println!("Sales {} - {}", summary.from, summary.to);
    println!("  Sales:   {}", summary.sale_count);
    println!("  Litres:  {:.1}", summary.total_litres);
    println!("  Amount:  {:.2}", summary.total_amount);
    println!("  Price/L: {:.2}", summary.price_per_litre());
    for total in &summary.by_method {
        println!(
            "  {:<8} {:>3} sales {:>8.1} L {:>10.2}",
            total.method.label(),
            total.count,
            total.litres,
            total.amount
        );
    }
}

fn print_cows(snapshot: &FarmSnapshot, matches: &ArgMatches) -> Result<()> {
    let table = RecordTable::new(&snapshot.cows, cow_columns()).with_search_keys(COW_SEARCH_KEYS);
    let sort = matches.get_one::<String>("sort").map(|key| {
        let ascending = SortConfig::toggle(None, key);
        if matches.get_flag("desc") {
            SortConfig::toggle(Some(&ascending), key)
        } else {
            ascending
        }
    });
    let query = TableQuery {
        search: matches.get_one::<String>("search").cloned(),
        sort,
        page: matches.get_one::<usize>("page").copied().unwrap_or(1),
    };

    let page = table.view(&query)?;
    let labels: Vec<&str> = table.columns().iter().map(|c| c.label).collect();
    println!("{}", labels.join(" | "));
    for row in table.cells(&page) {
        println!("{}", row.join(" | "));
    }
    println!("{} (page {} of {})", page.summary(), page.page, page.total_pages.max(1));
    Ok(())
}

async fn renderer(format: &str, config: &FarmConfig) -> Result<Box<dyn DocumentRenderer>> {
    let renderer: Box<dyn DocumentRenderer> = match format {
        "text" => Box::new(TextRenderer::new(config.report.page_height)),
        "json" => Box::new(JsonRenderer),
        "pdf" => {
            let service = PdfService::new(config.pdf_service.clone())?;
            service.ensure_available().await?;
            Box::new(PdfServiceRenderer::new(service))
        }
        other => bail!("Unsupported report format '{}'", other),
    };
    Ok(renderer)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();
    let config_path = matches
        .get_one::<String>("config")
        .context("No configuration file given")?;
    let config = FarmConfig::from_file(config_path)?;
    log::info!("Loaded configuration from {}", config_path);

    let today = Local::now().date_naive();

    match matches.subcommand() {
        Some(("dashboard", sub)) => {
            let scope = scope(sub, today)?;
            let snapshot = load_snapshot(&config).await?;
            let summary = DashboardSummary::compute(&snapshot, &scope, config.report.leaderboard_limit);
            print_dashboard(&summary);
        }
        Some(("daily", sub)) => {
            let date = sub.get_one::<NaiveDate>("date").copied().unwrap_or(today);
            let snapshot = load_snapshot(&config).await?;
            print_daily(&DailyReport::build(&snapshot, &cow_filter(sub), date));
        }
        Some(("sales", sub)) => {
            let range = date_range(sub, today)?;
            let snapshot = load_snapshot(&config).await?;
            print_sales(&SalesSummary::compute(&snapshot.sales, &range));
        }
        Some(("export", sub)) => {
            let scope = scope(sub, today)?;
            let format = sub
                .get_one::<String>("format")
                .map(String::as_str)
                .unwrap_or("pdf");
            let mut report_config = config.report.clone();
            if let Some(dir) = sub.get_one::<PathBuf>("output-dir") {
                report_config.output_dir = dir.clone();
            }

            let renderer = renderer(format, &config).await?;
            let snapshot = load_snapshot(&config).await?;
            let exporter = ReportExporter::new(
                renderer,
                Arc::new(LogNotifier),
                &report_config,
            );
            let path = exporter
                .export(&snapshot, &scope, Local::now().naive_local())
                .await?;
            println!("{}", path.display());
        }
        Some(("cows", sub)) => {
            let snapshot = load_snapshot(&config).await?;
            print_cows(&snapshot, sub)?;
        }
        _ => bail!("Unknown command"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_default_range_is_last_week() {
        let matches = build_cli().get_matches_from(["farm", "dashboard"]);
        let (_, sub) = matches.subcommand().unwrap();
        let scope = scope(sub, day(3, 10)).unwrap();

        assert_eq!(scope.cow_filter, CowFilter::All);
        assert_eq!(scope.range.from(), day(3, 3));
        assert_eq!(scope.range.to(), day(3, 10));
    }

    #[test]
    fn test_explicit_scope() {
        let matches = build_cli().get_matches_from([
            "farm", "export", "--cow", "c-17", "--from", "2024-01-01", "--to", "2024-01-01",
            "--format", "json",
        ]);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "export");

        let scope = scope(sub, day(3, 10)).unwrap();
        assert_eq!(scope.cow_filter, CowFilter::Cow("c-17".into()));
        assert!(scope.range.is_single_day());
        assert_eq!(sub.get_one::<String>("format").unwrap(), "json");
    }

    #[test]
    fn test_inverted_range_rejected() {
        let matches = build_cli().get_matches_from([
            "farm", "sales", "--from", "2024-02-10", "--to", "2024-02-01",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(date_range(sub, day(3, 10)).is_err());
    }

    #[test]
    fn test_bad_date_is_a_usage_error() {
        let result = build_cli().try_get_matches_from(["farm", "daily", "--date", "10/03/2024"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_file_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"backend": {{"url": "https://farm.example.co", "anon_key": "k"}}}}"#).unwrap();

        let config = FarmConfig::from_file(file.path()).unwrap();
        assert_eq!(config.backend.api_key, "k");
        assert!(renderer("json", &config).await.is_ok());
        assert_eq!(renderer("text", &config).await.unwrap().file_extension(), "txt");
        assert!(renderer("docx", &config).await.is_err());
    }
}
