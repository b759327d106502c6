use clap::Parser;
use fba_core::pricing::FilterThresholds;
use fba_core::scanner::{ArbitrageScanner, ScanOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;

#[derive(Debug, Parser)]
#[command(name = "fba_worker")]
struct Args {
    /// JSON file with `requests` (URLs to fetch) and/or `candidates` (manual entries).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Source page URL to analyze. Repeatable.
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Minimum ROI percentage. Defaults to DEFAULT_MIN_ROI (30).
    #[arg(long)]
    min_roi: Option<f64>,

    /// Maximum marketplace price. Defaults to DEFAULT_MAX_PRICE (100).
    #[arg(long)]
    max_price: Option<f64>,

    /// Print the whole outcome (counts and skipped items), not just the profitable products.
    #[arg(long)]
    show_failures: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = fba_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let input = match &args.input {
        Some(path) => batch::BatchInput::load(path)?,
        None => batch::BatchInput::default(),
    }
    .with_urls(&args.urls);
    anyhow::ensure!(!input.is_empty(), "nothing to analyze: pass --input or --url");

    let thresholds = FilterThresholds::from_settings(&settings)
        .with_overrides(args.min_roi, args.max_price)?;
    let scanner = ArbitrageScanner::from_settings(&settings)?;

    tracing::info!(
        items = input.len(),
        min_roi = thresholds.min_roi,
        max_price = thresholds.max_price,
        "worker: scan started"
    );

    let fetched = scanner.scan(&input.requests, &thresholds).await;
    let manual = scanner.scan_candidates(input.candidates, &thresholds);
    let outcome = merge(fetched, manual);

    for failure in &outcome.failures {
        let err = anyhow::anyhow!("{}", failure.error).context(failure.source.clone());
        sentry_anyhow::capture_anyhow(&err);
    }

    let printed = if args.show_failures {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string_pretty(&outcome.profitable)?
    };
    println!("{printed}");

    tracing::info!(
        evaluated = outcome.evaluated,
        profitable = outcome.profitable.len(),
        failed = outcome.failures.len(),
        "worker: scan finished"
    );
    Ok(())
}

fn merge(mut a: ScanOutcome, b: ScanOutcome) -> ScanOutcome {
    a.evaluated += b.evaluated;
    a.profitable.extend(b.profitable);
    a.failures.extend(b.failures);
    a
}

fn init_sentry(settings: &fba_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
