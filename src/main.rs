use clap::Parser;
use venue_capture::domain::ports::ConfigProvider;
use venue_capture::core::record_sync::AggregationPolicy;
use venue_capture::utils::error::{CaptureError, ErrorSeverity};
use venue_capture::utils::{logger, validation::Validate};
use venue_capture::{
    BrowserVenueVisitor, CaptureEngine, CliConfig, LocalStorage, Settings, SnapshotVisitor,
    VenueVisitor, VisitStatus,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting venue-capture");

    let settings = match Settings::resolve(&cli).and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };
    tracing::debug!("Resolved settings: {:?}", settings);

    let policy = AggregationPolicy::from_config(&settings);
    let engine = CaptureEngine::new(LocalStorage::new("."), policy);

    if cli.dry_run {
        tracing::info!("DRY RUN MODE - no venue will be visited");
        match engine.plan(&settings.input).await {
            Ok(plan) if plan.is_empty() => println!("No venue needs a visit."),
            Ok(plan) => {
                println!("Would visit {} venue(s) using {}:", plan.len(), settings.venue_url_template());
                for site_id in plan {
                    println!(" - {}", site_id);
                }
            }
            Err(e) => exit_with(&e),
        }
        return Ok(());
    }

    let mut visitor: Box<dyn VenueVisitor> = match &settings.snapshot_dir {
        Some(dir) => {
            tracing::info!("Replaying venue snapshots from {}", dir);
            Box::new(SnapshotVisitor::new(dir))
        }
        None => match BrowserVenueVisitor::connect(settings.browser_options()).await {
            Ok(visitor) => Box::new(visitor),
            Err(e) => exit_with(&CaptureError::from(e)),
        },
    };

    match engine
        .run(&settings.input, &settings.output, visitor.as_mut())
        .await
    {
        Ok(summary) => {
            match &summary.report {
                None => println!("No browsing store in the capture record; copied it unchanged."),
                Some(report) if !report.seed_parsed() => {
                    println!("Browsing store could not be parsed; left it unchanged.")
                }
                Some(report) => {
                    for visit in &report.visits {
                        match &visit.status {
                            VisitStatus::Merged { films, showtimes } => println!(
                                " + {} ({} films, {} showtimes)",
                                visit.site_id, films, showtimes
                            ),
                            other => println!(" - {} ({:?})", visit.site_id, other),
                        }
                    }
                }
            }
            println!("Wrote {}", summary.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &CaptureError) -> ! {
    tracing::error!(
        "Capture failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
