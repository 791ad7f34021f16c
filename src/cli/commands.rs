use crate::analyzers::YearlyAggregator;
use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::processors::IngestionCoordinator;
use crate::readers::discover_station_files;
use crate::store::{ObservationFilter, PageRequest, StatFilter, Store};
use crate::utils::ProgressReporter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Commands::Ingest {
            input_dir,
            database,
            max_workers,
            no_aggregate,
            quiet,
        } => {
            let store = Store::connect(&database).await?;

            let file_count = discover_station_files(&input_dir)?.len() as u64;
            let progress = ProgressReporter::new(file_count, quiet);

            let coordinator =
                IngestionCoordinator::new(max_workers).with_skip_aggregation(no_aggregate);
            let report = coordinator.run(&store, &input_dir, Some(&progress)).await?;

            println!("{}", report.summary());
        }

        Commands::Aggregate { database } => {
            let store = Store::connect(&database).await?;
            let summary = YearlyAggregator::new().aggregate(&store).await?;

            println!(
                "Aggregation complete: {} observations scanned, {} incomplete skipped, {} groups written",
                summary.scanned, summary.skipped, summary.groups
            );
        }

        Commands::Observations {
            database,
            date,
            station,
            page,
            page_size,
        } => {
            let store = Store::connect(&database).await?;
            let filter = ObservationFilter { date, station };
            let rows = store
                .query_observations(&filter, &PageRequest::new(page, page_size))
                .await?;

            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }

        Commands::Stats {
            database,
            year,
            station,
            page,
            page_size,
        } => {
            let store = Store::connect(&database).await?;
            let filter = StatFilter { year, station };
            let rows = store
                .query_stats(&filter, &PageRequest::new(page, page_size))
                .await?;

            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_filter = if verbose {
        "wx_ingestor=debug,info"
    } else {
        "wx_ingestor=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
