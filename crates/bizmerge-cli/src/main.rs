mod report;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;

use bizmerge_service::{BusinessDataService, RuleBasedValidator, ServiceStores};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::seed::{seed_business, FixtureExtractor};

#[derive(Debug, Parser)]
#[command(name = "bizmerge-cli")]
#[command(about = "Merge and audit business profiles extracted from several sites")]
struct Cli {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Fixture file; overrides `BIZMERGE_FIXTURES_PATH`.
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List businesses in the fixture file.
    List,
    /// Extract every fixture site and aggregate the business.
    Aggregate {
        #[arg(long)]
        business: String,
    },
    /// Re-score consistency from site data, optionally for one field.
    Validate {
        #[arg(long)]
        business: String,
        #[arg(long)]
        field: Option<String>,
    },
    /// Aggregate, then audit the stored aggregate.
    Integrity {
        #[arg(long)]
        business: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = bizmerge_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let fixtures_path = cli.fixtures.clone().unwrap_or_else(|| config.fixtures_path.clone());
    let fixtures = bizmerge_core::load_fixtures(&fixtures_path)?;

    let command = cli.command.unwrap_or(Commands::List);

    let business_id = match &command {
        Commands::List => {
            if cli.json {
                let ids: Vec<&str> = fixtures.businesses.iter().map(|b| b.id.as_str()).collect();
                report::print_json(&ids)?;
            } else {
                report::print_fixture_list(&fixtures);
            }
            return Ok(());
        }
        Commands::Aggregate { business }
        | Commands::Validate { business, .. }
        | Commands::Integrity { business } => business.as_str(),
    };

    let business = fixtures.business(business_id).ok_or_else(|| {
        anyhow::anyhow!(
            "business '{business_id}' not found in {}",
            fixtures_path.display()
        )
    })?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let extractor = Arc::new(FixtureExtractor::default());
    let service = BusinessDataService::new(
        ServiceStores::in_memory(),
        extractor.clone(),
        Arc::new(RuleBasedValidator),
    )
    .with_config(&config);

    seed_business(&service, &extractor, business, &cancel).await?;

    match command {
        Commands::List => {}
        Commands::Aggregate { business } => {
            let aggregate = service.aggregate_business_data(&business, &cancel).await?;
            if cli.json {
                report::print_json(&aggregate)?;
            } else {
                report::print_aggregate(&aggregate);
            }
        }
        Commands::Validate {
            business,
            field: Some(field),
        } => {
            let result = service
                .validate_field_consistency(&business, &field, &cancel)
                .await?;
            if cli.json {
                report::print_json(&result)?;
            } else {
                report::print_field(&result);
            }
        }
        Commands::Validate {
            business,
            field: None,
        } => {
            let result = service.validate_consistency(&business, &cancel).await?;
            if cli.json {
                report::print_json(&result)?;
            } else {
                report::print_consistency(&result);
            }
        }
        Commands::Integrity { business } => {
            service.aggregate_business_data(&business, &cancel).await?;
            let result = service.validate_data_integrity(&business).await?;
            if cli.json {
                report::print_json(&result)?;
            } else {
                report::print_integrity(&business, &result);
            }
        }
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("received ctrl-c, cancelling");
        cancel.cancel();
    }
}
