// Subscription suite runner: executes every scenario against a DataHub endpoint.
use anyhow::Result;
use clap::Parser;
use datahub_client::config::MISSING_SETTINGS_MESSAGE;
use datahub_common::auth::mask;
use datahub_test_harness::TestEnv;
use datahub_test_harness::env::load_client_config;
use datahub_test_harness::scenarios::run_all;
use tracing::{error, info};

const MISSING_SETTINGS_EXIT: i32 = 255;

#[derive(Parser, Debug)]
#[command(name = "subscription-suite")]
#[command(about = "Run the subscription scenarios against a DataHub endpoint")]
struct Args {
    /// Settings file with a `datahub:` section (defaults to DATAHUB_TEST_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Run against an in-process service instead of the configured endpoint
    #[arg(long, default_value_t = false)]
    local: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let env = if args.local {
        TestEnv::local().await?
    } else {
        let config = load_client_config(args.config.as_deref())?;
        println!("=======================================");
        println!("access_id: {}", config.access_id);
        println!("access_key: {}", mask(&config.access_key));
        println!("endpoint: {}", config.endpoint);
        println!("=======================================\n");
        if !config.is_complete() {
            eprintln!("{MISSING_SETTINGS_MESSAGE}");
            std::process::exit(MISSING_SETTINGS_EXIT);
        }
        TestEnv::remote(config)?
    };
    info!(endpoint = %env.config().endpoint, local = env.is_local(), "running subscription suite");

    let reports = run_all(env.client()).await;
    let failed = reports.iter().filter(|report| !report.passed()).count();
    for report in &reports {
        match &report.error {
            None => println!("ok      {}", report.scenario),
            Some(err) => println!("FAILED  {}: {err:#}", report.scenario),
        }
    }
    env.shutdown().await?;

    if failed > 0 {
        error!(failed, total = reports.len(), "subscription suite failed");
        std::process::exit(1);
    }
    info!(total = reports.len(), "subscription suite passed");
    Ok(())
}
