use clap::Parser;
use tracing_subscriber::EnvFilter;

use guardian_points::config::PointsConfig;
use guardian_points::engine::sampler::SamplePlan;
use guardian_points::{api, run};

mod cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Timestamps { date } => {
            let plan = match date {
                Some(day) => SamplePlan::for_day(day),
                None => SamplePlan::yesterday(chrono::Utc::now()),
            };
            println!("{} ({})", plan.day(), plan.day_key());
            for ts in plan.timestamps() {
                println!("  {ts}");
            }
            Ok(())
        }
        cli::Command::Guardians {
            file,
            config,
            date,
            dry_run,
        } => run::guardians(&file, &run::RunOptions {
            config_path: config,
            date,
            dry_run,
        }),
        cli::Command::Pioneers {
            file,
            config,
            date,
            dry_run,
        } => run::pioneers(&file, &run::RunOptions {
            config_path: config,
            date,
            dry_run,
        }),
        cli::Command::Serve { config, host, port } => {
            let config = PointsConfig::load(&config)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(api::serve(&host, port, &config))
        }
    }
}
