use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::PointsConfig;
use crate::engine::Engine;
use crate::engine::sampler::SamplePlan;
use crate::model::GuardianEntry;
use crate::oracle::NftOwnership;
use crate::oracle::defillama::DefiLlama;
use crate::oracle::nft::{Erc721Ownership, NoPioneerCollection};
use crate::oracle::vault::VaultOracle;
use crate::store::Store;

/// CLI-facing options shared by the `guardians` and `pioneers` commands.
pub struct RunOptions {
    pub config_path: PathBuf,
    /// Reporting day; yesterday (UTC) when absent.
    pub date: Option<NaiveDate>,
    pub dry_run: bool,
}

impl RunOptions {
    fn plan(&self) -> SamplePlan {
        match self.date {
            Some(day) => SamplePlan::for_day(day),
            None => SamplePlan::yesterday(chrono::Utc::now()),
        }
    }
}

/// Entry point for the `guardians` command.
pub fn guardians(map_path: &Path, opts: &RunOptions) -> Result<()> {
    let entries: Vec<GuardianEntry> = read_json(map_path)?;
    if entries.is_empty() {
        bail!("{} lists no guardians", map_path.display());
    }
    let config = PointsConfig::load(&opts.config_path)?;

    let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
    rt.block_on(guardians_async(entries, config, opts))
}

async fn guardians_async(
    entries: Vec<GuardianEntry>,
    config: PointsConfig,
    opts: &RunOptions,
) -> Result<()> {
    let plan = opts.plan();
    let engine = connect(&config).await?;
    let run = engine.compute_guardians(&entries, &plan).await?;

    println!("=== guardian points {} ===", plan.day());
    println!("Blocks: {:?}", run.blocks);
    for s in &run.ranked {
        println!(
            "#{:<3} {}  T={:.2}  k={:.2}  weight={}  referrals={}",
            s.rank + 1,
            s.guardian.guardian_address,
            s.t,
            s.k,
            s.weight,
            s.guardian.referrals.len(),
        );
    }
    for (address, err) in &run.failed {
        println!("FAILED {address}: {err}");
    }

    if opts.dry_run {
        info!("dry run, nothing persisted");
    } else {
        let store = Store::open(&config.db_path())?;
        for guardian in run.guardians() {
            store.save_guardian(guardian).await?;
        }
        info!(stored = run.ranked.len(), db = %config.db_path().display(), "guardians persisted");
    }

    if !run.failed.is_empty() {
        let retryable = run.failed.iter().all(|(_, e)| e.is_retryable());
        warn!(failed = run.failed.len(), retryable, "some guardians were not computed");
        bail!("{} guardian(s) failed", run.failed.len());
    }
    Ok(())
}

/// Entry point for the `pioneers` command.
pub fn pioneers(users_path: &Path, opts: &RunOptions) -> Result<()> {
    let users: Vec<String> = read_json(users_path)?;
    let config = PointsConfig::load(&opts.config_path)?;

    let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
    rt.block_on(pioneers_async(users, config, opts))
}

async fn pioneers_async(users: Vec<String>, config: PointsConfig, opts: &RunOptions) -> Result<()> {
    let plan = opts.plan();
    let engine = connect(&config).await?;
    let run = engine.compute_pioneers(&users, &plan).await?;

    println!("=== pioneer points {} ===", plan.day());
    for p in &run.pioneers {
        println!(
            "{}  usd={:.2}  nft={}  points={:.2}",
            p.address, p.total_usd, p.has_pioneer_nft, p.points
        );
    }
    for (address, err) in &run.failed {
        println!("FAILED {address}: {err}");
    }

    if !opts.dry_run {
        let store = Store::open(&config.db_path())?;
        store.save_pioneers(&run.pioneers).await?;
        info!(stored = run.pioneers.len(), "pioneers persisted");
    }

    if !run.failed.is_empty() {
        bail!("{} pioneer user(s) failed", run.failed.len());
    }
    Ok(())
}

/// Build the live collaborators from config.
pub async fn connect(config: &PointsConfig) -> Result<Engine> {
    let llama = DefiLlama::new(config.call_timeout())?;
    let vault = VaultOracle::connect(&config.chain, &config.vault, llama.clone())
        .await
        .context("connecting to vault")?;
    let nft: Arc<dyn NftOwnership> = match &config.pioneer_nft {
        Some(collection) => Arc::new(Erc721Ownership::connect(&config.chain, collection)?),
        None => {
            warn!("no pioneer_nft configured; every user gets the base multiplier");
            Arc::new(NoPioneerCollection)
        }
    };

    Ok(Engine::new(
        config.chain.name(),
        Arc::new(llama),
        Arc::new(vault),
        nft,
    )
    .with_call_timeout(config.call_timeout()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}
