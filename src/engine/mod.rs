pub mod accumulator;
pub mod guardian;
pub mod pioneer;
pub mod sampler;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::PointsError;
use crate::model::{GuardianEntry, PioneerUser, Referral, User};
use crate::oracle::{BalanceOracle, Balances, BlockResolver, NftOwnership, VaultAssets};

use accumulator::{AssetPrices, TvlAccumulator};
use guardian::{ScoredGuardian, score_guardians};
use sampler::SamplePlan;

/// Default bound on every collaborator call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a guardian run: ranked, redistributed guardians plus the ones
/// whose computation was aborted.
#[derive(Debug)]
pub struct GuardianRun {
    pub day_key: String,
    pub blocks: Vec<u64>,
    pub ranked: Vec<ScoredGuardian>,
    pub failed: Vec<(String, PointsError)>,
}

impl GuardianRun {
    /// Finalized guardian documents in rank order.
    pub fn guardians(&self) -> impl Iterator<Item = &User> {
        self.ranked.iter().map(|s| &s.guardian)
    }
}

#[derive(Debug)]
pub struct PioneerRun {
    pub day_key: String,
    pub blocks: Vec<u64>,
    pub pioneers: Vec<PioneerUser>,
    pub failed: Vec<(String, PointsError)>,
}

/// The sampling pipeline: blocks → balances → ledgers → scores.
///
/// Collaborators are built once by the caller and shared across runs.
pub struct Engine {
    chain: String,
    resolver: Arc<dyn BlockResolver>,
    oracle: Arc<dyn BalanceOracle>,
    nft: Arc<dyn NftOwnership>,
    call_timeout: Duration,
}

impl Engine {
    pub fn new(
        chain: impl Into<String>,
        resolver: Arc<dyn BlockResolver>,
        oracle: Arc<dyn BalanceOracle>,
        nft: Arc<dyn NftOwnership>,
    ) -> Self {
        Self {
            chain: chain.into(),
            resolver,
            oracle,
            nft,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    // ── Guardians ────────────────────────────────────────────────────

    /// Sample every guardian and its referrals over `plan`, then rank and
    /// redistribute.
    ///
    /// Block or price failures abort the whole run. A balance failure only
    /// aborts the guardian it belongs to; the rest are still ranked.
    pub async fn compute_guardians(
        &self,
        entries: &[GuardianEntry],
        plan: &SamplePlan,
    ) -> Result<GuardianRun, PointsError> {
        let entries = merge_entries(entries);
        let blocks = self.resolve_blocks(plan).await?;
        let (assets, prices) = self.load_prices().await?;
        let acc = TvlAccumulator::new(&assets, prices, plan.day_key());
        info!(
            day = %plan.day(),
            guardians = entries.len(),
            blocks = ?blocks,
            price0 = prices.price0,
            price1 = prices.price1,
            "computing guardian points"
        );

        let mut accumulated = Vec::with_capacity(entries.len());
        let mut failed = Vec::new();
        for entry in &entries {
            match self.accumulate_guardian(entry, &blocks, &acc).await {
                Ok(user) => accumulated.push(user),
                Err(e) => {
                    warn!(guardian = %entry.address(), error = %e, "guardian computation aborted");
                    failed.push((entry.address(), e));
                }
            }
        }

        let ranked = score_guardians(accumulated);
        for s in &ranked {
            debug!(
                guardian = %s.guardian.guardian_address,
                rank = s.rank,
                score = s.t,
                referral_value = s.k,
                "ranked guardian"
            );
        }

        Ok(GuardianRun {
            day_key: plan.day_key(),
            blocks,
            ranked,
            failed,
        })
    }

    async fn accumulate_guardian(
        &self,
        entry: &GuardianEntry,
        blocks: &[u64],
        acc: &TvlAccumulator<'_>,
    ) -> Result<User, PointsError> {
        let address = entry.address();
        let code = entry.referrer_code();
        let mut guardian = User::guardian(&address, &code);
        let mut referrals: Vec<Referral> = dedup(entry.referral_addresses())
            .into_iter()
            .map(|a| Referral::new(a, &code))
            .collect();

        let mut accounts: Vec<String> = referrals
            .iter()
            .map(|r| r.referral_address.clone())
            .collect();
        accounts.push(address.clone());

        for &block in blocks {
            let balances = self.fetch_balances(&accounts, block).await?;
            for referral in &mut referrals {
                let b = balance_for(&balances, &referral.referral_address, block)?;
                let c = acc.referral_sample(referral, &b);
                acc.earned_sample(&mut guardian, &c);
            }
            let b = balance_for(&balances, &address, block)?;
            acc.guardian_sample(&mut guardian, &b);
        }

        guardian.referrals = referrals;
        Ok(guardian)
    }

    // ── Pioneers ─────────────────────────────────────────────────────

    /// Sample a flat list of users and apply the pioneer multiplier.
    ///
    /// A user whose balance read or NFT check fails is dropped from the
    /// result and reported in `failed`.
    pub async fn compute_pioneers(
        &self,
        addresses: &[String],
        plan: &SamplePlan,
    ) -> Result<PioneerRun, PointsError> {
        let blocks = self.resolve_blocks(plan).await?;
        let (assets, prices) = self.load_prices().await?;
        let acc = TvlAccumulator::new(&assets, prices, plan.day_key());
        info!(day = %plan.day(), users = addresses.len(), "computing pioneer points");

        let mut pioneers: Vec<PioneerUser> = dedup(addresses.iter().map(|a| a.to_lowercase()))
            .into_iter()
            .map(PioneerUser::new)
            .collect();
        let mut failed = Vec::new();

        for &block in &blocks {
            let live: Vec<String> = pioneers.iter().map(|p| p.address.clone()).collect();
            let balances = self.fetch_balances(&live, block).await?;
            pioneers.retain_mut(|p| match balance_for(&balances, &p.address, block) {
                Ok(b) => {
                    acc.pioneer_sample(p, &b);
                    true
                }
                Err(e) => {
                    warn!(user = %p.address, error = %e, "pioneer computation aborted");
                    failed.push((p.address.clone(), e));
                    false
                }
            });
        }

        let live: Vec<String> = pioneers.iter().map(|p| p.address.clone()).collect();
        let ownership = self.check_ownership(&live).await?;
        pioneers.retain_mut(|p| match ownership.get(&p.address) {
            Some(Ok(has_nft)) => {
                p.finalize(*has_nft);
                true
            }
            Some(Err(e)) => {
                warn!(user = %p.address, error = %e, "pioneer NFT check failed");
                failed.push((p.address.clone(), e.clone()));
                false
            }
            None => {
                failed.push((
                    p.address.clone(),
                    PointsError::OwnershipCheck {
                        address: p.address.clone(),
                        reason: "no result".into(),
                    },
                ));
                false
            }
        });

        Ok(PioneerRun {
            day_key: plan.day_key(),
            blocks,
            pioneers,
            failed,
        })
    }

    // ── Collaborator fan-out ─────────────────────────────────────────

    /// Resolve every sampling instant concurrently. Blocks come back in
    /// timestamp order.
    pub async fn resolve_blocks(&self, plan: &SamplePlan) -> Result<Vec<u64>, PointsError> {
        let mut set = JoinSet::new();
        for &ts in plan.timestamps() {
            let resolver = Arc::clone(&self.resolver);
            let chain = self.chain.clone();
            let limit = self.call_timeout;
            set.spawn(async move {
                let op = format!("block lookup {chain}@{ts}");
                let block = timed(limit, op, resolver.resolve(&chain, ts)).await;
                (ts, block)
            });
        }

        let mut by_ts = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            let (ts, block) = joined.map_err(|e| PointsError::Task(e.to_string()))?;
            by_ts.insert(ts, block?);
        }
        Ok(by_ts.into_values().collect())
    }

    async fn load_prices(&self) -> Result<(VaultAssets, AssetPrices), PointsError> {
        let limit = self.call_timeout;
        let assets = timed(limit, "vault assets", self.oracle.assets()).await?;
        let (price0, price1) = tokio::try_join!(
            timed(
                limit,
                format!("price of {}", assets.token0),
                self.oracle.price_usd(&assets.token0)
            ),
            timed(
                limit,
                format!("price of {}", assets.token1),
                self.oracle.price_usd(&assets.token1)
            ),
        )?;
        Ok((assets, AssetPrices { price0, price1 }))
    }

    /// Fetch balances of every distinct address at `block` concurrently.
    /// Individual failures are kept per address.
    async fn fetch_balances(
        &self,
        addresses: &[String],
        block: u64,
    ) -> Result<HashMap<String, Result<Balances, PointsError>>, PointsError> {
        let mut set = JoinSet::new();
        for address in addresses.iter().collect::<HashSet<_>>() {
            let oracle = Arc::clone(&self.oracle);
            let address = address.clone();
            let limit = self.call_timeout;
            set.spawn(async move {
                let op = format!("balances of {address}@{block}");
                let balances = timed(limit, op, oracle.balances_at(&address, block)).await;
                (address, balances)
            });
        }

        let mut out = HashMap::with_capacity(addresses.len());
        while let Some(joined) = set.join_next().await {
            let (address, balances) = joined.map_err(|e| PointsError::Task(e.to_string()))?;
            out.insert(address, balances);
        }
        Ok(out)
    }

    async fn check_ownership(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, Result<bool, PointsError>>, PointsError> {
        let mut set = JoinSet::new();
        for address in addresses {
            let nft = Arc::clone(&self.nft);
            let address = address.clone();
            let limit = self.call_timeout;
            set.spawn(async move {
                let op = format!("NFT check of {address}");
                let owned = timed(limit, op, nft.check(&address)).await;
                (address, owned)
            });
        }

        let mut out = HashMap::with_capacity(addresses.len());
        while let Some(joined) = set.join_next().await {
            let (address, owned) = joined.map_err(|e| PointsError::Task(e.to_string()))?;
            out.insert(address, owned);
        }
        Ok(out)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Bound `fut` by `limit`, mapping expiry to [`PointsError::Timeout`].
async fn timed<T>(
    limit: Duration,
    operation: impl Into<String>,
    fut: impl Future<Output = Result<T, PointsError>>,
) -> Result<T, PointsError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(PointsError::Timeout {
            operation: operation.into(),
            seconds: limit.as_secs(),
        }),
    }
}

fn balance_for(
    balances: &HashMap<String, Result<Balances, PointsError>>,
    address: &str,
    block: u64,
) -> Result<Balances, PointsError> {
    match balances.get(address) {
        Some(Ok(b)) => Ok(*b),
        Some(Err(e)) => Err(e.clone()),
        None => Err(PointsError::oracle(
            format!("balances of {address}@{block}"),
            "no result returned",
        )),
    }
}

/// Collapse entries naming the same guardian (case-insensitive) into the
/// first one, appending the later referral lists. Each guardian is scored
/// and ranked once.
fn merge_entries(entries: &[GuardianEntry]) -> Vec<GuardianEntry> {
    let mut merged: Vec<GuardianEntry> = Vec::with_capacity(entries.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    for entry in entries {
        let key = entry.address();
        match index.get(&key).copied() {
            Some(i) => {
                warn!(guardian = %key, "guardian listed twice; referral lists merged");
                let first = &mut merged[i];
                first.referrals.extend(entry.referrals.iter().cloned());
                if first.referrer_code.is_none() {
                    first.referrer_code = entry.referrer_code.clone();
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(entry.clone());
            }
        }
    }
    merged
}

/// Drop repeated addresses, keeping first occurrence order.
fn dedup(addresses: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|a| seen.insert(a.clone()))
        .collect()
}
