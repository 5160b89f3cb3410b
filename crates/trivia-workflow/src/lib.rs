//! Mint & Forge Workflow Engine: two durable step chains driven
//! off rows the Eligibility & Stock Ledger and this crate's own
//! `forge_operations` inserts persist. Every step checks what the row
//! already carries before doing its work, so re-running a chain after a
//! crash resumes instead of repeating side effects.
//!
//! Mint and Forge instances run detached from the request that started
//! them — the engine runs instances in parallel across players but
//! serializes steps within a single instance — `start_mint`/`start_forge`
//! persist the starting row and hand the caller an operation id to poll;
//! the step chain itself runs on a spawned task.

pub mod config;
pub mod forge;
pub mod mint;
pub mod retry;

use std::sync::Arc;

use tracing::{error, info};

use trivia_error::Error;
use trivia_external::{Blockchain, BlobStore, Clock, ContentAddressing, Rng};
use trivia_ledger::EligibilityLedger;
use trivia_store_sql::SqlStore;
use trivia_types::{CategoryId, EligibilityId, ForgeOperationId, MintOperationId, ScopeKind};

pub use config::WorkflowConfig;
use forge::ForgeDeps;
use mint::MintDeps;

pub struct WorkflowEngine {
    store: Arc<SqlStore>,
    ledger: Arc<EligibilityLedger>,
    blockchain: Arc<dyn Blockchain>,
    blob_store: Arc<dyn BlobStore>,
    content_addressing: Arc<dyn ContentAddressing>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn Rng>,
    config: WorkflowConfig,
}

impl WorkflowEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<SqlStore>,
        ledger: Arc<EligibilityLedger>,
        blockchain: Arc<dyn Blockchain>,
        blob_store: Arc<dyn BlobStore>,
        content_addressing: Arc<dyn ContentAddressing>,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn Rng>,
        config: WorkflowConfig,
    ) -> Self {
        Self { store, ledger, blockchain, blob_store, content_addressing, clock, rng, config }
    }

    fn mint_deps(&self) -> MintDeps {
        MintDeps {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            blockchain: self.blockchain.clone(),
            blob_store: self.blob_store.clone(),
            content_addressing: self.content_addressing.clone(),
            clock: self.clock.clone(),
            rng: self.rng.clone(),
            config: self.config.clone(),
        }
    }

    fn forge_deps(&self) -> ForgeDeps {
        ForgeDeps {
            store: self.store.clone(),
            blockchain: self.blockchain.clone(),
            clock: self.clock.clone(),
            rng: self.rng.clone(),
            config: self.config.clone(),
        }
    }

    /// Reserves stock and an operation row for `eligibility_id`, then spawns
    /// the remaining Mint steps in the background. Returns as soon as the
    /// row is persisted so the caller can start polling `run_mint`'s status
    /// via the `mints` table without blocking on chain confirmation.
    pub async fn start_mint(&self, eligibility_id: EligibilityId) -> Result<MintOperationId, Error> {
        let mint_operation_id = MintOperationId::new_v4();
        self.ledger.consume(eligibility_id, mint_operation_id).await?;

        let deps = self.mint_deps();
        tokio::spawn(async move {
            if let Err(e) = mint::run(&deps, mint_operation_id).await {
                error!(%mint_operation_id, error = %e, "mint workflow ended in failure");
            }
        });

        Ok(mint_operation_id)
    }

    /// Re-runs the Mint chain for an operation id already on file. Used both
    /// by `start_mint`'s spawned task and by `resume_stale_operations`.
    pub async fn run_mint(&self, mint_operation_id: MintOperationId) -> Result<(), Error> {
        mint::run(&self.mint_deps(), mint_operation_id).await
    }

    /// Validates ownership and the structural shape, inserts the `pending`
    /// forge_operations row, then spawns the remaining Forge steps.
    #[allow(clippy::too_many_arguments)]
    pub async fn start_forge(
        &self,
        scope: ScopeKind,
        stake: &str,
        input_fingerprints: Vec<String>,
        category_id: Option<CategoryId>,
        season_id: Option<String>,
    ) -> Result<ForgeOperationId, Error> {
        let deps = self.forge_deps();
        let forge_operation_id = forge::start(&deps, scope, stake, input_fingerprints, category_id, season_id).await?;

        tokio::spawn(async move {
            if let Err(e) = forge::run(&deps, forge_operation_id).await {
                error!(%forge_operation_id, error = %e, "forge workflow ended in failure");
            }
        });

        Ok(forge_operation_id)
    }

    pub async fn run_forge(&self, forge_operation_id: ForgeOperationId) -> Result<(), Error> {
        forge::run(&self.forge_deps(), forge_operation_id).await
    }

    /// Scans both operation tables for non-terminal rows older than
    /// `config.stale_after_secs` and resumes each from its persisted cursor
    /// on restart.
    /// Runs resumptions sequentially, one at a time, to bound load on
    /// restart rather than spawning every stale row at once.
    pub async fn resume_stale_operations(&self) -> Result<(), Error> {
        let now = self.clock.now();
        let stale_mints = mint::find_stale(&self.store, self.config.stale_after_secs, now).await?;
        let stale_forges = forge::find_stale(&self.store, self.config.stale_after_secs, now).await?;

        info!(
            stale_mints = stale_mints.len(),
            stale_forges = stale_forges.len(),
            "resuming stale workflow operations"
        );

        for mint_operation_id in stale_mints {
            if let Err(e) = self.run_mint(mint_operation_id).await {
                error!(%mint_operation_id, error = %e, "failed to resume stale mint");
            }
        }
        for forge_operation_id in stale_forges {
            if let Err(e) = self.run_forge(forge_operation_id).await {
                error!(%forge_operation_id, error = %e, "failed to resume stale forge");
            }
        }
        Ok(())
    }
}
