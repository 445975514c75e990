//! Pipeline façade: rows, index, plan, execution

use std::sync::Arc;

use bindsync_keybinds::{RawRecord, Row, RowBuilder};
use serde::Serialize;
use tracing::{info, warn};

use crate::backfill::{apply_backfill, plan_backfill, BackfillItem};
use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::executor::{ApplyReport, Executor, ItemOutcome};
use crate::index::{build_index, IdentityIndex};
use crate::planner::{compute_plan, PlanItem, PlanOptions, PlanStats};
use crate::remote::{RemoteStore, RemoteUser};
use crate::schema::{check_schema, SchemaReport};

/// What a run planned and, if it executed, what happened
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub plan: Vec<PlanItem>,
    pub stats: PlanStats,
    pub remote_rows: usize,
    /// `None` for dry runs, declined confirmations and empty plans
    pub report: Option<ApplyReport>,
}

#[derive(Debug, Serialize)]
pub struct BackfillSummary {
    pub items: Vec<BackfillItem>,
    pub report: Option<ApplyReport>,
}

pub struct SyncEngine {
    ctx: SyncContext,
    store: Arc<dyn RemoteStore>,
    builder: RowBuilder,
}

impl SyncEngine {
    pub fn new(ctx: SyncContext, store: Arc<dyn RemoteStore>) -> Self {
        let builder = ctx.row_builder();
        Self {
            ctx,
            store,
            builder,
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    pub fn build_rows(&self, records: &[RawRecord]) -> Vec<Row> {
        self.builder.build(records)
    }

    pub async fn whoami(&self) -> Result<RemoteUser> {
        Ok(self.store.whoami().await?)
    }

    pub async fn check_schema(&self) -> Result<SchemaReport> {
        let config = self.ctx.config();
        let schema = self.store.describe(config.database_id()).await?;
        Ok(check_schema(&schema, &config.properties))
    }

    /// Complete index or an error; a partial listing is never planned on
    pub async fn load_index(&self) -> Result<IdentityIndex> {
        let config = self.ctx.config();
        let outcome = build_index(
            self.store.as_ref(),
            config.database_id(),
            &config.properties,
            &config.sync.builtin_sentinel,
        )
        .await;

        match outcome.error {
            None => Ok(outcome.index),
            Some(error) if error.is_auth() => Err(error.into()),
            Some(error) => Err(SyncError::PartialIndex {
                fetched: outcome.index.len(),
                source: error,
            }),
        }
    }

    /// Plan without touching the remote
    pub async fn dry_run(&self, records: &[RawRecord]) -> Result<RunSummary> {
        self.whoami().await?;
        let (plan, stats, remote_rows) = self.plan(records).await?;
        info!(%stats, "Dry run planned");
        Ok(RunSummary {
            plan,
            stats,
            remote_rows,
            report: None,
        })
    }

    /// Plan, ask `confirm`, then execute
    pub async fn sync<C, N>(&self, records: &[RawRecord], confirm: C, notify: N) -> Result<RunSummary>
    where
        C: FnOnce(&PlanStats) -> bool,
        N: FnMut(&ItemOutcome),
    {
        self.whoami().await?;
        self.require_schema().await?;

        let (plan, stats, remote_rows) = self.plan(records).await?;
        let mut summary = RunSummary {
            plan,
            stats,
            remote_rows,
            report: None,
        };

        if stats.mutations() == 0 {
            info!(%stats, "Nothing to apply");
            return Ok(summary);
        }
        if !confirm(&stats) {
            info!("Sync declined");
            return Ok(summary);
        }

        let executor = Executor::new(self.ctx.clone(), Arc::clone(&self.store));
        summary.report = Some(executor.apply(&summary.plan, notify).await);
        Ok(summary)
    }

    /// Fill in missing identity keys on remote rows
    pub async fn backfill<C, N>(&self, confirm: C, notify: N) -> Result<BackfillSummary>
    where
        C: FnOnce(usize) -> bool,
        N: FnMut(&ItemOutcome),
    {
        self.whoami().await?;
        let index = self.load_index().await?;
        let items = plan_backfill(&index);
        info!(count = items.len(), "Backfill planned");

        if items.is_empty() || !confirm(items.len()) {
            return Ok(BackfillSummary {
                items,
                report: None,
            });
        }

        let report = apply_backfill(&self.ctx, &self.store, &items, notify).await;
        Ok(BackfillSummary {
            items,
            report: Some(report),
        })
    }

    async fn plan(&self, records: &[RawRecord]) -> Result<(Vec<PlanItem>, PlanStats, usize)> {
        let rows = self.build_rows(records);
        let index = self.load_index().await?;
        let options = PlanOptions::from(&self.ctx.config().sync);
        let (plan, stats) = compute_plan(&rows, &index, &options);
        Ok((plan, stats, index.len()))
    }

    async fn require_schema(&self) -> Result<()> {
        let report = self.check_schema().await?;
        for missing in report.missing() {
            warn!(field = missing.field, label = %missing.label, "Property missing on remote database");
        }
        let required = report.missing_required();
        if required.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Schema { missing: required })
        }
    }
}
