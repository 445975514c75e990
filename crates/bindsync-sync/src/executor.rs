//! Executor: apply a plan to the remote store
//!
//! One call at a time, in plan order. The abort token is checked before each
//! item; an in-flight call is never interrupted. Failures are recorded per
//! item and never stop the run.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::SyncContext;
use crate::planner::{Operation, PlanItem};
use crate::properties::PayloadBuilder;
use crate::remote::RemoteStore;

/// Result of one plan item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created { id: String },
    Updated { id: String },
    Rebound { id: String },
    Skipped { operation: Operation },
    /// Create suppressed because this run already created the same row
    Duplicate,
    Failed { error: String },
    NotRun,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created { .. } => "created",
            Outcome::Updated { .. } => "updated",
            Outcome::Rebound { .. } => "rebound",
            Outcome::Skipped { .. } => "skipped",
            Outcome::Duplicate => "duplicate",
            Outcome::Failed { .. } => "failed",
            Outcome::NotRun => "not run",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created { id } | Outcome::Updated { id } | Outcome::Rebound { id } => {
                write!(f, "{} {}", self.label(), id)
            }
            Outcome::Skipped { operation } => write!(f, "{}", operation),
            Outcome::Failed { error } => write!(f, "failed: {}", error),
            _ => f.write_str(self.label()),
        }
    }
}

/// Outcome of one item, with enough of the row to report on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub position: usize,
    pub display_name: String,
    pub lhs: String,
    pub operation: Operation,
    pub outcome: Outcome,
}

/// Aggregate counts for one apply pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub items: Vec<ItemOutcome>,
    pub created: usize,
    pub updated: usize,
    pub rebound: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub not_run: usize,
    /// Stopped early on an abort request
    pub aborted: bool,
}

impl ApplyReport {
    pub fn succeeded(&self) -> usize {
        self.created + self.updated + self.rebound
    }

    pub(crate) fn push(&mut self, item: ItemOutcome) {
        match &item.outcome {
            Outcome::Created { .. } => self.created += 1,
            Outcome::Updated { .. } => self.updated += 1,
            Outcome::Rebound { .. } => self.rebound += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Duplicate => self.duplicates += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::NotRun => self.not_run += 1,
        }
        self.items.push(item);
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} rebound={} skipped={} duplicates={} failed={} not_run={}",
            self.created,
            self.updated,
            self.rebound,
            self.skipped,
            self.duplicates,
            self.failed,
            self.not_run
        )
    }
}

/// Rows that would land on the same remote record within one run
type GuardKey = (String, String, String);

pub struct Executor {
    ctx: SyncContext,
    store: Arc<dyn RemoteStore>,
}

impl Executor {
    pub fn new(ctx: SyncContext, store: Arc<dyn RemoteStore>) -> Self {
        Self { ctx, store }
    }

    /// Walk the plan in order, calling `notify` after every item
    pub async fn apply<F>(&self, plan: &[PlanItem], mut notify: F) -> ApplyReport
    where
        F: FnMut(&ItemOutcome),
    {
        let config = self.ctx.config();
        let payloads = PayloadBuilder::new(&config.properties, &config.sync);
        let op_delay = config.sync.op_delay();
        let mut created: HashSet<GuardKey> = HashSet::new();
        let mut report = ApplyReport::default();

        for (position, item) in plan.iter().enumerate() {
            if self.ctx.is_aborted() {
                info!(remaining = plan.len() - position, "Abort requested; stopping");
                report.aborted = true;
                for (rest_pos, rest) in plan.iter().enumerate().skip(position) {
                    let outcome = item_outcome(rest_pos, rest, Outcome::NotRun);
                    notify(&outcome);
                    report.push(outcome);
                }
                break;
            }

            let outcome = self
                .apply_item(item, &payloads, &mut created, op_delay)
                .await;
            let outcome = item_outcome(position, item, outcome);
            notify(&outcome);
            report.push(outcome);
        }

        info!(%report, "Plan applied");
        report
    }

    async fn apply_item(
        &self,
        item: &PlanItem,
        payloads: &PayloadBuilder<'_>,
        created: &mut HashSet<GuardKey>,
        op_delay: Duration,
    ) -> Outcome {
        let row = &item.row;
        let database_id = self.ctx.config().database_id();

        match item.operation {
            op if op.is_skip() => Outcome::Skipped { operation: op },
            Operation::Create => {
                let guard = (
                    row.identity_key.clone(),
                    row.display_name.clone(),
                    row.command_key(),
                );
                if created.contains(&guard) {
                    debug!(uid = %row.identity_key, "Duplicate create suppressed");
                    return Outcome::Duplicate;
                }

                let result = self
                    .store
                    .create(database_id, payloads.for_create(row, Utc::now()))
                    .await;
                pause(op_delay).await;
                match result {
                    Ok(id) => {
                        info!(uid = %row.identity_key, id = %id, "Created");
                        created.insert(guard);
                        Outcome::Created { id }
                    }
                    Err(e) => {
                        warn!(uid = %row.identity_key, "Create failed: {}", e);
                        Outcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Operation::Update | Operation::Rebind => {
                let Some(target) = item.matched_remote_id.as_deref() else {
                    warn!(uid = %row.identity_key, "No remote id to update");
                    return Outcome::Failed {
                        error: "plan item has no matched remote id".to_string(),
                    };
                };

                let rebind = item.operation == Operation::Rebind;
                let payload = if rebind {
                    payloads.for_rebind(row, Utc::now())
                } else {
                    payloads.for_update(row)
                };
                let result = self.store.update(target, payload).await;
                pause(op_delay).await;
                match result {
                    Ok(id) if rebind => {
                        info!(uid = %row.identity_key, id = %id, "Rebound");
                        Outcome::Rebound { id }
                    }
                    Ok(id) => {
                        info!(uid = %row.identity_key, id = %id, "Updated");
                        Outcome::Updated { id }
                    }
                    Err(e) => {
                        warn!(uid = %row.identity_key, id = %target, "Update failed: {}", e);
                        Outcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            op => Outcome::Skipped { operation: op },
        }
    }
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn item_outcome(position: usize, item: &PlanItem, outcome: Outcome) -> ItemOutcome {
    ItemOutcome {
        position,
        display_name: item.row.display_name.clone(),
        lhs: item.row.lhs_normalized.clone(),
        operation: item.operation,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = ApplyReport::default();
        let base = ItemOutcome {
            position: 0,
            display_name: "x".into(),
            lhs: "x".into(),
            operation: Operation::Create,
            outcome: Outcome::Created { id: "1".into() },
        };
        report.push(base.clone());
        report.push(ItemOutcome {
            outcome: Outcome::Failed { error: "boom".into() },
            ..base.clone()
        });
        report.push(ItemOutcome {
            outcome: Outcome::NotRun,
            ..base
        });
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.not_run, 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.items.len(), 3);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Created { id: "p1".into() }.to_string(), "created p1");
        assert_eq!(
            Outcome::Skipped { operation: Operation::SkipSame }.to_string(),
            "skip_same"
        );
        assert_eq!(Outcome::NotRun.to_string(), "not run");
    }
}
