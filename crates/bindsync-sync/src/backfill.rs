//! Identity backfill: write computed identity keys into remote rows that
//! have none stored

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::context::SyncContext;
use crate::executor::{pause, ApplyReport, ItemOutcome, Outcome};
use crate::index::IdentityIndex;
use crate::planner::Operation;
use crate::properties::PayloadBuilder;
use crate::remote::RemoteStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackfillItem {
    pub remote_id: String,
    pub display_name: String,
    pub identity_key: String,
}

/// Records with an empty identity column but a derivable key, in fetch order
pub fn plan_backfill(index: &IdentityIndex) -> Vec<BackfillItem> {
    index
        .records()
        .iter()
        .filter(|r| r.identity_key_stored.is_none())
        .filter_map(|r| {
            r.identity_key_synthetic.as_ref().map(|key| BackfillItem {
                remote_id: r.remote_id.clone(),
                display_name: r.display_name.clone(),
                identity_key: key.clone(),
            })
        })
        .collect()
}

/// Same cancellation, delay and failure rules as plan execution
pub async fn apply_backfill<F>(
    ctx: &SyncContext,
    store: &Arc<dyn RemoteStore>,
    items: &[BackfillItem],
    mut notify: F,
) -> ApplyReport
where
    F: FnMut(&ItemOutcome),
{
    let config = ctx.config();
    let payloads = PayloadBuilder::new(&config.properties, &config.sync);
    let op_delay = config.sync.op_delay();
    let mut report = ApplyReport::default();

    for (position, item) in items.iter().enumerate() {
        let outcome = if report.aborted || ctx.is_aborted() {
            report.aborted = true;
            Outcome::NotRun
        } else {
            let result = store
                .update(&item.remote_id, payloads.identity_only(&item.identity_key))
                .await;
            pause(op_delay).await;
            match result {
                Ok(id) => Outcome::Updated { id },
                Err(e) => {
                    warn!(id = %item.remote_id, "Backfill failed: {}", e);
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        let outcome = ItemOutcome {
            position,
            display_name: item.display_name.clone(),
            lhs: item.identity_key.clone(),
            operation: Operation::Update,
            outcome,
        };
        notify(&outcome);
        report.push(outcome);
    }

    info!(%report, "Backfill applied");
    report
}
