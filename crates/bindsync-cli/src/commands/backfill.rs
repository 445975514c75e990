// Identity backfill: write computed identity keys into rows missing them

use std::path::PathBuf;

use super::{abort_on_ctrl_c, confirm, load_config, open_engine, Command};
use crate::error::{CliError, CliResult};
use crate::output::{print_success, print_warning, OutputStyle};

pub struct BackfillCommand {
    pub config: Option<PathBuf>,
    pub assume_yes: bool,
}

#[async_trait::async_trait]
impl Command for BackfillCommand {
    async fn execute(&self) -> CliResult<()> {
        let engine = open_engine(load_config(self.config.as_deref())?)?;
        abort_on_ctrl_c(&engine);

        let style = OutputStyle::default();
        let summary = engine
            .backfill(
                |count| confirm(&format!("Write identity keys to {} rows?", count), self.assume_yes),
                |item| println!("{}", style.outcome(item)),
            )
            .await?;

        match summary.report {
            None if summary.items.is_empty() => {
                print_success("Every remote row already has an identity key");
                Ok(())
            }
            None => {
                print_warning("Nothing applied");
                Ok(())
            }
            Some(report) => {
                println!("{}", style.report(&report));
                if report.failed > 0 {
                    return Err(CliError::PartialFailure {
                        failed: report.failed,
                        attempted: report.succeeded() + report.failed,
                    });
                }
                Ok(())
            }
        }
    }
}
