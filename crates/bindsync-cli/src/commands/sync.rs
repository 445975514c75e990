// Live sync: plan, confirm, execute

use std::path::PathBuf;

use super::{abort_on_ctrl_c, confirm, load_config, open_engine, read_records, Command};
use crate::error::{CliError, CliResult};
use crate::output::{print_success, print_warning, OutputStyle};

pub struct SyncCommand {
    pub config: Option<PathBuf>,
    pub input: PathBuf,
    pub format: Option<String>,
    pub assume_yes: bool,
}

#[async_trait::async_trait]
impl Command for SyncCommand {
    async fn execute(&self) -> CliResult<()> {
        let records = read_records(&self.input, self.format.as_deref())?;
        let engine = open_engine(load_config(self.config.as_deref())?)?;
        abort_on_ctrl_c(&engine);

        let style = OutputStyle::default();
        let summary = engine
            .sync(
                &records,
                |stats| {
                    println!("{}", style.section("Pending changes"));
                    println!("{}", style.plan_stats(stats));
                    confirm(
                        &format!("Apply {} changes?", stats.mutations()),
                        self.assume_yes,
                    )
                },
                |item| println!("{}", style.outcome(item)),
            )
            .await?;

        let Some(report) = summary.report else {
            if summary.stats.mutations() == 0 {
                print_success("Remote is already up to date");
            } else {
                print_warning("Nothing applied");
            }
            return Ok(());
        };

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
