// Dry run: build the plan and show it, never mutating the remote

use std::path::PathBuf;

use super::{load_config, open_engine, read_records, Command};
use crate::error::{CliError, CliResult};
use crate::output::{print_info, OutputStyle};

pub struct PlanCommand {
    pub config: Option<PathBuf>,
    pub input: PathBuf,
    pub format: Option<String>,
    pub json: bool,
    pub show_skips: bool,
}

#[async_trait::async_trait]
impl Command for PlanCommand {
    async fn execute(&self) -> CliResult<()> {
        let records = read_records(&self.input, self.format.as_deref())?;
        let engine = open_engine(load_config(self.config.as_deref())?)?;
        let summary = engine.dry_run(&records).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::Internal(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        let style = OutputStyle::default();
        println!("{}", style.plan(&summary.plan, &summary.stats, self.show_skips));
        print_info(&format!(
                "{} rows planned against {} remote rows; nothing was changed",
                summary.stats.total(),
                summary.remote_rows
            ));
        Ok(())
    }
}
