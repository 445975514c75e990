// Schema check against the configured property labels

use std::path::PathBuf;

use super::{load_config, open_engine, Command};
use crate::error::CliResult;
use crate::output::OutputStyle;

pub struct DescribeCommand {
    pub config: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Command for DescribeCommand {
    async fn execute(&self) -> CliResult<()> {
        let engine = open_engine(load_config(self.config.as_deref())?)?;
        let report = engine.check_schema().await?;
        println!("{}", OutputStyle::default().schema(&report));
        Ok(())
    }
}
