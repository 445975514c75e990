// Show which account the configured token belongs to

use std::path::PathBuf;

use super::{load_config, open_engine, Command};
use crate::error::CliResult;
use crate::output::OutputStyle;

pub struct WhoamiCommand {
    pub config: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Command for WhoamiCommand {
    async fn execute(&self) -> CliResult<()> {
        let engine = open_engine(load_config(self.config.as_deref())?)?;
        let user = engine.whoami().await?;

        let style = OutputStyle::default();
        println!("{}", style.key_value("id", &user.id));
        println!("{}", style.key_value("name", user.name.as_deref().unwrap_or("-")));
        println!("{}", style.key_value("type", user.kind.as_deref().unwrap_or("-")));
        Ok(())
    }
}
