// ABOUTME: Command module aggregator for the rokka CLI.
// ABOUTME: Resolves configuration once and dispatches to the command handlers.

mod login;
mod sourceimages;

use crate::cli::{Cli, Commands};
use rokka::config::Config;
use rokka::error::Result;
use rokka::output::Output;

pub async fn run(cli: Cli, mut output: Output) -> Result<()> {
    let Cli {
        config: config_path,
        api_key,
        api_address,
        command,
        ..
    } = cli;

    match command {
        Commands::Login { force } => {
            // The file being written need not exist yet, so only the key
            // sources are consulted.
            let api_key = Config::default()
                .with_env_overrides()
                .with_overrides(api_key, None)
                .api_key;
            login::login(config_path.as_deref(), api_key, force, &output)
        }
        Commands::SourceImages { command } => {
            let config = Config::discover(config_path.as_deref())?
                .with_env_overrides()
                .with_overrides(api_key, api_address);
            config.validate()?;
            tracing::debug!("using {:?}", config);

            output.start_timer();
            sourceimages::run(&config, command, &output).await
        }
    }
}
