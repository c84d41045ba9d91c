use crate::error::{CliResult, IntoCliResult};
use issuetracker::ServerConfig;
use std::path::Path;

/// Render the effective configuration, or the example file, as YAML
pub fn render_config(example: bool, config_file: Option<&Path>) -> CliResult<String> {
    if example {
        return Ok(ServerConfig::example_yaml_config().to_string());
    }

    let config = ServerConfig::load(config_file).cli_validation_error()?;
    config.validate().cli_validation_error()?;
    serde_yaml::to_string(&config).cli_general_error()
}

/// `issuetracker config`
pub fn run_config(example: bool, config_file: Option<&Path>) -> CliResult<()> {
    print!("{}", render_config(example, config_file)?);
    Ok(())
}
