// ABOUTME: Env push command: writes each role's env file to its hosts.
// ABOUTME: Secret values travel redacted in logs and land with mode 600.

use super::connect::Connections;
use cutover::config::Config;
use cutover::deploy::Target;
use cutover::docker::App;
use cutover::error::Result;
use cutover::executor::ExecOptions;
use cutover::output::Output;
use cutover::types::Version;

pub async fn env_push(config: Config, version: Version, output: Output) -> Result<()> {
    let hosts = config.hosts()?;
    let connections = Connections::open(&config, &hosts, &output).await?;

    let result = push_env_files(&config, &version, &connections.targets(&hosts), &output).await;
    connections.close().await;
    result?;

    output.success(&format!("Pushed env files to {} host(s)", hosts.len()));
    Ok(())
}

/// Write the env file of every target's role on its host.
pub(super) async fn push_env_files(
    config: &Config,
    version: &Version,
    targets: &[Target],
    output: &Output,
) -> Result<()> {
    for target in targets {
        let role = config.role(&target.host.role)?;
        let app = App::new(config, &role, version);
        output.progress(&format!(
            "  → Writing {} on {}",
            app.env_file_path(),
            target.host.address
        ));
        target
            .executor
            .execute(&app.push_env_file()?, ExecOptions::default())
            .await?;
    }
    Ok(())
}
