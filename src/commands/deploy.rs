// ABOUTME: Deploy command implementation.
// ABOUTME: Connects to every host, pushes env files, then runs the release.

use super::connect::Connections;
use super::env::push_env_files;
use cutover::config::Config;
use cutover::deploy::{Release, ReleaseReport};
use cutover::error::{Error, Result};
use cutover::output::Output;
use cutover::types::Version;

/// Deploy `version` to every host in the configuration.
pub async fn deploy(config: Config, version: Version, output: Output) -> Result<()> {
    let hosts = config.hosts()?;
    output.progress(&format!(
        "Deploying {} version {} to {} host(s)",
        config.service,
        version.abbreviated(),
        hosts.len()
    ));

    let connections = Connections::open(&config, &hosts, &output).await?;
    let targets = connections.targets(&hosts);

    let result = match push_env_files(&config, &version, &targets, &output).await {
        Ok(()) => {
            output.progress("  → Booting containers...");
            Release::new(&config, &version).run(targets).await
        }
        Err(e) => Err(e),
    };
    connections.close().await;
    let report = result?;

    print_outcomes(&report, &output);

    if report.is_success() {
        output.success(&format!("Deployed version {}", version.abbreviated()));
        Ok(())
    } else {
        Err(Error::ReleaseFailed {
            failed: report.failures().count(),
            total: report.outcomes.len(),
        })
    }
}

fn print_outcomes(report: &ReleaseReport, output: &Output) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(boot) => {
                let replaced = boot
                    .old_container
                    .as_ref()
                    .map(|old| format!(" (replaced {})", old.name))
                    .unwrap_or_default();
                output.progress(&format!(
                    "  ✓ {} [{}] {}{}",
                    outcome.host, outcome.role, boot.container, replaced
                ));
            }
            Err(e) => output.failure(&format!("  ✗ {} [{}] {}", outcome.host, outcome.role, e)),
        }
    }
}
