// ABOUTME: Resolves the version a deploy ships.
// ABOUTME: An explicit flag wins; otherwise the git HEAD, marked when the tree is dirty.

use cutover::error::{Error, Result};
use cutover::types::Version;
use tokio::process::Command;

/// The version to deploy: `explicit` if given, else the current commit.
pub async fn resolve_version(explicit: Option<&str>) -> Result<Version> {
    if let Some(version) = explicit {
        return Ok(Version::new(version)?);
    }

    let commit = git(&["rev-parse", "HEAD"]).await?;
    let status = git(&["status", "--porcelain"]).await?;

    if status.is_empty() {
        Ok(Version::new(&commit)?)
    } else {
        tracing::warn!("working tree has uncommitted changes");
        Ok(Version::uncommitted(&commit)?)
    }
}

pub async fn print_version(explicit: Option<&str>) -> Result<()> {
    let version = resolve_version(explicit).await?;
    println!("{}", version.abbreviated());
    Ok(())
}

async fn git(args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .output()
        .await
        .map_err(|e| Error::Version(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        return Err(Error::Version(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
