//! External command execution shared by the side-effect services

use tokio::process::Command;
use tracing::{debug, info};

/// Run `program` with `args` and fail on a non-zero exit status
pub async fn run_command(program: &str, args: &[&str]) -> Result<(), String> {
    debug!("Running {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", program, stderr.trim()));
    }

    Ok(())
}

/// Check that `program` can be spawned at all
pub async fn check_command_available(program: &str) -> Result<(), String> {
    Command::new(program)
        .arg("--version")
        .output()
        .await
        .map_err(|_| format!("{} is not available on this system", program))?;

    info!("{} is available", program);
    Ok(())
}
