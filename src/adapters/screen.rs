use std::process::Command;

fn runcmd(cmd: &str) {
    tracing::info!("running: {}", cmd);
    let mut parts = cmd.split_whitespace();
    let Some(program) = parts.next() else {
        return;
    };
    match Command::new(program).args(parts).status() {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::warn!("{} exited with {}", cmd, status),
        Err(e) => tracing::warn!("{} failed to start: {}", cmd, e),
    }
}

/// Disable blanking and force the installation's screen on. Failures are
/// warnings only; bench setups may have no X at all.
pub fn screen_on() {
    runcmd("xset s off");
    runcmd("xset dpms force on");
    runcmd("xset dpms 0 0 0");
}
