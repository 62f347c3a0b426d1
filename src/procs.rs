//! Process utilities: list listening TCP sockets and terminate by port.
//!
//! Shell-out collaborators with no state of their own. Output parsing lives
//! in pure functions so it can be tested without spawning anything.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use tokio::process::Command;

/// Lists processes with listening TCP ports, grouped by process name.
pub async fn list_processes() -> Result<String> {
    if cfg!(target_os = "windows") {
        let output = Command::new("netstat")
            .args(["-ano"])
            .output()
            .await
            .context("failed to run netstat")?;
        Ok(render_windows_listing(&String::from_utf8_lossy(
            &output.stdout,
        )))
    } else {
        let output = Command::new("lsof")
            .args(["-iTCP", "-sTCP:LISTEN", "-n", "-P"])
            .output()
            .await
            .context("failed to run lsof")?;
        Ok(render_unix_listing(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

/// Terminates whatever listens on `port`.
pub async fn kill_process(port: u16) -> Result<String> {
    let pids = if cfg!(target_os = "windows") {
        let output = Command::new("netstat")
            .args(["-ano"])
            .output()
            .await
            .context("failed to run netstat")?;
        windows_pids_for_port(&String::from_utf8_lossy(&output.stdout), port)
    } else {
        let target = format!(":{port}");
        let output = Command::new("lsof")
            .args(["-ti", target.as_str()])
            .output()
            .await
            .context("failed to run lsof")?;
        String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };

    if pids.is_empty() {
        return Ok(format!("No process found listening on port {port}."));
    }

    for pid in &pids {
        let status = if cfg!(target_os = "windows") {
            Command::new("taskkill")
                .args(["/F", "/PID", pid.as_str()])
                .status()
                .await
                .context("failed to run taskkill")?
        } else {
            Command::new("kill")
                .args(["-9", pid.as_str()])
                .status()
                .await
                .context("failed to run kill")?
        };
        if !status.success() {
            anyhow::bail!("could not terminate pid {pid}");
        }
    }

    Ok(format!(
        "✓ Process(es) on port {port} terminated successfully."
    ))
}

/// Parses `lsof -iTCP -sTCP:LISTEN -n -P` output: one process name per
/// group, listing the ports it listens on.
fn render_unix_listing(stdout: &str) -> String {
    let mut processes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in stdout.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 9 {
            continue;
        }
        let name = parts[0];
        let Some(port) = parts[8].rsplit(':').next() else {
            continue;
        };
        if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
            processes
                .entry(name.to_string())
                .or_default()
                .push(port.to_string());
        }
    }

    let mut out = String::from("# Running Processes\n\n");
    if processes.is_empty() {
        out.push_str("No processes found.\n");
        return out;
    }
    out.push_str("## Processes by port:\n");
    for (name, ports) in &processes {
        out.push_str(&format!("\n### {name}\n"));
        for port in ports {
            out.push_str(&format!("- Port {port}\n"));
        }
    }
    out
}

/// Parses `netstat -ano` output into the set of listening ports.
fn render_windows_listing(stdout: &str) -> String {
    let mut ports: BTreeSet<u16> = BTreeSet::new();
    for line in stdout.lines().filter(|line| line.contains("LISTENING")) {
        if let Some(port) = listening_port(line) {
            ports.insert(port);
        }
    }

    let mut out = String::from("# Running Processes\n\n");
    if ports.is_empty() {
        out.push_str("No processes found.\n");
        return out;
    }
    out.push_str("## Ports in use:\n");
    for port in &ports {
        out.push_str(&format!("- Port {port}\n"));
    }
    out
}

/// First `:<digits>` sequence in a netstat line.
fn listening_port(line: &str) -> Option<u16> {
    let (_, rest) = line.split_once(':')?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// PIDs of netstat entries listening on `port`.
fn windows_pids_for_port(stdout: &str, port: u16) -> Vec<String> {
    let needle = format!(":{port}");
    let mut pids: BTreeSet<String> = BTreeSet::new();
    for line in stdout.lines().filter(|line| line.contains(&needle)) {
        if let Some(pid) = line.split_whitespace().last() {
            if pid.chars().all(|c| c.is_ascii_digit()) {
                pids.insert(pid.to_string());
            }
        }
    }
    pids.into_iter().collect()
}
