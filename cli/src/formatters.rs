//! Output formatting utilities

use anyhow::Result;
use colored::*;
use std::io::Write;
use tabwriter::TabWriter;

use fleet_engine::domain::{
    DeployState, DeploymentOutcome, Inventory, StepStatus, VerificationSummary,
};

/// Render the inventory as an aligned table
pub fn render_inventory_table(inventory: &Inventory) -> Result<String> {
    let mut tw = TabWriter::new(vec![]);
    writeln!(
        tw,
        "NAME\tHOSTNAME\tIP\tENVIRONMENT\tROLE\tTYPE\tPORTS"
    )?;
    for server in inventory.iter() {
        let ports: Vec<String> = server
            .metrics_ports()
            .iter()
            .map(|p| p.to_string())
            .collect();
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            server.name,
            server.hostname,
            server.ip,
            server.environment,
            server.role,
            server
                .monitoring_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if ports.is_empty() {
                "-".to_string()
            } else {
                ports.join(",")
            }
        )?;
    }
    tw.flush()?;
    let bytes = tw
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to render table: {}", e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Format a deploy state with appropriate color
pub fn format_state(state: DeployState) -> ColoredString {
    let text = state.to_string();
    match state {
        DeployState::Done => text.green(),
        DeployState::Failed(_) => text.red(),
        DeployState::Pending => text.yellow(),
        _ => text.normal(),
    }
}

/// Pad before colorizing: ANSI escapes are invisible but count toward a
/// `{:<N}` field width, so colorized text must already be its final width
fn pad_status(status: StepStatus) -> String {
    format!("{:<18}", status.to_string())
}

fn format_step_status(status: StepStatus) -> ColoredString {
    let text = pad_status(status);
    match status {
        StepStatus::Completed | StepStatus::AlreadySatisfied => text.green(),
        StepStatus::Skipped => text.yellow(),
        StepStatus::Failed => text.red(),
    }
}

/// Render per-host deploy outcomes with their step detail.
/// Failure reasons are always included, never swallowed.
pub fn render_outcomes(outcomes: &[DeploymentOutcome]) -> Result<String> {
    let mut out = String::new();
    for outcome in outcomes {
        out.push_str(&format!(
            "{}  [{}]\n",
            outcome.server.bold(),
            format_state(outcome.state)
        ));
        for step in &outcome.steps {
            out.push_str(&format!(
                "    {:<24} {} {}\n",
                step.step.to_string(),
                format_step_status(step.status),
                step.message
            ));
        }
        if outcome.state == DeployState::Pending && outcome.steps.is_empty() {
            out.push_str("    not dispatched (run cancelled)\n");
        }
    }

    let failed: Vec<_> = outcomes
        .iter()
        .filter_map(|o| o.failed_step().map(|s| (o.server.as_str(), s)))
        .collect();
    out.push_str(&format!(
        "Deployed {}/{} host(s)",
        outcomes.iter().filter(|o| o.overall_success()).count(),
        outcomes.len()
    ));
    if failed.is_empty() {
        out.push('\n');
    } else {
        let detail: Vec<String> = failed
            .iter()
            .map(|(server, step)| format!("{} ({})", server, step))
            .collect();
        out.push_str(&format!("; failed: {}\n", detail.join(", ")));
    }
    Ok(out)
}

/// Render the verifier summary
pub fn render_verification(summary: &VerificationSummary) -> String {
    let mut out = String::new();
    for failure in &summary.failures {
        out.push_str(&format!(
            "    {} {}: {}\n",
            failure.server.bold(),
            failure.capability.to_string().red(),
            failure.reason
        ));
    }
    out.push_str(&format!(
        "Healthy {}/{} server(s), {} failing endpoint(s)\n",
        summary.healthy,
        summary.total,
        summary.failures.len()
    ));
    out
}

/// The unambiguous final line every deploy run ends with
pub fn render_verdict(success: bool) -> ColoredString {
    if success {
        "DEPLOYMENT SUCCEEDED".green().bold()
    } else {
        "DEPLOYMENT FAILED".red().bold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_column_width_is_uniform() {
        for status in [
            StepStatus::Completed,
            StepStatus::AlreadySatisfied,
            StepStatus::Skipped,
            StepStatus::Failed,
        ] {
            assert_eq!(pad_status(status).len(), 18, "{:?}", status);
        }
    }
}
