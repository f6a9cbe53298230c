//! Console summary and JSON report for a finished run.
use crate::engine::RunReport;
use crate::util::display_path;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// One line per verdict, failures with their long message, then totals.
pub fn write_summary(report: &RunReport, base: Option<&Path>, out: &mut impl Write) -> Result<()> {
    for result in &report.results {
        let resources: Vec<String> = result
            .resources
            .iter()
            .map(|path| display_path(path, base))
            .collect();
        let label = if result.status.is_pass() { "PASS" } else { "FAIL" };
        writeln!(out, "[{label}] {}: {}", resources.join(", "), result.status.short())?;
        if !result.status.is_pass() {
            for line in result.status.long().lines() {
                writeln!(out, "    {line}")?;
            }
            if !result.debug_info.command.is_empty() {
                writeln!(out, "    command: {}", result.debug_info.command)?;
            }
        }
    }
    for failure in &report.failures {
        let plugin = failure
            .plugin
            .map(|kind| format!(" [{kind}]"))
            .unwrap_or_default();
        writeln!(
            out,
            "[ERROR] {}{plugin}: {}",
            display_path(&failure.location, base),
            failure.message
        )?;
    }
    writeln!(
        out,
        "{} passed, {} failed, {} errors",
        report.passed(),
        report.failed(),
        report.failures.len()
    )?;
    Ok(())
}

/// Pretty JSON of the whole report.
pub fn write_json(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let bytes = serde_json::to_vec_pretty(report).context("serialize run report")?;
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
