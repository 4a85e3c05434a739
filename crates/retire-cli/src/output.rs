//! Human-readable and JSON rendering of run reports.

use anyhow::Result;
use bytesize::ByteSize;
use serde::Serialize;

use retire_engine::{Disposition, IngestReport, RepackReport, RetireReport};

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn retire_summary(report: &RetireReport, dry_run: bool) -> String {
    let mut out = String::new();
    if dry_run {
        let would = report
            .outcomes
            .iter()
            .filter(|o| o.disposition == Disposition::WouldArchive)
            .collect::<Vec<_>>();
        for outcome in &would {
            out.push_str(&format!(
                "  would retire {}/{}\n",
                outcome.origin_group, outcome.identifier
            ));
        }
        out.push_str(&format!("Would retire:      {}\n", would.len()));
    } else {
        out.push_str(&format!(
            "Retired:           {} ({})\n",
            report.moved,
            ByteSize::b(report.bytes_moved)
        ));
    }
    out.push_str(&format!("Already archived:  {}\n", report.duplicate_skipped));
    out.push_str(&format!("Already moved:     {}\n", report.already_moved));
    out.push_str(&format!("Kept current:      {}\n", report.current));
    out.push_str(&format!("Kept (still live): {}\n", report.still_live));
    if !report.warnings.is_empty() {
        out.push_str(&format!("Warnings:          {}\n", report.warnings.len()));
    }
    push_errors(&mut out, &report.errors);
    out
}

pub fn repack_summary(report: &RepackReport, dry_run: bool) -> String {
    let mut out = String::new();
    let verb = if dry_run { "Would seal" } else { "Sealed" };
    for volume in &report.volumes {
        out.push_str(&format!(
            "  {verb} volume{} with {} items ({})\n",
            volume.id,
            volume.members.len(),
            ByteSize::b(volume.used_bytes)
        ));
    }
    let total: u64 = report.volumes.iter().map(|v| v.used_bytes).sum();
    out.push_str(&format!(
        "Volumes:           {} ({})\n",
        report.volume_count(),
        ByteSize::b(total)
    ));
    push_errors(&mut out, &report.errors);
    out
}

pub fn ingest_summary(report: &IngestReport) -> String {
    let mut out = format!(
        "volume{}: {} cataloged, {} already present",
        report.volume_id, report.inserted, report.already_present
    );
    if report.rebound > 0 {
        out.push_str(&format!(", {} rebound", report.rebound));
    }
    out.push('\n');
    push_errors(&mut out, &report.errors);
    out
}

fn push_errors(out: &mut String, errors: &[retire_core::RetireError]) {
    if errors.is_empty() {
        return;
    }
    out.push_str(&format!("Errors:            {}\n", errors.len()));
    for err in errors {
        out.push_str(&format!("  - {err}\n"));
    }
}
