//! Output formatting module

use std::path::Path;

use chrono::NaiveDate;
use plategate_infra::SweepReport;
use plategate_types::{AccessDecision, AuditEvent, OutputFormat, PlateRecord, RecognitionResult, Result};
use serde_json::json;

pub fn output_recognition(
    output_format: OutputFormat,
    image: &Path,
    result: &RecognitionResult,
    decision: &AccessDecision,
) -> Result<()> {
    let (plate, reason) = match result {
        RecognitionResult::Recognized(plate) => (Some(plate.as_str()), None),
        RecognitionResult::NotRecognized(reason) => (None, Some(reason.to_string())),
    };

    if output_format == OutputFormat::Json {
        let record = match decision {
            AccessDecision::Granted(record) => Some(record),
            AccessDecision::Denied(_) => None,
        };
        let value = json!({
            "image": image.display().to_string(),
            "plate": plate,
            "reason": reason,
            "granted": decision.is_granted(),
            "record": record,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\nRecognition Result");
    println!("==================");
    println!("Image:    {}", image.display());
    match plate {
        Some(plate) => println!("Plate:    {}", plate),
        None => println!("Plate:    (not recognized: {})", reason.unwrap_or_default()),
    }
    match decision {
        AccessDecision::Granted(record) => {
            println!("Decision: GRANTED");
            println!("Model:    {}", record.model);
            println!("Owner:    {}", record.owner);
        }
        AccessDecision::Denied(plate) => println!("Decision: DENIED ({})", plate),
    }
    Ok(())
}

pub fn output_check(
    output_format: OutputFormat,
    raw: &str,
    normalized: Option<&str>,
    record: Option<&PlateRecord>,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        let value = json!({
            "input": raw,
            "normalized": normalized,
            "listed": record.is_some(),
            "record": record,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Input:      {}", raw);
    println!("Normalized: {}", normalized.unwrap_or("(empty)"));
    match record {
        Some(record) => println!("Listed:     yes ({}, {})", record.model, record.owner),
        None => println!("Listed:     no"),
    }
    Ok(())
}

pub fn output_plates(output_format: OutputFormat, records: &[&PlateRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("Allow-list is empty");
        return Ok(());
    }

    println!("{:<12} {:<20} {}", "Plate", "Model", "Owner");
    println!("{}", "-".repeat(52));
    for record in records {
        println!("{:<12} {:<20} {}", record.plate, record.model, record.owner);
    }
    println!("\n{} plate(s)", records.len());
    Ok(())
}

pub fn output_sweep(output_format: OutputFormat, root: &Path, report: &SweepReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        let value = json!({
            "photos_dir": root.display().to_string(),
            "removed": report.removed,
            "kept": report.kept,
            "skipped": report.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Photo retention sweep: {}", root.display());
    println!("  Removed: {}", report.removed);
    println!("  Kept:    {}", report.kept);
    println!("  Skipped: {}", report.skipped);
    Ok(())
}

pub fn output_audit(output_format: OutputFormat, date: NaiveDate, events: &[AuditEvent]) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(events)?);
        return Ok(());
    }

    println!("Audit log for {}", date.format("%Y-%m-%d"));
    if events.is_empty() {
        println!("(no events)");
        return Ok(());
    }

    println!(
        "{:<9} {:<15} {:<16} {:<20} {}",
        "Time", "Status", "Plate", "Model", "Owner"
    );
    println!("{}", "-".repeat(80));
    for event in events {
        println!(
            "{:<9} {:<15} {:<16} {:<20} {}",
            event.timestamp.format("%H:%M:%S"),
            event.status.label(),
            event.plate,
            event.model,
            event.owner
        );
        if let Some(detail) = &event.detail {
            println!("          {}", detail);
        }
    }
    Ok(())
}
