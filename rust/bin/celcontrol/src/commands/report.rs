//! Read-only reports: export, consistency check, summary, status.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;

use stock::export::{render_sales_csv, write_report};
use stock::{ExportError, find_inconsistencies};

use super::{Session, print_json};

/// `celcontrol export`
pub fn export(session: &Session, dir: &Path) -> Result<()> {
    let tz = session.context.utc_offset()?;
    let sales = session.service.list_sales()?;

    let csv = match render_sales_csv(&sales, tz) {
        Ok(csv) => csv,
        Err(ExportError::NothingToExport) => {
            println!("Nothing to export: no sales registered.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let today = Utc::now().with_timezone(&tz).date_naive();
    let path = write_report(dir, today, &csv)?;

    if session.json() {
        return print_json(&json!({ "path": path, "sales": sales.len() }));
    }
    println!("Exported {} sales to {}", sales.len(), path.display());
    Ok(())
}

/// `celcontrol check`. Returns whether the store is consistent.
pub fn check(session: &Session) -> Result<bool> {
    let view = session.service.load_view()?;
    let found = find_inconsistencies(view.devices(), view.sales());

    if session.json() {
        print_json(&found)?;
        return Ok(found.is_empty());
    }
    if found.is_empty() {
        println!(
            "OK: {} devices, {} sales, no inconsistencies.",
            view.devices().len(),
            view.sales().len()
        );
        return Ok(true);
    }

    println!("Found {} inconsistencies:", found.len());
    for item in &found {
        println!("  - {item}");
    }
    Ok(false)
}

/// `celcontrol summary`
pub fn summary(session: &Session) -> Result<()> {
    let summary = session.service.load_view()?.summary();

    if session.json() {
        return print_json(&summary);
    }
    println!("Available devices:  {}", summary.available);
    println!("Sold devices:       {}", summary.sold);
    println!("Sales:              {}", summary.sales);
    println!("Down payment total: {}", summary.down_payment_total.normalize());
    Ok(())
}

/// `celcontrol status`: connectivity check against the context's store.
pub fn status(session: &Session) -> Result<()> {
    let devices = session.service.list_devices()?;

    if session.json() {
        return print_json(&json!({
            "context": session.context.name,
            "store": session.context.store.describe(),
            "devices": devices.len(),
            "ok": true,
        }));
    }
    println!("Context: {}", session.context.name);
    println!("Store:   {}", session.context.store.describe());
    println!("Status:  OK ({} devices)", devices.len());
    Ok(())
}
