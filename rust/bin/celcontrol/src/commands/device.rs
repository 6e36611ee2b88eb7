//! Stock entry and inventory listing.

use anyhow::Result;

use stock::model::Device;
use stock::{DeviceForm, StockView};

use super::{Session, cell, print_json, print_refreshed_stock};

/// `celcontrol device add`
pub fn add(session: &Session, model: &str, imei: &str) -> Result<()> {
    let device = session.service.add_device(&DeviceForm {
        model: model.to_string(),
        imei: imei.to_string(),
    })?;

    if session.json() {
        return print_json(&device);
    }
    println!("Device \"{}\" added to stock.", device.model);
    println!("  ID:   {}", device.id);
    println!("  IMEI: {}", device.imei);
    print_refreshed_stock(session);
    Ok(())
}

/// `celcontrol device list`
pub fn list(session: &Session, search: Option<&str>, available_only: bool) -> Result<()> {
    let view = session.service.load_view()?;
    let devices = select(&view, search.unwrap_or(""), available_only);

    if session.json() {
        return print_json(&devices);
    }

    if devices.is_empty() {
        if view.devices().is_empty() {
            println!("No devices registered.");
        } else {
            println!("No results for the search.");
        }
        return Ok(());
    }

    print_table(&devices);
    Ok(())
}

fn select<'a>(view: &'a StockView, search: &str, available_only: bool) -> Vec<&'a Device> {
    view.filter_devices(search)
        .into_iter()
        .filter(|d| !available_only || d.is_available())
        .collect()
}

fn print_table(devices: &[&Device]) {
    println!("{:32} {:28} {:17} {:10}", "ID", "MODEL", "IMEI", "STATUS");
    for d in devices {
        println!(
            "{:32} {:28} {:17} {:10}",
            d.id,
            cell(&d.model, 28),
            d.imei,
            d.status.to_string()
        );
    }
}
