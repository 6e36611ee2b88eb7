//! Sale registration, listing, and status repair.

use anyhow::Result;
use serde_json::json;

use celcontrol_core::ServiceError;
use stock::model::{Channel, SaleRecord};
use stock::{SaleError, SaleForm, StatusRepair};

use super::{Session, cell, print_json, print_refreshed_stock};

/// Raw sale flags as given on the command line.
pub struct RegisterArgs {
    pub device: String,
    pub client: String,
    pub phone: String,
    pub channel: String,
    pub down_payment: String,
}

/// `celcontrol sale register`
pub fn register(session: &Session, args: RegisterArgs) -> Result<()> {
    let form = SaleForm {
        device_id: args.device,
        client_name: args.client,
        client_phone: args.phone,
        channel: canonical_channel(args.channel),
        down_payment: args.down_payment,
    };

    let receipt = match session.service.register_sale(&form) {
        Ok(receipt) => receipt,
        Err(err) => {
            if let SaleError::PartialSale { sale, .. } = &err {
                eprintln!("Sale {} was recorded, but the device is still marked available.", sale.id);
                eprintln!("Do not register it again. Run:");
                eprintln!("  celcontrol sale retry-status {}", sale.device_id);
            }
            return Err(ServiceError::from(err).into());
        }
    };

    let sale = &receipt.sale;
    if session.json() {
        return print_json(sale);
    }
    println!("Sale registered.");
    println!("  ID:           {}", sale.id);
    println!("  Device:       {}", sale.device_id);
    println!("  Client:       {} ({})", sale.client_name, sale.client_phone);
    println!("  Channel:      {}", sale.channel);
    println!("  Down payment: {}", sale.down_payment.normalize());
    print_refreshed_stock(session);
    Ok(())
}

/// Known channels are stored with their usual label ("whatsapp" becomes
/// "WhatsApp"); anything else is kept as typed.
fn canonical_channel(raw: String) -> String {
    match raw.parse::<Channel>() {
        Ok(channel) => channel.to_string(),
        Err(_) => raw,
    }
}

/// `celcontrol sale list`
pub fn list(session: &Session) -> Result<()> {
    let sales = session.service.list_sales()?;

    if session.json() {
        return print_json(&sales);
    }
    if sales.is_empty() {
        println!("No sales registered.");
        return Ok(());
    }

    print_table(&sales);
    Ok(())
}

fn print_table(sales: &[SaleRecord]) {
    println!(
        "{:32} {:24} {:10} {:20} {:17} {:10} {:>10}",
        "ID", "CLIENT", "PHONE", "MODEL", "IMEI", "CHANNEL", "DOWN"
    );
    for r in sales {
        let s = &r.sale;
        println!(
            "{:32} {:24} {:10} {:20} {:17} {:10} {:>10}",
            s.id,
            cell(&s.client_name, 24),
            s.client_phone,
            cell(r.model.as_deref().unwrap_or("-"), 20),
            r.imei.as_deref().unwrap_or("-"),
            cell(&s.channel, 10),
            s.down_payment.normalize().to_string()
        );
    }
}

/// `celcontrol sale retry-status`
pub fn retry_status(session: &Session, device_id: &str) -> Result<()> {
    let repair = session.service.retry_mark_sold(device_id)?;

    if session.json() {
        let status = match repair {
            StatusRepair::Updated => "updated",
            StatusRepair::AlreadySold => "alreadySold",
        };
        return print_json(&json!({ "deviceId": device_id.trim(), "result": status }));
    }
    match repair {
        StatusRepair::Updated => println!("Device {} marked sold.", device_id.trim()),
        StatusRepair::AlreadySold => {
            println!("Device {} is already sold; nothing to do.", device_id.trim())
        }
    }
    Ok(())
}
