//! Consistency checks between sales and device states.
//!
//! Sales and device status changes are separate writes, so a snapshot can
//! show combinations that correct operation never produces. This module
//! finds them; fixing them is left to the operator.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::model::{Device, DeviceStatus, SaleRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Inconsistency {
    /// A sale exists but its device still reads as available
    /// (left behind by a partial sale).
    OrphanedSale { sale_id: String, device_id: String },

    /// A sale references a device the store does not know.
    MissingDevice { sale_id: String, device_id: String },

    /// Several sales reference the same device.
    DuplicateSale { device_id: String, sale_ids: Vec<String> },

    /// A device is sold but no sale references it.
    SoldWithoutSale { device_id: String },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::OrphanedSale { sale_id, device_id } => write!(
                f,
                "sale {sale_id} references device {device_id}, which is still available \
                 (run `celcontrol sale retry-status {device_id}`)"
            ),
            Inconsistency::MissingDevice { sale_id, device_id } => {
                write!(f, "sale {sale_id} references unknown device {device_id}")
            }
            Inconsistency::DuplicateSale { device_id, sale_ids } => write!(
                f,
                "device {device_id} was sold {} times (sales {})",
                sale_ids.len(),
                sale_ids.join(", ")
            ),
            Inconsistency::SoldWithoutSale { device_id } => {
                write!(f, "device {device_id} is sold but no sale references it")
            }
        }
    }
}

/// Compare a snapshot of devices and sales and report every anomaly.
///
/// Output order: per-sale findings in sale order, then duplicates and
/// sold-without-sale findings ordered by device id.
pub fn find_inconsistencies(devices: &[Device], sales: &[SaleRecord]) -> Vec<Inconsistency> {
    let by_id: HashMap<&str, &Device> = devices.iter().map(|d| (d.id.as_str(), d)).collect();
    let mut found = Vec::new();
    let mut sales_per_device: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for record in sales {
        let sale = &record.sale;
        sales_per_device
            .entry(sale.device_id.as_str())
            .or_default()
            .push(sale.id.as_str());

        match by_id.get(sale.device_id.as_str()) {
            None => found.push(Inconsistency::MissingDevice {
                sale_id: sale.id.clone(),
                device_id: sale.device_id.clone(),
            }),
            Some(d) if d.is_available() => found.push(Inconsistency::OrphanedSale {
                sale_id: sale.id.clone(),
                device_id: sale.device_id.clone(),
            }),
            Some(_) => {}
        }
    }

    for (device_id, sale_ids) in &sales_per_device {
        if sale_ids.len() > 1 {
            found.push(Inconsistency::DuplicateSale {
                device_id: device_id.to_string(),
                sale_ids: sale_ids.iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    let referenced: HashSet<&str> = sales_per_device.keys().copied().collect();
    let mut unsold: Vec<&Device> = devices
        .iter()
        .filter(|d| d.status == DeviceStatus::Sold && !referenced.contains(d.id.as_str()))
        .collect();
    unsold.sort_by(|a, b| a.id.cmp(&b.id));
    found.extend(unsold.into_iter().map(|d| Inconsistency::SoldWithoutSale {
        device_id: d.id.clone(),
    }));

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sale;
    use rust_decimal::Decimal;

    fn device(id: &str, status: DeviceStatus) -> Device {
        Device {
            id: id.into(),
            model: "Moto".into(),
            imei: "1234567890".into(),
            status,
            created_at: None,
        }
    }

    fn sale(id: &str, device_id: &str) -> SaleRecord {
        SaleRecord {
            sale: Sale {
                id: id.into(),
                device_id: device_id.into(),
                client_name: "Ana".into(),
                client_phone: "5512345678".into(),
                channel: "Local".into(),
                down_payment: Decimal::ZERO,
                created_at: None,
            },
            model: None,
            imei: None,
        }
    }

    #[test]
    fn consistent_snapshot_is_clean() {
        let devices = vec![
            device("d1", DeviceStatus::Sold),
            device("d2", DeviceStatus::Available),
        ];
        let sales = vec![sale("s1", "d1")];
        assert!(find_inconsistencies(&devices, &sales).is_empty());
        assert!(find_inconsistencies(&[], &[]).is_empty());
    }

    #[test]
    fn detects_every_kind() {
        let devices = vec![
            device("d1", DeviceStatus::Available),
            device("d2", DeviceStatus::Sold),
            device("d3", DeviceStatus::Sold),
        ];
        let sales = vec![
            sale("s1", "d1"),
            sale("s2", "d2"),
            sale("s3", "d2"),
            sale("s4", "gone"),
        ];

        let found = find_inconsistencies(&devices, &sales);
        assert_eq!(
            found,
            vec![
                Inconsistency::OrphanedSale {
                    sale_id: "s1".into(),
                    device_id: "d1".into()
                },
                Inconsistency::MissingDevice {
                    sale_id: "s4".into(),
                    device_id: "gone".into()
                },
                Inconsistency::DuplicateSale {
                    device_id: "d2".into(),
                    sale_ids: vec!["s2".into(), "s3".into()]
                },
                Inconsistency::SoldWithoutSale {
                    device_id: "d3".into()
                },
            ]
        );
    }

    #[test]
    fn display_points_at_retry_command() {
        let msg = Inconsistency::OrphanedSale {
            sale_id: "s1".into(),
            device_id: "d1".into(),
        }
        .to_string();
        assert!(msg.contains("sale retry-status d1"));
    }

    #[test]
    fn json_is_tagged() {
        let json = serde_json::to_value(Inconsistency::SoldWithoutSale {
            device_id: "d9".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "soldWithoutSale");
        assert_eq!(json["deviceId"], "d9");

        let json = serde_json::to_value(Inconsistency::DuplicateSale {
            device_id: "d2".into(),
            sale_ids: vec!["s2".into(), "s3".into()],
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "duplicateSale", "deviceId": "d2", "saleIds": ["s2", "s3"]})
        );
    }
}
