use std::sync::Arc;

use celcontrol_core::{new_id, now_rfc3339};
use celcontrol_sql::{Row, SQLStore, Value};

use crate::model::{Device, DeviceStatus, NewSale, Sale, SaleRecord};

use super::{Gateway, GatewayError};

/// SQL DDL for the device and sale tables.
///
/// Each table stores the full JSON document in a `data` TEXT column, with
/// indexed columns extracted for filtering and ordering. There is no foreign
/// key from sales to devices: the store does not guard the sale/device pair.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS devices (
    id          TEXT PRIMARY KEY,
    data        TEXT NOT NULL,
    imei        TEXT NOT NULL,
    status      TEXT NOT NULL,
    create_at   TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS sales (
    id          TEXT PRIMARY KEY,
    data        TEXT NOT NULL,
    device_id   TEXT NOT NULL,
    create_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_dev_status ON devices(status);
CREATE INDEX IF NOT EXISTS idx_dev_imei ON devices(imei);
CREATE INDEX IF NOT EXISTS idx_dev_create_at ON devices(create_at);
CREATE INDEX IF NOT EXISTS idx_sale_device ON sales(device_id);
CREATE INDEX IF NOT EXISTS idx_sale_create_at ON sales(create_at);
";

/// Gateway over an embedded SQL store.
pub struct SqlGateway {
    db: Arc<dyn SQLStore>,
}

impl SqlGateway {
    /// Create the gateway and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, GatewayError> {
        db.exec_batch(SCHEMA)
            .map_err(|e| GatewayError::Query(format!("stock schema init: {e}")))?;
        Ok(Self { db })
    }

    fn insert<T: serde::Serialize>(
        &self,
        sql: &str,
        record: &T,
        indexes: Vec<Value>,
    ) -> Result<(), GatewayError> {
        let data =
            serde_json::to_string(record).map_err(|e| GatewayError::Decode(e.to_string()))?;
        let mut params = Vec::with_capacity(indexes.len() + 1);
        params.push(Value::Text(data));
        params.extend(indexes);
        self.db.exec(sql, &params)?;
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(row: &Row, column: &str) -> Result<T, GatewayError> {
    let data = row.require_str(column)?;
    serde_json::from_str(data).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl Gateway for SqlGateway {
    fn list_devices(&self) -> Result<Vec<Device>, GatewayError> {
        let rows = self.db.query(
            "SELECT data FROM devices ORDER BY create_at DESC, rowid DESC",
            &[],
        )?;
        rows.iter().map(|r| decode(r, "data")).collect()
    }

    fn list_sales(&self) -> Result<Vec<SaleRecord>, GatewayError> {
        let rows = self.db.query(
            "SELECT s.data AS data, d.data AS device \
             FROM sales s LEFT JOIN devices d ON d.id = s.device_id \
             ORDER BY s.create_at DESC, s.rowid DESC",
            &[],
        )?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let sale: Sale = decode(row, "data")?;
            let device: Option<Device> = match row.get_str("device") {
                Some(_) => Some(decode(row, "device")?),
                None => None,
            };
            records.push(SaleRecord {
                sale,
                model: device.as_ref().map(|d| d.model.clone()),
                imei: device.map(|d| d.imei),
            });
        }
        Ok(records)
    }

    fn get_device(&self, id: &str) -> Result<Option<Device>, GatewayError> {
        let rows = self
            .db
            .query("SELECT data FROM devices WHERE id = ?1", &[id.into()])?;
        rows.first().map(|r| decode(r, "data")).transpose()
    }

    fn create_device(&self, model: &str, imei: &str) -> Result<Device, GatewayError> {
        let device = Device {
            id: new_id(),
            model: model.to_string(),
            imei: imei.to_string(),
            status: DeviceStatus::Available,
            created_at: Some(now_rfc3339()),
        };

        self.insert(
            "INSERT INTO devices (data, id, imei, status, create_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            &device,
            vec![
                device.id.as_str().into(),
                device.imei.as_str().into(),
                device.status.as_str().into(),
                device.created_at.clone().into(),
            ],
        )?;

        Ok(device)
    }

    fn create_sale(&self, sale: &NewSale) -> Result<Sale, GatewayError> {
        let record = Sale {
            id: new_id(),
            device_id: sale.device_id.clone(),
            client_name: sale.client_name.clone(),
            client_phone: sale.client_phone.clone(),
            channel: sale.channel.clone(),
            down_payment: sale.down_payment,
            created_at: Some(now_rfc3339()),
        };

        self.insert(
            "INSERT INTO sales (data, id, device_id, create_at) VALUES (?1, ?2, ?3, ?4)",
            &record,
            vec![
                record.id.as_str().into(),
                record.device_id.as_str().into(),
                record.created_at.clone().into(),
            ],
        )?;

        Ok(record)
    }

    fn set_device_status(&self, id: &str, status: DeviceStatus) -> Result<(), GatewayError> {
        // The indexed column and the JSON document change in one statement.
        let affected = self.db.exec(
            "UPDATE devices SET status = ?1, data = json_set(data, '$.status', ?1) WHERE id = ?2",
            &[status.as_str().into(), id.into()],
        )?;

        if affected == 0 {
            return Err(GatewayError::NotFound(format!("devices/{id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use celcontrol_sql::SqliteStore;
    use rust_decimal::Decimal;

    fn gateway() -> SqlGateway {
        SqlGateway::new(Arc::new(SqliteStore::open_in_memory().unwrap())).unwrap()
    }

    fn new_sale(device_id: &str) -> NewSale {
        NewSale {
            device_id: device_id.into(),
            client_name: "Carlos Ruiz".into(),
            client_phone: "5598765432".into(),
            channel: "WhatsApp".into(),
            down_payment: Decimal::new(50000, 2),
        }
    }

    #[test]
    fn test_create_and_list_devices_newest_first() {
        let gw = gateway();
        let a = gw.create_device("Moto G84", "1111111111").unwrap();
        let b = gw.create_device("iPhone 15", "123456789012").unwrap();
        assert_eq!(a.status, DeviceStatus::Available);
        assert!(a.created_at.is_some());

        let devices = gw.list_devices().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, b.id);
        assert_eq!(devices[1].id, a.id);
    }

    #[test]
    fn test_get_device() {
        let gw = gateway();
        let d = gw.create_device("Pixel 8", "9999999999").unwrap();
        assert_eq!(gw.get_device(&d.id).unwrap(), Some(d));
        assert_eq!(gw.get_device("missing").unwrap(), None);
    }

    #[test]
    fn test_set_device_status_updates_document() {
        let gw = gateway();
        let d = gw.create_device("Pixel 8", "9999999999").unwrap();

        gw.set_device_status(&d.id, DeviceStatus::Sold).unwrap();
        let back = gw.get_device(&d.id).unwrap().unwrap();
        assert_eq!(back.status, DeviceStatus::Sold);
        assert_eq!(back.model, "Pixel 8");

        // Re-applying is harmless.
        gw.set_device_status(&d.id, DeviceStatus::Sold).unwrap();
    }

    #[test]
    fn test_set_status_unknown_device() {
        let gw = gateway();
        assert!(matches!(
            gw.set_device_status("nope", DeviceStatus::Sold),
            Err(GatewayError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_sales_joins_device() {
        let gw = gateway();
        let d = gw.create_device("Galaxy S24", "3567890123456").unwrap();
        let sale = gw.create_sale(&new_sale(&d.id)).unwrap();
        // A sale pointing at a device the store does not know.
        gw.create_sale(&new_sale("ghost")).unwrap();

        let sales = gw.list_sales().unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].sale.device_id, "ghost");
        assert_eq!(sales[0].model, None);
        assert_eq!(sales[1].sale, sale);
        assert_eq!(sales[1].model.as_deref(), Some("Galaxy S24"));
        assert_eq!(sales[1].imei.as_deref(), Some("3567890123456"));
        assert_eq!(sales[1].sale.down_payment, Decimal::new(500, 0));
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let db: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let gw = SqlGateway::new(Arc::clone(&db)).unwrap();
        gw.create_device("Moto E", "1234512345").unwrap();
        let again = SqlGateway::new(db).unwrap();
        assert_eq!(again.list_devices().unwrap().len(), 1);
    }
}
