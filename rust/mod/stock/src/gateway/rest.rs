use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Device, DeviceStatus, NewSale, Sale, SaleRecord};

use super::{Gateway, GatewayError};

const DEVICES: &str = "equipos";
const SALES: &str = "ventas";

/// Gateway over a PostgREST endpoint (the hosted store's REST interface).
///
/// Table and column names follow the hosted schema: `equipos`
/// (`modelo`, `imei`, `estado`) and `ventas` (`equipo_id`, `cliente`,
/// `telefono`, `canal`, `enganche`).
pub struct RestGateway {
    client: Client,
    base_url: String,
}

// ── Wire rows ──

#[derive(Debug, Deserialize)]
struct EquipoRow {
    id: String,
    modelo: String,
    imei: String,
    estado: DeviceStatus,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<EquipoRow> for Device {
    fn from(row: EquipoRow) -> Self {
        Device {
            id: row.id,
            model: row.modelo,
            imei: row.imei,
            status: row.estado,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EquipoJoin {
    #[serde(default)]
    modelo: Option<String>,
    #[serde(default)]
    imei: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VentaRow {
    id: String,
    equipo_id: String,
    cliente: String,
    telefono: String,
    canal: String,
    #[serde(default)]
    enganche: Decimal,
    #[serde(default)]
    created_at: Option<String>,
    /// Embedded resource from `select=*,equipos(modelo,imei)`.
    #[serde(default)]
    equipos: Option<EquipoJoin>,
}

impl From<VentaRow> for Sale {
    fn from(row: VentaRow) -> Self {
        Sale {
            id: row.id,
            device_id: row.equipo_id,
            client_name: row.cliente,
            client_phone: row.telefono,
            channel: row.canal,
            down_payment: row.enganche,
            created_at: row.created_at,
        }
    }
}

impl From<VentaRow> for SaleRecord {
    fn from(mut row: VentaRow) -> Self {
        let join = row.equipos.take().unwrap_or_default();
        SaleRecord {
            sale: row.into(),
            model: join.modelo,
            imei: join.imei,
        }
    }
}

#[derive(Serialize)]
struct NuevoEquipo<'a> {
    modelo: &'a str,
    imei: &'a str,
    estado: DeviceStatus,
}

#[derive(Serialize)]
struct NuevaVenta<'a> {
    equipo_id: &'a str,
    cliente: &'a str,
    telefono: &'a str,
    canal: &'a str,
    enganche: Decimal,
}

#[derive(Serialize)]
struct EstadoPatch {
    estado: DeviceStatus,
}

impl RestGateway {
    /// Build a client for the given PostgREST root URL.
    ///
    /// A non-empty `api_key` is sent as both the `apikey` header and a
    /// bearer token, as hosted PostgREST deployments expect.
    pub fn new(url: &str, api_key: &str) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            let key = HeaderValue::from_str(api_key)
                .map_err(|e| GatewayError::Connection(format!("invalid api key: {e}")))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| GatewayError::Connection(format!("invalid api key: {e}")))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, GatewayError> {
        let resp = req.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                GatewayError::Connection(e.to_string())
            } else {
                GatewayError::Query(e.to_string())
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().unwrap_or_default();
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<Vec<T>, GatewayError> {
        self.send(req)?
            .json::<Vec<T>>()
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// Pull the `message` field out of a PostgREST error body, falling back to
/// the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

fn first<T>(rows: Vec<T>, what: &str) -> Result<T, GatewayError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| GatewayError::Decode(format!("store returned no {what} row")))
}

impl Gateway for RestGateway {
    fn list_devices(&self) -> Result<Vec<Device>, GatewayError> {
        let req = self
            .client
            .get(self.table_url(DEVICES))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let rows: Vec<EquipoRow> = self.fetch(req)?;
        Ok(rows.into_iter().map(Device::from).collect())
    }

    fn list_sales(&self) -> Result<Vec<SaleRecord>, GatewayError> {
        let req = self
            .client
            .get(self.table_url(SALES))
            .query(&[("select", "*,equipos(modelo,imei)"), ("order", "created_at.desc")]);
        let rows: Vec<VentaRow> = self.fetch(req)?;
        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    fn get_device(&self, id: &str) -> Result<Option<Device>, GatewayError> {
        let filter = format!("eq.{id}");
        let req = self
            .client
            .get(self.table_url(DEVICES))
            .query(&[("select", "*"), ("id", filter.as_str())]);
        let rows: Vec<EquipoRow> = self.fetch(req)?;
        Ok(rows.into_iter().next().map(Device::from))
    }

    fn create_device(&self, model: &str, imei: &str) -> Result<Device, GatewayError> {
        let body = [NuevoEquipo {
            modelo: model,
            imei,
            estado: DeviceStatus::Available,
        }];
        let req = self
            .client
            .post(self.table_url(DEVICES))
            .header("Prefer", "return=representation")
            .json(&body);
        let row: EquipoRow = first(self.fetch(req)?, "device")?;
        debug!("device {} stored via REST", row.id);
        Ok(row.into())
    }

    fn create_sale(&self, sale: &NewSale) -> Result<Sale, GatewayError> {
        let body = [NuevaVenta {
            equipo_id: &sale.device_id,
            cliente: &sale.client_name,
            telefono: &sale.client_phone,
            canal: &sale.channel,
            enganche: sale.down_payment,
        }];
        let req = self
            .client
            .post(self.table_url(SALES))
            .header("Prefer", "return=representation")
            .json(&body);
        let row: VentaRow = first(self.fetch(req)?, "sale")?;
        debug!("sale {} stored via REST", row.id);
        Ok(row.into())
    }

    fn set_device_status(&self, id: &str, status: DeviceStatus) -> Result<(), GatewayError> {
        let filter = format!("eq.{id}");
        let req = self
            .client
            .patch(self.table_url(DEVICES))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&EstadoPatch { estado: status });
        let rows: Vec<EquipoRow> = self.fetch(req)?;
        if rows.is_empty() {
            return Err(GatewayError::NotFound(format!("{DEVICES}/{id}")));
        }
        Ok(())
    }
}
