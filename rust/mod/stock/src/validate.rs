//! Entry-form validation.
//!
//! Runs before any gateway call. Checks run in form order and the first
//! failing field is reported.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use celcontrol_core::ServiceError;

use crate::model::NewSale;

/// Minimum IMEI/serial length accepted at stock entry.
pub const MIN_IMEI_DIGITS: usize = 10;

/// Exact length of a client phone number.
pub const PHONE_DIGITS: usize = 10;

/// A rejected form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Raw "add device" form input.
#[derive(Debug, Clone, Default)]
pub struct DeviceForm {
    pub model: String,
    pub imei: String,
}

/// Raw "register sale" form input, as typed.
#[derive(Debug, Clone, Default)]
pub struct SaleForm {
    pub device_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub channel: String,
    pub down_payment: String,
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Validate the stock-entry form: model present, IMEI numeric with at least
/// [`MIN_IMEI_DIGITS`] digits.
pub fn validate_device(form: &DeviceForm) -> Result<(), ValidationError> {
    if form.model.trim().is_empty() {
        return Err(ValidationError::new("model", "model is required"));
    }
    if !is_digits(&form.imei) {
        return Err(ValidationError::new("imei", "IMEI must be numeric"));
    }
    if form.imei.len() < MIN_IMEI_DIGITS {
        return Err(ValidationError::new(
            "imei",
            &format!("IMEI must have at least {MIN_IMEI_DIGITS} digits"),
        ));
    }
    Ok(())
}

/// Parse a down-payment amount.
///
/// Reads the longest leading number (sign, digits, optional fraction and
/// exponent) and ignores whatever follows, so `"1500 pesos"` is 1500. Input
/// with no leading number counts as zero; a negative amount is rejected.
pub fn parse_down_payment(raw: &str) -> Result<Decimal, ValidationError> {
    let amount = match leading_number(raw.trim()) {
        None => Decimal::ZERO,
        Some(number) => number.parse().ok_or_else(|| {
            ValidationError::new("down_payment", "down payment is out of range")
        })?,
    };

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::new(
            "down_payment",
            "down payment cannot be negative",
        ));
    }
    Ok(amount.normalize())
}

/// The numeric prefix of a string, split into its parts.
#[derive(Debug)]
struct LeadingNumber<'a> {
    negative: bool,
    int: &'a str,
    frac: &'a str,
    exp: Option<&'a str>,
}

impl LeadingNumber<'_> {
    fn parse(&self) -> Option<Decimal> {
        let int = if self.int.is_empty() { "0" } else { self.int };
        let mantissa = if self.frac.is_empty() {
            int.to_string()
        } else {
            format!("{int}.{}", self.frac)
        };
        let value = match self.exp {
            None => Decimal::from_str(&mantissa).ok()?,
            Some(exp) => Decimal::from_scientific(&format!("{mantissa}e{exp}")).ok()?,
        };
        Some(if self.negative { -value } else { value })
    }
}

fn digits_len(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// Scan `[+-]? digits [. digits]? ([eE] [+-]? digits)?`, requiring at least
/// one mantissa digit. An exponent marker without digits is left unread.
fn leading_number(s: &str) -> Option<LeadingNumber<'_>> {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let int_len = digits_len(rest);
    let int = &rest[..int_len];
    let mut rest = &rest[int_len..];

    let mut frac = "";
    if let Some(after_dot) = rest.strip_prefix('.') {
        let frac_len = digits_len(after_dot);
        frac = &after_dot[..frac_len];
        rest = &after_dot[frac_len..];
    }
    if int.is_empty() && frac.is_empty() {
        return None;
    }

    let mut exp = None;
    if let Some(after_e) = rest.strip_prefix(['e', 'E']) {
        let sign_len = usize::from(after_e.starts_with(['+', '-']));
        let exp_len = digits_len(&after_e[sign_len..]);
        if exp_len > 0 {
            exp = Some(&after_e[..sign_len + exp_len]);
        }
    }

    Some(LeadingNumber {
        negative,
        int,
        frac,
        exp,
    })
}

/// Validate the sale form and build the record to create.
///
/// Fields are passed through as typed; only the down payment is converted.
pub fn validate_sale(form: &SaleForm) -> Result<NewSale, ValidationError> {
    if form.device_id.trim().is_empty() {
        return Err(ValidationError::new("device_id", "select a device"));
    }
    if form.client_name.trim().is_empty() {
        return Err(ValidationError::new("client_name", "client name is required"));
    }
    if !(is_digits(&form.client_phone) && form.client_phone.len() == PHONE_DIGITS) {
        return Err(ValidationError::new(
            "client_phone",
            &format!("phone must have exactly {PHONE_DIGITS} digits"),
        ));
    }
    if form.channel.trim().is_empty() {
        return Err(ValidationError::new("channel", "channel is required"));
    }
    let down_payment = parse_down_payment(&form.down_payment)?;

    Ok(NewSale {
        device_id: form.device_id.clone(),
        client_name: form.client_name.clone(),
        client_phone: form.client_phone.clone(),
        channel: form.channel.clone(),
        down_payment,
    })
}
