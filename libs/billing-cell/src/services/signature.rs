//! Provider webhook signature verification.
//!
//! `x-signature` carries `ts=<unix>,v1=<hex hmac>`. The signed manifest is
//! `id:{data.id};request-id:{x-request-id};ts:{ts};`, keyed with the shared webhook secret.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::models::{data_id_text, WebhookHeaders};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParts {
    pub ts: String,
    pub v1: String,
}

/// Splits `ts=...,v1=...`; both parts are required.
pub fn parse_signature_header(header: &str) -> Option<SignatureParts> {
    let mut ts = None;
    let mut v1 = None;

    for part in header.split(',') {
        let (key, value) = part.split_once('=')?;
        let value = value.trim();
        match key.trim() {
            "ts" if !value.is_empty() => ts = Some(value.to_string()),
            "v1" if !value.is_empty() => v1 = Some(value.to_string()),
            _ => {}
        }
    }

    Some(SignatureParts { ts: ts?, v1: v1? })
}

pub fn manifest(data_id: &str, request_id: &str, ts: &str) -> String {
    format!("id:{};request-id:{};ts:{};", data_id, request_id, ts)
}

/// Lower-case hex HMAC-SHA256 of the manifest. `None` for an empty secret.
pub fn signature_for(data_id: &str, request_id: &str, ts: &str, secret: &str) -> Option<String> {
    if secret.is_empty() {
        return None;
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(manifest(data_id, request_id, ts).as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Whether `raw_body` and `headers` carry a valid provider signature.
/// Any missing or malformed piece fails verification.
pub fn verify_signature(raw_body: &[u8], headers: &WebhookHeaders, secret: &str) -> bool {
    let Some(parts) = headers.signature.as_deref().and_then(parse_signature_header) else {
        return false;
    };
    let Some(request_id) = headers.request_id.as_deref().filter(|id| !id.is_empty()) else {
        return false;
    };
    let Some(data_id) = serde_json::from_slice::<Value>(raw_body)
        .ok()
        .as_ref()
        .and_then(|body| body.get("data"))
        .and_then(|data| data.get("id"))
        .and_then(data_id_text)
    else {
        return false;
    };
    let Some(expected) = signature_for(&data_id, request_id, &parts.ts, secret) else {
        return false;
    };

    expected.as_bytes().ct_eq(parts.v1.as_bytes()).into()
}
