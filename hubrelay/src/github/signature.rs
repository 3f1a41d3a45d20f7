//! Authentication of inbound GitHub hooks.
//!
//! GitHub signs each delivery with an HMAC-SHA1 of the raw request body keyed by
//! the webhook secret and sends it as `X-Hub-Signature: sha1=<hex digest>`.
//! A [`HookContext`] can only be built from a request whose headers are all
//! present, whose signature verifies, and whose body is non-empty.

use axum::http::HeaderMap;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::error::HookError;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature";
pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

const SIGNATURE_PREFIX: &str = "sha1=";
/// `sha1=` plus 40 hex characters.
const SIGNATURE_LENGTH: usize = 45;

/// The three required hook headers, not yet authenticated.
#[derive(Debug, Clone)]
pub struct HookHeaders {
    signature: String,
    event: String,
    delivery_id: String,
}

impl HookHeaders {
    /// Extract the required headers, in signature / event / delivery order.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, HookError> {
        let signature = header_value(headers, SIGNATURE_HEADER).ok_or(HookError::MissingSignature)?;
        let event = header_value(headers, EVENT_HEADER).ok_or(HookError::MissingEvent)?;
        let delivery_id = header_value(headers, DELIVERY_HEADER).ok_or(HookError::MissingDeliveryId)?;

        Ok(Self {
            signature,
            event,
            delivery_id,
        })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    /// Check the signature over `body`, then that the body is non-empty.
    pub fn authenticate(self, secret: &str, body: Bytes) -> Result<HookContext, HookError> {
        if !verify_signature(secret.as_bytes(), &self.signature, &body) {
            return Err(HookError::InvalidSignature);
        }
        if body.is_empty() {
            return Err(HookError::EmptyPayload);
        }

        Ok(HookContext {
            signature: self.signature,
            event: self.event,
            delivery_id: self.delivery_id,
            payload: body,
        })
    }
}

/// An authenticated inbound hook.
#[derive(Debug, Clone)]
pub struct HookContext {
    signature: String,
    event: String,
    delivery_id: String,
    payload: Bytes,
}

impl HookContext {
    /// Authenticate a request.
    ///
    /// A request missing any required header is rejected without touching the body.
    pub fn from_request(secret: &str, headers: &HeaderMap, body: Bytes) -> Result<Self, HookError> {
        HookHeaders::from_headers(headers)?.authenticate(secret, body)
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The `X-GitHub-Event` tag, e.g. `issues`.
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Non-empty header value. Values that are not visible ASCII count as absent.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Compute the `X-Hub-Signature` header value for `body`.
pub fn sign_body(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret).ok()?;
    mac.update(body);
    let digest = mac.finalize().into_bytes();

    Some(format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest)))
}

/// Verify an `X-Hub-Signature` header value against the raw body.
///
/// Shape (length and prefix) is checked before the digest is decoded. The
/// digest comparison itself is constant-time.
pub fn verify_signature(secret: &[u8], signature: &str, body: &[u8]) -> bool {
    if signature.len() != SIGNATURE_LENGTH {
        return false;
    }
    let Some(digest_hex) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(digest) = hex::decode(digest_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);

    // verify_slice compares in constant time
    mac.verify_slice(&digest).is_ok()
}
