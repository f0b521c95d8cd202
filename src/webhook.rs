//! Completion webhook for embedded payment and signup forms
//!
//! The form provider signs the raw request body with a shared secret and
//! sends the hex HMAC-SHA256 in `X-Signature: sha256=<hex>`. Only version 1
//! payloads reporting `submission.completed` are accepted.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const PAYLOAD_VERSION: u32 = 1;
pub const COMPLETED_EVENT: &str = "submission.completed";
/// Where the browser goes once the provider confirms the submission
pub const CONFIRMATION_PATH: &str = "/thank-you";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("signature does not match payload")]
    BadSignature,
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u32),
    #[error("unexpected event '{0}'")]
    UnknownEvent(String),
}

impl WebhookError {
    pub fn is_signature_failure(&self) -> bool {
        matches!(self, WebhookError::MissingSignature | WebhookError::BadSignature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Payment,
    Signup,
}

impl FormKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FormKind::Payment => "payment",
            FormKind::Signup => "signup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormEvent {
    pub version: u32,
    pub form: FormKind,
    pub event: String,
    pub submission_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self { key: secret.to_vec() }
    }

    fn mac(&self, body: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| WebhookError::BadSignature)?;
        mac.update(body);
        Ok(mac)
    }

    /// Header value the provider would send for `body`
    pub fn sign(&self, body: &[u8]) -> Result<String, WebhookError> {
        Ok(format!("sha256={}", hex::encode(self.mac(body)?.finalize().into_bytes())))
    }

    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
        let header = header.ok_or(WebhookError::MissingSignature)?;
        let signature = header
            .trim()
            .strip_prefix("sha256=")
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
            .ok_or(WebhookError::BadSignature)?;
        self.mac(body)?
            .verify_slice(&signature)
            .map_err(|_| WebhookError::BadSignature)
    }

    /// Verify the signature, then parse and check the event
    pub fn accept(&self, body: &[u8], header: Option<&str>) -> Result<FormEvent, WebhookError> {
        self.verify(body, header)?;
        parse_event(body)
    }
}

pub fn parse_event(body: &[u8]) -> Result<FormEvent, WebhookError> {
    let event: FormEvent =
        serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;
    if event.version != PAYLOAD_VERSION {
        return Err(WebhookError::UnsupportedVersion(event.version));
    }
    if event.event != COMPLETED_EVENT {
        return Err(WebhookError::UnknownEvent(event.event));
    }
    if event.submission_id.trim().is_empty() {
        return Err(WebhookError::Malformed("empty submission_id".into()));
    }
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] =
        br#"{"version":1,"form":"payment","event":"submission.completed","submission_id":"sub_88"}"#;

    #[test]
    fn accepts_signed_completion() {
        let verifier = WebhookVerifier::new(b"hook secret");
        let sig = verifier.sign(BODY).unwrap();
        let event = verifier.accept(BODY, Some(&sig)).unwrap();
        assert_eq!(event.form, FormKind::Payment);
        assert_eq!(event.submission_id, "sub_88");
        assert_eq!(event.email, None);
    }

    #[test]
    fn rejects_bad_or_missing_signature() {
        let verifier = WebhookVerifier::new(b"hook secret");
        let forged = WebhookVerifier::new(b"guess").sign(BODY).unwrap();

        assert_eq!(verifier.accept(BODY, None).unwrap_err(), WebhookError::MissingSignature);
        assert_eq!(verifier.accept(BODY, Some(&forged)).unwrap_err(), WebhookError::BadSignature);
        assert_eq!(verifier.accept(BODY, Some("md5=abc")).unwrap_err(), WebhookError::BadSignature);
    }

    #[test]
    fn message_text_alone_is_not_a_completion() {
        // a body that merely mentions success is not an event
        let body = br#"{"message":"Thank you! Submission success"}"#;
        let verifier = WebhookVerifier::new(b"k");
        let sig = verifier.sign(body).unwrap();
        assert!(matches!(verifier.accept(body, Some(&sig)), Err(WebhookError::Malformed(_))));
    }

    #[test]
    fn rejects_other_versions_and_events() {
        let v2 = br#"{"version":2,"form":"signup","event":"submission.completed","submission_id":"x"}"#;
        assert_eq!(parse_event(v2).unwrap_err(), WebhookError::UnsupportedVersion(2));

        let started = br#"{"version":1,"form":"signup","event":"submission.started","submission_id":"x"}"#;
        assert_eq!(
            parse_event(started).unwrap_err(),
            WebhookError::UnknownEvent("submission.started".into())
        );

        let blank = br#"{"version":1,"form":"signup","event":"submission.completed","submission_id":" "}"#;
        assert!(matches!(parse_event(blank), Err(WebhookError::Malformed(_))));
    }
}
