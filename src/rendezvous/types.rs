//! Correlation types shared by the coordinator, the ingestor and the validator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier linking one validation command to its eventual response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Mint a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Id of the inbound "validate transfer payment" call, used for tracing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-process key namespace.
///
/// Minted once when an instance starts so that keys left behind by a previous
/// incarnation can never match a live rendezvous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceNamespace(String);

impl InstanceNamespace {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the cache key for a correlation id under this namespace.
    pub fn key_for(&self, prefix: &str, id: &CorrelationId) -> CacheKey {
        CacheKey(format!("{}_{}_{}", prefix, self.0, id))
    }
}

impl fmt::Display for InstanceNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of one rendezvous slot in the shared cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value stored under a rendezvous key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseState {
    /// Command published, no response observed yet.
    Pending,
    /// Terminal: the remote validator answered.
    Resolved { valid: bool },
}

impl ResponseState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResponseState::Resolved { .. })
    }
}

/// Transfer as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
}

/// Command sent to the remote validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationCommand {
    pub id: CorrelationId,
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
}

impl ValidationCommand {
    pub fn for_request(id: CorrelationId, request: &TransferRequest) -> Self {
        Self {
            id,
            from_account: request.from_account.clone(),
            to_account: request.to_account.clone(),
            amount: request.amount,
        }
    }
}

/// Verdict published by the remote validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub id: CorrelationId,
    pub valid: bool,
}

/// Result of a completed rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub correlation_id: CorrelationId,
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_state_json_shape() {
        let pending = serde_json::to_string(&ResponseState::Pending).unwrap();
        assert_eq!(pending, r#"{"type":"Pending"}"#);

        let resolved = serde_json::to_string(&ResponseState::Resolved { valid: true }).unwrap();
        assert_eq!(resolved, r#"{"type":"Resolved","valid":true}"#);

        let decoded: ResponseState = serde_json::from_str(r#"{"type":"Resolved","valid":false}"#).unwrap();
        assert_eq!(decoded, ResponseState::Resolved { valid: false });
        assert!(serde_json::from_str::<ResponseState>(r#"{"valid":false}"#).is_err());
    }

    #[test]
    fn test_cache_key_is_namespaced() {
        let ns = InstanceNamespace::generate();
        let id = CorrelationId::new();
        let key = ns.key_for("transferPaymentRequestId", &id);
        assert_eq!(
            key.as_str(),
            format!("transferPaymentRequestId_{}_{}", ns, id)
        );

        let other = InstanceNamespace::generate();
        assert_ne!(other.key_for("transferPaymentRequestId", &id), key);
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
    }
}
