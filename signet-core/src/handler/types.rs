//! Result shapes returned to the signer, one per method.
//!
//! Passwords are held as [`Secret`] so they stay redacted in logs and are
//! wiped when the result is dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prompt::Secret;

/// Result of `ApproveTx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveTxResponse {
    /// Whether the operator approved the transaction.
    pub approved: bool,
    /// The transaction from the request, echoed back.
    pub transaction: Value,
    /// Password to unlock the signing account, empty when declined.
    pub password: Secret,
}

/// Result of `ApproveSignData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveSignDataResponse {
    pub approved: bool,
    pub password: Secret,
}

/// Result of `ApproveExport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveExportResponse {
    pub approved: bool,
}

/// Result of `ApproveImport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveImportResponse {
    pub approved: bool,
    /// Password currently protecting the imported key.
    pub old_password: Secret,
    /// Password to protect the key with in the keystore.
    pub new_password: Secret,
}

/// Result of `ApproveListing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveListingResponse {
    /// Accounts the signer may reveal; empty when declined.
    pub accounts: Vec<Value>,
}

/// Result of `ApproveNewAccount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveNewAccountResponse {
    pub approved: bool,
    pub password: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_is_serialized_but_not_debug_printed() {
        let response = ApproveImportResponse {
            approved: true,
            old_password: Secret::new("old-pw"),
            new_password: Secret::new("new-pw"),
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"approved": true, "old_password": "old-pw", "new_password": "new-pw"})
        );

        let debug = format!("{:?}", response);
        assert!(!debug.contains("old-pw"));
        assert!(!debug.contains("new-pw"));
        assert!(debug.contains("[REDACTED]"));
    }
}
