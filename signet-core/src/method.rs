//! The closed set of methods a signer may call on the UI.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A method the signer invokes over the stdio channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// Approve (and possibly sign) a transaction.
    ApproveTx,
    /// Approve signing arbitrary data.
    ApproveSignData,
    /// Approve exporting an account's key material.
    ApproveExport,
    /// Approve importing a key.
    ApproveImport,
    /// Approve listing the available accounts.
    ApproveListing,
    /// Approve creating a new account.
    ApproveNewAccount,
    /// Show an error message to the operator.
    ShowError,
    /// Show an informational message to the operator.
    ShowInfo,
}

impl Method {
    /// Every method, in registration order.
    pub const ALL: [Method; 8] = [
        Method::ApproveTx,
        Method::ApproveSignData,
        Method::ApproveExport,
        Method::ApproveImport,
        Method::ApproveListing,
        Method::ApproveNewAccount,
        Method::ShowError,
        Method::ShowInfo,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApproveTx => "ApproveTx",
            Self::ApproveSignData => "ApproveSignData",
            Self::ApproveExport => "ApproveExport",
            Self::ApproveImport => "ApproveImport",
            Self::ApproveListing => "ApproveListing",
            Self::ApproveNewAccount => "ApproveNewAccount",
            Self::ShowError => "ShowError",
            Self::ShowInfo => "ShowInfo",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The wire name does not match any [`Method`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}
