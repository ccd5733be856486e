//! Approval handlers.
//!
//! A dismissed question counts as a decline. A dismissed password prompt
//! after an approval yields an empty password; the signer rejects it if it
//! does not unlock the account.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{
    ApproveExportResponse, ApproveImportResponse, ApproveListingResponse,
    ApproveNewAccountResponse, ApproveSignDataResponse, ApproveTxResponse,
};
use super::{render, to_result, Handler, HandlerContext, HandlerError};
use crate::prompt::{MessageKind, Secret};
use crate::protocol::Params;

/// Handles `ApproveTx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveTx;

impl Handler for ApproveTx {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        let transaction = match params.get("transaction") {
            Some(tx @ Value::Object(_)) => tx.clone(),
            Some(_) => {
                return Err(HandlerError::invalid_params("transaction must be an object"));
            }
            None => return Err(HandlerError::invalid_params("missing transaction")),
        };

        let prompter = ctx.prompter();
        if let Some(warnings) = render::call_warnings(&params) {
            warn!("signer flagged the transaction");
            prompter.message(MessageKind::Warning, "Transaction warnings", &warnings);
        }

        let (approved, password) =
            prompter.confirm_with_password("Transaction request", &render::transaction(&params));
        info!(approved, "transaction request answered");

        to_result(&ApproveTxResponse {
            approved,
            transaction,
            password: password.unwrap_or_default(),
        })
    }
}

/// Handles `ApproveSignData`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveSignData;

impl Handler for ApproveSignData {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        let (approved, password) = ctx
            .prompter()
            .confirm_with_password("Sign data request", &render::sign_data(&params));
        info!(approved, "sign data request answered");

        to_result(&ApproveSignDataResponse {
            approved,
            password: password.unwrap_or_default(),
        })
    }
}

/// Handles `ApproveExport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveExport;

impl Handler for ApproveExport {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        let approved = ctx
            .prompter()
            .confirm("Export request", &render::export(&params))
            .unwrap_or(false);
        info!(approved, "export request answered");

        to_result(&ApproveExportResponse { approved })
    }
}

/// Handles `ApproveImport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveImport;

impl Handler for ApproveImport {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        let prompter = ctx.prompter();
        let approved = prompter
            .confirm("Import request", &render::import(&params))
            .unwrap_or(false);
        info!(approved, "import request answered");

        let (old_password, new_password) = if approved {
            let old = prompter.password("Import", "Enter the password of the imported key");
            let new = prompter.password("Import", "Enter a new password for the keystore");
            (old.unwrap_or_default(), new.unwrap_or_default())
        } else {
            (Secret::default(), Secret::default())
        };

        to_result(&ApproveImportResponse {
            approved,
            old_password,
            new_password,
        })
    }
}

/// Handles `ApproveListing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveListing;

impl Handler for ApproveListing {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        let prompter = ctx.prompter();
        let approved = prompter
            .confirm("Listing request", &render::listing(&params))
            .unwrap_or(false);
        info!(approved, "listing request answered");

        let mut accounts = match params.get("accounts") {
            Some(Value::Array(accounts)) if approved => accounts.clone(),
            _ => Vec::new(),
        };

        // With a choice to make, let the operator narrow the listing.
        if accounts.len() > 1 {
            let mut items = vec!["All accounts".to_string()];
            items.extend(accounts.iter().map(render::account_label));

            accounts = match prompter.select("Pick account", "Accounts to reveal", &items) {
                Some(0) => accounts,
                Some(i) => accounts.get(i - 1).cloned().into_iter().collect(),
                None => Vec::new(),
            };
            debug!(revealed = accounts.len(), "account pick answered");
        }

        to_result(&ApproveListingResponse { accounts })
    }
}

/// Handles `ApproveNewAccount`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveNewAccount;

impl Handler for ApproveNewAccount {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        let (approved, password) = ctx
            .prompter()
            .confirm_with_password("New account", &render::new_account(&params));
        info!(approved, "new account request answered");

        to_result(&ApproveNewAccountResponse {
            approved,
            password: password.unwrap_or_default(),
        })
    }
}
