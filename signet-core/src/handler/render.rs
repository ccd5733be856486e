//! Plain-text summaries of requests, shown to the operator.
//!
//! Rendering never fails: missing fields show as empty values so that a
//! request from a newer or older signer can still be reviewed.

use std::fmt::Write as _;

use serde_json::Value;

use crate::protocol::Params;

/// Summary of an `ApproveTx` request.
pub fn transaction(params: &Params) -> String {
    let tx = params.get("transaction");
    let field = |name: &str| display(tx.and_then(|t| t.get(name)));

    let mut out = String::new();
    section(&mut out, "Transaction details");
    let _ = writeln!(out, "to:         {}", field("to"));
    let _ = writeln!(out, "from:       {}", field("from"));
    let _ = writeln!(out, "value:      {}", field("value"));
    let _ = writeln!(out, "data:       {}", field("data"));
    out.push('\n');
    section(&mut out, "Validation details");
    out.push_str(&call_info(params));
    out.push('\n');
    request_details(&mut out, params);
    out
}

/// Summary of an `ApproveSignData` request.
pub fn sign_data(params: &Params) -> String {
    let mut out = String::new();
    section(&mut out, "Signing details");
    let _ = writeln!(out, "Account:    {}", display(params.get("address")));
    let _ = writeln!(out, "message:    {}", display(params.get("message")));
    let _ = writeln!(out, "raw data:   {}", display(params.get("raw_data")));
    let _ = writeln!(out, "hash:       {}", display(params.get("hash")));
    out.push('\n');
    request_details(&mut out, params);
    out
}

/// Summary of an `ApproveListing` request.
pub fn listing(params: &Params) -> String {
    let mut out = String::new();
    section(&mut out, "Listing details");
    out.push_str("A request has been made to list all accounts.\n");
    out.push_str("The following accounts are available for listing:\n\n");
    if let Some(Value::Array(accounts)) = params.get("accounts") {
        for account in accounts {
            let _ = writeln!(out, "  *  {}", display(account.get("address")));
        }
    }
    out.push_str("\nApprove to list these accounts?\n\n");
    request_details(&mut out, params);
    out
}

/// Summary of an `ApproveNewAccount` request.
pub fn new_account(params: &Params) -> String {
    let mut out = String::new();
    section(&mut out, "Details");
    out.push_str("A request has been made to create a new account,\n");
    out.push_str("and show the address to the caller.\n\n");
    out.push_str("Do you want to create a new keystore-backed account?\n\n");
    request_details(&mut out, params);
    out
}

/// Summary of an `ApproveExport` request.
pub fn export(params: &Params) -> String {
    let mut out = String::new();
    section(&mut out, "Export details");
    out.push_str("A request has been made to export the key of account\n\n");
    let _ = writeln!(out, "  {}", display(params.get("address")));
    out.push_str("\nThe exported key is encrypted with the account password.\n\n");
    request_details(&mut out, params);
    out
}

/// Summary of an `ApproveImport` request.
pub fn import(params: &Params) -> String {
    let mut out = String::new();
    section(&mut out, "Import details");
    out.push_str("A request has been made to import a key into the keystore.\n\n");
    request_details(&mut out, params);
    out
}

/// One-line label for an account in a picker: address then URL.
pub fn account_label(account: &Value) -> String {
    let address = display(account.get("address"));
    let url = display(account.get("url"));
    if url.is_empty() {
        address
    } else {
        format!("{} {}", address, url)
    }
}

fn section(out: &mut String, title: &str) {
    let rule = "-".repeat(36usize.saturating_sub(title.len() + 1));
    let _ = writeln!(out, "-- {} {}\n", title, rule);
}

fn request_details(out: &mut String, params: &Params) {
    section(out, "Request details");
    out.push_str(&meta(params));
}

/// Warnings and errors the signer attached to a transaction, one per line.
///
/// `None` when the signer reported nothing above info level.
pub fn call_warnings(params: &Params) -> Option<String> {
    let Some(Value::Array(entries)) = params.get("call_info") else {
        return None;
    };

    let mut out = String::new();
    for entry in entries {
        let level = display(entry.get("type"));
        if level.eq_ignore_ascii_case("WARNING") || level.eq_ignore_ascii_case("ERROR") {
            let _ = writeln!(out, "{}: {}", level, display(entry.get("message")));
        }
    }
    (!out.is_empty()).then_some(out)
}

fn call_info(params: &Params) -> String {
    let mut out = String::new();
    if let Some(Value::Array(entries)) = params.get("call_info") {
        for entry in entries {
            let _ = writeln!(
                out,
                "  *  {} : {}",
                display(entry.get("type")),
                display(entry.get("message"))
            );
        }
    }
    out
}

fn meta(params: &Params) -> String {
    let mut out = String::new();
    if let Some(Value::Object(meta)) = params.get("meta") {
        for (key, value) in meta {
            let _ = writeln!(out, "  *  {} : {}", key, display(Some(value)));
        }
    }
    out
}

/// Show strings without quotes, absent values and `null` as nothing.
fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_transaction_summary() {
        let text = transaction(&params(json!({
            "transaction": {
                "to": "0x07a565b7ed7d7a678680a4c162885bedbb695fe0",
                "from": "0x82a2a876d39022b3019932d30cd9c97ad5616813",
                "value": "0x1",
                "data": "0x4401a6e4"
            },
            "call_info": [{"type": "WARNING", "message": "Invalid checksum"}],
            "meta": {"remote": "127.0.0.1:48486", "scheme": "HTTP/1.1"}
        })));

        assert!(text.starts_with("-- Transaction details "));
        assert!(text.contains("to:         0x07a565b7ed7d7a678680a4c162885bedbb695fe0"));
        assert!(text.contains("value:      0x1"));
        assert!(text.contains("  *  WARNING : Invalid checksum"));
        assert!(text.contains("  *  remote : 127.0.0.1:48486"));
    }

    #[test]
    fn test_call_warnings_skip_info_entries() {
        let warnings = call_warnings(&params(json!({
            "call_info": [
                {"type": "Info", "message": "Known contract"},
                {"type": "WARNING", "message": "Invalid checksum"},
                {"type": "error", "message": "Gas too low"}
            ]
        })));
        assert_eq!(
            warnings.as_deref(),
            Some("WARNING: Invalid checksum\nerror: Gas too low\n")
        );

        let info_only = params(json!({"call_info": [{"type": "Info", "message": "ok"}]}));
        assert_eq!(call_warnings(&info_only), None);
        assert_eq!(call_warnings(&params(json!({"call_info": null}))), None);
    }

    #[test]
    fn test_transaction_summary_tolerates_missing_fields() {
        let text = transaction(&Params::new());
        assert!(text.contains("to:         \n"));
        assert!(text.contains("-- Request details "));
    }

    #[test]
    fn test_sign_data_summary() {
        let text = sign_data(&params(json!({
            "address": "0xabc",
            "raw_data": "0x01020304",
            "hash": "0x7e3a"
        })));
        assert!(text.contains("Account:    0xabc"));
        assert!(text.contains("raw data:   0x01020304"));
        assert!(text.contains("message:    \n"));
    }

    #[test]
    fn test_listing_summary() {
        let text = listing(&params(json!({
            "accounts": [{"address": "0x1"}, {"address": "0x2"}]
        })));
        assert!(text.contains("  *  0x1\n"));
        assert!(text.contains("  *  0x2\n"));
    }

    #[test]
    fn test_account_label() {
        assert_eq!(
            account_label(&json!({"address": "0xabc", "url": "keystore:///k"})),
            "0xabc keystore:///k"
        );
        assert_eq!(account_label(&json!({"address": "0xabc"})), "0xabc");
    }

    #[test]
    fn test_non_string_values_are_rendered_as_json() {
        let text = sign_data(&params(json!({"address": 42, "meta": {"n": [1, 2]}})));
        assert!(text.contains("Account:    42"));
        assert!(text.contains("  *  n : [1,2]"));
    }

    #[test]
    fn test_section_rule_width() {
        let mut out = String::new();
        section(&mut out, "Details");
        assert_eq!(out.lines().next().map(str::len), Some(39));
    }
}
