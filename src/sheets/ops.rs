//! Tool-level spreadsheet operations.
//!
//! This layer sits between the MCP transport and [`SheetsClient`]: it
//! deserializes tool arguments, resolves the target spreadsheet and range
//! against configured defaults, and shapes the results the tools report.
//! Argument resolution fails before any network call.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::Config;
use crate::error::AppError;

use super::client::SheetsClient;

/// Arguments accepted by the `append_rows` tool.
///
/// Cells are strings; the append call uses `USER_ENTERED`, so the API
/// parses them the way typed-in values would be.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendArgs {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    pub rows: Vec<Vec<String>>,
}

/// Arguments accepted by the `read_rows` tool.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadArgs {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
}

/// Pick the per-call value when present and non-empty, else the configured
/// default, else fail naming the missing argument.
fn resolve<'a>(
    call_value: Option<&'a str>,
    default: Option<&'a str>,
    name: &str,
) -> Result<&'a str, AppError> {
    call_value
        .filter(|v| !v.trim().is_empty())
        .or(default.filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| {
            AppError::Input(format!(
                "Missing '{name}': pass it in the tool call or set the corresponding default"
            ))
        })
}

pub async fn append_rows(
    client: &SheetsClient,
    config: &Config,
    args: AppendArgs,
) -> Result<Value, AppError> {
    let spreadsheet_id = resolve(
        args.spreadsheet_id.as_deref(),
        config.default_spreadsheet_id.as_deref(),
        "spreadsheetId",
    )?;
    let range = resolve(
        args.range.as_deref(),
        config.default_range.as_deref(),
        "range",
    )?;

    if args.rows.is_empty() {
        return Err(AppError::Input("'rows' must contain at least one row".into()));
    }

    let result = client.append_rows(spreadsheet_id, range, &args.rows).await?;
    Ok(json!({
        "updatedRows": result.updated_rows,
        "updatedRange": result.updated_range,
    }))
}

pub async fn read_rows(
    client: &SheetsClient,
    config: &Config,
    args: ReadArgs,
) -> Result<Value, AppError> {
    let spreadsheet_id = resolve(
        args.spreadsheet_id.as_deref(),
        config.default_spreadsheet_id.as_deref(),
        "spreadsheetId",
    )?;
    let range = resolve(
        args.range.as_deref(),
        config.default_range.as_deref(),
        "range",
    )?;

    let values = client.read_rows(spreadsheet_id, range).await?;
    Ok(json!({ "rows": values }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_call_value() {
        let resolved = resolve(Some("from-call"), Some("from-config"), "spreadsheetId");
        assert_eq!(resolved.unwrap(), "from-call");
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let resolved = resolve(None, Some("from-config"), "spreadsheetId");
        assert_eq!(resolved.unwrap(), "from-config");
    }

    #[test]
    fn test_resolve_skips_empty_call_value() {
        let resolved = resolve(Some("  "), Some("from-config"), "range");
        assert_eq!(resolved.unwrap(), "from-config");
    }

    #[test]
    fn test_resolve_fails_when_neither_present() {
        let err = resolve(None, None, "spreadsheetId").unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
        assert!(err.to_string().contains("spreadsheetId"));
    }

    #[test]
    fn test_append_args_require_string_cells() {
        let args: AppendArgs = serde_json::from_value(json!({
            "rows": [["a", "1", "true", ""]]
        }))
        .unwrap();
        assert_eq!(args.rows.len(), 1);
        assert_eq!(args.rows[0].len(), 4);

        // Non-string cells are rejected at deserialization.
        let result: Result<AppendArgs, _> =
            serde_json::from_value(json!({ "rows": [["a", 1]] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_read_args_default_to_empty() {
        let args: ReadArgs = serde_json::from_value(json!({})).unwrap();
        assert!(args.spreadsheet_id.is_none());
        assert!(args.range.is_none());
    }
}
