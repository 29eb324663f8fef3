//! BigQuery Error Classification
//!
//! HTTPステータスとジョブエラーを `LoadError` に分類する（リトライはしない）

use super::models::{ApiErrorResponse, ErrorProto};
use crate::domain::error::LoadError;

/// スキーマ非互換を示すメッセージ断片（小文字）
const SCHEMA_MISMATCH_MARKERS: &[&str] = &[
    "provided schema does not match",
    "schema mismatch",
    "has changed type",
    "has changed mode",
    "incompatible",
    "is not compatible with",
    "no such field",
];

/// どの操作中の失敗か
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    ConfigureContext,
    Load,
}

/// Convert error chain to string including all causes
pub fn error_chain_to_string(e: &(dyn std::error::Error + 'static)) -> String {
    let mut messages = vec![e.to_string()];
    let mut source = e.source();
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }
    messages.join(" | ")
}

/// レスポンスボディからエラーメッセージを取り出す
///
/// Google APIのエラーJSONでなければボディをそのまま返す
pub fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => body.trim().to_string(),
    }
}

/// レスポンスボディの先頭エラーの reason（`accessDenied` など）
pub fn api_error_reason(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error.errors.into_iter().next())
        .map(|e| e.reason)
        .filter(|reason| !reason.is_empty())
}

/// スキーマ非互換を示すエラーかどうか
pub fn is_schema_mismatch(message: &str) -> bool {
    let lower = message.to_lowercase();
    SCHEMA_MISMATCH_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// 成功以外のHTTPレスポンスを分類する
pub fn classify_http_failure(phase: RequestPhase, target: &str, status: u16, body: &str) -> LoadError {
    let message = format!("HTTP {}: {}", status, api_error_message(body));

    if status == 401 {
        return LoadError::Authentication(message);
    }

    match phase {
        // 存在するプロジェクトでも datasets.list 権限がなければ 403 になる
        RequestPhase::ConfigureContext
            if status == 403 || api_error_reason(body).as_deref() == Some("accessDenied") =>
        {
            LoadError::InvalidProject(format!(
                "access denied checking project {} (credentials may lack bigquery.datasets.list): {}",
                target, message
            ))
        }
        RequestPhase::ConfigureContext => {
            LoadError::InvalidProject(format!("{}: {}", target, message))
        }
        RequestPhase::Load if is_schema_mismatch(&message) => LoadError::SchemaMismatch {
            table: target.to_string(),
            message,
        },
        RequestPhase::Load => LoadError::LoadJobFailure {
            table: target.to_string(),
            message,
        },
    }
}

/// 通信自体が失敗した場合の分類
pub fn classify_transport_failure(
    phase: RequestPhase,
    target: &str,
    error: &(dyn std::error::Error + 'static),
) -> LoadError {
    let message = error_chain_to_string(error);
    match phase {
        RequestPhase::ConfigureContext => LoadError::Authentication(format!(
            "could not verify credentials for {}: {}",
            target, message
        )),
        RequestPhase::Load => LoadError::LoadJobFailure {
            table: target.to_string(),
            message,
        },
    }
}

/// 完了したジョブの errorResult を分類する
pub fn classify_job_error(table: &str, error_result: &ErrorProto, errors: &[ErrorProto]) -> LoadError {
    let details: Vec<&str> = errors
        .iter()
        .map(|e| e.message.as_str())
        .filter(|m| !m.is_empty() && *m != error_result.message)
        .collect();

    let mut message = format!("{}: {}", error_result.reason, error_result.message);
    if !details.is_empty() {
        message.push_str(" | ");
        message.push_str(&details.join(" | "));
    }

    let schema_problem = std::iter::once(error_result)
        .chain(errors.iter())
        .any(|e| is_schema_mismatch(&e.message));

    if schema_problem {
        LoadError::SchemaMismatch {
            table: table.to_string(),
            message,
        }
    } else {
        LoadError::LoadJobFailure {
            table: table.to_string(),
            message,
        }
    }
}
