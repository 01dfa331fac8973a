//! Dispatch of `POST /api/:method` calls by method name.
//!
//! Storage methods answer with empty defaults and filesystem mutations fail: this service
//! only gives the web transport a routing target.

use platform_host::{
    channels::{
        DB_EXECUTE, DB_GET, DB_INITIALIZE, DB_QUERY, FS_CREATE_DIR, FS_DELETE_DIR,
        FS_DELETE_FILE, FS_EXISTS, FS_READ_DIR, FS_READ_FILE, FS_WRITE_FILE,
    },
    HostError, HostResult,
};
use serde_json::{json, Value};
use tracing::info;

/// Failure message of the file content methods.
pub const FILE_STORAGE_UNAVAILABLE: &str = "File operations require server-side storage setup";
/// Failure message of the directory methods.
pub const DIRECTORY_STORAGE_UNAVAILABLE: &str =
    "Directory operations require server-side storage setup";

/// Answers one IPC method call.
pub fn handle_ipc_method(method: &str, _data: &Value) -> HostResult<Value> {
    info!(method = %method, "IPC method called");
    match method {
        DB_INITIALIZE | DB_EXECUTE => Ok(json!({ "success": true })),
        DB_QUERY | FS_READ_DIR => Ok(json!([])),
        DB_GET => Ok(Value::Null),
        FS_EXISTS => Ok(Value::Bool(false)),
        FS_READ_FILE | FS_WRITE_FILE | FS_DELETE_FILE => {
            Err(HostError::unsupported(FILE_STORAGE_UNAVAILABLE))
        }
        FS_CREATE_DIR | FS_DELETE_DIR => Err(HostError::unsupported(DIRECTORY_STORAGE_UNAVAILABLE)),
        other => Err(HostError::not_found(format!("Unknown IPC method: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn storage_methods_answer_with_defaults() {
        let cases = [
            (DB_INITIALIZE, json!({"success": true})),
            (DB_EXECUTE, json!({"success": true})),
            (DB_QUERY, json!([])),
            (DB_GET, Value::Null),
            (FS_EXISTS, json!(false)),
            (FS_READ_DIR, json!([])),
        ];
        for (method, expected) in cases {
            assert_eq!(
                handle_ipc_method(method, &json!({"sql": "SELECT 1"})).expect(method),
                expected,
                "method {method}"
            );
        }
    }

    #[test]
    fn filesystem_mutations_fail_with_setup_message() {
        for method in [FS_READ_FILE, FS_WRITE_FILE, FS_DELETE_FILE] {
            let err = handle_ipc_method(method, &Value::Null).expect_err(method);
            assert_eq!(err.message, FILE_STORAGE_UNAVAILABLE);
        }
        for method in [FS_CREATE_DIR, FS_DELETE_DIR] {
            let err = handle_ipc_method(method, &Value::Null).expect_err(method);
            assert_eq!(err.message, DIRECTORY_STORAGE_UNAVAILABLE);
        }
    }

    #[test]
    fn unknown_method_names_itself() {
        let err = handle_ipc_method("db:close", &Value::Null).expect_err("unknown");
        assert_eq!(err.message, "Unknown IPC method: db:close");
    }
}
