//! Desktop storage strategy forwarding every operation to the host's relational engine.

use platform_host::{
    channels::{DB_CLOSE, DB_EXECUTE, DB_GET, DB_INITIALIZE, DB_QUERY},
    HostResult, Record, StorageFuture, StorageService,
};
use serde_json::{json, Value};

use crate::bridge::DesktopBridge;

#[derive(Debug, Clone, Default)]
/// Pass-through storage over the desktop IPC bridge.
///
/// Statements and positional parameters are forwarded verbatim; responses come back unmodified.
pub struct DesktopStorage {
    bridge: DesktopBridge,
}

impl DesktopStorage {
    /// Creates a storage strategy over the given bridge.
    pub fn new(bridge: DesktopBridge) -> Self {
        Self { bridge }
    }
}

fn statement_payload(statement: &str, params: &[Value]) -> Value {
    json!({ "sql": statement, "params": params })
}

impl StorageService for DesktopStorage {
    fn initialize<'a>(&'a self) -> StorageFuture<'a, HostResult<()>> {
        Box::pin(async move {
            self.bridge.invoke(DB_INITIALIZE, Value::Null).await?;
            Ok(())
        })
    }

    fn query<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Vec<Record>>> {
        Box::pin(async move {
            self.bridge
                .invoke_as(DB_QUERY, statement_payload(statement, params))
                .await
        })
    }

    fn execute<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<()>> {
        Box::pin(async move {
            self.bridge
                .invoke(DB_EXECUTE, statement_payload(statement, params))
                .await?;
            Ok(())
        })
    }

    fn get<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> StorageFuture<'a, HostResult<Option<Record>>> {
        Box::pin(async move {
            let record = self
                .bridge
                .invoke(DB_GET, statement_payload(statement, params))
                .await?;
            Ok((!record.is_null()).then_some(record))
        })
    }

    fn close<'a>(&'a self) -> StorageFuture<'a, HostResult<()>> {
        Box::pin(async move {
            self.bridge.invoke(DB_CLOSE, Value::Null).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use platform_host::{HostError, HostErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::RecordingBridge;

    fn storage_with(bridge: &Rc<RecordingBridge>) -> DesktopStorage {
        DesktopStorage::new(DesktopBridge::new(Rc::clone(bridge) as _))
    }

    #[test]
    fn query_forwards_statement_and_params_verbatim() {
        let bridge = Rc::new(RecordingBridge::default());
        bridge.respond(DB_QUERY, Ok(json!([{"id": 1, "name": "demo"}])));
        let storage = storage_with(&bridge);

        let rows = block_on(storage.query("SELECT * FROM apps WHERE id = ?", &[json!(1)]))
            .expect("query");
        assert_eq!(rows, vec![json!({"id": 1, "name": "demo"})]);
        assert_eq!(
            bridge.invoked(),
            vec![(
                DB_QUERY.to_string(),
                json!({"sql": "SELECT * FROM apps WHERE id = ?", "params": [1]})
            )]
        );
    }

    #[test]
    fn get_maps_null_response_to_none() {
        let bridge = Rc::new(RecordingBridge::default());
        let storage = storage_with(&bridge);
        assert_eq!(
            block_on(storage.get("SELECT * FROM apps WHERE id = ?", &[json!(9)])).expect("get"),
            None
        );
    }

    #[test]
    fn host_errors_pass_through_unchanged() {
        let bridge = Rc::new(RecordingBridge::default());
        bridge.respond(DB_EXECUTE, Err(HostError::backend("UNIQUE constraint failed")));
        let storage = storage_with(&bridge);

        let err = block_on(storage.execute("INSERT INTO apps (id) VALUES (?)", &[json!(1)]))
            .expect_err("should fail");
        assert_eq!(err.kind, HostErrorKind::Backend);
        assert_eq!(err.message, "UNIQUE constraint failed");
    }

    #[test]
    fn initialize_and_close_use_lifecycle_channels() {
        let bridge = Rc::new(RecordingBridge::default());
        let storage = storage_with(&bridge);
        block_on(storage.initialize()).expect("initialize");
        block_on(storage.close()).expect("close");

        let channels: Vec<String> = bridge.invoked().into_iter().map(|(c, _)| c).collect();
        assert_eq!(channels, vec![DB_INITIALIZE, DB_CLOSE]);
    }

    #[test]
    fn missing_bridge_fails_instead_of_succeeding() {
        let storage = DesktopStorage::default();
        let err = block_on(storage.initialize()).expect_err("should fail");
        assert_eq!(err.kind, HostErrorKind::Transport);
    }
}
