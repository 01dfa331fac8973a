//! Desktop filesystem strategy forwarding to the host's native filesystem and dialogs.

use platform_host::{
    channels::{
        DIALOG_OPEN_DIRECTORY, DIALOG_OPEN_FILE, DIALOG_SAVE_FILE, FS_CREATE_DIR, FS_DELETE_DIR,
        FS_DELETE_FILE, FS_EXISTS, FS_READ_DIR, FS_READ_FILE, FS_WRITE_FILE,
    },
    FileReference, FileSystemService, FsFuture, HostResult,
};
use serde_json::{json, Value};

use crate::bridge::DesktopBridge;

#[derive(Debug, Clone, Default)]
/// Pass-through filesystem over the desktop IPC bridge.
pub struct DesktopFileSystem {
    bridge: DesktopBridge,
}

impl DesktopFileSystem {
    /// Creates a filesystem strategy over the given bridge.
    pub fn new(bridge: DesktopBridge) -> Self {
        Self { bridge }
    }

    async fn forward(&self, channel: &str, path: &str) -> HostResult<()> {
        self.bridge.invoke(channel, json!({ "path": path })).await?;
        Ok(())
    }
}

impl FileSystemService for DesktopFileSystem {
    fn read_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<String>> {
        Box::pin(async move {
            self.bridge
                .invoke_as(FS_READ_FILE, json!({ "path": path }))
                .await
        })
    }

    fn write_file<'a>(&'a self, path: &'a str, content: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(async move {
            self.bridge
                .invoke(FS_WRITE_FILE, json!({ "path": path, "content": content }))
                .await?;
            Ok(())
        })
    }

    fn delete_file<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(self.forward(FS_DELETE_FILE, path))
    }

    fn exists<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<bool>> {
        Box::pin(async move { self.bridge.invoke_as(FS_EXISTS, json!({ "path": path })).await })
    }

    fn read_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<Vec<String>>> {
        Box::pin(async move {
            self.bridge
                .invoke_as(FS_READ_DIR, json!({ "path": path }))
                .await
        })
    }

    fn create_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(self.forward(FS_CREATE_DIR, path))
    }

    fn delete_dir<'a>(&'a self, path: &'a str) -> FsFuture<'a, HostResult<()>> {
        Box::pin(self.forward(FS_DELETE_DIR, path))
    }

    fn open_file_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move { self.bridge.invoke_as(DIALOG_OPEN_FILE, Value::Null).await })
    }

    fn open_directory_picker<'a>(&'a self) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            self.bridge
                .invoke_as(DIALOG_OPEN_DIRECTORY, Value::Null)
                .await
        })
    }

    fn save_file_picker<'a>(
        &'a self,
        default_name: Option<&'a str>,
    ) -> FsFuture<'a, HostResult<Option<FileReference>>> {
        Box::pin(async move {
            self.bridge
                .invoke_as(DIALOG_SAVE_FILE, json!({ "defaultName": default_name }))
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use platform_host::HostError;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::RecordingBridge;

    fn fs_with(bridge: &Rc<RecordingBridge>) -> DesktopFileSystem {
        DesktopFileSystem::new(DesktopBridge::new(Rc::clone(bridge) as _))
    }

    #[test]
    fn file_operations_forward_path_payloads() {
        let bridge = Rc::new(RecordingBridge::default());
        bridge.respond(FS_READ_FILE, Ok(json!("hello")));
        bridge.respond(FS_READ_DIR, Ok(json!(["a.txt", "sub"])));
        bridge.respond(FS_EXISTS, Ok(json!(true)));
        let fs = fs_with(&bridge);

        block_on(fs.write_file("/notes/a.txt", "hello")).expect("write");
        assert_eq!(block_on(fs.read_file("/notes/a.txt")).expect("read"), "hello");
        assert!(block_on(fs.exists("/notes")).expect("exists"));
        assert_eq!(
            block_on(fs.read_dir("/notes")).expect("read_dir"),
            vec!["a.txt".to_string(), "sub".to_string()]
        );
        block_on(fs.delete_dir("/notes")).expect("delete_dir");

        assert_eq!(
            bridge.invoked(),
            vec![
                (
                    FS_WRITE_FILE.to_string(),
                    json!({"path": "/notes/a.txt", "content": "hello"})
                ),
                (FS_READ_FILE.to_string(), json!({"path": "/notes/a.txt"})),
                (FS_EXISTS.to_string(), json!({"path": "/notes"})),
                (FS_READ_DIR.to_string(), json!({"path": "/notes"})),
                (FS_DELETE_DIR.to_string(), json!({"path": "/notes"})),
            ]
        );
    }

    #[test]
    fn dialogs_map_null_to_cancelled() {
        let bridge = Rc::new(RecordingBridge::default());
        bridge.respond(
            DIALOG_SAVE_FILE,
            Ok(json!({"name": "report.txt", "path": "/home/u/report.txt"})),
        );
        let fs = fs_with(&bridge);

        assert_eq!(block_on(fs.open_file_picker()).expect("open"), None);
        assert_eq!(
            block_on(fs.save_file_picker(Some("report.txt"))).expect("save"),
            Some(FileReference::new("report.txt", "/home/u/report.txt"))
        );
        assert_eq!(
            bridge.invoked().last(),
            Some(&(
                DIALOG_SAVE_FILE.to_string(),
                json!({"defaultName": "report.txt"})
            ))
        );
    }

    #[test]
    fn host_not_found_errors_pass_through() {
        let bridge = Rc::new(RecordingBridge::default());
        bridge.respond(
            FS_READ_FILE,
            Err(HostError::not_found("File not found: /missing.txt")),
        );
        let fs = fs_with(&bridge);
        let err = block_on(fs.read_file("/missing.txt")).expect_err("missing");
        assert!(err.is_not_found());
    }
}
