//! Channel names shared by adapters and backing services, and endpoint derivation.

/// Prepares the structured store.
pub const DB_INITIALIZE: &str = "db:initialize";
/// Returns every matching record.
pub const DB_QUERY: &str = "db:query";
/// Applies a mutating statement.
pub const DB_EXECUTE: &str = "db:execute";
/// Returns the first matching record or null.
pub const DB_GET: &str = "db:get";
/// Releases the structured store.
pub const DB_CLOSE: &str = "db:close";

/// Reads a text file.
pub const FS_READ_FILE: &str = "fs:readFile";
/// Writes a text file.
pub const FS_WRITE_FILE: &str = "fs:writeFile";
/// Deletes a file.
pub const FS_DELETE_FILE: &str = "fs:deleteFile";
/// Tests path existence.
pub const FS_EXISTS: &str = "fs:exists";
/// Lists a directory.
pub const FS_READ_DIR: &str = "fs:readDir";
/// Creates a directory.
pub const FS_CREATE_DIR: &str = "fs:createDir";
/// Deletes a directory.
pub const FS_DELETE_DIR: &str = "fs:deleteDir";

/// Native open-file dialog.
pub const DIALOG_OPEN_FILE: &str = "dialog:openFile";
/// Native open-directory dialog.
pub const DIALOG_OPEN_DIRECTORY: &str = "dialog:openDirectory";
/// Native save-file dialog.
pub const DIALOG_SAVE_FILE: &str = "dialog:saveFile";

/// Default path prefix for HTTP request endpoints.
pub const DEFAULT_API_BASE: &str = "/api";

/// Builds the HTTP endpoint for a channel under an API base URL or path.
pub fn api_endpoint(api_base: &str, channel: &str) -> String {
    format!("{}/{channel}", api_base.trim_end_matches('/'))
}

/// Builds the WebSocket endpoint for a channel from the page/server origin.
///
/// `https` origins map to `wss`; everything else maps to `ws`. Any path on the origin is
/// ignored.
pub fn socket_endpoint(origin: &str, channel: &str) -> String {
    let (secure, rest) = match origin.split_once("://") {
        Some((scheme, rest)) => (scheme.eq_ignore_ascii_case("https"), rest),
        None => (false, origin),
    };
    let host = rest.split('/').next().unwrap_or_default();
    let scheme = if secure { "wss" } else { "ws" };
    format!("{scheme}://{host}/ws/{channel}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_endpoint_appends_channel_to_base() {
        assert_eq!(api_endpoint("/api", DB_QUERY), "/api/db:query");
        assert_eq!(
            api_endpoint("http://localhost:8080/api/", "app:ping"),
            "http://localhost:8080/api/app:ping"
        );
    }

    #[test]
    fn socket_endpoint_follows_origin_security() {
        assert_eq!(
            socket_endpoint("https://example.com", "chat:stream"),
            "wss://example.com/ws/chat:stream"
        );
        assert_eq!(
            socket_endpoint("http://127.0.0.1:8080/app/index.html", "events"),
            "ws://127.0.0.1:8080/ws/events"
        );
        assert_eq!(socket_endpoint("localhost:3000", "x"), "ws://localhost:3000/ws/x");
    }
}
