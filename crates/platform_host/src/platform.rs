//! Platform detection and capability reporting.
//!
//! Every function here is a pure classification of a [`RuntimeSnapshot`]. Nothing is
//! cached: callers that want a fresh answer take a fresh snapshot.

use serde::{Deserialize, Serialize};

/// Agent-string tokens identifying an embedded desktop host webview.
pub const DESKTOP_AGENT_SIGNATURES: &[&str] = &["electron", "tauri"];

/// Environment variable consulted for the agent string of native processes.
pub const HOST_USER_AGENT_ENV: &str = "HOST_USER_AGENT";

/// Host family the UI is running inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Embedded in a desktop host that injects an IPC bridge.
    Desktop,
    /// Plain browser tab or installed web app.
    Web,
}

impl Platform {
    /// Returns a stable string token for diagnostics and runtime inspection.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Web => "web",
        }
    }
}

/// Filesystem strategy the runtime can support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilesystemMode {
    /// Native OS calls through the desktop host.
    Native,
    /// Capability-scoped file handles granted through browser pickers.
    Scoped,
    /// In-memory simulated filesystem.
    Virtual,
}

/// Structured storage strategy the runtime can support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    /// Relational engine owned by the desktop host.
    Relational,
    /// Browser-native object store.
    ObjectStore,
}

/// Computed report of what the current runtime can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Host family.
    pub platform: Platform,
    /// Filesystem strategy.
    pub filesystem: FilesystemMode,
    /// Structured storage strategy.
    pub storage: StorageMode,
    /// Whether user-facing notifications can be shown.
    pub notifications: bool,
    /// Whether the application keeps working offline.
    pub offline: bool,
}

/// Snapshot of the runtime features that drive platform classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    /// A desktop host injected its IPC bridge object.
    pub desktop_bridge: bool,
    /// Self-reported agent string.
    pub user_agent: String,
    /// Service-worker registration API is present.
    pub service_worker_api: bool,
    /// File-picker (File System Access) API is present.
    pub file_picker_api: bool,
    /// Notification API is present.
    pub notification_api: bool,
    /// The page is displayed in standalone (installed app) mode.
    pub standalone_display: bool,
}

impl RuntimeSnapshot {
    /// Snapshot of a native, non-browser process.
    ///
    /// No bridge or browser API is present; the agent string comes from
    /// [`HOST_USER_AGENT_ENV`] when set.
    pub fn native() -> Self {
        Self {
            user_agent: std::env::var(HOST_USER_AGENT_ENV).unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// Returns `true` when running embedded in a desktop host.
pub fn is_desktop(runtime: &RuntimeSnapshot) -> bool {
    if runtime.desktop_bridge {
        return true;
    }
    let agent = runtime.user_agent.to_lowercase();
    DESKTOP_AGENT_SIGNATURES
        .iter()
        .any(|signature| agent.contains(signature))
}

/// Returns `true` when running in a plain browser context.
pub fn is_web(runtime: &RuntimeSnapshot) -> bool {
    !is_desktop(runtime)
}

/// Classifies the host family.
pub fn platform(runtime: &RuntimeSnapshot) -> Platform {
    if is_desktop(runtime) {
        Platform::Desktop
    } else {
        Platform::Web
    }
}

/// Returns `true` when the web app runs as an installed, standalone app.
pub fn is_installed_app(runtime: &RuntimeSnapshot) -> bool {
    runtime.standalone_display
}

/// Builds the capability report for a runtime snapshot.
pub fn capabilities(runtime: &RuntimeSnapshot) -> CapabilityDescriptor {
    if is_desktop(runtime) {
        return CapabilityDescriptor {
            platform: Platform::Desktop,
            filesystem: FilesystemMode::Native,
            storage: StorageMode::Relational,
            notifications: true,
            offline: true,
        };
    }

    CapabilityDescriptor {
        platform: Platform::Web,
        filesystem: if runtime.file_picker_api {
            FilesystemMode::Scoped
        } else {
            FilesystemMode::Virtual
        },
        storage: StorageMode::ObjectStore,
        notifications: runtime.notification_api,
        offline: runtime.service_worker_api,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn browser_snapshot(agent: &str) -> RuntimeSnapshot {
        RuntimeSnapshot {
            user_agent: agent.to_string(),
            ..RuntimeSnapshot::default()
        }
    }

    #[test]
    fn plain_browser_reports_web_without_native_filesystem() {
        let runtime = browser_snapshot("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0");
        assert_eq!(platform(&runtime), Platform::Web);
        assert_eq!(platform(&runtime).as_str(), "web");

        let caps = capabilities(&runtime);
        assert_ne!(caps.filesystem, FilesystemMode::Native);
        assert_eq!(caps.filesystem, FilesystemMode::Virtual);
        assert_eq!(caps.storage, StorageMode::ObjectStore);
        assert!(!caps.notifications);
        assert!(!caps.offline);
    }

    #[test]
    fn injected_bridge_or_agent_signature_reports_desktop() {
        let bridged = RuntimeSnapshot {
            desktop_bridge: true,
            ..RuntimeSnapshot::default()
        };
        assert!(is_desktop(&bridged));

        let by_agent = browser_snapshot("Mozilla/5.0 AppleWebKit Chrome/120 Electron/28.1.0");
        assert!(is_desktop(&by_agent));
        assert!(!is_web(&by_agent));

        assert_eq!(
            capabilities(&by_agent),
            CapabilityDescriptor {
                platform: Platform::Desktop,
                filesystem: FilesystemMode::Native,
                storage: StorageMode::Relational,
                notifications: true,
                offline: true,
            }
        );
    }

    #[test]
    fn web_capabilities_follow_feature_detection() {
        let runtime = RuntimeSnapshot {
            user_agent: "Mozilla/5.0 Chrome/126".to_string(),
            service_worker_api: true,
            file_picker_api: true,
            notification_api: true,
            ..RuntimeSnapshot::default()
        };
        let caps = capabilities(&runtime);
        assert_eq!(caps.filesystem, FilesystemMode::Scoped);
        assert!(caps.notifications);
        assert!(caps.offline);
    }

    #[test]
    fn installed_app_follows_standalone_display() {
        let mut runtime = browser_snapshot("Mozilla/5.0");
        assert!(!is_installed_app(&runtime));
        runtime.standalone_display = true;
        assert!(is_installed_app(&runtime));
    }

    #[test]
    fn capability_serde_tokens_are_stable() {
        assert_eq!(
            serde_json::to_string(&FilesystemMode::Scoped).expect("serialize"),
            "\"scoped\""
        );
        assert_eq!(
            serde_json::to_string(&StorageMode::ObjectStore).expect("serialize"),
            "\"object-store\""
        );
        assert_eq!(
            serde_json::to_string(&Platform::Desktop).expect("serialize"),
            "\"desktop\""
        );
    }
}
