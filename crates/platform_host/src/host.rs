//! Host service bundle built once at startup and passed down explicitly.

use std::{fmt, rc::Rc};

use crate::{CapabilityDescriptor, FileSystemService, Platform, StorageService, TransportService};

/// Runtime-selected host services injected into application code.
///
/// All environment-specific strategy selection happens before this bundle is built, so
/// consumers never branch on desktop versus web themselves.
#[derive(Clone)]
pub struct HostServices {
    /// Structured record storage.
    pub storage: Rc<dyn StorageService>,
    /// File and directory access.
    pub filesystem: Rc<dyn FileSystemService>,
    /// Messaging with the backing service.
    pub transport: Rc<dyn TransportService>,
    /// Capability report the strategies were selected from.
    pub capabilities: CapabilityDescriptor,
}

impl HostServices {
    /// Returns the host family the services were selected for.
    pub fn platform(&self) -> Platform {
        self.capabilities.platform
    }
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
