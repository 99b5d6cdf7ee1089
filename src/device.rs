//! Execution device registry
//!
//! Nodes pick where their work runs by asking a [`DeviceManager`] for the
//! default computation device. The registry owns every [`ExecutionDevice`];
//! nodes only hold [`DeviceHandle`]s to them.
//!
//! A process-wide registry is installed once at startup with
//! [`DeviceManager::initialize`]. Code that never installs one gets a
//! host-only registry from [`DeviceManager::global`].

use crate::config::DeviceConfig;
use crate::error::{FrameStreamError, Result};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, OnceLock};

static GLOBAL_DEVICES: OnceLock<DeviceManager> = OnceLock::new();

/// Name of the host device every registry starts with
pub const HOST_DEVICE_NAME: &str = "host";

/// Index into the registry's device table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

/// What kind of compute resource a device is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Plain CPU execution on the calling or producer thread
    Host,
    /// An accelerator (GPU, DSP, ...)
    Accelerator,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Host => write!(f, "Host"),
            DeviceKind::Accelerator => write!(f, "Accelerator"),
        }
    }
}

/// A compute target selectable per node
#[derive(Debug, PartialEq, Eq)]
pub struct ExecutionDevice {
    id: DeviceId,
    name: String,
    kind: DeviceKind,
}

impl ExecutionDevice {
    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn is_host(&self) -> bool {
        self.kind == DeviceKind::Host
    }
}

impl fmt::Display for ExecutionDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.kind, self.id)
    }
}

/// Shared, non-owning (from the node's point of view) reference to a device
pub type DeviceHandle = Arc<ExecutionDevice>;

struct DeviceTable {
    devices: Vec<DeviceHandle>,
    default: DeviceId,
}

/// Registry of execution devices
pub struct DeviceManager {
    table: RwLock<DeviceTable>,
}

impl DeviceManager {
    /// Create a registry holding only the host device, which is the default
    pub fn new() -> Self {
        let host = Arc::new(ExecutionDevice {
            id: DeviceId(0),
            name: HOST_DEVICE_NAME.to_string(),
            kind: DeviceKind::Host,
        });
        Self {
            table: RwLock::new(DeviceTable {
                devices: vec![host],
                default: DeviceId(0),
            }),
        }
    }

    /// Build a registry from configuration
    pub fn from_config(config: &DeviceConfig) -> Result<Self> {
        let manager = Self::new();
        for name in &config.accelerators {
            manager.register(name.clone(), DeviceKind::Accelerator);
        }

        if let Some(default) = &config.default_device {
            let device = manager.find(default).ok_or_else(|| {
                FrameStreamError::Device(format!("Unknown default device '{}'", default))
            })?;
            manager.set_default_computation_device(device.id())?;
        }

        Ok(manager)
    }

    /// Install the process-wide registry. Must happen at most once.
    pub fn initialize(manager: DeviceManager) -> Result<&'static DeviceManager> {
        GLOBAL_DEVICES.set(manager).map_err(|_| {
            FrameStreamError::Device("Device registry already initialized".to_string())
        })?;
        let installed = Self::global();
        tracing::info!(
            "Device registry initialized, default device: {}",
            installed.default_computation_device()
        );
        Ok(installed)
    }

    /// The process-wide registry (host-only if none was installed)
    pub fn global() -> &'static DeviceManager {
        GLOBAL_DEVICES.get_or_init(DeviceManager::new)
    }

    /// Register a new device and return a handle to it
    pub fn register(&self, name: impl Into<String>, kind: DeviceKind) -> DeviceHandle {
        let mut table = self.table.write();
        let device = Arc::new(ExecutionDevice {
            id: DeviceId(table.devices.len() as u32),
            name: name.into(),
            kind,
        });
        tracing::debug!("Registered execution device {}", device);
        table.devices.push(Arc::clone(&device));
        device
    }

    /// The device nodes use when none is set explicitly
    pub fn default_computation_device(&self) -> DeviceHandle {
        let table = self.table.read();
        Arc::clone(&table.devices[table.default.0 as usize])
    }

    pub fn set_default_computation_device(&self, id: DeviceId) -> Result<()> {
        let mut table = self.table.write();
        if id.0 as usize >= table.devices.len() {
            return Err(FrameStreamError::Device(format!("No device with {}", id)));
        }
        table.default = id;
        Ok(())
    }

    pub fn device(&self, id: DeviceId) -> Option<DeviceHandle> {
        self.table.read().devices.get(id.0 as usize).cloned()
    }

    /// Look up a device by name
    pub fn find(&self, name: &str) -> Option<DeviceHandle> {
        self.table
            .read()
            .devices
            .iter()
            .find(|d| d.name == name)
            .cloned()
    }

    pub fn devices(&self) -> Vec<DeviceHandle> {
        self.table.read().devices.clone()
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
