//! Hardware acceleration detection.

use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Whether inference can run on an accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    Accelerated,
    CpuFallback,
    #[default]
    Unknown,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Accelerated => "accelerated",
            DeviceClass::CpuFallback => "cpu-fallback",
            DeviceClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device nodes exposed by GPU drivers (NVIDIA, AMD ROCm).
const ACCELERATOR_NODES: &[&str] = &["/dev/nvidia0", "/dev/kfd"];

/// Probe the host for a usable accelerator.
///
/// `RAI_DEVICE=cpu|gpu` overrides the probe. Never fails: anything that
/// cannot be determined yields [`DeviceClass::CpuFallback`].
pub fn detect_device() -> DeviceClass {
    match std::env::var("RAI_DEVICE").ok().as_deref() {
        Some("cpu") => return DeviceClass::CpuFallback,
        Some("gpu") => return DeviceClass::Accelerated,
        _ => {}
    }

    if cfg!(target_os = "macos") {
        debug!("Metal available on macOS");
        return DeviceClass::Accelerated;
    }

    if let Some(node) = ACCELERATOR_NODES.iter().find(|n| Path::new(n).exists()) {
        debug!("Found accelerator device node {}", node);
        return DeviceClass::Accelerated;
    }

    if has_render_node(Path::new("/dev/dri")) {
        debug!("Found DRI render node");
        return DeviceClass::Accelerated;
    }

    debug!("No accelerator found, using CPU");
    DeviceClass::CpuFallback
}

fn has_render_node(dri: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dri) else {
        return false;
    };
    entries
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name().to_string_lossy().starts_with("renderD"))
}
