//! Device selection.

use candle_core::Device;
use tracing::{info, warn};

/// Where the network should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DevicePreference {
    /// Metal or CUDA when compiled in and present, otherwise CPU.
    #[default]
    Accelerator,
    /// Always the CPU.
    Cpu,
}

/// Returns the device for `preference`.
///
/// Accelerators are only tried when the crate is built with the `metal` or
/// `cuda` feature. A missing device falls back to CPU with a warning.
#[must_use]
pub fn select_device(preference: DevicePreference) -> Device {
    if preference == DevicePreference::Cpu {
        info!("Running on CPU (requested)");
        return Device::Cpu;
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Running on Metal device 0");
                return device;
            }
            Err(e) => warn!("Metal device unavailable: {e}"),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Running on CUDA device 0");
                return device;
            }
            Err(e) => warn!("CUDA device unavailable: {e}"),
        }
    }

    if cfg!(any(feature = "metal", feature = "cuda")) {
        warn!("No accelerator found, running on CPU");
    } else {
        info!("Running on CPU");
    }
    Device::Cpu
}
