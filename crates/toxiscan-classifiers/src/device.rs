//! Compute device selection

use candle_core::{Device, DeviceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use toxiscan_core::{Error, Result};

/// Requested compute device.
///
/// Resolved once at startup with [`DeviceSpec::resolve`]; the resulting
/// [`Device`] is reused for every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSpec {
    /// Accelerator if one is available, otherwise CPU
    #[default]
    Auto,
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU by ordinal
    Cuda(usize),
    /// Metal (Apple Silicon) by ordinal
    Metal(usize),
}

impl DeviceSpec {
    /// Create the candle device for this spec
    pub fn resolve(&self) -> Result<Device> {
        match self {
            Self::Auto => {
                if candle_core::utils::cuda_is_available() {
                    Self::Cuda(0).resolve()
                } else if candle_core::utils::metal_is_available() {
                    Self::Metal(0).resolve()
                } else {
                    Ok(Device::Cpu)
                }
            }
            Self::Cpu => Ok(Device::Cpu),
            Self::Cuda(idx) => Device::new_cuda(*idx).map_err(|e| {
                Error::config(format!("Failed to create CUDA device {}: {}", idx, e))
            }),
            Self::Metal(idx) => Device::new_metal(*idx).map_err(|e| {
                Error::config(format!("Failed to create Metal device {}: {}", idx, e))
            }),
        }
    }
}

/// Human-readable name of a resolved device, e.g. `cpu` or `cuda:0`
pub fn device_label(device: &Device) -> String {
    match device.location() {
        DeviceLocation::Cpu => "cpu".to_string(),
        DeviceLocation::Cuda { gpu_id } => format!("cuda:{}", gpu_id),
        DeviceLocation::Metal { gpu_id } => format!("metal:{}", gpu_id),
    }
}

impl FromStr for DeviceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        let (kind, ordinal) = match value.split_once(':') {
            Some((kind, ordinal)) => {
                let ordinal = ordinal.parse::<usize>().map_err(|_| {
                    Error::config(format!("Invalid device ordinal in '{}'", s))
                })?;
                (kind, Some(ordinal))
            }
            None => (value.as_str(), None),
        };

        match (kind, ordinal) {
            ("auto", None) => Ok(Self::Auto),
            ("cpu", None) => Ok(Self::Cpu),
            ("cuda" | "gpu", ordinal) => Ok(Self::Cuda(ordinal.unwrap_or(0))),
            ("metal" | "mps", ordinal) => Ok(Self::Metal(ordinal.unwrap_or(0))),
            _ => Err(Error::config(format!(
                "Unknown device '{}' (expected auto, cpu, cuda[:N] or metal[:N])",
                s
            ))),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{}", idx),
            Self::Metal(idx) => write!(f, "metal:{}", idx),
        }
    }
}

impl TryFrom<String> for DeviceSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceSpec> for String {
    fn from(spec: DeviceSpec) -> Self {
        spec.to_string()
    }
}
