//! Display settings shared by every job a renderer issues.
//!
//! The device scale factor is process-wide, mirroring how rendering engines treat screen
//! density. A [`DisplayModel`] snapshots it when created, so changing the factor only
//! affects renderers constructed afterwards.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::Error;

/// Nominal tile edge in pixels before device scaling.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Largest tile edge a device scale may produce. A 32-bit ARGB tile this size is 256 MiB.
pub const MAX_TILE_SIZE: u32 = 8192;

// Bit pattern of 1.0f32.
static DEVICE_SCALE_FACTOR: AtomicU32 = AtomicU32::new(0x3f80_0000);

/// Sets the process-wide device scale factor.
///
/// Must not be called while a render is in progress.
pub fn set_device_scale_factor(scale: f32) -> Result<(), Error> {
    validate_scale(scale)?;
    DEVICE_SCALE_FACTOR.store(scale.to_bits(), Ordering::SeqCst);
    Ok(())
}

pub fn device_scale_factor() -> f32 {
    f32::from_bits(DEVICE_SCALE_FACTOR.load(Ordering::SeqCst))
}

pub(crate) fn validate_scale(scale: f32) -> Result<(), Error> {
    if scale.is_finite() && scale > 0.0 && scaled_tile_size(scale) <= f64::from(MAX_TILE_SIZE) {
        Ok(())
    } else {
        Err(Error::InvalidDeviceScale(scale))
    }
}

fn scaled_tile_size(scale: f32) -> f64 {
    (f64::from(DEFAULT_TILE_SIZE) * f64::from(scale)).round().max(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayModel {
    device_scale: f32,
    tile_size: u32,
}

impl DisplayModel {
    /// Creates a display model using the current process-wide device scale factor.
    pub fn new() -> Self {
        // The process-wide factor is validated when it is set
        Self::scaled(device_scale_factor())
    }

    /// Creates a display model with its own device scale, ignoring the process-wide one.
    pub fn with_device_scale(device_scale: f32) -> Result<Self, Error> {
        validate_scale(device_scale)?;
        Ok(Self::scaled(device_scale))
    }

    fn scaled(device_scale: f32) -> Self {
        Self {
            device_scale,
            tile_size: scaled_tile_size(device_scale) as u32,
        }
    }

    /// Tile edge in pixels, device scale included.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn device_scale(&self) -> f32 {
        self.device_scale
    }
}

impl Default for DisplayModel {
    fn default() -> Self {
        Self::new()
    }
}
