//! msm-tlmm - MSM TLMM v2 GPIO and summary-interrupt controller
//!
//! This library drives the "top level mode multiplexer" pin block found on
//! MSM8x60-class SoCs. It exposes every pad as a GPIO line, demultiplexes the
//! single TLMM summary interrupt into one virtual interrupt per line and
//! emulates dual-edge triggering, which the pad hardware lacks.

#![cfg_attr(not(test), no_std)]

// Core modules
pub mod utils;
pub mod config;

// Host kernel interfaces: interrupt framework and locking
pub mod kernel;

// Device drivers
pub mod drivers;

// Re-export key types for convenience
pub use config::TlmmConfig;
pub use drivers::tlmm::TlmmGpio;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common error type for the TLMM driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Line index outside `[0, ngpio)`, or a direct-connect slot out of range
    InvalidLineIndex,
    /// The pad is already claimed by another function
    AlreadyOwned,
    /// The secure monitor rejected a protected register write
    SecureWriteFailed,
    /// Dual-edge re-arm never stabilized
    InterruptsDropped,
    /// Interrupt number does not belong to this controller
    InvalidIrq,
    /// Controller configuration rejected at attach
    InvalidConfig,
    /// Host framework refused a registration
    ResourceBusy,
    /// Host framework could not find what we tried to remove
    NotFound,
    /// Attribute is read-only
    PermissionDenied,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::InvalidLineIndex => "invalid line index",
            Error::AlreadyOwned => "pad already owned",
            Error::SecureWriteFailed => "secure write failed",
            Error::InterruptsDropped => "dual-edge irq failed to stabilize, interrupts dropped",
            Error::InvalidIrq => "irq not owned by this controller",
            Error::InvalidConfig => "invalid controller configuration",
            Error::ResourceBusy => "resource busy",
            Error::NotFound => "not found",
            Error::PermissionDenied => "permission denied",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "embedded-hal")]
impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;
