//! Pin-mux arbitration interface
//!
//! The pin-mux service decides which peripheral function owns a pad. The
//! GPIO driver asks it for the pad before handing a line to a consumer.

use crate::Result;

/// Pad ownership arbitration
pub trait PinMux {
    /// Reserve `pin` for GPIO use
    ///
    /// Fails with [`crate::Error::AlreadyOwned`] if another function holds
    /// the pad.
    fn reserve(&self, pin: u32) -> Result<()>;

    /// Give `pin` back to the arbiter
    fn release(&self, pin: u32);
}
