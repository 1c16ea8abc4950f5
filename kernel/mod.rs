//! Host kernel interfaces
//!
//! Traits describing what the surrounding kernel provides to, and expects
//! from, a GPIO/interrupt chip driver, plus the lock the driver uses.

pub mod gpio;
pub mod irq;
pub mod sync;
