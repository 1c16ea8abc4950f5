//! Device drivers module
//!
//! The TLMM driver and the collaborator interfaces it consumes: pin-mux
//! arbitration, the secure monitor and the wake-capable interrupt router.

pub mod mpm;
pub mod pinmux;
pub mod scm;
pub mod tlmm;

pub use mpm::WakeRouter;
pub use pinmux::PinMux;
pub use scm::SecureMonitor;
