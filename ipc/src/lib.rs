//! Single-instance coordination and cross-process activation.
//!
//! A long-running primary instance exposes one logical call
//! ("wake-and-translate"); a short-lived secondary invocation of the same
//! binary delivers it and exits. The session bus is the preferred transport
//! because it gives a confirmable round-trip call; Unix signals relayed
//! through [`SignalBridge`] are the best-effort fallback.

mod adapter;
mod bus;
mod error;
mod lock;
pub mod procs;
mod service;
mod signal_bridge;
mod signal_transport;

pub use adapter::{ActivationCallback, Role, Transport};
pub use bus::BusAdapter;
pub use error::IpcError;
pub use lock::InstanceLock;
pub use service::{ActivationService, Candidate};
pub use signal_bridge::SignalBridge;
pub use signal_transport::SignalTransportAdapter;

/// Well-known name registered on the session bus by the primary instance.
pub const SERVICE_NAME: &str = "io.github.linguatray";

/// Process name the signal transport looks for when hunting a peer.
/// Must match the installed binary name.
pub const PROCESS_NAME: &str = "linguatray";

/// The activation signal. Carried as its raw number through the self-pipe.
pub const ACTIVATION_SIGNAL: i32 = libc::SIGUSR1;
