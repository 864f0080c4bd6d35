use std::sync::Arc;

use utils::ActivationRequest;

use crate::IpcError;

/// Invoked on the main-loop thread whenever an activation request arrives.
/// Both transports guarantee main-loop dispatch: the bus delivers method
/// calls there, and the signal path is relayed through the bridge's fd
/// watch.
pub type ActivationCallback = Arc<dyn Fn(ActivationRequest) + Send + Sync>;

/// Fixed for the lifetime of the process: whether this instance answers
/// activation calls, originates them, or both. The primary instance may
/// request `Dual` to also originate calls; the `--activate` invocation is
/// always a pure client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
    Dual,
}

impl Role {
    pub fn is_server(self) -> bool {
        matches!(self, Role::Server | Role::Dual)
    }

    pub fn is_client(self) -> bool {
        matches!(self, Role::Client | Role::Dual)
    }
}

/// Capability every activation transport provides. Exactly one adapter is
/// live per process, chosen once at [`crate::ActivationService`]
/// construction.
pub trait Transport {
    /// Transport name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether the transport can work on this host at all. For the bus this
    /// means a session-bus connection exists, not that the peer name is
    /// currently owned.
    fn is_available(&self) -> bool;

    /// Whether server-side construction already detects a second primary
    /// instance (the bus does, via well-known-name ownership). When false,
    /// the caller must hold an [`crate::InstanceLock`] instead.
    fn provides_instance_guard(&self) -> bool;

    fn role(&self) -> Role;

    /// Deliver `request` to the running primary instance. Client role only.
    /// Blocking semantics are the transport's own: the bus blocks for the
    /// round trip, the signal variant returns once the signal is dispatched.
    fn send(&self, request: ActivationRequest) -> Result<(), IpcError>;
}
