use utils::ActivationRequest;

use crate::adapter::{ActivationCallback, Role, Transport};
use crate::signal_bridge::SignalBridge;
use crate::{procs, IpcError, ACTIVATION_SIGNAL};

/// Fallback transport: Unix signals, relayed into the main loop by
/// [`SignalBridge`] on the server side. Fire-and-forget by nature; a send
/// only confirms that a peer was found and the kernel accepted the signal,
/// never that the peer processed it.
pub struct SignalTransportAdapter {
    role: Role,
    process_name: String,
    bridge: Option<SignalBridge>,
}

impl SignalTransportAdapter {
    pub fn new(
        role: Role,
        process_name: &str,
        on_activation: ActivationCallback,
    ) -> Result<Self, IpcError> {
        let bridge = if role.is_server() {
            Some(SignalBridge::new(&[ACTIVATION_SIGNAL], move |signum| {
                if signum == ACTIVATION_SIGNAL {
                    on_activation(ActivationRequest::WakeAndTranslate);
                } else {
                    log::warn!("signal transport: ignoring unexpected signum={signum}");
                }
            })?)
        } else {
            None
        };

        Ok(Self {
            role,
            process_name: process_name.to_string(),
            bridge,
        })
    }

    /// Disarm the server-side bridge. Tests and orderly shutdown only.
    pub fn teardown(mut self) {
        if let Some(bridge) = self.bridge.take() {
            bridge.teardown();
        }
    }
}

impl Transport for SignalTransportAdapter {
    fn name(&self) -> &'static str {
        "signal"
    }

    fn is_available(&self) -> bool {
        cfg!(unix)
    }

    fn provides_instance_guard(&self) -> bool {
        false
    }

    fn role(&self) -> Role {
        self.role
    }

    fn send(&self, request: ActivationRequest) -> Result<(), IpcError> {
        debug_assert!(self.role.is_client(), "send is a client-role operation");
        let sig = match request {
            ActivationRequest::WakeAndTranslate => ACTIVATION_SIGNAL,
        };

        // Fresh enumeration per attempt; a stale pid list would race with
        // instance restarts.
        for peer in procs::find_peers(&self.process_name) {
            let rc = unsafe { libc::kill(peer.pid, sig) };
            if rc == 0 {
                log::info!("sent signal {sig} to pid {}", peer.pid);
                return Ok(());
            }
            // Typically ESRCH: the peer exited between enumeration and
            // delivery. Treat as a miss and keep looking.
            log::debug!(
                "kill pid={} failed: {}",
                peer.pid,
                std::io::Error::last_os_error()
            );
        }

        log::info!("no running instance found (searched for '{}')", self.process_name);
        Err(IpcError::NoPeerFound)
    }
}
