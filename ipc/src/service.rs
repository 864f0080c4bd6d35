use std::sync::Arc;

use utils::ActivationRequest;

use crate::adapter::{ActivationCallback, Role, Transport};
use crate::bus::BusAdapter;
use crate::signal_transport::SignalTransportAdapter;
use crate::{IpcError, PROCESS_NAME};

/// Lazily-built transport candidate. Construction is deferred so a losing
/// candidate costs nothing (the signal variant arms OS handlers when built
/// in server role, which must not happen if the bus wins).
pub type Candidate = Box<dyn FnOnce() -> Result<Box<dyn Transport>, IpcError>>;

/// Facade over the selected transport: the rest of the application never
/// sees which variant is live.
pub struct ActivationService {
    role: Role,
    adapter: Box<dyn Transport>,
}

impl ActivationService {
    /// Fixed preference order, chosen once per process: the bus first (it
    /// gives a confirmable round-trip call), signals as the best-effort
    /// fallback. Server-role construction fails loudly when another
    /// instance already owns the bus name, and deterministically when no
    /// transport is usable at all.
    pub fn new(role: Role, on_activation: ActivationCallback) -> Result<Self, IpcError> {
        let bus_cb = on_activation.clone();
        let signal_cb = on_activation;
        Self::from_candidates(
            role,
            vec![
                Box::new(move || {
                    BusAdapter::new(role, wrap_delivery(bus_cb))
                        .map(|a| Box::new(a) as Box<dyn Transport>)
                }),
                Box::new(move || {
                    SignalTransportAdapter::new(role, PROCESS_NAME, wrap_delivery(signal_cb))
                        .map(|a| Box::new(a) as Box<dyn Transport>)
                }),
            ],
        )
    }

    /// Client-role convenience for the `--activate` invocation; it never
    /// receives calls, so no callback is wired.
    pub fn new_client() -> Result<Self, IpcError> {
        Self::new(Role::Client, Arc::new(|_| {}))
    }

    /// The selection policy, in one place. Also the seam tests use to
    /// inject fake transports.
    pub fn from_candidates(role: Role, candidates: Vec<Candidate>) -> Result<Self, IpcError> {
        for build in candidates {
            let adapter = build()?;
            if adapter.is_available() {
                log::info!("activation transport: {}", adapter.name());
                return Ok(Self { role, adapter });
            }
            log::debug!("activation transport unavailable: {}", adapter.name());
        }
        Err(IpcError::TransportUnavailable)
    }

    /// Fire the one logical call at the running primary instance. One send,
    /// no retry; blocking semantics are the adapter's own.
    pub fn request_activation(&self) -> Result<(), IpcError> {
        debug_assert!(
            self.role.is_client(),
            "request_activation is a client-role operation"
        );
        if !self.adapter.is_available() {
            return Err(IpcError::TransportUnavailable);
        }
        self.adapter.send(ActivationRequest::WakeAndTranslate)
    }

    pub fn transport_name(&self) -> &'static str {
        self.adapter.name()
    }

    /// False means the caller must hold an [`crate::InstanceLock`] to keep
    /// the single-instance contract (see [`Transport::provides_instance_guard`]).
    pub fn provides_instance_guard(&self) -> bool {
        self.adapter.provides_instance_guard()
    }
}

/// Single delivery point for incoming activations, regardless of transport.
fn wrap_delivery(user: ActivationCallback) -> ActivationCallback {
    Arc::new(move |req| {
        log::debug!("activation received: request={}", req.name());
        user(req);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeTransport {
        name: &'static str,
        available: bool,
        sent: Rc<RefCell<Vec<&'static str>>>,
        outcome: fn() -> Result<(), IpcError>,
    }

    impl FakeTransport {
        fn candidate(
            name: &'static str,
            available: bool,
            sent: Rc<RefCell<Vec<&'static str>>>,
            outcome: fn() -> Result<(), IpcError>,
        ) -> Candidate {
            Box::new(move || {
                Ok(Box::new(FakeTransport {
                    name,
                    available,
                    sent,
                    outcome,
                }) as Box<dyn Transport>)
            })
        }
    }

    impl Transport for FakeTransport {
        fn name(&self) -> &'static str {
            self.name
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn provides_instance_guard(&self) -> bool {
            self.name == "bus"
        }
        fn role(&self) -> Role {
            Role::Client
        }
        fn send(&self, request: ActivationRequest) -> Result<(), IpcError> {
            self.sent.borrow_mut().push(request.name());
            (self.outcome)()
        }
    }

    #[test]
    fn request_activation_sends_exactly_once() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let service = ActivationService::from_candidates(
            Role::Client,
            vec![FakeTransport::candidate("bus", true, sent.clone(), || Ok(()))],
        )
        .unwrap();

        service.request_activation().unwrap();
        assert_eq!(*sent.borrow(), vec!["wake-and-translate"]);
    }

    #[test]
    fn selection_prefers_the_first_available_candidate() {
        let bus_sent = Rc::new(RefCell::new(Vec::new()));
        let sig_sent = Rc::new(RefCell::new(Vec::new()));
        let service = ActivationService::from_candidates(
            Role::Client,
            vec![
                FakeTransport::candidate("bus", false, bus_sent.clone(), || Ok(())),
                FakeTransport::candidate("signal", true, sig_sent.clone(), || Ok(())),
            ],
        )
        .unwrap();

        assert_eq!(service.transport_name(), "signal");
        service.request_activation().unwrap();
        assert!(bus_sent.borrow().is_empty());
        assert_eq!(sig_sent.borrow().len(), 1);
    }

    #[test]
    fn no_available_transport_fails_deterministically() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let result = ActivationService::from_candidates(
            Role::Server,
            vec![
                FakeTransport::candidate("bus", false, sent.clone(), || Ok(())),
                FakeTransport::candidate("signal", false, sent.clone(), || Ok(())),
            ],
        );
        assert!(matches!(result, Err(IpcError::TransportUnavailable)));
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn no_peer_outcome_is_propagated_untouched() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let service = ActivationService::from_candidates(
            Role::Client,
            vec![FakeTransport::candidate("signal", true, sent.clone(), || {
                Err(IpcError::NoPeerFound)
            })],
        )
        .unwrap();

        assert!(matches!(
            service.request_activation(),
            Err(IpcError::NoPeerFound)
        ));
        assert_eq!(sent.borrow().len(), 1);
    }
}
