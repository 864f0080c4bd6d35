use glib::prelude::*;

use utils::ActivationRequest;

use crate::adapter::{ActivationCallback, Role, Transport};
use crate::{IpcError, SERVICE_NAME};

const OBJECT_PATH: &str = "/";
const BUS_IFACE: &str = "io.github.linguatray.Activation";

// org.freedesktop.DBus.RequestName wire constants.
const DBUS_NAME_FLAG_DO_NOT_QUEUE: u32 = 4;
const REQUEST_NAME_REPLY_PRIMARY_OWNER: u32 = 1;

const INTROSPECTION_XML: &str = r#"
<node>
  <interface name="io.github.linguatray.Activation">
    <method name="WakeAndTranslate">
      <arg type="b" name="accepted" direction="out"/>
    </method>
  </interface>
</node>
"#;

/// Session-bus activation transport.
///
/// Server role registers the activation object and claims [`SERVICE_NAME`];
/// a claim rejection means another primary instance is already running and
/// construction fails loudly. Client role resolves the name per send and
/// issues a blocking call. Incoming method calls are dispatched by gio on
/// the main loop, which is what makes the activation callback safe to wire
/// straight into UI state.
pub struct BusAdapter {
    role: Role,
    conn: Option<gio::DBusConnection>,
    _registration: Option<gio::RegistrationId>,
}

impl BusAdapter {
    /// A missing session bus is not an error here: the adapter reports
    /// unavailable and the service falls back to the signal transport.
    pub fn new(role: Role, on_activation: ActivationCallback) -> Result<Self, IpcError> {
        let conn = match gio::bus_get_sync(gio::BusType::Session, None::<&gio::Cancellable>) {
            Ok(c) => Some(c),
            Err(e) => {
                log::debug!("session bus unavailable: {e}");
                None
            }
        };

        let mut registration = None;
        if let Some(conn) = conn.as_ref() {
            if role.is_server() {
                registration = Some(Self::register_server(conn, on_activation)?);
            }
        }

        Ok(Self {
            role,
            conn,
            _registration: registration,
        })
    }

    /// Export the object before claiming the name, so a caller can never
    /// resolve the name without the method behind it.
    fn register_server(
        conn: &gio::DBusConnection,
        on_activation: ActivationCallback,
    ) -> Result<gio::RegistrationId, IpcError> {
        let node = gio::DBusNodeInfo::for_xml(INTROSPECTION_XML)
            .map_err(|e| IpcError::Setup(format!("parse introspection: {e}")))?;
        let iface = node
            .lookup_interface(BUS_IFACE)
            .ok_or_else(|| IpcError::Setup(format!("interface {BUS_IFACE} missing")))?;

        let registration = conn
            .register_object(OBJECT_PATH, &iface)
            .method_call(move |_conn, _sender, _path, _iface, method, _params, invocation| {
                match ActivationRequest::from_bus_method(method) {
                    Some(req) => {
                        log::debug!("bus: method call {method}");
                        on_activation(req);
                        invocation.return_value(Some(&(true,).to_variant()));
                    }
                    None => {
                        invocation.return_error(
                            gio::DBusError::UnknownMethod,
                            &format!("unknown method {method}"),
                        );
                    }
                }
            })
            .build()
            .map_err(|e| IpcError::Setup(format!("register activation object: {e}")))?;

        let reply = conn
            .call_sync(
                Some("org.freedesktop.DBus"),
                "/org/freedesktop/DBus",
                "org.freedesktop.DBus",
                "RequestName",
                Some(&(SERVICE_NAME, DBUS_NAME_FLAG_DO_NOT_QUEUE).to_variant()),
                None,
                gio::DBusCallFlags::NONE,
                -1,
                None::<&gio::Cancellable>,
            )
            .map_err(|e| IpcError::Setup(format!("request name {SERVICE_NAME}: {e}")))?;

        match reply.get::<(u32,)>() {
            Some((REQUEST_NAME_REPLY_PRIMARY_OWNER,)) => {
                log::info!("bus: owning {SERVICE_NAME}");
                Ok(registration)
            }
            _ => {
                let _ = conn.unregister_object(registration);
                Err(IpcError::AlreadyRunning(format!(
                    "bus name {SERVICE_NAME} is taken"
                )))
            }
        }
    }

    fn peer_is_running(&self, conn: &gio::DBusConnection) -> Result<bool, IpcError> {
        let reply = conn
            .call_sync(
                Some("org.freedesktop.DBus"),
                "/org/freedesktop/DBus",
                "org.freedesktop.DBus",
                "NameHasOwner",
                Some(&(SERVICE_NAME,).to_variant()),
                None,
                gio::DBusCallFlags::NONE,
                -1,
                None::<&gio::Cancellable>,
            )
            .map_err(|e| IpcError::RemoteCall(format!("NameHasOwner: {e}")))?;
        Ok(reply.get::<(bool,)>().map(|(b,)| b).unwrap_or(false))
    }
}

impl Transport for BusAdapter {
    fn name(&self) -> &'static str {
        "bus"
    }

    fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    fn provides_instance_guard(&self) -> bool {
        true
    }

    fn role(&self) -> Role {
        self.role
    }

    fn send(&self, request: ActivationRequest) -> Result<(), IpcError> {
        debug_assert!(self.role.is_client(), "send is a client-role operation");
        let conn = self.conn.as_ref().ok_or(IpcError::TransportUnavailable)?;

        // An unowned name is "not running", not a call failure.
        if !self.peer_is_running(conn)? {
            log::info!("no running instance found (bus name {SERVICE_NAME} unowned)");
            return Err(IpcError::NoPeerFound);
        }

        log::debug!("bus: calling {} on {SERVICE_NAME}", request.bus_method());
        let reply = conn
            .call_sync(
                Some(SERVICE_NAME),
                OBJECT_PATH,
                BUS_IFACE,
                request.bus_method(),
                None,
                None,
                gio::DBusCallFlags::NONE,
                -1,
                None::<&gio::Cancellable>,
            )
            .map_err(|e| IpcError::RemoteCall(e.to_string()))?;

        match reply.get::<(bool,)>() {
            Some((true,)) => Ok(()),
            Some((false,)) => Err(IpcError::RemoteCall("peer rejected the request".into())),
            None => Err(IpcError::RemoteCall("malformed reply".into())),
        }
    }
}
