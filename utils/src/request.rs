/// Logical cross-process calls a running primary instance understands.
///
/// The set is fixed at build time and shared by the client and server roles.
/// An unrecognized wire name is a caller bug, not something negotiated at
/// runtime; `from_name`/`from_bus_method` return `None` and the transport
/// rejects the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationRequest {
    /// Show the main window and translate the current clipboard text.
    WakeAndTranslate,
}

impl ActivationRequest {
    pub const fn name(self) -> &'static str {
        match self {
            Self::WakeAndTranslate => "wake-and-translate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wake-and-translate" => Some(Self::WakeAndTranslate),
            _ => None,
        }
    }

    /// Method name on the bus interface (bus conventions want CamelCase).
    pub const fn bus_method(self) -> &'static str {
        match self {
            Self::WakeAndTranslate => "WakeAndTranslate",
        }
    }

    pub fn from_bus_method(method: &str) -> Option<Self> {
        match method {
            "WakeAndTranslate" => Some(Self::WakeAndTranslate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_names_round_trip() {
        let req = ActivationRequest::WakeAndTranslate;
        assert_eq!(ActivationRequest::from_name(req.name()), Some(req));
        assert_eq!(ActivationRequest::from_bus_method(req.bus_method()), Some(req));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(ActivationRequest::from_name("wake-and-summarize"), None);
        assert_eq!(ActivationRequest::from_bus_method("wake-and-translate"), None);
    }
}
