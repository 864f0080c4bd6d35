use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpcError {
    /// No transport can be used on this host at all. Fatal for a server;
    /// the user should see it rather than get a silently unreachable app.
    #[error("no usable activation transport on this host")]
    TransportUnavailable,

    /// A client-side send found no running primary instance. Not fatal,
    /// never retried.
    #[error("no running instance found")]
    NoPeerFound,

    /// The bus call reached the peer but came back with an error reply.
    #[error("activation call failed: {0}")]
    RemoteCall(String),

    /// Another primary instance already owns the service name or the
    /// instance lock.
    #[error("another instance is already running ({0})")]
    AlreadyRunning(String),

    /// Setting up the signal bridge or the bus endpoint failed.
    #[error("transport setup failed: {0}")]
    Setup(String),
}

impl IpcError {
    /// Exit code for the short-lived `--activate` invocation.
    /// 1 means "start the application first", 2 means the transport or the
    /// call itself failed.
    pub fn exit_code(&self) -> i32 {
        match self {
            IpcError::NoPeerFound => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_no_peer_from_transport_failure() {
        assert_eq!(IpcError::NoPeerFound.exit_code(), 1);
        assert_eq!(IpcError::TransportUnavailable.exit_code(), 2);
        assert_eq!(IpcError::RemoteCall("nope".into()).exit_code(), 2);
    }
}
