use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use glib::ControlFlow;

use crate::IpcError;

/// Write end of the self-pipe, shared with the raw signal handler. A process
/// holds at most one armed bridge, so a single static slot is enough; -1
/// means "disarmed".
static NOTIFY_FD: AtomicI32 = AtomicI32::new(-1);

/// Runs in async-signal context: no allocation, no locks, no logging.
/// The one-byte write is best-effort; a full or broken channel drops the
/// notification, and the OS delivers the signal again on the next external
/// trigger.
extern "C" fn on_signal(signum: libc::c_int) {
    let fd = NOTIFY_FD.load(Ordering::Relaxed);
    if fd < 0 {
        return;
    }
    let byte = signum as u8;
    unsafe {
        libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
    }
}

/// Relays Unix signals into the glib main loop via the self-pipe pattern:
/// the raw handler writes the signal number as one byte into a socketpair,
/// an fd watch on the read end decodes it and calls the registered handler
/// on the main-loop thread.
pub struct SignalBridge {
    read_fd: RawFd,
    write_fd: RawFd,
    signals: Vec<i32>,
    watch: Option<glib::SourceId>,
    keepalive: Option<glib::SourceId>,
}

impl SignalBridge {
    /// Arm the bridge: create the channel, install the OS handlers, attach
    /// the read end to the main loop. Must be called on the main-loop
    /// thread; `handler` only ever runs there.
    pub fn new(signals: &[i32], handler: impl Fn(i32) + 'static) -> Result<Self, IpcError> {
        let mut fds = [-1 as libc::c_int; 2];
        let rc = unsafe {
            libc::socketpair(
                libc::AF_UNIX,
                libc::SOCK_STREAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                0,
                fds.as_mut_ptr(),
            )
        };
        if rc != 0 {
            return Err(IpcError::Setup(format!(
                "socketpair failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        let [read_fd, write_fd] = fds;
        NOTIFY_FD.store(write_fd, Ordering::SeqCst);

        for &sig in signals {
            let prev = unsafe { libc::signal(sig, on_signal as libc::sighandler_t) };
            if prev == libc::SIG_ERR {
                NOTIFY_FD.store(-1, Ordering::SeqCst);
                unsafe {
                    libc::close(write_fd);
                    libc::close(read_fd);
                }
                return Err(IpcError::Setup(format!(
                    "register handler for signal {sig}: {}",
                    std::io::Error::last_os_error()
                )));
            }
        }

        // One byte read per dispatch keeps delivery in FIFO order; the fd
        // stays readable and the loop dispatches again for queued bytes.
        let watch = glib::unix_fd_add_local(read_fd, glib::IOCondition::IN, move |fd, _cond| {
            let mut byte = 0u8;
            let n = unsafe { libc::read(fd, &mut byte as *mut u8 as *mut libc::c_void, 1) };
            if n == 1 {
                log::debug!("signal bridge: delivering signum={}", byte);
                handler(byte as i32);
            }
            ControlFlow::Continue
        });

        // The loop can otherwise sleep indefinitely between UI events on
        // hosts without proper fd integration; a no-op tick keeps it honest.
        let keepalive =
            glib::timeout_add_local(Duration::from_millis(100), || ControlFlow::Continue);

        Ok(Self {
            read_fd,
            write_fd,
            signals: signals.to_vec(),
            watch: Some(watch),
            keepalive: Some(keepalive),
        })
    }

    /// Explicit disarm, equivalent to dropping the bridge. Normal process
    /// exit reclaims everything; this exists for tests and orderly shutdown.
    pub fn teardown(self) {}

    fn disarm(&mut self) {
        if let Some(id) = self.watch.take() {
            id.remove();
        } else {
            // Already disarmed.
            return;
        }
        if let Some(id) = self.keepalive.take() {
            id.remove();
        }
        for &sig in &self.signals {
            unsafe {
                libc::signal(sig, libc::SIG_DFL);
            }
        }
        NOTIFY_FD.store(-1, Ordering::SeqCst);
        unsafe {
            libc::close(self.write_fd);
            libc::close(self.read_fd);
        }
    }

    #[cfg(test)]
    fn push_raw(&self, signum: i32) {
        let byte = signum as u8;
        let n = unsafe {
            libc::write(
                self.write_fd,
                &byte as *const u8 as *const libc::c_void,
                1,
            )
        };
        assert_eq!(n, 1);
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    // One test drives the whole lifecycle: glib's default main context is
    // process-global and concurrent tests would fight over it.
    #[test]
    fn bytes_cross_the_bridge_in_fifo_order() {
        let ctx = glib::MainContext::default();
        let _guard = ctx.acquire().unwrap();

        let seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let bridge = SignalBridge::new(&[libc::SIGUSR2], move |signum| {
            sink.borrow_mut().push(signum);
        })
        .unwrap();

        // Two notifications queued before the loop runs: both must arrive,
        // in byte order, across successive iterations.
        bridge.push_raw(10);
        bridge.push_raw(12);
        while seen.borrow().len() < 2 {
            ctx.iteration(true);
        }
        assert_eq!(*seen.borrow(), vec![10, 12]);

        // A real signal takes the same path through the raw handler.
        unsafe {
            libc::raise(libc::SIGUSR2);
        }
        while seen.borrow().len() < 3 {
            ctx.iteration(true);
        }
        assert_eq!(seen.borrow()[2], libc::SIGUSR2);

        bridge.teardown();
        assert_eq!(NOTIFY_FD.load(Ordering::SeqCst), -1);
    }
}
