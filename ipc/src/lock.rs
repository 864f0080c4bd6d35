use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::IpcError;

/// Exclusive per-user instance lock.
///
/// The bus transport detects a second primary through well-known-name
/// ownership; the signal transport has nothing to collide on, so the server
/// holds a flock-ed file under `XDG_RUNTIME_DIR` instead. The lock lives as
/// long as the returned value; the file itself is left behind (flock state
/// dies with the fd).
pub struct InstanceLock {
    _file: File,
}

impl InstanceLock {
    pub fn acquire(name: &str) -> Result<Self, IpcError> {
        let dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::acquire_in(&dir, name)
    }

    fn acquire_in(dir: &Path, name: &str) -> Result<Self, IpcError> {
        let path = dir.join(format!("{name}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| IpcError::Setup(format!("open lock file {}: {e}", path.display())))?;

        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            return Err(IpcError::AlreadyRunning(format!(
                "lock held: {}",
                path.display()
            )));
        }
        log::debug!("instance lock acquired: {}", path.display());
        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_first_is_dropped() {
        let dir = tempfile::tempdir().unwrap();

        let first = InstanceLock::acquire_in(dir.path(), "linguatray-test").unwrap();
        let second = InstanceLock::acquire_in(dir.path(), "linguatray-test");
        assert!(matches!(second, Err(IpcError::AlreadyRunning(_))));

        drop(first);
        InstanceLock::acquire_in(dir.path(), "linguatray-test").unwrap();
    }
}
