//! Peer-process discovery for the signal transport.
//!
//! Every send attempt scans `/proc` afresh: a previously found instance may
//! have exited, so nothing here is cached.

use std::path::Path;

/// The kernel truncates `/proc/<pid>/comm` to 15 bytes.
const COMM_MAX: usize = 15;

#[derive(Debug, Clone)]
pub struct Peer {
    pub pid: i32,
    pub comm: String,
}

/// All processes visible to the current user. Entries that vanish mid-scan
/// are skipped.
pub fn enumerate() -> Vec<Peer> {
    let mut out = Vec::new();
    let entries = match std::fs::read_dir("/proc") {
        Ok(e) => e,
        Err(e) => {
            log::warn!("cannot enumerate /proc: {e}");
            return out;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(pid) = name.to_str().and_then(|s| s.parse::<i32>().ok()) else {
            continue;
        };
        let comm = match std::fs::read_to_string(Path::new("/proc").join(name).join("comm")) {
            Ok(s) => s.trim().to_string(),
            // Raced with process exit.
            Err(_) => continue,
        };
        out.push(Peer { pid, comm });
    }
    out
}

/// Case-insensitive match against the kernel-truncated comm value.
pub fn comm_matches(comm: &str, expected: &str) -> bool {
    let expected = if expected.len() > COMM_MAX {
        &expected[..COMM_MAX]
    } else {
        expected
    };
    comm.eq_ignore_ascii_case(expected)
}

/// Running instances of `name` other than the current process, in scan
/// order.
pub fn find_peers(name: &str) -> Vec<Peer> {
    let me = std::process::id() as i32;
    enumerate()
        .into_iter()
        .filter(|p| p.pid != me && comm_matches(&p.comm, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comm_matching_is_case_insensitive() {
        assert!(comm_matches("LinguaTray", "linguatray"));
        assert!(comm_matches("linguatray", "LINGUATRAY"));
        assert!(!comm_matches("linguatray2", "linguatray"));
    }

    #[test]
    fn comm_matching_honors_kernel_truncation() {
        // An 18-char binary name shows up as its first 15 bytes in comm.
        assert!(comm_matches("linguatray-inst", "linguatray-install"));
        assert!(!comm_matches("linguatray-install", "linguatray-inst"));
    }

    #[test]
    fn enumerate_sees_the_current_process() {
        let me = std::process::id() as i32;
        let procs = enumerate();
        assert!(!procs.is_empty());
        assert!(procs.iter().any(|p| p.pid == me));
    }

    #[test]
    fn find_peers_excludes_the_current_process() {
        let me = std::process::id() as i32;
        // Whatever our own comm is, we must never offer ourselves as a peer.
        let own_comm = std::fs::read_to_string("/proc/self/comm").unwrap();
        let peers = find_peers(own_comm.trim());
        assert!(peers.iter().all(|p| p.pid != me));
    }
}
