//! Process-wide host identity, used to correlate records across machines.

use std::net::UdpSocket;
use std::sync::OnceLock;
use tracing::warn;

/// IP address and hostname of this process, resolved once.
#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub ip: String,
    pub hostname: String,
}

static IDENTITY: OnceLock<HostIdentity> = OnceLock::new();

/// The host identity, resolved on first call and cached for the process
/// lifetime. Resolution never fails; unresolvable fields fall back to
/// `127.0.0.1` / `UNKNOWN-HOST`.
pub fn identity() -> &'static HostIdentity {
    IDENTITY.get_or_init(resolve)
}

fn resolve() -> HostIdentity {
    let hostname = sysinfo::System::host_name().unwrap_or_else(|| {
        warn!(target: "perftrace", "hostname unresolvable, using fallback");
        "UNKNOWN-HOST".to_string()
    });
    let ip = routable_ip().unwrap_or_else(|| {
        warn!(target: "perftrace", "local IP unresolvable, using loopback");
        "127.0.0.1".to_string()
    });
    HostIdentity { ip, hostname }
}

/// Best-effort local IP discovery: connect a UDP socket to a public address
/// and read back the chosen source address. No packet is sent.
fn routable_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_populated_and_stable() {
        let first = identity();
        assert!(!first.ip.is_empty());
        assert!(!first.hostname.is_empty());
        // Same allocation on every call.
        assert!(std::ptr::eq(first, identity()));
    }

    #[test]
    fn test_ip_parses_as_address() {
        let id = identity();
        assert!(id.ip.parse::<std::net::IpAddr>().is_ok());
    }
}
