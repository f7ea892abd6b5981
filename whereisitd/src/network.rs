use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use shared::protocol::LOCAL_BUCKET;

/// True if `address` lies in an RFC 1918 range, the IPv6 unique-local
/// range (fc00::/7) or the IPv6 link-local range (fe80::/10).
/// Unparseable input is never private.
pub fn is_private(address: &str) -> bool {
    match address.parse::<IpAddr>() {
        Ok(ip) => is_private_ip(ip),
        Err(_) => {
            tracing::debug!("Given address is not a valid IP: {:?}", address);
            false
        }
    }
}

pub fn is_private_ip(ip: IpAddr) -> bool {
    let private = match ip.to_canonical() {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    };
    if private {
        tracing::debug!("Address {} is from a local area network", ip);
    }
    private
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    // 10/8, 172.16/12, 192.168/16
    ip.is_private()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

/// Partition key for an external address: the local bucket for private
/// addresses, the address itself otherwise.
pub fn normalize(address: &str) -> String {
    if is_private(address) {
        LOCAL_BUCKET.to_string()
    } else {
        address.to_string()
    }
}
