/// Read-only view of a connected peer, implemented by the transport layer.
///
/// The engine never owns the connection; it only inspects the facts below
/// and asks the transport to tear the connection down via
/// [`try_disconnect`](PeerView::try_disconnect).
pub trait PeerView {
    /// Opaque comparable peer key, typically `ip:port`.
    fn address(&self) -> &str;

    /// Transport-level whitelisted flag.
    fn is_whitelisted(&self) -> bool;

    /// Unix timestamp of connection establishment (seconds).
    fn connected_at(&self) -> u64;

    /// Chain height the peer declared at handshake. `-1` is a valid
    /// "unknown" sentinel.
    fn starting_height(&self) -> i64;

    /// Height the peer has synced to since connecting. `0` = unknown.
    fn synced_height(&self) -> i64;

    /// Protocol version the peer declared.
    fn protocol_version(&self) -> i32;

    /// Cumulative bytes sent to the peer.
    fn bytes_sent(&self) -> u64;

    /// Cumulative bytes received from the peer.
    fn bytes_received(&self) -> u64;

    /// Release any outbound send grant and close the socket. Must attempt a
    /// non-blocking acquisition of the peer's send-path lock: returns `true`
    /// if the disconnect executed, `false` if the lock was busy and the
    /// disconnect is deferred to the peer's next message cycle. Idempotent.
    fn try_disconnect(&self) -> bool;
}

/// Effective chain height of a peer: the synced height when known, the
/// declared starting height otherwise. A synced height below the starting
/// height is treated as a bogus regression report and ignored.
pub fn node_height(peer: &impl PeerView) -> i64 {
    let starting = peer.starting_height();
    let synced = peer.synced_height();
    if synced == 0 || synced < starting {
        starting
    } else {
        synced
    }
}

/// Engine-owned mutable per-peer state, created on first examination and
/// dropped when the peer disconnects.
///
/// `traffic_average` is an additive accumulation across ticks, not a true
/// moving average: every sample adds half the instantaneous ratio. The
/// detection thresholds are tuned against that growth curve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeerStats {
    /// Sent/received byte ratio from the last sample with nonzero receive
    /// count.
    pub traffic_ratio: f64,
    pub traffic_average: f64,
    /// Unix timestamp of the last traffic-average update; 0 = never sampled.
    pub last_traffic_update: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HeightPeer {
        starting: i64,
        synced: i64,
    }

    impl PeerView for HeightPeer {
        fn address(&self) -> &str {
            "192.0.2.1:9333"
        }
        fn is_whitelisted(&self) -> bool {
            false
        }
        fn connected_at(&self) -> u64 {
            0
        }
        fn starting_height(&self) -> i64 {
            self.starting
        }
        fn synced_height(&self) -> i64 {
            self.synced
        }
        fn protocol_version(&self) -> i32 {
            80007
        }
        fn bytes_sent(&self) -> u64 {
            0
        }
        fn bytes_received(&self) -> u64 {
            0
        }
        fn try_disconnect(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_node_height_prefers_synced() {
        let peer = HeightPeer {
            starting: 100,
            synced: 250,
        };
        assert_eq!(node_height(&peer), 250);
    }

    #[test]
    fn test_node_height_falls_back_when_unknown() {
        let peer = HeightPeer {
            starting: 100,
            synced: 0,
        };
        assert_eq!(node_height(&peer), 100);
    }

    #[test]
    fn test_node_height_ignores_regression() {
        let peer = HeightPeer {
            starting: 100,
            synced: 40,
        };
        assert_eq!(node_height(&peer), 100);
    }

    #[test]
    fn test_node_height_negative_sentinel() {
        let peer = HeightPeer {
            starting: -1,
            synced: 0,
        };
        assert_eq!(node_height(&peer), -1);
    }
}
