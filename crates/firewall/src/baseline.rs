/// Process-wide adaptive expectation for "normal" peer height and traffic
/// behavior, updated once per examined peer.
///
/// The height center only ratchets upward, toward the furthest-ahead peer
/// seen. `avg_send`/`avg_recv` are cumulative accumulators that never reset;
/// downstream thresholds were tuned against that behavior, so neither is a
/// true mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Baseline {
    pub avg_height: i64,
    pub height_min: i64,
    pub height_max: i64,
    pub avg_traffic: f64,
    pub traffic_min: f64,
    pub traffic_max: f64,
    pub avg_send: u64,
    pub avg_recv: u64,
}

impl Baseline {
    /// Ratchet the height center toward a peer that is further ahead on the
    /// chain. The min/max band is always re-derived from the fresh center
    /// in the same update.
    pub fn ratchet_height(&mut self, node_height: i64, tolerance: i64, range: i64) {
        self.avg_height = (self.avg_height + node_height) / 2 - tolerance;
        self.height_min = self.avg_height - range;
        self.height_max = self.avg_height + range;
    }

    /// Fold a peer's traffic average into the population expectation and
    /// re-derive the traffic band from the fresh center.
    pub fn update_traffic(&mut self, peer_traffic_average: f64, tolerance: f64, zone: f64) {
        self.avg_traffic = (self.avg_traffic + peer_traffic_average) / 2.0 - tolerance;
        self.traffic_min = self.avg_traffic - zone;
        self.traffic_max = self.avg_traffic + zone;
    }

    /// Accumulate per-peer byte shares. Integer division by the current
    /// peer count, added onto the running totals.
    pub fn accumulate_shares(&mut self, bytes_sent: u64, bytes_received: u64, peer_count: u64) {
        let peer_count = peer_count.max(1);
        self.avg_send += bytes_sent / peer_count;
        self.avg_recv += bytes_received / peer_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratchet_height_from_zero() {
        let mut baseline = Baseline::default();
        baseline.ratchet_height(1000, 2, 100);

        assert_eq!(baseline.avg_height, 498);
        assert_eq!(baseline.height_min, 398);
        assert_eq!(baseline.height_max, 598);
    }

    #[test]
    fn test_ratchet_height_is_non_decreasing() {
        let mut baseline = Baseline::default();
        let mut previous = baseline.avg_height;

        for height in [1000, 2000, 5000, 5000, 100_000] {
            if height > baseline.avg_height {
                baseline.ratchet_height(height, 2, 100);
            }
            assert!(baseline.avg_height >= previous);
            previous = baseline.avg_height;
        }
    }

    #[test]
    fn test_update_traffic_band_tracks_center() {
        let mut baseline = Baseline::default();
        baseline.update_traffic(10.0, 0.0001, 4.0);

        assert!((baseline.avg_traffic - 4.9999).abs() < 1e-9);
        assert!((baseline.traffic_min - 0.9999).abs() < 1e-9);
        assert!((baseline.traffic_max - 8.9999).abs() < 1e-9);
    }

    #[test]
    fn test_accumulate_shares_is_cumulative() {
        let mut baseline = Baseline::default();
        baseline.accumulate_shares(1000, 500, 4);
        baseline.accumulate_shares(1000, 500, 4);

        assert_eq!(baseline.avg_send, 500);
        assert_eq!(baseline.avg_recv, 250);
    }
}
