use tracing::debug;

use crate::rules::{AttackType, RuleInput, Verdict};

/// False-positive pass for the bandwidth-abuse rule. Three of the four
/// classifications describe ordinary chain sync and are cleared outright;
/// a high-bandwidth laggard is cleared only when its instantaneous traffic
/// ratio falls outside the configured attack band or it is net-uploading
/// (consistent with serving a sync, not flooding).
///
/// This is the only rule that ever clears the shared detected flag. The
/// blacklist/ban requests an earlier rule attached stay on the verdict; the
/// mitigator ignores them unless a later rule re-detects.
pub(super) fn check(input: &RuleInput, verdict: &mut Verdict) {
    if !input.config.false_positive_protection || !verdict.detected {
        return;
    }

    let cleared = match verdict.attack_type {
        Some(
            AttackType::LowBwHighHeight | AttackType::HighBwHighHeight | AttackType::LowBwLowHeight,
        ) => true,
        Some(AttackType::HighBwLowHeight) => {
            let mut cleared = false;
            if input.stats.traffic_average < input.baseline.traffic_max
                && input.bytes_received > 0
            {
                let cfg = &input.config.bandwidth_abuse;
                let ratio = input.bytes_sent as f64 / input.bytes_received as f64;
                if ratio > cfg.max_attack || ratio < cfg.min_attack {
                    cleared = true;
                }
            }
            if input.bytes_sent > input.bytes_received {
                cleared = true;
            }
            cleared
        }
        _ => false,
    };

    if cleared {
        if input.config.live_debug && input.config.debug.false_positive {
            debug!(
                attack_type = %verdict.attack_type.map(|attack| attack.to_string()).unwrap_or_default(),
                "false positive cleared"
            );
        }
        verdict.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::InputFixture;

    fn flagged(attack_type: AttackType) -> Verdict {
        let mut verdict = Verdict::default();
        verdict.flag(attack_type);
        verdict.blacklist = true;
        verdict
    }

    #[test]
    fn test_sync_like_classes_are_cleared() {
        for attack_type in [
            AttackType::LowBwHighHeight,
            AttackType::HighBwHighHeight,
            AttackType::LowBwLowHeight,
        ] {
            let fixture = InputFixture::default();
            let mut verdict = flagged(attack_type);
            check(&fixture.input(), &mut verdict);

            assert!(!verdict.detected);
            assert_eq!(verdict.attack_type, None);
            // The residual mitigation request is left in place.
            assert!(verdict.blacklist);
        }
    }

    #[test]
    fn test_high_bw_low_height_ratio_outside_band_is_cleared() {
        let mut fixture = InputFixture::default();
        fixture.baseline.traffic_max = 100.0;
        fixture.stats.traffic_average = 50.0;
        fixture.bytes_sent = 100;
        fixture.bytes_received = 1000;

        let mut verdict = flagged(AttackType::HighBwLowHeight);
        check(&fixture.input(), &mut verdict);
        assert!(!verdict.detected);
    }

    #[test]
    fn test_high_bw_low_height_in_band_net_uploader_still_clears() {
        // Ratio 17.15 sits inside the [17.1, 17.2] attack band, but a peer
        // sending 17x what it receives is net-uploading, which the second
        // branch treats as a full sync regardless of the band.
        let mut fixture = InputFixture::default();
        fixture.baseline.traffic_max = 100.0;
        fixture.stats.traffic_average = 50.0;
        fixture.bytes_sent = 17_150;
        fixture.bytes_received = 1_000;

        let mut verdict = flagged(AttackType::HighBwLowHeight);
        check(&fixture.input(), &mut verdict);
        assert!(!verdict.detected);
    }

    #[test]
    fn test_high_bw_low_height_download_heavy_above_band_stands() {
        // Traffic average at or above the population maximum skips the
        // ratio check, and a download-heavy peer never hits the net-upload
        // branch: the detection survives suppression.
        let mut fixture = InputFixture::default();
        fixture.baseline.traffic_max = 100.0;
        fixture.stats.traffic_average = 150.0;
        fixture.bytes_sent = 5_000;
        fixture.bytes_received = 10_000;

        let mut verdict = flagged(AttackType::HighBwLowHeight);
        check(&fixture.input(), &mut verdict);
        assert!(verdict.detected);
    }

    #[test]
    fn test_net_uploader_is_cleared() {
        let mut fixture = InputFixture::default();
        fixture.stats.traffic_average = 150.0;
        fixture.baseline.traffic_max = 100.0;
        fixture.bytes_sent = 2000;
        fixture.bytes_received = 1000;

        let mut verdict = flagged(AttackType::HighBwLowHeight);
        check(&fixture.input(), &mut verdict);
        assert!(!verdict.detected);
    }

    #[test]
    fn test_disabled_suppression_leaves_verdict() {
        let mut fixture = InputFixture::default();
        fixture.config.false_positive_protection = false;

        let mut verdict = flagged(AttackType::HighBwHighHeight);
        check(&fixture.input(), &mut verdict);
        assert!(verdict.detected);
    }

    #[test]
    fn test_zero_received_skips_ratio_check() {
        let mut fixture = InputFixture::default();
        fixture.baseline.traffic_max = 100.0;
        fixture.stats.traffic_average = 50.0;
        fixture.bytes_sent = 0;
        fixture.bytes_received = 0;

        let mut verdict = flagged(AttackType::HighBwLowHeight);
        check(&fixture.input(), &mut verdict);
        // No division, no clear: the detection stands.
        assert!(verdict.detected);
    }
}
