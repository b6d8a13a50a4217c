use tracing::debug;

use crate::{
    ban::BanReason,
    rules::{AttackType, RuleInput, Verdict},
};

/// Bandwidth-abuse detection: classifies a peer by whether its height sits
/// above or below the population band and whether its traffic average falls
/// outside the expected traffic band. Valid chain sync looks like several of
/// these combinations, which is what the false-positive pass sorts out
/// afterwards.
pub(super) fn check(input: &RuleInput, verdict: &mut Verdict) {
    let cfg = &input.config.bandwidth_abuse;
    if !cfg.detect {
        return;
    }

    if input.time_connected > cfg.max_check_secs {
        let traffic_average = input.stats.traffic_average;

        // Peer is further ahead on the chain than the population minimum.
        if input.node_height > input.baseline.height_min {
            if traffic_average < input.baseline.traffic_min {
                verdict.flag(AttackType::LowBwHighHeight);
            }
            if traffic_average > input.baseline.traffic_max {
                verdict.flag(AttackType::HighBwHighHeight);
            }
        }

        // Peer is behind the population minimum.
        if input.node_height < input.baseline.height_min {
            if traffic_average < input.baseline.traffic_min {
                verdict.flag(AttackType::LowBwLowHeight);
            }
            if traffic_average > input.baseline.traffic_max {
                verdict.flag(AttackType::HighBwLowHeight);
            }
        }

        if verdict.detected && input.config.live_debug && input.config.debug.bandwidth_abuse {
            debug!(
                node_height = input.node_height,
                height_min = input.baseline.height_min,
                traffic_average,
                traffic_min = input.baseline.traffic_min,
                traffic_max = input.baseline.traffic_max,
                "bandwidth abuse suspected"
            );
        }
    }

    verdict.request_mitigation(
        cfg.blacklist,
        cfg.ban,
        BanReason::BandwidthAbuse,
        cfg.ban_time_secs,
    );
}
