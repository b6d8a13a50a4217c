use tracing::{debug, info, warn};

use crate::{
    Firewall,
    blacklist::BlacklistSet,
    peer::PeerView,
    rules::{RuleInput, Verdict},
};

impl Firewall {
    /// Apply a detection verdict: blacklist, then ban, then an
    /// unconditional force-disconnect. No-op while nothing is detected.
    pub(crate) fn apply(
        &self,
        peer: &impl PeerView,
        input: &RuleInput,
        verdict: &Verdict,
        blacklist: &mut BlacklistSet,
    ) {
        if !verdict.detected {
            return;
        }

        let address = peer.address();
        let attack_type = verdict
            .attack_type
            .map(|attack| attack.to_string())
            .unwrap_or_default();

        warn!(
            %address,
            attack_type = %attack_type,
            traffic_ratio = input.stats.traffic_ratio,
            traffic_average = input.stats.traffic_average,
            baseline_traffic = input.baseline.avg_traffic,
            bytes_sent = input.bytes_sent,
            bytes_received = input.bytes_received,
            starting_height = input.starting_height,
            synced_height = input.synced_height,
            protocol_version = input.protocol_version,
            "Attack detected"
        );

        if verdict.blacklist && blacklist.insert_wrapping(address) {
            info!(%address, attack_type = %attack_type, "Peer blacklisted");
            if input.config.live_debug && input.config.debug.blacklist {
                debug!(blacklisted = blacklist.len(), "Session blacklist updated");
            }
        }

        if verdict.ban
            && let Some(reason) = verdict.ban_reason
        {
            self.bans().ban(address, reason, verdict.ban_time_secs);
            info!(
                %address,
                %reason,
                duration_secs = verdict.ban_time_secs,
                "Peer banned"
            );
            if input.config.live_debug && input.config.debug.bans {
                debug!(banned = self.bans().banned_count(), "Ban list updated");
            }
        }

        self.force_disconnect(peer, "attack", input.config);
    }
}
