pub mod ban;
pub mod baseline;
pub mod blacklist;
pub mod config;
mod mitigate;
pub mod peer;
pub mod rules;
pub mod settings;
pub mod status;

use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use tracing::{debug, info};
use vigil_storage::tables::banned_peers::BannedPeersTable;

use crate::{
    ban::BanList,
    baseline::Baseline,
    blacklist::BlacklistSet,
    config::{FirewallConfig, TRAFFIC_QUIET_SECS},
    peer::{PeerStats, PeerView, node_height},
    rules::RuleInput,
};

/// Gate outcome for one examination tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Allow,
    Disconnected,
}

/// Shared mutable engine state. Baseline, per-peer stats, session blacklist
/// and configuration all live under one lock so that the read-modify-write
/// sequences of an examination are never observed half-applied by another
/// peer's thread.
pub(crate) struct EngineState {
    pub(crate) config: FirewallConfig,
    pub(crate) baseline: Baseline,
    pub(crate) peers: HashMap<String, PeerStats>,
    pub(crate) blacklist: BlacklistSet,
}

/// The peer-reputation and intrusion-mitigation engine.
///
/// One instance per process, invoked synchronously from each peer's
/// message-processing thread via [`check`](Firewall::check).
pub struct Firewall {
    pub(crate) state: Mutex<EngineState>,
    bans: BanList,
}

impl Firewall {
    pub fn new(config: FirewallConfig) -> Self {
        Self::with_ban_table(config, None)
    }

    /// Build an engine whose bans are written through to the given table.
    pub fn with_ban_table(config: FirewallConfig, table: Option<Arc<BannedPeersTable>>) -> Self {
        Self {
            state: Mutex::new(EngineState {
                config,
                baseline: Baseline::default(),
                peers: HashMap::new(),
                blacklist: BlacklistSet::default(),
            }),
            bans: BanList::new(table),
        }
    }

    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    /// Gate one peer through the engine. Whitelisted, seed-exempt and
    /// disabled-engine paths allow without side effects; blacklisted and
    /// banned peers are force-disconnected; everyone else is examined.
    ///
    /// An attack mitigated by disconnect inside the examination still
    /// returns [`Action::Allow`]: the disconnect there is a side effect,
    /// not a different gate outcome.
    pub fn check(&self, peer: &impl PeerView) -> Action {
        let mut state = self.state.lock();
        if !state.config.enabled {
            return Action::Allow;
        }

        let address = peer.address();
        if peer.is_whitelisted()
            || state.config.whitelist.contains_str(address)
            || state.config.seed_exempt.contains_str(address)
        {
            return Action::Allow;
        }

        if state.config.clear_blacklist && !state.blacklist.is_empty() {
            info!("Clearing session blacklist");
            state.blacklist.clear();
        }
        if state.config.clear_bans {
            self.bans.clear(address);
        }

        if state.blacklist.contains(address) {
            info!(%address, "Disconnecting blacklisted peer");
            self.force_disconnect(peer, "blacklisted", &state.config);
            return Action::Disconnected;
        }

        if self.bans.is_banned(address) {
            info!(%address, "Disconnecting banned peer");
            self.force_disconnect(peer, "banned", &state.config);
            return Action::Disconnected;
        }

        self.examine(peer, &mut state);
        Action::Allow
    }

    /// Drop engine-owned stats once the transport reports the peer gone.
    pub fn peer_disconnected(&self, address: &str) {
        self.state.lock().peers.remove(address);
    }

    pub fn baseline(&self) -> Baseline {
        self.state.lock().baseline
    }

    pub fn peer_stats(&self, address: &str) -> Option<PeerStats> {
        self.state.lock().peers.get(address).copied()
    }

    pub fn is_blacklisted(&self, address: &str) -> bool {
        self.state.lock().blacklist.contains(address)
    }

    pub fn blacklisted_count(&self) -> usize {
        self.state.lock().blacklist.len()
    }

    /// Update the population baseline and this peer's stats, then run the
    /// rule engine and apply its verdict.
    fn examine(&self, peer: &impl PeerView, state: &mut EngineState) {
        let EngineState {
            config,
            baseline,
            peers,
            blacklist,
        } = state;

        let now = unix_now();
        let address = peer.address().to_string();
        let time_connected = now.saturating_sub(peer.connected_at());
        let height = node_height(peer);
        let bytes_sent = peer.bytes_sent();
        let bytes_received = peer.bytes_received();

        // The height center only ever ratchets upward, toward the
        // furthest-ahead peer seen.
        if height > baseline.avg_height {
            baseline.ratchet_height(height, config.average_tolerance, config.average_range);
        }

        let stats = peers.entry(address.clone()).or_default();
        let mut stats_stale = false;
        if bytes_received > 0 {
            stats.traffic_ratio = bytes_sent as f64 / bytes_received as f64;
            stats_stale = stats.last_traffic_update == 0
                || now.saturating_sub(stats.last_traffic_update) > TRAFFIC_QUIET_SECS;
            stats.traffic_average += stats.traffic_ratio / 2.0;
            stats.last_traffic_update = now;
        }
        let stats = *stats;

        if stats_stale {
            baseline.update_traffic(
                stats.traffic_average,
                config.traffic_tolerance,
                config.traffic_zone,
            );
            baseline.accumulate_shares(bytes_sent, bytes_received, peers.len() as u64);

            if config.live_debug && config.debug.exam {
                info!(
                    %address,
                    traffic_ratio = stats.traffic_ratio,
                    traffic_average = stats.traffic_average,
                    baseline_traffic = baseline.avg_traffic,
                    baseline_height = baseline.avg_height,
                    avg_send = baseline.avg_send,
                    avg_recv = baseline.avg_recv,
                    "Examination snapshot"
                );
            }
        }

        let input = RuleInput {
            stats: &stats,
            baseline,
            config,
            time_connected,
            node_height: height,
            starting_height: peer.starting_height(),
            synced_height: peer.synced_height(),
            protocol_version: peer.protocol_version(),
            bytes_sent,
            bytes_received,
        };
        let verdict = rules::detect(&input);
        self.apply(peer, &input, &verdict, blacklist);
    }

    /// Ask the transport to tear the connection down. The transport's
    /// non-blocking send-lock attempt may defer the disconnect to the
    /// peer's next message cycle; that is not an error and is never
    /// retried from here.
    pub(crate) fn force_disconnect(
        &self,
        peer: &impl PeerView,
        context: &str,
        config: &FirewallConfig,
    ) {
        if peer.try_disconnect() {
            info!(address = peer.address(), context, "Force disconnected peer");
        } else if config.live_debug && config.debug.disconnect {
            debug!(
                address = peer.address(),
                context, "Send path busy, disconnect deferred"
            );
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
