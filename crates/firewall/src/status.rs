//! Read-only status snapshot of the whole engine, shaped for the node's
//! command layer to serialize straight onto the wire.

use serde::Serialize;

use crate::Firewall;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleStatus {
    pub detect: bool,
    pub blacklist: bool,
    pub ban: bool,
    pub ban_time_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BandwidthAbuseStatus {
    #[serde(flatten)]
    pub rule: RuleStatus,
    pub max_check_secs: u64,
    pub min_attack: f64,
    pub max_attack: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InvalidWalletStatus {
    #[serde(flatten)]
    pub rule: RuleStatus,
    pub minimum_protocol: i32,
    pub max_check_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForkedWalletStatus {
    #[serde(flatten)]
    pub rule: RuleStatus,
    pub node_heights: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FloodingWalletStatus {
    #[serde(flatten)]
    pub rule: RuleStatus,
    pub min_bytes: u64,
    pub max_bytes: u64,
    pub min_traffic_average: f64,
    pub max_traffic_average: f64,
    pub min_check_secs: u64,
    pub max_check_secs: u64,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BaselineStatus {
    pub avg_height: i64,
    pub height_min: i64,
    pub height_max: i64,
    pub avg_traffic: f64,
    pub traffic_min: f64,
    pub traffic_max: f64,
    pub avg_send: u64,
    pub avg_recv: u64,
}

/// One self-describing snapshot of every toggle, threshold and list the
/// engine currently runs with, plus the live baseline and list sizes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FirewallStatus {
    pub enabled: bool,
    pub clear_blacklist: bool,
    pub clear_banlist: bool,
    pub live_debug: bool,
    pub false_positive_protection: bool,
    pub average_tolerance: i64,
    pub average_range: i64,
    pub traffic_tolerance: f64,
    pub traffic_zone: f64,
    pub whitelist: Vec<String>,
    pub seed_exempt: Vec<String>,
    pub bandwidth_abuse: BandwidthAbuseStatus,
    pub invalid_wallet: InvalidWalletStatus,
    pub forked_wallet: ForkedWalletStatus,
    pub flooding_wallet: FloodingWalletStatus,
    pub baseline: BaselineStatus,
    pub tracked_peers: usize,
    pub blacklisted: usize,
    pub banned: usize,
}

impl Firewall {
    pub fn status(&self) -> FirewallStatus {
        let state = self.state.lock();
        let config = &state.config;
        let baseline = &state.baseline;

        FirewallStatus {
            enabled: config.enabled,
            clear_blacklist: config.clear_blacklist,
            clear_banlist: config.clear_bans,
            live_debug: config.live_debug,
            false_positive_protection: config.false_positive_protection,
            average_tolerance: config.average_tolerance,
            average_range: config.average_range,
            traffic_tolerance: config.traffic_tolerance,
            traffic_zone: config.traffic_zone,
            whitelist: config.whitelist.to_vec(),
            seed_exempt: config.seed_exempt.to_vec(),
            bandwidth_abuse: BandwidthAbuseStatus {
                rule: RuleStatus {
                    detect: config.bandwidth_abuse.detect,
                    blacklist: config.bandwidth_abuse.blacklist,
                    ban: config.bandwidth_abuse.ban,
                    ban_time_secs: config.bandwidth_abuse.ban_time_secs,
                },
                max_check_secs: config.bandwidth_abuse.max_check_secs,
                min_attack: config.bandwidth_abuse.min_attack,
                max_attack: config.bandwidth_abuse.max_attack,
            },
            invalid_wallet: InvalidWalletStatus {
                rule: RuleStatus {
                    detect: config.invalid_wallet.detect,
                    blacklist: config.invalid_wallet.blacklist,
                    ban: config.invalid_wallet.ban,
                    ban_time_secs: config.invalid_wallet.ban_time_secs,
                },
                minimum_protocol: config.invalid_wallet.minimum_protocol,
                max_check_secs: config.invalid_wallet.max_check_secs,
            },
            forked_wallet: ForkedWalletStatus {
                rule: RuleStatus {
                    detect: config.forked_wallet.detect,
                    blacklist: config.forked_wallet.blacklist,
                    ban: config.forked_wallet.ban,
                    ban_time_secs: config.forked_wallet.ban_time_secs,
                },
                node_heights: config.forked_wallet.node_heights.to_vec(),
            },
            flooding_wallet: FloodingWalletStatus {
                rule: RuleStatus {
                    detect: config.flooding_wallet.detect,
                    blacklist: config.flooding_wallet.blacklist,
                    ban: config.flooding_wallet.ban,
                    ban_time_secs: config.flooding_wallet.ban_time_secs,
                },
                min_bytes: config.flooding_wallet.min_bytes,
                max_bytes: config.flooding_wallet.max_bytes,
                min_traffic_average: config.flooding_wallet.min_traffic_average,
                max_traffic_average: config.flooding_wallet.max_traffic_average,
                min_check_secs: config.flooding_wallet.min_check_secs,
                max_check_secs: config.flooding_wallet.max_check_secs,
                patterns: config.flooding_wallet.patterns.to_vec(),
            },
            baseline: BaselineStatus {
                avg_height: baseline.avg_height,
                height_min: baseline.height_min,
                height_max: baseline.height_max,
                avg_traffic: baseline.avg_traffic,
                traffic_min: baseline.traffic_min,
                traffic_max: baseline.traffic_max,
                avg_send: baseline.avg_send,
                avg_recv: baseline.avg_recv,
            },
            tracked_peers: state.peers.len(),
            blacklisted: state.blacklist.len(),
            banned: self.bans().banned_count(),
        }
    }
}
