mod bandwidth_abuse;
mod flooding_wallet;
mod forked_wallet;
mod invalid_wallet;
mod suppression;

pub use flooding_wallet::warning_code;

use crate::{ban::BanReason, baseline::Baseline, config::FirewallConfig, peer::PeerStats};

/// Attack classification labels, matching the operator-facing log tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackType {
    LowBwHighHeight,
    HighBwHighHeight,
    LowBwLowHeight,
    HighBwLowHeight,
    StartHeightInvalid,
    ProtocolInvalid,
    ForkedWallet,
    FloodingWallet,
}

impl std::fmt::Display for AttackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttackType::LowBwHighHeight => write!(f, "2-LowBW-HighHeight"),
            AttackType::HighBwHighHeight => write!(f, "2-HighBW-HighHeight"),
            AttackType::LowBwLowHeight => write!(f, "3-LowBW-LowHeight"),
            AttackType::HighBwLowHeight => write!(f, "3-HighBW-LowHeight"),
            AttackType::StartHeightInvalid => write!(f, "1-StartHeight-Invalid"),
            AttackType::ProtocolInvalid => write!(f, "1-Protocol-Invalid"),
            AttackType::ForkedWallet => write!(f, "Forked Wallet"),
            AttackType::FloodingWallet => write!(f, "Flooding Wallet"),
        }
    }
}

/// Transient per-examination outcome. Recomputed every tick, never stored.
///
/// One verdict is threaded through every rule in order. Rules only ever set
/// `detected` (the suppression pass alone clears it), and each rule's
/// mitigation epilogue keys off the shared flag rather than its own local
/// finding. A later rule can therefore overwrite the ban reason and
/// duration chosen by an earlier one. That compounding is load-bearing:
/// operators tuned configurations around it, so it is reproduced here
/// rather than repaired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    pub detected: bool,
    pub attack_type: Option<AttackType>,
    pub blacklist: bool,
    pub ban: bool,
    pub ban_reason: Option<BanReason>,
    pub ban_time_secs: u64,
}

impl Verdict {
    fn flag(&mut self, attack_type: AttackType) {
        self.detected = true;
        self.attack_type = Some(attack_type);
    }

    fn clear(&mut self) {
        self.detected = false;
        self.attack_type = None;
    }

    /// Shared mitigation epilogue: gates on the *shared* detected flag.
    fn request_mitigation(
        &mut self,
        blacklist: bool,
        ban: bool,
        ban_reason: BanReason,
        ban_time_secs: u64,
    ) {
        if !self.detected {
            return;
        }
        if blacklist {
            self.blacklist = true;
        }
        if ban {
            self.ban = true;
            self.ban_reason = Some(ban_reason);
            self.ban_time_secs = ban_time_secs;
        }
    }
}

/// Everything a rule may consult, captured once per examination.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub stats: &'a PeerStats,
    pub baseline: &'a Baseline,
    pub config: &'a FirewallConfig,
    /// Seconds since the peer connected.
    pub time_connected: u64,
    pub node_height: i64,
    pub starting_height: i64,
    pub synced_height: i64,
    pub protocol_version: i32,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Run every rule in fixed order against one peer and return the verdict.
pub fn detect(input: &RuleInput) -> Verdict {
    let mut verdict = Verdict::default();
    bandwidth_abuse::check(input, &mut verdict);
    suppression::check(input, &mut verdict);
    invalid_wallet::check(input, &mut verdict);
    forked_wallet::check(input, &mut verdict);
    flooding_wallet::check(input, &mut verdict);
    verdict
}
