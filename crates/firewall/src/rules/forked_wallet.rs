use tracing::debug;

use crate::{
    ban::BanReason,
    rules::{AttackType, RuleInput, Verdict},
};

/// Forked-wallet detection: a peer whose declared or synced height exactly
/// matches a known abandoned fork tip is stuck on a dead chain.
pub(super) fn check(input: &RuleInput, verdict: &mut Verdict) {
    let cfg = &input.config.forked_wallet;
    if !cfg.detect {
        return;
    }

    for &height in cfg.node_heights.iter() {
        if input.starting_height == height || input.synced_height == height {
            verdict.flag(AttackType::ForkedWallet);
            if input.config.live_debug && input.config.debug.forked_wallet {
                debug!(
                    forked_height = height,
                    starting_height = input.starting_height,
                    synced_height = input.synced_height,
                    "forked wallet detected"
                );
            }
        }
    }

    verdict.request_mitigation(
        cfg.blacklist,
        cfg.ban,
        BanReason::ForkedWallet,
        cfg.ban_time_secs,
    );
}
