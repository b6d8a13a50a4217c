use tracing::debug;

use crate::{
    ban::BanReason,
    rules::{AttackType, RuleInput, Verdict},
};

/// Invalid-wallet detection: a peer that still declares no starting height
/// or an unacceptable protocol version after the check window has passed is
/// not a functioning client.
pub(super) fn check(input: &RuleInput, verdict: &mut Verdict) {
    let cfg = &input.config.invalid_wallet;
    if !cfg.detect {
        return;
    }

    if input.time_connected > cfg.max_check_secs {
        // -1 is the handshake "unknown" sentinel; anything negative after
        // the window is invalid.
        if input.starting_height < 0 {
            verdict.flag(AttackType::StartHeightInvalid);
        }

        if input.protocol_version < 1 {
            verdict.flag(AttackType::ProtocolInvalid);
        }

        if input.protocol_version < cfg.minimum_protocol {
            verdict.flag(AttackType::ProtocolInvalid);
        }

        if verdict.detected && input.config.live_debug && input.config.debug.invalid_wallet {
            debug!(
                starting_height = input.starting_height,
                protocol_version = input.protocol_version,
                minimum_protocol = cfg.minimum_protocol,
                "invalid wallet suspected"
            );
        }
    }

    verdict.request_mitigation(
        cfg.blacklist,
        cfg.ban,
        BanReason::InvalidWallet,
        cfg.ban_time_secs,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::InputFixture;

    fn run(fixture: &InputFixture) -> Verdict {
        let mut verdict = Verdict::default();
        check(&fixture.input(), &mut verdict);
        verdict
    }

    #[test]
    fn test_negative_starting_height() {
        let mut fixture = InputFixture::default();
        fixture.starting_height = -1;

        let verdict = run(&fixture);
        assert_eq!(verdict.attack_type, Some(AttackType::StartHeightInvalid));
        assert!(verdict.blacklist);
        assert!(verdict.ban);
        assert_eq!(verdict.ban_reason, Some(BanReason::InvalidWallet));
    }

    #[test]
    fn test_zero_protocol_version() {
        let mut fixture = InputFixture::default();
        fixture.protocol_version = 0;

        let verdict = run(&fixture);
        assert_eq!(verdict.attack_type, Some(AttackType::ProtocolInvalid));
    }

    #[test]
    fn test_obsolete_protocol_version() {
        let mut fixture = InputFixture::default();
        fixture.protocol_version = fixture.config.invalid_wallet.minimum_protocol - 1;

        let verdict = run(&fixture);
        assert_eq!(verdict.attack_type, Some(AttackType::ProtocolInvalid));
    }

    #[test]
    fn test_within_check_window_is_skipped() {
        let mut fixture = InputFixture::default();
        fixture.starting_height = -1;
        fixture.time_connected = fixture.config.invalid_wallet.max_check_secs;

        assert!(!run(&fixture).detected);
    }

    #[test]
    fn test_valid_peer_is_clean() {
        let fixture = InputFixture::default();
        assert!(!run(&fixture).detected);
    }
}
