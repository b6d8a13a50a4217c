use tracing::debug;

use crate::{
    ban::BanReason,
    rules::{AttackType, RuleInput, Verdict},
};

/// Build the warning code for one peer: every predicate below is evaluated
/// in fixed order, and the (1-based) index of each true predicate is
/// appended to the code string.
///
/// Configured attack signatures are matched against this code by literal
/// string equality. Operators author signatures against this exact table,
/// so the predicate order is part of the interface and must not be
/// reordered.
pub fn warning_code(input: &RuleInput) -> String {
    let cfg = &input.config.flooding_wallet;
    let baseline = input.baseline;
    let stats = input.stats;

    let checks = [
        stats.traffic_average > baseline.traffic_max,
        stats.traffic_average < baseline.traffic_min,
        stats.traffic_average > cfg.max_traffic_average,
        stats.traffic_average < cfg.min_traffic_average,
        input.bytes_sent > cfg.max_bytes,
        input.bytes_sent < cfg.min_bytes,
        input.bytes_received > cfg.max_bytes,
        input.bytes_received < cfg.min_bytes,
        input.bytes_sent > input.bytes_received,
        input.bytes_received > input.bytes_sent,
        input.bytes_sent == input.bytes_received,
        input.node_height > baseline.height_max,
        input.node_height < baseline.height_min,
        input.node_height < baseline.avg_height,
        input.node_height > baseline.avg_height,
        input.starting_height == input.synced_height,
        input.starting_height > input.synced_height,
        input.starting_height < input.synced_height,
        input.time_connected > cfg.max_check_secs,
        input.time_connected < cfg.max_check_secs,
        input.time_connected < cfg.min_check_secs,
        input.bytes_sent > baseline.avg_send,
        input.bytes_received > baseline.avg_recv,
        baseline.avg_traffic > cfg.min_traffic_average,
        input.protocol_version < input.config.invalid_wallet.minimum_protocol,
    ];

    let mut code = String::new();
    for (index, triggered) in checks.iter().enumerate() {
        if *triggered {
            code.push_str(&(index + 1).to_string());
        }
    }
    code
}

/// Flooding-wallet detection: the peer's warning code is compared against
/// the operator-configured attack signatures. Only an exact match detects;
/// this is deliberately not a fuzzy or subset comparison.
pub(super) fn check(input: &RuleInput, verdict: &mut Verdict) {
    let cfg = &input.config.flooding_wallet;
    if !cfg.detect {
        return;
    }

    let code = warning_code(input);
    if input.config.live_debug && input.config.debug.flooding_wallet {
        debug!(warning_code = %code, "flooding wallet warning code");
    }

    if !code.is_empty() && cfg.patterns.iter().any(|pattern| *pattern == code) {
        verdict.flag(AttackType::FloodingWallet);
    }

    verdict.request_mitigation(
        cfg.blacklist,
        cfg.ban,
        BanReason::FloodingWallet,
        cfg.ban_time_secs,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::InputFixture;

    /// A download-heavy flooder: huge receive count, tiny send count, stuck
    /// below the population height band, short-lived connection.
    fn flooder() -> InputFixture {
        let mut fixture = InputFixture::default();
        fixture.baseline.avg_height = 500;
        fixture.baseline.height_min = 400;
        fixture.baseline.height_max = 600;
        fixture.baseline.traffic_min = 1.0;
        fixture.baseline.traffic_max = 10.0;
        fixture.stats.traffic_average = 50.0;
        fixture.node_height = 100;
        fixture.starting_height = 100;
        fixture.synced_height = 100;
        fixture.bytes_sent = 1_000;
        fixture.bytes_received = 2_000_000;
        fixture.time_connected = 45;
        fixture
    }

    /// Expected code for `flooder()` against the default config:
    /// 1 (avg > traffic_max), 4 (avg < flood min traffic avg),
    /// 6 (sent < min bytes), 7 (recv > max bytes), 10 (recv > sent),
    /// 13 (height < band min), 14 (height < center), 16 (start == synced),
    /// 20 (connected < max check), 22/23 (bytes above the zeroed share
    /// accumulators).
    fn expected_flooder_code() -> String {
        "146710131416202223".to_string()
    }

    fn run(fixture: &InputFixture) -> Verdict {
        let mut verdict = Verdict::default();
        check(&fixture.input(), &mut verdict);
        verdict
    }

    #[test]
    fn test_warning_code_for_flooder() {
        let fixture = flooder();
        assert_eq!(warning_code(&fixture.input()), expected_flooder_code());
    }

    #[test]
    fn test_exact_signature_match_detects() {
        let mut fixture = flooder();
        fixture
            .config
            .flooding_wallet
            .patterns
            .try_push(expected_flooder_code())
            .unwrap();

        let verdict = run(&fixture);
        assert!(verdict.detected);
        assert_eq!(verdict.attack_type, Some(AttackType::FloodingWallet));
        assert_eq!(verdict.ban_reason, Some(BanReason::FloodingWallet));
    }

    #[test]
    fn test_one_character_difference_does_not_match() {
        let mut fixture = flooder();
        let mut signature = expected_flooder_code();
        signature.pop();
        fixture
            .config
            .flooding_wallet
            .patterns
            .try_push(signature)
            .unwrap();

        assert!(!run(&fixture).detected);
    }

    #[test]
    fn test_no_signatures_never_detects() {
        let fixture = flooder();
        assert!(!run(&fixture).detected);
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let mut fixture = flooder();
        fixture
            .config
            .flooding_wallet
            .patterns
            .try_push(expected_flooder_code())
            .unwrap();
        fixture.config.flooding_wallet.detect = false;

        assert!(!run(&fixture).detected);
    }
}
