//! Typed control surface. The node's command layer parses operator input
//! and calls these; a malformed or over-capacity update is rejected with
//! the prior value left in effect.

use crate::{
    Firewall,
    config::{ConfigError, DebugTopics, FirewallConfig},
};

/// Selector for the per-rule {detect, blacklist, ban, ban-duration} tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    BandwidthAbuse,
    InvalidWallet,
    ForkedWallet,
    FloodingWallet,
}

fn finite(value: f64, name: &str) -> Result<f64, ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue(format!(
            "{name} must be a non-negative finite number, got {value}"
        )));
    }
    Ok(value)
}

impl Firewall {
    fn with_config<R>(&self, update: impl FnOnce(&mut FirewallConfig) -> R) -> R {
        update(&mut self.state.lock().config)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.with_config(|config| config.enabled = enabled);
    }

    pub fn set_clear_blacklist(&self, clear: bool) {
        self.with_config(|config| config.clear_blacklist = clear);
    }

    pub fn set_clear_bans(&self, clear: bool) {
        self.with_config(|config| config.clear_bans = clear);
    }

    pub fn set_live_debug(&self, live_debug: bool) {
        self.with_config(|config| config.live_debug = live_debug);
    }

    pub fn set_debug_topics(&self, topics: DebugTopics) {
        self.with_config(|config| config.debug = topics);
    }

    pub fn set_false_positive_protection(&self, enabled: bool) {
        self.with_config(|config| config.false_positive_protection = enabled);
    }

    pub fn set_average_tolerance(&self, tolerance: i64) -> Result<(), ConfigError> {
        if tolerance < 0 {
            return Err(ConfigError::InvalidValue(format!(
                "height tolerance must be non-negative, got {tolerance}"
            )));
        }
        self.with_config(|config| config.average_tolerance = tolerance);
        Ok(())
    }

    pub fn set_average_range(&self, range: i64) -> Result<(), ConfigError> {
        if range < 0 {
            return Err(ConfigError::InvalidValue(format!(
                "height range must be non-negative, got {range}"
            )));
        }
        self.with_config(|config| config.average_range = range);
        Ok(())
    }

    pub fn set_traffic_tolerance(&self, tolerance: f64) -> Result<(), ConfigError> {
        let tolerance = finite(tolerance, "traffic tolerance")?;
        self.with_config(|config| config.traffic_tolerance = tolerance);
        Ok(())
    }

    pub fn set_traffic_zone(&self, zone: f64) -> Result<(), ConfigError> {
        let zone = finite(zone, "traffic zone")?;
        self.with_config(|config| config.traffic_zone = zone);
        Ok(())
    }

    /// Append to the whitelist. Returns the resulting list length.
    pub fn add_to_whitelist(&self, address: &str) -> Result<usize, ConfigError> {
        self.with_config(|config| config.whitelist.try_push(address.to_string()))
    }

    pub fn add_seed_exempt(&self, address: &str) -> Result<usize, ConfigError> {
        self.with_config(|config| config.seed_exempt.try_push(address.to_string()))
    }

    /// Append to the session blacklist. Unlike the mitigation path, this
    /// rejects once the list is at capacity.
    pub fn add_to_blacklist(&self, address: &str) -> Result<usize, ConfigError> {
        self.state.lock().blacklist.try_append(address)
    }

    pub fn set_rule_detect(&self, rule: Rule, detect: bool) {
        self.with_config(|config| match rule {
            Rule::BandwidthAbuse => config.bandwidth_abuse.detect = detect,
            Rule::InvalidWallet => config.invalid_wallet.detect = detect,
            Rule::ForkedWallet => config.forked_wallet.detect = detect,
            Rule::FloodingWallet => config.flooding_wallet.detect = detect,
        });
    }

    pub fn set_rule_blacklist(&self, rule: Rule, blacklist: bool) {
        self.with_config(|config| match rule {
            Rule::BandwidthAbuse => config.bandwidth_abuse.blacklist = blacklist,
            Rule::InvalidWallet => config.invalid_wallet.blacklist = blacklist,
            Rule::ForkedWallet => config.forked_wallet.blacklist = blacklist,
            Rule::FloodingWallet => config.flooding_wallet.blacklist = blacklist,
        });
    }

    pub fn set_rule_ban(&self, rule: Rule, ban: bool) {
        self.with_config(|config| match rule {
            Rule::BandwidthAbuse => config.bandwidth_abuse.ban = ban,
            Rule::InvalidWallet => config.invalid_wallet.ban = ban,
            Rule::ForkedWallet => config.forked_wallet.ban = ban,
            Rule::FloodingWallet => config.flooding_wallet.ban = ban,
        });
    }

    pub fn set_rule_ban_time(&self, rule: Rule, ban_time_secs: u64) {
        self.with_config(|config| match rule {
            Rule::BandwidthAbuse => config.bandwidth_abuse.ban_time_secs = ban_time_secs,
            Rule::InvalidWallet => config.invalid_wallet.ban_time_secs = ban_time_secs,
            Rule::ForkedWallet => config.forked_wallet.ban_time_secs = ban_time_secs,
            Rule::FloodingWallet => config.flooding_wallet.ban_time_secs = ban_time_secs,
        });
    }

    pub fn set_bandwidth_max_check(&self, seconds: u64) {
        self.with_config(|config| config.bandwidth_abuse.max_check_secs = seconds);
    }

    /// Instantaneous sent/received ratio band the suppression pass treats
    /// as an attack.
    pub fn set_bandwidth_attack_band(&self, min: f64, max: f64) -> Result<(), ConfigError> {
        let min = finite(min, "attack band minimum")?;
        let max = finite(max, "attack band maximum")?;
        if min > max {
            return Err(ConfigError::InvalidValue(format!(
                "attack band minimum {min} exceeds maximum {max}"
            )));
        }
        self.with_config(|config| {
            config.bandwidth_abuse.min_attack = min;
            config.bandwidth_abuse.max_attack = max;
        });
        Ok(())
    }

    pub fn set_minimum_protocol(&self, version: i32) -> Result<(), ConfigError> {
        if version < 1 {
            return Err(ConfigError::InvalidValue(format!(
                "minimum protocol must be positive, got {version}"
            )));
        }
        self.with_config(|config| config.invalid_wallet.minimum_protocol = version);
        Ok(())
    }

    pub fn set_invalid_max_check(&self, seconds: u64) {
        self.with_config(|config| config.invalid_wallet.max_check_secs = seconds);
    }

    pub fn add_forked_height(&self, height: i64) -> Result<usize, ConfigError> {
        self.with_config(|config| config.forked_wallet.node_heights.try_push(height))
    }

    pub fn set_flooding_bytes(&self, min: u64, max: u64) -> Result<(), ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidValue(format!(
                "byte floor {min} exceeds ceiling {max}"
            )));
        }
        self.with_config(|config| {
            config.flooding_wallet.min_bytes = min;
            config.flooding_wallet.max_bytes = max;
        });
        Ok(())
    }

    pub fn set_flooding_traffic_band(&self, min: f64, max: f64) -> Result<(), ConfigError> {
        let min = finite(min, "traffic average minimum")?;
        let max = finite(max, "traffic average maximum")?;
        if min > max {
            return Err(ConfigError::InvalidValue(format!(
                "traffic average minimum {min} exceeds maximum {max}"
            )));
        }
        self.with_config(|config| {
            config.flooding_wallet.min_traffic_average = min;
            config.flooding_wallet.max_traffic_average = max;
        });
        Ok(())
    }

    pub fn set_flooding_check_window(&self, min: u64, max: u64) -> Result<(), ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidValue(format!(
                "check window floor {min} exceeds ceiling {max}"
            )));
        }
        self.with_config(|config| {
            config.flooding_wallet.min_check_secs = min;
            config.flooding_wallet.max_check_secs = max;
        });
        Ok(())
    }

    /// Append an attack signature. Signatures are concatenated warning-code
    /// digits, so anything else is malformed.
    pub fn add_flood_pattern(&self, pattern: &str) -> Result<usize, ConfigError> {
        if pattern.is_empty() || !pattern.chars().all(|character| character.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue(format!(
                "attack signature must be a non-empty digit string, got {pattern:?}"
            )));
        }
        self.with_config(|config| config.flooding_wallet.patterns.try_push(pattern.to_string()))
    }

    pub fn remove_flood_pattern(&self, pattern: &str) -> bool {
        self.with_config(|config| config.flooding_wallet.patterns.remove(&pattern.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LIST_CAPACITY;

    fn firewall() -> Firewall {
        Firewall::new(FirewallConfig::default())
    }

    #[test]
    fn test_toggles_round_trip() {
        let firewall = firewall();
        firewall.set_enabled(false);
        firewall.set_clear_bans(true);
        firewall.set_rule_detect(Rule::FloodingWallet, false);
        firewall.set_rule_ban_time(Rule::ForkedWallet, 42);

        let status = firewall.status();
        assert!(!status.enabled);
        assert!(status.clear_banlist);
        assert!(!status.flooding_wallet.rule.detect);
        assert_eq!(status.forked_wallet.rule.ban_time_secs, 42);
    }

    #[test]
    fn test_invalid_threshold_leaves_prior_value() {
        let firewall = firewall();
        assert!(firewall.set_traffic_zone(f64::NAN).is_err());
        assert!(firewall.set_traffic_zone(-1.0).is_err());
        assert!(firewall.set_average_tolerance(-5).is_err());

        let status = firewall.status();
        assert_eq!(status.traffic_zone, 4.0);
        assert_eq!(status.average_tolerance, 2);
    }

    #[test]
    fn test_attack_band_ordering_enforced() {
        let firewall = firewall();
        assert!(firewall.set_bandwidth_attack_band(18.0, 17.0).is_err());
        assert!(firewall.set_bandwidth_attack_band(17.1, 17.2).is_ok());
    }

    #[test]
    fn test_flood_pattern_validation() {
        let firewall = firewall();
        assert!(firewall.add_flood_pattern("").is_err());
        assert!(firewall.add_flood_pattern("12a4").is_err());
        assert_eq!(firewall.add_flood_pattern("146"), Ok(1));

        assert!(firewall.remove_flood_pattern("146"));
        assert!(!firewall.remove_flood_pattern("146"));
    }

    #[test]
    fn test_whitelist_capacity_reported() {
        let firewall = firewall();
        for index in 0..LIST_CAPACITY {
            firewall
                .add_to_whitelist(&format!("10.0.{}.{}:9333", index / 256, index % 256))
                .unwrap();
        }

        assert_eq!(
            firewall.add_to_whitelist("192.0.2.1:9333"),
            Err(ConfigError::OverCapacity)
        );
    }
}
