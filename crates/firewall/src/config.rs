use thiserror::Error;

/// Hard cap shared by every operator-editable list (whitelist, session
/// blacklist, forked-height list, flood-signature list).
pub const LIST_CAPACITY: usize = 256;

/// Quiet interval after which a peer's traffic average is folded back into
/// the population baseline (seconds).
pub const TRAFFIC_QUIET_SECS: u64 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("list is at capacity ({LIST_CAPACITY} entries)")]
    OverCapacity,

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Append-only list with an explicit capacity cap. Appends past the cap are
/// rejected, never silently dropped. This is the control-surface overflow
/// policy; the session blacklist's mitigation path wraps instead (see
/// `blacklist.rs`).
#[derive(Debug, Clone)]
pub struct BoundedList<T> {
    entries: Vec<T>,
}

impl<T> Default for BoundedList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PartialEq> BoundedList<T> {
    /// Append an entry, returning the new length. Duplicates are accepted
    /// and ignored.
    pub fn try_push(&mut self, value: T) -> Result<usize, ConfigError> {
        if self.entries.len() >= LIST_CAPACITY {
            return Err(ConfigError::OverCapacity);
        }
        if !self.entries.contains(&value) {
            self.entries.push(value);
        }
        Ok(self.entries.len())
    }

    pub fn remove(&mut self, value: &T) -> bool {
        match self.entries.iter().position(|entry| entry == value) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> BoundedList<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.clone()
    }
}

impl BoundedList<String> {
    pub fn contains_str(&self, value: &str) -> bool {
        self.entries.iter().any(|entry| entry == value)
    }
}

/// Per-area toggles for the extra-verbose examination output. Only honored
/// while the master `live_debug` switch is on.
#[derive(Debug, Clone)]
pub struct DebugTopics {
    pub exam: bool,
    pub bans: bool,
    pub blacklist: bool,
    pub disconnect: bool,
    pub bandwidth_abuse: bool,
    pub false_positive: bool,
    pub invalid_wallet: bool,
    pub forked_wallet: bool,
    pub flooding_wallet: bool,
}

impl Default for DebugTopics {
    fn default() -> Self {
        Self {
            exam: true,
            bans: true,
            blacklist: true,
            disconnect: true,
            bandwidth_abuse: true,
            false_positive: true,
            invalid_wallet: true,
            forked_wallet: true,
            flooding_wallet: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BandwidthAbuseConfig {
    pub detect: bool,
    pub blacklist: bool,
    pub ban: bool,
    pub ban_time_secs: u64,
    /// Minimum connection age before the rule applies (seconds).
    pub max_check_secs: u64,
    /// Instantaneous sent/received ratio band treated as an attack by the
    /// false-positive pass.
    pub min_attack: f64,
    pub max_attack: f64,
}

impl Default for BandwidthAbuseConfig {
    fn default() -> Self {
        Self {
            detect: true,
            blacklist: true,
            ban: true,
            ban_time_secs: 60 * 60 * 24,
            max_check_secs: 10,
            min_attack: 17.1,
            max_attack: 17.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvalidWalletConfig {
    pub detect: bool,
    pub blacklist: bool,
    pub ban: bool,
    pub ban_time_secs: u64,
    /// Oldest protocol version still accepted from a peer.
    pub minimum_protocol: i32,
    /// Minimum connection age before the rule applies (seconds).
    pub max_check_secs: u64,
}

impl Default for InvalidWalletConfig {
    fn default() -> Self {
        Self {
            detect: true,
            blacklist: true,
            ban: true,
            ban_time_secs: 2400 * 60 * 60,
            minimum_protocol: 80007,
            max_check_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForkedWalletConfig {
    pub detect: bool,
    pub blacklist: bool,
    pub ban: bool,
    pub ban_time_secs: u64,
    /// Known stuck/forked chain tips. A peer reporting any of these as its
    /// starting or synced height is flagged.
    pub node_heights: BoundedList<i64>,
}

impl Default for ForkedWalletConfig {
    fn default() -> Self {
        Self {
            detect: true,
            blacklist: true,
            ban: true,
            ban_time_secs: 2400 * 60 * 60,
            node_heights: BoundedList::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FloodingWalletConfig {
    pub detect: bool,
    pub blacklist: bool,
    pub ban: bool,
    pub ban_time_secs: u64,
    pub min_bytes: u64,
    pub max_bytes: u64,
    pub min_traffic_average: f64,
    pub max_traffic_average: f64,
    pub min_check_secs: u64,
    pub max_check_secs: u64,
    /// Operator-authored warning-code signatures; matched by literal string
    /// equality against the concatenated warning code.
    pub patterns: BoundedList<String>,
}

impl Default for FloodingWalletConfig {
    fn default() -> Self {
        Self {
            detect: true,
            blacklist: true,
            ban: true,
            ban_time_secs: 2400 * 60 * 60,
            min_bytes: 500_000,
            max_bytes: 1_000_000,
            min_traffic_average: 2000.0,
            max_traffic_average: 2000.1,
            min_check_secs: 30,
            max_check_secs: 90,
            patterns: BoundedList::default(),
        }
    }
}

/// Every toggle and threshold the engine reads. Lives inside the engine's
/// single lock domain; mutated only through the settings surface.
#[derive(Debug, Clone)]
pub struct FirewallConfig {
    pub enabled: bool,
    /// Latch: empty the session blacklist on the next gate pass.
    pub clear_blacklist: bool,
    /// Latch: clear the persistent ban entry for each peer as it is gated.
    pub clear_bans: bool,
    pub live_debug: bool,
    pub debug: DebugTopics,
    /// Height tolerance subtracted from the ratcheted baseline center.
    pub average_tolerance: i64,
    /// Half-width of the accepted height band around the baseline center.
    pub average_range: i64,
    pub traffic_tolerance: f64,
    pub traffic_zone: f64,
    pub whitelist: BoundedList<String>,
    pub seed_exempt: BoundedList<String>,
    pub false_positive_protection: bool,
    pub bandwidth_abuse: BandwidthAbuseConfig,
    pub invalid_wallet: InvalidWalletConfig,
    pub forked_wallet: ForkedWalletConfig,
    pub flooding_wallet: FloodingWalletConfig,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clear_blacklist: false,
            clear_bans: false,
            live_debug: false,
            debug: DebugTopics::default(),
            average_tolerance: 2,
            average_range: 100,
            traffic_tolerance: 0.0001,
            traffic_zone: 4.0,
            whitelist: BoundedList::default(),
            seed_exempt: BoundedList::default(),
            false_positive_protection: true,
            bandwidth_abuse: BandwidthAbuseConfig::default(),
            invalid_wallet: InvalidWalletConfig::default(),
            forked_wallet: ForkedWalletConfig::default(),
            flooding_wallet: FloodingWalletConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_list_rejects_at_capacity() {
        let mut list = BoundedList::default();
        for index in 0..LIST_CAPACITY {
            list.try_push(format!("10.0.0.{index}:9333")).unwrap();
        }

        assert_eq!(
            list.try_push("192.0.2.1:9333".to_string()),
            Err(ConfigError::OverCapacity)
        );
        assert_eq!(list.len(), LIST_CAPACITY);
    }

    #[test]
    fn test_bounded_list_ignores_duplicates() {
        let mut list = BoundedList::default();
        assert_eq!(list.try_push(42_i64), Ok(1));
        assert_eq!(list.try_push(42_i64), Ok(1));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_bounded_list_remove() {
        let mut list = BoundedList::default();
        list.try_push("198.51.100.1:9333".to_string()).unwrap();

        assert!(list.remove(&"198.51.100.1:9333".to_string()));
        assert!(!list.remove(&"198.51.100.1:9333".to_string()));
        assert!(list.is_empty());
    }
}
