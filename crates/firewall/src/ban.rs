use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::{info, warn};
use vigil_storage::tables::banned_peers::{BanEntry, BannedPeersTable};

/// Reason code attached to a ban, one per detection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanReason {
    BandwidthAbuse,
    InvalidWallet,
    ForkedWallet,
    FloodingWallet,
}

impl std::fmt::Display for BanReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BanReason::BandwidthAbuse => write!(f, "bandwidth abuse"),
            BanReason::InvalidWallet => write!(f, "invalid wallet"),
            BanReason::ForkedWallet => write!(f, "forked wallet"),
            BanReason::FloodingWallet => write!(f, "flooding wallet"),
        }
    }
}

/// Persistent, timed, reason-coded deny-list.
///
/// Lookups hit an in-memory cache; bans are written through to the redb
/// table when one is attached, so they survive restarts. Store failures are
/// logged and never escalate into the detection path.
pub struct BanList {
    banned: RwLock<HashMap<String, BanEntry>>,
    table: Option<Arc<BannedPeersTable>>,
}

impl BanList {
    pub fn new(table: Option<Arc<BannedPeersTable>>) -> Self {
        Self {
            banned: RwLock::new(HashMap::new()),
            table,
        }
    }

    /// Populate the cache from the database on startup, dropping rows whose
    /// ban has already expired. Returns the number of live bans loaded.
    pub fn load_from_db(&self) -> anyhow::Result<usize> {
        let Some(ref table) = self.table else {
            return Ok(0);
        };

        let mut loaded_count = 0;
        let mut banned = self.banned.write();
        for (address, entry) in table.get_all()? {
            if entry.is_expired() {
                if let Err(err) = table.remove(&address) {
                    warn!("Failed to remove expired ban for {address}: {err}");
                }
                continue;
            }
            banned.insert(address, entry);
            loaded_count += 1;
        }

        info!("Loaded {loaded_count} banned peers from database");
        Ok(loaded_count)
    }

    /// Ban a peer for `duration_secs` seconds. A duration of 0 is a
    /// permanent ban.
    pub fn ban(&self, address: &str, reason: BanReason, duration_secs: u64) {
        let duration = if duration_secs == 0 {
            None
        } else {
            Some(duration_secs)
        };
        let entry = BanEntry::new(&reason.to_string(), duration);

        if let Some(ref table) = self.table {
            if let Err(err) = table.insert(address, &entry) {
                warn!("Failed to persist ban for {address}: {err}");
            }
        }
        self.banned.write().insert(address.to_string(), entry);
    }

    /// Check whether a peer is currently banned. Expired entries are
    /// removed lazily on lookup.
    pub fn is_banned(&self, address: &str) -> bool {
        let expired = match self.banned.read().get(address) {
            Some(entry) => entry.is_expired(),
            None => return false,
        };

        if expired {
            self.clear(address);
            return false;
        }
        true
    }

    /// Clear the ban for one address.
    pub fn clear(&self, address: &str) {
        let removed = self.banned.write().remove(address).is_some();
        if let Some(ref table) = self.table {
            if let Err(err) = table.remove(address) {
                warn!("Failed to remove ban for {address}: {err}");
            }
        }
        if removed {
            info!("Cleared ban for {address}");
        }
    }

    /// Clear every ban.
    pub fn clear_all(&self) {
        self.banned.write().clear();
        if let Some(ref table) = self.table {
            if let Err(err) = table.clear() {
                warn!("Failed to clear ban table: {err}");
            }
        }
        info!("Cleared all bans");
    }

    pub fn banned_count(&self) -> usize {
        self.banned.read().len()
    }
}
