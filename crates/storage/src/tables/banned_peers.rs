use std::sync::Arc;

use redb::{
    Database, Durability, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Entry for a banned peer stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BanEntry {
    /// Unix timestamp when the peer was banned (seconds since epoch).
    pub banned_at: u64,
    /// Unix timestamp when the ban expires (0 = permanent ban).
    pub ban_expires_at: u64,
    /// Reason for the ban (truncated to 256 bytes).
    pub reason: String,
}

impl BanEntry {
    /// Create a new ban entry with an optional duration. `None` is a
    /// permanent ban.
    pub fn new(reason: &str, ban_duration_secs: Option<u64>) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let ban_expires_at = match ban_duration_secs {
            Some(duration) => now.saturating_add(duration),
            None => 0,
        };

        let mut reason = reason.to_string();
        reason.truncate(256);

        Self {
            banned_at: now,
            ban_expires_at,
            reason,
        }
    }

    /// Check if the ban has expired. Permanent bans never expire.
    pub fn is_expired(&self) -> bool {
        if self.ban_expires_at == 0 {
            return false;
        }

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        now >= self.ban_expires_at
    }
}

/// Table for storing banned peers.
///
/// Key: peer address string (as reported by the transport layer)
/// Value: BanEntry (bincode encoded)
pub struct BannedPeersTable {
    pub db: Arc<Database>,
}

impl BannedPeersTable {
    pub const TABLE_DEFINITION: TableDefinition<'static, &'static str, &'static [u8]> =
        TableDefinition::new("banned_peers");

    /// Get a ban entry by peer address. An address that was never banned
    /// (including on a fresh database with no table yet) yields `None`.
    pub fn get(&self, address: &str) -> Result<Option<BanEntry>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(Self::TABLE_DEFINITION) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let result = table.get(address)?;
        match result {
            Some(value) => Ok(Some(bincode::deserialize(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or update a ban entry.
    pub fn insert(&self, address: &str, entry: &BanEntry) -> Result<(), StoreError> {
        let encoded = bincode::serialize(entry)?;
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        {
            let mut table = write_txn.open_table(Self::TABLE_DEFINITION)?;
            table.insert(address, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove a ban entry, returning it if it was present.
    pub fn remove(&self, address: &str) -> Result<Option<BanEntry>, StoreError> {
        let write_txn = self.db.begin_write()?;
        let value = {
            let mut table = write_txn.open_table(Self::TABLE_DEFINITION)?;
            match table.remove(address)? {
                Some(value) => Some(bincode::deserialize(value.value())?),
                None => None,
            }
        };
        write_txn.commit()?;
        Ok(value)
    }

    /// Remove every ban entry.
    pub fn clear(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(Self::TABLE_DEFINITION)?;
            table.retain(|_, _| false)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get all banned peers (address + entry).
    pub fn get_all(&self) -> Result<Vec<(String, BanEntry)>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(Self::TABLE_DEFINITION) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut result = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            let entry = bincode::deserialize(value.value())?;
            result.push((key.value().to_string(), entry));
        }

        Ok(result)
    }

    /// Remove all expired bans and return the count of removed entries.
    pub fn cleanup_expired(&self) -> Result<usize, StoreError> {
        let all_entries = self.get_all()?;
        let mut removed_count = 0;

        for (address, entry) in all_entries {
            if entry.is_expired() {
                self.remove(&address)?;
                removed_count += 1;
            }
        }

        Ok(removed_count)
    }

    /// Count the number of banned peers.
    pub fn count(&self) -> Result<usize, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(Self::TABLE_DEFINITION) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        Ok(table.len()? as usize)
    }
}
