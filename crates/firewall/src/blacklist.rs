use crate::config::{ConfigError, LIST_CAPACITY};

/// Session-scoped deny-list of peer addresses. Lost on restart; distinct
/// from the persistent ban store.
///
/// Two overflow policies live here on purpose: the mitigation path wraps
/// its write cursor at capacity and overwrites from the start, while the
/// control-surface append rejects with an over-capacity error.
#[derive(Debug, Default)]
pub struct BlacklistSet {
    entries: Vec<String>,
    cursor: usize,
}

impl BlacklistSet {
    pub fn contains(&self, address: &str) -> bool {
        self.entries.iter().any(|entry| entry == address)
    }

    /// Mitigation-path insert. At capacity the write cursor resets to 0 and
    /// overwrites the oldest-indexed entry. Returns `false` if the address
    /// was already present.
    pub fn insert_wrapping(&mut self, address: &str) -> bool {
        if self.contains(address) {
            return false;
        }

        if self.entries.len() < LIST_CAPACITY {
            self.entries.push(address.to_string());
            self.cursor = self.entries.len();
        } else {
            if self.cursor >= LIST_CAPACITY {
                self.cursor = 0;
            }
            self.entries[self.cursor] = address.to_string();
            self.cursor += 1;
        }
        true
    }

    /// Control-surface append: rejects once the list is at capacity.
    /// Returns the resulting length.
    pub fn try_append(&mut self, address: &str) -> Result<usize, ConfigError> {
        if self.entries.len() >= LIST_CAPACITY {
            return Err(ConfigError::OverCapacity);
        }
        if !self.contains(address) {
            self.entries.push(address.to_string());
            self.cursor = self.entries.len();
        }
        Ok(self.entries.len())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut blacklist = BlacklistSet::default();

        assert!(blacklist.insert_wrapping("192.0.2.1:9333"));
        assert!(!blacklist.insert_wrapping("192.0.2.1:9333"));
        assert!(blacklist.contains("192.0.2.1:9333"));
        assert_eq!(blacklist.len(), 1);
    }

    #[test]
    fn test_insert_wraps_at_capacity() {
        let mut blacklist = BlacklistSet::default();
        for index in 0..LIST_CAPACITY {
            assert!(blacklist.insert_wrapping(&format!("10.0.{}.{}:9333", index / 256, index % 256)));
        }
        assert_eq!(blacklist.len(), LIST_CAPACITY);

        // The next insert overwrites index 0 rather than rejecting.
        assert!(blacklist.insert_wrapping("192.0.2.99:9333"));
        assert_eq!(blacklist.len(), LIST_CAPACITY);
        assert!(blacklist.contains("192.0.2.99:9333"));
        assert!(!blacklist.contains("10.0.0.0:9333"));
        assert!(blacklist.contains("10.0.0.1:9333"));
    }

    #[test]
    fn test_try_append_rejects_at_capacity() {
        let mut blacklist = BlacklistSet::default();
        for index in 0..LIST_CAPACITY {
            blacklist
                .try_append(&format!("10.0.{}.{}:9333", index / 256, index % 256))
                .unwrap();
        }

        assert_eq!(
            blacklist.try_append("192.0.2.99:9333"),
            Err(ConfigError::OverCapacity)
        );
        assert_eq!(blacklist.len(), LIST_CAPACITY);
    }

    #[test]
    fn test_clear() {
        let mut blacklist = BlacklistSet::default();
        blacklist.insert_wrapping("192.0.2.1:9333");
        blacklist.clear();

        assert!(blacklist.is_empty());
        assert!(!blacklist.contains("192.0.2.1:9333"));
    }
}
