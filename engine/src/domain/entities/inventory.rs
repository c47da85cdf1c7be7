//! Inventory entity
//! The ordered, name-keyed collection of managed servers

use crate::domain::{DomainError, Result, ServerRecord};

/// The authoritative list of managed hosts.
///
/// Insertion order is preserved for display and for deterministic config
/// generation; names are unique. This is a plain value passed explicitly to
/// every operation; there is no process-wide inventory singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    servers: Vec<ServerRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records, rejecting duplicate names
    pub fn from_records(records: Vec<ServerRecord>) -> Result<Self> {
        let mut inventory = Inventory::new();
        for record in records {
            inventory.add(record)?;
        }
        Ok(inventory)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.servers.iter().any(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ServerRecord> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// Ordered, read-only view of the records
    pub fn iter(&self) -> impl Iterator<Item = &ServerRecord> {
        self.servers.iter()
    }

    /// Ordered snapshot of the records (deploy/verify fan-out input)
    pub fn records(&self) -> &[ServerRecord] {
        &self.servers
    }

    /// Add a record; fails without mutating if the name already exists
    pub fn add(&mut self, record: ServerRecord) -> Result<()> {
        if self.contains(&record.name) {
            return Err(DomainError::DuplicateServer(record.name));
        }
        self.servers.push(record);
        Ok(())
    }

    /// Remove by name. Idempotent: removing an absent server is not an
    /// error, so re-running automation against a shrunk fleet never blocks.
    /// Returns whether a record was actually removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.servers.len();
        self.servers.retain(|s| s.name != name);
        self.servers.len() != before
    }

    /// Update one field of one record from its string representation
    pub fn update(&mut self, name: &str, field: &str, value: &str) -> Result<()> {
        let record = self
            .servers
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| DomainError::ServerNotFound(name.to_string()))?;
        record.update_field(field, value)
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a ServerRecord;
    type IntoIter = std::slice::Iter<'a, ServerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.servers.iter()
    }
}
