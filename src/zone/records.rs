use std::collections::HashMap;

/// The name used for records at the zone apex
pub const APEX: &str = "@";

/// A single record value and its TTL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub ttl: u32,
    pub value: String,
}

/// All the records of a single type for an owner
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordGroup {
    pub kind: String,
    pub records: Vec<Record>,
}

/// All the records owned by a single name within a zone
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSet {
    name: String,
    groups: Vec<RecordGroup>,
}

impl RecordSet {
    /// Create an empty record set for the name, relative to the zone origin
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Add a record, grouping it with the existing records of the same type
    pub fn push<K, V>(&mut self, kind: K, ttl: u32, value: V)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let kind = kind.as_ref();
        let record = Record {
            ttl,
            value: value.into(),
        };

        match self.groups.iter_mut().find(|g| g.kind == kind) {
            Some(group) => group.records.push(record),
            None => self.groups.push(RecordGroup {
                kind: kind.to_owned(),
                records: vec![record],
            }),
        }
    }

    /// Builder-style variant of `push`
    #[cfg(test)]
    pub fn with<K, V>(mut self, kind: K, ttl: u32, value: V) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.push(kind, ttl, value);
        self
    }

    /// The owner name relative to the zone origin
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fully-qualified owner name, without the trailing dot
    pub fn fqdn(&self, origin: &str) -> String {
        let origin = origin.trim_end_matches('.');
        if self.name == APEX {
            origin.to_owned()
        } else {
            format!("{}.{}", self.name, origin)
        }
    }

    /// The record groups in the order their types were first seen
    pub fn groups(&self) -> &[RecordGroup] {
        &self.groups
    }

    /// Find the group for a record type
    pub fn group(&self, kind: &str) -> Option<&RecordGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// The value of the first A record, if any
    pub fn first_address(&self) -> Option<&str> {
        self.group("A")
            .and_then(|g| g.records.first())
            .map(|r| r.value.as_str())
    }
}

/// Collects records into per-owner sets, keeping the order owners were first seen
#[derive(Debug, Default)]
pub(crate) struct Collector {
    index: HashMap<String, usize>,
    sets: Vec<RecordSet>,
}

impl Collector {
    pub fn add(&mut self, name: String, kind: &str, ttl: u32, value: String) {
        let position = match self.index.get(&name) {
            Some(&position) => position,
            None => {
                self.index.insert(name.clone(), self.sets.len());
                self.sets.push(RecordSet::new(name));
                self.sets.len() - 1
            }
        };

        self.sets[position].push(kind, ttl, value);
    }

    pub fn finish(self) -> Vec<RecordSet> {
        self.sets
    }
}

/// Convert an absolute owner name into one relative to the origin
///
/// Names outside of the origin are returned as-is with the trailing dot removed.
pub(crate) fn relative_name(name: &str, origin: &str) -> String {
    let name = name.trim_end_matches('.');
    let origin = origin.trim_end_matches('.');

    if name.eq_ignore_ascii_case(origin) {
        return APEX.to_owned();
    }

    let suffix_start = name.len().checked_sub(origin.len() + 1);
    match suffix_start {
        Some(start)
            if name.as_bytes()[start] == b'.'
                && name[start + 1..].eq_ignore_ascii_case(origin) =>
        {
            name[..start].to_owned()
        }
        _ => name.to_owned(),
    }
}
