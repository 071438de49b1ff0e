use crate::zone::RecordSet;
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

/// How records are selected as suspects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Owners with exactly an A and a TXT record, as left by dynamic DNS
    Ddns,
    /// Any owner with at least one A record
    Plain,
    /// Owners whose first A record shares its address with another owner
    Duplicate,
}

/// Why a record set was flagged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    PairedAddressText,
    Address,
    DuplicateAddress,
}

/// A record set flagged as a candidate for removal
#[derive(Clone, Debug)]
pub struct Suspect {
    pub records: Arc<RecordSet>,
    pub reason: Reason,
}

impl Suspect {
    pub fn name(&self) -> &str {
        self.records.name()
    }
}

/// An address that is claimed by more than one owner
#[derive(Debug)]
pub struct Duplicate {
    pub address: String,
    pub owners: Vec<Arc<RecordSet>>,
}

/// Select the suspect record sets for the mode
///
/// The input is left untouched and the output keeps the zone order.
pub fn classify(records: &[Arc<RecordSet>], mode: Mode) -> Vec<Suspect> {
    match mode {
        Mode::Ddns => select(records, is_paired, Reason::PairedAddressText),
        Mode::Plain => select(records, has_address, Reason::Address),
        Mode::Duplicate => {
            let candidates = select(records, has_address, Reason::DuplicateAddress);
            let shared = duplicates(&candidates)
                .into_iter()
                .flat_map(|d| d.owners)
                .map(|owner| owner.name().to_owned())
                .collect::<HashSet<_>>();

            candidates
                .into_iter()
                .filter(|s| shared.contains(s.name()))
                .collect()
        }
    }
}

/// Group the suspects by their first A record, keeping only shared addresses
///
/// Only the first A record of each owner is considered.
pub fn duplicates(suspects: &[Suspect]) -> Vec<Duplicate> {
    group_by_address(suspects)
        .into_iter()
        .filter(|(_, owners)| owners.len() > 1)
        .map(|(address, owners)| Duplicate {
            address: address.to_owned(),
            owners: owners
                .into_iter()
                .map(|suspect| Arc::clone(&suspect.records))
                .collect(),
        })
        .collect()
}

fn select(
    records: &[Arc<RecordSet>],
    qualifies: fn(&RecordSet) -> bool,
    reason: Reason,
) -> Vec<Suspect> {
    records
        .iter()
        .filter(|set| qualifies(set))
        .map(|set| Suspect {
            records: Arc::clone(set),
            reason,
        })
        .collect()
}

fn group_by_address(suspects: &[Suspect]) -> BTreeMap<&str, Vec<&Suspect>> {
    let mut groups: BTreeMap<&str, Vec<&Suspect>> = BTreeMap::new();
    for suspect in suspects {
        if let Some(address) = suspect.records.first_address() {
            groups.entry(address).or_default().push(suspect);
        }
    }

    groups
}

fn is_paired(set: &RecordSet) -> bool {
    set.groups().len() == 2 && set.group("A").is_some() && set.group("TXT").is_some()
}

fn has_address(set: &RecordSet) -> bool {
    set.group("A").is_some()
}
