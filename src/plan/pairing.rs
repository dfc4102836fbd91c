// src/plan/pairing.rs
use std::collections::BTreeMap;

use super::{ChangeGrouper, PairedChange};
use crate::error::UpdateResult;
use crate::extract::{AttributeBindingExtractor, EmptySide, ExtractionResult};
use crate::model::{BindingMap, Node, Triple};

/// Triples sharing a subject and predicate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PairKey {
    pub subject: Node,
    pub predicate: Node,
}

impl PairKey {
    fn of(triple: &Triple) -> Self {
        Self {
            subject: triple.subject.clone(),
            predicate: triple.predicate.clone(),
        }
    }
}

/// The deleted and added triples of one [`PairKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePair {
    pub key: PairKey,
    pub deleted: Vec<Triple>,
    pub added: Vec<Triple>,
}

/// A request split into unpaired deletes, unpaired adds and pairs.
///
/// Order within each list follows the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub deletes: Vec<Triple>,
    pub adds: Vec<Triple>,
    pub pairs: Vec<TriplePair>,
}

impl Partition {
    pub fn of(added: &[Triple], deleted: &[Triple]) -> Self {
        let deleted_keys: BTreeMap<PairKey, Vec<&Triple>> =
            deleted.iter().fold(BTreeMap::new(), |mut acc, t| {
                acc.entry(PairKey::of(t)).or_insert_with(Vec::new).push(t);
                acc
            });

        let mut partition = Partition::default();
        let mut pair_slots: BTreeMap<PairKey, usize> = BTreeMap::new();
        for triple in added {
            let key = PairKey::of(triple);
            let Some(removed) = deleted_keys.get(&key) else {
                partition.adds.push(triple.clone());
                continue;
            };
            match pair_slots.get(&key) {
                Some(&i) => partition.pairs[i].added.push(triple.clone()),
                None => {
                    pair_slots.insert(key.clone(), partition.pairs.len());
                    partition.pairs.push(TriplePair {
                        key,
                        deleted: removed.iter().map(|t| (*t).clone()).collect(),
                        added: vec![triple.clone()],
                    });
                }
            }
        }

        partition.deletes = deleted
            .iter()
            .filter(|t| !pair_slots.contains_key(&PairKey::of(t)))
            .cloned()
            .collect();
        partition
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.adds.is_empty() && self.pairs.is_empty()
    }
}

/// Turns a [`TriplePair`] into in-place row replacements.
///
/// Both sides are extracted and split without borrowing empty sides, then
/// grouped by row. Every row the added side writes becomes one
/// [`PairedChange`] whose `old` values come from the deleted side's
/// bindings for the same row, if any.
pub struct PairingReconciler<'a, 'm> {
    extractor: &'a AttributeBindingExtractor<'m>,
    grouper: &'a ChangeGrouper<'a>,
}

impl<'a, 'm> PairingReconciler<'a, 'm> {
    pub fn new(extractor: &'a AttributeBindingExtractor<'m>, grouper: &'a ChangeGrouper<'a>) -> Self {
        Self { extractor, grouper }
    }

    pub fn reconcile(&self, pair: &TriplePair) -> UpdateResult<Vec<PairedChange>> {
        let old_rows = self.grouper.group(self.split(&pair.deleted)?)?;
        let new_rows = self.grouper.group(self.split(&pair.added)?)?;

        Ok(new_rows
            .into_iter()
            .map(|row| {
                let old: BindingMap = old_rows
                    .iter()
                    .filter(|o| o.table == row.table && o.subject == row.subject)
                    .flat_map(|o| o.merged_values())
                    .collect();
                PairedChange {
                    new: row.merged_values(),
                    database: row.database,
                    table: row.table,
                    subject: row.subject,
                    old,
                }
            })
            .collect())
    }

    fn split(&self, triples: &[Triple]) -> UpdateResult<Vec<ExtractionResult>> {
        Ok(self
            .extractor
            .extract_all(triples)?
            .into_iter()
            .flat_map(|r| r.split(EmptySide::Drop))
            .collect())
    }
}
