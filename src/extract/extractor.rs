// src/extract/extractor.rs
use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::ExtractionResult;
use crate::error::UpdateResult;
use crate::mapping::{Mapping, MappingRule, Position, Selection};
use crate::model::{BindingMap, Node, Triple};
use crate::sql::scan_equalities;
use crate::store::DatabaseHandle;

/// Bindings collected for one blank node across triples and rules.
#[derive(Debug, Default)]
struct BlankGroup {
    subject: BindingMap,
    object: BindingMap,
    /// Database and selection of the last rule that selected the blank
    /// node as a subject.
    anchor: Option<(DatabaseHandle, Selection)>,
}

/// Recovers attribute bindings for triples from the mapping's rules.
pub struct AttributeBindingExtractor<'m> {
    mapping: &'m Mapping,
}

impl<'m> AttributeBindingExtractor<'m> {
    pub fn new(mapping: &'m Mapping) -> Self {
        Self { mapping }
    }

    /// Extract `triple` against one rule.
    ///
    /// Returns a failed result when the rule cannot produce the triple, and
    /// an error when a selected condition cannot be read back.
    pub fn extract(&self, triple: &Triple, rule: &dyn MappingRule) -> UpdateResult<ExtractionResult> {
        if rule.select(Position::Predicate, &triple.predicate).is_none() {
            return Ok(ExtractionResult::failed());
        }
        let Some(subject) = rule.select(Position::Subject, &triple.subject) else {
            return Ok(ExtractionResult::failed());
        };
        let Some(object) = rule.select(Position::Object, &triple.object) else {
            return Ok(ExtractionResult::failed());
        };

        let dialect = rule.database().dialect;
        let subject_bindings = scan_selection(&subject, rule)?;
        let object_bindings = scan_selection(&object, rule)?;
        if subject_bindings.is_empty() && object_bindings.is_empty() {
            return Ok(ExtractionResult::failed());
        }
        debug!(
            triple = %triple,
            dialect = %dialect,
            subject = %crate::model::binding::format_bindings(&subject_bindings),
            object = %crate::model::binding::format_bindings(&object_bindings),
            "extracted bindings"
        );

        Ok(ExtractionResult::new(
            rule.database().clone(),
            subject_bindings,
            object_bindings,
            subject.joins,
            subject.projections,
            subject.aliases,
        ))
    }

    /// Extract every triple against every rule for its predicate.
    ///
    /// Triples with a blank subject or object are merged by blank-node
    /// identity and yield one result per blank node that some rule selects
    /// as a subject. Duplicate results collapse.
    pub fn extract_all(&self, triples: &[Triple]) -> UpdateResult<Vec<ExtractionResult>> {
        let mut results: Vec<ExtractionResult> = Vec::new();
        let mut blanks: BTreeMap<Node, BlankGroup> = BTreeMap::new();

        for triple in triples {
            match (triple.subject.is_blank(), triple.object.is_blank()) {
                (true, true) => {
                    warn!(triple = %triple, "triple with blank subject and object is not supported, skipped");
                    continue;
                }
                (true, false) | (false, true) => {
                    self.collect_blank(triple, &mut blanks)?;
                    continue;
                }
                (false, false) => {}
            }

            let mut matched = false;
            for rule in self.mapping.rules_for(&triple.predicate) {
                let result = self.extract(triple, rule.as_ref())?;
                if result.is_success() {
                    matched = true;
                    push_unique(&mut results, result);
                }
            }
            if !matched {
                debug!(triple = %triple, "no mapping rule matched");
            }
        }

        for (node, group) in blanks {
            let Some((database, selection)) = group.anchor else {
                debug!(node = %node, "blank node never selected as a subject");
                continue;
            };
            push_unique(
                &mut results,
                ExtractionResult::new(
                    database,
                    group.subject,
                    group.object,
                    selection.joins,
                    selection.projections,
                    selection.aliases,
                ),
            );
        }
        Ok(results)
    }

    fn collect_blank(&self, triple: &Triple, blanks: &mut BTreeMap<Node, BlankGroup>) -> UpdateResult<()> {
        let blank = if triple.subject.is_blank() {
            &triple.subject
        } else {
            &triple.object
        };

        for rule in self.mapping.rules_for(&triple.predicate) {
            if rule.select(Position::Predicate, &triple.predicate).is_none() {
                continue;
            }
            let group = blanks.entry(blank.clone()).or_default();
            if let Some(selection) = rule.select(Position::Subject, &triple.subject) {
                group.subject.extend(scan_selection(&selection, rule.as_ref())?);
                group.anchor = Some((rule.database().clone(), selection));
            }
            if let Some(selection) = rule.select(Position::Object, &triple.object) {
                group.object.extend(scan_selection(&selection, rule.as_ref())?);
            }
        }
        Ok(())
    }
}

fn scan_selection(selection: &Selection, rule: &dyn MappingRule) -> UpdateResult<BindingMap> {
    if !selection.has_condition() {
        return Ok(BindingMap::new());
    }
    Ok(scan_equalities(&selection.condition, rule.database().dialect)?)
}

fn push_unique(results: &mut Vec<ExtractionResult>, result: ExtractionResult) {
    if !results.contains(&result) {
        results.push(result);
    }
}
