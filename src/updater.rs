// src/updater.rs
use std::collections::BTreeSet;

use tracing::{debug, info, info_span, warn};

use crate::config::Settings;
use crate::error::{UpdateError, UpdateResult};
use crate::exec::{
    DependencyGraphBuilder, ExecutedStatement, ExecutionScheduler, MutationKind, MutationStatement,
};
use crate::extract::{AttributeBindingExtractor, EmptySide, ExtractionResult};
use crate::mapping::Mapping;
use crate::model::{Attribute, Triple};
use crate::plan::{ChangeGrouper, PairingReconciler, Partition, RowMutationPlanner};
use crate::store::{AutocommitGuard, Connection, SchemaCache, SqliteStore, Store};

/// What one update request executed, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub statements: Vec<ExecutedStatement>,
}

impl UpdateSummary {
    pub fn count(&self, kind: MutationKind) -> usize {
        self.statements.iter().filter(|s| s.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|s| s.sql.as_str()).collect()
    }
}

/// Applies triple additions and removals to a relational store.
///
/// # Example
///
/// ```rust,ignore
/// let store = SqliteStore::open_in_memory("crm")?;
/// let updater = Updater::new(mapping, store);
/// let summary = updater.execute(&added, &deleted)?;
/// println!("{} INSERTs", summary.count(MutationKind::Insert));
/// ```
#[derive(Debug)]
pub struct Updater<S: Store> {
    mapping: Mapping,
    mapped: BTreeSet<Attribute>,
    store: S,
    settings: Settings,
}

impl<S: Store> Updater<S> {
    pub fn new(mapping: Mapping, store: S) -> Self {
        Self {
            mapped: mapping.mapped_attributes(),
            mapping,
            store,
            settings: Settings::default(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn add(&self, triples: &[Triple]) -> UpdateResult<UpdateSummary> {
        self.execute(triples, &[])
    }

    pub fn delete(&self, triples: &[Triple]) -> UpdateResult<UpdateSummary> {
        self.execute(&[], triples)
    }

    /// Start accumulating a combined delete/insert request.
    pub fn begin_delete_insert(&self) -> DeleteInsert<'_, S> {
        DeleteInsert {
            updater: self,
            added: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Apply one request.
    ///
    /// Runs unpaired deletes, then unpaired adds, then paired replacements,
    /// each phase planned against the state the previous phase left. When
    /// the connection supports transactions, the whole request is one
    /// transaction and any failure rolls every phase back.
    pub fn execute(&self, added: &[Triple], deleted: &[Triple]) -> UpdateResult<UpdateSummary> {
        let span = info_span!("update_request", added = added.len(), deleted = deleted.len());
        let _enter = span.enter();

        let partition = Partition::of(added, deleted);
        if partition.is_empty() {
            return Ok(UpdateSummary::default());
        }

        let conn = self.store.as_connection();
        let batch = self.use_batch(conn);
        let guard = if conn.supports_transactions() {
            Some(AutocommitGuard::begin(conn)?)
        } else {
            warn!("connection cannot roll back, statements apply as they execute");
            None
        };

        let cache = SchemaCache::new(self.store.as_inspector());
        let request = Request {
            mapping: &self.mapping,
            mapped: &self.mapped,
            settings: &self.settings,
            conn,
            cache: &cache,
            batch,
        };

        let mut summary = UpdateSummary::default();
        summary.statements.extend(request.delete_phase(&partition.deletes)?);
        summary.statements.extend(request.add_phase(&partition.adds)?);
        summary.statements.extend(request.paired_phase(&partition)?);

        if let Some(guard) = guard {
            guard.commit()?;
        }
        info!(
            inserts = summary.count(MutationKind::Insert),
            updates = summary.count(MutationKind::UpdateNonNull),
            cleared = summary.count(MutationKind::UpdateToNull),
            deletes = summary.count(MutationKind::Delete),
            "update applied"
        );
        Ok(summary)
    }

    fn use_batch(&self, conn: &dyn Connection) -> bool {
        let supported = conn.supports_batch_updates();
        let mode = self.settings.execution.batch;
        if mode == crate::config::BatchMode::Always && !supported {
            warn!("connection does not support batch updates, executing sequentially");
        }
        mode.use_batch(supported)
    }
}

impl Updater<SqliteStore> {
    /// Open the SQLite database named in `settings.database` and apply
    /// requests to it under `settings.execution`.
    pub fn open(mapping: Mapping, settings: Settings) -> UpdateResult<Self> {
        let store = SqliteStore::open(&settings.database)?;
        info!(database = %store.database(), "store opened");
        Ok(Self::new(mapping, store).with_settings(settings))
    }
}

/// Everything one request's phases share.
struct Request<'r> {
    mapping: &'r Mapping,
    mapped: &'r BTreeSet<Attribute>,
    settings: &'r Settings,
    conn: &'r dyn Connection,
    cache: &'r SchemaCache<'r>,
    batch: bool,
}

impl Request<'_> {
    fn extractor(&self) -> AttributeBindingExtractor<'_> {
        AttributeBindingExtractor::new(self.mapping)
    }

    fn planner(&self) -> RowMutationPlanner<'_> {
        RowMutationPlanner::new(self.cache, self.conn, self.mapped)
    }

    fn extract(&self, triples: &[Triple], empty_side: EmptySide) -> UpdateResult<Vec<ExtractionResult>> {
        let results: Vec<ExtractionResult> = self
            .extractor()
            .extract_all(triples)?
            .into_iter()
            .flat_map(|r| r.split(empty_side))
            .collect();
        for result in &results {
            self.check_database(result)?;
        }
        Ok(results)
    }

    fn check_database(&self, result: &ExtractionResult) -> UpdateResult<()> {
        match result.database() {
            Some(db) if db != self.conn.database() => Err(UpdateError::DatabaseMismatch {
                expected: self.conn.database().to_string(),
                found: db.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn delete_phase(&self, triples: &[Triple]) -> UpdateResult<Vec<ExecutedStatement>> {
        if triples.is_empty() {
            return Ok(Vec::new());
        }
        let changes = ChangeGrouper::new(self.cache).group(self.extract(triples, EmptySide::Drop)?)?;
        let planner = self.planner();
        let mut statements = Vec::new();
        for change in &changes {
            statements.extend(planner.plan_delete(change)?);
        }
        self.run("delete", statements)
    }

    fn add_phase(&self, triples: &[Triple]) -> UpdateResult<Vec<ExecutedStatement>> {
        if triples.is_empty() {
            return Ok(Vec::new());
        }
        let changes = ChangeGrouper::new(self.cache).group(self.extract(triples, EmptySide::Borrow)?)?;
        let planner = self.planner();
        let mut statements = Vec::new();
        for change in &changes {
            statements.extend(planner.plan_add(change)?);
        }
        self.run("add", statements)
    }

    fn paired_phase(&self, partition: &Partition) -> UpdateResult<Vec<ExecutedStatement>> {
        if partition.pairs.is_empty() {
            return Ok(Vec::new());
        }
        let extractor = self.extractor();
        let grouper = ChangeGrouper::new(self.cache);
        let reconciler = PairingReconciler::new(&extractor, &grouper);
        let planner = self.planner();

        let mut statements = Vec::new();
        for pair in &partition.pairs {
            for change in reconciler.reconcile(pair)? {
                if change.database != *self.conn.database() {
                    return Err(UpdateError::DatabaseMismatch {
                        expected: self.conn.database().to_string(),
                        found: change.database.to_string(),
                    });
                }
                statements.extend(planner.plan_paired(&change)?);
            }
        }
        self.run("paired", statements)
    }

    fn run(&self, phase: &str, statements: Vec<MutationStatement>) -> UpdateResult<Vec<ExecutedStatement>> {
        if statements.is_empty() {
            debug!(phase, "nothing to execute");
            return Ok(Vec::new());
        }
        let graph = DependencyGraphBuilder::new(self.cache, self.conn).build(&statements)?;
        let scheduler = ExecutionScheduler::new(self.conn, &self.settings.execution);
        let ordered = scheduler.order(&graph, statements)?;
        debug!(phase, count = ordered.len(), "phase scheduled");
        scheduler.execute(&ordered, self.batch)
    }
}

/// A delete/insert request assembled in steps and applied by
/// [`commit`](DeleteInsert::commit).
pub struct DeleteInsert<'u, S: Store> {
    updater: &'u Updater<S>,
    added: Vec<Triple>,
    deleted: Vec<Triple>,
}

impl<S: Store> DeleteInsert<'_, S> {
    pub fn delete(mut self, triples: impl IntoIterator<Item = Triple>) -> Self {
        self.deleted.extend(triples);
        self
    }

    pub fn insert(mut self, triples: impl IntoIterator<Item = Triple>) -> Self {
        self.added.extend(triples);
        self
    }

    pub fn commit(self) -> UpdateResult<UpdateSummary> {
        self.updater.execute(&self.added, &self.deleted)
    }
}
