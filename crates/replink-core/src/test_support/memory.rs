use crate::{
    error::{ErrorClass, ErrorOrigin, LinkError},
    gateway::{DualTransaction, LinkGateway, TransactionHandle},
    model::{ActiveProcess, Assignments, Command, Component, LinkSnapshot, UpdateBatch},
    reconcile::ReconcilePlan,
    types::Identifier,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// LocalTables
/// The local host's persisted sets: rows, inbound mirror, flag mirror.
///

#[derive(Clone, Debug, Default)]
pub struct LocalTables {
    pub rows: BTreeSet<Identifier>,
    pub inbound: BTreeSet<Identifier>,
    pub flagged: BTreeSet<Identifier>,
}

///
/// SourceTables
/// The source host's persisted sets: rows, outbound ledger, taint flags,
/// and the per-entity process column.
///

#[derive(Clone, Debug, Default)]
pub struct SourceTables {
    pub rows: BTreeSet<Identifier>,
    pub outbound: BTreeSet<Identifier>,
    pub outbound_flagged: BTreeSet<Identifier>,
    pub processes: BTreeMap<Identifier, ActiveProcess>,
}

///
/// MemoryHost
/// One host's tables with snapshot-restore transaction semantics.
///

#[derive(Debug, Default)]
pub struct MemoryHost<T: Clone> {
    tables: T,
    undo: Option<T>,
    fail_next_commit: bool,
}

impl<T: Clone> MemoryHost<T> {
    pub const fn new(tables: T) -> Self {
        Self {
            tables,
            undo: None,
            fail_next_commit: false,
        }
    }

    #[must_use]
    pub const fn tables(&self) -> &T {
        &self.tables
    }

    pub const fn tables_mut(&mut self) -> &mut T {
        &mut self.tables
    }

    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.undo.is_some()
    }

    /// Make the next commit fail like a lost connection would.
    pub const fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }
}

impl<T: Clone> TransactionHandle for MemoryHost<T> {
    fn begin(&mut self) -> Result<(), LinkError> {
        if self.undo.is_some() {
            return Err(LinkError::new(
                ErrorClass::Conflict,
                ErrorOrigin::Transaction,
                "transaction already open",
            ));
        }
        self.undo = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), LinkError> {
        if self.fail_next_commit {
            self.fail_next_commit = false;
            if let Some(prev) = self.undo.take() {
                self.tables = prev;
            }
            return Err(LinkError::io(
                ErrorOrigin::Transaction,
                "injected commit failure",
            ));
        }
        self.undo = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), LinkError> {
        if let Some(prev) = self.undo.take() {
            self.tables = prev;
        }
        Ok(())
    }
}

///
/// MemoryLinkGateway
/// In-memory gateway over two hosts, faithful to the real command
/// semantics: flag rows reference their master rows, local writes go
/// through the local host, outbound writes through the source host, and
/// commit order is local first.
///

#[derive(Debug)]
pub struct MemoryLinkGateway {
    dual: DualTransaction<MemoryHost<LocalTables>, MemoryHost<SourceTables>>,
}

impl MemoryLinkGateway {
    #[must_use]
    pub fn from_snapshot(snapshot: &LinkSnapshot) -> Self {
        let assignments = snapshot.assignments();
        let local = LocalTables {
            rows: assignments.component(Component::Local).clone(),
            inbound: snapshot.local_inbound().clone(),
            flagged: snapshot.local_flagged().clone(),
        };
        let source = SourceTables {
            rows: assignments.component(Component::Source).clone(),
            outbound: assignments.component(Component::Outbound).clone(),
            outbound_flagged: snapshot.outbound_flagged().clone(),
            processes: snapshot.active_processes().clone(),
        };
        Self {
            dual: DualTransaction::new(MemoryHost::new(local), MemoryHost::new(source)),
        }
    }

    #[must_use]
    pub const fn local(&self) -> &MemoryHost<LocalTables> {
        self.dual.local()
    }

    pub const fn local_mut(&mut self) -> &mut MemoryHost<LocalTables> {
        self.dual.local_mut()
    }

    #[must_use]
    pub const fn source(&self) -> &MemoryHost<SourceTables> {
        self.dual.source()
    }

    pub const fn source_mut(&mut self) -> &mut MemoryHost<SourceTables> {
        self.dual.source_mut()
    }

    /// Operator action: flag a handed-out entity for removal.
    pub fn flag(&mut self, identifier: &Identifier) {
        let source = self.dual.source_mut().tables_mut();
        if source.outbound.contains(identifier) {
            source.outbound_flagged.insert(identifier.clone());
        }
    }

    /// External action: a new row appears at the source.
    pub fn insert_source_row(&mut self, identifier: Identifier) {
        self.dual.source_mut().tables_mut().rows.insert(identifier);
    }

    /// External action: a local row vanishes without the state machine.
    pub fn delete_local_row_out_of_band(&mut self, identifier: &Identifier) {
        self.dual.local_mut().tables_mut().rows.remove(identifier);
    }

    fn guard_open(&self, what: &str) -> Result<(), LinkError> {
        if self.dual.local().in_transaction() && self.dual.source().in_transaction() {
            Ok(())
        } else {
            Err(LinkError::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Transaction,
                format!("{what} outside an open transaction"),
            ))
        }
    }
}

impl LinkGateway for MemoryLinkGateway {
    fn snapshot(&self) -> Result<LinkSnapshot, LinkError> {
        let local = self.dual.local().tables();
        let source = self.dual.source().tables();
        let mut assignments = Assignments::new();
        for id in &source.rows {
            assignments.assign(Component::Source, id.clone());
        }
        for id in &source.outbound {
            assignments.assign(Component::Outbound, id.clone());
        }
        for id in &local.rows {
            assignments.assign(Component::Local, id.clone());
        }
        Ok(LinkSnapshot::new(
            assignments,
            source.outbound_flagged.clone(),
            local.inbound.clone(),
            local.flagged.clone(),
            source.processes.clone(),
        ))
    }

    fn apply(&mut self, batch: &UpdateBatch) -> Result<(), LinkError> {
        self.guard_open("apply")?;
        for (command, identifier) in batch.commands_in_apply_order() {
            let identifier = identifier.clone();
            match command {
                Command::StartPullProcess => {
                    let source = self.dual.source_mut().tables_mut();
                    source.outbound.insert(identifier.clone());
                    source.processes.insert(identifier, ActiveProcess::Pull);
                }
                Command::StartDeleteProcess => {
                    self.dual
                        .source_mut()
                        .tables_mut()
                        .processes
                        .insert(identifier, ActiveProcess::Delete);
                }
                Command::AddToLocal => {
                    let local = self.dual.local_mut().tables_mut();
                    local.inbound.insert(identifier.clone());
                    local.rows.insert(identifier);
                }
                Command::RemoveFromLocal => {
                    let local = self.dual.local_mut().tables_mut();
                    local.flagged.remove(&identifier);
                    local.rows.remove(&identifier);
                    local.inbound.remove(&identifier);
                }
                Command::FinishPullProcess => {
                    self.dual
                        .source_mut()
                        .tables_mut()
                        .processes
                        .remove(&identifier);
                }
                Command::FinishDeleteProcess => {
                    let source = self.dual.source_mut().tables_mut();
                    source.processes.remove(&identifier);
                    source.outbound_flagged.remove(&identifier);
                    source.outbound.remove(&identifier);
                }
                Command::Deprecate => {
                    self.dual
                        .source_mut()
                        .tables_mut()
                        .processes
                        .remove(&identifier);
                }
            }
        }
        Ok(())
    }

    fn reconcile(&mut self, plan: &ReconcilePlan) -> Result<(), LinkError> {
        self.guard_open("reconcile")?;
        {
            let local = self.dual.local_mut().tables_mut();
            for id in &plan.remove_local_flags {
                local.flagged.remove(id);
            }
            for id in &plan.remove_local_rows {
                local.rows.remove(id);
            }
            for id in &plan.remove_local_inbound {
                local.inbound.remove(id);
            }
            for id in &plan.add_local_flags {
                local.flagged.insert(id.clone());
            }
        }
        {
            let source = self.dual.source_mut().tables_mut();
            for id in &plan.remove_outbound_flags {
                source.outbound_flagged.remove(id);
            }
            for id in &plan.remove_outbound_rows {
                source.outbound.remove(id);
            }
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), LinkError> {
        self.dual.begin()
    }

    fn commit(&mut self) -> Result<(), LinkError> {
        self.dual.commit()
    }

    fn rollback(&mut self) -> Result<(), LinkError> {
        self.dual.rollback()
    }
}
