use crate::{
    event::{EventSink, LinkEvent},
    model::{ActiveProcess, Assignments, Component, LinkSnapshot},
    test_support::memory::MemoryLinkGateway,
    types::Identifier,
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

/// Build one identifier from its canonical text.
#[must_use]
pub fn identifier(text: &str) -> Identifier {
    Identifier::new(text)
}

/// Build an identifier set from canonical texts.
#[must_use]
pub fn identifiers<I>(texts: I) -> BTreeSet<Identifier>
where
    I: IntoIterator,
    I::Item: Into<Identifier>,
{
    texts.into_iter().map(Into::into).collect()
}

/// Start a snapshot builder.
#[must_use]
pub fn snapshot() -> SnapshotBuilder {
    SnapshotBuilder::default()
}

///
/// SnapshotBuilder
/// Fluent construction of persisted link configurations.
///
/// The local inbound mirror and local flag set default to what the state
/// machine would have written (inbound mirrors local, local flags mirror
/// the taint set where local); override them to express drift.
///

#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    source: BTreeSet<Identifier>,
    outbound: BTreeSet<Identifier>,
    local: BTreeSet<Identifier>,
    flagged: BTreeSet<Identifier>,
    pull: BTreeSet<Identifier>,
    delete: BTreeSet<Identifier>,
    local_inbound: Option<BTreeSet<Identifier>>,
    local_flagged: Option<BTreeSet<Identifier>>,
}

impl SnapshotBuilder {
    #[must_use]
    pub fn source<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.source = identifiers(ids);
        self
    }

    #[must_use]
    pub fn outbound<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.outbound = identifiers(ids);
        self
    }

    #[must_use]
    pub fn local<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.local = identifiers(ids);
        self
    }

    /// Operator taint flags in the outbound ledger.
    #[must_use]
    pub fn flagged<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.flagged = identifiers(ids);
        self
    }

    #[must_use]
    pub fn processing_pull<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.pull = identifiers(ids);
        self
    }

    #[must_use]
    pub fn processing_delete<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.delete = identifiers(ids);
        self
    }

    /// Override the local inbound mirror (drift).
    #[must_use]
    pub fn local_inbound<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.local_inbound = Some(identifiers(ids));
        self
    }

    /// Override the local flag set (drift).
    #[must_use]
    pub fn local_flagged<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        self.local_flagged = Some(identifiers(ids));
        self
    }

    #[must_use]
    pub fn build(self) -> LinkSnapshot {
        let mut assignments = Assignments::new();
        for id in &self.source {
            assignments.assign(Component::Source, id.clone());
        }
        for id in &self.outbound {
            assignments.assign(Component::Outbound, id.clone());
        }
        for id in &self.local {
            assignments.assign(Component::Local, id.clone());
        }

        let local_inbound = self.local_inbound.unwrap_or_else(|| self.local.clone());
        let local_flagged = self.local_flagged.unwrap_or_else(|| {
            self.flagged.intersection(&self.local).cloned().collect()
        });

        let mut active_processes = BTreeMap::new();
        for id in self.pull {
            active_processes.insert(id, ActiveProcess::Pull);
        }
        for id in self.delete {
            active_processes.insert(id, ActiveProcess::Delete);
        }

        LinkSnapshot::new(
            assignments,
            self.flagged,
            local_inbound,
            local_flagged,
            active_processes,
        )
    }

    /// Build and load into a fresh in-memory gateway.
    #[must_use]
    pub fn gateway(self) -> MemoryLinkGateway {
        MemoryLinkGateway::from_snapshot(&self.build())
    }
}

///
/// RecordedEvents
/// Clone-able output port that accumulates published events.
///

#[derive(Clone, Debug, Default)]
pub struct RecordedEvents(Rc<RefCell<Vec<LinkEvent>>>);

impl RecordedEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn take(&self) -> Vec<LinkEvent> {
        self.0.borrow_mut().drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl EventSink for RecordedEvents {
    fn publish(&self, event: &LinkEvent) {
        self.0.borrow_mut().push(event.clone());
    }
}
