use crate::{
    error::LinkError,
    event::LinkEvent,
    gateway::LinkGateway,
    model::{Link, LinkSnapshot, UpdateBatch},
    reconcile::ReconcilePlan,
};

///
/// UnitOfWork
/// Scoped transactional boundary over one gateway.
///
/// Opens the cross-connection transaction on construction; commits only on
/// an explicit [`commit`](Self::commit). Dropping an unfinished unit of
/// work rolls both connections back, so an early `?` or a panic between
/// batches never leaves a transaction open.
///
/// Events recorded during the scope are buffered and handed back by
/// `commit`; a rolled-back unit of work publishes nothing.
///

pub struct UnitOfWork<'a, G: LinkGateway> {
    gateway: &'a mut G,
    events: Vec<LinkEvent>,
    finished: bool,
}

impl<'a, G: LinkGateway> UnitOfWork<'a, G> {
    pub fn begin(gateway: &'a mut G) -> Result<Self, LinkError> {
        gateway.begin()?;
        Ok(Self {
            gateway,
            events: Vec::new(),
            finished: false,
        })
    }

    pub fn snapshot(&self) -> Result<LinkSnapshot, LinkError> {
        self.gateway.snapshot()
    }

    /// Snapshot and project in one step.
    pub fn link(&self) -> Result<Link, LinkError> {
        Link::from_snapshot(&self.snapshot()?)
    }

    pub fn apply(&mut self, batch: &UpdateBatch) -> Result<(), LinkError> {
        self.gateway.apply(batch)
    }

    pub fn reconcile(&mut self, plan: &ReconcilePlan) -> Result<(), LinkError> {
        self.gateway.reconcile(plan)
    }

    /// Buffer an event for delivery after commit.
    pub fn record(&mut self, event: LinkEvent) {
        self.events.push(event);
    }

    /// Commit both connections and hand back the buffered events.
    pub fn commit(mut self) -> Result<Vec<LinkEvent>, LinkError> {
        self.finished = true;
        self.gateway.commit()?;
        Ok(std::mem::take(&mut self.events))
    }

    /// Discard pending writes and buffered events.
    pub fn rollback(mut self) -> Result<(), LinkError> {
        self.finished = true;
        self.events.clear();
        self.gateway.rollback()
    }
}

impl<G: LinkGateway> Drop for UnitOfWork<'_, G> {
    fn drop(&mut self) {
        if !self.finished {
            // Unwinding or early return: discard, never panic.
            let _ = self.gateway.rollback();
        }
    }
}
