use crate::error::LinkError;

///
/// TransactionHandle
/// One connection's transaction surface.
///

pub trait TransactionHandle {
    fn begin(&mut self) -> Result<(), LinkError>;
    fn commit(&mut self) -> Result<(), LinkError>;
    fn rollback(&mut self) -> Result<(), LinkError>;
}

///
/// DualTransaction
/// Two-connection coordinator for gateway implementations.
///
/// Begins both sides together and commits local first: the local host
/// holds the user-visible artefact, so a failure there can still roll the
/// source side back. A source-side commit failure after the local commit
/// is reported as the partial-commit error class; the next reconciliation
/// pass restores the persisted invariants.
///

#[derive(Debug)]
pub struct DualTransaction<L, S> {
    local: L,
    source: S,
}

impl<L, S> DualTransaction<L, S>
where
    L: TransactionHandle,
    S: TransactionHandle,
{
    pub const fn new(local: L, source: S) -> Self {
        Self { local, source }
    }

    pub fn begin(&mut self) -> Result<(), LinkError> {
        self.local.begin()?;
        if let Err(err) = self.source.begin() {
            // Best-effort: the local side opened but nothing was written.
            let _ = self.local.rollback();
            return Err(err);
        }
        Ok(())
    }

    pub fn commit(&mut self) -> Result<(), LinkError> {
        if let Err(err) = self.local.commit() {
            let _ = self.source.rollback();
            return Err(err);
        }
        self.source.commit().map_err(|err| {
            LinkError::partial_commit(format!(
                "source-side commit failed after local commit: {}",
                err.message
            ))
        })
    }

    pub fn rollback(&mut self) -> Result<(), LinkError> {
        let local = self.local.rollback();
        let source = self.source.rollback();
        local.and(source)
    }

    #[must_use]
    pub const fn local(&self) -> &L {
        &self.local
    }

    pub const fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
