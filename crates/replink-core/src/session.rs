use crate::{
    error::LinkError,
    event::{
        EntitiesDeleted, EntitiesProcessed, EntitiesPulled, EventSink, IdleEntitiesListed,
        LinkEvent,
    },
    gateway::{LinkGateway, UnitOfWork},
    obs::{
        LinkReport, link_report,
        sink::{MetricsSink, with_metrics_sink},
    },
    reconcile::ReconcilePlan,
    service::drive,
    types::Identifier,
};
use std::collections::BTreeSet;

///
/// LinkSession
///
/// Session-scoped handle over one gateway with policy (debug, metrics)
/// and event routing.
///
/// One session drives one link; invocations are serial. Events produced
/// by an invocation reach subscribers only after its commit, on the
/// calling thread.
///

pub struct LinkSession<G: LinkGateway> {
    gateway: G,
    debug: bool,
    metrics: Option<&'static dyn MetricsSink>,
    subscribers: Vec<Box<dyn EventSink>>,
}

impl<G: LinkGateway> LinkSession<G> {
    #[must_use]
    pub const fn new(gateway: G) -> Self {
        Self {
            gateway,
            debug: false,
            metrics: None,
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Register an output port; every future commit publishes to it.
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.subscribers.push(sink);
    }

    /// Pull the requested entities across the link.
    ///
    /// Runs a reconciliation pass, then drives the pull to quiescence.
    /// Refusals ride in the response; `Err` is reserved for gateway and
    /// transaction failures.
    pub fn pull(
        &mut self,
        requested: impl IntoIterator<Item = Identifier>,
    ) -> Result<EntitiesPulled, LinkError> {
        let requested: BTreeSet<Identifier> = requested.into_iter().collect();
        if self.debug {
            tracing::debug!(requested = requested.len(), "pull requested");
        }
        let outcome = match self.metrics {
            Some(sink) => with_metrics_sink(sink, || drive::pull(&mut self.gateway, requested)),
            None => drive::pull(&mut self.gateway, requested),
        };
        self.publish(outcome)
    }

    /// Delete the requested entities locally; symmetric to [`pull`](Self::pull).
    pub fn delete(
        &mut self,
        requested: impl IntoIterator<Item = Identifier>,
    ) -> Result<EntitiesDeleted, LinkError> {
        let requested: BTreeSet<Identifier> = requested.into_iter().collect();
        if self.debug {
            tracing::debug!(requested = requested.len(), "delete requested");
        }
        let outcome = match self.metrics {
            Some(sink) => with_metrics_sink(sink, || drive::delete(&mut self.gateway, requested)),
            None => drive::delete(&mut self.gateway, requested),
        };
        self.publish(outcome)
    }

    /// Advance in-flight processes without originating new ones.
    ///
    /// An empty request set drains everything currently in flight, which
    /// is how an interrupted invocation's work gets resumed.
    pub fn process(
        &mut self,
        requested: impl IntoIterator<Item = Identifier>,
    ) -> Result<EntitiesProcessed, LinkError> {
        let requested: BTreeSet<Identifier> = requested.into_iter().collect();
        let outcome = match self.metrics {
            Some(sink) => with_metrics_sink(sink, || drive::process(&mut self.gateway, requested)),
            None => drive::process(&mut self.gateway, requested),
        };
        self.publish(outcome)
    }

    /// List the identifiers currently idle at the source.
    pub fn list_idle(&mut self) -> Result<IdleEntitiesListed, LinkError> {
        let outcome = match self.metrics {
            Some(sink) => with_metrics_sink(sink, || drive::list_idle(&mut self.gateway)),
            None => drive::list_idle(&mut self.gateway),
        };
        self.publish(outcome)
    }

    /// Run a reconciliation pass on demand.
    pub fn reconcile(&mut self) -> Result<ReconcilePlan, LinkError> {
        match self.metrics {
            Some(sink) => with_metrics_sink(sink, || drive::reconcile_now(&mut self.gateway)),
            None => drive::reconcile_now(&mut self.gateway),
        }
    }

    /// Snapshot the link and summarise it.
    pub fn report(&mut self) -> Result<LinkReport, LinkError> {
        let uow = UnitOfWork::begin(&mut self.gateway)?;
        let link = uow.link()?;
        let report = link_report(&link);
        uow.commit()?;
        Ok(report)
    }

    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    pub const fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    #[must_use]
    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Deliver buffered events to subscribers and unwrap the response.
    fn publish<T>(
        &self,
        outcome: Result<(T, Vec<LinkEvent>), LinkError>,
    ) -> Result<T, LinkError> {
        let (response, events) = outcome?;
        for event in &events {
            if self.debug {
                tracing::debug!(kind = event.kind(), "publishing link event");
            }
            for subscriber in &self.subscribers {
                subscriber.publish(event);
            }
        }
        Ok(response)
    }
}
