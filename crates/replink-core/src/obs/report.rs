use crate::model::{ActiveProcess, Component, Link, State};
use serde::{Deserialize, Serialize};

///
/// LinkReport
/// Point-in-time breakdown of one projected link.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LinkReport {
    pub total: u64,
    pub states: StateCounts,
    pub components: ComponentCounts,
    pub flagged: u64,
    pub pulling: u64,
    pub deleting: u64,
}

///
/// StateCounts
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StateCounts {
    pub idle: u64,
    pub activated: u64,
    pub received: u64,
    pub pulled: u64,
    pub tainted: u64,
    pub deprecated: u64,
}

///
/// ComponentCounts
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ComponentCounts {
    pub source: u64,
    pub outbound: u64,
    pub local: u64,
}

/// Build a report over every entity in the link.
#[must_use]
pub fn link_report(link: &Link) -> LinkReport {
    let mut report = LinkReport::default();
    for entity in link {
        report.total += 1;
        match entity.state() {
            State::Idle => report.states.idle += 1,
            State::Activated => report.states.activated += 1,
            State::Received => report.states.received += 1,
            State::Pulled => report.states.pulled += 1,
            State::Tainted => report.states.tainted += 1,
            State::Deprecated => report.states.deprecated += 1,
        }
        if entity.is_tainted() {
            report.flagged += 1;
        }
        match entity.active_process() {
            Some(ActiveProcess::Pull) => report.pulling += 1,
            Some(ActiveProcess::Delete) => report.deleting += 1,
            None => {}
        }
    }
    for component in Component::ALL {
        let count = link.in_component(component).count() as u64;
        match component {
            Component::Source => report.components.source = count,
            Component::Outbound => report.components.outbound = count,
            Component::Local => report.components.local = count,
        }
    }
    report
}
