use crate::types::Identifier;
use std::{collections::BTreeSet, fmt};

///
/// Component
/// The three stores a linked entity can be assigned to.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Component {
    Source,
    Outbound,
    Local,
}

impl Component {
    pub const ALL: [Self; 3] = [Self::Source, Self::Outbound, Self::Local];
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Source => "source",
            Self::Outbound => "outbound",
            Self::Local => "local",
        };
        write!(f, "{label}")
    }
}

///
/// Assignments
/// Identifier sets per component.
///
/// `Local ⊆ Outbound ⊆ Source` is the persisted nesting rule; it is
/// checked when a snapshot is projected into a link, not here, so raw
/// drifted reads can still be represented and reconciled.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Assignments {
    source: BTreeSet<Identifier>,
    outbound: BTreeSet<Identifier>,
    local: BTreeSet<Identifier>,
}

impl Assignments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn component(&self, component: Component) -> &BTreeSet<Identifier> {
        match component {
            Component::Source => &self.source,
            Component::Outbound => &self.outbound,
            Component::Local => &self.local,
        }
    }

    pub fn assign(&mut self, component: Component, identifier: Identifier) {
        self.component_mut(component).insert(identifier);
    }

    pub fn unassign(&mut self, component: Component, identifier: &Identifier) -> bool {
        self.component_mut(component).remove(identifier)
    }

    #[must_use]
    pub fn contains(&self, component: Component, identifier: &Identifier) -> bool {
        self.component(component).contains(identifier)
    }

    /// Every identifier present in any component.
    #[must_use]
    pub fn union(&self) -> BTreeSet<Identifier> {
        let mut all = self.source.clone();
        all.extend(self.outbound.iter().cloned());
        all.extend(self.local.iter().cloned());
        all
    }

    /// True if `Local ⊆ Outbound ⊆ Source`.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.local.is_subset(&self.outbound) && self.outbound.is_subset(&self.source)
    }

    /// First identifier violating the nesting rule, if any.
    #[must_use]
    pub fn first_nesting_violation(&self) -> Option<&Identifier> {
        self.local
            .iter()
            .find(|identifier| !self.outbound.contains(*identifier))
            .or_else(|| {
                self.outbound
                    .iter()
                    .find(|identifier| !self.source.contains(*identifier))
            })
    }

    fn component_mut(&mut self, component: Component) -> &mut BTreeSet<Identifier> {
        match component {
            Component::Source => &mut self.source,
            Component::Outbound => &mut self.outbound,
            Component::Local => &mut self.local,
        }
    }
}
