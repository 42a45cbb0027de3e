//! Endpoint configuration: how a container attaches to a network.
//!
//! Endpoint data and filters are indexed by [`Attachment`] and are only
//! changed through explicit configuration calls, never while a tick runs.
//! Lookups during a tick read them by value.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::Attachment;
use crate::id::ResourceId;
use crate::routing::RoutingMode;

/// The role an attachment plays in its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EndpointKind {
    /// Pushes its contents into the network.
    Output,
    /// Only receives. Never initiates a transfer.
    #[default]
    Input,
    /// Pulls from any reachable source that is not itself a retriever.
    Retriever,
}

impl EndpointKind {
    /// Whether a service of this endpoint starts transfers on its own.
    pub fn initiates(self) -> bool {
        match self {
            EndpointKind::Output | EndpointKind::Retriever => true,
            EndpointKind::Input => false,
        }
    }
}

/// Configuration for one attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EndpointData {
    pub kind: EndpointKind,
    pub mode: RoutingMode,
    /// Used by [`RoutingMode::Priority`]: higher values are served first.
    #[serde(default)]
    pub priority: i32,
}

impl EndpointData {
    pub fn new(kind: EndpointKind, mode: RoutingMode) -> Self {
        Self {
            kind,
            mode,
            priority: 0,
        }
    }

    pub fn output(mode: RoutingMode) -> Self {
        Self::new(EndpointKind::Output, mode)
    }

    pub fn input() -> Self {
        Self::new(EndpointKind::Input, RoutingMode::default())
    }

    pub fn retriever(mode: RoutingMode) -> Self {
        Self::new(EndpointKind::Retriever, mode)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// How a filter's entry list is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Only listed resources pass.
    Allow,
    /// Everything except listed resources passes.
    #[default]
    Deny,
}

/// A resource predicate attached to an endpoint.
///
/// The default filter is an empty deny list, which accepts everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub mode: FilterMode,
    pub entries: BTreeSet<ResourceId>,
}

impl FilterData {
    pub fn allow(entries: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            mode: FilterMode::Allow,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn deny(entries: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            mode: FilterMode::Deny,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn matches(&self, resource: ResourceId) -> bool {
        let listed = self.entries.contains(&resource);
        match self.mode {
            FilterMode::Allow => listed,
            FilterMode::Deny => !listed,
        }
    }
}

/// Shared default returned for attachments without a configured filter.
static ACCEPT_ALL: FilterData = FilterData {
    mode: FilterMode::Deny,
    entries: BTreeSet::new(),
};

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Endpoint and filter configuration keyed by attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointIndex {
    endpoints: BTreeMap<Attachment, EndpointData>,
    filters: BTreeMap<Attachment, FilterData>,
}

impl EndpointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure an attachment. Returns the previous configuration.
    pub fn set_endpoint(&mut self, at: Attachment, data: EndpointData) -> Option<EndpointData> {
        self.endpoints.insert(at, data)
    }

    pub fn clear_endpoint(&mut self, at: Attachment) -> Option<EndpointData> {
        self.endpoints.remove(&at)
    }

    pub fn set_filter(&mut self, at: Attachment, filter: FilterData) -> Option<FilterData> {
        self.filters.insert(at, filter)
    }

    pub fn clear_filter(&mut self, at: Attachment) -> Option<FilterData> {
        self.filters.remove(&at)
    }

    /// Endpoint data for an attachment, if one was configured.
    pub fn endpoint(&self, at: Attachment) -> Option<EndpointData> {
        self.endpoints.get(&at).copied()
    }

    /// Filter for an attachment; unconfigured attachments accept everything.
    pub fn filter(&self, at: Attachment) -> &FilterData {
        self.filters.get(&at).unwrap_or(&ACCEPT_ALL)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn clear(&mut self) {
        self.endpoints.clear();
        self.filters.clear();
    }
}
