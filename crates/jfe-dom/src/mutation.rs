//! Mutation observation.
//!
//! Records are matched against registrations when the mutation happens and
//! queued per observer, so delivery is batched: whoever drives the event loop
//! collects a batch with `Document::take_records` whenever it wants to.

use crate::NodeId;

/// Handle returned by `Document::observe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

/// What an observer wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveOptions {
    pub attributes: bool,
    pub child_list: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    pub fn attributes() -> Self {
        Self {
            attributes: true,
            ..Self::default()
        }
    }

    pub fn child_list() -> Self {
        Self {
            child_list: true,
            ..Self::default()
        }
    }

    pub fn with_subtree(mut self) -> Self {
        self.subtree = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    Attributes { name: String },
    ChildList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

impl MutationRecord {
    pub(crate) fn attribute(target: NodeId, name: &str) -> Self {
        Self {
            target,
            kind: MutationKind::Attributes {
                name: name.to_ascii_lowercase(),
            },
        }
    }

    pub(crate) fn child_list(target: NodeId) -> Self {
        Self {
            target,
            kind: MutationKind::ChildList,
        }
    }
}

#[derive(Debug, Clone)]
struct Registration {
    target: NodeId,
    options: ObserveOptions,
    connected: bool,
    pending: Vec<MutationRecord>,
}

impl Registration {
    fn wants(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::Attributes { .. } => self.options.attributes,
            MutationKind::ChildList => self.options.child_list,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ObserverRegistry {
    registrations: Vec<Registration>,
}

impl ObserverRegistry {
    pub(crate) fn register(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        let id = ObserverId(self.registrations.len());
        self.registrations.push(Registration {
            target,
            options,
            connected: true,
            pending: Vec::new(),
        });
        id
    }

    pub(crate) fn disconnect(&mut self, observer: ObserverId) {
        if let Some(registration) = self.registrations.get_mut(observer.0) {
            registration.connected = false;
            registration.pending.clear();
        }
    }

    /// Indexes of registrations that should receive `record`.
    ///
    /// `is_descendant(node, observed)` answers whether `node` sits strictly
    /// inside `observed`; only consulted for subtree registrations.
    pub(crate) fn interested(
        &self,
        record: &MutationRecord,
        is_descendant: impl Fn(NodeId, NodeId) -> bool,
    ) -> Vec<usize> {
        self.registrations
            .iter()
            .enumerate()
            .filter(|(_, registration)| registration.connected && registration.wants(&record.kind))
            .filter(|(_, registration)| {
                registration.target == record.target
                    || (registration.options.subtree
                        && is_descendant(record.target, registration.target))
            })
            .map(|(index, _)| index)
            .collect()
    }

    pub(crate) fn enqueue(&mut self, indexes: &[usize], record: MutationRecord) {
        for index in indexes {
            if let Some(registration) = self.registrations.get_mut(*index) {
                registration.pending.push(record.clone());
            }
        }
    }

    pub(crate) fn take(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.registrations
            .get_mut(observer.0)
            .map(|registration| std::mem::take(&mut registration.pending))
            .unwrap_or_default()
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.registrations
            .iter()
            .any(|registration| !registration.pending.is_empty())
    }
}
