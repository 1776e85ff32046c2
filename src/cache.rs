use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::{any::TypeInfo, container_service::ContainerService};

static NEXT_SLOT_ID: AtomicUsize = AtomicUsize::new(0);

/// Identifier of one top-level resolution request
pub(crate) type RequestId = usize;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CacheKey {
    type_info: TypeInfo,
    contracts: Vec<String>,
    name: Option<String>,
}

impl CacheKey {
    #[inline]
    #[must_use]
    pub(crate) fn new(type_info: TypeInfo, contracts: Vec<String>, name: Option<&str>) -> Self {
        Self {
            type_info,
            contracts,
            name: name.map(String::from),
        }
    }
}

#[derive(Debug)]
enum SlotState {
    Empty,
    Constructing { owner: RequestId },
    Done(Arc<ContainerService>),
}

/// Outcome of [`Slot::acquire`]
#[derive(Debug)]
pub(crate) enum SlotAccess {
    /// Constructed before, possibly by another request
    Cached(Arc<ContainerService>),
    /// The caller constructs the service and must call [`Slot::complete`]
    Owned,
    /// Waiting would close a cycle of requests waiting on each other
    Cyclic,
}

/// Cache entry of one key.
/// The state lock is never held while the service is constructed.
#[derive(Debug)]
pub(crate) struct Slot {
    id: usize,
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Slot {
    fn new() -> Self {
        Self {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(SlotState::Empty),
            ready: Condvar::new(),
        }
    }

    /// Returns the cached service, claims the slot for `request`, or waits for the request constructing it.
    /// Waiting is refused when the owner is itself blocked, directly or through other requests, on `request`.
    pub(crate) fn acquire(&self, waits: &WaitGraph, request: RequestId) -> SlotAccess {
        let mut state = self.state.lock();
        loop {
            match &*state {
                SlotState::Done(service) => return SlotAccess::Cached(service.clone()),
                SlotState::Empty => {
                    *state = SlotState::Constructing { owner: request };
                    waits.start(self.id, request);
                    return SlotAccess::Owned;
                }
                SlotState::Constructing { owner } => {
                    let owner = *owner;
                    if !waits.wait_for(self.id, request) {
                        return SlotAccess::Cyclic;
                    }
                    debug!(owner, "Waiting for construction in another request");
                }
            }
            self.ready.wait(&mut state);
            waits.stop_waiting(request);
        }
    }

    /// Stores the service constructed by the owner and wakes the waiting requests
    pub(crate) fn complete(&self, waits: &WaitGraph, service: Arc<ContainerService>) {
        let mut state = self.state.lock();
        *state = SlotState::Done(service);
        waits.finish(self.id);
        drop(state);
        self.ready.notify_all();
    }
}

#[derive(Debug, Default)]
struct WaitEdges {
    /// Slot id to the request constructing it
    owners: BTreeMap<usize, RequestId>,
    /// Request to the slot id it is blocked on
    waits: BTreeMap<RequestId, usize>,
}

/// Which request waits on which. Shared by a static container and its local containers.
///
/// A slot's owner entry is changed under both the slot's state lock and this lock,
/// so a stale wait edge of a woken request never points at a slot still under construction.
#[derive(Debug, Default)]
pub(crate) struct WaitGraph {
    edges: Mutex<WaitEdges>,
}

impl WaitGraph {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn start(&self, slot: usize, request: RequestId) {
        self.edges.lock().owners.insert(slot, request);
    }

    fn finish(&self, slot: usize) {
        self.edges.lock().owners.remove(&slot);
    }

    /// Records that `request` waits on `slot`, unless the chain of owners leads back to `request`
    #[must_use]
    fn wait_for(&self, slot: usize, request: RequestId) -> bool {
        let mut edges = self.edges.lock();
        let mut owner = edges.owners.get(&slot).copied();
        for _ in 0..=edges.waits.len() {
            match owner {
                None => break,
                Some(owner) if owner == request => return false,
                Some(current) => {
                    owner = edges
                        .waits
                        .get(&current)
                        .and_then(|blocked_on| edges.owners.get(blocked_on))
                        .copied();
                }
            }
        }
        edges.waits.insert(request, slot);
        true
    }

    fn stop_waiting(&self, request: RequestId) {
        self.edges.lock().waits.remove(&request);
    }
}

/// Resolved services of one container
#[derive(Default)]
pub(crate) struct Cache {
    slots: Mutex<BTreeMap<CacheKey, Arc<Slot>>>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn slot(&self, key: CacheKey) -> Arc<Slot> {
        self.slots.lock().entry(key).or_insert_with(|| Arc::new(Slot::new())).clone()
    }

    /// Number of keys requested so far
    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}
