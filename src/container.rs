use std::cell::RefCell;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::rc::{Rc, Weak};

use log::warn;

use crate::attributes::AttributeStore;
use crate::err::{StoreError, StoreResult};
use crate::event::EventObject;
use crate::value::{Value, ValueMap};

#[derive(Debug, Default)]
pub(crate) struct ContainerData {
    pub(crate) store: AttributeStore,
    pub(crate) parent: Option<Weak<RefCell<ContainerData>>>,
    pub(crate) events: Vec<EventObject>,
    pub(crate) containers: Vec<EventContainer>,
    pub(crate) first_timestamp: Option<i64>,
    pub(crate) last_timestamp: Option<i64>,
}

/// A node in the event tree.
///
/// Containers own their events and child containers, carry attributes shared
/// by everything underneath them, and track the timestamp range of their
/// subtree. Handles are cheap clones of the same node.
///
/// Ownership flows strictly parent to child; parent links are weak, so a
/// subtree is dropped once the last external handle to it goes away.
#[derive(Debug, Clone, Default)]
pub struct EventContainer {
    pub(crate) inner: Rc<RefCell<ContainerData>>,
}

/// Items accepted by [`EventContainer::append`].
#[derive(Debug, Clone)]
pub enum AppendItem {
    Event(EventObject),
    Container(EventContainer),
}

impl From<EventObject> for AppendItem {
    fn from(event: EventObject) -> Self {
        AppendItem::Event(event)
    }
}

impl From<&EventObject> for AppendItem {
    fn from(event: &EventObject) -> Self {
        AppendItem::Event(event.clone())
    }
}

impl From<EventContainer> for AppendItem {
    fn from(container: EventContainer) -> Self {
        AppendItem::Container(container)
    }
}

impl From<&EventContainer> for AppendItem {
    fn from(container: &EventContainer) -> Self {
        AppendItem::Container(container.clone())
    }
}

impl EventContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<ContainerData>>) -> Self {
        Self { inner }
    }

    /// Whether `self` and `other` are handles to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Sets a local attribute, overwriting any previous value.
    pub fn set_value(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner.borrow_mut().store.set_value(name, value);
    }

    /// Resolves an attribute locally first, then through the parent chain.
    pub fn get_value(&self, name: &str) -> StoreResult<Value> {
        if let Some(value) = self.local_value(name) {
            return Ok(value);
        }

        let mut next = self.parent();
        while let Some(container) = next {
            if let Some(value) = container.local_value(name) {
                return Ok(value);
            }
            next = container.parent();
        }

        Err(StoreError::AttributeNotFound {
            name: name.to_owned(),
        })
    }

    pub(crate) fn local_value(&self, name: &str) -> Option<Value> {
        self.inner.borrow().store.get(name).cloned()
    }

    pub(crate) fn merge_local_into(&self, merged: &mut ValueMap) {
        for (name, value) in self.inner.borrow().store.iter() {
            if !merged.contains_key(name) {
                merged.insert(name.clone(), value.clone());
            }
        }
    }

    /// Names of every attribute visible on this container, including
    /// inherited ones. Sorted and deduplicated.
    pub fn attributes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .borrow()
            .store
            .iter()
            .map(|(name, _)| name.clone())
            .collect();

        if let Some(parent) = self.parent() {
            names.extend(parent.attributes());
        }

        names.sort_unstable();
        names.dedup();
        names
    }

    /// The container this one was last appended to.
    pub fn parent(&self) -> Option<EventContainer> {
        self.inner
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(EventContainer::from_inner)
    }

    pub(crate) fn set_parent(&self, parent: &EventContainer) {
        self.inner.borrow_mut().parent = Some(Rc::downgrade(&parent.inner));
    }

    /// Earliest timestamp recorded for this subtree, or `None` when nothing
    /// timestamped was ever appended.
    pub fn first_timestamp(&self) -> Option<i64> {
        self.inner.borrow().first_timestamp
    }

    /// Latest timestamp recorded for this subtree.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.inner.borrow().last_timestamp
    }

    /// Appends an event or a child container.
    ///
    /// An event must resolve an integer `timestamp` attribute through its
    /// current parent chain; otherwise nothing is mutated and
    /// [`StoreError::InvalidAppendTarget`] is returned. A container whose
    /// subtree already holds `self` (including `self` itself) is rejected
    /// with the same error, since linking it would close a containment
    /// cycle. The item's parent link moves here ("last append wins"); a
    /// previous parent keeps the item in its sequence but no longer resolves
    /// attributes for it.
    pub fn append(&self, item: impl Into<AppendItem>) -> StoreResult<()> {
        match item.into() {
            AppendItem::Event(event) => self.append_event(event),
            AppendItem::Container(container) => self.append_container(container),
        }
    }

    fn append_event(&self, event: EventObject) -> StoreResult<()> {
        // Validate before touching any state.
        let timestamp = match event.get_value("timestamp") {
            Ok(Value::Integer(n)) => n,
            Ok(_) => {
                return Err(StoreError::InvalidAppendTarget {
                    reason: "event `timestamp` attribute is not an integer",
                });
            }
            Err(_) => {
                return Err(StoreError::InvalidAppendTarget {
                    reason: "event has no `timestamp` attribute",
                });
            }
        };

        event.set_parent(self);
        self.inner.borrow_mut().events.push(event);
        self.record_timestamps(timestamp, timestamp);
        Ok(())
    }

    fn append_container(&self, container: EventContainer) -> StoreResult<()> {
        // The strong references live in the child sequences; a cycle would
        // leak the whole loop and make traversal diverge.
        if container.subtree_contains(self) {
            return Err(StoreError::InvalidAppendTarget {
                reason: "append would create a containment cycle",
            });
        }

        let range = {
            let inner = container.inner.borrow();
            (inner.first_timestamp, inner.last_timestamp)
        };

        container.set_parent(self);
        self.inner.borrow_mut().containers.push(container);
        if let (Some(first), Some(last)) = range {
            self.record_timestamps(first, last);
        }
        Ok(())
    }

    fn subtree_contains(&self, other: &EventContainer) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.inner
            .borrow()
            .containers
            .iter()
            .any(|child| child.subtree_contains(other))
    }

    /// Widens the recorded range. It never shrinks, even if items are later
    /// re-appended elsewhere.
    fn record_timestamps(&self, first: i64, last: i64) {
        let mut inner = self.inner.borrow_mut();
        inner.first_timestamp = Some(match inner.first_timestamp {
            Some(current) => current.min(first),
            None => first,
        });
        inner.last_timestamp = Some(match inner.last_timestamp {
            Some(current) => current.max(last),
            None => last,
        });
    }

    /// Number of events stored here and in all child containers.
    pub fn len(&self) -> usize {
        let inner = self.inner.borrow();
        inner.events.len()
            + inner
                .containers
                .iter()
                .map(EventContainer::len)
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All events in the subtree, ordered by ascending timestamp.
    ///
    /// The heap is built eagerly, so mutations after this call do not affect
    /// an iteration already in progress. Events with equal timestamps keep
    /// their discovery order: direct events first, then child containers
    /// depth first.
    pub fn ordered_events(&self) -> OrderedEvents {
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        self.collect_events(&mut heap, &mut seq);
        OrderedEvents { heap }
    }

    fn collect_events(&self, heap: &mut BinaryHeap<Reverse<HeapEntry>>, seq: &mut u64) {
        let inner = self.inner.borrow();
        for event in &inner.events {
            let timestamp = event.timestamp().unwrap_or_else(|| {
                warn!("event no longer has an integer timestamp; ordering it at 0");
                0
            });
            heap.push(Reverse(HeapEntry {
                key: (timestamp, *seq),
                event: event.clone(),
            }));
            *seq += 1;
        }
        for container in &inner.containers {
            container.collect_events(heap, seq);
        }
    }
}

#[derive(Debug)]
struct HeapEntry {
    key: (i64, u64),
    event: EventObject,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // Only the key participates; events themselves have no order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Iterator returned by [`EventContainer::ordered_events`].
#[derive(Debug)]
pub struct OrderedEvents {
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl Iterator for OrderedEvents {
    type Item = EventObject;

    fn next(&mut self) -> Option<EventObject> {
        self.heap.pop().map(|Reverse(entry)| entry.event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl ExactSizeIterator for OrderedEvents {}

impl IntoIterator for &EventContainer {
    type Item = EventObject;
    type IntoIter = OrderedEvents;

    fn into_iter(self) -> OrderedEvents {
        self.ordered_events()
    }
}
