//! An in-memory store and wire codec for forensic timeline events.
//!
//! Events are bags of named attributes that live inside containers.
//! Containers nest, and attributes unset on an event resolve through its
//! parent chain, so per-source metadata (hostname, storage location) is
//! stored once on the container instead of on every event. Iterating a
//! container yields every event in its subtree ordered by timestamp, and the
//! [`wire`] codec turns single events into self contained, checksummed
//! messages.
//!
//! # Example
//!
//! ```
//! use timestore::{EventContainer, EventObject, decode_event, encode_event};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = EventContainer::new();
//! store.set_value("hostname", "workstation-7");
//!
//! let event = EventObject::from_posix_time(1_281_647_191, "Content Modification Time");
//! event.set_value("filename", "/var/log/syslog");
//! store.append(&event)?;
//!
//! for event in &store {
//!     let message = encode_event(&event)?;
//!     let copy = decode_event(&message)?;
//!     // Inherited attributes are materialized into the message.
//!     assert_eq!(copy.get_value("hostname")?, "workstation-7".into());
//! }
//! # Ok(())
//! # }
//! ```

pub mod err;
pub mod timestamp;
pub mod wire;

mod attributes;
mod container;
mod event;
mod render;
mod value;

pub use attributes::AttributeStore;
pub use container::{AppendItem, EventContainer, OrderedEvents};
pub use err::{
    DeserializationError, DeserializationResult, SerializationError, SerializationResult,
    StoreError, StoreResult,
};
pub use event::EventObject;
pub use render::MessageFormatter;
pub use value::{Value, ValueMap};
pub use wire::{
    CodecOptions, decode_event, decode_event_with_options, encode_event, encode_event_with_options,
};
