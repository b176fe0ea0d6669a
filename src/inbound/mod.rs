//! Out-of-band delivery of responses.
//!
//! Responses can reach the engine without polling, pushed over one of two
//! transports:
//! - an in-process broadcast bus ([`EventBus`]) carrying [`InboundEvent`]s
//! - a key-value store shared between processes ([`SharedStore`]), where a
//!   JSON-encoded response is written under [`STORAGE_KEY`] and consumed once
//!
//! [`InboundTransportAdapter`] drains either transport into the correlator.

mod adapter;
mod bus;
mod event;
mod store;


pub use adapter::InboundTransportAdapter;
pub use bus::EventBus;
pub use event::{InboundEvent, STORAGE_KEY};
pub use store::{DirectoryStore, MemoryStore, SharedStore, StoreError, publish_to_store};
