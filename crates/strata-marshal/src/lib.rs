//! Pooled fixed-layout record codec for native simulation buffers.
//!
//! Converts plain value records to and from flat byte buffers in the
//! layout a native simulation engine expects. Every conversion is staged
//! through a scratch buffer leased from a per-type pool, so many threads
//! can marshal concurrently without sharing staging memory.
//!
//! # Architecture
//!
//! ```text
//! MarshalService (public façade)
//! └── BufferPool
//!     └── IndexMap<TypeId, Arc<TypePool>>   (created lazily, first use)
//!         └── TypePool
//!             └── bounded channel of scratch blocks (N per type)
//!                 └── Lease<T>  (exclusive, returns its block on drop)
//! ```
//!
//! The codec functions in [`codec`] operate on a [`Lease`]; the service
//! acquires the lease, bounds-checks the caller's buffer, and copies the
//! record through the scratch block.
//!
//! # Record contract
//!
//! Any type implementing [`FixedLayout`] can be marshaled. The bound is a
//! blanket over the `zerocopy` layout traits, so types with pointers,
//! padding or interior mutability are rejected at compile time.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod pool;
pub mod service;

pub use codec::Structures;
pub use config::PoolConfig;
pub use error::MarshalError;
pub use layout::{size_of_record, FixedLayout};
pub use pool::{BufferPool, Lease, PoolStats};
pub use service::MarshalService;
