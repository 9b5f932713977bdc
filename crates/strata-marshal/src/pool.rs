//! Per-type pools of reusable scratch buffers.
//!
//! [`BufferPool`] keeps one type pool per record type, created the first
//! time that type is leased. Each type pool owns a fixed number of scratch
//! blocks sized exactly to one record. Free blocks sit in a bounded
//! channel; leasing dequeues one and [`Lease`]'s `Drop` puts it back, so
//! release happens on every exit path including unwinding.
//!
//! The type map is read-locked on the hot path. A miss takes the write
//! lock and rechecks before creating entries, so concurrent first use of a
//! type creates its entries exactly once.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::config::PoolConfig;
use crate::error::MarshalError;
use crate::layout::{size_of_record, type_name_of, FixedLayout};

/// Scratch blocks for a single record type.
struct TypePool {
    type_name: &'static str,
    entry_size: usize,
    entries: usize,
    free_tx: Sender<Box<[u8]>>,
    free_rx: Receiver<Box<[u8]>>,
}

impl TypePool {
    fn new(type_name: &'static str, entry_size: usize, entries: usize) -> Self {
        let (free_tx, free_rx) = bounded(entries);
        for _ in 0..entries {
            // Capacity equals the entry count, so this never blocks.
            let _ = free_tx.try_send(vec![0u8; entry_size].into_boxed_slice());
        }
        Self {
            type_name,
            entry_size,
            entries,
            free_tx,
            free_rx,
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            type_name: self.type_name,
            entry_size: self.entry_size,
            entries: self.entries,
            available: self.free_rx.len(),
        }
    }
}

/// Point-in-time view of one type's scratch entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Name of the record type.
    pub type_name: &'static str,
    /// Size of each scratch entry in bytes.
    pub entry_size: usize,
    /// Total number of entries for the type.
    pub entries: usize,
    /// Entries not currently leased.
    pub available: usize,
}

/// Exclusive handle to one scratch entry sized for `T`.
///
/// The entry returns to its pool when the lease is dropped. A lease keeps
/// its type pool alive, so it may outlive the [`BufferPool`] that issued it.
pub struct Lease<T> {
    pool: Arc<TypePool>,
    scratch: Box<[u8]>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Lease<T> {
    /// The scratch bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.scratch
    }

    /// The scratch bytes, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.scratch
    }

    /// Size of the scratch entry in bytes (always `size_of::<T>()`).
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True for zero-sized record types.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the record type this lease is sized for.
    pub fn type_name(&self) -> &'static str {
        self.pool.type_name
    }
}

impl<T> fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("type_name", &self.pool.type_name)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        let scratch = std::mem::take(&mut self.scratch);
        // At most `entries` blocks exist, so the queue always has room.
        let _ = self.pool.free_tx.try_send(scratch);
        trace!(type_name = self.pool.type_name, "scratch entry released");
    }
}

/// Lazily populated collection of per-type scratch pools.
pub struct BufferPool {
    config: PoolConfig,
    pools: RwLock<IndexMap<TypeId, Arc<TypePool>>>,
}

impl BufferPool {
    /// Create an empty pool. Entries are created on first use of each type.
    pub fn new(config: PoolConfig) -> Result<Self, MarshalError> {
        config.validate()?;
        Ok(Self {
            config,
            pools: RwLock::new(IndexMap::new()),
        })
    }

    /// The configuration this pool was created with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Lease a scratch entry for `T`, blocking until one is free.
    ///
    /// With [`PoolConfig::lease_timeout`] set, gives up after the timeout
    /// with [`MarshalError::LeaseTimeout`].
    pub fn lease<T: FixedLayout>(&self) -> Result<Lease<T>, MarshalError> {
        match self.config.lease_timeout {
            Some(timeout) => self.lease_timeout::<T>(timeout),
            None => {
                let pool = self.type_pool::<T>()?;
                let scratch = pool
                    .free_rx
                    .recv()
                    .map_err(|_| MarshalError::PoolDisconnected {
                        type_name: pool.type_name,
                    })?;
                Ok(Self::wrap(pool, scratch))
            }
        }
    }

    /// Lease a scratch entry for `T`, waiting at most `timeout`.
    pub fn lease_timeout<T: FixedLayout>(
        &self,
        timeout: Duration,
    ) -> Result<Lease<T>, MarshalError> {
        let pool = self.type_pool::<T>()?;
        let started = Instant::now();
        match pool.free_rx.recv_timeout(timeout) {
            Ok(scratch) => Ok(Self::wrap(pool, scratch)),
            Err(RecvTimeoutError::Timeout) => {
                let waited = started.elapsed();
                warn!(
                    type_name = pool.type_name,
                    entries = pool.entries,
                    ?waited,
                    "scratch lease timed out"
                );
                Err(MarshalError::LeaseTimeout {
                    type_name: pool.type_name,
                    waited,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(MarshalError::PoolDisconnected {
                type_name: pool.type_name,
            }),
        }
    }

    /// Lease a scratch entry for `T` if one is free right now.
    pub fn try_lease<T: FixedLayout>(&self) -> Result<Option<Lease<T>>, MarshalError> {
        let pool = self.type_pool::<T>()?;
        let scratch = pool.free_rx.try_recv().ok();
        Ok(scratch.map(|scratch| Self::wrap(pool, scratch)))
    }

    /// Per-type statistics in first-seen order.
    pub fn stats(&self) -> Vec<PoolStats> {
        match self.pools.read() {
            Ok(pools) => pools.values().map(|p| p.stats()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of distinct record types seen so far.
    pub fn type_count(&self) -> usize {
        self.pools.read().map(|pools| pools.len()).unwrap_or(0)
    }

    fn wrap<T>(pool: Arc<TypePool>, scratch: Box<[u8]>) -> Lease<T> {
        trace!(type_name = pool.type_name, "scratch entry leased");
        Lease {
            pool,
            scratch,
            _record: PhantomData,
        }
    }

    fn type_pool<T: FixedLayout>(&self) -> Result<Arc<TypePool>, MarshalError> {
        let key = TypeId::of::<T>();
        {
            let pools = self.pools.read().map_err(|_| MarshalError::PoolPoisoned)?;
            if let Some(pool) = pools.get(&key) {
                return Ok(Arc::clone(pool));
            }
        }

        let mut pools = self.pools.write().map_err(|_| MarshalError::PoolPoisoned)?;
        let entries = self.config.entries_per_type;
        let pool = pools.entry(key).or_insert_with(|| {
            let type_name = type_name_of::<T>();
            let entry_size = size_of_record::<T>();
            debug!(type_name, entry_size, entries, "created scratch entries");
            Arc::new(TypePool::new(type_name, entry_size, entries))
        });
        Ok(Arc::clone(pool))
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self {
            config: PoolConfig::default(),
            pools: RwLock::new(IndexMap::new()),
        }
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.config)
            .field("types", &self.type_count())
            .finish()
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        let pools = match self.pools.get_mut() {
            Ok(pools) => pools,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entries: usize = pools.values().map(|p| p.entries).sum();
        debug!(types = pools.len(), entries, "released scratch pools");
        pools.clear();
    }
}
