//! The public marshaling façade.
//!
//! [`MarshalService`] pairs the codec with a [`BufferPool`]: each call leases
//! a scratch entry for the record type, transcodes, and releases the entry
//! when the call (or the returned iterator) finishes. The service is
//! `Send + Sync` and needs no external synchronization.

use crate::codec::{self, Structures};
use crate::config::PoolConfig;
use crate::error::MarshalError;
use crate::layout::FixedLayout;
use crate::pool::{BufferPool, PoolStats};

/// Thread-safe record marshaling backed by pooled scratch memory.
///
/// Dropping the service releases the scratch entries of every record type
/// it has seen.
#[derive(Debug, Default)]
pub struct MarshalService {
    pool: BufferPool,
}

impl MarshalService {
    /// Create a service with the default pool configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service from a validated pool configuration.
    pub fn with_config(config: PoolConfig) -> Result<Self, MarshalError> {
        Ok(Self {
            pool: BufferPool::new(config)?,
        })
    }

    /// Write the bytes of `record` into `buffer` at `offset`.
    pub fn get_bytes<T: FixedLayout>(
        &self,
        buffer: &mut [u8],
        offset: usize,
        record: &T,
    ) -> Result<(), MarshalError> {
        let mut scratch = self.pool.lease::<T>()?;
        codec::write_record(&mut scratch, buffer, offset, record)
    }

    /// Read one record of type `T` from `buffer` at `offset`.
    pub fn get_structure<T: FixedLayout>(
        &self,
        buffer: &[u8],
        offset: usize,
    ) -> Result<T, MarshalError> {
        let mut scratch = self.pool.lease::<T>()?;
        codec::read_record(&mut scratch, buffer, offset)
    }

    /// Write `records` contiguously into `buffer` starting at `offset`.
    ///
    /// Returns the number of bytes written.
    pub fn get_bytes_many<T: FixedLayout>(
        &self,
        buffer: &mut [u8],
        offset: usize,
        records: &[T],
    ) -> Result<usize, MarshalError> {
        let mut scratch = self.pool.lease::<T>()?;
        codec::write_records(&mut scratch, buffer, offset, records)
    }

    /// Lazily read records of type `T` from `offset` until `upper_bound`.
    ///
    /// The returned iterator holds one scratch entry until it is dropped.
    pub fn get_structures<'b, T: FixedLayout>(
        &self,
        buffer: &'b [u8],
        offset: usize,
        upper_bound: usize,
    ) -> Result<Structures<'b, T>, MarshalError> {
        let scratch = self.pool.lease::<T>()?;
        Structures::new(scratch, buffer, offset, upper_bound)
    }

    /// Encode `record` into a freshly allocated byte vector.
    pub fn to_vec<T: FixedLayout>(&self, record: &T) -> Result<Vec<u8>, MarshalError> {
        let mut buffer = vec![0u8; std::mem::size_of::<T>()];
        self.get_bytes(&mut buffer, 0, record)?;
        Ok(buffer)
    }

    /// The underlying buffer pool.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Per-type pool statistics in first-seen order.
    pub fn pool_stats(&self) -> Vec<PoolStats> {
        self.pool.stats()
    }
}
