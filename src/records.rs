use crate::config::{FencingMode, LedgerConfig};
use log::{debug, warn};
use medlab_core::error::{LedgerError, LedgerResult};
use medlab_core::objects::LedgerRecord;
use medlab_storage_impl::LedgerStore;

/// Typed access to ledger records on top of a raw [`LedgerStore`]
///
/// Every read decodes fallibly: an absent key is `NotFound` and a record of
/// the wrong shape is `Deserialization`, never a zero-valued record.
pub struct RecordStore<'a, S: ?Sized> {
    store: &'a S,
    config: &'a LedgerConfig,
}

impl<S: ?Sized> Clone for RecordStore<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for RecordStore<'_, S> {}

impl<'a, S: LedgerStore + ?Sized> RecordStore<'a, S> {
    pub fn new(store: &'a S, config: &'a LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Read the raw bytes stored under a key
    pub fn read_raw(&self, key: &str) -> LedgerResult<Vec<u8>> {
        Ok(self.store.get(key)?)
    }

    /// Read and decode a record
    pub fn read<T: LedgerRecord>(&self, key: &str) -> LedgerResult<T> {
        self.read_versioned(key).map(|(record, _)| record)
    }

    /// Read and decode a record together with the version it was read at
    pub fn read_versioned<T: LedgerRecord>(&self, key: &str) -> LedgerResult<(T, u64)> {
        let versioned = self
            .store
            .get_versioned(key)?
            .ok_or_else(|| LedgerError::NotFound(key.to_string()))?;
        let record = T::from_bytes(&versioned.value).map_err(|e| match e {
            LedgerError::Deserialization(msg) => {
                LedgerError::Deserialization(format!("record {}: {}", key, msg))
            }
            other => other,
        })?;
        Ok((record, versioned.version))
    }

    /// Encode and write a record unconditionally
    pub fn write<T: LedgerRecord>(&self, key: &str, record: &T) -> LedgerResult<u64> {
        let bytes = record.to_bytes()?;
        Ok(self.store.put(key, &bytes)?)
    }

    /// Write a record only if the key has never been written
    ///
    /// Returns `false` if the key already exists.
    pub fn create<T: LedgerRecord>(&self, key: &str, record: &T) -> LedgerResult<bool> {
        let bytes = record.to_bytes()?;
        match self.store.put_if_version(key, &bytes, None) {
            Ok(_) => Ok(true),
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-modify-write a record.
    ///
    /// `apply` returns whether it changed the record; unchanged records are not
    /// written back. With optimistic fencing the write is conditional on the
    /// version that was read, and the whole cycle is retried when another
    /// writer got in between. Returns the record as written.
    pub fn update<T, F>(&self, key: &str, mut apply: F) -> LedgerResult<T>
    where
        T: LedgerRecord,
        F: FnMut(&mut T) -> LedgerResult<bool>,
    {
        let max_attempts = self.config.fencing.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let (mut record, version) = self.read_versioned::<T>(key)?;
            if !apply(&mut record)? {
                return Ok(record);
            }

            let bytes = record.to_bytes()?;
            let written = match self.config.fencing {
                FencingMode::Optimistic { .. } => {
                    self.store.put_if_version(key, &bytes, Some(version))
                }
                FencingMode::Disabled => self.store.put(key, &bytes),
            };

            match written {
                Ok(new_version) => {
                    debug!("Updated {} to version {} on attempt {}", key, new_version, attempt);
                    return Ok(record);
                }
                Err(e) if e.is_conflict() && attempt < max_attempts => {
                    debug!("Version conflict on {} (attempt {}), retrying", key, attempt);
                }
                Err(e) if e.is_conflict() => {
                    warn!("Giving up on {} after {} conflicting attempts", key, attempt);
                    return Err(LedgerError::Conflict {
                        key: key.to_string(),
                        attempts: attempt,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
