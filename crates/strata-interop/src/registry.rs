//! Dispatch from routine identifiers to typed parameter decoders.
//!
//! A [`RoutineRegistry`] is filled once with [`Routine`] marker types.
//! Afterwards it turns a collapsed tagged blob into the matching expanded
//! `RoutineData<R::Params>` by peeking the identifier, without the caller
//! knowing the parameter type up front.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use strata_marshal::MarshalService;
use tracing::{debug, trace};

use crate::error::InteropError;
use crate::routine::{peek_id, Routine, RoutineData, RoutineEntity, RoutineId};
use crate::state::BlobEntity;

type DecodeFn = fn(Vec<u8>, &MarshalService) -> Result<Box<dyn RoutineEntity>, InteropError>;

fn decode_as<R: Routine>(
    bytes: Vec<u8>,
    service: &MarshalService,
) -> Result<Box<dyn RoutineEntity>, InteropError>
where
    R::Params: fmt::Debug,
{
    let mut data = RoutineData::<R::Params>::from_binary(bytes);
    data.to_object(service)?;
    Ok(Box::new(data))
}

#[derive(Clone, Copy)]
struct Entry {
    alias: &'static str,
    decode: DecodeFn,
}

/// Errors raised while registering routines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The identifier or alias is already taken by another routine.
    Duplicate {
        /// The conflicting identifier.
        id: RoutineId,
        /// The conflicting alias.
        alias: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { id, alias } => {
                write!(f, "routine {id} ({alias}) is already registered")
            }
        }
    }
}

impl Error for RegistryError {}

/// Routines known to this process, in registration order.
#[derive(Default)]
pub struct RoutineRegistry {
    entries: IndexMap<RoutineId, Entry>,
    aliases: IndexMap<&'static str, RoutineId>,
}

impl RoutineRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register routine `R` under its id and alias.
    ///
    /// Fails if either is already registered; the registry is unchanged
    /// in that case.
    pub fn register<R: Routine>(&mut self) -> Result<(), RegistryError>
    where
        R::Params: fmt::Debug,
    {
        if self.entries.contains_key(&R::ID) || self.aliases.contains_key(R::ALIAS) {
            return Err(RegistryError::Duplicate {
                id: R::ID,
                alias: R::ALIAS,
            });
        }
        self.entries.insert(
            R::ID,
            Entry {
                alias: R::ALIAS,
                decode: decode_as::<R>,
            },
        );
        self.aliases.insert(R::ALIAS, R::ID);
        debug!(id = %R::ID, alias = R::ALIAS, "registered routine");
        Ok(())
    }

    /// Number of registered routines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no routine is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `id` is registered.
    pub fn contains(&self, id: RoutineId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registered identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = RoutineId> + '_ {
        self.entries.keys().copied()
    }

    /// Alias of a registered routine.
    pub fn alias_of(&self, id: RoutineId) -> Option<&'static str> {
        self.entries.get(&id).map(|entry| entry.alias)
    }

    /// Look up a routine by alias or by its textual identifier.
    pub fn resolve(&self, key: &str) -> Option<RoutineId> {
        if let Some(id) = self.aliases.get(key) {
            return Some(*id);
        }
        key.parse::<RoutineId>()
            .ok()
            .filter(|id| self.entries.contains_key(id))
    }

    /// Decode a collapsed tagged blob into its registered parameter type.
    ///
    /// Returns `Ok(None)` if the blob's identifier is not registered. The
    /// returned entity is expanded.
    pub fn decode(
        &self,
        bytes: Vec<u8>,
        service: &MarshalService,
    ) -> Result<Option<Box<dyn RoutineEntity>>, InteropError> {
        let id = peek_id(&bytes)?;
        let Some(entry) = self.entries.get(&id) else {
            trace!(%id, "no routine registered for id");
            return Ok(None);
        };
        (entry.decode)(bytes, service).map(Some)
    }
}

impl fmt::Debug for RoutineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(id, entry)| (id, entry.alias)))
            .finish()
    }
}
