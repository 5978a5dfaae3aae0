use crate::error::{ChannelResult, RegistrationError, RegistrationResult};
use crate::tier::Handled;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use wowdata_model::{EntityType, Record};
use wowdata_types::ParamGroup;

/// Direction of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Read,
    Write,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Read => "read",
            Mode::Write => "write",
        })
    }
}

/// A read handler of channel type `C`.
pub enum ReadHandler<C> {
    /// Invoked once per parameter group; yields one record or a miss.
    Single(fn(&C, EntityType, &ParamGroup) -> ChannelResult<Option<Record>>),
    /// Invoked once with every unresolved group; yields any number of records.
    Batch(fn(&C, EntityType, &[ParamGroup]) -> ChannelResult<Vec<Record>>),
}

/// A write handler of channel type `C`.
pub enum WriteHandler<C> {
    Single(fn(&C, EntityType, &Record) -> ChannelResult<bool>),
    Batch(fn(&C, EntityType, &[Record]) -> ChannelResult<Vec<bool>>),
}

impl<C> ReadHandler<C> {
    pub fn is_batch(&self) -> bool {
        matches!(self, ReadHandler::Batch(_))
    }
}

impl<C> WriteHandler<C> {
    pub fn is_batch(&self) -> bool {
        matches!(self, WriteHandler::Batch(_))
    }
}

/// Per-channel table of entity schemes and handlers.
///
/// `S` is the channel's scheme options type. An entity type whose scheme is
/// `None` is registered but disabled; an entity type absent from the table
/// was never registered. Both are refused by [`Registration::read`] and
/// [`Registration::write`]. The table is built once and only read afterwards.
pub struct Registration<C, S> {
    tier: String,
    schemes: BTreeMap<EntityType, Option<S>>,
    reads: BTreeMap<EntityType, Vec<ReadHandler<C>>>,
    writes: BTreeMap<EntityType, Vec<WriteHandler<C>>>,
}

impl<C, S> Registration<C, S> {
    pub fn new(tier: impl Into<String>) -> Self {
        Self {
            tier: tier.into(),
            schemes: BTreeMap::new(),
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    pub fn tier(&self) -> &str {
        &self.tier
    }

    /// Registers the scheme of an entity type; `None` disables it.
    pub fn scheme(&mut self, entity: EntityType, scheme: Option<S>) -> &mut Self {
        self.schemes.insert(entity, scheme);
        self
    }

    pub fn on_read(&mut self, entity: EntityType, handler: ReadHandler<C>) -> &mut Self {
        self.reads.entry(entity).or_default().push(handler);
        self
    }

    pub fn on_write(&mut self, entity: EntityType, handler: WriteHandler<C>) -> &mut Self {
        self.writes.entry(entity).or_default().push(handler);
        self
    }

    /// Options of an enabled entity type.
    pub fn scheme_of(&self, entity: EntityType) -> Option<&S> {
        self.schemes.get(&entity).and_then(Option::as_ref)
    }

    pub fn is_enabled(&self, entity: EntityType) -> bool {
        self.scheme_of(entity).is_some()
    }

    /// Enabled entity types with their options.
    pub fn enabled(&self) -> impl Iterator<Item = (EntityType, &S)> {
        self.schemes
            .iter()
            .filter_map(|(entity, scheme)| scheme.as_ref().map(|s| (*entity, s)))
    }

    pub fn has_writer(&self, entity: EntityType) -> bool {
        self.writes.get(&entity).is_some_and(|h| !h.is_empty())
    }

    /// Fails when an enabled entity type has no read handler.
    pub fn check(&self) -> RegistrationResult<()> {
        for (entity, _) in self.enabled() {
            if self.reads.get(&entity).is_none_or(|h| h.is_empty()) {
                return Err(RegistrationError::NoHandlers {
                    tier: self.tier.clone(),
                    entity,
                });
            }
        }
        Ok(())
    }

    /// Dispatches a read of `groups` to the handlers of `entity`.
    ///
    /// Duplicate groups are dropped first. Handlers run in registration
    /// order until one yields a non-empty result; handler errors are logged
    /// and count as an empty result.
    pub fn read(&self, channel: &C, entity: EntityType, groups: &[ParamGroup]) -> Handled<Record> {
        if !self.is_enabled(entity) {
            return Handled::Refused;
        }
        let Some(handlers) = self.reads.get(&entity) else {
            return Handled::Refused;
        };

        let groups = unique_groups(groups);
        for handler in handlers {
            let records: Vec<Record> = match handler {
                ReadHandler::Single(read) => groups
                    .iter()
                    .filter_map(|group| match read(channel, entity, group) {
                        Ok(found) => found,
                        Err(e) => {
                            warn!(tier = %self.tier, entity = %entity, "read failed: {e}");
                            None
                        }
                    })
                    .collect(),
                ReadHandler::Batch(read) => match read(channel, entity, &groups) {
                    Ok(found) => found,
                    Err(e) => {
                        warn!(tier = %self.tier, entity = %entity, "batch read failed: {e}");
                        Vec::new()
                    }
                },
            };
            if !records.is_empty() {
                debug!(tier = %self.tier, entity = %entity, found = records.len(), "read");
                return Handled::Done(records);
            }
        }
        Handled::Done(Vec::new())
    }

    /// Dispatches a write of `records`, deduplicated by identity.
    pub fn write(&self, channel: &C, entity: EntityType, records: &[Record]) -> Handled<bool> {
        if !self.is_enabled(entity) {
            return Handled::Refused;
        }
        let Some(handlers) = self.writes.get(&entity) else {
            return Handled::Refused;
        };

        let records = unique_records(records);
        for handler in handlers {
            let results: Vec<bool> = match handler {
                WriteHandler::Single(write) => records
                    .iter()
                    .map(|record| {
                        write(channel, entity, record).unwrap_or_else(|e| {
                            warn!(tier = %self.tier, entity = %entity, "write failed: {e}");
                            false
                        })
                    })
                    .collect(),
                WriteHandler::Batch(write) => write(channel, entity, &records).unwrap_or_else(|e| {
                    warn!(tier = %self.tier, entity = %entity, "batch write failed: {e}");
                    Vec::new()
                }),
            };
            if !results.is_empty() {
                return Handled::Done(results);
            }
        }
        Handled::Done(Vec::new())
    }
}

/// Groups in first-seen order with exact duplicates removed.
pub fn unique_groups(groups: &[ParamGroup]) -> Vec<ParamGroup> {
    let mut unique: Vec<ParamGroup> = Vec::with_capacity(groups.len());
    for group in groups {
        if !unique.contains(group) {
            unique.push(group.clone());
        }
    }
    unique
}

/// Records in first-seen order, one per identity.
pub fn unique_records(records: &[Record]) -> Vec<Record> {
    let mut seen: Vec<ParamGroup> = Vec::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        let identity = record.identity();
        if !seen.contains(&identity) {
            seen.push(identity);
            unique.push(record.clone());
        }
    }
    unique
}
