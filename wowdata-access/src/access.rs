use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult};
use crate::log::{AccessLog, LogEntry};
use crate::params::{default_group, normalize};
use crate::request::{LookupRequest, LookupResult};
use tracing::{debug, warn};
use wowdata_channel::{Handled, Tier};
use wowdata_model::{EntityType, Record};
use wowdata_types::ParamGroup;

/// Status code of fatal configuration failures.
pub const FATAL_CODE: u16 = 500;

/// Lookup context: the ordered tier chain, parameter defaults and the access
/// log. Built once and passed by reference.
pub struct DataAccess {
    config: AccessConfig,
    defaults: ParamGroup,
    tiers: Vec<Box<dyn Tier>>,
    log: AccessLog,
}

/// A tier that missed some groups, with the request positions it missed.
struct Writeback<'a> {
    tier: &'a dyn Tier,
    positions: Vec<usize>,
}

impl DataAccess {
    /// Builds the context. Tiers are queried in the given order.
    pub fn new(config: AccessConfig, tiers: Vec<Box<dyn Tier>>) -> AccessResult<Self> {
        config.validate()?;
        let access = Self {
            defaults: default_group(&config.defaults),
            log: AccessLog::new(config.logging.clone()),
            config,
            tiers,
        };
        if access.tiers.is_empty() {
            access.log("No channel tiers configured!");
            return Err(AccessError::NoTiers);
        }
        Ok(access)
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Default parameters merged into every lookup.
    pub fn defaults(&self) -> &ParamGroup {
        &self.defaults
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Appends a message to the access log.
    pub fn log(&self, message: impl Into<String>) {
        self.log.log(message);
    }

    /// Buffered access log entries.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    /// Logs and builds a fatal error with the given code.
    pub fn error(&self, message: impl Into<String>, code: u16) -> AccessError {
        let message = message.into();
        warn!(code, "{message}");
        self.log(format!("ERROR {code}: {message}"));
        AccessError::Fatal { message, code }
    }

    /// Merges caller parameters with the defaults.
    pub fn normalize(&self, params: &ParamGroup) -> ParamGroup {
        normalize(params, &self.defaults)
    }

    /// Generic entry point; the result mirrors the request's shape.
    pub fn open(&self, entity: EntityType, request: impl Into<LookupRequest>) -> LookupResult {
        match request.into() {
            LookupRequest::Single(group) => LookupResult::Single(self.open_one(entity, &group)),
            LookupRequest::Batch(groups) => LookupResult::Batch(self.lookup(entity, &groups)),
        }
    }

    fn open_one(&self, entity: EntityType, params: &ParamGroup) -> Option<Record> {
        self.lookup(entity, std::slice::from_ref(params))
            .into_iter()
            .next()
            .flatten()
    }

    pub fn open_realm(&self, params: &ParamGroup) -> Option<Record> {
        self.open_one(EntityType::Realm, params)
    }

    pub fn open_realms(&self, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.lookup(EntityType::Realm, batch)
    }

    pub fn open_character(&self, params: &ParamGroup) -> Option<Record> {
        self.open_one(EntityType::Character, params)
    }

    pub fn open_characters(&self, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.lookup(EntityType::Character, batch)
    }

    pub fn open_character_thumbnail(&self, params: &ParamGroup) -> Option<Record> {
        self.open_one(EntityType::CharacterThumbnail, params)
    }

    pub fn open_character_thumbnails(&self, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.lookup(EntityType::CharacterThumbnail, batch)
    }

    pub fn open_guild(&self, params: &ParamGroup) -> Option<Record> {
        self.open_one(EntityType::Guild, params)
    }

    pub fn open_guilds(&self, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.lookup(EntityType::Guild, batch)
    }

    pub fn open_item(&self, params: &ParamGroup) -> Option<Record> {
        self.open_one(EntityType::Item, params)
    }

    pub fn open_items(&self, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.lookup(EntityType::Item, batch)
    }

    pub fn open_item_equipped(&self, params: &ParamGroup) -> Option<Record> {
        self.open_one(EntityType::ItemEquipped, params)
    }

    pub fn open_items_equipped(&self, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.lookup(EntityType::ItemEquipped, batch)
    }

    pub fn open_icon(&self, params: &ParamGroup) -> Option<Record> {
        self.open_one(EntityType::Icon, params)
    }

    pub fn open_icons(&self, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.lookup(EntityType::Icon, batch)
    }

    /// Resolves every group through the tier chain and fills the tiers that
    /// missed with what later tiers found. Returns one slot per group.
    pub fn lookup(&self, entity: EntityType, batch: &[ParamGroup]) -> Vec<Option<Record>> {
        self.log(format!("START LOOKUP: {entity}"));
        let groups: Vec<ParamGroup> = batch.iter().map(|g| self.normalize(g)).collect();
        let mut slots: Vec<Option<Record>> = vec![None; groups.len()];
        let mut remaining: Vec<usize> = (0..groups.len()).collect();
        let mut writebacks: Vec<Writeback<'_>> = Vec::new();

        for tier in &self.tiers {
            if remaining.is_empty() {
                break;
            }
            let pending: Vec<ParamGroup> = remaining.iter().map(|&i| groups[i].clone()).collect();
            let records = match tier.read(entity, &pending) {
                Handled::Refused => {
                    debug!(tier = tier.name(), entity = %entity, "tier does not serve entity");
                    continue;
                }
                Handled::Done(records) => records,
            };

            let found = claim(entity, &groups, &remaining, &records, &mut slots);
            remaining.retain(|&i| slots[i].is_none());
            if found > 0 {
                self.log(format!(
                    "Reading of {entity} in channel {} was successful ({found}/{})!",
                    tier.name(),
                    pending.len()
                ));
            } else {
                self.log(format!("Reading {entity} in channel {} failed!", tier.name()));
            }

            if !remaining.is_empty() {
                if found > 0 {
                    self.log(format!(
                        "{} param group(s) were not found: {:?}",
                        remaining.len(),
                        remaining.iter().map(|&i| &groups[i]).collect::<Vec<_>>()
                    ));
                }
                writebacks.push(Writeback {
                    tier: tier.as_ref(),
                    positions: remaining.clone(),
                });
            }
        }

        for writeback in writebacks.iter().rev() {
            self.write_back(entity, writeback, &slots);
        }
        slots
    }

    fn write_back(&self, entity: EntityType, writeback: &Writeback<'_>, slots: &[Option<Record>]) {
        let records: Vec<Record> = writeback
            .positions
            .iter()
            .filter_map(|&i| slots[i].clone())
            .collect();
        if records.is_empty() {
            return;
        }
        let name = writeback.tier.name();
        match writeback.tier.write(entity, &records) {
            Handled::Refused => {
                debug!(tier = name, entity = %entity, "tier does not store entity");
            }
            Handled::Done(results) if results.contains(&true) => {
                self.log(format!("Writing {entity} in channel {name} was successful!"));
            }
            Handled::Done(_) => {
                self.log(format!("Writing {entity} in channel {name} failed!"));
            }
        }
    }
}

/// Assigns records to the unresolved groups they match. A record claimed by
/// one group is only shared with groups equal to it. Returns how many slots
/// were filled.
fn claim(
    entity: EntityType,
    groups: &[ParamGroup],
    remaining: &[usize],
    records: &[Record],
    slots: &mut [Option<Record>],
) -> usize {
    let candidates: Vec<&Record> = records
        .iter()
        .filter(|r| r.entity() == entity && r.is_valid())
        .collect();
    let mut claimed_by: Vec<Option<&ParamGroup>> = vec![None; candidates.len()];
    let mut filled = 0;

    for &i in remaining {
        let group = &groups[i];
        let hit = (0..candidates.len()).find(|&c| {
            candidates[c].match_params(group) && claimed_by[c].is_none_or(|owner| owner == group)
        });
        if let Some(c) = hit {
            claimed_by[c] = Some(group);
            slots[i] = Some(candidates[c].clone());
            filled += 1;
        }
    }
    filled
}
