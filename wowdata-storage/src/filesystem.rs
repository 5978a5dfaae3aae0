//! Filesystem cache tier.
//!
//! Every entity lives in one file addressed by a `{placeholder}` path
//! template below `base_path`. Structured entities are stored as record
//! blobs, icons and thumbnails as raw image bytes. A file is fresh while its
//! modification time plus the scheme lifetime lies in the future.

use crate::error::StorageResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use wowdata_channel::template::{fill, placeholders, prepare};
use wowdata_channel::{
    ChannelError, ChannelResult, Handled, ReadHandler, Registration, RegistrationError, Tier,
    WriteHandler,
};
use wowdata_model::{EntityType, Record};
use wowdata_types::{ParamGroup, Value, is_fresh, unix_now};

const DAY: i64 = 86_400;

/// Path scheme of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileScheme {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Directory template relative to the base path.
    #[serde(default)]
    pub ext_path: String,
    /// File name template.
    #[serde(default)]
    pub file_name: String,
    /// Seconds a file stays fresh; `None` never expires.
    #[serde(default)]
    pub lifetime_secs: Option<i64>,
}

fn default_enabled() -> bool {
    true
}

impl FileScheme {
    fn new(ext_path: &str, file_name: &str, lifetime_secs: Option<i64>) -> Self {
        Self {
            enabled: true,
            ext_path: ext_path.to_string(),
            file_name: file_name.to_string(),
            lifetime_secs,
        }
    }

    fn template(&self) -> String {
        if self.ext_path.is_empty() || self.ext_path.ends_with('/') {
            format!("{}{}", self.ext_path, self.file_name)
        } else {
            format!("{}/{}", self.ext_path, self.file_name)
        }
    }

    fn lifetime(&self) -> Option<u64> {
        self.lifetime_secs.and_then(|secs| u64::try_from(secs).ok())
    }

    fn check(&self, entity: EntityType) -> Result<(), RegistrationError> {
        if self.ext_path.trim().is_empty() {
            return Err(RegistrationError::MissingOption(format!("schemes/{entity}/ext_path")));
        }
        if self.file_name.trim().is_empty() {
            return Err(RegistrationError::MissingOption(format!("schemes/{entity}/file_name")));
        }
        if let Some(secs) = self.lifetime_secs
            && secs < 1
        {
            return Err(RegistrationError::InvalidOption {
                option: format!("schemes/{entity}/lifetime_secs"),
                reason: format!("{secs} is not a positive number of seconds"),
            });
        }
        Ok(())
    }
}

/// Built-in path schemes.
pub fn default_file_schemes() -> BTreeMap<EntityType, FileScheme> {
    BTreeMap::from([
        (EntityType::Realm, FileScheme::new("{region}/realms/", "{realm}.txt", Some(300))),
        (
            EntityType::Item,
            FileScheme::new("{region}/items/", "{itemid}.{locale}.txt", Some(30 * DAY)),
        ),
        (
            EntityType::ItemEquipped,
            FileScheme::new(
                "{region}/characters/realms/{realm}/",
                "{character}.{slotid}.{itemid}.{locale}.txt",
                Some(3 * DAY),
            ),
        ),
        (
            EntityType::Character,
            FileScheme::new(
                "{region}/characters/realms/{realm}/",
                "{character}.{locale}.txt",
                Some(DAY),
            ),
        ),
        (
            EntityType::CharacterThumbnail,
            FileScheme::new("{region}/characters/thumbnails/", "{filename}", Some(30 * DAY)),
        ),
        (
            EntityType::Guild,
            FileScheme::new("{region}/guilds/realms/{realm}/", "{guild}.{locale}.txt", Some(DAY)),
        ),
        (EntityType::Icon, FileScheme::new("{region}/icons/", "{icon}.jpg", None)),
    ])
}

/// Options of a [`FilesystemChannel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemOptions {
    pub base_path: PathBuf,
    /// Overrides of the built-in schemes, by entity type.
    #[serde(default)]
    pub schemes: BTreeMap<EntityType, FileScheme>,
}

impl FilesystemOptions {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            schemes: BTreeMap::new(),
        }
    }
}

/// Filesystem cache tier.
pub struct FilesystemChannel {
    base_path: PathBuf,
    registration: Registration<FilesystemChannel, FileScheme>,
}

impl FilesystemChannel {
    /// Validates the options and registers every enabled scheme.
    pub fn new(options: FilesystemOptions) -> StorageResult<Self> {
        let base_path = options.base_path;
        if base_path.as_os_str().is_empty() {
            return Err(RegistrationError::MissingOption("base_path".into()).into());
        }
        let meta = fs::metadata(&base_path).map_err(|_| RegistrationError::InvalidOption {
            option: "base_path".into(),
            reason: format!("{} does not point to a directory", base_path.display()),
        })?;
        if !meta.is_dir() {
            return Err(RegistrationError::InvalidOption {
                option: "base_path".into(),
                reason: format!("{} does not point to a directory", base_path.display()),
            }
            .into());
        }
        if meta.permissions().readonly() {
            return Err(RegistrationError::InvalidOption {
                option: "base_path".into(),
                reason: format!("{} must be a writable directory", base_path.display()),
            }
            .into());
        }

        let mut schemes = default_file_schemes();
        schemes.extend(options.schemes);

        let mut registration = Registration::new("filesystem");
        for (entity, scheme) in schemes {
            if !scheme.enabled {
                registration.scheme(entity, None);
                continue;
            }
            scheme.check(entity)?;
            registration.scheme(entity, Some(scheme));
            match entity {
                EntityType::Icon | EntityType::CharacterThumbnail => {
                    registration
                        .on_read(entity, ReadHandler::Single(Self::read_image))
                        .on_write(entity, WriteHandler::Single(Self::write_image));
                }
                _ => {
                    registration
                        .on_read(entity, ReadHandler::Single(Self::read_blob))
                        .on_write(entity, WriteHandler::Single(Self::write_blob));
                }
            }
        }
        registration.check()?;

        info!("Filesystem tier rooted at {:?}", base_path);
        Ok(Self {
            base_path,
            registration,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File location of the entity addressed by `params`.
    pub fn path_for(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<PathBuf> {
        let scheme = self.scheme(entity)?;
        let template = scheme.template();
        let values: BTreeMap<String, String> = placeholders(&template)
            .into_iter()
            .filter_map(|name| {
                params
                    .get(name)
                    .map(|value| (name.to_string(), prepare(name, value)))
            })
            .collect();
        let relative = PathBuf::from(fill(&template, &values)?);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ChannelError::Payload(format!(
                "{} escapes the cache directory",
                relative.display()
            )));
        }
        Ok(self.base_path.join(relative))
    }

    fn scheme(&self, entity: EntityType) -> ChannelResult<&FileScheme> {
        self.registration
            .scheme_of(entity)
            .ok_or_else(|| ChannelError::Backend(format!("no file scheme for {entity}")))
    }

    /// Whether a file exists and is still fresh.
    fn fresh(&self, entity: EntityType, path: &Path) -> ChannelResult<bool> {
        let Ok(meta) = fs::metadata(path) else {
            return Ok(false);
        };
        let modified = DateTime::<Utc>::from(meta.modified()?).timestamp();
        Ok(is_fresh(modified, self.scheme(entity)?.lifetime(), unix_now()))
    }

    fn read_blob(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Option<Record>> {
        let path = self.path_for(entity, params)?;
        if !self.fresh(entity, &path)? {
            return Ok(None);
        }
        let blob = fs::read(&path)?;
        let record = Record::from_blob_of(entity, &blob)?;
        debug!(entity = %entity, path = %path.display(), "cache hit");
        Ok(Some(record))
    }

    fn read_image(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Option<Record>> {
        let path = self.path_for(entity, params)?;
        if !self.fresh(entity, &path)? {
            return Ok(None);
        }
        let image = fs::read(&path)?;
        let name_param = match entity {
            EntityType::Icon => "icon",
            _ => "filename",
        };
        let mut record = Record::new(entity);
        record.set("region", params.get("region").cloned().unwrap_or_default());
        record.set(name_param, params.get(name_param).cloned().unwrap_or_default());
        record.set("image", Value::bytes(image));
        debug!(entity = %entity, path = %path.display(), "cache hit");
        Ok(Some(record))
    }

    fn write_blob(&self, entity: EntityType, record: &Record) -> ChannelResult<bool> {
        let blob = record.to_blob()?;
        self.store(entity, record, &blob)
    }

    fn write_image(&self, entity: EntityType, record: &Record) -> ChannelResult<bool> {
        let image = record
            .get("image")
            .and_then(Value::as_bytes)
            .ok_or_else(|| ChannelError::Payload(format!("{entity} record has no image")))?
            .to_vec();
        self.store(entity, record, &image)
    }

    /// Writes `contents` unless a fresh file already exists.
    fn store(&self, entity: EntityType, record: &Record, contents: &[u8]) -> ChannelResult<bool> {
        let path = self.path_for(entity, &record.identity())?;
        if self.fresh(entity, &path)? {
            return Ok(false);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, contents)?;
        debug!(entity = %entity, path = %path.display(), "cached");
        Ok(true)
    }
}

impl Tier for FilesystemChannel {
    fn name(&self) -> &str {
        self.registration.tier()
    }

    fn is_enabled(&self, entity: EntityType) -> bool {
        self.registration.is_enabled(entity)
    }

    fn read(&self, entity: EntityType, groups: &[ParamGroup]) -> Handled<Record> {
        self.registration.read(self, entity, groups)
    }

    fn write(&self, entity: EntityType, records: &[Record]) -> Handled<bool> {
        self.registration.write(self, entity, records)
    }
}
