//! Remote API tier: read-only access to the game-data web API.

use crate::error::RemoteResult;
use crate::options::{
    AuthOptions, RemoteOptions, RemoteScheme, default_base_paths, default_remote_schemes,
};
use crate::signing::auth_headers;
use crate::transport::{HttpTransport, Transport};
use crate::url::build_url;
use chrono::Utc;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};
use wowdata_channel::{
    ChannelError, ChannelResult, Handled, ReadHandler, Registration, RegistrationError, Tier,
};
use wowdata_model::{EntityType, Record};
use wowdata_types::{ParamGroup, Value};

/// Item payload keys and the record fields they feed.
const ITEM_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("icon", "icon"),
    ("description", "desc"),
    ("quality", "overallQualityId"),
    ("itemBind", "bonding"),
    ("itemClass", "classId"),
    ("itemLevel", "itemLevel"),
    ("requiredLevel", "requiredLevel"),
    ("stackable", "stackable"),
    ("maxCount", "maxCount"),
    ("inventoryType", "inventoryType"),
    ("containerSlots", "containerSlots"),
    ("armor", "armor"),
    ("heroicTooltip", "heroic"),
];

const CHARACTER_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("class", "classid"),
    ("race", "raceid"),
    ("gender", "genderid"),
    ("level", "level"),
    ("achievementPoints", "achievementPoints"),
    ("thumbnail", "thumbnail"),
];

const REALM_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("slug", "slug"),
    ("type", "type"),
    ("population", "population"),
    ("queue", "queue"),
    ("status", "status"),
];

/// Read-only tier backed by the remote web API.
pub struct ApiChannel {
    base_paths: BTreeMap<String, String>,
    auth: Option<AuthOptions>,
    transport: Box<dyn Transport>,
    registration: Registration<ApiChannel, RemoteScheme>,
}

impl ApiChannel {
    /// Creates the tier with a blocking HTTP transport.
    pub fn new(options: RemoteOptions) -> RemoteResult<Self> {
        let transport = HttpTransport::new(
            Duration::from_secs(options.connect_timeout_secs),
            Duration::from_secs(options.timeout_secs),
        )?;
        Self::with_transport(options, Box::new(transport))
    }

    /// Creates the tier on top of any transport.
    pub fn with_transport(
        options: RemoteOptions,
        transport: Box<dyn Transport>,
    ) -> RemoteResult<Self> {
        if let Some(auth) = &options.auth {
            if auth.public_key.trim().is_empty() {
                return Err(RegistrationError::MissingOption("auth/public_key".into()).into());
            }
            if auth.private_key.trim().is_empty() {
                return Err(RegistrationError::MissingOption("auth/private_key".into()).into());
            }
        }

        let mut base_paths = default_base_paths();
        base_paths.extend(options.base_paths);
        let mut schemes = default_remote_schemes();
        schemes.extend(options.schemes);

        let mut registration = Registration::new("remote");
        for (entity, scheme) in schemes {
            if !scheme.enabled {
                registration.scheme(entity, None);
                continue;
            }
            if scheme.ext_path.trim().is_empty() && scheme.base_path.is_empty() {
                return Err(
                    RegistrationError::MissingOption(format!("schemes/{entity}/ext_path")).into(),
                );
            }
            let handler: fn(&Self, EntityType, &ParamGroup) -> ChannelResult<Option<Record>> =
                match entity {
                    EntityType::Realm => Self::read_realm,
                    EntityType::Character => Self::read_character,
                    EntityType::Guild => Self::read_guild,
                    EntityType::Item => Self::read_item,
                    EntityType::Icon | EntityType::CharacterThumbnail => Self::read_image,
                    EntityType::ItemEquipped => {
                        return Err(RegistrationError::InvalidOption {
                            option: format!("schemes/{entity}"),
                            reason: "the remote API has no source for this entity type".into(),
                        }
                        .into());
                    }
                };
            registration
                .scheme(entity, Some(scheme))
                .on_read(entity, ReadHandler::Single(handler));
        }
        registration.check()?;

        info!(signed = options.auth.is_some(), "Remote tier ready");
        Ok(Self {
            base_paths,
            auth: options.auth,
            transport,
            registration,
        })
    }

    /// Request URL of one parameter group.
    pub fn url_for(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<String> {
        let scheme = self
            .registration
            .scheme_of(entity)
            .ok_or_else(|| ChannelError::Backend(format!("no url scheme for {entity}")))?;
        Ok(build_url(&self.base_paths, scheme, params)?)
    }

    fn fetch(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Vec<u8>> {
        let url = self.url_for(entity, params)?;
        let headers = match &self.auth {
            Some(auth) => auth_headers(auth, &url, Utc::now())?,
            None => Vec::new(),
        };
        debug!(entity = %entity, url = %url, "API connect");
        Ok(self.transport.get(&url, &headers)?)
    }

    fn fetch_json(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Json> {
        let body = self.fetch(entity, params)?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn read_realm(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Option<Record>> {
        let payload = self.fetch_json(entity, params)?;
        let realm = match payload.get("realms").and_then(Json::as_array) {
            Some(realms) if realms.len() == 1 => &realms[0],
            _ => return Ok(None),
        };
        let mut record = mapped(entity, realm, REALM_FIELDS);
        copy_params(&mut record, params, &[("region", "region")]);
        Ok(Some(record))
    }

    fn read_character(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Option<Record>> {
        let payload = self.fetch_json(entity, params)?;
        if is_blank(&payload) {
            return Ok(None);
        }
        let mut record = mapped(entity, &payload, CHARACTER_FIELDS);
        copy_params(
            &mut record,
            params,
            &[("locale", "locale"), ("region", "region"), ("realm", "realm")],
        );
        Ok(Some(record))
    }

    fn read_guild(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Option<Record>> {
        let payload = self.fetch_json(entity, params)?;
        if is_blank(&payload) {
            return Ok(None);
        }
        let mut record = mapped(entity, &payload, &[("name", "name")]);
        copy_params(
            &mut record,
            params,
            &[("locale", "locale"), ("region", "region"), ("realm", "realm")],
        );
        Ok(Some(record))
    }

    fn read_item(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Option<Record>> {
        let payload = self.fetch_json(entity, params)?;
        if is_blank(&payload) {
            return Ok(None);
        }
        let mut record = mapped(entity, &payload, ITEM_FIELDS);
        copy_params(&mut record, params, &[("locale", "locale"), ("region", "region")]);

        if let Some(weapon) = payload.get("weaponInfo") {
            if let Some(dps) = weapon.get("dps") {
                record.set("damageDps", Value::from(dps.clone()));
            }
            if let Some(speed) = weapon.get("weaponSpeed") {
                record.set("damageSpeed", Value::from(speed.clone()));
            }
            if let Some(damage) = weapon.get("damage") {
                let component = Value::from([
                    ("min", Value::from(damage.get("min").cloned().unwrap_or_default())),
                    ("max", Value::from(damage.get("max").cloned().unwrap_or_default())),
                    ("type", Value::Int(0)),
                ]);
                record.set("damage", Value::List(vec![component]));
            }
        }
        Ok(Some(record))
    }

    fn read_image(&self, entity: EntityType, params: &ParamGroup) -> ChannelResult<Option<Record>> {
        let image = self.fetch(entity, params)?;
        let name = match entity {
            EntityType::Icon => "icon",
            _ => "filename",
        };
        let mut record = Record::new(entity);
        copy_params(&mut record, params, &[("region", "region"), (name, name)]);
        record.set("image", Value::bytes(image));
        Ok(Some(record))
    }
}

fn is_blank(payload: &Json) -> bool {
    match payload {
        Json::Null => true,
        Json::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Record built from the present payload keys.
fn mapped(entity: EntityType, payload: &Json, fields: &[(&str, &str)]) -> Record {
    let values = fields.iter().filter_map(|(key, field)| {
        payload
            .get(*key)
            .filter(|v| !v.is_null())
            .map(|v| (*field, Value::from(v.clone())))
    });
    Record::from_values(entity, values)
}

fn copy_params(record: &mut Record, params: &ParamGroup, names: &[(&str, &str)]) {
    for (param, field) in names {
        if let Some(value) = params.get(*param) {
            record.set(field, value.clone());
        }
    }
}

impl Tier for ApiChannel {
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
