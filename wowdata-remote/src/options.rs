use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wowdata_model::EntityType;

/// Regions in fallback order; the first configured one answers for
/// unknown regions.
pub const REGION_ORDER: [&str; 5] = ["us", "eu", "kr", "tw", "cn"];

/// Request signing credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOptions {
    #[serde(default = "default_directive")]
    pub directive: String,
    pub public_key: String,
    pub private_key: String,
}

fn default_directive() -> String {
    "BNET".to_string()
}

/// How one query parameter enters the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParam {
    /// Optional parameters go to the query string, mandatory ones fill
    /// `{name}` placeholders.
    #[serde(default)]
    pub optional: bool,
    /// Separator joining list values; lists repeat the key when unset.
    #[serde(default)]
    pub concat: Option<String>,
    /// Values used when the parameter is absent or empty.
    #[serde(default)]
    pub default: Vec<String>,
    /// Accepted list values; empty accepts everything.
    #[serde(default)]
    pub valid: Vec<String>,
}

impl UrlParam {
    pub fn mandatory() -> Self {
        Self::default()
    }

    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Self::default()
        }
    }

    pub fn joined(mut self, separator: &str) -> Self {
        self.concat = Some(separator.to_string());
        self
    }

    pub fn defaults(mut self, values: &[&str]) -> Self {
        self.default = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn valid(mut self, values: &[&str]) -> Self {
        self.valid = values.iter().map(|v| v.to_string()).collect();
        self
    }
}

/// URL scheme of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScheme {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Full URL templates by region, replacing the tier's base paths.
    #[serde(default)]
    pub base_path: BTreeMap<String, String>,
    /// Appended to the tier's region base path.
    #[serde(default)]
    pub ext_path: String,
    #[serde(default)]
    pub params: BTreeMap<String, UrlParam>,
}

fn default_enabled() -> bool {
    true
}

impl RemoteScheme {
    fn api(ext_path: &str, params: Vec<(&str, UrlParam)>) -> Self {
        Self {
            enabled: true,
            base_path: BTreeMap::new(),
            ext_path: ext_path.to_string(),
            params: params
                .into_iter()
                .map(|(name, param)| (name.to_string(), param))
                .collect(),
        }
    }

    fn asset(path: &str, params: Vec<(&str, UrlParam)>) -> Self {
        Self {
            base_path: per_region(|host| format!("http://{host}/{path}")),
            ..Self::api("", params)
        }
    }
}

fn host(region: &str) -> String {
    match region {
        "cn" => "battlenet.com.cn".to_string(),
        other => format!("{other}.battle.net"),
    }
}

fn per_region(url: impl Fn(&str) -> String) -> BTreeMap<String, String> {
    REGION_ORDER
        .iter()
        .map(|region| (region.to_string(), url(&host(region))))
        .collect()
}

/// Built-in API base paths by region.
pub fn default_base_paths() -> BTreeMap<String, String> {
    per_region(|host| format!("http://{host}/api/wow/"))
}

/// Built-in URL schemes. Equipped items have no remote source.
pub fn default_remote_schemes() -> BTreeMap<EntityType, RemoteScheme> {
    let mandatory = UrlParam::mandatory;
    BTreeMap::from([
        (
            EntityType::Realm,
            RemoteScheme::api(
                "realm/status",
                vec![
                    ("region", mandatory()),
                    ("realm", UrlParam::optional().joined(",")),
                ],
            ),
        ),
        (
            EntityType::Character,
            RemoteScheme::api(
                "character/{realm}/{character}",
                vec![
                    ("locale", mandatory()),
                    ("region", mandatory()),
                    ("realm", mandatory()),
                    ("character", mandatory()),
                    (
                        "fields",
                        UrlParam::optional()
                            .joined(",")
                            .defaults(&["stats", "talents", "items"])
                            .valid(&[
                                "guild",
                                "stats",
                                "talents",
                                "items",
                                "reputation",
                                "titles",
                                "professions",
                                "appearance",
                                "companions",
                                "mounts",
                                "pets",
                                "achievements",
                                "progression",
                            ]),
                    ),
                ],
            ),
        ),
        (
            EntityType::CharacterThumbnail,
            RemoteScheme::asset(
                "static-render/{region}/{filename}",
                vec![("region", mandatory()), ("filename", mandatory())],
            ),
        ),
        (
            EntityType::Guild,
            RemoteScheme::api(
                "guild/{realm}/{guild}",
                vec![
                    ("locale", mandatory()),
                    ("region", mandatory()),
                    ("realm", mandatory()),
                    ("guild", mandatory()),
                    (
                        "fields",
                        UrlParam::optional()
                            .joined(",")
                            .defaults(&["members"])
                            .valid(&["members", "achievements"]),
                    ),
                ],
            ),
        ),
        (
            EntityType::Item,
            RemoteScheme::api(
                "item/{itemid}",
                vec![
                    ("locale", mandatory()),
                    ("region", mandatory()),
                    ("itemid", mandatory()),
                ],
            ),
        ),
        (
            EntityType::Icon,
            RemoteScheme::asset(
                "wow-assets/static/images/icons/56/{icon}.jpg",
                vec![("region", mandatory()), ("icon", mandatory())],
            ),
        ),
    ])
}

/// Options of an [`crate::ApiChannel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOptions {
    /// Requests are signed when set.
    #[serde(default)]
    pub auth: Option<AuthOptions>,
    /// Overrides of the built-in base paths, by region.
    #[serde(default)]
    pub base_paths: BTreeMap<String, String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Overrides of the built-in schemes, by entity type.
    #[serde(default)]
    pub schemes: BTreeMap<EntityType, RemoteScheme>,
}

fn default_connect_timeout() -> u64 {
    4
}

fn default_timeout() -> u64 {
    2
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            auth: None,
            base_paths: BTreeMap::new(),
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            schemes: BTreeMap::new(),
        }
    }
}
