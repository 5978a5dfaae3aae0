use crate::ModelError;
use crate::schema::Schema;
use crate::schemas;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

/// The kinds of game entity that can be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Realm,
    Character,
    CharacterThumbnail,
    Guild,
    Item,
    ItemEquipped,
    Icon,
}

static REALM: LazyLock<Arc<Schema>> = LazyLock::new(|| Arc::new(schemas::realm()));
static CHARACTER: LazyLock<Arc<Schema>> = LazyLock::new(|| Arc::new(schemas::character()));
static CHARACTER_THUMBNAIL: LazyLock<Arc<Schema>> =
    LazyLock::new(|| Arc::new(schemas::character_thumbnail()));
static GUILD: LazyLock<Arc<Schema>> = LazyLock::new(|| Arc::new(schemas::guild()));
static ITEM: LazyLock<Arc<Schema>> = LazyLock::new(|| Arc::new(schemas::item()));
static ITEM_EQUIPPED: LazyLock<Arc<Schema>> = LazyLock::new(|| Arc::new(schemas::item_equipped()));
static ICON: LazyLock<Arc<Schema>> = LazyLock::new(|| Arc::new(schemas::icon()));

impl EntityType {
    pub const ALL: [EntityType; 7] = [
        EntityType::Realm,
        EntityType::Character,
        EntityType::CharacterThumbnail,
        EntityType::Guild,
        EntityType::Item,
        EntityType::ItemEquipped,
        EntityType::Icon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Realm => "realm",
            EntityType::Character => "character",
            EntityType::CharacterThumbnail => "character_thumbnail",
            EntityType::Guild => "guild",
            EntityType::Item => "item",
            EntityType::ItemEquipped => "item_equipped",
            EntityType::Icon => "icon",
        }
    }

    /// The shared, immutable schema of this entity type.
    pub fn schema(self) -> Arc<Schema> {
        let schema = match self {
            EntityType::Realm => &REALM,
            EntityType::Character => &CHARACTER,
            EntityType::CharacterThumbnail => &CHARACTER_THUMBNAIL,
            EntityType::Guild => &GUILD,
            EntityType::Item => &ITEM,
            EntityType::ItemEquipped => &ITEM_EQUIPPED,
            EntityType::Icon => &ICON,
        };
        Arc::clone(&**schema)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EntityType::ALL
            .into_iter()
            .find(|e| e.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownEntity(s.to_string()))
    }
}
