//! Field tables of the built-in entity types.
//!
//! Character, guild and item schemas extend the locale/region base table;
//! equipped items extend the item table.

use crate::schema::{FieldMeta, Schema};
use crate::steps::{Arg, CleanOp, CleanStep, VerifyOp, VerifyStep};

/// Longest item description kept after cleaning.
const MAX_DESCRIPTION_CHARS: i64 = 1024;

// ── Field shorthands ─────────────────────────────────────────────

/// Non-empty key-like text (`a-zA-Z0-9_-`), cleaned as a key.
fn key(meta: FieldMeta, subject: &str) -> FieldMeta {
    meta.verify(VerifyStep::length(Some(1), None, &format!("{subject} must not be empty.")))
        .verify(VerifyStep::unary(
            VerifyOp::Key,
            &format!("{subject} must not contain special characters."),
        ))
        .clean(CleanStep::unary(CleanOp::Key))
}

/// Any non-empty text, stored as given.
fn text(meta: FieldMeta, min: i64, feedback: &str) -> FieldMeta {
    meta.verify(VerifyStep::length(Some(min), None, feedback))
}

/// Numeric field: one verify op, one clean op.
fn number(meta: FieldMeta, verify: VerifyOp, clean: CleanOp, feedback: &str) -> FieldMeta {
    meta.verify(VerifyStep::unary(verify, feedback))
        .clean(CleanStep::unary(clean))
}

/// Flag that is true whenever the payload carries it at all.
fn flag() -> FieldMeta {
    FieldMeta::optional().clean(CleanStep::with_args(CleanOp::Boolean, vec![Arg::lit(true)]))
}

fn boolean(meta: FieldMeta) -> FieldMeta {
    meta.clean(CleanStep::unary(CleanOp::Boolean))
}

fn image(subject: &str) -> FieldMeta {
    FieldMeta::required().verify(VerifyStep::unary(
        VerifyOp::ImageString,
        &format!("{subject} must be a valid image string."),
    ))
}

fn character_name(meta: FieldMeta) -> FieldMeta {
    meta.verify(VerifyStep::unary(
        VerifyOp::CharacterName,
        "Character name must not contain special characters.",
    ))
    .clean(CleanStep::unary(CleanOp::CharacterName))
}

// ── Entity tables ────────────────────────────────────────────────

/// Locale and region, shared by most entity types.
pub fn base() -> Schema {
    Schema::new()
        .field("locale", key(FieldMeta::required(), "Data locale key").param("locale"))
        .field("region", key(FieldMeta::required(), "Data region key").param("region"))
}

pub fn realm() -> Schema {
    Schema::new()
        .field("region", key(FieldMeta::required(), "Realm region key").param("region"))
        .field("slug", key(FieldMeta::required(), "Realm slug").param("realm"))
        .field("name", text(FieldMeta::required(), 1, "Realm name must not be empty."))
        .field("type", key(FieldMeta::required(), "Realm type"))
        .field("population", key(FieldMeta::required(), "Realm population"))
        .field("queue", boolean(FieldMeta::required()))
        .field("status", boolean(FieldMeta::required()))
}

pub fn character() -> Schema {
    let own = Schema::new()
        .field("realm", FieldMeta::required().param("realm"))
        .field(
            "name",
            character_name(
                FieldMeta::required()
                    .verify(VerifyStep::length(
                        Some(3),
                        Some(16),
                        "Character name must be between 3 and 16 characters long.",
                    ))
                    .verify(VerifyStep::max_repeated(
                        2,
                        None,
                        "Character name must not contain more than two identical consecutive characters.",
                    )),
            )
            .param("character"),
        )
        .field(
            "classid",
            number(FieldMeta::required(), VerifyOp::Id, CleanOp::Id, "Class id must be a positive integer."),
        )
        .field(
            "raceid",
            number(FieldMeta::required(), VerifyOp::Id, CleanOp::Id, "Race id must be a positive integer."),
        )
        .field(
            "genderid",
            number(
                FieldMeta::required(),
                VerifyOp::NonNegativeInteger,
                CleanOp::NonNegativeInteger,
                "Gender id must be a non-negative integer.",
            ),
        )
        .field(
            "level",
            number(
                FieldMeta::required(),
                VerifyOp::PositiveInteger,
                CleanOp::PositiveInteger,
                "Level must be a positive integer.",
            ),
        )
        .field(
            "achievementPoints",
            number(
                FieldMeta::required(),
                VerifyOp::NonNegativeInteger,
                CleanOp::NonNegativeInteger,
                "Achievement points must be zero or more.",
            ),
        )
        .field(
            "thumbnail",
            FieldMeta::optional()
                .verify(VerifyStep::unary(VerifyOp::FilePath, "Thumbnail must be a valid file path."))
                .clean(CleanStep::unary(CleanOp::FilePath)),
        );
    Schema::merge(&base(), own)
}

pub fn guild() -> Schema {
    let own = Schema::new()
        .field("realm", FieldMeta::required().param("realm"))
        .field(
            "name",
            FieldMeta::required()
                .verify(VerifyStep::length(
                    Some(2),
                    Some(24),
                    "Guild name must be between 2 and 24 characters long.",
                ))
                .verify(VerifyStep::unary(
                    VerifyOp::GuildName,
                    "Guild name must not contain special characters.",
                ))
                .verify(VerifyStep::max_repeated(
                    1,
                    Some(" "),
                    "Guild name must not contain more than one consecutive whitespace.",
                ))
                .verify(VerifyStep::max_repeated(
                    2,
                    None,
                    "Guild name must not contain more than two identical consecutive characters.",
                ))
                .clean(CleanStep::unary(CleanOp::GuildName))
                .param("guild"),
        );
    Schema::merge(&base(), own)
}

fn damage_component() -> Schema {
    let component = |feedback: &str| {
        number(
            FieldMeta::optional(),
            VerifyOp::NonNegativeInteger,
            CleanOp::NonNegativeInteger,
            feedback,
        )
    };
    Schema::new()
        .field("min", component("Item component minimum damage must be a non-negative integer."))
        .field("max", component("Item component maximum damage must be a non-negative integer."))
        .field("type", component("Item component damage type must be a non-negative integer."))
}

fn socket() -> Schema {
    Schema::new()
        .field("icon", FieldMeta::optional().clean(CleanStep::unary(CleanOp::FileName)))
        .field(
            "color",
            FieldMeta::optional()
                .verify(VerifyStep::unary(
                    VerifyOp::Key,
                    "Item socket color key must not contain special characters.",
                ))
                .clean(CleanStep::unary(CleanOp::Key)),
        )
        .field("enchant", FieldMeta::optional().clean(CleanStep::unary(CleanOp::NoHtml)))
        .field("match", boolean(FieldMeta::optional()))
}

fn spell() -> Schema {
    let count = |feedback: &str| {
        number(
            FieldMeta::optional(),
            VerifyOp::NonNegativeInteger,
            CleanOp::NonNegativeInteger,
            feedback,
        )
    };
    Schema::new()
        .field("trigger", count("Spell data trigger must be a non-negative integer."))
        .field("desc", text(FieldMeta::optional(), 2, "Spell data description must not be empty."))
        .field("charges", count("Spell data charges must be a non-negative integer."))
        .field("maxCharges", count("Spell data maximum charges must be a non-negative integer."))
}

fn item_fields() -> Schema {
    let integer = |feedback: &str| {
        number(FieldMeta::optional(), VerifyOp::Integer, CleanOp::Integer, feedback)
    };
    let non_negative = |meta: FieldMeta, feedback: &str| {
        number(meta, VerifyOp::NonNegativeInteger, CleanOp::NonNegativeInteger, feedback)
    };
    let positive = |feedback: &str| {
        number(
            FieldMeta::optional(),
            VerifyOp::PositiveInteger,
            CleanOp::PositiveInteger,
            feedback,
        )
    };

    Schema::new()
        .field(
            "id",
            number(FieldMeta::required(), VerifyOp::Id, CleanOp::Id, "Item id must be a positive integer.")
                .param("itemid"),
        )
        .field(
            "name",
            FieldMeta::required()
                .verify(VerifyStep::length(
                    Some(2),
                    Some(256),
                    "Item name must be between 2 and 256 characters long.",
                ))
                .clean(CleanStep::unary(CleanOp::ItemName)),
        )
        .field(
            "icon",
            FieldMeta::required()
                .verify(VerifyStep::length(Some(1), None, "Item icon must not be empty."))
                .verify(VerifyStep::unary(
                    VerifyOp::FileName,
                    "Item icon must not contain special characters.",
                ))
                .clean(CleanStep::unary(CleanOp::FileName)),
        )
        .field(
            "overallQualityId",
            non_negative(FieldMeta::required(), "Item quality id must be a non-negative integer."),
        )
        .field(
            "bonding",
            non_negative(FieldMeta::required(), "Item bonding id must be a non-negative integer."),
        )
        .field(
            "classId",
            non_negative(FieldMeta::required(), "Item class id must be a non-negative integer."),
        )
        .field("itemLevel", integer("Item level must be an integer."))
        .field(
            "glyphType",
            FieldMeta::optional()
                .verify(VerifyStep::unary(
                    VerifyOp::Key,
                    "Glyph type must not contain special characters.",
                ))
                .clean(CleanStep::unary(CleanOp::Key)),
        )
        .field("heroic", flag())
        .field("conjured", flag())
        .field("accountBound", flag())
        .field("uniqueEquippable", flag())
        .field("zoneBound", text(FieldMeta::optional(), 1, "Item bound zone must not be empty."))
        .field(
            "instanceBound",
            text(FieldMeta::optional(), 1, "Item bound instance must not be empty."),
        )
        .field(
            "stackable",
            non_negative(FieldMeta::optional(), "Item stackable count must be a non-negative integer."),
        )
        .field(
            "maxCount",
            non_negative(FieldMeta::optional(), "Item max count must be a non-negative integer."),
        )
        .field(
            "startQuestId",
            number(
                FieldMeta::optional(),
                VerifyOp::Id,
                CleanOp::Id,
                "Item started quest id must be a positive integer.",
            ),
        )
        .field(
            "inventoryType",
            non_negative(FieldMeta::optional(), "Item inventory type must be a non-negative integer."),
        )
        .field(
            "subclassName",
            text(FieldMeta::optional(), 1, "Item subclass name must not be empty."),
        )
        .field("containerSlots", positive("Item container slots must be a positive integer."))
        .field(
            "damageDps",
            number(
                FieldMeta::optional(),
                VerifyOp::PositiveFloat,
                CleanOp::PositiveFloat,
                "Item dps must be a positive float.",
            ),
        )
        .field(
            "damageSpeed",
            number(
                FieldMeta::optional(),
                VerifyOp::NonNegativeFloat,
                CleanOp::NonNegativeFloat,
                "Item speed must be a non-negative float.",
            ),
        )
        .field("damage", FieldMeta::optional().collect().subset(damage_component()))
        .field("armor", positive("Item armor must be a positive integer."))
        .field("blockValue", positive("Item block value must be a positive integer."))
        .field("bonusStrength", integer("Item bonus strength must be an integer."))
        .field("bonusAgility", integer("Item bonus agility must be an integer."))
        .field("bonusStamina", integer("Item bonus stamina must be an integer."))
        .field("bonusIntellect", integer("Item bonus intellect must be an integer."))
        .field("bonusSpirit", integer("Item bonus spirit must be an integer."))
        .field("sockets", FieldMeta::optional().collect().subset(socket()))
        .field(
            "allowableRaces",
            text(FieldMeta::optional().collect(), 1, "Allowable races entry must not be empty."),
        )
        .field(
            "allowableClasses",
            text(FieldMeta::optional().collect(), 1, "Allowable classes entry must not be empty."),
        )
        .field("requiredLevel", integer("Item required level must be an integer."))
        .field(
            "requiredFaction",
            FieldMeta::optional().subset(
                Schema::new()
                    .field("name", text(FieldMeta::optional(), 1, "Required faction name must not be empty."))
                    .field("reputation", integer("Required faction reputation must be an integer.")),
            ),
        )
        .field("spellData", FieldMeta::optional().collect().subset(spell()))
        .field("itemSetName", text(FieldMeta::optional(), 1, "Item set name must not be empty."))
        .field(
            "itemSetItems",
            FieldMeta::optional().collect().subset(
                Schema::new()
                    .field("name", text(FieldMeta::optional(), 1, "Item set item name must not be empty."))
                    .field("equipped", boolean(FieldMeta::optional())),
            ),
        )
        .field(
            "itemSetBonus",
            FieldMeta::optional().collect().subset(
                Schema::new()
                    .field(
                        "threshold",
                        positive("Item set bonus threshold must be a positive integer."),
                    )
                    .field(
                        "desc",
                        text(FieldMeta::optional(), 1, "Item set bonus description must not be empty."),
                    ),
            ),
        )
        .field(
            "desc",
            text(FieldMeta::optional(), 1, "Item description must not be empty.")
                .clean(CleanStep::unary(CleanOp::NoHtml))
                .clean(CleanStep::with_args(
                    CleanOp::Truncate,
                    vec![Arg::Input, Arg::lit(MAX_DESCRIPTION_CHARS)],
                )),
        )
}

pub fn item() -> Schema {
    Schema::merge(&base(), item_fields())
}

pub fn item_equipped() -> Schema {
    let own = Schema::new()
        .field("realm", FieldMeta::required().param("realm"))
        .field("character", character_name(FieldMeta::required()).param("character"))
        .field(
            "slotId",
            number(
                FieldMeta::required(),
                VerifyOp::NonNegativeInteger,
                CleanOp::NonNegativeInteger,
                "Item slot id must be a non-negative integer.",
            )
            .param("slotid"),
        );
    Schema::merge(&item(), own)
}

pub fn character_thumbnail() -> Schema {
    Schema::new()
        .field("region", key(FieldMeta::required(), "Thumbnail region key").param("region"))
        .field(
            "filename",
            FieldMeta::required()
                .verify(VerifyStep::length(Some(1), None, "Thumbnail filename must not be empty."))
                .verify(VerifyStep::unary(
                    VerifyOp::FilePath,
                    "Thumbnail filename must be a valid file path.",
                ))
                .clean(CleanStep::unary(CleanOp::FilePath))
                .param("filename"),
        )
        .field("image", image("Thumbnail"))
}

pub fn icon() -> Schema {
    Schema::new()
        .field("region", key(FieldMeta::required(), "Icon region key").param("region"))
        .field(
            "icon",
            FieldMeta::required()
                .verify(VerifyStep::length(Some(1), None, "Icon name must not be empty."))
                .verify(VerifyStep::unary(
                    VerifyOp::FileName,
                    "Icon name must not contain special characters.",
                ))
                .clean(CleanStep::unary(CleanOp::FileName))
                .param("icon"),
        )
        .field("image", image("Icon"))
}
