use pretty_assertions::assert_eq;
use rusqlite::Connection;
use wowdata_channel::{Handled, RegistrationError, Tier};
use wowdata_model::{EntityType, Record};
use wowdata_storage::{
    SqlField, SqlScheme, SqliteChannel, SqliteOptions, StorageError, default_sql_schemes,
};
use wowdata_types::{ParamGroup, Value};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

fn group(pairs: &[(&str, Value)]) -> ParamGroup {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn memory() -> SqliteChannel {
    SqliteChannel::initialize(SqliteOptions::new(":memory:")).unwrap()
}

fn realm(name: &str, slug: &str) -> Record {
    Record::from_values(
        EntityType::Realm,
        [
            ("region", Value::from("eu")),
            ("slug", Value::from(slug)),
            ("name", Value::from(name)),
            ("type", Value::from("pve")),
            ("population", Value::from("medium")),
            ("queue", Value::from(false)),
            ("status", Value::from(true)),
        ],
    )
}

fn realm_group(slug: &str) -> ParamGroup {
    group(&[
        ("locale", Value::from("de_DE")),
        ("region", Value::from("eu")),
        ("realm", Value::from(slug)),
    ])
}

// ── Registration ─────────────────────────────────────────────────

#[test]
fn open_without_tables_reports_the_missing_table() {
    let err = SqliteChannel::open(SqliteOptions::new(":memory:")).err().unwrap();
    assert!(matches!(
        err,
        StorageError::Registration(RegistrationError::MissingTable(_))
    ));
    assert_eq!(err.code(), 500);
}

#[test]
fn initialized_database_opens_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wowdata.sqlite");
    {
        let channel = SqliteChannel::initialize(SqliteOptions::new(&path)).unwrap();
        channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]);
    }
    let channel = SqliteChannel::open(SqliteOptions::new(&path)).unwrap();
    assert_eq!(
        channel.read(EntityType::Realm, &[realm_group("gilneas")]).into_vec(),
        vec![realm("Gilneas", "gilneas")]
    );
}

#[test]
fn missing_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wowdata.sqlite");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE wow_realm (region TEXT, slug TEXT, wdo BLOB, timestamp INTEGER);")
        .unwrap();

    let mut options = SqliteOptions::new(&path);
    for entity in EntityType::ALL {
        if entity != EntityType::Realm {
            options.schemes.insert(
                entity,
                SqlScheme {
                    enabled: false,
                    ..default_sql_schemes()[&entity].clone()
                },
            );
        }
    }
    let err = SqliteChannel::open(options).err().unwrap();
    match err {
        StorageError::Registration(RegistrationError::MissingColumn { table, column }) => {
            assert_eq!(table, "wow_realm");
            assert_eq!(column, "name");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn undeclared_data_id_is_rejected() {
    let mut scheme = default_sql_schemes()[&EntityType::Realm].clone();
    scheme.fields.insert(
        "owner".into(),
        SqlField {
            data_id: "owner".into(),
            sql_type: "TEXT".into(),
            open_key: None,
        },
    );
    let mut options = SqliteOptions::new(":memory:");
    options.schemes.insert(EntityType::Realm, scheme);

    let err = SqliteChannel::initialize(options).err().unwrap();
    assert!(matches!(
        err,
        StorageError::Registration(RegistrationError::UndeclaredField {
            entity: EntityType::Realm,
            ..
        })
    ));
}

#[test]
fn table_name_must_be_a_plain_identifier() {
    let mut options = SqliteOptions::new(":memory:");
    options.schemes.insert(
        EntityType::Realm,
        SqlScheme {
            table: "wow_realm; DROP TABLE wow_item".into(),
            ..default_sql_schemes()[&EntityType::Realm].clone()
        },
    );
    assert!(SqliteChannel::initialize(options).is_err());
}

#[test]
fn guild_is_disabled_by_default() {
    let channel = memory();
    assert!(!channel.is_enabled(EntityType::Guild));
    assert_eq!(channel.read(EntityType::Guild, &[realm_group("gilneas")]), Handled::Refused);
    assert!(channel.is_enabled(EntityType::Item));
}

// ── Reading and writing ──────────────────────────────────────────

#[test]
fn batch_read_returns_every_stored_match() {
    let channel = memory();
    channel.write(
        EntityType::Realm,
        &[realm("Gilneas", "gilneas"), realm("Antonidas", "antonidas")],
    );

    let mut found = channel
        .read(
            EntityType::Realm,
            &[realm_group("gilneas"), realm_group("antonidas"), realm_group("blackhand")],
        )
        .into_vec();
    found.sort_by_key(|r| r.get("slug").map(Value::to_text));
    assert_eq!(found, vec![realm("Antonidas", "antonidas"), realm("Gilneas", "gilneas")]);
}

#[test]
fn group_without_open_key_matches_nothing() {
    let channel = memory();
    channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]);
    let found = channel.read(EntityType::Realm, &[group(&[("region", Value::from("eu"))])]);
    assert_eq!(found, Handled::Done(Vec::new()));
}

#[test]
fn rewriting_replaces_the_row() {
    let channel = memory();
    channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]);
    let mut updated = realm("Gilneas", "gilneas");
    updated.set("population", "low");
    assert_eq!(
        channel.write(EntityType::Realm, &[updated.clone()]),
        Handled::Done(vec![true])
    );
    assert_eq!(channel.count(EntityType::Realm).unwrap(), 1);
    assert_eq!(
        channel.read(EntityType::Realm, &[realm_group("gilneas")]).into_vec(),
        vec![updated]
    );
}

#[test]
fn invalid_records_are_not_saved() {
    let channel = memory();
    let mut partial = Record::new(EntityType::Realm);
    partial.set("region", "eu");
    partial.set("slug", "blackhand");
    assert_eq!(
        channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas"), partial]),
        Handled::Done(vec![true, false])
    );
    assert_eq!(channel.count(EntityType::Realm).unwrap(), 1);
}

#[test]
fn expired_rows_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wowdata.sqlite");
    let channel = SqliteChannel::initialize(SqliteOptions::new(&path)).unwrap();
    channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]);

    Connection::open(&path)
        .unwrap()
        .execute("UPDATE wow_realm SET timestamp = timestamp - 301", [])
        .unwrap();

    assert!(channel
        .read(EntityType::Realm, &[realm_group("gilneas")])
        .into_vec()
        .is_empty());
    assert_eq!(channel.count(EntityType::Realm).unwrap(), 1);
}

#[test]
fn mirrored_columns_follow_their_data_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wowdata.sqlite");
    let channel = SqliteChannel::initialize(SqliteOptions::new(&path)).unwrap();
    let sword = Record::from_values(
        EntityType::Item,
        [
            ("locale", Value::from("de_DE")),
            ("region", Value::from("eu")),
            ("id", Value::from(19019)),
            ("name", Value::from("Thunderfury")),
            ("icon", Value::from("inv_sword_39")),
            ("overallQualityId", Value::from(5)),
            ("classId", Value::from(2)),
            ("bonding", Value::from(1)),
            ("itemLevel", Value::from(80)),
        ],
    );
    assert!(sword.is_valid());
    assert_eq!(channel.write(EntityType::Item, &[sword]), Handled::Done(vec![true]));

    let (id, qid, ilvl): (i64, i64, i64) = Connection::open(&path)
        .unwrap()
        .query_row("SELECT id, qid, ilvl FROM wow_item", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .unwrap();
    assert_eq!((id, qid, ilvl), (19019, 5, 80));
}

#[test]
fn icon_round_trips_with_its_image() {
    let channel = memory();
    let icon = Record::from_values(
        EntityType::Icon,
        [
            ("region", Value::from("eu")),
            ("icon", Value::from("inv_sword_39")),
            ("image", Value::bytes(PNG)),
        ],
    );
    channel.write(EntityType::Icon, &[icon.clone()]);
    let params = group(&[("region", Value::from("eu")), ("icon", Value::from("inv_sword_39"))]);
    assert_eq!(channel.read(EntityType::Icon, &[params]).into_vec(), vec![icon]);
}

#[test]
fn options_parse_from_toml() {
    let options: SqliteOptions = toml::from_str(
        r#"
        path = ":memory:"

        [schemes.icon]
        enabled = false
        "#,
    )
    .unwrap();
    let channel = SqliteChannel::initialize(options).unwrap();
    assert!(!channel.is_enabled(EntityType::Icon));
    assert!(channel.is_enabled(EntityType::Realm));
}
