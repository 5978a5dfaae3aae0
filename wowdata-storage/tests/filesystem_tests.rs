use pretty_assertions::assert_eq;
use std::fs;
use std::time::{Duration, SystemTime};
use wowdata_channel::{Handled, RegistrationError, Tier};
use wowdata_model::{EntityType, Record};
use wowdata_storage::{FileScheme, FilesystemChannel, FilesystemOptions, StorageError};
use wowdata_types::{ParamGroup, Value};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

fn group(pairs: &[(&str, Value)]) -> ParamGroup {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn channel(dir: &tempfile::TempDir) -> FilesystemChannel {
    FilesystemChannel::new(FilesystemOptions::new(dir.path())).unwrap()
}

fn realm(name: &str, slug: &str) -> Record {
    Record::from_values(
        EntityType::Realm,
        [
            ("region", Value::from("eu")),
            ("slug", Value::from(slug)),
            ("name", Value::from(name)),
            ("type", Value::from("pvp")),
            ("population", Value::from("high")),
            ("queue", Value::from(false)),
            ("status", Value::from(true)),
        ],
    )
}

fn thrall() -> Record {
    Record::from_values(
        EntityType::Character,
        [
            ("locale", Value::from("de_DE")),
            ("region", Value::from("eu")),
            ("realm", Value::from("gilneas")),
            ("name", Value::from("Thrall")),
            ("classid", Value::from(7)),
            ("raceid", Value::from(2)),
            ("genderid", Value::from(0)),
            ("level", Value::from(100)),
            ("achievementPoints", Value::from(12345)),
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

fn age(path: &std::path::Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(secs))
        .unwrap();
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn missing_base_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = FilesystemChannel::new(FilesystemOptions::new(dir.path().join("nope")))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        StorageError::Registration(RegistrationError::InvalidOption { .. })
    ));
    assert_eq!(err.code(), 500);
}

#[test]
fn base_path_pointing_at_a_file_is_rejected() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let err = FilesystemChannel::new(FilesystemOptions::new(file.path()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        StorageError::Registration(RegistrationError::InvalidOption { .. })
    ));
}

#[test]
fn empty_base_path_is_a_missing_option() {
    let err = FilesystemChannel::new(FilesystemOptions::new("")).err().unwrap();
    assert!(matches!(
        err,
        StorageError::Registration(RegistrationError::MissingOption(_))
    ));
}

#[test]
fn scheme_without_file_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = FilesystemOptions::new(dir.path());
    options.schemes.insert(
        EntityType::Realm,
        FileScheme {
            enabled: true,
            ext_path: "{region}/realms/".into(),
            file_name: String::new(),
            lifetime_secs: Some(300),
        },
    );
    let err = FilesystemChannel::new(options).err().unwrap();
    assert_eq!(
        err.to_string(),
        RegistrationError::MissingOption("schemes/realm/file_name".into()).to_string()
    );
}

#[test]
fn non_positive_lifetime_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = FilesystemOptions::new(dir.path());
    options.schemes.insert(
        EntityType::Icon,
        FileScheme {
            enabled: true,
            ext_path: "icons".into(),
            file_name: "{icon}.jpg".into(),
            lifetime_secs: Some(0),
        },
    );
    assert!(FilesystemChannel::new(options).is_err());
}

#[test]
fn options_parse_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        "base_path = {:?}\n[schemes.guild]\nenabled = false\n",
        dir.path().display().to_string()
    );
    let options: FilesystemOptions = toml::from_str(&toml).unwrap();
    let channel = FilesystemChannel::new(options).unwrap();
    assert!(!channel.is_enabled(EntityType::Guild));
    assert!(channel.is_enabled(EntityType::Realm));
    assert_eq!(
        channel.read(EntityType::Guild, &[realm_group("gilneas")]),
        Handled::Refused
    );
}

// ── Paths ────────────────────────────────────────────────────────

#[test]
fn realm_path_uses_prepared_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    let path = channel
        .path_for(
            EntityType::Realm,
            &group(&[("region", Value::from(" EU ")), ("realm", Value::from("Die Nachtwache"))]),
        )
        .unwrap();
    assert_eq!(path, dir.path().join("eu/realms/die-nachtwache.txt"));
}

#[test]
fn item_path_shortens_the_locale() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    let path = channel
        .path_for(
            EntityType::Item,
            &group(&[
                ("region", Value::from("eu")),
                ("locale", Value::from("de_DE")),
                ("itemid", Value::from("19019")),
            ]),
        )
        .unwrap();
    assert_eq!(path, dir.path().join("eu/items/19019.de.txt"));
}

#[test]
fn missing_placeholder_value_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    assert!(channel
        .path_for(EntityType::Realm, &group(&[("region", Value::from("eu"))]))
        .is_err());
}

#[test]
fn paths_never_leave_the_base_directory() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    let params = group(&[
        ("region", Value::from("eu")),
        ("filename", Value::from("../../etc/passwd")),
    ]);
    assert!(channel.path_for(EntityType::CharacterThumbnail, &params).is_err());
}

// ── Reading and writing ──────────────────────────────────────────

#[test]
fn written_realm_reads_back_equal() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    let gilneas = realm("Gilneas", "gilneas");

    assert_eq!(
        channel.write(EntityType::Realm, &[gilneas.clone()]),
        Handled::Done(vec![true])
    );
    assert!(dir.path().join("eu/realms/gilneas.txt").is_file());
    assert_eq!(
        channel.read(EntityType::Realm, &[realm_group("gilneas")]),
        Handled::Done(vec![gilneas])
    );
}

#[test]
fn absent_file_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    assert_eq!(
        channel.read(EntityType::Realm, &[realm_group("blackhand")]),
        Handled::Done(Vec::new())
    );
}

#[test]
fn fresh_file_is_not_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]);
    assert_eq!(
        channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]),
        Handled::Done(vec![false])
    );
}

#[test]
fn expired_file_is_a_miss_and_gets_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]);
    let path = dir.path().join("eu/realms/gilneas.txt");
    age(&path, 301);

    assert_eq!(
        channel.read(EntityType::Realm, &[realm_group("gilneas")]),
        Handled::Done(Vec::new())
    );
    assert_eq!(
        channel.write(EntityType::Realm, &[realm("Gilneas", "gilneas")]),
        Handled::Done(vec![true])
    );
}

#[test]
fn character_files_live_below_their_realm() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    channel.write(EntityType::Character, &[thrall()]);
    assert!(dir
        .path()
        .join("eu/characters/realms/gilneas/thrall.de.txt")
        .is_file());

    let mut params = realm_group("gilneas");
    params.insert("character".into(), Value::from("Thrall"));
    assert_eq!(
        channel.read(EntityType::Character, &[params]).into_vec(),
        vec![thrall()]
    );
}

#[test]
fn corrupt_file_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    fs::create_dir_all(dir.path().join("eu/realms")).unwrap();
    fs::write(dir.path().join("eu/realms/gilneas.txt"), b"not a record").unwrap();
    assert!(channel
        .read(EntityType::Realm, &[realm_group("gilneas")])
        .into_vec()
        .is_empty());
}

#[test]
fn blob_of_another_entity_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    fs::create_dir_all(dir.path().join("eu/realms")).unwrap();
    fs::write(
        dir.path().join("eu/realms/gilneas.txt"),
        thrall().to_blob().unwrap(),
    )
    .unwrap();
    assert!(channel
        .read(EntityType::Realm, &[realm_group("gilneas")])
        .into_vec()
        .is_empty());
}

// ── Images ───────────────────────────────────────────────────────

#[test]
fn icon_is_stored_as_raw_image_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    let icon = Record::from_values(
        EntityType::Icon,
        [
            ("region", Value::from("eu")),
            ("icon", Value::from("inv_sword_39")),
            ("image", Value::bytes(JPEG)),
        ],
    );
    assert!(icon.is_valid());

    channel.write(EntityType::Icon, &[icon.clone()]);
    let path = dir.path().join("eu/icons/inv_sword_39.jpg");
    assert_eq!(fs::read(&path).unwrap(), JPEG);

    // icons never expire
    age(&path, 10 * 365 * 86_400);
    let params = group(&[("region", Value::from("eu")), ("icon", Value::from("inv_sword_39"))]);
    assert_eq!(channel.read(EntityType::Icon, &[params]).into_vec(), vec![icon]);
}

#[test]
fn thumbnail_keeps_its_nested_path() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    let thumbnail = Record::from_values(
        EntityType::CharacterThumbnail,
        [
            ("region", Value::from("eu")),
            ("filename", Value::from("gilneas/12/3456-avatar.jpg")),
            ("image", Value::bytes(JPEG)),
        ],
    );
    channel.write(EntityType::CharacterThumbnail, &[thumbnail.clone()]);
    assert!(dir
        .path()
        .join("eu/characters/thumbnails/gilneas/12/3456-avatar.jpg")
        .is_file());

    let params = group(&[
        ("region", Value::from("eu")),
        ("filename", Value::from("gilneas/12/3456-avatar.jpg")),
    ]);
    assert_eq!(
        channel.read(EntityType::CharacterThumbnail, &[params]).into_vec(),
        vec![thumbnail]
    );
}

#[test]
fn non_image_file_yields_an_invalid_record() {
    let dir = tempfile::tempdir().unwrap();
    let channel = channel(&dir);
    fs::create_dir_all(dir.path().join("eu/icons")).unwrap();
    fs::write(dir.path().join("eu/icons/broken.jpg"), b"plain text").unwrap();

    let params = group(&[("region", Value::from("eu")), ("icon", Value::from("broken"))]);
    let found = channel.read(EntityType::Icon, &[params]).into_vec();
    assert_eq!(found.len(), 1);
    assert!(!found[0].is_valid());
}
