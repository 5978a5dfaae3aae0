//! SQLite storage tier.
//!
//! Each entity type maps to one table. Configured columns mirror record
//! fields, the `storage` column holds the whole record blob and the
//! optional lifetime column holds the save time. Columns flagged with an
//! open key are matched against the query parameter of the same name.

use crate::error::{StorageError, StorageResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use wowdata_channel::{
    ChannelResult, Handled, ReadHandler, Registration, RegistrationError, Tier, WriteHandler,
};
use wowdata_model::{EntityType, Record};
use wowdata_types::{ParamGroup, Value, unix_now};

/// One mirrored column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlField {
    /// Record field stored in this column.
    pub data_id: String,
    #[serde(default = "default_sql_type")]
    pub sql_type: String,
    /// Query parameter this column is matched against.
    #[serde(default)]
    pub open_key: Option<String>,
}

fn default_sql_type() -> String {
    "TEXT".to_string()
}

/// Expiry rule of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlLifetime {
    #[serde(default = "default_lifetime_field")]
    pub field: String,
    /// Seconds a row stays fresh.
    pub time: i64,
}

fn default_lifetime_field() -> String {
    "timestamp".to_string()
}

/// Table scheme of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlScheme {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub table: String,
    #[serde(default = "default_storage")]
    pub storage: String,
    /// Columns by name.
    #[serde(default)]
    pub fields: BTreeMap<String, SqlField>,
    #[serde(default)]
    pub lifetime: Option<SqlLifetime>,
}

fn default_enabled() -> bool {
    true
}

fn default_storage() -> String {
    "wdo".to_string()
}

impl SqlScheme {
    fn open_keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(column, field)| {
            field
                .open_key
                .as_deref()
                .map(|param| (column.as_str(), param))
        })
    }

    fn lifetime_field(&self) -> Option<&str> {
        self.lifetime.as_ref().map(|l| l.field.as_str())
    }
}

fn field(data_id: &str, sql_type: &str, open_key: Option<&str>) -> SqlField {
    SqlField {
        data_id: data_id.to_string(),
        sql_type: sql_type.to_string(),
        open_key: open_key.map(str::to_string),
    }
}

fn scheme(table: &str, fields: Vec<(&str, SqlField)>, lifetime: Option<i64>) -> SqlScheme {
    SqlScheme {
        enabled: true,
        table: table.to_string(),
        storage: default_storage(),
        fields: fields
            .into_iter()
            .map(|(column, f)| (column.to_string(), f))
            .collect(),
        lifetime: lifetime.map(|time| SqlLifetime {
            field: default_lifetime_field(),
            time,
        }),
    }
}

fn item_columns() -> Vec<(&'static str, SqlField)> {
    vec![
        ("locale", field("locale", "TEXT", Some("locale"))),
        ("region", field("region", "TEXT", Some("region"))),
        ("id", field("id", "INTEGER", Some("itemid"))),
        ("name", field("name", "TEXT", None)),
        ("icon", field("icon", "TEXT", None)),
        ("qid", field("overallQualityId", "INTEGER", None)),
        ("cid", field("classId", "INTEGER", None)),
        ("bonding", field("bonding", "INTEGER", None)),
        ("rlvl", field("requiredLevel", "INTEGER", None)),
        ("ilvl", field("itemLevel", "INTEGER", None)),
    ]
}

/// Built-in table schemes. Guilds are disabled.
pub fn default_sql_schemes() -> BTreeMap<EntityType, SqlScheme> {
    let mut equipped = item_columns();
    equipped.extend([
        ("realm", field("realm", "TEXT", Some("realm"))),
        ("character", field("character", "TEXT", Some("character"))),
        ("slot", field("slotId", "INTEGER", Some("slotid"))),
    ]);

    BTreeMap::from([
        (
            EntityType::Realm,
            scheme(
                "wow_realm",
                vec![
                    ("region", field("region", "TEXT", Some("region"))),
                    ("slug", field("slug", "TEXT", Some("realm"))),
                    ("name", field("name", "TEXT", None)),
                    ("type", field("type", "TEXT", None)),
                    ("population", field("population", "TEXT", None)),
                    ("queue", field("queue", "INTEGER", None)),
                    ("status", field("status", "INTEGER", None)),
                ],
                Some(300),
            ),
        ),
        (EntityType::Item, scheme("wow_item", item_columns(), Some(2_592_000))),
        (
            EntityType::ItemEquipped,
            scheme("wow_item_equipped", equipped, Some(259_200)),
        ),
        (
            EntityType::Character,
            scheme(
                "wow_character",
                vec![
                    ("locale", field("locale", "TEXT", Some("locale"))),
                    ("region", field("region", "TEXT", Some("region"))),
                    ("realm", field("realm", "TEXT", Some("realm"))),
                    ("name", field("name", "TEXT", Some("character"))),
                ],
                Some(86_400),
            ),
        ),
        (
            EntityType::CharacterThumbnail,
            scheme(
                "wow_character_thumbnail",
                vec![
                    ("region", field("region", "TEXT", Some("region"))),
                    ("filename", field("filename", "TEXT", Some("filename"))),
                    ("image", field("image", "BLOB", None)),
                ],
                Some(2_592_000),
            ),
        ),
        (
            EntityType::Guild,
            SqlScheme {
                enabled: false,
                ..scheme("wow_guild", Vec::new(), None)
            },
        ),
        (
            EntityType::Icon,
            scheme(
                "wow_icon",
                vec![
                    ("region", field("region", "TEXT", Some("region"))),
                    ("icon", field("icon", "TEXT", Some("icon"))),
                    ("image", field("image", "BLOB", None)),
                ],
                None,
            ),
        ),
    ])
}

/// Options of a [`SqliteChannel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteOptions {
    /// Database file; `:memory:` opens a private in-memory database.
    pub path: PathBuf,
    /// Overrides of the built-in schemes, by entity type.
    #[serde(default)]
    pub schemes: BTreeMap<EntityType, SqlScheme>,
}

impl SqliteOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schemes: BTreeMap::new(),
        }
    }

    fn merged_schemes(&self) -> BTreeMap<EntityType, SqlScheme> {
        let mut schemes = default_sql_schemes();
        schemes.extend(self.schemes.clone());
        schemes
    }

    fn connect(&self) -> StorageResult<Connection> {
        if self.path.as_os_str() == ":memory:" {
            Ok(Connection::open_in_memory()?)
        } else {
            Ok(Connection::open(&self.path)?)
        }
    }
}

/// SQLite storage tier.
pub struct SqliteChannel {
    conn: Arc<Mutex<Connection>>,
    registration: Registration<SqliteChannel, SqlScheme>,
}

impl SqliteChannel {
    /// Opens an existing database and checks every enabled scheme against it.
    pub fn open(options: SqliteOptions) -> StorageResult<Self> {
        let conn = options.connect()?;
        Self::register(conn, options.merged_schemes())
    }

    /// Opens the database, creates missing tables, then registers as [`SqliteChannel::open`].
    pub fn initialize(options: SqliteOptions) -> StorageResult<Self> {
        let conn = options.connect()?;
        let schemes = options.merged_schemes();
        for (entity, scheme) in schemes.iter().filter(|(_, s)| s.enabled) {
            create_table(&conn, *entity, scheme)?;
        }
        Self::register(conn, schemes)
    }

    fn register(conn: Connection, schemes: BTreeMap<EntityType, SqlScheme>) -> StorageResult<Self> {
        let mut registration = Registration::new("sqlite");
        for (entity, scheme) in schemes {
            if !scheme.enabled {
                registration.scheme(entity, None);
                continue;
            }
            check_scheme(&conn, entity, &scheme)?;
            registration
                .scheme(entity, Some(scheme))
                .on_read(entity, ReadHandler::Batch(Self::read_rows))
                .on_write(entity, WriteHandler::Batch(Self::write_rows));
        }
        registration.check()?;

        info!(
            "SQLite tier serving {} entity types",
            registration.enabled().count()
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            registration,
        })
    }

    fn scheme(&self, entity: EntityType) -> StorageResult<&SqlScheme> {
        self.registration.scheme_of(entity).ok_or_else(|| {
            RegistrationError::Backend(format!("no table scheme for {entity}")).into()
        })
    }

    /// Number of rows stored for an entity type, fresh or not.
    pub fn count(&self, entity: EntityType) -> StorageResult<usize> {
        let scheme = self.scheme(entity)?;
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(&scheme.table)),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn read_rows(&self, entity: EntityType, groups: &[ParamGroup]) -> ChannelResult<Vec<Record>> {
        Ok(self.select(entity, groups)?)
    }

    fn write_rows(&self, entity: EntityType, records: &[Record]) -> ChannelResult<Vec<bool>> {
        Ok(self.save(entity, records)?)
    }

    fn select(&self, entity: EntityType, groups: &[ParamGroup]) -> StorageResult<Vec<Record>> {
        let scheme = self.scheme(entity)?;
        let keys: Vec<(&str, &str)> = scheme.open_keys().collect();

        let mut predicates = Vec::new();
        let mut bound: Vec<SqlValue> = Vec::new();
        for group in groups {
            let Some(values) = keys
                .iter()
                .map(|(_, param)| group.get(*param))
                .collect::<Option<Vec<&Value>>>()
            else {
                debug!(entity = %entity, "group lacks an open key, skipped");
                continue;
            };
            let terms: Vec<String> = keys
                .iter()
                .zip(values)
                .map(|((column, _), value)| {
                    bound.push(sql_value(value));
                    format!("{} = ?{}", quote(column), bound.len())
                })
                .collect();
            predicates.push(if terms.is_empty() {
                "1".to_string()
            } else {
                format!("({})", terms.join(" AND "))
            });
        }
        if predicates.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT {} FROM {} WHERE ({})",
            quote(&scheme.storage),
            quote(&scheme.table),
            predicates.join(" OR ")
        );
        match &scheme.lifetime {
            Some(lifetime) => {
                bound.push(SqlValue::Integer(unix_now() - lifetime.time));
                sql.push_str(&format!(
                    " AND {} > ?{} ORDER BY {} DESC",
                    quote(&lifetime.field),
                    bound.len(),
                    quote(&lifetime.field)
                ));
            }
            None => sql.push_str(" ORDER BY rowid DESC"),
        }
        sql.push_str(&format!(" LIMIT {}", predicates.len()));

        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(&sql)?;
        let blobs = stmt
            .query_map(params_from_iter(bound), |row| row.get::<_, Vec<u8>>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let records = blobs
            .iter()
            .filter_map(|blob| match Record::from_blob_of(entity, blob) {
                Ok(record) if record.is_valid() => Some(record),
                Ok(_) => None,
                Err(e) => {
                    debug!(entity = %entity, "unreadable row: {e}");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    fn save(&self, entity: EntityType, records: &[Record]) -> StorageResult<Vec<bool>> {
        let scheme = self.scheme(entity)?;
        let mut columns: Vec<&str> = scheme.fields.keys().map(String::as_str).collect();
        columns.push(&scheme.storage);
        if let Some(lifetime) = scheme.lifetime_field() {
            columns.push(lifetime);
        }
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote(&scheme.table),
            columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", "),
            (1..=columns.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction()?;
        let mut results = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare(&sql)?;
            let now = unix_now();
            for record in records {
                if record.entity() != entity || !record.is_valid() {
                    results.push(false);
                    continue;
                }
                let mut row: Vec<SqlValue> = scheme
                    .fields
                    .values()
                    .map(|f| record.get(&f.data_id).map(sql_value).unwrap_or(SqlValue::Null))
                    .collect();
                row.push(SqlValue::Blob(record.to_blob()?));
                if scheme.lifetime.is_some() {
                    row.push(SqlValue::Integer(now));
                }
                stmt.execute(params_from_iter(row))?;
                results.push(true);
            }
        }
        tx.commit()?;
        Ok(results)
    }
}

impl Tier for SqliteChannel {
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

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_sql_type(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Str(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::List(_) | Value::Map(_) => SqlValue::Text(value.to_json().to_string()),
    }
}

fn table_columns(conn: &Connection, table: &str) -> StorageResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(columns)
}

/// Checks a scheme against the schema of its entity and the database.
fn check_scheme(conn: &Connection, entity: EntityType, scheme: &SqlScheme) -> StorageResult<()> {
    let invalid = |option: String, reason: String| {
        StorageError::from(RegistrationError::InvalidOption { option, reason })
    };

    if scheme.table.trim().is_empty() {
        return Err(RegistrationError::MissingOption(format!("schemes/{entity}/table")).into());
    }
    if !is_identifier(&scheme.table) {
        return Err(invalid(
            format!("schemes/{entity}/table"),
            format!("{:?} is not a plain identifier", scheme.table),
        ));
    }
    let columns = table_columns(conn, &scheme.table)?;
    if columns.is_empty() {
        return Err(RegistrationError::MissingTable(scheme.table.clone()).into());
    }

    if scheme.fields.is_empty() {
        return Err(RegistrationError::MissingOption(format!("schemes/{entity}/fields")).into());
    }
    for column in scheme.fields.keys() {
        if !columns.contains(column) {
            return Err(RegistrationError::MissingColumn {
                table: scheme.table.clone(),
                column: column.clone(),
            }
            .into());
        }
    }

    let schema = entity.schema();
    for f in scheme.fields.values() {
        if !schema.declares(&f.data_id) {
            return Err(RegistrationError::UndeclaredField {
                entity,
                field: f.data_id.clone(),
            }
            .into());
        }
    }

    if !columns.contains(&scheme.storage) {
        return Err(RegistrationError::MissingColumn {
            table: scheme.table.clone(),
            column: scheme.storage.clone(),
        }
        .into());
    }

    if let Some(lifetime) = &scheme.lifetime {
        if !columns.contains(&lifetime.field) {
            return Err(RegistrationError::MissingColumn {
                table: scheme.table.clone(),
                column: lifetime.field.clone(),
            }
            .into());
        }
        if lifetime.time < 1 {
            return Err(invalid(
                format!("schemes/{entity}/lifetime/time"),
                format!("{} is not a positive number of seconds", lifetime.time),
            ));
        }
    }
    Ok(())
}

/// Creates the table of a scheme and a unique index over its open keys.
fn create_table(conn: &Connection, entity: EntityType, scheme: &SqlScheme) -> StorageResult<()> {
    let names = scheme
        .fields
        .keys()
        .chain(std::iter::once(&scheme.storage))
        .chain(scheme.lifetime.as_ref().map(|l| &l.field));
    for name in std::iter::once(&scheme.table).chain(names) {
        if !is_identifier(name) {
            return Err(RegistrationError::InvalidOption {
                option: format!("schemes/{entity}"),
                reason: format!("{name:?} is not a plain identifier"),
            }
            .into());
        }
    }

    let mut definitions = Vec::new();
    for (column, f) in &scheme.fields {
        if !is_sql_type(&f.sql_type) {
            return Err(RegistrationError::InvalidOption {
                option: format!("schemes/{entity}/fields/{column}/sql_type"),
                reason: format!("{:?} is not a column type", f.sql_type),
            }
            .into());
        }
        definitions.push(format!("{} {}", quote(column), f.sql_type));
    }
    definitions.push(format!("{} BLOB NOT NULL", quote(&scheme.storage)));
    if let Some(lifetime) = scheme.lifetime_field() {
        definitions.push(format!("{} INTEGER NOT NULL", quote(lifetime)));
    }

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quote(&scheme.table),
        definitions.join(", ")
    );
    let keys: Vec<String> = scheme.open_keys().map(|(column, _)| quote(column)).collect();
    if !keys.is_empty() {
        sql.push_str(&format!(
            "\nCREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({});",
            quote(&format!("{}_open_keys", scheme.table)),
            quote(&scheme.table),
            keys.join(", ")
        ));
    }
    conn.execute_batch(&sql)?;
    debug!(entity = %entity, table = %scheme.table, "table ready");
    Ok(())
}
