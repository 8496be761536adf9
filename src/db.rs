use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Fixed identity of the SiteInfo singleton row.
pub const SITE_INFO_ID: i64 = 1;

// ============================================================================
// Wire / date conventions
// ============================================================================

/// Parse an incoming calendar-date string.
///
/// Callers may send a bare `YYYY-MM-DD` or a full ISO timestamp; only the
/// first 10 characters are significant. Returns `None` when those characters
/// are not a valid calendar date.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Event dates are stored as plain calendar dates but serialized as a
/// midnight-UTC timestamp, so the first 10 characters of the wire value are
/// always the `YYYY-MM-DD` date. Existing clients truncate to 10 characters
/// for display and equality, and that contract must not change.
pub mod event_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(de)?;
        super::parse_event_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid calendar date: {raw}")))
    }
}

// ============================================================================
// Models
// ============================================================================

/// A commemorated warrior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub picture: Option<String>,
    #[serde(with = "event_date")]
    pub date: NaiveDate,
}

/// A dated news item; `is_crime` marks it for the public archive view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub picture: Option<String>,
    #[serde(with = "event_date")]
    pub date: NaiveDate,
    pub is_crime: bool,
}

/// A free-standing archive entry, ordered by creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Singleton site text: leader, post-revolution plan, about texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub id: i64,
    pub leader_name: Option<String>,
    pub leader_description: Option<String>,
    pub after_revolution_plan: Option<String>,
    pub about_website: Option<String>,
    pub new_government_information: Option<String>,
}

/// Validated mutable fields of a Person. Create and update both take the
/// full set; an update replaces every field at once.
#[derive(Debug, Clone)]
pub struct PersonFields {
    pub name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub picture: Option<String>,
    pub date: NaiveDate,
}

/// Validated mutable fields of a News item.
#[derive(Debug, Clone)]
pub struct NewsFields {
    pub title: String,
    pub description: String,
    pub picture: Option<String>,
    pub date: NaiveDate,
    pub is_crime: bool,
}

/// Mutable fields of an ArchiveItem (creation timestamp is store-assigned).
#[derive(Debug, Clone)]
pub struct ArchiveFields {
    pub title: String,
    pub description: String,
    pub picture: Option<String>,
}

/// SiteInfo fields; everything is optional free text.
#[derive(Debug, Clone, Default)]
pub struct SiteInfoFields {
    pub leader_name: Option<String>,
    pub leader_description: Option<String>,
    pub after_revolution_plan: Option<String>,
    pub about_website: Option<String>,
    pub new_government_information: Option<String>,
}

// ============================================================================
// Schema
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // AUTOINCREMENT keeps deleted identities from ever being reassigned.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            age INTEGER,
            picture TEXT,
            date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS news (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            picture TEXT,
            date TEXT NOT NULL,
            is_crime INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS archive (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            picture TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS site_info (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            leader_name TEXT,
            leader_description TEXT,
            after_revolution_plan TEXT,
            about_website TEXT,
            new_government_information TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_persons_date ON persons(date)",
        [],
    )?;

    conn.execute("CREATE INDEX IF NOT EXISTS idx_news_date ON news(date)", [])?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_news_is_crime ON news(is_crime)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// Persons
// ============================================================================

fn person_from_row(row: &Row) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        last_name: row.get(2)?,
        age: row.get(3)?,
        picture: row.get(4)?,
        date: row.get(5)?,
    })
}

pub fn insert_person(conn: &Connection, fields: &PersonFields) -> Result<Person> {
    conn.execute(
        "INSERT INTO persons (name, last_name, age, picture, date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fields.name,
            fields.last_name,
            fields.age,
            fields.picture,
            fields.date,
        ],
    )?;

    Ok(Person {
        id: conn.last_insert_rowid(),
        name: fields.name.clone(),
        last_name: fields.last_name.clone(),
        age: fields.age,
        picture: fields.picture.clone(),
        date: fields.date,
    })
}

pub fn get_person(conn: &Connection, id: i64) -> Result<Option<Person>> {
    let person = conn
        .query_row(
            "SELECT id, name, last_name, age, picture, date FROM persons WHERE id = ?1",
            params![id],
            person_from_row,
        )
        .optional()?;

    Ok(person)
}

/// All persons, newest event date first. Ties break by identity ascending.
pub fn list_persons(conn: &Connection) -> Result<Vec<Person>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, last_name, age, picture, date FROM persons
         ORDER BY date DESC, id ASC",
    )?;

    let persons = stmt
        .query_map([], person_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(persons)
}

pub fn latest_persons(conn: &Connection, limit: u32) -> Result<Vec<Person>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, last_name, age, picture, date FROM persons
         ORDER BY date DESC, id ASC
         LIMIT ?1",
    )?;

    let persons = stmt
        .query_map(params![limit], person_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(persons)
}

pub fn count_persons(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;

    Ok(count)
}

/// Replace every mutable field of a person. Returns `None` when the identity
/// does not exist; identity itself never changes.
pub fn update_person(conn: &Connection, id: i64, fields: &PersonFields) -> Result<Option<Person>> {
    let changed = conn.execute(
        "UPDATE persons SET name = ?1, last_name = ?2, age = ?3, picture = ?4, date = ?5
         WHERE id = ?6",
        params![
            fields.name,
            fields.last_name,
            fields.age,
            fields.picture,
            fields.date,
            id,
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }

    Ok(Some(Person {
        id,
        name: fields.name.clone(),
        last_name: fields.last_name.clone(),
        age: fields.age,
        picture: fields.picture.clone(),
        date: fields.date,
    }))
}

/// Idempotent: deleting an absent identity is success, not an error.
/// Returns whether a row was actually removed.
pub fn delete_person(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM persons WHERE id = ?1", params![id])?;

    Ok(removed > 0)
}

// ============================================================================
// News
// ============================================================================

fn news_from_row(row: &Row) -> rusqlite::Result<News> {
    Ok(News {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        picture: row.get(3)?,
        date: row.get(4)?,
        is_crime: row.get(5)?,
    })
}

pub fn insert_news(conn: &Connection, fields: &NewsFields) -> Result<News> {
    conn.execute(
        "INSERT INTO news (title, description, picture, date, is_crime)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fields.title,
            fields.description,
            fields.picture,
            fields.date,
            fields.is_crime,
        ],
    )?;

    Ok(News {
        id: conn.last_insert_rowid(),
        title: fields.title.clone(),
        description: fields.description.clone(),
        picture: fields.picture.clone(),
        date: fields.date,
        is_crime: fields.is_crime,
    })
}

pub fn get_news(conn: &Connection, id: i64) -> Result<Option<News>> {
    let item = conn
        .query_row(
            "SELECT id, title, description, picture, date, is_crime FROM news WHERE id = ?1",
            params![id],
            news_from_row,
        )
        .optional()?;

    Ok(item)
}

pub fn list_news(conn: &Connection) -> Result<Vec<News>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, picture, date, is_crime FROM news
         ORDER BY date DESC, id ASC",
    )?;

    let items = stmt
        .query_map([], news_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn latest_news(conn: &Connection, limit: u32) -> Result<Vec<News>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, picture, date, is_crime FROM news
         ORDER BY date DESC, id ASC
         LIMIT ?1",
    )?;

    let items = stmt
        .query_map(params![limit], news_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

/// The public archive view: crime-flagged news only, newest first.
pub fn list_crime_news(conn: &Connection, limit: Option<u32>) -> Result<Vec<News>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, picture, date, is_crime FROM news
         WHERE is_crime = 1
         ORDER BY date DESC, id ASC
         LIMIT ?1",
    )?;

    // SQLite treats a negative LIMIT as unbounded
    let limit = limit.map(i64::from).unwrap_or(-1);

    let items = stmt
        .query_map(params![limit], news_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn update_news(conn: &Connection, id: i64, fields: &NewsFields) -> Result<Option<News>> {
    let changed = conn.execute(
        "UPDATE news SET title = ?1, description = ?2, picture = ?3, date = ?4, is_crime = ?5
         WHERE id = ?6",
        params![
            fields.title,
            fields.description,
            fields.picture,
            fields.date,
            fields.is_crime,
            id,
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }

    Ok(Some(News {
        id,
        title: fields.title.clone(),
        description: fields.description.clone(),
        picture: fields.picture.clone(),
        date: fields.date,
        is_crime: fields.is_crime,
    }))
}

pub fn delete_news(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM news WHERE id = ?1", params![id])?;

    Ok(removed > 0)
}

// ============================================================================
// Archive
// ============================================================================

fn archive_from_row(row: &Row) -> rusqlite::Result<ArchiveItem> {
    Ok(ArchiveItem {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        picture: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_archive(conn: &Connection, fields: &ArchiveFields) -> Result<ArchiveItem> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO archive (title, description, picture, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![fields.title, fields.description, fields.picture, created_at],
    )?;

    Ok(ArchiveItem {
        id: conn.last_insert_rowid(),
        title: fields.title.clone(),
        description: fields.description.clone(),
        picture: fields.picture.clone(),
        created_at,
    })
}

pub fn get_archive(conn: &Connection, id: i64) -> Result<Option<ArchiveItem>> {
    let item = conn
        .query_row(
            "SELECT id, title, description, picture, created_at FROM archive WHERE id = ?1",
            params![id],
            archive_from_row,
        )
        .optional()?;

    Ok(item)
}

/// All archive entries, most recently created first. Same-instant entries
/// break by identity descending so newer rows still lead.
pub fn list_archive(conn: &Connection) -> Result<Vec<ArchiveItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, picture, created_at FROM archive
         ORDER BY created_at DESC, id DESC",
    )?;

    let items = stmt
        .query_map([], archive_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Replace the mutable fields of an archive entry. The creation timestamp
/// is immutable and survives the update.
pub fn update_archive(
    conn: &Connection,
    id: i64,
    fields: &ArchiveFields,
) -> Result<Option<ArchiveItem>> {
    let changed = conn.execute(
        "UPDATE archive SET title = ?1, description = ?2, picture = ?3 WHERE id = ?4",
        params![fields.title, fields.description, fields.picture, id],
    )?;

    if changed == 0 {
        return Ok(None);
    }

    get_archive(conn, id)
}

pub fn delete_archive(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM archive WHERE id = ?1", params![id])?;

    Ok(removed > 0)
}

// ============================================================================
// SiteInfo singleton
// ============================================================================

pub fn get_site_info(conn: &Connection) -> Result<Option<SiteInfo>> {
    let info = conn
        .query_row(
            "SELECT id, leader_name, leader_description, after_revolution_plan,
                    about_website, new_government_information
             FROM site_info WHERE id = ?1",
            params![SITE_INFO_ID],
            |row| {
                Ok(SiteInfo {
                    id: row.get(0)?,
                    leader_name: row.get(1)?,
                    leader_description: row.get(2)?,
                    after_revolution_plan: row.get(3)?,
                    about_website: row.get(4)?,
                    new_government_information: row.get(5)?,
                })
            },
        )
        .optional()?;

    Ok(info)
}

/// Create-or-replace the singleton. The identity is fixed; the record is
/// never deleted.
pub fn upsert_site_info(conn: &Connection, fields: &SiteInfoFields) -> Result<SiteInfo> {
    conn.execute(
        "INSERT INTO site_info (
            id, leader_name, leader_description, after_revolution_plan,
            about_website, new_government_information
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            leader_name = excluded.leader_name,
            leader_description = excluded.leader_description,
            after_revolution_plan = excluded.after_revolution_plan,
            about_website = excluded.about_website,
            new_government_information = excluded.new_government_information",
        params![
            SITE_INFO_ID,
            fields.leader_name,
            fields.leader_description,
            fields.after_revolution_plan,
            fields.about_website,
            fields.new_government_information,
        ],
    )?;

    Ok(SiteInfo {
        id: SITE_INFO_ID,
        leader_name: fields.leader_name.clone(),
        leader_description: fields.leader_description.clone(),
        after_revolution_plan: fields.after_revolution_plan.clone(),
        about_website: fields.about_website.clone(),
        new_government_information: fields.new_government_information.clone(),
    })
}
