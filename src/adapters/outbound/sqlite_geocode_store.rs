//! SQLite Geocode Store
//!
//! Implements GeocodeRepository and GeocodingRepository using SQLite.
//! The database file may be shared by several processes; uniqueness of the
//! cache key is enforced by the schema, not by locks in this process.

use crate::domain::entities::{Geocode, Geocoding};
use crate::domain::ports::{GeocodeRepository, GeocodingRepository};
use crate::domain::value_objects::{EntityKind, GeocodableRef, Precision};
use crate::error::RepositoryError;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS geocodes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL,
    query       TEXT NOT NULL,
    street      TEXT,
    locality    TEXT,
    region      TEXT,
    postal_code TEXT,
    country     TEXT,
    precision   TEXT NOT NULL DEFAULT 'unknown'
);
CREATE UNIQUE INDEX IF NOT EXISTS geocodes_query_index ON geocodes (query);
CREATE INDEX IF NOT EXISTS geocodes_latitude_index ON geocodes (latitude);
CREATE INDEX IF NOT EXISTS geocodes_longitude_index ON geocodes (longitude);
CREATE INDEX IF NOT EXISTS geocodes_locality_index ON geocodes (locality);
CREATE INDEX IF NOT EXISTS geocodes_region_index ON geocodes (region);
CREATE INDEX IF NOT EXISTS geocodes_postal_code_index ON geocodes (postal_code);
CREATE INDEX IF NOT EXISTS geocodes_country_index ON geocodes (country);
CREATE INDEX IF NOT EXISTS geocodes_precision_index ON geocodes (precision);

CREATE TABLE IF NOT EXISTS geocodings (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    geocodable_id   INTEGER NOT NULL,
    geocode_id      INTEGER NOT NULL REFERENCES geocodes (id) ON DELETE CASCADE,
    geocodable_type TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS geocodings_geocodable_index
    ON geocodings (geocodable_type, geocodable_id);
CREATE INDEX IF NOT EXISTS geocodings_geocodable_id_index ON geocodings (geocodable_id);
CREATE INDEX IF NOT EXISTS geocodings_geocode_id_index ON geocodings (geocode_id);
CREATE INDEX IF NOT EXISTS geocodings_geocodable_type_index ON geocodings (geocodable_type);
";

const GEOCODE_COLUMNS: &str =
    "id, latitude, longitude, query, street, locality, region, postal_code, country, precision";

const GEOCODING_COLUMNS: &str = "id, geocode_id, geocodable_type, geocodable_id";

/// SQLite-backed geocode and geocoding store.
///
/// Every operation opens its own connection on the blocking pool, the
/// same way an independent process would.
pub struct SqliteGeocodeStore {
    db_path: String,
    busy_timeout: Duration,
}

impl SqliteGeocodeStore {
    /// Open (and if needed create) the database at `db_path`.
    pub async fn open(db_path: impl Into<String>) -> Result<Self, RepositoryError> {
        let store = Self {
            db_path: db_path.into(),
            busy_timeout: Duration::from_secs(5),
        };

        store
            .run(|conn| {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                conn.execute_batch(SCHEMA)
            })
            .await?;

        tracing::info!("geocode store ready at {}", store.db_path);
        Ok(store)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn connect(db_path: &str, busy_timeout: Duration) -> rusqlite::Result<Connection> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    /// Run `f` against a fresh connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        let busy_timeout = self.busy_timeout;

        // Not `run`: a foreign key failure is reported as its own error
        let result = tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&db_path, busy_timeout)?;
            f(&conn)
        })
        .await?;

        result.map_err(|e| {
            tracing::error!("geocode store error: {:?}", e);
            RepositoryError::from(e)
        })
    }

    fn select_by_query(conn: &Connection, query: &str) -> rusqlite::Result<Option<Geocode>> {
        conn.query_row(
            &format!("SELECT {} FROM geocodes WHERE query = ?1", GEOCODE_COLUMNS),
            params![query],
            Self::row_to_geocode,
        )
        .optional()
    }

    /// Convert a SQLite row to a Geocode entity.
    fn row_to_geocode(row: &Row) -> rusqlite::Result<Geocode> {
        Ok(Geocode {
            id: Some(row.get(0)?),
            latitude: Some(row.get(1)?),
            longitude: Some(row.get(2)?),
            query: row.get(3)?,
            street: row.get(4)?,
            locality: row.get(5)?,
            region: row.get(6)?,
            postal_code: row.get(7)?,
            country: row.get(8)?,
            precision: Precision::from_str(&row.get::<_, String>(9)?),
        })
    }

    /// Convert a SQLite row to a Geocoding entity.
    fn row_to_geocoding(row: &Row) -> rusqlite::Result<Geocoding> {
        Ok(Geocoding {
            id: row.get(0)?,
            geocode_id: row.get(1)?,
            geocodable: GeocodableRef::new(EntityKind::new(row.get::<_, String>(2)?), row.get(3)?),
        })
    }
}

#[async_trait]
impl GeocodeRepository for SqliteGeocodeStore {
    async fn find_by_query(&self, query: &str) -> Result<Option<Geocode>, RepositoryError> {
        let query = query.to_string();
        self.run(move |conn| Self::select_by_query(conn, &query)).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Geocode>, RepositoryError> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM geocodes WHERE id = ?1", GEOCODE_COLUMNS),
                params![id],
                Self::row_to_geocode,
            )
            .optional()
        })
        .await
    }

    async fn insert_if_absent(&self, geocode: Geocode) -> Result<Geocode, RepositoryError> {
        let (latitude, longitude) = match (geocode.latitude, geocode.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(RepositoryError::Unresolved(geocode.query)),
        };

        self.run(move |conn| {
            // The no-op update makes RETURNING yield the row that holds the
            // key, whoever inserted it, in the same statement
            conn.query_row(
                &format!(
                    "INSERT INTO geocodes
                        (latitude, longitude, query, street, locality, region, postal_code, country, precision)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT (query) DO UPDATE SET query = excluded.query
                     RETURNING {}",
                    GEOCODE_COLUMNS
                ),
                params![
                    latitude,
                    longitude,
                    geocode.query,
                    geocode.street,
                    geocode.locality,
                    geocode.region,
                    geocode.postal_code,
                    geocode.country,
                    geocode.precision.as_str(),
                ],
                Self::row_to_geocode,
            )
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM geocodes WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        self.run(|conn| {
            conn.query_row("SELECT COUNT(*) FROM geocodes", [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
        })
        .await
    }
}

#[async_trait]
impl GeocodingRepository for SqliteGeocodeStore {
    async fn get(&self, entity: &GeocodableRef) -> Result<Option<Geocoding>, RepositoryError> {
        let entity = entity.clone();
        self.run(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM geocodings WHERE geocodable_type = ?1 AND geocodable_id = ?2",
                    GEOCODING_COLUMNS
                ),
                params![entity.kind.as_str(), entity.id],
                Self::row_to_geocoding,
            )
            .optional()
        })
        .await
    }

    async fn set(&self, entity: GeocodableRef, geocode_id: i64) -> Result<Geocoding, RepositoryError> {
        let db_path = self.db_path.clone();
        let busy_timeout = self.busy_timeout;
        let entity_label = entity.to_string();

        // Not `run`: a foreign key failure is reported as its own error
        let result = tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&db_path, busy_timeout)?;
            conn.query_row(
                &format!(
                    "INSERT INTO geocodings (geocodable_id, geocode_id, geocodable_type)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT (geocodable_type, geocodable_id)
                     DO UPDATE SET geocode_id = excluded.geocode_id
                     RETURNING {}",
                    GEOCODING_COLUMNS
                ),
                params![entity.id, geocode_id, entity.kind.as_str()],
                Self::row_to_geocoding,
            )
        })
        .await?;

        result.map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                tracing::warn!("cannot bind {} to missing geocode {}", entity_label, geocode_id);
                RepositoryError::UnknownGeocode(geocode_id)
            }
            e => {
                tracing::error!("geocode store error: {:?}", e);
                RepositoryError::from(e)
            }
        })
    }

    async fn remove(&self, entity: &GeocodableRef) -> Result<bool, RepositoryError> {
        let entity = entity.clone();
        self.run(move |conn| {
            let removed = conn.execute(
                "DELETE FROM geocodings WHERE geocodable_type = ?1 AND geocodable_id = ?2",
                params![entity.kind.as_str(), entity.id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn for_geocode(&self, geocode_id: i64) -> Result<Vec<GeocodableRef>, RepositoryError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT geocodable_type, geocodable_id FROM geocodings
                 WHERE geocode_id = ?1
                 ORDER BY geocodable_type, geocodable_id",
            )?;

            let entities = stmt
                .query_map(params![geocode_id], |row| {
                    Ok(GeocodableRef::new(
                        EntityKind::new(row.get::<_, String>(0)?),
                        row.get(1)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(entities)
        })
        .await
    }

    async fn of_kind(&self, kind: &EntityKind) -> Result<Vec<Geocoding>, RepositoryError> {
        let kind = kind.clone();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM geocodings WHERE geocodable_type = ?1 ORDER BY geocodable_id",
                GEOCODING_COLUMNS
            ))?;

            let geocodings = stmt
                .query_map(params![kind.as_str()], Self::row_to_geocoding)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(geocodings)
        })
        .await
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        self.run(|conn| {
            conn.query_row("SELECT COUNT(*) FROM geocodings", [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
        })
        .await
    }
}
