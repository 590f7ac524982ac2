use thiserror::Error;

// Primary SQLite result codes; extended codes keep these in the low byte
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}, precision {precision}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        precision: usize,
    },

    #[error("invalid geohash: {0}")]
    InvalidGeohash(String),

    #[error("invalid MAC address: {0:?}")]
    InvalidMacAddress(String),

    #[error("detection references unknown device {0}")]
    ForeignKeyViolation(String),

    #[error("detection store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("database error")]
    Database(#[source] sqlx::Error),

    #[error("migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl TrackerError {
    /// Classify a sqlx error. `mac` names the device the statement was about,
    /// so a foreign key failure can report which parent row was missing.
    pub fn from_sqlx(err: sqlx::Error, mac: Option<&str>) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_foreign_key_violation() {
                return Self::ForeignKeyViolation(mac.unwrap_or_default().to_string());
            }
            if is_lock_contention(db.code().as_deref()) {
                return Self::StoreUnavailable(err);
            }
        }

        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::StoreUnavailable(err)
            }
            other => Self::Database(other),
        }
    }

    /// Rejections caused by the sighting itself rather than the store.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCoordinate { .. } | Self::InvalidGeohash(_) | Self::InvalidMacAddress(_)
        )
    }
}

/// SQLite gave up waiting for another connection's lock.
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

impl From<sqlx::Error> for TrackerError {
    fn from(err: sqlx::Error) -> Self {
        Self::from_sqlx(err, None)
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
