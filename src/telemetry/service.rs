use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use super::models::{decode_reading, DecodeError};
use crate::{db::readings, reading_cache::ReadingCache};

pub struct TelemetryService {
    pool: SqlitePool,
    cache: ReadingCache,
}

impl TelemetryService {
    pub fn new(pool: SqlitePool, cache: ReadingCache) -> Self {
        Self { pool, cache }
    }

    /// Decodes one `smartenergy/data` payload, appends it to the store and
    /// overwrites the latest-value cache.
    ///
    /// A decode failure leaves both untouched and is returned to the caller.
    /// A store failure is logged and swallowed; the cache is still updated
    /// so `/api/data` reflects what the meter last reported.
    pub async fn ingest(&self, payload: &[u8]) -> Result<(), DecodeError> {
        let reading = decode_reading(payload, Utc::now().timestamp_millis())?;
        debug!(?reading, "Decoded energy reading");

        match readings::insert(&self.pool, &reading).await {
            Ok(id) => info!(
                id,
                timestamp = reading.timestamp,
                power = reading.power,
                energy = reading.energy,
                relay_state = reading.relay_state,
                "Stored energy reading"
            ),
            Err(e) => error!(timestamp = reading.timestamp, error = %e, "Failed to store energy reading"),
        }

        self.cache.update(reading).await;
        Ok(())
    }
}
