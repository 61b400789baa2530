use sqlx::SqlitePool;

use super::models::{Reading, TimeRange};

/// Append `reading` and return the row id assigned by SQLite.
pub async fn insert(pool: &SqlitePool, reading: &Reading) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO energy_data
            (voltage, current, power, energy, frequency, power_factor, relay_state, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(reading.voltage)
    .bind(reading.current)
    .bind(reading.power)
    .bind(reading.energy)
    .bind(reading.frequency)
    .bind(reading.power_factor)
    .bind(reading.relay_state)
    .bind(reading.timestamp)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent reading by `timestamp`, or `None` when the table is empty.
pub async fn latest(pool: &SqlitePool) -> Result<Option<Reading>, sqlx::Error> {
    sqlx::query_as::<_, Reading>(
        r#"
        SELECT voltage, current, power, energy, frequency,
               power_factor, relay_state, timestamp
        FROM energy_data
        ORDER BY timestamp DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

/// All readings inside `range`, newest first.
///
/// Without both bounds this is a full table scan.
pub async fn range(pool: &SqlitePool, range: TimeRange) -> Result<Vec<Reading>, sqlx::Error> {
    match range.bounds() {
        Some((start, end)) => {
            sqlx::query_as::<_, Reading>(
                r#"
                SELECT voltage, current, power, energy, frequency,
                       power_factor, relay_state, timestamp
                FROM energy_data
                WHERE timestamp >= ? AND timestamp <= ?
                ORDER BY timestamp DESC
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Reading>(
                r#"
                SELECT voltage, current, power, energy, frequency,
                       power_factor, relay_state, timestamp
                FROM energy_data
                ORDER BY timestamp DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use sqlx::SqlitePool;

    use super::*;

    pub(crate) fn reading_at(timestamp: i64, energy: f64, power: f64) -> Reading {
        Reading {
            voltage: 230.0,
            current: power / 230.0,
            power,
            energy,
            frequency: 50.0,
            power_factor: 0.95,
            relay_state: true,
            timestamp,
        }
    }

    async fn count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM energy_data")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn insert_assigns_increasing_ids(pool: SqlitePool) {
        let a = insert(&pool, &reading_at(1_000, 1.0, 10.0)).await.unwrap();
        let b = insert(&pool, &reading_at(2_000, 1.0, 10.0)).await.unwrap();
        assert!(b > a);
        assert_eq!(count(&pool).await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn migrations_are_idempotent(pool: SqlitePool) {
        insert(&pool, &reading_at(1_000, 1.0, 10.0)).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        assert_eq!(count(&pool).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn latest_on_empty_table_is_none(pool: SqlitePool) {
        assert!(latest(&pool).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn latest_orders_by_timestamp_not_insertion(pool: SqlitePool) {
        insert(&pool, &reading_at(5_000, 5.0, 50.0)).await.unwrap();
        insert(&pool, &reading_at(1_000, 1.0, 10.0)).await.unwrap();

        let got = latest(&pool).await.unwrap().unwrap();
        assert_eq!(got.timestamp, 5_000);
        assert_eq!(got.energy, 5.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stored_reading_round_trips_every_field(pool: SqlitePool) {
        let mut r = reading_at(42, 0.5, 115.0);
        r.relay_state = false;
        insert(&pool, &r).await.unwrap();

        assert_eq!(latest(&pool).await.unwrap().unwrap(), r);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn range_unbounded_is_newest_first(pool: SqlitePool) {
        for ts in [3_000, 1_000, 4_000, 2_000, 4_000] {
            insert(&pool, &reading_at(ts, 1.0, 10.0)).await.unwrap();
        }

        let rows = range(&pool, TimeRange::default()).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn range_bounds_are_inclusive(pool: SqlitePool) {
        for ts in [999, 1_000, 1_500, 2_000, 2_001] {
            insert(&pool, &reading_at(ts, 1.0, 10.0)).await.unwrap();
        }

        let rows = range(&pool, TimeRange::new(Some(1_000), Some(2_000)))
            .await
            .unwrap();
        let stamps: Vec<i64> = rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![2_000, 1_500, 1_000]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn range_with_one_bound_is_unfiltered(pool: SqlitePool) {
        for ts in [1_000, 2_000, 3_000] {
            insert(&pool, &reading_at(ts, 1.0, 10.0)).await.unwrap();
        }

        let only_start = range(&pool, TimeRange::new(Some(2_500), None)).await.unwrap();
        let only_end = range(&pool, TimeRange::new(None, Some(1_500))).await.unwrap();
        assert_eq!(only_start.len(), 3);
        assert_eq!(only_end.len(), 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn range_with_no_matches_is_empty(pool: SqlitePool) {
        insert(&pool, &reading_at(1_000, 1.0, 10.0)).await.unwrap();
        let rows = range(&pool, TimeRange::new(Some(5_000), Some(6_000)))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
