use chrono::Duration;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use snafu::{OptionExt as _, ResultExt as _};
use tracing::instrument;

use super::*;
use crate::database::{Filter, GroupKey, StatisticStore};
use crate::model::StatisticRecord;

/// Length of the trailing window, and the divisor of the average.
pub const WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AverageLikes {
    pub user_id: UserNumber,
    pub likes_per_day: i64,
}

/// A digit-only user id written back as a JSON integer of any length.
///
/// Leading zeros are dropped, `"007"` is echoed as `7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNumber(String);

impl UserNumber {
    pub fn parse(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        let significant = digits.trim_start_matches('0');
        let number = if significant.is_empty() { "0" } else { significant };
        Some(Self(number.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for UserNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.0.clone()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

/// Average likes per day of a user over the last [WINDOW_DAYS] days.
///
/// Takes the latest statistic of every post recorded strictly after
/// `now - WINDOW_DAYS`, sums their likes and divides by [WINDOW_DAYS],
/// truncating. Records are matched on `user_id` exactly as given. A
/// non-numeric id, or no statistic in the window, is [QueryError::NotFound].
#[instrument(skip(store))]
pub async fn average_likes_per_day<S: StatisticStore>(
    store: &S, user_id: &str,
) -> Result<AverageLikes> {
    let number = UserNumber::parse(user_id).context(NotFoundSnafu)?;

    let cutoff = store.now() - Duration::days(WINDOW_DAYS);
    let filter = Filter::user(user_id).created_after(cutoff);

    let latest = store
        .query_latest_by_group(filter, GroupKey::Post)
        .await
        .context(StoreSnafu)?;

    if latest.is_empty() {
        return NotFoundSnafu.fail();
    }

    Ok(AverageLikes {
        user_id: number,
        likes_per_day: per_day(&latest),
    })
}

fn per_day(latest: &[StatisticRecord]) -> i64 {
    let total: i128 = latest.iter().map(|record| i128::from(record.likes_count)).sum();
    i64::try_from(total / i128::from(WINDOW_DAYS)).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::database::Database;
    use crate::model::{now, ManualClock, NewStatistic, Timestamp};

    struct Fixture {
        database: Database,
        clock: ManualClock,
        today: Timestamp,
    }

    impl Fixture {
        async fn new() -> Self {
            let today = now();
            let clock = ManualClock::new(today);
            let database = Database::memory(Arc::new(clock.clone())).await.unwrap();
            Self {
                database,
                clock,
                today,
            }
        }

        async fn record(&self, post_id: &str, likes_count: i64, age: Duration) {
            self.record_for("1", post_id, likes_count, age).await;
        }

        async fn record_for(&self, user_id: &str, post_id: &str, likes_count: i64, age: Duration) {
            self.clock.set(self.today - age);
            self.database
                .insert(NewStatistic::new(user_id.into(), post_id.into(), likes_count))
                .await
                .unwrap();
            self.clock.set(self.today);
        }

        async fn average(&self) -> Result<AverageLikes> {
            average_likes_per_day(&self.database, "1").await
        }
    }

    #[tokio::test]
    async fn single_post_truncates() {
        let fixture = Fixture::new().await;
        fixture.record("1", 100, Duration::days(2)).await;

        let average = fixture.average().await.unwrap();
        assert_eq!(
            average,
            AverageLikes {
                user_id: UserNumber::parse("1").unwrap(),
                likes_per_day: 3
            }
        );
    }

    #[tokio::test]
    async fn sums_the_latest_of_each_post() {
        let fixture = Fixture::new().await;
        fixture.record("1", 10, Duration::days(1)).await;
        fixture.record("1", 40, Duration::zero()).await;
        fixture.record("2", 5, Duration::days(3)).await;
        fixture.record("2", 20, Duration::days(2)).await;

        let average = fixture.average().await.unwrap();
        assert_eq!(average.likes_per_day, (40 + 20) / 30);
    }

    #[tokio::test]
    async fn only_old_records_is_not_found() {
        let fixture = Fixture::new().await;
        fixture.record("1", 300, Duration::days(31)).await;

        let result = fixture.average().await;
        assert!(matches!(result, Err(QueryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn window_excludes_older_observations() {
        let fixture = Fixture::new().await;
        fixture.record("1", 3000, Duration::days(45)).await;
        fixture.record("2", 60, Duration::days(29)).await;

        let average = fixture.average().await.unwrap();
        assert_eq!(average.likes_per_day, 2);
    }

    #[tokio::test]
    async fn window_bound_is_strict() {
        let fixture = Fixture::new().await;
        fixture.record("1", 90, Duration::days(WINDOW_DAYS)).await;

        let result = fixture.average().await;
        assert!(matches!(result, Err(QueryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn counts_the_latest_inside_the_window() {
        let fixture = Fixture::new().await;
        fixture.record("1", 900, Duration::days(40)).await;
        fixture.record("1", 30, Duration::days(20)).await;

        let average = fixture.average().await.unwrap();
        assert_eq!(average.likes_per_day, 1);
    }

    #[tokio::test]
    async fn matches_the_id_as_written() {
        let fixture = Fixture::new().await;
        fixture.record_for("007", "1", 90, Duration::days(1)).await;
        fixture.record_for("7", "1", 3000, Duration::days(1)).await;

        let average = average_likes_per_day(&fixture.database, "007").await.unwrap();
        assert_eq!(average.user_id.as_str(), "7");
        assert_eq!(average.likes_per_day, 3);
    }

    #[tokio::test]
    async fn ids_beyond_machine_integers_are_found() {
        let fixture = Fixture::new().await;
        let user_id = "123456789012345678901234567890123456789012345";
        fixture.record_for(user_id, "1", 60, Duration::days(1)).await;

        let average = average_likes_per_day(&fixture.database, user_id).await.unwrap();
        assert_eq!(average.user_id.as_str(), user_id);
        assert_eq!(average.likes_per_day, 2);
    }

    #[tokio::test]
    async fn non_numeric_id_is_not_found() {
        let fixture = Fixture::new().await;
        fixture.record_for("abc", "1", 90, Duration::days(1)).await;

        let result = average_likes_per_day(&fixture.database, "abc").await;
        assert!(matches!(result, Err(QueryError::NotFound { .. })));
    }

    #[test]
    fn user_number_drops_leading_zeros() {
        assert_eq!(UserNumber::parse("007").unwrap().as_str(), "7");
        assert_eq!(UserNumber::parse("000").unwrap().as_str(), "0");
        assert_eq!(UserNumber::parse("12").unwrap().as_str(), "12");
        assert_eq!(UserNumber::parse(""), None);
        assert_eq!(UserNumber::parse("1a"), None);
        assert_eq!(UserNumber::parse("-1"), None);
    }

    #[test]
    fn user_number_serializes_as_an_exact_integer() {
        let average = AverageLikes {
            user_id: UserNumber::parse("00123456789012345678901234567890").unwrap(),
            likes_per_day: 4,
        };

        assert_eq!(
            serde_json::to_string(&average).unwrap(),
            r#"{"user_id":123456789012345678901234567890,"likes_per_day":4}"#
        );
    }

    #[test]
    fn per_day_saturates() {
        let record = |likes_count| StatisticRecord {
            record_key: String::new(),
            user_id: "1".into(),
            post_id: "1".into(),
            likes_count,
            created_at: now(),
        };

        let huge: Vec<StatisticRecord> = (0..40).map(|_| record(i64::MAX)).collect();
        assert_eq!(per_day(&huge), i64::MAX);
        assert_eq!(per_day(&[record(59)]), 1);
    }
}
