use std::collections::btree_map::{BTreeMap, Entry};
use std::future::Future;

use snafu::{OptionExt as _, ResultExt as _};
use uuid::Uuid;

use super::*;
use crate::model::{NewStatistic, StatisticRecord, Timestamp};

/// Append-only storage of statistic records.
///
/// `insert` is the only way to add a record and the only place a
/// `created_at` is assigned. "Latest" always means greatest `created_at`,
/// then greatest `record_key`.
pub trait StatisticStore: Clone + Send + Sync + 'static {
    /// The time the store would stamp on a record inserted right now.
    fn now(&self) -> Timestamp;

    fn insert(
        &self, statistic: NewStatistic,
    ) -> impl Future<Output = Result<StatisticRecord>> + Send;

    /// The latest record of every `group` among the records matching `filter`, ordered by group.
    fn query_latest_by_group(
        &self, filter: Filter, group: GroupKey,
    ) -> impl Future<Output = Result<Vec<StatisticRecord>>> + Send;

    /// The latest record matching `filter`.
    fn query_latest_single(
        &self, filter: Filter,
    ) -> impl Future<Output = Result<Option<StatisticRecord>>> + Send;
}

/// A conjunction of optional conditions on a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub user_id: Option<String>,
    pub post_id: Option<String>,
    /// Strict lower bound on `created_at`.
    pub created_after: Option<Timestamp>,
}

impl Filter {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn post(post_id: impl Into<String>) -> Self {
        Self {
            post_id: Some(post_id.into()),
            ..Self::default()
        }
    }

    pub fn created_after(mut self, cutoff: Timestamp) -> Self {
        self.created_after = Some(cutoff);
        self
    }

    fn conditions(&self) -> Vec<&'static str> {
        let mut conditions = Vec::new();
        if self.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        if self.post_id.is_some() {
            conditions.push("post_id = $post_id");
        }
        if self.created_after.is_some() {
            conditions.push("created_at > $created_after");
        }
        conditions
    }

    fn to_sql(&self, limit: Option<usize>) -> String {
        let mut sql = format!("SELECT * FROM {TABLE}");

        let conditions = self.conditions();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(" ORDER BY created_at DESC, record_key DESC");

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        sql
    }
}

/// The field a set of records is partitioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Post,
    User,
}

impl GroupKey {
    pub fn of(self, record: &StatisticRecord) -> &str {
        match self {
            GroupKey::Post => &record.post_id,
            GroupKey::User => &record.user_id,
        }
    }
}

/// Keeps the latest record of each group, ordered by the group value.
///
/// The result does not depend on the order of `records`.
pub fn latest_per_group(
    records: impl IntoIterator<Item = StatisticRecord>, group: GroupKey,
) -> Vec<StatisticRecord> {
    let mut latest: BTreeMap<String, StatisticRecord> = BTreeMap::new();

    for record in records {
        match latest.entry(group.of(&record).to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
            Entry::Occupied(mut entry) => {
                if record.is_newer_than(entry.get()) {
                    entry.insert(record);
                }
            }
        }
    }

    latest.into_values().collect()
}

impl Database {
    async fn select(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<StatisticRecord>> {
        let sql = filter.to_sql(limit);
        tracing::debug!(%sql, ?filter, "selecting statistics");

        let mut query = self.database.query(sql);
        if let Some(user_id) = &filter.user_id {
            query = query.bind(("user_id", user_id.clone()));
        }
        if let Some(post_id) = &filter.post_id {
            query = query.bind(("post_id", post_id.clone()));
        }
        if let Some(cutoff) = filter.created_after {
            query = query.bind(("created_after", cutoff.to_rfc3339()));
        }

        let mut response = query.await.context(QuerySnafu)?;
        let records: Vec<StatisticRecord> = response.take(0).context(DeserializeSnafu)?;
        Ok(records)
    }
}

impl StatisticStore for Database {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    async fn insert(&self, statistic: NewStatistic) -> Result<StatisticRecord> {
        statistic.validate().context(InvalidSnafu)?;

        let NewStatistic {
            user_id,
            post_id,
            likes_count,
        } = statistic;

        let record = StatisticRecord {
            record_key: Uuid::now_v7().to_string(),
            user_id,
            post_id,
            likes_count,
            created_at: self.now(),
        };

        let created: Option<StatisticRecord> = self
            .database
            .create((TABLE, record.record_key.clone()))
            .content(&record)
            .await
            .context(QuerySnafu)?;

        let created = created.context(EmptyQuerySnafu)?;
        tracing::debug!(
            record_key = %created.record_key,
            user_id = %created.user_id,
            post_id = %created.post_id,
            likes_count = created.likes_count,
            "inserted statistic"
        );

        Ok(created)
    }

    async fn query_latest_by_group(
        &self, filter: Filter, group: GroupKey,
    ) -> Result<Vec<StatisticRecord>> {
        let records = self.select(&filter, None).await?;
        Ok(latest_per_group(records, group))
    }

    async fn query_latest_single(&self, filter: Filter) -> Result<Option<StatisticRecord>> {
        let records = self.select(&filter, Some(1)).await?;
        Ok(records.into_iter().next())
    }
}
