use snafu::{OptionExt as _, ResultExt as _};
use tracing::instrument;

use super::*;
use crate::database::{Filter, GroupKey, StatisticStore};
use crate::model::StatisticView;

/// The most recent statistic recorded for a post, whoever it belongs to.
#[instrument(skip(store))]
pub async fn latest_by_post<S: StatisticStore>(store: &S, post_id: &str) -> Result<StatisticView> {
    let record = store
        .query_latest_single(Filter::post(post_id))
        .await
        .context(StoreSnafu)?
        .context(NotFoundSnafu)?;

    Ok(record.into())
}

/// The most recent statistic of every post of a user, ordered by post id.
///
/// Always the full set, pagination is up to the caller. A user without any
/// statistic is reported as [QueryError::NotFound].
#[instrument(skip(store))]
pub async fn latest_by_user<S: StatisticStore>(
    store: &S, user_id: &str,
) -> Result<Vec<StatisticView>> {
    let records = store
        .query_latest_by_group(Filter::user(user_id), GroupKey::Post)
        .await
        .context(StoreSnafu)?;

    if records.is_empty() {
        return NotFoundSnafu.fail();
    }

    Ok(records.into_iter().map(StatisticView::from).collect())
}
