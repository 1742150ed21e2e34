use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::Json;
use serde_json::Value;
use snafu::ResultExt as _;
use tracing::instrument;

use super::pagination::{paginate, Page, PageLinks, PageParams};
use super::*;
use crate::database::StatisticStore;
use crate::model::{NewStatistic, StatisticView};
use crate::service::{self, AverageLikes};

/// `POST /posts_statistics/`
#[instrument(skip_all)]
pub async fn create<S: StatisticStore>(
    State(app): State<App<S>>, body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<StatisticView>)> {
    let Json(body) = body.context(MalformedBodySnafu)?;
    let statistic = NewStatistic::from_json(&body).context(ValidationSnafu)?;

    let record = app.store().insert(statistic).await?;
    tracing::info!(
        user_id = %record.user_id,
        post_id = %record.post_id,
        likes_count = record.likes_count,
        "recorded post statistic"
    );

    Ok((StatusCode::CREATED, Json(record.view())))
}

/// `GET /posts_statistics/posts/{post_id}/latest`
#[instrument(skip(app))]
pub async fn latest_by_post<S: StatisticStore>(
    State(app): State<App<S>>, Path(post_id): Path<String>,
) -> Result<Json<StatisticView>> {
    let post_id = numeric(&post_id)?;
    let latest = service::latest_by_post(app.store(), post_id).await?;
    Ok(Json(latest))
}

/// `GET /posts_statistics/users/{user_id}/latest`
#[instrument(skip(app, uri, headers))]
pub async fn latest_by_user<S: StatisticStore>(
    State(app): State<App<S>>, Path(user_id): Path<String>, Query(params): Query<PageParams>,
    uri: Uri, headers: HeaderMap,
) -> Result<Json<Page<StatisticView>>> {
    let user_id = numeric(&user_id)?;
    let latest = service::latest_by_user(app.store(), user_id).await?;

    let host = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok());
    let links = PageLinks::new(&uri, host);

    let page = paginate(latest, &params, &links)?;
    Ok(Json(page))
}

/// `GET /posts_statistics/users/{user_id}/average`
#[instrument(skip(app))]
pub async fn average<S: StatisticStore>(
    State(app): State<App<S>>, Path(user_id): Path<String>,
) -> Result<Json<AverageLikes>> {
    let user_id = numeric(&user_id)?;
    let average = service::average_likes_per_day(app.store(), user_id).await?;
    Ok(Json(average))
}

/// Path identifiers are routed only when made of digits, anything else is not found.
fn numeric(id: &str) -> Result<&str> {
    if !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit()) {
        Ok(id)
    } else {
        NotFoundSnafu.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_digits_are_routed() {
        assert_eq!(numeric("42").ok(), Some("42"));
        for id in ["", "abc", "4a", "-1", "1.0"] {
            assert!(matches!(numeric(id), Err(ApiError::NotFound { .. })), "{id:?}");
        }
    }
}
