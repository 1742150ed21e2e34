use snafu::{Location, Snafu};

use crate::database::StoreError;

pub mod average;
pub mod latest;

pub use average::{average_likes_per_day, AverageLikes, UserNumber, WINDOW_DAYS};
pub use latest::{latest_by_post, latest_by_user};

pub type Result<T, E = QueryError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueryError {
    /// Nothing matched the requested key or window.
    #[snafu(display("no statistics found"))]
    NotFound {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read statistics: {source}"))]
    Store {
        source: StoreError,
        #[snafu(implicit)]
        location: Location,
    },
}
