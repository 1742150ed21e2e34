use derive_new::new;

use crate::database::StatisticStore;

/// Shared state of every request handler.
#[derive(Debug, Clone, new)]
pub struct App<S> {
    pub store: S,
}

impl<S: StatisticStore> App<S> {
    pub fn store(&self) -> &S {
        &self.store
    }
}
