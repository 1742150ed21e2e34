use derive_new::new;
use serde::{Deserialize, Serialize};

pub use clock::*;
pub use statistic::*;
pub use timestamp::*;
pub use validation::*;

mod clock;
mod statistic;
mod timestamp;
mod validation;
