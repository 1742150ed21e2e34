//! Records like counts of posts over time and answers "latest" and 30-day
//! average queries over HTTP.
//!
//! JSON keys are snake_case: responses carry `user_id`, `post_id`,
//! `likes_count` and `likes_per_day`. Request bodies also accept the camelCase
//! `userId`, `postId` and `likesCount`.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logger;
pub mod model;
pub mod service;
