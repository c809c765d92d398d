pub mod classifier;
pub mod config;
pub mod dates;
pub mod error;
pub mod error_utils;
pub mod filter;
pub mod grouping;
pub mod retry;
pub mod types;

pub use classifier::{is_noise, NoiseRules, NoiseSignal};
pub use config::{DigestConfig, RedditCredentials};
pub use dates::CollectionWindow;
pub use error::*;
pub use error_utils::*;
pub use filter::{filter_posts, filter_posts_with, Thresholds};
pub use grouping::{group_posts, trend_projection, GroupedPosts, LightPost, TrendPost};
pub use retry::{RetryConfig, RetryExecutor};
pub use types::*;
