pub mod explanation;
pub mod feed;

pub use explanation::{AskAnswer, AskSource, MatchExplanation};
pub use feed::{FeedResponse, RecommendationEntry};
