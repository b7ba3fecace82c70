pub mod recommend;

pub use recommend::{RecommendClient, RecommendError, RecommendationApi};
