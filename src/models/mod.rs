pub mod location;
pub mod recommendation;

pub use location::Coordinates;
pub use recommendation::{RecommendRequest, RecommendationItem, ResultPayload};
