pub mod catalog_loader;
pub mod chat;
pub mod encoder;
pub mod recommendations;
pub mod similarity;

pub use encoder::{CategoryTable, EncoderTables, FeatureEncoder, FeatureVector};
pub use recommendations::{RecommendationTally, Recommender};
pub use similarity::cosine_similarity;
