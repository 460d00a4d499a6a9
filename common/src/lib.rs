//! Water Footprint Common Library
//!
//! CLIと推定コアで共有される型・カタログ・集計

pub mod types;
pub mod catalog;
pub mod error;
pub mod summary;

pub use types::{
    AuthToken, ColorBucket, EstimationEvent, EstimationResult, ImageFeatures, ProductRecord,
    ProductTotal, Role, Summary, User, WaterCoefficient,
};
pub use catalog::Catalog;
pub use error::{Error, Result};
pub use summary::summarize;
