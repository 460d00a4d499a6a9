//! 商品写真から仮想水を推定するデモ
//!
//! 推定コア（特徴抽出・候補絞り込み・結果合成）と、それを使う
//! 認証・履歴・係数管理。永続化はすべて `store::KeyValueStore` 経由。

pub mod auth;
pub mod cli;
pub mod coefficients;
pub mod config;
pub mod error;
pub mod estimator;
pub mod export;
pub mod history;
pub mod scanner;
pub mod store;

pub use estimator::Estimator;
pub use water_footprint_common as common;
