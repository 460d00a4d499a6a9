//! 擬似推定パイプライン
//!
//! 特徴抽出 → 候補絞り込み → 結果合成。各呼び出しは独立した非同期処理で、
//! 共有するのは読み取り専用のカタログだけ。

pub mod batch;
pub mod features;
pub mod synth;

pub use batch::{estimate_images, BatchFailure, BatchOutcome};
pub use features::extract_features;
pub use synth::synthesize;

use crate::error::Result;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use water_footprint_common::{Catalog, EstimationResult, ImageFeatures};

#[derive(Debug, Clone)]
pub struct Estimator {
    catalog: Arc<Catalog>,
    processing_delay: Duration,
}

impl Estimator {
    /// カタログを検証して推定器を作る（待ち時間なし）
    pub fn new(catalog: Catalog) -> Result<Self> {
        catalog.validate()?;
        Ok(Self {
            catalog: Arc::new(catalog),
            processing_delay: Duration::ZERO,
        })
    }

    /// 解析前の擬似待ち時間
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 画像から推定結果を作る。失敗しない
    pub async fn estimate(&self, image: Vec<u8>, image_reference: impl Into<String>) -> EstimationResult {
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }

        let features = match tokio::task::spawn_blocking(move || extract_features(&image)).await {
            Ok(features) => features,
            Err(e) => {
                tracing::warn!("特徴抽出タスクが失敗しました（既定の特徴を使用）: {}", e);
                ImageFeatures::FALLBACK
            }
        };

        let mut rng = rand::rng();
        self.estimate_from_features(&features, image_reference, &mut rng)
    }

    /// 特徴が既に分かっている場合の推定
    pub fn estimate_from_features<R: Rng + ?Sized>(
        &self,
        features: &ImageFeatures,
        image_reference: impl Into<String>,
        rng: &mut R,
    ) -> EstimationResult {
        let candidates = self.catalog.candidates(features.color_bucket);
        tracing::debug!(
            "特徴: {} (複雑度 {:.2}) → 候補{}件",
            features.color_bucket,
            features.complexity,
            candidates.len()
        );

        synthesize(&candidates, features.complexity, image_reference.into(), rng)
    }
}
