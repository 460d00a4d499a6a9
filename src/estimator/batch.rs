//! 複数画像の一括推定
//!
//! 同時に処理する画像数を `concurrency` で制限する。ファイルの読み込みも
//! 制限の内側で行うので、メモリに載る画像は最大 `concurrency` 枚。

use super::Estimator;
use crate::scanner::{self, ImageInfo};
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use water_footprint_common::EstimationResult;

/// 読み込めなかった画像
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub image: ImageInfo,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// 入力順
    pub results: Vec<(ImageInfo, EstimationResult)>,
    pub failures: Vec<BatchFailure>,
}

pub async fn estimate_images(
    estimator: &Estimator,
    images: Vec<ImageInfo>,
    embed: bool,
    concurrency: usize,
    pb: &ProgressBar,
) -> BatchOutcome {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, image) in images.into_iter().enumerate() {
        let estimator = estimator.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (index, image, Err(e.to_string())),
            };

            let bytes = match tokio::fs::read(&image.path).await {
                Ok(bytes) => bytes,
                Err(e) => return (index, image, Err(e.to_string())),
            };
            let reference = if embed {
                scanner::data_url(&bytes)
            } else {
                image.path.display().to_string()
            };
            let result = estimator.estimate(bytes, reference).await;
            (index, image, Ok(result))
        });
    }

    let mut done = Vec::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        pb.inc(1);
        let (index, image, result) = match joined {
            Ok(item) => item,
            Err(e) => {
                tracing::error!("推定タスクが異常終了しました: {}", e);
                continue;
            }
        };
        pb.set_message(image.file_name.clone());

        match result {
            Ok(result) => done.push((index, image, result)),
            Err(reason) => {
                tracing::warn!("画像を読み込めません（スキップ）: {}: {}", image.path.display(), reason);
                failures.push((index, BatchFailure { image, reason }));
            }
        }
    }

    done.sort_by_key(|(index, _, _)| *index);
    failures.sort_by_key(|(index, _)| *index);

    BatchOutcome {
        results: done.into_iter().map(|(_, image, result)| (image, result)).collect(),
        failures: failures.into_iter().map(|(_, failure)| failure).collect(),
    }
}
