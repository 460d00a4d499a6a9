//! 画像特徴の抽出
//!
//! 100×100に縮小して各チャンネルの平均を取り、色バケットと複雑度を求める。

use image::imageops::FilterType;
use image::DynamicImage;
use water_footprint_common::{ColorBucket, ImageFeatures};

/// 縮小後の一辺（px）
pub const GRID_SIZE: u32 = 100;

/// デコードできない画像は既定値（unknown / 0.5）
pub fn extract_features(bytes: &[u8]) -> ImageFeatures {
    match image::load_from_memory(bytes) {
        Ok(img) => features_from_image(&img),
        Err(e) => {
            tracing::debug!("画像をデコードできません（既定の特徴を使用）: {}", e);
            ImageFeatures::FALLBACK
        }
    }
}

pub fn features_from_image(img: &DynamicImage) -> ImageFeatures {
    let grid = img
        .resize_exact(GRID_SIZE, GRID_SIZE, FilterType::Triangle)
        .to_rgb8();

    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for pixel in grid.pixels() {
        r += pixel[0] as u64;
        g += pixel[1] as u64;
        b += pixel[2] as u64;
    }

    let count = (grid.width() as u64 * grid.height() as u64).max(1);
    features_from_means(r / count, g / count, b / count)
}

/// 平均値（切り捨て済み）から特徴を作る
pub fn features_from_means(r: u64, g: u64, b: u64) -> ImageFeatures {
    ImageFeatures {
        color_bucket: classify(r, g, b),
        complexity: complexity(r, g, b),
    }
}

/// 判定順: 赤/緑/青が単独最大 → 白 → 暗 → 中間
pub fn classify(r: u64, g: u64, b: u64) -> ColorBucket {
    if r > g && r > b {
        ColorBucket::Red
    } else if g > r && g > b {
        ColorBucket::Green
    } else if b > r && b > g {
        ColorBucket::Blue
    } else if r > 150 && g > 150 && b > 150 {
        ColorBucket::White
    } else if r < 100 && g < 100 && b < 100 {
        ColorBucket::Dark
    } else {
        ColorBucket::Neutral
    }
}

/// min(1, (|R−G| + |G−B| + |B−R|) / 300)
pub fn complexity(r: u64, g: u64, b: u64) -> f64 {
    let spread = r.abs_diff(g) + g.abs_diff(b) + b.abs_diff(r);
    (spread as f64 / 300.0).min(1.0)
}
