use crate::error::{Result, WaterFootprintError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use water_footprint_common::Catalog;

/// ストアパスを上書きする環境変数
pub const STORE_ENV: &str = "WATER_FOOTPRINT_STORE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// キーバリューストアのJSONファイル（省略時は設定ディレクトリ内）
    pub store_path: Option<PathBuf>,
    /// カタログJSON（省略時は組み込み）
    pub catalog_path: Option<PathBuf>,
    /// 擬似解析の待ち時間
    pub processing_delay_ms: u64,
    /// 同時に解析する画像数
    pub concurrency: usize,
    pub token_ttl_hours: u64,
    pub password_secret: String,
    /// 履歴に画像をdata URLで埋め込む
    pub embed_images: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            catalog_path: None,
            processing_delay_ms: 1500,
            concurrency: 4,
            token_ttl_hours: 24,
            password_secret: "water-footprint-secret-key-2025".into(),
            embed_images: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!("設定を読み込みました: {}", config_path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| WaterFootprintError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("water-footprint"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// 使用するストアのパス（環境変数 > 設定 > 既定）
    pub fn resolve_store_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(STORE_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("store.json")),
        }
    }

    /// カタログを読み込む（起動時に一度だけ）
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => {
                if !path.exists() {
                    return Err(WaterFootprintError::FileNotFound(path.display().to_string()));
                }
                let catalog = Catalog::from_file(path)?;
                tracing::info!("カタログを読み込みました: {} ({}件)", path.display(), catalog.len());
                Ok(catalog)
            }
            None => Ok(Catalog::builtin()),
        }
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn token_ttl(&self) -> Result<chrono::Duration> {
        i64::try_from(self.token_ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .ok_or_else(|| {
                WaterFootprintError::Config(format!(
                    "トークン有効期間が大きすぎます: {}時間",
                    self.token_ttl_hours
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.processing_delay_ms, 1500);
        assert_eq!(config.token_ttl_hours, 24);
        assert!(!config.embed_images);
        assert_eq!(config.processing_delay(), Duration::from_millis(1500));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.token_ttl().unwrap(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_out_of_range_token_ttl() {
        for hours in [u64::MAX, i64::MAX as u64, 10_000_000_000_000_000] {
            let config = Config {
                token_ttl_hours: hours,
                ..Config::default()
            };
            assert!(matches!(config.token_ttl(), Err(WaterFootprintError::Config(_))));
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"processing_delay_ms": 0}"#).unwrap();
        assert_eq!(config.processing_delay_ms, 0);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.password_secret, "water-footprint-secret-key-2025");
    }

    #[test]
    fn test_builtin_catalog_when_no_path() {
        let config = Config::default();
        assert_eq!(config.load_catalog().unwrap().len(), 16);
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = Config {
            catalog_path: Some(PathBuf::from("/nonexistent/catalog.json")),
            ..Config::default()
        };
        assert!(matches!(
            config.load_catalog(),
            Err(WaterFootprintError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_configured_store_path() {
        let config = Config {
            store_path: Some(PathBuf::from("/tmp/wf-store.json")),
            ..Config::default()
        };
        if std::env::var(STORE_ENV).is_err() {
            assert_eq!(config.resolve_store_path().unwrap(), PathBuf::from("/tmp/wf-store.json"));
        }
    }
}
