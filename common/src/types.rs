//! 推定・履歴・認証の型定義
//!
//! CLIとストアで共有される型:
//! - ImageFeatures: 画像特徴（色バケット＋複雑度）
//! - EstimationResult: 1回の推定結果
//! - EstimationEvent: 履歴として保存される推定結果
//! - User / AuthToken / WaterCoefficient / Summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 画像の平均色から判定する色バケット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBucket {
    Red,
    Green,
    Blue,
    White,
    Dark,
    Neutral,
    Unknown,
}

impl ColorBucket {
    pub const ALL: [ColorBucket; 7] = [
        ColorBucket::Red,
        ColorBucket::Green,
        ColorBucket::Blue,
        ColorBucket::White,
        ColorBucket::Dark,
        ColorBucket::Neutral,
        ColorBucket::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorBucket::Red => "red",
            ColorBucket::Green => "green",
            ColorBucket::Blue => "blue",
            ColorBucket::White => "white",
            ColorBucket::Dark => "dark",
            ColorBucket::Neutral => "neutral",
            ColorBucket::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ColorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ColorBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorBucket::ALL
            .iter()
            .find(|b| b.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| format!("Unknown color bucket: {}", s))
    }
}

/// 画像特徴
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFeatures {
    pub color_bucket: ColorBucket,
    /// 0.0〜1.0
    pub complexity: f64,
}

impl ImageFeatures {
    /// デコード失敗時に使う既定値
    pub const FALLBACK: ImageFeatures = ImageFeatures {
        color_bucket: ColorBucket::Unknown,
        complexity: 0.5,
    };
}

/// カタログの商品（仮想水の基準値つき）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub name: String,
    pub category: String,
    pub base_liters: f64,
}

impl ProductRecord {
    pub fn new(name: &str, category: &str, base_liters: f64) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            base_liters,
        }
    }
}

/// 推定結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationResult {
    pub product_name: String,
    /// 小数1桁に丸めた仮想水（L）
    pub water_liters: f64,
    /// 0.95で頭打ち
    pub confidence: f64,
    /// 画像の参照（ファイルパスまたはdata URL）
    pub image_reference: String,
    pub created_at: DateTime<Utc>,
}

/// 履歴イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationEvent {
    pub id: String,
    pub user_id: String,
    pub product_name: String,
    pub water_liters: f64,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub image_reference: String,
}

impl EstimationEvent {
    pub fn from_result(id: String, user_id: String, result: &EstimationResult) -> Self {
        Self {
            id,
            user_id,
            product_name: result.product_name.clone(),
            water_liters: result.water_liters,
            confidence: result.confidence,
            created_at: result.created_at,
            image_reference: result.image_reference.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.pad("user"),
            Role::Admin => f.pad("admin"),
        }
    }
}

/// ユーザー（パスワードハッシュは含まない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 保存されるセッショントークン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token: String,
    /// 有効期限（エポックミリ秒）
    pub expires_at: i64,
    pub user: User,
}

/// 管理者が管理する水係数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterCoefficient {
    pub id: String,
    pub product_name: String,
    pub category: String,
    pub unit: String,
    pub base_liters: f64,
}

/// 商品ごとの集計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTotal {
    pub product_name: String,
    pub water_liters: f64,
    pub count: usize,
}

/// ユーザー単位のサマリー
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_analyses: usize,
    pub total_water_liters: f64,
    pub top_products: Vec<ProductTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_bucket_from_str() {
        assert_eq!("red".parse::<ColorBucket>().unwrap(), ColorBucket::Red);
        assert_eq!(" Dark ".parse::<ColorBucket>().unwrap(), ColorBucket::Dark);
        assert!("purple".parse::<ColorBucket>().is_err());
    }

    #[test]
    fn test_color_bucket_serializes_lowercase() {
        let json = serde_json::to_string(&ColorBucket::Neutral).unwrap();
        assert_eq!(json, "\"neutral\"");
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let result = EstimationResult {
            product_name: "Tea".into(),
            water_liters: 8860.0,
            confidence: 0.9,
            image_reference: "tea.jpg".into(),
            created_at: Utc::now(),
        };
        let event = EstimationEvent::from_result("e1".into(), "u1".into(), &result);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["productName"], "Tea");
        assert_eq!(json["imageReference"], "tea.jpg");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
