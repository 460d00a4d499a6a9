//! 商品カタログと色バケット→候補の対応表
//!
//! 起動時に一度だけ読み込み、以後は変更しない。
//! 組み込みの16商品を既定とし、JSONファイルで差し替えられる。

use crate::error::{Error, Result};
use crate::types::{ColorBucket, ProductRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 商品カタログ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub products: Vec<ProductRecord>,
    /// バケットごとの候補商品名。ここに無いバケットは全商品が候補
    #[serde(default)]
    pub buckets: BTreeMap<ColorBucket, Vec<String>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// 組み込みカタログ
    pub fn builtin() -> Self {
        let products = vec![
            ProductRecord::new("Tomato", "Vegetable", 214.0),
            ProductRecord::new("Apple", "Fruit", 822.0),
            ProductRecord::new("Banana", "Fruit", 790.0),
            ProductRecord::new("Potato", "Vegetable", 287.0),
            ProductRecord::new("Rice", "Grain", 2497.0),
            ProductRecord::new("Wheat Bread", "Grain", 1608.0),
            ProductRecord::new("Beef", "Meat", 15415.0),
            ProductRecord::new("Chicken", "Meat", 4325.0),
            ProductRecord::new("Milk", "Dairy", 1020.0),
            ProductRecord::new("Cheese", "Dairy", 3178.0),
            ProductRecord::new("Coffee", "Beverage", 18900.0),
            ProductRecord::new("Tea", "Beverage", 8860.0),
            ProductRecord::new("Cotton T-Shirt", "Clothing", 2700.0),
            ProductRecord::new("Jeans", "Clothing", 10850.0),
            ProductRecord::new("Orange", "Fruit", 560.0),
            ProductRecord::new("Lettuce", "Vegetable", 237.0),
        ];

        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let pale = names(&["Rice", "Wheat Bread", "Milk", "Potato", "Cotton T-Shirt"]);

        let mut buckets = BTreeMap::new();
        buckets.insert(ColorBucket::Red, names(&["Tomato", "Apple", "Beef", "Cotton T-Shirt"]));
        buckets.insert(ColorBucket::Green, names(&["Lettuce", "Tea", "Apple", "Potato"]));
        buckets.insert(ColorBucket::Neutral, pale.clone());
        buckets.insert(ColorBucket::White, pale);
        buckets.insert(ColorBucket::Dark, names(&["Coffee", "Beef", "Jeans"]));

        Self { products, buckets }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み（検証込み）
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// 商品が1件以上あり、基準値が正で、対応表が既知の商品のみを指すこと
    pub fn validate(&self) -> Result<()> {
        if self.products.is_empty() {
            return Err(Error::InvalidCatalog("商品が1件もありません".into()));
        }

        let mut seen = HashSet::new();
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(Error::InvalidCatalog("商品名が空です".into()));
            }
            if !(product.base_liters.is_finite() && product.base_liters > 0.0) {
                return Err(Error::InvalidCatalog(format!(
                    "{}: baseLitersは正の数である必要があります ({})",
                    product.name, product.base_liters
                )));
            }
            if !seen.insert(product.name.as_str()) {
                return Err(Error::InvalidCatalog(format!("商品名が重複しています: {}", product.name)));
            }
        }

        for (bucket, names) in &self.buckets {
            if let Some(missing) = names.iter().find(|n| !seen.contains(n.as_str())) {
                return Err(Error::InvalidCatalog(format!(
                    "{}: カタログに無い商品です: {}",
                    bucket, missing
                )));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.name == name)
    }

    /// 色バケットに対応する候補商品（カタログ順）
    ///
    /// 対応表に無いバケット、または絞り込み結果が空の場合は全商品を返す。
    pub fn candidates(&self, bucket: ColorBucket) -> Vec<&ProductRecord> {
        let filtered: Vec<&ProductRecord> = match self.buckets.get(&bucket) {
            Some(names) => self
                .products
                .iter()
                .filter(|p| names.iter().any(|n| n == &p.name))
                .collect(),
            None => self.products.iter().collect(),
        };

        if filtered.is_empty() {
            self.products.iter().collect()
        } else {
            filtered
        }
    }
}
