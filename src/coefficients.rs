//! 水係数テーブルの管理（管理者のみ）

use crate::auth::generate_id;
use crate::error::{Result, WaterFootprintError};
use crate::store::{KeyValueStore, KeyValueStoreExt, COEFFICIENTS_KEY};
use water_footprint_common::{User, WaterCoefficient};

pub const DEFAULT_UNIT: &str = "kg";

/// 追加・更新フォームの入力
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientInput {
    pub product_name: String,
    pub category: String,
    pub unit: String,
    pub base_liters: f64,
}

impl CoefficientInput {
    fn validated(self) -> Result<Self> {
        let product_name = self.product_name.trim().to_string();
        let category = self.category.trim().to_string();
        let unit = match self.unit.trim() {
            "" => DEFAULT_UNIT.to_string(),
            u => u.to_string(),
        };

        if product_name.is_empty() || category.is_empty() {
            return Err(WaterFootprintError::Validation("すべての項目を入力してください".into()));
        }
        if !(self.base_liters.is_finite() && self.base_liters > 0.0) {
            return Err(WaterFootprintError::Validation(format!(
                "baseLitersは正の数を指定してください: {}",
                self.base_liters
            )));
        }

        Ok(Self {
            product_name,
            category,
            unit,
            base_liters: self.base_liters,
        })
    }
}

/// CLI入力の文字列を水量として解釈
pub fn parse_base_liters(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| WaterFootprintError::Validation(format!("数値ではありません: {}", s)))
}

fn ensure_admin(actor: &User) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(WaterFootprintError::NotAuthorized)
    }
}

pub struct CoefficientService<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> CoefficientService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<WaterCoefficient>> {
        self.store.load_or_default(COEFFICIENTS_KEY)
    }

    /// 商品名順（大文字小文字を区別しない）
    pub fn list(&self, actor: &User) -> Result<Vec<WaterCoefficient>> {
        ensure_admin(actor)?;
        let mut coefficients = self.load()?;
        coefficients.sort_by(|a, b| {
            a.product_name
                .to_lowercase()
                .cmp(&b.product_name.to_lowercase())
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        Ok(coefficients)
    }

    pub fn add(&self, actor: &User, input: CoefficientInput) -> Result<WaterCoefficient> {
        ensure_admin(actor)?;
        let input = input.validated()?;

        let coefficient = WaterCoefficient {
            id: generate_id(),
            product_name: input.product_name,
            category: input.category,
            unit: input.unit,
            base_liters: input.base_liters,
        };

        let mut coefficients = self.load()?;
        coefficients.push(coefficient.clone());
        self.store.save(COEFFICIENTS_KEY, &coefficients)?;

        tracing::info!("係数を追加: {} ({})", coefficient.product_name, coefficient.id);
        Ok(coefficient)
    }

    pub fn update(&self, actor: &User, id: &str, input: CoefficientInput) -> Result<WaterCoefficient> {
        ensure_admin(actor)?;
        let input = input.validated()?;

        let mut coefficients = self.load()?;
        let target = coefficients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| WaterFootprintError::CoefficientNotFound(id.to_string()))?;

        target.product_name = input.product_name;
        target.category = input.category;
        target.unit = input.unit;
        target.base_liters = input.base_liters;
        let updated = target.clone();

        self.store.save(COEFFICIENTS_KEY, &coefficients)?;
        tracing::info!("係数を更新: {} ({})", updated.product_name, updated.id);
        Ok(updated)
    }

    pub fn delete(&self, actor: &User, id: &str) -> Result<()> {
        ensure_admin(actor)?;

        let mut coefficients = self.load()?;
        let before = coefficients.len();
        coefficients.retain(|c| c.id != id);
        if coefficients.len() == before {
            return Err(WaterFootprintError::CoefficientNotFound(id.to_string()));
        }

        self.store.save(COEFFICIENTS_KEY, &coefficients)?;
        tracing::info!("係数を削除: {}", id);
        Ok(())
    }
}
