//! 履歴の集計

use crate::types::{EstimationEvent, ProductTotal, Summary};

/// 上位商品の表示件数
pub const TOP_PRODUCTS: usize = 5;

/// イベント列からサマリーを作成
///
/// 上位商品は累計水量の降順。同量の場合は先に出現した商品が先。
pub fn summarize<'a, I>(events: I) -> Summary
where
    I: IntoIterator<Item = &'a EstimationEvent>,
{
    let mut summary = Summary::default();
    let mut totals: Vec<ProductTotal> = Vec::new();

    for event in events {
        summary.total_analyses += 1;
        summary.total_water_liters += event.water_liters;

        match totals.iter_mut().find(|t| t.product_name == event.product_name) {
            Some(total) => {
                total.water_liters += event.water_liters;
                total.count += 1;
            }
            None => totals.push(ProductTotal {
                product_name: event.product_name.clone(),
                water_liters: event.water_liters,
                count: 1,
            }),
        }
    }

    totals.sort_by(|a, b| b.water_liters.total_cmp(&a.water_liters));
    totals.truncate(TOP_PRODUCTS);
    summary.top_products = totals;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(product: &str, liters: f64) -> EstimationEvent {
        EstimationEvent {
            id: format!("{}-{}", product, liters),
            user_id: "u1".into(),
            product_name: product.into(),
            water_liters: liters,
            confidence: 0.8,
            created_at: Utc::now(),
            image_reference: String::new(),
        }
    }

    #[test]
    fn test_summarize_empty() {
        let events: Vec<EstimationEvent> = Vec::new();
        let summary = summarize(&events);
        assert_eq!(summary.total_analyses, 0);
        assert_eq!(summary.total_water_liters, 0.0);
        assert!(summary.top_products.is_empty());
    }

    #[test]
    fn test_summarize_accumulates_per_product() {
        let events = vec![event("Tea", 100.0), event("Beef", 50.0), event("Tea", 25.5)];
        let summary = summarize(&events);

        assert_eq!(summary.total_analyses, 3);
        assert!((summary.total_water_liters - 175.5).abs() < 1e-9);
        assert_eq!(summary.top_products[0].product_name, "Tea");
        assert_eq!(summary.top_products[0].count, 2);
        assert!((summary.top_products[0].water_liters - 125.5).abs() < 1e-9);
        assert_eq!(summary.top_products[1].product_name, "Beef");
    }

    #[test]
    fn test_summarize_keeps_top_five() {
        let events: Vec<_> = (1..=7).map(|i| event(&format!("P{}", i), i as f64)).collect();
        let summary = summarize(&events);

        assert_eq!(summary.top_products.len(), TOP_PRODUCTS);
        let names: Vec<_> = summary.top_products.iter().map(|t| t.product_name.as_str()).collect();
        assert_eq!(names, vec!["P7", "P6", "P5", "P4", "P3"]);
    }

    #[test]
    fn test_summarize_ties_keep_first_seen_order() {
        let events = vec![event("Milk", 10.0), event("Rice", 10.0)];
        let summary = summarize(&events);
        assert_eq!(summary.top_products[0].product_name, "Milk");
        assert_eq!(summary.top_products[1].product_name, "Rice");
    }
}
