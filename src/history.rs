//! 推定履歴とサマリー

use crate::auth::generate_id;
use crate::error::Result;
use crate::store::{KeyValueStore, KeyValueStoreExt, EVENTS_KEY};
use water_footprint_common::{summarize, EstimationEvent, EstimationResult, Summary, User};

pub struct HistoryService<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> HistoryService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn all_events(&self) -> Result<Vec<EstimationEvent>> {
        self.store.load_or_default(EVENTS_KEY)
    }

    /// 推定結果をユーザーの履歴に追加
    pub fn record(&self, user: &User, result: &EstimationResult) -> Result<EstimationEvent> {
        let event = EstimationEvent::from_result(generate_id(), user.id.clone(), result);

        let mut events = self.all_events()?;
        events.push(event.clone());
        self.store.save(EVENTS_KEY, &events)?;

        tracing::debug!("履歴を追加: {} {} L", event.product_name, event.water_liters);
        Ok(event)
    }

    /// ユーザーの履歴（新しい順）
    pub fn events_for(&self, user_id: &str) -> Result<Vec<EstimationEvent>> {
        let mut events: Vec<_> = self
            .all_events()?
            .into_iter()
            .filter(|e| e.user_id == user_id)
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    pub fn summary_for(&self, user_id: &str) -> Result<Summary> {
        let events = self.all_events()?;
        Ok(summarize(events.iter().filter(|e| e.user_id == user_id)))
    }
}
