use futures::future::join_all;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    api::WeatherApi,
    model::{Location, LocationId, WeatherResult},
};

/// Lazily populated cache of current-weather results, one entry per location.
///
/// Failed fetches are cached as well; [`WeatherRepository::clear_cache`] is the
/// only way back to the network for them.
#[derive(Debug)]
pub struct WeatherRepository<A: WeatherApi> {
    api: Arc<A>,
    cache: Mutex<HashMap<LocationId, WeatherResult>>,
}

impl<A: WeatherApi> WeatherRepository<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api, cache: Mutex::new(HashMap::new()) }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub async fn current_weather(&self, id: LocationId) -> WeatherResult {
        if let Some(hit) = self.cached(id) {
            tracing::trace!(%id, "weather cache hit");
            return hit;
        }

        let fetched = self.api.current_weather(id).await;
        if let Err(err) = &fetched {
            tracing::debug!(%id, error = %err, "caching failed weather fetch");
        }

        // A concurrent miss may have filled the slot while we were fetching.
        self.cache.lock().entry(id).or_insert(fetched).clone()
    }

    /// Results for every location, in input order. Each distinct id is fetched once.
    pub async fn current_weather_for_all(
        &self,
        locations: &[Location],
    ) -> Vec<(Location, WeatherResult)> {
        let mut seen = HashSet::new();
        let ids: Vec<LocationId> = locations
            .iter()
            .map(Location::location_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let results = join_all(ids.iter().map(|id| self.current_weather(*id))).await;
        let by_id: HashMap<LocationId, WeatherResult> = ids.into_iter().zip(results).collect();

        locations
            .iter()
            .filter_map(|l| by_id.get(&l.location_id()).map(|r| (l.clone(), r.clone())))
            .collect()
    }

    pub fn cached(&self, id: LocationId) -> Option<WeatherResult> {
        self.cache.lock().get(&id).cloned()
    }

    pub fn invalidate(&self, id: LocationId) {
        self.cache.lock().remove(&id);
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        tracing::debug!(entries = cache.len(), "clearing weather cache");
        cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
