use tokio::sync::watch;

use crate::{
    error::StoreError,
    model::{Location, LocationId},
    settings::{Settings, decode_value, encode_value},
};

const LOCATIONS_KEY: &str = "LOCATIONS";

/// Persisted list of tracked locations.
///
/// Every mutation goes through [`LocationStore::set_locations`], which writes the
/// list back to settings and publishes it to observers.
pub struct LocationStore<S: Settings> {
    settings: S,
    tx: watch::Sender<Vec<Location>>,
}

impl<S: Settings> LocationStore<S> {
    pub fn new(settings: S) -> Result<Self, StoreError> {
        let initial = decode_value(&settings, LOCATIONS_KEY, Vec::new())?;
        let (tx, _rx) = watch::channel(initial);
        Ok(Self { settings, tx })
    }

    pub fn locations(&self) -> Result<Vec<Location>, StoreError> {
        decode_value(&self.settings, LOCATIONS_KEY, Vec::new())
    }

    pub fn set_locations(&self, locations: Vec<Location>) -> Result<(), StoreError> {
        encode_value(&self.settings, LOCATIONS_KEY, &locations)?;
        tracing::debug!(count = locations.len(), "locations saved");
        self.tx.send_replace(locations);
        Ok(())
    }

    /// Append `location`, or replace the stored entry that has the same id.
    pub fn add_location(&self, location: Location) -> Result<(), StoreError> {
        let mut locations = self.locations()?;
        match locations.iter_mut().find(|l| l.id == location.id) {
            Some(existing) => *existing = location,
            None => locations.push(location),
        }
        self.set_locations(locations)
    }

    /// Remove the first entry equal to `location`. Returns whether anything was removed.
    pub fn remove_location(&self, location: &Location) -> Result<bool, StoreError> {
        let mut locations = self.locations()?;
        let Some(pos) = locations.iter().position(|l| l == location) else {
            return Ok(false);
        };
        locations.remove(pos);
        self.set_locations(locations)?;
        Ok(true)
    }

    pub fn remove_by_id(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        let mut locations = self.locations()?;
        let Some(pos) = locations.iter().position(|l| l.location_id() == id) else {
            return Ok(None);
        };
        let removed = locations.remove(pos);
        self.set_locations(locations)?;
        Ok(Some(removed))
    }

    pub fn find(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.locations()?.into_iter().find(|l| l.location_id() == id))
    }

    /// Re-read the persisted list and publish it if it differs from the last one seen.
    ///
    /// Picks up edits made through another store on the same settings, e.g. another process.
    pub fn reload(&self) -> Result<bool, StoreError> {
        let fresh = self.locations()?;
        let changed = self.tx.send_if_modified(|current| {
            if *current == fresh {
                return false;
            }
            *current = fresh;
            true
        });
        if changed {
            tracing::debug!("location list changed on disk");
        }
        Ok(changed)
    }

    /// Receiver that starts at the current list and sees every later change.
    pub fn observe(&self) -> watch::Receiver<Vec<Location>> {
        self.tx.subscribe()
    }
}
