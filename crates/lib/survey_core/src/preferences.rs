//! Persisted kiosk preferences: selected building, workshop-day default and
//! kiosk mode.

use tracing::debug;

use crate::config::{ClientConfig, StorageKeys};
use crate::models::building::{BuildingError, BuildingNumber};
use crate::store::{self, SharedStore};

/// Preference accessors over the session store. Storage failures read as
/// "unset" and writes are best effort.
pub struct Preferences {
    store: SharedStore,
    keys: StorageKeys,
    quick_picks: Vec<u16>,
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("quick_picks", &self.quick_picks)
            .finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn new(config: &ClientConfig, store: SharedStore) -> Self {
        Self {
            store,
            keys: config.storage.clone(),
            quick_picks: config.quick_pick_buildings.clone(),
        }
    }

    /// Quick-pick building codes.
    pub fn quick_picks(&self) -> &[u16] {
        &self.quick_picks
    }

    /// The selected building. A `b` query value overrides the stored one and
    /// is persisted; unparseable or out-of-range values count as unset.
    pub fn selected_building(&self, query_building: Option<&str>) -> Option<BuildingNumber> {
        if let Some(raw) = query_building.filter(|r| !r.trim().is_empty()) {
            match BuildingNumber::parse_qr_input(raw) {
                Ok(b) => {
                    store::write_best_effort(self.store.as_ref(), &self.keys.building, &b.to_string());
                    return Some(b);
                }
                Err(_) => debug!(raw, "ignoring invalid building query parameter"),
            }
        }
        store::read_or_none(self.store.as_ref(), &self.keys.building)
            .and_then(|raw| BuildingNumber::parse_qr_input(&raw).ok())
    }

    /// Select a quick-pick or custom (101–499) building and persist it.
    pub fn select_building(&self, n: u16) -> Result<BuildingNumber, BuildingError> {
        let building = BuildingNumber::for_selection(n, &self.quick_picks)?;
        store::write_best_effort(self.store.as_ref(), &self.keys.building, &building.to_string());
        Ok(building)
    }

    /// Forget the selected building (back to building selection).
    pub fn clear_building(&self) {
        store::remove_best_effort(self.store.as_ref(), &self.keys.building);
    }

    /// Stored workshop-day preference.
    pub fn workshop_day(&self) -> bool {
        store::read_or_none(self.store.as_ref(), &self.keys.workshop_day).as_deref() == Some("true")
    }

    pub fn set_workshop_day(&self, on: bool) {
        store::write_best_effort(
            self.store.as_ref(),
            &self.keys.workshop_day,
            if on { "true" } else { "false" },
        );
    }

    /// Default for the survey's workshop question: `wd=1` on the page, or
    /// the stored preference.
    pub fn prefer_workshop_day(&self, query_workshop_day: bool) -> bool {
        query_workshop_day || self.workshop_day()
    }

    pub fn is_kiosk(&self) -> bool {
        store::read_or_none(self.store.as_ref(), &self.keys.kiosk).as_deref() == Some("1")
    }

    /// Enter (`"1"`) or leave (key removed) kiosk mode.
    pub fn set_kiosk(&self, on: bool) {
        if on {
            store::write_best_effort(self.store.as_ref(), &self.keys.kiosk, "1");
        } else {
            store::remove_best_effort(self.store.as_ref(), &self.keys.kiosk);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::testing::FailingStore;
    use crate::store::{MemoryStore, SessionStore};

    fn prefs() -> (Preferences, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = ClientConfig::for_proxy("http://proxy", "http://kiosk/");
        (Preferences::new(&config, store.clone()), store)
    }

    #[test]
    fn query_building_overrides_and_persists() {
        let (prefs, store) = prefs();
        store.set("selectedBuilding", "116").unwrap();

        let b = prefs.selected_building(Some("303")).unwrap();
        assert_eq!(b.get(), 303);
        assert_eq!(store.get("selectedBuilding").unwrap().as_deref(), Some("303"));
        assert_eq!(prefs.selected_building(None).unwrap().get(), 303);
    }

    #[test]
    fn invalid_query_building_falls_back_to_store() {
        let (prefs, store) = prefs();
        store.set("selectedBuilding", "116").unwrap();
        assert_eq!(prefs.selected_building(Some("9999")).unwrap().get(), 116);
    }

    #[test]
    fn corrupt_stored_building_reads_as_unset() {
        let (prefs, store) = prefs();
        store.set("selectedBuilding", "NaN").unwrap();
        assert!(prefs.selected_building(None).is_none());
    }

    #[test]
    fn selection_respects_ranges() {
        let (prefs, store) = prefs();
        assert_eq!(prefs.select_building(358).unwrap().get(), 358);
        assert_eq!(
            prefs.select_building(500),
            Err(BuildingError::OutOfCustomRange)
        );
        assert_eq!(store.get("selectedBuilding").unwrap().as_deref(), Some("358"));

        prefs.clear_building();
        assert!(prefs.selected_building(None).is_none());
    }

    #[test]
    fn workshop_day_preference() {
        let (prefs, store) = prefs();
        assert!(!prefs.workshop_day());
        assert!(prefs.prefer_workshop_day(true));

        prefs.set_workshop_day(true);
        assert_eq!(store.get("workshopDay").unwrap().as_deref(), Some("true"));
        assert!(prefs.prefer_workshop_day(false));

        prefs.set_workshop_day(false);
        assert_eq!(store.get("workshopDay").unwrap().as_deref(), Some("false"));
        assert!(!prefs.workshop_day());
    }

    #[test]
    fn kiosk_flag_is_one_or_absent() {
        let (prefs, store) = prefs();
        prefs.set_kiosk(true);
        assert_eq!(store.get("kioskMode").unwrap().as_deref(), Some("1"));
        assert!(prefs.is_kiosk());
        prefs.set_kiosk(false);
        assert!(store.get("kioskMode").unwrap().is_none());
    }

    #[test]
    fn broken_storage_reads_as_defaults() {
        let config = ClientConfig::for_proxy("http://proxy", "http://kiosk/");
        let prefs = Preferences::new(&config, Arc::new(FailingStore));
        assert!(prefs.selected_building(Some("101")).is_some());
        assert!(prefs.selected_building(None).is_none());
        assert!(!prefs.workshop_day());
        assert!(!prefs.is_kiosk());
    }
}
