use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

use crate::compactor;
use crate::engine::Engine;
use crate::limits::*;
use crate::notify::NotifyHub;

/// Manages per-facility engines. Each facility gets its own roster state,
/// WAL file, and compactor task. Dates never cross facilities — every date
/// in one engine is a naive calendar date in that facility's local zone.
pub struct FacilityManager {
    engines: DashMap<String, Arc<Engine>>,
    data_dir: PathBuf,
    compact_threshold: u64,
}

impl FacilityManager {
    pub fn new(data_dir: PathBuf, compact_threshold: u64) -> Self {
        Self {
            engines: DashMap::new(),
            data_dir,
            compact_threshold,
        }
    }

    /// Get or lazily open the engine for the given facility.
    pub fn get_or_create(&self, facility: &str) -> std::io::Result<Arc<Engine>> {
        if let Some(engine) = self.engines.get(facility) {
            return Ok(engine.value().clone());
        }
        if facility.len() > MAX_FACILITY_NAME_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "facility name too long",
            ));
        }
        if self.engines.len() >= MAX_FACILITIES {
            return Err(std::io::Error::other("too many facilities"));
        }

        // Sanitize the facility name to prevent path traversal
        let safe_name: String = facility
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if safe_name.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty facility name",
            ));
        }

        let wal_path = self.data_dir.join(format!("{safe_name}.wal"));
        let notify = Arc::new(NotifyHub::new());
        let engine = Arc::new(Engine::open(wal_path, notify)?);

        let compactor_engine = engine.clone();
        let threshold = self.compact_threshold;
        tokio::spawn(async move {
            compactor::run_compactor(compactor_engine, threshold).await;
        });

        self.engines.insert(facility.to_string(), engine.clone());
        metrics::gauge!(crate::observability::FACILITIES_ACTIVE).set(self.engines.len() as f64);
        tracing::info!("opened facility {facility}");
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use ulid::Ulid;

    fn test_data_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("rota_test_facility").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn facility_isolation() {
        let dir = test_data_dir("isolation");
        let fm = FacilityManager::new(dir, 1000);

        let north = fm.get_or_create("north").unwrap();
        let south = fm.get_or_create("south").unwrap();

        // Same staff id registered in both facilities
        let id = Ulid::new();
        north.register_staff(id, "Dr. Aalto".into(), None).await.unwrap();
        south.register_staff(id, "Dr. Aalto".into(), None).await.unwrap();

        north.add_holidays(&[d("2025-01-01")]).await.unwrap();

        assert_eq!(
            north.resolve_day(id, d("2025-01-01")).await.unwrap(),
            Some(crate::model::ResolvedShift::DayOff)
        );
        assert_eq!(
            south.resolve_day(id, d("2025-01-01")).await.unwrap(),
            Some(crate::model::ResolvedShift::Unscheduled)
        );
    }

    #[tokio::test]
    async fn facility_lazy_creation() {
        let dir = test_data_dir("lazy");
        let fm = FacilityManager::new(dir.clone(), 1000);

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert!(entries.is_empty());

        let _engine = fm.get_or_create("central").unwrap();
        assert!(dir.join("central.wal").exists());
    }

    #[tokio::test]
    async fn facility_same_engine_returned() {
        let dir = test_data_dir("same_engine");
        let fm = FacilityManager::new(dir, 1000);

        let first = fm.get_or_create("central").unwrap();
        let second = fm.get_or_create("central").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn facility_name_sanitized() {
        let dir = test_data_dir("sanitize");
        let fm = FacilityManager::new(dir.clone(), 1000);

        let _engine = fm.get_or_create("../evil").unwrap();
        assert!(dir.join("evil.wal").exists());

        let result = fm.get_or_create("../..");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn facility_name_too_long() {
        let dir = test_data_dir("name_too_long");
        let fm = FacilityManager::new(dir, 1000);

        let long_name = "x".repeat(MAX_FACILITY_NAME_LEN + 1);
        let err = fm.get_or_create(&long_name).unwrap_err();
        assert!(err.to_string().contains("facility name too long"));
    }

    #[tokio::test]
    async fn facility_count_limit() {
        let dir = test_data_dir("count_limit");
        let fm = FacilityManager::new(dir, 1000);

        for i in 0..MAX_FACILITIES {
            fm.get_or_create(&format!("f{i}")).unwrap();
        }
        let err = fm.get_or_create("one_more").unwrap_err();
        assert!(err.to_string().contains("too many facilities"));
    }
}
