//! Service layer tying the database, configuration, and view cache together.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::info;

use crate::config::StaticConfig;
use crate::db::{Database, DashboardStats};
use crate::error::ServiceResult;
use crate::views::{VIEW_BROWSE, VIEW_DASHBOARD, VIEW_MANAGE, ViewCache};

pub struct SyllabusService {
    pub db: Arc<Database>,
    pub config: Arc<StaticConfig>,
    pub views: ViewCache,
    /// Dashboard aggregates memoized against the dashboard view generation
    dashboard_cache: ArcSwapOption<(u64, DashboardStats)>,
}

impl SyllabusService {
    pub fn new(db: Arc<Database>, config: Arc<StaticConfig>) -> Self {
        Self {
            db,
            config,
            views: ViewCache::new(),
            dashboard_cache: ArcSwapOption::empty(),
        }
    }

    /// Dashboard aggregates, recomputed only after the dashboard view has
    /// been invalidated
    pub fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        let generation = self.views.generation(VIEW_DASHBOARD);

        if let Some(cached) = self.dashboard_cache.load_full()
            && cached.0 == generation
        {
            return Ok(cached.1.clone());
        }

        let stats = self.db.dashboard_stats()?;
        self.dashboard_cache
            .store(Some(Arc::new((generation, stats.clone()))));
        Ok(stats)
    }

    /// Mark the given views stale
    pub fn invalidate_views(&self, paths: &[&str]) {
        info!(views = ?paths, "Invalidating cached views");
        self.views.invalidate(paths);
    }

    pub fn delete_texts(&self, ids: &[i64]) -> ServiceResult<usize> {
        let deleted = self.db.delete_texts(ids)?;
        self.invalidate_views(&[VIEW_DASHBOARD, VIEW_BROWSE, VIEW_MANAGE]);
        Ok(deleted)
    }

    pub fn delete_author(&self, id: i64) -> ServiceResult<bool> {
        let deleted = self.db.delete_author(id)?;
        self.invalidate_views(&[VIEW_DASHBOARD, VIEW_BROWSE, VIEW_MANAGE]);
        Ok(deleted)
    }

    pub fn delete_university(&self, id: i64) -> ServiceResult<bool> {
        let deleted = self.db.delete_university(id)?;
        self.invalidate_views(&[VIEW_DASHBOARD, VIEW_BROWSE, VIEW_MANAGE]);
        Ok(deleted)
    }

    pub fn delete_semester(&self, university_id: i64, semester: i64) -> ServiceResult<usize> {
        let deleted = self.db.delete_semester(university_id, semester)?;
        self.invalidate_views(&[VIEW_DASHBOARD, VIEW_BROWSE, VIEW_MANAGE]);
        Ok(deleted)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::{ExtractorConfig, StorageConfig, default_server};
    use std::path::Path;

    /// Build a service over a temp data dir, with the extractor pointed at a
    /// shell script (sh also understands `-u`, so the real spawn path runs).
    pub(crate) fn service_with_script(
        dir: &Path,
        script_body: &str,
        max_runtime_secs: Option<u64>,
    ) -> Arc<SyllabusService> {
        let script = dir.join("fake-extractor.sh");
        std::fs::write(&script, script_body).unwrap();

        let config = Arc::new(StaticConfig {
            server: default_server(),
            storage: StorageConfig {
                data_dir: dir.join("data"),
            },
            extractor: ExtractorConfig {
                interpreter: "sh".to_string(),
                script,
                max_runtime_secs,
            },
        });

        let db = Arc::new(Database::open(&config.storage.db_path()).unwrap());
        Arc::new(SyllabusService::new(db, config))
    }
}
