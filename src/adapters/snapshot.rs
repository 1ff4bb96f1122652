use crate::domain::ports::{VenueVisitor, VisitError};
use async_trait::async_trait;
use std::path::PathBuf;

/// 離線造訪者：從資料夾讀取每個場館事先存好的 store
///
/// `navigate("curzon-soho")` succeeds when `<dir>/curzon-soho.json` exists;
/// the file content is then what `read_serialized_store` returns. An empty
/// file reads as "no store".
#[derive(Debug, Clone)]
pub struct SnapshotVisitor {
    dir: PathBuf,
    current: Option<PathBuf>,
}

impl SnapshotVisitor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    fn snapshot_path(&self, slug: &str) -> Result<PathBuf, VisitError> {
        if slug.is_empty() || slug.contains(['/', '\\']) || slug.starts_with('.') {
            return Err(VisitError::new(format!("refusing snapshot name '{slug}'")));
        }
        Ok(self.dir.join(format!("{slug}.json")))
    }
}

#[async_trait]
impl VenueVisitor for SnapshotVisitor {
    async fn navigate(&mut self, slug: &str) -> Result<(), VisitError> {
        self.current = None;
        let path = self.snapshot_path(slug)?;
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {
                tracing::debug!("Replaying snapshot {}", path.display());
                self.current = Some(path);
                Ok(())
            }
            Ok(false) => Err(VisitError::new(format!("no snapshot at {}", path.display()))),
            Err(e) => Err(VisitError::new(format!("{}: {}", path.display(), e))),
        }
    }

    async fn read_serialized_store(&mut self) -> Result<Option<String>, VisitError> {
        let Some(path) = &self.current else {
            return Ok(None);
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| VisitError::new(format!("{}: {}", path.display(), e)))?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}
