use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::Alert;
use crate::error::Result;

/// Newest-first alert history kept in a single JSON file and capped at
/// `capacity` entries.
///
/// Saves are serialized through `write_lock` so concurrent webhooks cannot
/// lose each other's inserts, and each save replaces the file through a
/// rename so readers never observe a half-written history.
pub struct AlertStore {
    path: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl AlertStore {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Full persisted history; a history that was never written is empty.
    pub async fn load(&self) -> Result<Vec<Alert>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    pub async fn save(&self, alert: &Alert) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut alerts = self.load().await?;
        alerts.insert(0, alert.clone());
        alerts.truncate(self.capacity);

        self.replace(&alerts).await?;
        debug!("Alert history now holds {} entries", alerts.len());
        Ok(())
    }

    async fn replace(&self, alerts: &[Alert]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(alerts)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "alerts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn alert(n: usize) -> Alert {
        Alert {
            token: "So11111111111111111111111111111111111111112".to_string(),
            amount: 1_000_000_000.0 + n as f64,
            usd_value: 60_000_000.0,
            source: format!("from-{n}"),
            destination: format!("to-{n}"),
            tx_link: format!("https://solscan.io/tx/sig-{n}"),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(n as i64),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path().join("alerts.json"), 15);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saves_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path().join("alerts.json"), 15);

        store.save(&alert(1)).await.unwrap();
        store.save(&alert(2)).await.unwrap();
        store.save(&alert(3)).await.unwrap();

        assert_eq!(store.load().await.unwrap(), vec![alert(3), alert(2), alert(1)]);
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path().join("alerts.json"), 15);
        for n in 1..=15 {
            store.save(&alert(n)).await.unwrap();
        }
        assert_eq!(store.load().await.unwrap().len(), 15);

        store.save(&alert(16)).await.unwrap();

        let history = store.load().await.unwrap();
        assert_eq!(history.len(), 15);
        assert_eq!(history[0], alert(16));
        assert_eq!(history[14], alert(2));
        assert!(!history.contains(&alert(1)));
    }

    #[tokio::test]
    async fn concurrent_saves_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(AlertStore::new(dir.path().join("alerts.json"), 100));

        let handles: Vec<_> = (0..40)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move { store.save(&alert(n)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let history = store.load().await.unwrap();
        assert_eq!(history.len(), 40);
        for n in 0..40 {
            assert!(history.contains(&alert(n)), "alert {n} was lost");
        }
    }

    #[tokio::test]
    async fn writes_pretty_camel_case_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        let store = AlertStore::new(&path, 15);
        store.save(&alert(1)).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"token\""));
        assert!(raw.contains("\"usdValue\""));
        assert!(raw.contains("\"txLink\""));
        assert!(!dir.path().join("alerts.json.tmp").exists());
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path().join("data/feed/alerts.json"), 15);
        store.save(&alert(1)).await.unwrap();
        assert_eq!(store.load().await.unwrap(), vec![alert(1)]);
    }

    #[tokio::test]
    async fn corrupt_history_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        std::fs::write(&path, "{ not an array").unwrap();
        let store = AlertStore::new(&path, 15);

        assert!(store.load().await.unwrap_err().is_storage());
        assert!(store.save(&alert(1)).await.unwrap_err().is_storage());
        // The corrupt file is left for the operator rather than overwritten.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not an array");
    }

    #[tokio::test]
    async fn unreadable_path_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path(), 15);
        assert!(store.load().await.unwrap_err().is_storage());
    }
}
