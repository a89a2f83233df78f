//! Per-id blob persistence and collection merge primitives.
//!
//! Every pipeline stage reads its input and writes its output through a
//! [`BlobStore`]: one JSON file per record under a collection directory,
//! addressed by the record's own id. A collection can be folded into a
//! single id-keyed artifact with [`BlobStore::merge`], which is what the
//! downstream consumer ingests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use jobharvest_shared::{Identified, JobharvestError, Result};

/// Well-known collection names, kept in one place so stages agree.
pub mod collections {
    /// Raw listing HTML, one file per page number.
    pub const JOB_LISTING_HTML: &str = "html/job-listings";
    pub const COMPANY_LISTING_HTML: &str = "html/company-listings";
    /// Raw detail HTML, one file per record id.
    pub const JOB_HTML: &str = "html/jobs";
    pub const COMPANY_HTML: &str = "html/companies";

    /// Extracted records, before linking.
    pub const RAW_JOBS: &str = "scrap/jobs";
    pub const RAW_COMPANIES: &str = "scrap/companies";

    /// Linked records and the orphans set aside at link time.
    pub const LINKED_OFFERS: &str = "linked/offers";
    pub const LINKED_COMPANIES: &str = "linked/companies";
    pub const ORPHANS: &str = "linked/orphans";

    /// Converted, projected records in the destination shape.
    pub const BOARD_OFFERS: &str = "board/offers";
    pub const BOARD_COMPANIES: &str = "board/companies";
}

/// File-backed record store rooted at one output directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    fn record_path(&self, collection: &str, id: &str, ext: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{id}.{ext}"))
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// Persist one record under `collection`, named after its own id.
    pub fn write<T: Serialize + Identified>(&self, collection: &str, record: &T) -> Result<()> {
        self.write_with_id(collection, record.id(), record)
    }

    /// Persist one record under an explicit id.
    pub fn write_with_id<T: Serialize>(&self, collection: &str, id: &str, record: &T) -> Result<()> {
        let path = self.record_path(collection, id, "json");
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| JobharvestError::Blob(format!("{collection}/{id}: {e}")))?;
        write_atomic(&path, json.as_bytes())
    }

    /// Read one record back by id.
    pub fn read<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T> {
        let path = self.record_path(collection, id, "json");
        let content =
            std::fs::read_to_string(&path).map_err(|e| JobharvestError::io(&path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| JobharvestError::Blob(format!("{collection}/{id}: {e}")))
    }

    /// Whether a record exists in a collection.
    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.record_path(collection, id, "json").exists()
    }

    /// Remove one record. Missing records are fine (idempotent re-runs).
    pub fn remove(&self, collection: &str, id: &str) -> Result<()> {
        let path = self.record_path(collection, id, "json");
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JobharvestError::io(&path, e)),
        }
    }

    /// Sorted ids of all records in a collection. An absent collection
    /// directory is an empty collection.
    pub fn ids(&self, collection: &str) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| JobharvestError::io(&dir, e))? {
            let entry = entry.map_err(|e| JobharvestError::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Read a whole collection into an id-keyed, id-sorted map.
    pub fn read_all<T: DeserializeOwned>(&self, collection: &str) -> Result<BTreeMap<String, T>> {
        let mut records = BTreeMap::new();
        for id in self.ids(collection)? {
            records.insert(id.clone(), self.read(collection, &id)?);
        }
        Ok(records)
    }

    /// Move one record between collections. The record ends up in exactly
    /// one place; a leftover source file is an error, not a warning.
    pub fn move_record(&self, id: &str, from: &str, to: &str) -> Result<()> {
        let src = self.record_path(from, id, "json");
        let dst = self.record_path(to, id, "json");
        ensure_parent(&dst)?;
        std::fs::rename(&src, &dst).map_err(|e| JobharvestError::io(&src, e))?;
        debug!(id, from, to, "moved record");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // HTML page blobs
    // -----------------------------------------------------------------------

    /// Persist a fetched HTML page so extraction can re-run offline.
    pub fn write_html(&self, collection: &str, id: &str, html: &str) -> Result<()> {
        let path = self.record_path(collection, id, "html");
        write_atomic(&path, html.as_bytes())
    }

    /// Read a previously fetched HTML page.
    pub fn read_html(&self, collection: &str, id: &str) -> Result<String> {
        let path = self.record_path(collection, id, "html");
        std::fs::read_to_string(&path).map_err(|e| JobharvestError::io(&path, e))
    }

    /// Sorted ids of the HTML pages in a collection.
    pub fn html_ids(&self, collection: &str) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| JobharvestError::io(&dir, e))? {
            let entry = entry.map_err(|e| JobharvestError::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Merged artifacts
    // -----------------------------------------------------------------------

    /// Fold all records of a collection into one id-keyed artifact next to
    /// the collection directory (`scrap/jobs` → `scrap/all_jobs.json`).
    ///
    /// Records are keyed by their own `id` field; keys come out sorted, so
    /// the artifact is independent of filesystem iteration order.
    pub fn merge(&self, collection: &str) -> Result<PathBuf> {
        let mut merged: BTreeMap<String, serde_json::Value> = BTreeMap::new();

        for id in self.ids(collection)? {
            let value: serde_json::Value = self.read(collection, &id)?;
            let key = match value.get("id").and_then(|v| v.as_str()) {
                Some(record_id) => record_id.to_string(),
                None => {
                    warn!(collection, id = %id, "record has no id field, keyed by file name");
                    id.clone()
                }
            };
            merged.insert(key, value);
        }

        let artifact = self.merge_artifact_path(collection);
        let json = serde_json::to_string_pretty(&merged)
            .map_err(|e| JobharvestError::Blob(format!("merge {collection}: {e}")))?;
        write_atomic(&artifact, json.as_bytes())?;

        debug!(collection, records = merged.len(), path = %artifact.display(), "merged collection");
        Ok(artifact)
    }

    /// Path of the merged artifact for a collection.
    pub fn merge_artifact_path(&self, collection: &str) -> PathBuf {
        let (parent, name) = match collection.rsplit_once('/') {
            Some((parent, name)) => (self.root.join(parent), name),
            None => (self.root.clone(), collection),
        };
        parent.join(format!("all_{name}.json"))
    }

    /// Copy merged artifacts into the consumer hand-off directory.
    pub fn deploy(&self, merges: &[(&str, &str)], dest: &Path) -> Result<()> {
        std::fs::create_dir_all(dest).map_err(|e| JobharvestError::io(dest, e))?;
        for (collection, target_name) in merges {
            let artifact = self.merge_artifact_path(collection);
            if !artifact.exists() {
                return Err(JobharvestError::validation(format!(
                    "merged artifact '{}' does not exist, run merge first",
                    artifact.display()
                )));
            }
            let target = dest.join(target_name);
            std::fs::copy(&artifact, &target).map_err(|e| JobharvestError::io(&target, e))?;
        }
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| JobharvestError::io(parent, e))?;
    }
    Ok(())
}

/// Write to a temp file then rename, so readers never observe a torn blob.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| JobharvestError::Blob(format!("bad blob path {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| JobharvestError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| JobharvestError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: String,
        label: String,
    }

    impl Identified for Widget {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn temp_store(tag: &str) -> BlobStore {
        let dir = std::env::temp_dir().join(format!(
            "jobharvest-blobs-{tag}-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        BlobStore::new(dir)
    }

    fn cleanup(store: &BlobStore) {
        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn write_read_roundtrip() {
        let store = temp_store("roundtrip");
        let widget = Widget {
            id: "w1".into(),
            label: "first".into(),
        };
        store.write("widgets", &widget).unwrap();
        let back: Widget = store.read("widgets", "w1").unwrap();
        assert_eq!(back, widget);
        cleanup(&store);
    }

    #[test]
    fn read_all_sorted_by_id() {
        let store = temp_store("readall");
        for id in ["b", "c", "a"] {
            let widget = Widget {
                id: id.into(),
                label: id.to_uppercase(),
            };
            store.write("widgets", &widget).unwrap();
        }
        let all: BTreeMap<String, Widget> = store.read_all("widgets").unwrap();
        let ids: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        cleanup(&store);
    }

    #[test]
    fn missing_collection_is_empty() {
        let store = temp_store("missing");
        assert!(store.ids("nothing/here").unwrap().is_empty());
        let all: BTreeMap<String, Widget> = store.read_all("nothing/here").unwrap();
        assert!(all.is_empty());
        cleanup(&store);
    }

    #[test]
    fn move_record_leaves_exactly_one_copy() {
        let store = temp_store("move");
        let widget = Widget {
            id: "w1".into(),
            label: "mover".into(),
        };
        store.write("from", &widget).unwrap();
        store.move_record("w1", "from", "to").unwrap();

        assert!(!store.contains("from", "w1"));
        let back: Widget = store.read("to", "w1").unwrap();
        assert_eq!(back.label, "mover");
        cleanup(&store);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = temp_store("remove");
        let widget = Widget {
            id: "w1".into(),
            label: "gone".into(),
        };
        store.write("widgets", &widget).unwrap();
        store.remove("widgets", "w1").unwrap();
        store.remove("widgets", "w1").unwrap();
        assert!(!store.contains("widgets", "w1"));
        cleanup(&store);
    }

    #[test]
    fn merge_keys_every_record_by_its_id() {
        let store = temp_store("merge");
        for id in ["x", "y", "z"] {
            let widget = Widget {
                id: id.into(),
                label: format!("widget {id}"),
            };
            store.write("scrap/widgets", &widget).unwrap();
        }

        let artifact = store.merge("scrap/widgets").unwrap();
        assert!(artifact.ends_with("scrap/all_widgets.json"));

        let content = std::fs::read_to_string(&artifact).unwrap();
        let merged: BTreeMap<String, Widget> = serde_json::from_str(&content).unwrap();
        assert_eq!(merged.len(), 3);
        for id in ["x", "y", "z"] {
            assert_eq!(merged[id].id, id);
        }
        cleanup(&store);
    }

    #[test]
    fn html_blob_roundtrip() {
        let store = temp_store("html");
        store
            .write_html(collections::JOB_HTML, "123", "<html>hi</html>")
            .unwrap();
        let html = store.read_html(collections::JOB_HTML, "123").unwrap();
        assert_eq!(html, "<html>hi</html>");
        assert_eq!(store.html_ids(collections::JOB_HTML).unwrap(), vec!["123"]);
        cleanup(&store);
    }

    #[test]
    fn deploy_requires_merged_artifacts() {
        let store = temp_store("deploy");
        let dest = store.root().join("handoff");

        let err = store.deploy(&[("scrap/widgets", "widgets.json")], &dest);
        assert!(err.is_err());

        let widget = Widget {
            id: "w1".into(),
            label: "shipped".into(),
        };
        store.write("scrap/widgets", &widget).unwrap();
        store.merge("scrap/widgets").unwrap();
        store
            .deploy(&[("scrap/widgets", "widgets.json")], &dest)
            .unwrap();
        assert!(dest.join("widgets.json").exists());
        cleanup(&store);
    }
}
