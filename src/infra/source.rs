//! Entry sources backed by local data.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tracing::debug;

use crate::application::repos::{MenuSource, SourceError};
use crate::domain::menu::{MenuEntry, MenuId};

/// Reads menus from a JSON export on disk.
///
/// The file holds either a bare array of entries (served for any menu id)
/// or an object keyed by menu id whose values are arrays or `null`:
///
/// ```json
/// { "5": [{ "id": 1, "parent": 0, "title": "Home", "url": "/" }], "6": null }
/// ```
///
/// The file is re-read on every call so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct JsonFileMenuSource {
    path: PathBuf,
}

impl JsonFileMenuSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Menus keyed by their id as written in the export (`"5"`, `" 05 "`, ...).
type KeyedExport = HashMap<String, Option<Vec<MenuEntry>>>;

impl JsonFileMenuSource {
    fn decode(&self, bytes: &[u8], menu: MenuId) -> Result<Vec<MenuEntry>, SourceError> {
        let decode_error = |source| SourceError::Decode {
            path: self.path.clone(),
            source,
        };

        let bare_array = bytes
            .iter()
            .find(|byte| !byte.is_ascii_whitespace())
            .is_some_and(|byte| *byte == b'[');
        if bare_array {
            return serde_json::from_slice::<Vec<MenuEntry>>(bytes).map_err(decode_error);
        }

        let export: KeyedExport = serde_json::from_slice(bytes).map_err(decode_error)?;
        let mut menus: HashMap<MenuId, Option<Vec<MenuEntry>>> =
            HashMap::with_capacity(export.len());
        for (key, entries) in export {
            let Ok(id) = key.parse::<MenuId>() else {
                debug!(path = %self.path.display(), key = %key, "Skipping non-numeric menu key");
                continue;
            };
            if menus.insert(id, entries).is_some() {
                return Err(SourceError::DuplicateMenu {
                    path: self.path.clone(),
                    menu: id,
                });
            }
        }

        Ok(menus.remove(&menu).flatten().unwrap_or_default())
    }
}

#[async_trait]
impl MenuSource for JsonFileMenuSource {
    async fn list_menu_entries(&self, menu: MenuId) -> Result<Vec<MenuEntry>, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let entries = self.decode(&bytes, menu)?;

        debug!(
            path = %self.path.display(),
            menu = %menu,
            entries = entries.len(),
            "Loaded menu entries"
        );
        Ok(entries)
    }
}

/// Serves fixed menus held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticMenuSource {
    menus: HashMap<MenuId, Vec<MenuEntry>>,
}

impl StaticMenuSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_menu(mut self, menu: MenuId, entries: Vec<MenuEntry>) -> Self {
        self.menus.insert(menu, entries);
        self
    }
}

#[async_trait]
impl MenuSource for StaticMenuSource {
    async fn list_menu_entries(&self, menu: MenuId) -> Result<Vec<MenuEntry>, SourceError> {
        Ok(self.menus.get(&menu).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn export_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tmp file");
        file.write_all(contents.as_bytes()).expect("write export");
        file
    }

    #[tokio::test]
    async fn bare_array_serves_every_menu() {
        let file = export_file(r#"[{"id": 1, "parent": 0}, {"id": 2, "parent": 1}]"#);
        let source = JsonFileMenuSource::new(file.path());

        let entries = source
            .list_menu_entries(MenuId::new(9))
            .await
            .expect("entries");

        let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn keyed_export_selects_requested_menu() {
        let file = export_file(
            r#"{"5": [{"id": 1, "parent": 0, "title": "Home"}], "6": [{"id": 7, "parent": 0}]}"#,
        );
        let source = JsonFileMenuSource::new(file.path());

        let entries = source
            .list_menu_entries(MenuId::new(5))
            .await
            .expect("entries");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Home");
    }

    #[tokio::test]
    async fn null_or_missing_menu_is_empty() {
        let file = export_file(r#"{"5": null}"#);
        let source = JsonFileMenuSource::new(file.path());

        let null_menu = source.list_menu_entries(MenuId::new(5)).await.expect("null");
        let missing = source.list_menu_entries(MenuId::new(8)).await.expect("missing");

        assert!(null_menu.is_empty());
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let source = JsonFileMenuSource::new(dir.path().join("absent.json"));

        let err = source
            .list_menu_entries(MenuId::new(1))
            .await
            .expect_err("missing file");

        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_file_is_a_decode_error() {
        let file = export_file("{not json");
        let source = JsonFileMenuSource::new(file.path());

        let err = source
            .list_menu_entries(MenuId::new(1))
            .await
            .expect_err("malformed");

        assert!(matches!(err, SourceError::Decode { .. }));
    }

    #[tokio::test]
    async fn bad_entry_in_bare_array_reports_the_entry_error() {
        let file = export_file(r#"[{"id": 1, "parent": 0}, {"id": "home", "parent": 0}]"#);
        let source = JsonFileMenuSource::new(file.path());

        let err = source
            .list_menu_entries(MenuId::new(1))
            .await
            .expect_err("bad id");

        let SourceError::Decode { source: decode, .. } = err else {
            panic!("expected decode error, got {err:?}");
        };
        assert!(decode.to_string().contains("invalid menu entry id `home`"));
    }

    #[tokio::test]
    async fn keys_naming_the_same_menu_are_rejected() {
        let file = export_file(r#"{"5": [{"id": 1, "parent": 0}], "05": [{"id": 2, "parent": 0}]}"#);
        let source = JsonFileMenuSource::new(file.path());

        let err = source
            .list_menu_entries(MenuId::new(5))
            .await
            .expect_err("duplicate menu");

        assert!(matches!(err, SourceError::DuplicateMenu { menu, .. } if menu == MenuId::new(5)));
    }

    #[tokio::test]
    async fn static_source_returns_registered_menu() {
        let source = StaticMenuSource::new().with_menu(MenuId::new(3), vec![MenuEntry::new(1, 0)]);

        let known = source.list_menu_entries(MenuId::new(3)).await.expect("known");
        let unknown = source.list_menu_entries(MenuId::new(4)).await.expect("unknown");

        assert_eq!(known, vec![MenuEntry::new(1, 0)]);
        assert!(unknown.is_empty());
    }
}
