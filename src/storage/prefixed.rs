use std::sync::Arc;

use crate::error::Result;
use crate::storage::{Storage, StorageInput, StorageOutput};

/// Storage facade that transparently prefixes all file names.
///
/// A single store can hold a frozen corpus under `corpus/` and a pass tally
/// under `tally/` without the two colliding.
#[derive(Debug)]
pub struct PrefixedStorage {
    prefix: String,
    inner: Arc<dyn Storage>,
}

impl PrefixedStorage {
    /// Create a new prefixed storage namespace.
    pub fn new(prefix: impl Into<String>, inner: Arc<dyn Storage>) -> Self {
        let prefix = prefix.into().trim_matches('/').to_string();
        Self { prefix, inner }
    }

    /// The namespace prefix, without slashes.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn map_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    fn strip_prefix<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return Some(name);
        }
        name.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

impl Storage for PrefixedStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        self.inner.open_input(&self.map_name(name))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        self.inner.create_output(&self.map_name(name))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.inner.file_exists(&self.map_name(name))
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.inner.delete_file(&self.map_name(name))
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self
            .inner
            .list_files()?
            .iter()
            .filter_map(|entry| self.strip_prefix(entry))
            .map(str::to_string)
            .collect())
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        self.inner.file_size(&self.map_name(name))
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.inner
            .rename_file(&self.map_name(old_name), &self.map_name(new_name))
    }

    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)> {
        let (full_name, handle) = self.inner.create_temp_output(&self.map_name(prefix))?;
        let relative = self
            .strip_prefix(&full_name)
            .map(str::to_string)
            .unwrap_or_else(|| full_name.clone());
        Ok((relative, handle))
    }

    fn sync(&self) -> Result<()> {
        self.inner.sync()
    }

    fn close(&mut self) -> Result<()> {
        // Namespaced views do not own the underlying storage.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use std::io::Write;

    #[test]
    fn isolates_file_names() {
        let base: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let prefixed = PrefixedStorage::new("/ns/", base.clone());
        assert_eq!(prefixed.prefix(), "ns");

        let mut output = prefixed.create_output("foo.bin").unwrap();
        output.write_all(b"data").unwrap();
        output.close().unwrap();

        assert!(base.file_exists("ns/foo.bin"));
        assert!(!base.file_exists("foo.bin"));
        assert_eq!(prefixed.list_files().unwrap(), vec!["foo.bin".to_string()]);
    }

    #[test]
    fn temp_names_are_relative() {
        let base: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let prefixed = PrefixedStorage::new("tally", base.clone());

        let (name, mut output) = prefixed.create_temp_output("meta").unwrap();
        output.close().unwrap();

        assert!(name.starts_with("meta_"));
        assert!(prefixed.file_exists(&name));
        prefixed.rename_file(&name, "meta.json").unwrap();
        assert!(base.file_exists("tally/meta.json"));
    }

    #[test]
    fn sibling_prefixes_do_not_leak() {
        let base: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let corpus = PrefixedStorage::new("corpus", base.clone());
        let corpus2 = PrefixedStorage::new("corpus2", base.clone());

        corpus2.create_output("a.bin").unwrap().close().unwrap();
        assert!(corpus.list_files().unwrap().is_empty());
    }
}
