//! Driven ports: the storage backend and clock the services run on top of.

use crate::domain::errors::KVStoreError;

/// Rows returned by a prefix scan: `(key, value)` pairs.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// A batched write applied atomically by `KeyValueStore::atomic_batch_write`.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(key: &[u8], value: &[u8]) -> Self {
        BatchOperation::Put { key: key.to_vec(), value: value.to_vec() }
    }

    pub fn delete(key: &[u8]) -> Self {
        BatchOperation::Delete { key: key.to_vec() }
    }
}

/// Embedded, file-backed key-value storage. SQstore's only outbound
/// dependency — every secondary index and iteration order is built on top
/// of this in memory.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Unix-epoch seconds. Abstracted so admission/expiry logic is testable
/// without a real clock.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// In-memory key-value store for unit tests and ephemeral nodes.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: std::collections::HashMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.data.remove(key);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let results = self
            .data
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }
}

/// File-backed key-value store. Persists the whole map to a single file on
/// every write using a simple `[key_len][key][value_len][value]...` layout,
/// rewritten atomically via a rename.
pub struct FileBackedKVStore {
    data: std::collections::HashMap<Vec<u8>, Vec<u8>>,
    path: std::path::PathBuf,
}

impl FileBackedKVStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = Self::load_from_file(&path).unwrap_or_default();
        Self { data, path }
    }

    fn load_from_file(
        path: &std::path::Path,
    ) -> Option<std::collections::HashMap<Vec<u8>, Vec<u8>>> {
        use std::io::Read;

        let mut file = std::fs::File::open(path).ok()?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).ok()?;

        let mut data = std::collections::HashMap::new();
        let mut cursor = 0;

        while cursor + 4 <= bytes.len() {
            let key_len = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().ok()?) as usize;
            cursor += 4;
            if cursor + key_len > bytes.len() {
                break;
            }
            let key = bytes[cursor..cursor + key_len].to_vec();
            cursor += key_len;

            if cursor + 4 > bytes.len() {
                break;
            }
            let value_len = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().ok()?) as usize;
            cursor += 4;
            if cursor + value_len > bytes.len() {
                break;
            }
            let value = bytes[cursor..cursor + value_len].to_vec();
            cursor += value_len;

            data.insert(key, value);
        }

        Some(data)
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KVStoreError::IOError { message: e.to_string() })?;
        }

        let mut bytes = Vec::new();
        for (key, value) in &self.data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)
            .map_err(|e| KVStoreError::IOError { message: e.to_string() })?;
        file.write_all(&bytes)
            .map_err(|e| KVStoreError::IOError { message: e.to_string() })?;
        file.sync_all()
            .map_err(|e| KVStoreError::IOError { message: e.to_string() })?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| KVStoreError::IOError { message: e.to_string() })?;

        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        self.save_to_file()
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.data.remove(key);
        self.save_to_file()
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        self.save_to_file()
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let results = self
            .data
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_roundtrips() {
        let mut store = InMemoryKVStore::new();
        store.put(b"key1", b"value1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert!(store.exists(b"key1").unwrap());
        store.delete(b"key1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), None);
    }

    #[test]
    fn in_memory_store_batch_write() {
        let mut store = InMemoryKVStore::new();
        let ops = vec![BatchOperation::put(b"a", b"1"), BatchOperation::put(b"b", b"2")];
        store.atomic_batch_write(ops).unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn in_memory_store_prefix_scan() {
        let mut store = InMemoryKVStore::new();
        store.put(b"row:1", b"a").unwrap();
        store.put(b"row:2", b"b").unwrap();
        store.put(b"idx:1", b"c").unwrap();
        assert_eq!(store.prefix_scan(b"row:").unwrap().len(), 2);
    }

    #[test]
    fn file_backed_store_persists_across_instances() {
        let path = std::env::temp_dir().join(format!("datastore-kv-test-{}.bin", std::process::id()));
        let _ = std::fs::remove_file(&path);

        {
            let mut store = FileBackedKVStore::new(&path);
            store.put(b"key1", b"value1").unwrap();
        }

        let store = FileBackedKVStore::new(&path);
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));

        let _ = std::fs::remove_file(&path);
    }
}
