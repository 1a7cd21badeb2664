//! On-Demand Encoder (C5): indexes a local file by symlinking it into the
//! index directory instead of copying its blocks, encoding each block
//! lazily when it's actually requested.

use crate::domain::entities::OnDemandFileState;
use crate::domain::DatastoreError;
use crate::ports::inbound::{OnDemandApi, SqstoreApi};
use ecrs_codec::EcrsCodecApi;
use shared_types::entities::{hash512, BlockType, DatastoreBlock, DatastoreBlockHeader, Query};
use std::io::{Read, Seek, SeekFrom};
use std::sync::RwLock;

pub struct OnDemandService<S: SqstoreApi, C: EcrsCodecApi> {
    sqstore: S,
    codec: C,
    index_dir: std::path::PathBuf,
    file_state: RwLock<std::collections::HashMap<String, OnDemandFileState>>,
}

impl<S: SqstoreApi, C: EcrsCodecApi> OnDemandService<S, C> {
    pub fn new(sqstore: S, codec: C, index_dir: std::path::PathBuf) -> Self {
        Self { sqstore, codec, index_dir, file_state: RwLock::new(std::collections::HashMap::new()) }
    }

    fn symlink_path(&self, file_id: &str) -> std::path::PathBuf {
        self.index_dir.join(file_id)
    }

    fn mark_unavailable(&self, file_id: &str, now: u64) -> bool {
        let mut states = self.file_state.write().unwrap();
        let state = states.entry(file_id.to_string()).or_insert_with(OnDemandFileState::available);
        if state.first_unavailable.is_none() {
            state.first_unavailable = Some(now);
        }
        state.past_grace(now)
    }

    fn mark_available(&self, file_id: &str) {
        self.file_state.write().unwrap().insert(file_id.to_string(), OnDemandFileState::available());
    }
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait::async_trait]
impl<S: SqstoreApi, C: EcrsCodecApi> OnDemandApi for OnDemandService<S, C> {
    async fn init_index(&self, file_id: String, source_path: std::path::PathBuf) -> Result<(), DatastoreError> {
        let expected = shared_types::base32::decode(&file_id)
            .map_err(|e| DatastoreError::Encoding(e.to_string()))?;

        let mut contents = Vec::new();
        std::fs::File::open(&source_path)
            .and_then(|mut f| f.read_to_end(&mut contents))
            .map_err(|e| DatastoreError::Filesystem(e.to_string()))?;

        if hash512(&contents).as_slice() != expected.as_slice() {
            return Err(DatastoreError::ContentChanged { file_id });
        }

        if let Some(parent) = self.symlink_path(&file_id).parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatastoreError::Filesystem(e.to_string()))?;
        }
        let link = self.symlink_path(&file_id);
        let _ = std::fs::remove_file(&link);
        #[cfg(unix)]
        std::os::unix::fs::symlink(&source_path, &link)
            .map_err(|e| DatastoreError::Filesystem(e.to_string()))?;
        #[cfg(not(unix))]
        std::fs::copy(&source_path, &link).map_err(|e| DatastoreError::Filesystem(e.to_string()))?;

        self.mark_available(&file_id);
        Ok(())
    }

    async fn index(
        &self,
        priority: u32,
        expiration_time: u64,
        file_offset: u64,
        anonymity_level: u32,
        file_id: String,
        block_size: u32,
        plaintext_block: Vec<u8>,
    ) -> Result<Query, DatastoreError> {
        let encoded = self.codec.encode_data_block(&plaintext_block);

        // The payload stored is the offset, not the content itself: the
        // content lives in the symlinked file and is read back by
        // `get_indexed` at request time.
        let record = OnDemandRecord { file_id, file_offset, block_size };
        let payload = bincode::serialize(&record).map_err(|e| DatastoreError::Serialization(e.to_string()))?;

        self.sqstore.put(encoded.query, BlockType::OnDemand, priority, anonymity_level, expiration_time, payload)?;
        Ok(encoded.query)
    }

    async fn get_indexed(
        &self,
        row: &crate::domain::StoredRow,
        query: Query,
    ) -> Result<DatastoreBlock, DatastoreError> {
        let record: OnDemandRecord = bincode::deserialize(&row.payload)
            .map_err(|e| DatastoreError::Serialization(e.to_string()))?;

        let link = self.symlink_path(&record.file_id);
        let now = current_unix_time();

        let mut file = match std::fs::File::open(&link) {
            Ok(f) => f,
            Err(_) => {
                let past_grace = self.mark_unavailable(&record.file_id, now);
                if past_grace {
                    self.sqstore.delete(row.row_id)?;
                    let _ = std::fs::remove_file(&link);
                }
                return Err(DatastoreError::ContentUnavailable { file_id: record.file_id });
            }
        };

        let mut plaintext = vec![0u8; record.block_size as usize];
        let read_ok = file
            .seek(SeekFrom::Start(record.file_offset))
            .and_then(|_| file.read_exact(&mut plaintext))
            .is_ok();

        if !read_ok {
            let past_grace = self.mark_unavailable(&record.file_id, now);
            if past_grace {
                self.sqstore.delete(row.row_id)?;
            }
            return Err(DatastoreError::ContentUnavailable { file_id: record.file_id });
        }
        self.mark_available(&record.file_id);

        let expected_query = self.codec.encode_data_block(&plaintext).query;
        if expected_query != query {
            self.sqstore.delete(row.row_id)?;
            tracing::warn!(file_id = %record.file_id, "indexed_content_changed");
            return Err(DatastoreError::ContentChanged { file_id: record.file_id });
        }

        let encoded = self.codec.encode_data_block(&plaintext);
        Ok(DatastoreBlock {
            header: DatastoreBlockHeader {
                size: encoded.ciphertext.len() as u32,
                block_type: BlockType::OnDemand,
                priority: row.priority,
                anonymity_level: row.anonymity_level,
                expiration_time: row.expiration_time,
            },
            payload: encoded.ciphertext,
        })
    }

    async fn unindex(&self, file_id: String, block_size: u32) -> Result<(), DatastoreError> {
        let link = self.symlink_path(&file_id);
        let mut contents = Vec::new();
        if std::fs::File::open(&link).and_then(|mut f| f.read_to_end(&mut contents)).is_ok() {
            for chunk in contents.chunks(block_size.max(1) as usize) {
                let query = self.codec.encode_data_block(chunk).query;
                let rows = self.sqstore.get(&query, Some(BlockType::OnDemand))?;
                for row in rows {
                    self.sqstore.delete(row.row_id)?;
                }
            }
        }
        let _ = std::fs::remove_file(&link);
        self.file_state.write().unwrap().remove(&file_id);
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct OnDemandRecord {
    file_id: String,
    file_offset: u64,
    block_size: u32,
}
