//! S4 (on-demand survival of plaintext deletion): deleting the plaintext
//! a file's symlink points at must not drop the row immediately — only
//! once it's stayed unreachable past the grace period.
//!
//! `OnDemandService::get_indexed` has no injectable clock (it reads the
//! wall clock directly), so the "more than 3 days later" half of this
//! scenario is exercised against `OnDemandFileState::past_grace` itself
//! rather than by waiting three real days for the real service. The row
//! handed to `get_indexed` is built directly rather than fetched back out
//! of the service's own store, since nothing in `OnDemandApi` exposes a
//! lookup — `StoredRow`'s fields and the on-demand payload layout
//! (file id, offset, block size, in that order) are the only pieces both
//! sides agree on.

use datastore::{InMemoryKVStore, OnDemandApi, OnDemandFileState, OnDemandService, SqstoreService, StoredRow};
use ecrs_codec::EcrsCodecService;
use shared_types::entities::{hash512, BlockType};

fn write_temp_file(contents: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("s4-plaintext-{}-{}", std::process::id(), rand::random::<u64>()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn service() -> OnDemandService<SqstoreService<InMemoryKVStore>, EcrsCodecService> {
    let sqstore = SqstoreService::new(InMemoryKVStore::new()).unwrap();
    let codec = EcrsCodecService::new();
    let index_dir = std::env::temp_dir().join(format!("s4-index-{}-{}", std::process::id(), rand::random::<u64>()));
    OnDemandService::new(sqstore, codec, index_dir)
}

#[tokio::test]
async fn s4_first_failure_after_deletion_reports_unavailable_not_success() {
    let service = service();
    let contents = b"plaintext that will be deleted out from under the index".to_vec();
    let path = write_temp_file(&contents);
    let file_id = shared_types::base32::encode(&hash512(&contents));

    service.init_index(file_id.clone(), path.clone()).await.unwrap();
    let query = service
        .index(5, 0, 0, 0, file_id.clone(), contents.len() as u32, contents.clone())
        .await
        .unwrap();

    let record_payload = bincode::serialize(&(file_id.clone(), 0u64, contents.len() as u32)).unwrap();
    let row = StoredRow {
        row_id: 1,
        query,
        block_type: BlockType::OnDemand,
        priority: 5,
        anonymity_level: 0,
        expiration_time: 0,
        payload: record_payload,
    };

    std::fs::remove_file(&path).unwrap();

    let first_failure = service.get_indexed(&row, query).await;
    assert!(first_failure.is_err(), "reading through a dangling symlink target must fail, not panic or fabricate content");

    // A second read immediately afterwards, still inside the grace
    // period, must fail the same way — `mark_unavailable` records the
    // first-seen timestamp but never deletes this early.
    let second_failure = service.get_indexed(&row, query).await;
    assert!(second_failure.is_err());
}

#[test]
fn s4_row_is_dropped_only_once_unavailability_outlives_the_grace_period() {
    let first_unavailable_at = 1_000_000u64;
    let state = OnDemandFileState { first_unavailable: Some(first_unavailable_at) };

    let just_inside = first_unavailable_at + OnDemandFileState::GRACE_PERIOD_SECS;
    let just_outside = just_inside + 1;

    assert!(!state.past_grace(just_inside), "exactly 3 days later is still within grace");
    assert!(state.past_grace(just_outside), "past 3 days, the row should be eligible for deletion");
}
