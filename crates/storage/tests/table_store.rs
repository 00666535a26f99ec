use bytes::Bytes;
use sqd_storage::table::{Entity, InvalidBatch, MemoryTableStore, RocksTableStore, TableStore, MAX_BATCH_SIZE};


fn entity(pk: &str, rk: &str, value: &'static [u8]) -> Entity {
    Entity {
        partition_key: pk.to_string(),
        row_key: rk.to_string(),
        value: Bytes::from_static(value)
    }
}


fn batch() -> Vec<Entity> {
    vec![
        entity("288", "aa-b01", b""),
        entity("288", "bb-b01", b""),
        entity("288", "bb-b02", b"")
    ]
}


async fn check_insert_or_replace_is_idempotent(store: &(dyn TableStore + Sync)) -> Vec<Entity> {
    store.create_table_if_missing("transactions").await.unwrap();
    store.create_table_if_missing("transactions").await.unwrap();
    store.insert_or_replace("transactions", &batch()).await.unwrap();
    store.insert_or_replace("transactions", &batch()).await.unwrap();
    batch()
}


async fn check_invalid_batches_write_nothing(store: &(dyn TableStore + Sync)) {
    store.create_table_if_missing("transactions").await.unwrap();

    let mixed = vec![entity("1", "a", b""), entity("2", "b", b"")];
    let err = store.insert_or_replace("transactions", &mixed).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<InvalidBatch>(), Some(InvalidBatch::MixedPartitions { .. })));

    let too_large: Vec<_> = (0..=MAX_BATCH_SIZE)
        .map(|i| Entity {
            partition_key: "1".to_string(),
            row_key: i.to_string(),
            value: Bytes::new()
        })
        .collect();
    let err = store.insert_or_replace("transactions", &too_large).await.unwrap_err();
    assert_eq!(err.downcast_ref::<InvalidBatch>(), Some(&InvalidBatch::TooLarge(101)));

    assert!(store.insert_or_replace("missing", &batch()).await.is_err());
}


#[tokio::test]
async fn memory_store_upserts() {
    let store = MemoryTableStore::new();
    let expected = check_insert_or_replace_is_idempotent(&store).await;
    assert_eq!(store.rows("transactions"), expected);

    store.insert_or_replace("transactions", &[entity("288", "aa-b01", b"x")]).await.unwrap();
    let rows = store.rows("transactions");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].value, Bytes::from_static(b"x"));
}


#[tokio::test]
async fn memory_store_rejects_invalid_batches() {
    let store = MemoryTableStore::new();
    check_invalid_batches_write_nothing(&store).await;
    assert!(store.rows("transactions").is_empty());
}


#[tokio::test]
async fn rocks_store_upserts() {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksTableStore::open(dir.path()).unwrap();
    let expected = check_insert_or_replace_is_idempotent(&store).await;
    assert_eq!(store.rows("transactions").unwrap(), expected);
}


#[tokio::test]
async fn rocks_store_rejects_invalid_batches() {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksTableStore::open(dir.path()).unwrap();
    check_invalid_batches_write_nothing(&store).await;
    assert!(store.rows("transactions").unwrap().is_empty());
}


#[tokio::test]
async fn rocks_store_keeps_tables_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = RocksTableStore::open(dir.path()).unwrap();
        store.create_table_if_missing("transactions").await.unwrap();
        store.insert_or_replace("transactions", &batch()).await.unwrap();
    }
    let store = RocksTableStore::open(dir.path()).unwrap();
    assert_eq!(store.rows("transactions").unwrap(), batch());
}
