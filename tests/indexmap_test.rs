#![cfg(feature = "indexmap")]

use indexmap::{IndexMap, IndexSet};
use wireform::{from_bytes, to_bytes, ByteOrder, SerializationContext, SerializationError};

fn little_endian() -> SerializationContext {
    SerializationContext::default()
        .with_byte_order(ByteOrder::LittleEndian)
        .with_allow_null_values(false)
}

#[tokio::test]
async fn test_index_map_keeps_insertion_order() {
    let mut value: IndexMap<u8, u16> = IndexMap::new();
    value.insert(9, 0x0102);
    value.insert(1, 0x0304);
    let bytes = to_bytes(&value, &little_endian()).await.unwrap();
    assert_eq!(&bytes[..], &[2, 0, 0, 0, 9, 0x02, 0x01, 1, 0x04, 0x03]);

    let decoded = from_bytes::<IndexMap<u8, u16>>(&bytes, &little_endian())
        .await
        .unwrap();
    assert_eq!(decoded.keys().copied().collect::<Vec<_>>(), vec![9, 1]);
}

#[tokio::test]
async fn test_index_map_rejects_duplicate_keys() {
    let bytes = [2, 0, 0, 0, 5, 0, 0, 5, 1, 0];
    let err = from_bytes::<IndexMap<u8, u16>>(&bytes, &little_endian())
        .await
        .unwrap_err();
    assert!(matches!(err, SerializationError::DuplicateKey { .. }));
}

#[tokio::test]
async fn test_index_set() {
    let value: IndexSet<String> = ["b", "a"].into_iter().map(String::from).collect();
    let bytes = to_bytes(&value, &little_endian()).await.unwrap();
    assert_eq!(&bytes[..], &[2, 0, 0, 0, 1, 0, 0, 0, b'b', 1, 0, 0, 0, b'a']);
    assert_eq!(
        from_bytes::<IndexSet<String>>(&bytes, &little_endian())
            .await
            .unwrap(),
        value
    );
}
