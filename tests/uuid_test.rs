#![cfg(feature = "uuid")]

use uuid::Uuid;
use wireform::{from_bytes, to_bytes, ByteOrder, SerializationContext, UuidForm};

const GUID: &str = "6f304fd5-2904-475c-80b3-4db0f3e2b58a";

const MIXED: [u8; 16] = [
    0xd5, 0x4f, 0x30, 0x6f, 0x04, 0x29, 0x5c, 0x47, 0x80, 0xb3, 0x4d, 0xb0, 0xf3, 0xe2, 0xb5, 0x8a,
];

const NETWORK: [u8; 16] = [
    0x6f, 0x30, 0x4f, 0xd5, 0x29, 0x04, 0x47, 0x5c, 0x80, 0xb3, 0x4d, 0xb0, 0xf3, 0xe2, 0xb5, 0x8a,
];

fn context(order: ByteOrder, form: UuidForm) -> SerializationContext {
    SerializationContext::default()
        .with_byte_order(order)
        .with_uuid_form(form)
        .with_allow_null_values(false)
}

#[tokio::test]
async fn test_uuid_layouts() {
    let guid = Uuid::parse_str(GUID).unwrap();
    let cases = [
        (ByteOrder::LittleEndian, UuidForm::Microsoft, MIXED),
        (ByteOrder::LittleEndian, UuidForm::Linux, NETWORK),
        (ByteOrder::BigEndian, UuidForm::Microsoft, NETWORK),
        (ByteOrder::BigEndian, UuidForm::Linux, NETWORK),
    ];
    for (order, form, expected) in cases {
        let ctx = context(order, form);
        let bytes = to_bytes(&guid, &ctx).await.unwrap();
        assert_eq!(&bytes[..], &expected[..], "{order:?} {form:?}");
        assert_eq!(from_bytes::<Uuid>(&bytes, &ctx).await.unwrap(), guid);
    }
}

#[tokio::test]
async fn test_optional_uuid() {
    let ctx = SerializationContext::default();
    let guid = Uuid::parse_str(GUID).unwrap();
    let bytes = to_bytes(&Some(guid), &ctx).await.unwrap();
    assert_eq!(bytes[0], 0x01);
    assert_eq!(&bytes[1..], &NETWORK[..]);
    assert_eq!(&to_bytes(&None::<Uuid>, &ctx).await.unwrap()[..], &[0x00]);
}

#[tokio::test]
async fn test_random_uuids_roundtrip() {
    let ctx = context(ByteOrder::LittleEndian, UuidForm::Microsoft);
    let ids: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
    let bytes = to_bytes(&ids, &ctx).await.unwrap();
    assert_eq!(bytes.len(), 4 + 16 * ids.len());
    assert_eq!(from_bytes::<Vec<Uuid>>(&bytes, &ctx).await.unwrap(), ids);
}

#[tokio::test]
async fn test_truncated_uuid() {
    let err = from_bytes::<Uuid>(&NETWORK[..15], &SerializationContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, wireform::SerializationError::InsufficientData));
}
