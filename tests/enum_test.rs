use wireform::{
    from_bytes, to_bytes, wire_enum, ByteOrder, SerializationContext, SerializationError, WireEnum,
};

wire_enum! {
    #[derive(Debug, PartialEq)]
    enum ByteEnum: u8 {
        Value1 = 1,
        Value2 = 178,
    }
}

wire_enum! {
    #[derive(Debug, PartialEq)]
    enum SByteEnum: i8 {
        Low = -120,
        Zero = 0,
    }
}

wire_enum! {
    #[derive(Debug, PartialEq)]
    enum IntEnum: i32 {
        Min = i32::MIN,
        Max = i32::MAX,
    }
}

wire_enum! {
    #[derive(Debug, PartialEq)]
    enum LongEnum: i64 {
        Zero = 0,
        Max = i64::MAX,
    }
}

#[tokio::test]
async fn test_byte_enum() {
    let ctx = SerializationContext::default();
    let bytes = to_bytes(&ByteEnum::Value2, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[178]);
    assert_eq!(from_bytes::<ByteEnum>(&bytes, &ctx).await.unwrap(), ByteEnum::Value2);
}

#[tokio::test]
async fn test_signed_byte_enum() {
    let ctx = SerializationContext::default();
    let bytes = to_bytes(&SByteEnum::Low, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[136]);
    assert_eq!(from_bytes::<SByteEnum>(&bytes, &ctx).await.unwrap(), SByteEnum::Low);
}

#[tokio::test]
async fn test_int_enum_uses_context_byte_order() {
    let ctx = SerializationContext::default();
    let bytes = to_bytes(&IntEnum::Max, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[127, 255, 255, 255]);

    let le = ctx.clone().with_byte_order(ByteOrder::LittleEndian);
    let bytes = to_bytes(&IntEnum::Min, &le).await.unwrap();
    assert_eq!(&bytes[..], &[0, 0, 0, 0x80]);
    assert_eq!(from_bytes::<IntEnum>(&bytes, &le).await.unwrap(), IntEnum::Min);
}

#[tokio::test]
async fn test_long_enum() {
    let ctx = SerializationContext::default();
    let bytes = to_bytes(&LongEnum::Max, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[127, 255, 255, 255, 255, 255, 255, 255]);
    assert_eq!(from_bytes::<LongEnum>(&bytes, &ctx).await.unwrap(), LongEnum::Max);
}

#[tokio::test]
async fn test_undeclared_value_is_rejected() {
    let ctx = SerializationContext::default();
    let err = from_bytes::<LongEnum>(&[127, 0, 0, 0, 0, 0, 0, 0], &ctx)
        .await
        .unwrap_err();
    match err {
        SerializationError::UnknownEnumValue { value, enum_name } => {
            assert_eq!(value, i64::from_be_bytes([127, 0, 0, 0, 0, 0, 0, 0]).to_string());
            assert!(enum_name.ends_with("LongEnum"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = from_bytes::<ByteEnum>(&[2], &ctx).await.unwrap_err();
    assert!(matches!(err, SerializationError::UnknownEnumValue { .. }));
}

#[tokio::test]
async fn test_optional_enum_and_enum_lists() {
    let ctx = SerializationContext::default();
    let bytes = to_bytes(&Some(ByteEnum::Value1), &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[1, 1]);
    let bytes = to_bytes(&None::<ByteEnum>, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[0]);

    let list = vec![ByteEnum::Value1, ByteEnum::Value2];
    let bytes = to_bytes(&list, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[1, 0, 0, 0, 2, 1, 178]);
    assert_eq!(from_bytes::<Vec<ByteEnum>>(&bytes, &ctx).await.unwrap(), list);
}

#[test]
fn test_from_repr() {
    assert_eq!(ByteEnum::from_repr(178), Some(ByteEnum::Value2));
    assert_eq!(ByteEnum::from_repr(3), None);
    assert_eq!(SByteEnum::VARIANTS.len(), 2);
    assert_eq!(SByteEnum::Zero.to_repr(), 0);
}
