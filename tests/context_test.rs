use wireform::io::{Sink, Source};
use wireform::{
    async_trait, from_bytes, to_bytes, to_stream, ByteOrder, CancellationToken,
    SerializationContext, SerializationError, TextEncoding, TypeInfo, Typed, UuidForm,
    ValueSerializer,
};

#[derive(Debug, PartialEq, Default)]
struct Marker;

impl Typed for Marker {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<Marker>().nullable()
    }
}

/// Writes nothing at all.
struct SilentSerializer;

#[async_trait]
impl ValueSerializer<Marker> for SilentSerializer {
    async fn to_stream(
        &self,
        _stream: &mut Sink<'_>,
        _value: &Marker,
        _context: &SerializationContext,
        _token: &CancellationToken,
    ) -> wireform::Result<()> {
        Ok(())
    }

    async fn from_stream(
        &self,
        _stream: &mut Source<'_>,
        _context: &SerializationContext,
        _token: &CancellationToken,
    ) -> wireform::Result<Marker> {
        Ok(Marker)
    }
}

/// Writes a `u16` as a single byte.
struct NarrowSerializer;

#[async_trait]
impl ValueSerializer<u16> for NarrowSerializer {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        value: &u16,
        _context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<()> {
        let byte = u8::try_from(*value)
            .map_err(|_| SerializationError::Encode(format!("{value} does not fit")))?;
        wireform::io::write_all(stream, &[byte], token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        _context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<u16> {
        Ok(u16::from(wireform::io::read_u8(stream, token).await?))
    }
}

#[test]
fn test_default_context() {
    let ctx = SerializationContext::default();
    assert_eq!(ctx.byte_order(), ByteOrder::BigEndian);
    assert_eq!(ctx.uuid_form(), UuidForm::Linux);
    assert!(ctx.allow_null_values());
    assert_eq!(ctx.encoding(), TextEncoding::Utf8);
    assert_eq!(ctx, SerializationContext::new());
}

#[test]
fn test_derivation_leaves_original_untouched() {
    let base = SerializationContext::default();
    let derived = base.clone().with_byte_order(ByteOrder::LittleEndian);
    assert_eq!(base.byte_order(), ByteOrder::BigEndian);
    assert_eq!(derived.byte_order(), ByteOrder::LittleEndian);
    assert_ne!(base, derived);

    let scoped = base.clone().with_serializer::<Marker, _>(SilentSerializer);
    assert!(scoped.has_scoped_serializer(&Marker::type_info()));
    assert!(!base.has_scoped_serializer(&Marker::type_info()));
}

#[test]
fn test_equality_ignores_serializer_identity() {
    let a = SerializationContext::default().with_serializer::<Marker, _>(SilentSerializer);
    let b = SerializationContext::default().with_serializer::<Marker, _>(SilentSerializer);
    assert_eq!(a, b);
    assert_ne!(a, SerializationContext::default());
    assert_eq!(a.without_serializers(), SerializationContext::default());
}

#[tokio::test]
async fn test_scoped_serializer_is_used() {
    let ctx = SerializationContext::default().with_serializer::<Marker, _>(SilentSerializer);
    let token = CancellationToken::new();
    let mut buf: Vec<u8> = Vec::new();
    to_stream(&mut buf, &Marker, &ctx, &token).await.unwrap();
    to_stream(&mut buf, &Marker, &ctx, &token).await.unwrap();
    // presence bytes only
    assert_eq!(buf, vec![0x01, 0x01]);
    assert_eq!(from_bytes::<Marker>(&buf, &ctx).await.unwrap(), Marker);
}

#[tokio::test]
async fn test_scoped_serializer_is_invisible_elsewhere() {
    let err = to_bytes(&Marker, &SerializationContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SerializationError::NoSerializer { .. }));
    assert!(wireform::find_type_serializer(&Marker::type_info()).is_none());
}

#[tokio::test]
async fn test_optional_unwraps_to_scoped_serializer() {
    let ctx = SerializationContext::default().with_serializer::<Marker, _>(SilentSerializer);
    assert_eq!(&to_bytes(&Some(Marker), &ctx).await.unwrap()[..], &[0x01]);
    assert_eq!(&to_bytes(&None::<Marker>, &ctx).await.unwrap()[..], &[0x00]);

    let err = to_bytes(&None::<Marker>, &SerializationContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SerializationError::NoSerializerForEither { .. }));
}

#[tokio::test]
async fn test_scoped_serializer_overrides_registry_for_nested_values() {
    let plain = SerializationContext::default().with_allow_null_values(false);
    let narrow = plain.clone().with_serializer::<u16, _>(NarrowSerializer);
    let value: Vec<u16> = vec![1, 2];

    let bytes = to_bytes(&value, &narrow).await.unwrap();
    assert_eq!(&bytes[..], &[0, 0, 0, 2, 1, 2]);
    assert_eq!(from_bytes::<Vec<u16>>(&bytes, &narrow).await.unwrap(), value);

    let bytes = to_bytes(&value, &plain).await.unwrap();
    assert_eq!(&bytes[..], &[0, 0, 0, 2, 0, 1, 0, 2]);
}

#[tokio::test]
async fn test_context_falls_back_to_registry() {
    let ctx = SerializationContext::default().with_serializer::<Marker, _>(SilentSerializer);
    assert!(ctx.find_type_serializer(&i32::type_info()).is_some());
    assert!(ctx.find_type_serializer(&Vec::<i32>::type_info()).is_some());
    assert!(ctx.find_type_serializer(&Option::<i32>::type_info()).is_none());
}
