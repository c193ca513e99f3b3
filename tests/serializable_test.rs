use wireform::io::{Sink, Source};
use wireform::{
    async_trait, from_bytes, from_stream, register_serializer, to_bytes, to_stream, ByteOrder,
    CancellationToken, Serializable, SerializationContext, SerializationError, TypeInfo, Typed,
    ValueSerializer,
};

#[derive(Debug, Default, PartialEq)]
struct Point {
    x: i32,
    y: i32,
    label: Option<String>,
}

impl Typed for Point {
    fn type_info() -> TypeInfo {
        TypeInfo::serializable::<Self>()
    }
}

#[async_trait]
impl Serializable for Point {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<()> {
        to_stream(stream, &self.x, context, token).await?;
        to_stream(stream, &self.y, context, token).await?;
        to_stream(stream, &self.label, context, token).await
    }

    async fn from_stream(
        &mut self,
        stream: &mut Source<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<()> {
        self.x = from_stream(stream, context, token).await?;
        self.y = from_stream(stream, context, token).await?;
        self.label = from_stream(stream, context, token).await?;
        Ok(())
    }
}

/// A nullable self-describing type.
#[derive(Debug, Default, PartialEq)]
struct Tag {
    id: u16,
}

impl Typed for Tag {
    fn type_info() -> TypeInfo {
        TypeInfo::serializable::<Self>().nullable()
    }
}

#[async_trait]
impl Serializable for Tag {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<()> {
        to_stream(stream, &self.id, context, token).await
    }

    async fn from_stream(
        &mut self,
        stream: &mut Source<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<()> {
        self.id = from_stream(stream, context, token).await?;
        Ok(())
    }
}

/// Writes every point as a single zero byte.
struct ZeroPointSerializer;

#[async_trait]
impl ValueSerializer<Point> for ZeroPointSerializer {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        _value: &Point,
        _context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<()> {
        wireform::io::write_all(stream, &[0], token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        _context: &SerializationContext,
        token: &CancellationToken,
    ) -> wireform::Result<Point> {
        wireform::io::read_u8(stream, token).await?;
        Ok(Point::default())
    }
}

fn point() -> Point {
    Point {
        x: 1,
        y: -1,
        label: Some("a".to_string()),
    }
}

#[tokio::test]
async fn test_self_describing_roundtrip() {
    let ctx = SerializationContext::default().with_byte_order(ByteOrder::LittleEndian);
    let bytes = to_bytes(&point(), &ctx).await.unwrap();
    assert_eq!(
        &bytes[..],
        &[1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 1, 1, 0, 0, 0, b'a']
    );
    assert_eq!(from_bytes::<Point>(&bytes, &ctx).await.unwrap(), point());
}

#[tokio::test]
async fn test_self_describing_takes_precedence() {
    let plain = SerializationContext::default();
    let expected = to_bytes(&point(), &plain).await.unwrap();

    let scoped = plain.clone().with_serializer::<Point, _>(ZeroPointSerializer);
    assert_eq!(to_bytes(&point(), &scoped).await.unwrap(), expected);

    register_serializer::<Point, _, _>(|| ZeroPointSerializer, true).unwrap();
    assert_eq!(to_bytes(&point(), &plain).await.unwrap(), expected);
    assert_eq!(from_bytes::<Point>(&expected, &scoped).await.unwrap(), point());
}

#[tokio::test]
async fn test_nullable_self_describing_type() {
    let ctx = SerializationContext::default();
    let bytes = to_bytes(&Tag { id: 0x0102 }, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[0x01, 0x01, 0x02]);

    let bytes = to_bytes(&None::<Tag>, &ctx).await.unwrap();
    assert_eq!(&bytes[..], &[0x00]);
    let err = from_bytes::<Tag>(&bytes, &ctx).await.unwrap_err();
    assert!(matches!(err, SerializationError::UnexpectedNull { .. }));

    let no_nulls = ctx.with_allow_null_values(false);
    let bytes = to_bytes(&Tag { id: 7 }, &no_nulls).await.unwrap();
    assert_eq!(&bytes[..], &[0x00, 0x07]);
}

#[tokio::test]
async fn test_self_describing_inside_collections() {
    let ctx = SerializationContext::default();
    let value = vec![point(), Point::default()];
    let bytes = to_bytes(&value, &ctx).await.unwrap();
    assert_eq!(&bytes[..5], &[1, 0, 0, 0, 2]);
    assert_eq!(from_bytes::<Vec<Point>>(&bytes, &ctx).await.unwrap(), value);

    // a point without a label cannot be written once nulls are prohibited
    let no_nulls = ctx.with_allow_null_values(false);
    let err = to_bytes(&value, &no_nulls).await.unwrap_err();
    assert!(matches!(err, SerializationError::NullNotAllowed { .. }));
}

#[tokio::test]
async fn test_truncated_self_describing_value() {
    let ctx = SerializationContext::default();
    let err = from_bytes::<Point>(&[0, 0, 0, 1, 0, 0], &ctx).await.unwrap_err();
    assert!(matches!(err, SerializationError::InsufficientData));
}
