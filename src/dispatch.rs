//! The dispatch engine.
//!
//! Every value, top-level or nested, goes through the same steps:
//!
//! 1. Resolve a serializer for the declared type through the context. If none exists
//!    and the type is `Option<X>`, resolve `X` instead and treat the value as nullable.
//! 2. A null value with nulls prohibited is an error.
//! 3. With nulls allowed, nullable types get a presence byte (`1` present, `0` absent).
//! 4. Null values stop there; present values go to the serializer.
//!
//! Decoding mirrors the same steps and the same resolution order.

use crate::context::SerializationContext;
use crate::dynamic::Dynamic;
use crate::info::{downcast_ref, take, AnyValue, Shape, TypeInfo, Typed};
use crate::io::{self, Sink, Source};
use crate::serializer::TypeSerializer;
use crate::{Result, SerializationError};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Resolved {
    serializer: Arc<dyn TypeSerializer>,
    /// Type handed to the serializer; the payload type after unwrapping.
    target: TypeInfo,
    unwrapped: bool,
}

fn resolve(info: &TypeInfo, context: &SerializationContext) -> Result<Resolved> {
    if let Some(serializer) = context.find_type_serializer(info) {
        return Ok(Resolved {
            serializer,
            target: *info,
            unwrapped: false,
        });
    }
    let Shape::Optional(optional) = info.shape() else {
        tracing::debug!(type_name = info.name(), "no serializer found");
        return Err(SerializationError::NoSerializer {
            type_name: info.name(),
        });
    };
    let inner = optional.inner();
    match context.find_type_serializer(&inner) {
        Some(serializer) => Ok(Resolved {
            serializer,
            target: inner,
            unwrapped: true,
        }),
        None => {
            tracing::debug!(type_name = info.name(), "no serializer found for optional payload");
            Err(SerializationError::NoSerializerForEither {
                type_name: info.name(),
                inner_name: inner.name(),
            })
        }
    }
}

/// `Dynamic` or `Option<Dynamic>`; both are written through the runtime type.
fn is_dynamic(info: &TypeInfo) -> bool {
    match info.shape() {
        Shape::Dynamic => true,
        Shape::Optional(optional) => matches!(optional.inner().shape(), Shape::Dynamic),
        _ => false,
    }
}

/// Writes a payload for the declared type; `None` is null.
///
/// A `Dynamic` payload is written as its runtime type and may not be null.
///
/// For `Option<X>` the payload is the `X` value itself, not the option.
pub fn to_stream_dyn<'a, 's>(
    stream: &'a mut Sink<'s>,
    info: &'a TypeInfo,
    value: Option<&'a AnyValue>,
    context: &'a SerializationContext,
    token: &'a CancellationToken,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if is_dynamic(info) {
            let Some(value) = value else {
                return Err(SerializationError::UnsupportedShape {
                    type_name: info.name(),
                    reason: "a dynamic value cannot be null, it has no runtime type",
                });
            };
            let dynamic = downcast_ref::<Dynamic>(value)?;
            let runtime = dynamic.runtime_info();
            return write_value(stream, &runtime, dynamic.value(), context, token).await;
        }

        let resolved = resolve(info, context)?;
        let allow_null = context.allow_null_values();
        if value.is_none() && !allow_null {
            return Err(SerializationError::NullNotAllowed {
                type_name: info.name(),
            });
        }
        if allow_null && (info.is_nullable() || resolved.unwrapped) {
            io::write_all(stream, &[u8::from(value.is_some())], token).await?;
        }
        let Some(value) = value else {
            return Ok(());
        };
        resolved
            .serializer
            .to_stream(stream, &resolved.target, value, context, token)
            .await
    }
    .boxed()
}

/// Reads a payload for the declared type; `None` is a decoded null.
///
/// For `Option<X>` a present payload is the bare `X` value.
pub fn from_stream_dyn<'a, 's>(
    stream: &'a mut Source<'s>,
    info: &'a TypeInfo,
    context: &'a SerializationContext,
    token: &'a CancellationToken,
) -> BoxFuture<'a, Result<Option<Box<AnyValue>>>> {
    async move {
        if is_dynamic(info) {
            return Err(SerializationError::UnsupportedShape {
                type_name: info.name(),
                reason: "the concrete type of a dynamic value is unknown when decoding",
            });
        }

        let resolved = resolve(info, context)?;
        if context.allow_null_values() && (info.is_nullable() || resolved.unwrapped) {
            let present = io::read_u8(stream, token).await?;
            if present == 0 {
                return Ok(None);
            }
        }
        resolved
            .serializer
            .from_stream(stream, &resolved.target, context, token)
            .await
            .map(Some)
    }
    .boxed()
}

/// Writes a complete value of the declared type.
///
/// Unlike [`to_stream_dyn`], an `Option<X>` value is passed as the option itself.
pub fn write_value<'a, 's>(
    stream: &'a mut Sink<'s>,
    info: &'a TypeInfo,
    value: &'a AnyValue,
    context: &'a SerializationContext,
    token: &'a CancellationToken,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let payload = match info.shape() {
            Shape::Optional(optional) => optional.get(value)?,
            _ => Some(value),
        };
        to_stream_dyn(stream, info, payload, context, token).await
    }
    .boxed()
}

/// Reads a complete value of the declared type.
///
/// A decoded null becomes `None` for `Option<X>` and an
/// [`UnexpectedNull`](SerializationError::UnexpectedNull) error for any other type.
pub fn read_value<'a, 's>(
    stream: &'a mut Source<'s>,
    info: &'a TypeInfo,
    context: &'a SerializationContext,
    token: &'a CancellationToken,
) -> BoxFuture<'a, Result<Box<AnyValue>>> {
    async move {
        let payload = from_stream_dyn(stream, info, context, token).await?;
        wrap_payload(info, payload)
    }
    .boxed()
}

/// Turns a payload read by [`from_stream_dyn`] into a complete value of the declared type.
pub(crate) fn wrap_payload(info: &TypeInfo, payload: Option<Box<AnyValue>>) -> Result<Box<AnyValue>> {
    match (info.shape(), payload) {
        (Shape::Optional(optional), payload) => optional.wrap(payload),
        (_, Some(value)) => Ok(value),
        (_, None) => Err(SerializationError::UnexpectedNull {
            type_name: info.name(),
        }),
    }
}

/// Serializes `value` as `T`.
pub async fn to_stream<T: Typed>(
    stream: &mut Sink<'_>,
    value: &T,
    context: &SerializationContext,
    token: &CancellationToken,
) -> Result<()> {
    let info = T::type_info();
    write_value(stream, &info, value, context, token).await
}

/// Deserializes a `T`.
pub async fn from_stream<T: Typed>(
    stream: &mut Source<'_>,
    context: &SerializationContext,
    token: &CancellationToken,
) -> Result<T> {
    let info = T::type_info();
    let value = read_value(stream, &info, context, token).await?;
    take::<T>(value)
}

/// Serializes `value` into an in-memory buffer.
pub async fn to_bytes<T: Typed>(value: &T, context: &SerializationContext) -> Result<Bytes> {
    let mut buf: Vec<u8> = Vec::new();
    to_stream(&mut buf, value, context, &CancellationToken::new()).await?;
    Ok(Bytes::from(buf))
}

/// Deserializes a `T` from the start of `bytes`. Trailing bytes are ignored.
pub async fn from_bytes<T: Typed>(bytes: &[u8], context: &SerializationContext) -> Result<T> {
    let mut reader = bytes;
    from_stream(&mut reader, context, &CancellationToken::new()).await
}
