//! General serializer for sequences and maps.
//!
//! Every collection is a 4-byte signed count, written through the engine, followed by
//! the elements (or key/value pairs), each written through the engine with the static
//! element type. A `Stack` is written in pop order.

use crate::context::SerializationContext;
use crate::dispatch::{self, from_stream_dyn, read_value, write_value};
use crate::info::{AnyValue, MapInfo, SequenceInfo, SequenceKind, Shape, TypeInfo};
use crate::io::{Sink, Source, MAX_PREALLOCATION};
use crate::serializer::{GeneralSerializer, TypeSerializer};
use crate::{Result, SerializationError};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub struct CollectionsSerializer;

async fn write_count(
    stream: &mut Sink<'_>,
    count: usize,
    context: &SerializationContext,
    token: &CancellationToken,
) -> Result<()> {
    let count =
        i32::try_from(count).map_err(|_| SerializationError::InvalidLength(count as i64))?;
    dispatch::to_stream(stream, &count, context, token).await
}

async fn read_count(
    stream: &mut Source<'_>,
    context: &SerializationContext,
    token: &CancellationToken,
) -> Result<usize> {
    let count: i32 = dispatch::from_stream(stream, context, token).await?;
    usize::try_from(count).map_err(|_| SerializationError::InvalidLength(count.into()))
}

impl CollectionsSerializer {
    async fn write_sequence(
        stream: &mut Sink<'_>,
        sequence: &SequenceInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let element = sequence.element();
        let items = sequence.items(value)?;
        write_count(stream, items.len(), context, token).await?;
        for item in items {
            write_value(stream, &element, item, context, token).await?;
        }
        Ok(())
    }

    async fn write_map(
        stream: &mut Sink<'_>,
        map: &MapInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let (key_info, value_info) = (map.key(), map.value());
        let entries = map.entries(value)?;
        write_count(stream, entries.len(), context, token).await?;
        for (k, v) in entries {
            if let Shape::Optional(optional) = key_info.shape() {
                if optional.get(k)?.is_none() {
                    return Err(SerializationError::NullKey);
                }
            }
            write_value(stream, &key_info, k, context, token).await?;
            write_value(stream, &value_info, v, context, token).await?;
        }
        Ok(())
    }

    /// Reads `count` elements in wire order.
    async fn read_elements(
        stream: &mut Source<'_>,
        element: &TypeInfo,
        count: usize,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Vec<Box<AnyValue>>> {
        let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATION));
        for _ in 0..count {
            items.push(read_value(stream, element, context, token).await?);
        }
        Ok(items)
    }

    async fn read_sequence(
        stream: &mut Source<'_>,
        sequence: &SequenceInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>> {
        let element = sequence.element();
        let count = read_count(stream, context, token).await?;
        let mut items = Self::read_elements(stream, &element, count, context, token).await?;
        if sequence.kind() == SequenceKind::Stack {
            // wire order is pop order; pushing starts from the bottom
            items.reverse();
        }
        sequence.collect(items)
    }

    async fn read_map(
        stream: &mut Source<'_>,
        map: &MapInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>> {
        let (key_info, value_info) = (map.key(), map.value());
        let count = read_count(stream, context, token).await?;
        let mut entries = Vec::with_capacity(count.min(MAX_PREALLOCATION));
        for _ in 0..count {
            let key = from_stream_dyn(stream, &key_info, context, token)
                .await?
                .ok_or(SerializationError::NullKey)?;
            let key = dispatch::wrap_payload(&key_info, Some(key))?;
            let value = read_value(stream, &value_info, context, token).await?;
            entries.push((key, value));
        }
        map.collect(entries)
    }
}

fn unsupported(info: &TypeInfo) -> SerializationError {
    SerializationError::UnsupportedShape {
        type_name: info.name(),
        reason: "not a sequence or map",
    }
}

#[async_trait]
impl TypeSerializer for CollectionsSerializer {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        info: &TypeInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        match info.shape() {
            Shape::Sequence(sequence) => {
                Self::write_sequence(stream, sequence, value, context, token).await
            }
            Shape::Map(map) => Self::write_map(stream, map, value, context, token).await,
            _ => Err(unsupported(info)),
        }
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        info: &TypeInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>> {
        match info.shape() {
            Shape::Sequence(sequence) => {
                Self::read_sequence(stream, sequence, context, token).await
            }
            Shape::Map(map) => Self::read_map(stream, map, context, token).await,
            _ => Err(unsupported(info)),
        }
    }
}

impl GeneralSerializer for CollectionsSerializer {
    fn is_type_supported(&self, info: &TypeInfo) -> bool {
        matches!(info.shape(), Shape::Sequence(_) | Shape::Map(_))
    }
}
