//! General serializer for `(K, V)` pairs: the key, then the value, each through the engine.

use crate::context::SerializationContext;
use crate::dispatch::{read_value, write_value};
use crate::info::{AnyValue, Shape, TypeInfo};
use crate::io::{Sink, Source};
use crate::serializer::{GeneralSerializer, TypeSerializer};
use crate::{Result, SerializationError};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub struct KeyValuePairSerializer;

fn unsupported(info: &TypeInfo) -> SerializationError {
    SerializationError::UnsupportedShape {
        type_name: info.name(),
        reason: "not a key-value pair",
    }
}

#[async_trait]
impl TypeSerializer for KeyValuePairSerializer {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        info: &TypeInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let Shape::Pair(pair) = info.shape() else {
            return Err(unsupported(info));
        };
        let (key, val) = pair.split(value)?;
        write_value(stream, &pair.key(), key, context, token).await?;
        write_value(stream, &pair.value(), val, context, token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        info: &TypeInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>> {
        let Shape::Pair(pair) = info.shape() else {
            return Err(unsupported(info));
        };
        let key = read_value(stream, &pair.key(), context, token).await?;
        let value = read_value(stream, &pair.value(), context, token).await?;
        pair.join(key, value)
    }
}

impl GeneralSerializer for KeyValuePairSerializer {
    fn is_type_supported(&self, info: &TypeInfo) -> bool {
        matches!(info.shape(), Shape::Pair(_))
    }
}
