//! Self-describing types.
//!
//! A type implementing [`Serializable`] writes and reads itself. It takes precedence over
//! every registered serializer, including scoped ones.
//!
//! ```
//! use wireform::io::{Sink, Source};
//! use wireform::{
//!     from_stream, to_stream, CancellationToken, Serializable, SerializationContext,
//!     TypeInfo, Typed,
//! };
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Typed for Point {
//!     fn type_info() -> TypeInfo {
//!         TypeInfo::serializable::<Self>()
//!     }
//! }
//!
//! #[wireform::async_trait]
//! impl Serializable for Point {
//!     async fn to_stream(
//!         &self,
//!         stream: &mut Sink<'_>,
//!         context: &SerializationContext,
//!         token: &CancellationToken,
//!     ) -> wireform::Result<()> {
//!         to_stream(stream, &self.x, context, token).await?;
//!         to_stream(stream, &self.y, context, token).await
//!     }
//!
//!     async fn from_stream(
//!         &mut self,
//!         stream: &mut Source<'_>,
//!         context: &SerializationContext,
//!         token: &CancellationToken,
//!     ) -> wireform::Result<()> {
//!         self.x = from_stream(stream, context, token).await?;
//!         self.y = from_stream(stream, context, token).await?;
//!         Ok(())
//!     }
//! }
//! ```

use crate::context::SerializationContext;
use crate::info::{AnyValue, Shape, TypeInfo, Typed};
use crate::io::{Sink, Source};
use crate::serializer::TypeSerializer;
use crate::{Result, SerializationError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A type that serializes itself.
///
/// Decoding starts from `Self::default()` and lets [`from_stream`](Self::from_stream)
/// populate it.
#[async_trait]
pub trait Serializable: Typed + Default {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()>;

    async fn from_stream(
        &mut self,
        stream: &mut Source<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()>;
}

/// Delegates to the value's own [`Serializable`] implementation.
pub struct SerializableTypeSerializer;

/// A fresh delegating serializer.
pub(crate) fn serializer() -> Arc<dyn TypeSerializer> {
    Arc::new(SerializableTypeSerializer)
}

fn unsupported(info: &TypeInfo) -> SerializationError {
    SerializationError::UnsupportedShape {
        type_name: info.name(),
        reason: "not a self-describing type",
    }
}

#[async_trait]
impl TypeSerializer for SerializableTypeSerializer {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        info: &TypeInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let Shape::SelfDescribing(methods) = info.shape() else {
            return Err(unsupported(info));
        };
        methods.write(value, stream, context, token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        info: &TypeInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>> {
        let Shape::SelfDescribing(methods) = info.shape() else {
            return Err(unsupported(info));
        };
        methods.read(stream, context, token).await
    }
}
