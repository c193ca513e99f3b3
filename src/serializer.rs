//! Serializer traits.
//!
//! [`TypeSerializer`] is the type-erased interface the engine dispatches to. Most codecs
//! are written against the typed [`ValueSerializer`] and wrapped with [`erase`].

use crate::context::SerializationContext;
use crate::info::{downcast_ref, AnyValue, TypeInfo, Typed};
use crate::io::{Sink, Source};
use crate::{Result, SerializationError};
use async_trait::async_trait;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Type-erased codec for one type or a family of types.
///
/// `info` is the descriptor of the type being handled; a codec serving a family (for
/// example every `Vec<T>`) reads element types from it. Nested values go back through
/// the engine via [`write_value`](crate::write_value) / [`read_value`](crate::read_value).
#[async_trait]
pub trait TypeSerializer: Send + Sync {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        info: &TypeInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()>;

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        info: &TypeInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>>;
}

/// A serializer that decides by predicate which types it handles.
pub trait GeneralSerializer: TypeSerializer {
    fn is_type_supported(&self, info: &TypeInfo) -> bool;
}

/// Codec for exactly one type `T`.
#[async_trait]
pub trait ValueSerializer<T: Typed>: Send + Sync {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        value: &T,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()>;

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<T>;
}

/// Wraps a typed serializer so the engine can dispatch to it.
pub fn erase<T, S>(serializer: S) -> Arc<dyn TypeSerializer>
where
    T: Typed,
    S: ValueSerializer<T> + 'static,
{
    Arc::new(Erased {
        inner: serializer,
        _marker: PhantomData::<fn() -> T>,
    })
}

struct Erased<T, S> {
    inner: S,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Typed, S> Erased<T, S> {
    fn check(info: &TypeInfo) -> Result<()> {
        if info.is::<T>() {
            Ok(())
        } else {
            Err(SerializationError::TypeMismatch {
                expected: type_name::<T>(),
            })
        }
    }
}

#[async_trait]
impl<T, S> TypeSerializer for Erased<T, S>
where
    T: Typed,
    S: ValueSerializer<T>,
{
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        info: &TypeInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        Self::check(info)?;
        let value = downcast_ref::<T>(value)?;
        self.inner.to_stream(stream, value, context, token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        info: &TypeInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>> {
        Self::check(info)?;
        let value = self.inner.from_stream(stream, context, token).await?;
        Ok(Box::new(value))
    }
}
