//! Built-in codecs for scalars, strings and versions.

use crate::context::{ByteOrder, SerializationContext};
use crate::dispatch;
use crate::info::Typed;
use crate::io::{self, Sink, Source};
use crate::registry::Registry;
use crate::serializer::ValueSerializer;
use crate::version::Version;
use crate::{Result, SerializationError};
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fixed-width codec built from a pair of native-endian conversion functions.
///
/// The buffer produced by `to_bytes` is in the machine's byte order; it is reversed
/// whenever the context asks for the other order and the width exceeds one byte.
/// `from_bytes` always sees exactly `size` bytes in native order.
pub struct StandardTypeSerializer<T> {
    size: usize,
    to_bytes: fn(&T, &mut BytesMut) -> Result<()>,
    from_bytes: fn(&mut Bytes) -> Result<T>,
}

impl<T> StandardTypeSerializer<T> {
    pub const fn new(
        size: usize,
        to_bytes: fn(&T, &mut BytesMut) -> Result<()>,
        from_bytes: fn(&mut Bytes) -> Result<T>,
    ) -> Self {
        Self {
            size,
            to_bytes,
            from_bytes,
        }
    }

    fn needs_swap(&self, context: &SerializationContext) -> bool {
        self.size > 1 && context.byte_order() != ByteOrder::native()
    }
}

#[async_trait]
impl<T: Typed> ValueSerializer<T> for StandardTypeSerializer<T> {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        value: &T,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let mut buf = BytesMut::with_capacity(self.size);
        (self.to_bytes)(value, &mut buf)?;
        if buf.len() != self.size {
            return Err(SerializationError::Encode(format!(
                "{} produced {} bytes, expected {}",
                std::any::type_name::<T>(),
                buf.len(),
                self.size
            )));
        }
        if self.needs_swap(context) {
            buf.reverse();
        }
        io::write_all(stream, &buf, token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<T> {
        let mut buf = io::read_exact(stream, self.size, token).await?;
        if self.needs_swap(context) {
            buf.reverse();
        }
        (self.from_bytes)(&mut buf.freeze())
    }
}

macro_rules! scalar_serializer {
    ($t:ty, $size:expr, $put:ident, $get:ident) => {
        StandardTypeSerializer::<$t>::new(
            $size,
            |v, buf| {
                buf.$put(*v);
                Ok(())
            },
            |buf| Ok(buf.$get()),
        )
    };
}

// --- String ---

/// Length-prefixed text codec.
///
/// Writes the encoded byte length as an `i32` through the engine, then the bytes in the
/// context's [`TextEncoding`](crate::TextEncoding).
pub struct StringSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for StringSerializer<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> ValueSerializer<T> for StringSerializer<T>
where
    T: Typed + AsRef<str> + From<String>,
{
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        value: &T,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let bytes = context.encoding().encode(value.as_ref());
        let len = i32::try_from(bytes.len())
            .map_err(|_| SerializationError::InvalidLength(bytes.len() as i64))?;
        dispatch::to_stream(stream, &len, context, token).await?;
        io::write_all(stream, &bytes, token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<T> {
        let len: i32 = dispatch::from_stream(stream, context, token).await?;
        let len = usize::try_from(len).map_err(|_| SerializationError::InvalidLength(len.into()))?;
        let bytes = io::read_payload(stream, len, token).await?;
        context.encoding().decode(&bytes).map(T::from)
    }
}

// --- Version ---

/// Writes major, minor, build and revision as four `i32`s; absent parts are `-1`.
#[derive(Default)]
pub struct VersionSerializer;

fn version_part(part: u32) -> Result<i32> {
    i32::try_from(part)
        .map_err(|_| SerializationError::Encode(format!("version component {part} exceeds i32")))
}

#[async_trait]
impl ValueSerializer<Version> for VersionSerializer {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        value: &Version,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let parts = [
            version_part(value.major())?,
            version_part(value.minor())?,
            value.build().map(version_part).transpose()?.unwrap_or(-1),
            value.revision().map(version_part).transpose()?.unwrap_or(-1),
        ];
        for part in &parts {
            dispatch::to_stream(stream, part, context, token).await?;
        }
        Ok(())
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Version> {
        let mut parts = [0i32; 4];
        for part in parts.iter_mut() {
            *part = dispatch::from_stream(stream, context, token).await?;
        }
        let [major, minor, build, revision] = parts;
        let invalid = || SerializationError::Decode(format!("invalid version {parts:?}"));
        let major = u32::try_from(major).map_err(|_| invalid())?;
        let minor = u32::try_from(minor).map_err(|_| invalid())?;
        match (build, revision) {
            (b, r) if b < 0 && r < 0 => Ok(Version::new(major, minor)),
            (b, r) if r < 0 => {
                let b = u32::try_from(b).map_err(|_| invalid())?;
                Ok(Version::with_build(major, minor, b))
            }
            (b, r) => {
                let b = u32::try_from(b).map_err(|_| invalid())?;
                let r = u32::try_from(r).map_err(|_| invalid())?;
                Ok(Version::with_revision(major, minor, b, r))
            }
        }
    }
}

pub(crate) fn register_builtins(registry: &Registry) {
    registry.builtin::<bool, _, _>(|| {
        StandardTypeSerializer::<bool>::new(
            1,
            |v, buf| {
                buf.put_u8(u8::from(*v));
                Ok(())
            },
            |buf| Ok(buf.get_u8() != 0),
        )
    });
    registry.builtin::<u8, _, _>(|| scalar_serializer!(u8, 1, put_u8, get_u8));
    registry.builtin::<i8, _, _>(|| scalar_serializer!(i8, 1, put_i8, get_i8));
    registry.builtin::<u16, _, _>(|| scalar_serializer!(u16, 2, put_u16_ne, get_u16_ne));
    registry.builtin::<i16, _, _>(|| scalar_serializer!(i16, 2, put_i16_ne, get_i16_ne));
    registry.builtin::<u32, _, _>(|| scalar_serializer!(u32, 4, put_u32_ne, get_u32_ne));
    registry.builtin::<i32, _, _>(|| scalar_serializer!(i32, 4, put_i32_ne, get_i32_ne));
    registry.builtin::<u64, _, _>(|| scalar_serializer!(u64, 8, put_u64_ne, get_u64_ne));
    registry.builtin::<i64, _, _>(|| scalar_serializer!(i64, 8, put_i64_ne, get_i64_ne));
    registry.builtin::<f32, _, _>(|| scalar_serializer!(f32, 4, put_f32_ne, get_f32_ne));
    registry.builtin::<f64, _, _>(|| scalar_serializer!(f64, 8, put_f64_ne, get_f64_ne));

    registry.builtin::<String, _, _>(StringSerializer::<String>::default);
    registry.builtin::<Arc<str>, _, _>(StringSerializer::<Arc<str>>::default);
    registry.builtin::<Version, _, _>(|| VersionSerializer);
}
