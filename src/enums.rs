//! Enums encoded as their underlying integer.

use crate::context::SerializationContext;
use crate::dispatch::{read_value, write_value};
use crate::info::{AnyValue, Shape, TypeInfo, Typed};
use crate::io::{Sink, Source};
use crate::serializer::{GeneralSerializer, TypeSerializer};
use crate::{Result, SerializationError};
use async_trait::async_trait;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// A fieldless enum with a primitive representation.
///
/// Decoding only accepts the integers listed in [`VARIANTS`](WireEnum::VARIANTS). Use
/// [`wire_enum!`](crate::wire_enum) to declare one.
pub trait WireEnum: Typed + Copy {
    type Repr: Typed + Copy + PartialEq + Debug;

    /// Every declared member.
    const VARIANTS: &'static [Self];

    fn to_repr(self) -> Self::Repr;

    fn from_repr(repr: Self::Repr) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.to_repr() == repr)
    }
}

/// Declares a fieldless enum with a primitive repr and implements [`WireEnum`] and
/// [`Typed`] for it. `Clone` and `Copy` are derived by the macro.
///
/// ```
/// wireform::wire_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum Color: u8 {
///         Red = 1,
///         Green = 2,
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        #[derive(Clone, Copy)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $crate::WireEnum for $name {
            type Repr = $repr;
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];

            fn to_repr(self) -> $repr {
                self as $repr
            }
        }

        impl $crate::Typed for $name {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::enumeration::<Self>()
            }
        }
    };
}

pub struct EnumSerializer;

fn unsupported(info: &TypeInfo) -> SerializationError {
    SerializationError::UnsupportedShape {
        type_name: info.name(),
        reason: "not an enum",
    }
}

#[async_trait]
impl TypeSerializer for EnumSerializer {
    async fn to_stream(
        &self,
        stream: &mut Sink<'_>,
        info: &TypeInfo,
        value: &AnyValue,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<()> {
        let Shape::Enum(enumeration) = info.shape() else {
            return Err(unsupported(info));
        };
        let repr = enumeration.to_repr(value)?;
        write_value(stream, &enumeration.repr(), &*repr, context, token).await
    }

    async fn from_stream(
        &self,
        stream: &mut Source<'_>,
        info: &TypeInfo,
        context: &SerializationContext,
        token: &CancellationToken,
    ) -> Result<Box<AnyValue>> {
        let Shape::Enum(enumeration) = info.shape() else {
            return Err(unsupported(info));
        };
        let repr = read_value(stream, &enumeration.repr(), context, token).await?;
        enumeration.from_repr(repr)
    }
}

impl GeneralSerializer for EnumSerializer {
    fn is_type_supported(&self, info: &TypeInfo) -> bool {
        matches!(info.shape(), Shape::Enum(_))
    }
}
