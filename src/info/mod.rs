//! Runtime type descriptors.
//!
//! Every serializable type implements [`Typed`], which returns a [`TypeInfo`]: the type's
//! identity, whether it can hold null, and its [`Shape`]. Structural shapes carry the
//! type-erased operations the general serializers need to walk and rebuild values.

mod impls;
mod shape;

pub use shape::{
    EnumInfo, MapInfo, MapKind, MapType, OptionalInfo, PairInfo, SelfDescribingInfo,
    SequenceInfo, SequenceKind, SequenceType,
};

use crate::enums::WireEnum;
use crate::serializable::Serializable;
use crate::{Result, SerializationError};
use std::any::{type_name, Any, TypeId};
use std::fmt;

/// Type-erased value handled by [`TypeSerializer`](crate::TypeSerializer)s.
pub type AnyValue = dyn Any + Send + Sync;

/// A type that can describe itself to the serializer engine.
pub trait Typed: Any + Send + Sync {
    fn type_info() -> TypeInfo;
}

/// Structural classification of a type.
#[derive(Clone, Copy)]
pub enum Shape {
    /// Handled by an exact-type serializer only.
    Opaque,
    /// `Option<T>`.
    Optional(OptionalInfo),
    Sequence(SequenceInfo),
    Map(MapInfo),
    /// Two-field key/value tuple.
    Pair(PairInfo),
    Enum(EnumInfo),
    /// A type implementing [`Serializable`].
    SelfDescribing(SelfDescribingInfo),
    /// [`Dynamic`](crate::Dynamic): the concrete type is known only at runtime.
    Dynamic,
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Opaque => "opaque",
            Shape::Optional(_) => "optional",
            Shape::Sequence(_) => "sequence",
            Shape::Map(_) => "map",
            Shape::Pair(_) => "pair",
            Shape::Enum(_) => "enum",
            Shape::SelfDescribing(_) => "self-describing",
            Shape::Dynamic => "dynamic",
        }
    }
}

/// Identity, nullability and shape of a serializable type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    nullable: bool,
    shape: Shape,
}

impl TypeInfo {
    /// Shorthand for `T::type_info()`.
    pub fn of<T: Typed>() -> Self {
        T::type_info()
    }

    /// Descriptor for a type handled only by an exact-type serializer.
    pub fn opaque<T: Any + Send + Sync>() -> Self {
        Self::with_shape::<T>(Shape::Opaque)
    }

    pub fn sequence<C: SequenceType>() -> Self {
        Self::with_shape::<C>(Shape::Sequence(SequenceInfo::new::<C>())).nullable()
    }

    pub fn map<M: MapType>() -> Self {
        Self::with_shape::<M>(Shape::Map(MapInfo::new::<M>())).nullable()
    }

    pub fn optional<T: Typed>() -> Self {
        Self::with_shape::<Option<T>>(Shape::Optional(OptionalInfo::new::<T>())).nullable()
    }

    pub fn pair<K: Typed, V: Typed>() -> Self {
        Self::with_shape::<(K, V)>(Shape::Pair(PairInfo::new::<K, V>()))
    }

    pub fn enumeration<E: WireEnum>() -> Self {
        Self::with_shape::<E>(Shape::Enum(EnumInfo::new::<E>()))
    }

    /// Descriptor for a self-describing type. Call [`nullable`](Self::nullable) on the
    /// result for types that should carry a presence flag.
    pub fn serializable<T: Serializable>() -> Self {
        Self::with_shape::<T>(Shape::SelfDescribing(SelfDescribingInfo::new::<T>()))
    }

    pub(crate) fn dynamic<T: Any + Send + Sync>() -> Self {
        Self::with_shape::<T>(Shape::Dynamic)
    }

    fn with_shape<T: Any + Send + Sync>(shape: Shape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            nullable: false,
            shape,
        }
    }

    /// Marks the type as able to hold null; with nulls allowed such values get a presence flag.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("nullable", &self.nullable)
            .field("shape", &self.shape.kind_name())
            .finish()
    }
}

/// Borrows `value` as `T`.
pub fn downcast_ref<T: Any>(value: &AnyValue) -> Result<&T> {
    value
        .downcast_ref::<T>()
        .ok_or(SerializationError::TypeMismatch {
            expected: type_name::<T>(),
        })
}

/// Unboxes `value` as `T`.
pub fn take<T: Any>(value: Box<AnyValue>) -> Result<T> {
    value
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| SerializationError::TypeMismatch {
            expected: type_name::<T>(),
        })
}
