use super::{downcast_ref, take, AnyValue, TypeInfo, Typed};
use crate::context::SerializationContext;
use crate::enums::WireEnum;
use crate::io::{Sink, Source};
use crate::serializable::Serializable;
use crate::{Result, SerializationError};
use futures::future::BoxFuture;
use std::any::type_name;
use tokio_util::sync::CancellationToken;

// --- Optional ---

/// Type-erased access to an `Option<T>`.
#[derive(Clone, Copy)]
pub struct OptionalInfo {
    inner: fn() -> TypeInfo,
    get: for<'a> fn(&'a AnyValue) -> Result<Option<&'a AnyValue>>,
    wrap: fn(Option<Box<AnyValue>>) -> Result<Box<AnyValue>>,
}

impl OptionalInfo {
    pub fn new<T: Typed>() -> Self {
        Self {
            inner: T::type_info,
            get: optional_get::<T>,
            wrap: optional_wrap::<T>,
        }
    }

    /// Descriptor of the payload type.
    pub fn inner(&self) -> TypeInfo {
        (self.inner)()
    }

    /// Borrows the payload of an `Option<T>` value, `None` when absent.
    pub fn get<'a>(&self, value: &'a AnyValue) -> Result<Option<&'a AnyValue>> {
        (self.get)(value)
    }

    /// Builds an `Option<T>` from a decoded payload.
    pub fn wrap(&self, payload: Option<Box<AnyValue>>) -> Result<Box<AnyValue>> {
        (self.wrap)(payload)
    }
}

fn optional_get<T: Typed>(value: &AnyValue) -> Result<Option<&AnyValue>> {
    Ok(downcast_ref::<Option<T>>(value)?
        .as_ref()
        .map(|payload| payload as &AnyValue))
}

fn optional_wrap<T: Typed>(payload: Option<Box<AnyValue>>) -> Result<Box<AnyValue>> {
    let value: Option<T> = payload.map(take::<T>).transpose()?;
    Ok(Box::new(value))
}

// --- Sequence ---

/// Concrete collection family of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    /// Fixed-size array, filled by index.
    Array,
    /// Growable ordered list, filled by appending.
    List,
    Set,
    SortedSet,
    /// Written in pop order; decode reverses before pushing.
    Stack,
    Queue,
    LinkedList,
}

/// A homogeneous collection handled by the collection serializer.
pub trait SequenceType: Typed + Sized {
    type Item: Typed;
    const KIND: SequenceKind;

    /// Items in the order they are written.
    fn items(&self) -> Vec<&Self::Item>;

    /// Builds the collection from items in construction order.
    fn from_items(items: Vec<Self::Item>) -> Result<Self>;
}

/// Type-erased access to a [`SequenceType`].
#[derive(Clone, Copy)]
pub struct SequenceInfo {
    kind: SequenceKind,
    element: fn() -> TypeInfo,
    items: for<'a> fn(&'a AnyValue) -> Result<Vec<&'a AnyValue>>,
    collect: fn(Vec<Box<AnyValue>>) -> Result<Box<AnyValue>>,
}

impl SequenceInfo {
    pub fn new<C: SequenceType>() -> Self {
        Self {
            kind: C::KIND,
            element: <C::Item as Typed>::type_info,
            items: sequence_items::<C>,
            collect: sequence_collect::<C>,
        }
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn element(&self) -> TypeInfo {
        (self.element)()
    }

    pub fn items<'a>(&self, value: &'a AnyValue) -> Result<Vec<&'a AnyValue>> {
        (self.items)(value)
    }

    pub fn collect(&self, items: Vec<Box<AnyValue>>) -> Result<Box<AnyValue>> {
        (self.collect)(items)
    }
}

fn sequence_items<C: SequenceType>(value: &AnyValue) -> Result<Vec<&AnyValue>> {
    Ok(downcast_ref::<C>(value)?
        .items()
        .into_iter()
        .map(|item| item as &AnyValue)
        .collect())
}

fn sequence_collect<C: SequenceType>(items: Vec<Box<AnyValue>>) -> Result<Box<AnyValue>> {
    let items = items
        .into_iter()
        .map(take::<C::Item>)
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(C::from_items(items)?))
}

// --- Map ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Hash,
    /// Ordered by key.
    Sorted,
    /// Ordered by insertion.
    Indexed,
}

/// A key/value collection handled by the collection serializer.
pub trait MapType: Typed + Sized {
    type Key: Typed;
    type Value: Typed;
    const KIND: MapKind;

    fn entries(&self) -> Vec<(&Self::Key, &Self::Value)>;

    /// Builds the map; a repeated key is an error.
    fn from_entries(entries: Vec<(Self::Key, Self::Value)>) -> Result<Self>;
}

type ErasedEntries<'a> = Vec<(&'a AnyValue, &'a AnyValue)>;

#[derive(Clone, Copy)]
pub struct MapInfo {
    kind: MapKind,
    key: fn() -> TypeInfo,
    value: fn() -> TypeInfo,
    entries: for<'a> fn(&'a AnyValue) -> Result<ErasedEntries<'a>>,
    collect: fn(Vec<(Box<AnyValue>, Box<AnyValue>)>) -> Result<Box<AnyValue>>,
}

impl MapInfo {
    pub fn new<M: MapType>() -> Self {
        Self {
            kind: M::KIND,
            key: <M::Key as Typed>::type_info,
            value: <M::Value as Typed>::type_info,
            entries: map_entries::<M>,
            collect: map_collect::<M>,
        }
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn key(&self) -> TypeInfo {
        (self.key)()
    }

    pub fn value(&self) -> TypeInfo {
        (self.value)()
    }

    pub fn entries<'a>(&self, value: &'a AnyValue) -> Result<ErasedEntries<'a>> {
        (self.entries)(value)
    }

    pub fn collect(&self, entries: Vec<(Box<AnyValue>, Box<AnyValue>)>) -> Result<Box<AnyValue>> {
        (self.collect)(entries)
    }
}

fn map_entries<M: MapType>(value: &AnyValue) -> Result<ErasedEntries<'_>> {
    Ok(downcast_ref::<M>(value)?
        .entries()
        .into_iter()
        .map(|(k, v)| (k as &AnyValue, v as &AnyValue))
        .collect())
}

fn map_collect<M: MapType>(entries: Vec<(Box<AnyValue>, Box<AnyValue>)>) -> Result<Box<AnyValue>> {
    let entries = entries
        .into_iter()
        .map(|(k, v)| Ok((take::<M::Key>(k)?, take::<M::Value>(v)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(M::from_entries(entries)?))
}

// --- Pair ---

#[derive(Clone, Copy)]
pub struct PairInfo {
    key: fn() -> TypeInfo,
    value: fn() -> TypeInfo,
    split: for<'a> fn(&'a AnyValue) -> Result<(&'a AnyValue, &'a AnyValue)>,
    join: fn(Box<AnyValue>, Box<AnyValue>) -> Result<Box<AnyValue>>,
}

impl PairInfo {
    pub fn new<K: Typed, V: Typed>() -> Self {
        Self {
            key: K::type_info,
            value: V::type_info,
            split: pair_split::<K, V>,
            join: pair_join::<K, V>,
        }
    }

    pub fn key(&self) -> TypeInfo {
        (self.key)()
    }

    pub fn value(&self) -> TypeInfo {
        (self.value)()
    }

    pub fn split<'a>(&self, value: &'a AnyValue) -> Result<(&'a AnyValue, &'a AnyValue)> {
        (self.split)(value)
    }

    pub fn join(&self, key: Box<AnyValue>, value: Box<AnyValue>) -> Result<Box<AnyValue>> {
        (self.join)(key, value)
    }
}

fn pair_split<K: Typed, V: Typed>(value: &AnyValue) -> Result<(&AnyValue, &AnyValue)> {
    let (k, v) = downcast_ref::<(K, V)>(value)?;
    Ok((k as &AnyValue, v as &AnyValue))
}

fn pair_join<K: Typed, V: Typed>(key: Box<AnyValue>, value: Box<AnyValue>) -> Result<Box<AnyValue>> {
    Ok(Box::new((take::<K>(key)?, take::<V>(value)?)))
}

// --- Enum ---

#[derive(Clone, Copy)]
pub struct EnumInfo {
    repr: fn() -> TypeInfo,
    to_repr: fn(&AnyValue) -> Result<Box<AnyValue>>,
    from_repr: fn(Box<AnyValue>) -> Result<Box<AnyValue>>,
}

impl EnumInfo {
    pub fn new<E: WireEnum>() -> Self {
        Self {
            repr: <E::Repr as Typed>::type_info,
            to_repr: enum_to_repr::<E>,
            from_repr: enum_from_repr::<E>,
        }
    }

    /// Descriptor of the underlying integer type.
    pub fn repr(&self) -> TypeInfo {
        (self.repr)()
    }

    pub fn to_repr(&self, value: &AnyValue) -> Result<Box<AnyValue>> {
        (self.to_repr)(value)
    }

    /// Maps an underlying integer back to a declared member.
    pub fn from_repr(&self, repr: Box<AnyValue>) -> Result<Box<AnyValue>> {
        (self.from_repr)(repr)
    }
}

fn enum_to_repr<E: WireEnum>(value: &AnyValue) -> Result<Box<AnyValue>> {
    Ok(Box::new(downcast_ref::<E>(value)?.to_repr()))
}

fn enum_from_repr<E: WireEnum>(repr: Box<AnyValue>) -> Result<Box<AnyValue>> {
    let repr = take::<E::Repr>(repr)?;
    match E::from_repr(repr) {
        Some(value) => Ok(Box::new(value)),
        None => Err(SerializationError::UnknownEnumValue {
            value: format!("{repr:?}"),
            enum_name: type_name::<E>(),
        }),
    }
}

// --- Self-describing ---

type WriteSelfFn = for<'a, 's> fn(
    &'a AnyValue,
    &'a mut Sink<'s>,
    &'a SerializationContext,
    &'a CancellationToken,
) -> BoxFuture<'a, Result<()>>;

type ReadSelfFn = for<'a, 's> fn(
    &'a mut Source<'s>,
    &'a SerializationContext,
    &'a CancellationToken,
) -> BoxFuture<'a, Result<Box<AnyValue>>>;

/// Entry points of a [`Serializable`] type.
#[derive(Clone, Copy)]
pub struct SelfDescribingInfo {
    write: WriteSelfFn,
    read: ReadSelfFn,
}

impl SelfDescribingInfo {
    pub fn new<T: Serializable>() -> Self {
        Self {
            write: write_self::<T>,
            read: read_self::<T>,
        }
    }

    pub fn write<'a, 's>(
        &self,
        value: &'a AnyValue,
        stream: &'a mut Sink<'s>,
        context: &'a SerializationContext,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<()>> {
        (self.write)(value, stream, context, token)
    }

    pub fn read<'a, 's>(
        &self,
        stream: &'a mut Source<'s>,
        context: &'a SerializationContext,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Box<AnyValue>>> {
        (self.read)(stream, context, token)
    }
}

fn write_self<'a, 's, T: Serializable>(
    value: &'a AnyValue,
    stream: &'a mut Sink<'s>,
    context: &'a SerializationContext,
    token: &'a CancellationToken,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let value = downcast_ref::<T>(value)?;
        value.to_stream(stream, context, token).await
    })
}

fn read_self<'a, 's, T: Serializable>(
    stream: &'a mut Source<'s>,
    context: &'a SerializationContext,
    token: &'a CancellationToken,
) -> BoxFuture<'a, Result<Box<AnyValue>>> {
    Box::pin(async move {
        let mut value = T::default();
        value.from_stream(stream, context, token).await?;
        Ok(Box::new(value) as Box<AnyValue>)
    })
}
