use super::{MapKind, MapType, SequenceKind, SequenceType, TypeInfo, Typed};
use crate::{Result, SerializationError};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

macro_rules! impl_typed_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl Typed for $t {
                fn type_info() -> TypeInfo {
                    TypeInfo::opaque::<$t>()
                }
            }
        )*
    };
}

impl_typed_value!(bool, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Typed for String {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<String>().nullable()
    }
}

impl Typed for Arc<str> {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<Arc<str>>().nullable()
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::optional::<T>()
    }
}

impl<K: Typed, V: Typed> Typed for (K, V) {
    fn type_info() -> TypeInfo {
        TypeInfo::pair::<K, V>()
    }
}

// --- Sequences ---

macro_rules! impl_sequence {
    ($ty:ident, $kind:expr $(, $bound:path)*) => {
        impl<T: Typed $(+ $bound)*> Typed for $ty<T> {
            fn type_info() -> TypeInfo {
                TypeInfo::sequence::<Self>()
            }
        }

        impl<T: Typed $(+ $bound)*> SequenceType for $ty<T> {
            type Item = T;
            const KIND: SequenceKind = $kind;

            fn items(&self) -> Vec<&T> {
                self.iter().collect()
            }

            fn from_items(items: Vec<T>) -> Result<Self> {
                Ok(items.into_iter().collect())
            }
        }
    };
}

impl_sequence!(Vec, SequenceKind::List);
impl_sequence!(VecDeque, SequenceKind::Queue);
impl_sequence!(LinkedList, SequenceKind::LinkedList);
impl_sequence!(BTreeSet, SequenceKind::SortedSet, Ord);

impl<T: Typed> Typed for Box<[T]> {
    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<Self>()
    }
}

impl<T: Typed> SequenceType for Box<[T]> {
    type Item = T;
    const KIND: SequenceKind = SequenceKind::Array;

    fn items(&self) -> Vec<&T> {
        self.iter().collect()
    }

    fn from_items(items: Vec<T>) -> Result<Self> {
        Ok(items.into_boxed_slice())
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<Self>()
    }
}

impl<T: Typed, const N: usize> SequenceType for [T; N] {
    type Item = T;
    const KIND: SequenceKind = SequenceKind::Array;

    fn items(&self) -> Vec<&T> {
        self.iter().collect()
    }

    fn from_items(items: Vec<T>) -> Result<Self> {
        items.try_into().map_err(|items: Vec<T>| {
            SerializationError::Decode(format!(
                "expected array of length {N}, got {}",
                items.len()
            ))
        })
    }
}

impl<T, S> Typed for HashSet<T, S>
where
    T: Typed + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<Self>()
    }
}

impl<T, S> SequenceType for HashSet<T, S>
where
    T: Typed + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Item = T;
    const KIND: SequenceKind = SequenceKind::Set;

    fn items(&self) -> Vec<&T> {
        self.iter().collect()
    }

    fn from_items(items: Vec<T>) -> Result<Self> {
        Ok(items.into_iter().collect())
    }
}

// --- Maps ---

impl<K, V, S> Typed for HashMap<K, V, S>
where
    K: Typed + Eq + Hash,
    V: Typed,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    fn type_info() -> TypeInfo {
        TypeInfo::map::<Self>()
    }
}

impl<K, V, S> MapType for HashMap<K, V, S>
where
    K: Typed + Eq + Hash,
    V: Typed,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;
    const KIND: MapKind = MapKind::Hash;

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn from_entries(entries: Vec<(K, V)>) -> Result<Self> {
        let mut map = HashMap::with_capacity_and_hasher(entries.len(), S::default());
        for (k, v) in entries {
            if map.insert(k, v).is_some() {
                return Err(SerializationError::DuplicateKey {
                    type_name: std::any::type_name::<Self>(),
                });
            }
        }
        Ok(map)
    }
}

impl<K: Typed + Ord, V: Typed> Typed for BTreeMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::map::<Self>()
    }
}

impl<K: Typed + Ord, V: Typed> MapType for BTreeMap<K, V> {
    type Key = K;
    type Value = V;
    const KIND: MapKind = MapKind::Sorted;

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn from_entries(entries: Vec<(K, V)>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (k, v) in entries {
            if map.insert(k, v).is_some() {
                return Err(SerializationError::DuplicateKey {
                    type_name: std::any::type_name::<Self>(),
                });
            }
        }
        Ok(map)
    }
}
