//! Process-wide serializer registry.
//!
//! Exact-type serializers are stored as lazily constructed singletons; general
//! serializers are consulted in registration order when no exact entry exists. The
//! built-in codecs are installed the first time the registry is touched, followed by
//! every [`submit_serializer!`](crate::submit_serializer) declaration when the
//! `auto_register` feature is enabled.

use crate::collections::CollectionsSerializer;
use crate::core;
use crate::enums::EnumSerializer;
use crate::features;
use crate::info::{Shape, TypeInfo, Typed};
use crate::pair::KeyValuePairSerializer;
use crate::serializable;
use crate::serializer::{erase, GeneralSerializer, TypeSerializer, ValueSerializer};
use crate::{Result, SerializationError};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

type SerializerFactory = Box<dyn FnOnce() -> Arc<dyn TypeSerializer> + Send>;
type LazySerializer = LazyLock<Arc<dyn TypeSerializer>, SerializerFactory>;

struct Registration {
    type_name: &'static str,
    use_globally: bool,
    serializer: Arc<LazySerializer>,
}

#[derive(Clone)]
struct General {
    predicate: Arc<dyn GeneralSerializer>,
    serializer: Arc<dyn TypeSerializer>,
}

pub(crate) struct Registry {
    serializers: RwLock<HashMap<TypeId, Registration>>,
    general: RwLock<Vec<General>>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::with_builtins);

impl Registry {
    fn with_builtins() -> Self {
        let registry = Registry {
            serializers: RwLock::new(HashMap::new()),
            general: RwLock::new(Vec::new()),
        };
        registry.add_general(CollectionsSerializer);
        registry.add_general(KeyValuePairSerializer);
        registry.add_general(EnumSerializer);

        core::register_builtins(&registry);
        features::register_builtins(&registry);

        #[cfg(feature = "auto_register")]
        for submitted in inventory::iter::<SerializerRegistration> {
            let info = (submitted.type_info)();
            let factory = submitted.factory;
            if let Err(e) = registry.add(&info, Box::new(factory), submitted.use_globally) {
                tracing::warn!(type_name = info.name(), error = %e, "rejected submitted serializer");
            }
        }
        registry
    }

    /// Registers a built-in serializer; the built-in set never collides.
    pub(crate) fn builtin<T, S, F>(&self, factory: F)
    where
        T: Typed,
        S: ValueSerializer<T> + 'static,
        F: FnOnce() -> S + Send + 'static,
    {
        let info = T::type_info();
        if let Err(e) = self.add(&info, Box::new(move || erase::<T, S>(factory())), true) {
            tracing::warn!(type_name = info.name(), error = %e, "skipped built-in serializer");
        }
    }

    fn add(&self, info: &TypeInfo, factory: SerializerFactory, use_globally: bool) -> Result<()> {
        match info.shape() {
            Shape::Optional(_) => {
                return Err(SerializationError::InvalidRegistration {
                    type_name: info.name(),
                    reason: "optional types resolve through their payload type",
                })
            }
            Shape::Dynamic => {
                return Err(SerializationError::InvalidRegistration {
                    type_name: info.name(),
                    reason: "dynamic values resolve through their runtime type",
                })
            }
            _ => {}
        }
        let mut serializers = self.serializers.write();
        if serializers.contains_key(&info.type_id()) {
            return Err(SerializationError::AlreadyRegistered {
                type_name: info.name(),
            });
        }
        serializers.insert(
            info.type_id(),
            Registration {
                type_name: info.name(),
                use_globally,
                serializer: Arc::new(LazyLock::new(factory)),
            },
        );
        tracing::debug!(type_name = info.name(), use_globally, "registered serializer");
        Ok(())
    }

    fn add_general<S: GeneralSerializer + 'static>(&self, serializer: S) {
        let serializer = Arc::new(serializer);
        self.general.write().push(General {
            predicate: serializer.clone(),
            serializer,
        });
        tracing::debug!(
            serializer = std::any::type_name::<S>(),
            "registered general serializer"
        );
    }

    fn entry(&self, id: &TypeId, global_only: bool) -> Option<Arc<LazySerializer>> {
        let serializers = self.serializers.read();
        let registration = serializers.get(id)?;
        if global_only && !registration.use_globally {
            tracing::trace!(
                type_name = registration.type_name,
                "skipping non-global serializer"
            );
            return None;
        }
        Some(Arc::clone(&registration.serializer))
    }

    fn lookup(&self, info: &TypeInfo) -> Option<Arc<dyn TypeSerializer>> {
        if let Some(lazy) = self.entry(&info.type_id(), true) {
            // forced outside the map lock
            return Some(Arc::clone(LazyLock::force(&lazy)));
        }
        // predicates may resolve other types, so they run without the lock held
        let general = self.general.read().clone();
        let found = general
            .into_iter()
            .find(|g| g.predicate.is_type_supported(info))
            .map(|g| g.serializer);
        if found.is_some() {
            tracing::debug!(type_name = info.name(), "resolved general serializer");
        }
        found
    }
}

/// Registry and general-serializer lookup, without the self-describing check.
pub(crate) fn lookup(info: &TypeInfo) -> Option<Arc<dyn TypeSerializer>> {
    REGISTRY.lookup(info)
}

/// Registers the serializer produced by `factory` for `T`.
///
/// The factory runs once, the first time the serializer is needed. When `use_globally`
/// is false the serializer is only returned by [`get_serializer`] and never used by
/// context resolution.
pub fn register_serializer<T, S, F>(factory: F, use_globally: bool) -> Result<()>
where
    T: Typed,
    S: ValueSerializer<T> + 'static,
    F: FnOnce() -> S + Send + 'static,
{
    REGISTRY.add(
        &T::type_info(),
        Box::new(move || erase::<T, S>(factory())),
        use_globally,
    )
}

/// Registers an already constructed type-erased serializer for the type described by `info`.
pub fn register_type_serializer(
    info: &TypeInfo,
    serializer: Arc<dyn TypeSerializer>,
    use_globally: bool,
) -> Result<()> {
    REGISTRY.add(info, Box::new(move || serializer), use_globally)
}

/// Appends a general serializer; it is consulted after the built-in general serializers.
pub fn register_general_serializer<S: GeneralSerializer + 'static>(serializer: S) {
    REGISTRY.add_general(serializer)
}

/// Resolves the serializer for `info` without any context.
pub fn find_type_serializer(info: &TypeInfo) -> Option<Arc<dyn TypeSerializer>> {
    match info.shape() {
        Shape::Optional(_) | Shape::Dynamic => None,
        Shape::SelfDescribing(_) => Some(serializable::serializer()),
        _ => lookup(info),
    }
}

/// Returns the exact-type serializer registered for `T`, including non-global ones.
pub fn get_serializer<T: Typed>() -> Option<Arc<dyn TypeSerializer>> {
    let lazy = REGISTRY.entry(&TypeId::of::<T>(), false)?;
    Some(Arc::clone(LazyLock::force(&lazy)))
}

/// A serializer declared with [`submit_serializer!`](crate::submit_serializer).
#[cfg(feature = "auto_register")]
pub struct SerializerRegistration {
    pub type_info: fn() -> TypeInfo,
    pub factory: fn() -> Arc<dyn TypeSerializer>,
    pub use_globally: bool,
}

#[cfg(feature = "auto_register")]
inventory::collect!(SerializerRegistration);

/// Declares a serializer that is registered when the registry is first used.
///
/// ```ignore
/// wireform::submit_serializer!(Point => PointSerializer);
/// wireform::submit_serializer!(Secret => SecretSerializer, false);
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_serializer {
    ($ty:ty => $serializer:expr) => {
        $crate::submit_serializer!($ty => $serializer, true);
    };
    ($ty:ty => $serializer:expr, $use_globally:expr) => {
        $crate::__private::inventory::submit! {
            $crate::SerializerRegistration {
                type_info: <$ty as $crate::Typed>::type_info,
                factory: || $crate::erase::<$ty, _>($serializer),
                use_globally: $use_globally,
            }
        }
    };
}
