//! Per-call serialization settings.

use crate::info::{Shape, TypeInfo, Typed};
use crate::registry;
use crate::serializable;
use crate::serializer::{erase, TypeSerializer, ValueSerializer};
use crate::text::TextEncoding;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Byte order applied to multi-byte scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// The byte order of the running machine.
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }
}

/// Layout of the 16 UUID bytes.
///
/// `Microsoft` is the mixed layout (first three groups little-endian); `Linux` is the
/// network layout. A big-endian context always uses the network layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UuidForm {
    Microsoft,
    Linux,
}

#[derive(Clone)]
struct ScopedSerializer {
    type_name: &'static str,
    serializer: Arc<dyn TypeSerializer>,
}

/// Immutable configuration passed to every serialize/deserialize call.
///
/// Contexts are derived with the `with_*` methods, which return a modified copy.
/// Scoped serializers registered on a context are never visible to the global registry.
#[derive(Clone)]
pub struct SerializationContext {
    byte_order: ByteOrder,
    uuid_form: UuidForm,
    allow_null_values: bool,
    encoding: TextEncoding,
    serializers: Arc<HashMap<TypeId, ScopedSerializer>>,
}

impl Default for SerializationContext {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::BigEndian,
            uuid_form: UuidForm::Linux,
            allow_null_values: true,
            encoding: TextEncoding::Utf8,
            serializers: Arc::new(HashMap::new()),
        }
    }
}

impl SerializationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn uuid_form(&self) -> UuidForm {
        self.uuid_form
    }

    pub fn allow_null_values(&self) -> bool {
        self.allow_null_values
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_uuid_form(mut self, uuid_form: UuidForm) -> Self {
        self.uuid_form = uuid_form;
        self
    }

    pub fn with_allow_null_values(mut self, allow_null_values: bool) -> Self {
        self.allow_null_values = allow_null_values;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns a copy whose scoped serializer for `T` is `serializer`.
    ///
    /// A previous scoped serializer for `T` on this context is replaced.
    pub fn with_serializer<T, S>(self, serializer: S) -> Self
    where
        T: Typed,
        S: ValueSerializer<T> + 'static,
    {
        let info = T::type_info();
        self.with_type_serializer(&info, erase::<T, S>(serializer))
    }

    /// Type-erased form of [`with_serializer`](Self::with_serializer).
    pub fn with_type_serializer(
        mut self,
        info: &TypeInfo,
        serializer: Arc<dyn TypeSerializer>,
    ) -> Self {
        Arc::make_mut(&mut self.serializers).insert(
            info.type_id(),
            ScopedSerializer {
                type_name: info.name(),
                serializer,
            },
        );
        self
    }

    /// Returns a copy without any scoped serializers.
    pub fn without_serializers(mut self) -> Self {
        self.serializers = Arc::new(HashMap::new());
        self
    }

    /// Whether a scoped serializer is registered for the exact type.
    pub fn has_scoped_serializer(&self, info: &TypeInfo) -> bool {
        self.serializers.contains_key(&info.type_id())
    }

    /// Resolves the serializer for `info` as seen from this context.
    ///
    /// Order: self-describing types, scoped serializers, the global registry, then the
    /// general serializers. Optional and dynamic types never resolve directly.
    pub fn find_type_serializer(&self, info: &TypeInfo) -> Option<Arc<dyn TypeSerializer>> {
        match info.shape() {
            Shape::Optional(_) | Shape::Dynamic => return None,
            Shape::SelfDescribing(_) => return Some(serializable::serializer()),
            _ => {}
        }
        if let Some(scoped) = self.serializers.get(&info.type_id()) {
            tracing::trace!(type_name = scoped.type_name, "resolved scoped serializer");
            return Some(Arc::clone(&scoped.serializer));
        }
        registry::lookup(info)
    }
}

impl PartialEq for SerializationContext {
    fn eq(&self, other: &Self) -> bool {
        self.byte_order == other.byte_order
            && self.uuid_form == other.uuid_form
            && self.allow_null_values == other.allow_null_values
            && self.encoding == other.encoding
            && self.serializers.len() == other.serializers.len()
            && self
                .serializers
                .keys()
                .all(|id| other.serializers.contains_key(id))
    }
}

impl Eq for SerializationContext {}

impl fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scoped: Vec<&str> = self.serializers.values().map(|s| s.type_name).collect();
        scoped.sort_unstable();
        f.debug_struct("SerializationContext")
            .field("byte_order", &self.byte_order)
            .field("uuid_form", &self.uuid_form)
            .field("allow_null_values", &self.allow_null_values)
            .field("encoding", &self.encoding)
            .field("serializers", &scoped)
            .finish()
    }
}
