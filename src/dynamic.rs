//! Values whose concrete type is only known at runtime.

use crate::info::{AnyValue, TypeInfo, Typed};
use std::fmt;

/// A boxed value paired with its own type descriptor.
///
/// A `Vec<Dynamic>` encodes each element with the element's runtime type, so a single
/// collection can mix element types. The layout carries no type tags, which means a
/// `Dynamic` cannot be decoded: the reader must decode the concrete types instead.
pub struct Dynamic {
    info: TypeInfo,
    value: Box<AnyValue>,
}

impl Dynamic {
    pub fn new<T: Typed>(value: T) -> Self {
        Self {
            info: T::type_info(),
            value: Box::new(value),
        }
    }

    pub fn runtime_info(&self) -> TypeInfo {
        self.info
    }

    pub fn value(&self) -> &AnyValue {
        &*self.value
    }

    pub fn downcast_ref<T: Typed>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl Typed for Dynamic {
    fn type_info() -> TypeInfo {
        TypeInfo::dynamic::<Dynamic>()
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dynamic").field(&self.info.name()).finish()
    }
}
