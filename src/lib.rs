//! # wireform
//!
//! A registry-driven binary object serializer. Values are written to and read from
//! asynchronous byte streams; every call carries a [`SerializationContext`] that decides
//! byte order, null handling, text encoding and UUID layout.
//!
//! - Built-in codecs for primitives, strings, UUIDs, versions, dates/times, decimals,
//!   enums, key-value pairs and the standard collections
//! - A process-wide serializer registry with lazily constructed codecs
//! - Per-context scoped serializers that override the registry for one call tree
//! - Self-describing types that carry their own encode/decode logic
//!
//! The format is schema-less: the reader must know the exact static type being decoded.
//!
//! ## Wire layout
//!
//! | Construct | Layout |
//! |---|---|
//! | Fixed scalar (width w) | w bytes in the context byte order |
//! | Nullable value (nulls allowed) | 1-byte presence flag, then the payload if present |
//! | String | 4-byte length, then the encoded bytes |
//! | Collection | 4-byte count, then the elements |
//! | Map | 4-byte count, then key/value pairs |
//! | Key-value pair | key, then value |
//! | Enum | the underlying integer |
//! | UUID | 16 bytes, network or mixed layout |
//! | Version | 4 ints (major, minor, build, revision; -1 when absent) |
//! | Date | 2-byte year, 1-byte month, 1-byte day |
//! | Decimal | 4 ints (lo, mid, hi, flags) |
//!
//! ## Feature Flags
//!
//! - `chrono` (default): `NaiveDateTime`, `DateTime<Utc>`, `TimeDelta`, `NaiveDate`, `NaiveTime`.
//! - `uuid` (default): `uuid::Uuid`.
//! - `rust_decimal` (default): `rust_decimal::Decimal`.
//! - `auto_register` (default): [`submit_serializer!`] declarations are registered when the
//!   registry is first used.
//! - `indexmap`: `IndexMap` and `IndexSet`.
//! - `smol_str`: `smol_str::SmolStr`.
//!
//! Maps and sets with any `BuildHasher + Default`, such as `FxHashMap`, need no feature.
//!
//! ## Example
//!
//! ```no_run
//! use wireform::{from_bytes, to_bytes, ByteOrder, SerializationContext};
//!
//! # async fn run() -> wireform::Result<()> {
//! let context = SerializationContext::default().with_byte_order(ByteOrder::LittleEndian);
//! let bytes = to_bytes(&vec![1i32, 2, 3], &context).await?;
//! let decoded: Vec<i32> = from_bytes(&bytes, &context).await?;
//! assert_eq!(decoded, vec![1, 2, 3]);
//! # Ok(())
//! # }
//! ```

pub mod collections;
pub mod context;
pub mod core;
pub mod dispatch;
pub mod dynamic;
pub mod enums;
mod features;
pub mod info;
pub mod io;
pub mod pair;
pub mod registry;
pub mod serializable;
pub mod serializer;
pub mod stack;
pub mod text;
pub mod version;

pub use context::{ByteOrder, SerializationContext, UuidForm};
pub use dispatch::{
    from_bytes, from_stream, from_stream_dyn, read_value, to_bytes, to_stream, to_stream_dyn,
    write_value,
};
pub use dynamic::Dynamic;
pub use enums::WireEnum;
pub use info::{AnyValue, Shape, TypeInfo, Typed};
pub use io::{Sink, Source};
pub use registry::{
    find_type_serializer, get_serializer, register_general_serializer, register_serializer,
    register_type_serializer,
};
#[cfg(feature = "auto_register")]
pub use registry::SerializerRegistration;
pub use serializable::Serializable;
pub use serializer::{erase, GeneralSerializer, TypeSerializer, ValueSerializer};
pub use stack::Stack;
pub use text::TextEncoding;
pub use tokio_util::sync::CancellationToken;
pub use version::Version;

pub use async_trait::async_trait;

#[doc(hidden)]
#[cfg(feature = "auto_register")]
pub mod __private {
    pub use inventory;
}

/// Errors that can occur during serialization, deserialization or registration.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Neither the registry, the context nor a general serializer handles the type.
    #[error("No serializer found for type '{type_name}'")]
    NoSerializer { type_name: &'static str },
    /// Neither an optional type nor its payload type has a serializer.
    #[error("No serializer found for type '{type_name}' or its payload type '{inner_name}'")]
    NoSerializerForEither {
        type_name: &'static str,
        inner_name: &'static str,
    },
    /// A null value was written while the context prohibits null values.
    #[error("Null value of type '{type_name}' is not allowed by the serialization context")]
    NullNotAllowed { type_name: &'static str },
    /// A null was decoded for a declared type that cannot hold one.
    #[error("Decoded null for non-optional type '{type_name}'")]
    UnexpectedNull { type_name: &'static str },
    /// The stream ended before the value was complete.
    #[error("Insufficient data in stream")]
    InsufficientData,
    /// The decoded integer does not match any declared enum member.
    #[error("Unknown value {value} for enum {enum_name}")]
    UnknownEnumValue {
        value: String,
        enum_name: &'static str,
    },
    /// The general serializer was handed a type shape it does not handle.
    #[error("Type '{type_name}' has an unsupported shape: {reason}")]
    UnsupportedShape {
        type_name: &'static str,
        reason: &'static str,
    },
    /// A map key decoded as null.
    #[error("Map key cannot be null")]
    NullKey,
    /// A map key appeared twice while decoding.
    #[error("Duplicate key while decoding map '{type_name}'")]
    DuplicateKey { type_name: &'static str },
    /// A length or count prefix is negative or out of range.
    #[error("Invalid length: {0}")]
    InvalidLength(i64),
    /// A type-erased value is not an instance of the expected type.
    #[error("Value is not an instance of '{expected}'")]
    TypeMismatch { expected: &'static str },
    /// A serializer is already registered for the type.
    #[error("Serializer for type '{type_name}' is already registered")]
    AlreadyRegistered { type_name: &'static str },
    /// The type cannot carry a registered serializer.
    #[error("Cannot register a serializer for '{type_name}': {reason}")]
    InvalidRegistration {
        type_name: &'static str,
        reason: &'static str,
    },
    /// Text bytes are not valid in the context encoding.
    #[error("Invalid {encoding} text: {reason}")]
    InvalidText {
        encoding: &'static str,
        reason: String,
    },
    /// The value could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),
    /// The bytes could not be decoded into a value.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The cancellation token fired before the operation completed.
    #[error("Operation cancelled")]
    Cancelled,
    /// The underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, SerializationError>;
