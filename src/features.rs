use crate::registry::Registry;

#[cfg(feature = "chrono")]
mod chrono_support {
    use crate::context::SerializationContext;
    use crate::core::StandardTypeSerializer;
    use crate::dispatch;
    use crate::info::{TypeInfo, Typed};
    use crate::io::{Sink, Source};
    use crate::registry::Registry;
    use crate::serializer::ValueSerializer;
    use crate::{Result, SerializationError};
    use async_trait::async_trait;
    use bytes::{Buf, BufMut};
    use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
    use tokio_util::sync::CancellationToken;

    /// 100-nanosecond ticks per second.
    pub(crate) const TICKS_PER_SECOND: i64 = 10_000_000;
    const NANOS_PER_TICK: i64 = 100;
    /// Seconds from 0001-01-01T00:00:00 to the Unix epoch.
    const UNIX_EPOCH_SECONDS: i64 = 62_135_596_800;
    const MAX_TICKS: i64 = 3_155_378_975_999_999_999;
    const TICKS_PER_DAY: i64 = 86_400 * TICKS_PER_SECOND;

    macro_rules! impl_typed_opaque {
        ($($t:ty),*) => {
            $(
                impl Typed for $t {
                    fn type_info() -> TypeInfo {
                        TypeInfo::opaque::<$t>()
                    }
                }
            )*
        };
    }

    impl_typed_opaque!(NaiveDateTime, DateTime<Utc>, TimeDelta, NaiveDate, NaiveTime);

    /// Ticks since 0001-01-01T00:00:00.
    pub(crate) fn datetime_to_ticks(value: &NaiveDateTime) -> Result<i64> {
        let utc = value.and_utc();
        let nanos = i64::from(utc.timestamp_subsec_nanos().min(999_999_999));
        utc.timestamp()
            .checked_add(UNIX_EPOCH_SECONDS)
            .and_then(|s| s.checked_mul(TICKS_PER_SECOND))
            .and_then(|t| t.checked_add(nanos / NANOS_PER_TICK))
            .filter(|t| (0..=MAX_TICKS).contains(t))
            .ok_or_else(|| SerializationError::Encode(format!("{value} is outside the tick range")))
    }

    pub(crate) fn ticks_to_datetime(ticks: i64) -> Result<NaiveDateTime> {
        if !(0..=MAX_TICKS).contains(&ticks) {
            return Err(SerializationError::Decode(format!(
                "tick count {ticks} is outside the date range"
            )));
        }
        let seconds = ticks / TICKS_PER_SECOND - UNIX_EPOCH_SECONDS;
        let nanos = (ticks % TICKS_PER_SECOND) * NANOS_PER_TICK;
        DateTime::from_timestamp(seconds, nanos as u32)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| SerializationError::Decode(format!("invalid tick count {ticks}")))
    }

    pub(crate) fn duration_to_ticks(value: &TimeDelta) -> Result<i64> {
        value
            .num_seconds()
            .checked_mul(TICKS_PER_SECOND)
            .and_then(|t| t.checked_add(i64::from(value.subsec_nanos()) / NANOS_PER_TICK))
            .ok_or_else(|| SerializationError::Encode(format!("{value} overflows the tick range")))
    }

    pub(crate) fn ticks_to_duration(ticks: i64) -> Result<TimeDelta> {
        let seconds = TimeDelta::try_seconds(ticks / TICKS_PER_SECOND)
            .ok_or_else(|| SerializationError::Decode(format!("invalid tick count {ticks}")))?;
        Ok(seconds + TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK))
    }

    pub(crate) fn time_to_ticks(value: &NaiveTime) -> i64 {
        let nanos = i64::from(value.nanosecond().min(999_999_999));
        i64::from(value.num_seconds_from_midnight()) * TICKS_PER_SECOND + nanos / NANOS_PER_TICK
    }

    pub(crate) fn ticks_to_time(ticks: i64) -> Result<NaiveTime> {
        if !(0..TICKS_PER_DAY).contains(&ticks) {
            return Err(SerializationError::Decode(format!(
                "tick count {ticks} is outside a day"
            )));
        }
        let seconds = (ticks / TICKS_PER_SECOND) as u32;
        let nanos = ((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
            .ok_or_else(|| SerializationError::Decode(format!("invalid tick count {ticks}")))
    }

    /// Year as `i16`, then month and day as `u8`, each through the engine.
    #[derive(Default)]
    pub struct DateSerializer;

    #[async_trait]
    impl ValueSerializer<NaiveDate> for DateSerializer {
        async fn to_stream(
            &self,
            stream: &mut Sink<'_>,
            value: &NaiveDate,
            context: &SerializationContext,
            token: &CancellationToken,
        ) -> Result<()> {
            let year = i16::try_from(value.year()).map_err(|_| {
                SerializationError::Encode(format!("year of {value} does not fit in i16"))
            })?;
            dispatch::to_stream(stream, &year, context, token).await?;
            dispatch::to_stream(stream, &(value.month() as u8), context, token).await?;
            dispatch::to_stream(stream, &(value.day() as u8), context, token).await
        }

        async fn from_stream(
            &self,
            stream: &mut Source<'_>,
            context: &SerializationContext,
            token: &CancellationToken,
        ) -> Result<NaiveDate> {
            let year: i16 = dispatch::from_stream(stream, context, token).await?;
            let month: u8 = dispatch::from_stream(stream, context, token).await?;
            let day: u8 = dispatch::from_stream(stream, context, token).await?;
            NaiveDate::from_ymd_opt(year.into(), month.into(), day.into()).ok_or_else(|| {
                SerializationError::Decode(format!("invalid date {year}-{month}-{day}"))
            })
        }
    }

    pub(super) fn register(registry: &Registry) {
        registry.builtin::<NaiveDateTime, _, _>(|| {
            StandardTypeSerializer::<NaiveDateTime>::new(
                8,
                |v, buf| {
                    buf.put_i64_ne(datetime_to_ticks(v)?);
                    Ok(())
                },
                |buf| ticks_to_datetime(buf.get_i64_ne()),
            )
        });
        registry.builtin::<DateTime<Utc>, _, _>(|| {
            StandardTypeSerializer::<DateTime<Utc>>::new(
                8,
                |v, buf| {
                    buf.put_i64_ne(datetime_to_ticks(&v.naive_utc())?);
                    Ok(())
                },
                |buf| ticks_to_datetime(buf.get_i64_ne()).map(|dt| dt.and_utc()),
            )
        });
        registry.builtin::<TimeDelta, _, _>(|| {
            StandardTypeSerializer::<TimeDelta>::new(
                8,
                |v, buf| {
                    buf.put_i64_ne(duration_to_ticks(v)?);
                    Ok(())
                },
                |buf| ticks_to_duration(buf.get_i64_ne()),
            )
        });
        registry.builtin::<NaiveTime, _, _>(|| {
            StandardTypeSerializer::<NaiveTime>::new(
                8,
                |v, buf| {
                    buf.put_i64_ne(time_to_ticks(v));
                    Ok(())
                },
                |buf| ticks_to_time(buf.get_i64_ne()),
            )
        });
        registry.builtin::<NaiveDate, _, _>(|| DateSerializer);
    }

}

#[cfg(feature = "uuid")]
mod uuid_support {
    use crate::context::{ByteOrder, SerializationContext, UuidForm};
    use crate::info::{TypeInfo, Typed};
    use crate::io::{self, Sink, Source};
    use crate::registry::Registry;
    use crate::serializer::ValueSerializer;
    use crate::Result;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    impl Typed for Uuid {
        fn type_info() -> TypeInfo {
            TypeInfo::opaque::<Uuid>()
        }
    }

    /// 16 raw bytes: network layout when the context is big-endian or uses the Linux
    /// form, mixed layout otherwise.
    #[derive(Default)]
    pub struct GuidSerializer;

    fn network_layout(context: &SerializationContext) -> bool {
        context.byte_order() == ByteOrder::BigEndian || context.uuid_form() == UuidForm::Linux
    }

    #[async_trait]
    impl ValueSerializer<Uuid> for GuidSerializer {
        async fn to_stream(
            &self,
            stream: &mut Sink<'_>,
            value: &Uuid,
            context: &SerializationContext,
            token: &CancellationToken,
        ) -> Result<()> {
            let bytes = if network_layout(context) {
                *value.as_bytes()
            } else {
                value.to_bytes_le()
            };
            io::write_all(stream, &bytes, token).await
        }

        async fn from_stream(
            &self,
            stream: &mut Source<'_>,
            context: &SerializationContext,
            token: &CancellationToken,
        ) -> Result<Uuid> {
            let buf = io::read_exact(stream, 16, token).await?;
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(&buf);
            Ok(if network_layout(context) {
                Uuid::from_bytes(bytes)
            } else {
                Uuid::from_bytes_le(bytes)
            })
        }
    }

    pub(super) fn register(registry: &Registry) {
        registry.builtin::<Uuid, _, _>(|| GuidSerializer);
    }
}

#[cfg(feature = "rust_decimal")]
mod decimal_support {
    use crate::core::StandardTypeSerializer;
    use crate::info::{TypeInfo, Typed};
    use crate::registry::Registry;
    use crate::{Result, SerializationError};
    use bytes::{Buf, BufMut};
    use rust_decimal::Decimal;

    const SIGN_MASK: u32 = 0x8000_0000;
    const SCALE_MASK: u32 = 0x00ff_0000;
    const SCALE_SHIFT: u32 = 16;
    const MAX_SCALE: u32 = 28;

    impl Typed for Decimal {
        fn type_info() -> TypeInfo {
            TypeInfo::opaque::<Decimal>()
        }
    }

    /// Packs lo, mid, hi and flags into one native 128-bit word, lowest part first.
    pub(crate) fn decimal_to_bits(value: &Decimal) -> u128 {
        let mantissa = value.mantissa().unsigned_abs();
        let mut flags = value.scale() << SCALE_SHIFT;
        if value.is_sign_negative() {
            flags |= SIGN_MASK;
        }
        (mantissa & ((1u128 << 96) - 1)) | (u128::from(flags) << 96)
    }

    pub(crate) fn bits_to_decimal(bits: u128) -> Result<Decimal> {
        let lo = bits as u32;
        let mid = (bits >> 32) as u32;
        let hi = (bits >> 64) as u32;
        let flags = (bits >> 96) as u32;
        let scale = (flags & SCALE_MASK) >> SCALE_SHIFT;
        if flags & !(SIGN_MASK | SCALE_MASK) != 0 || scale > MAX_SCALE {
            return Err(SerializationError::Decode(format!(
                "invalid decimal flags 0x{flags:08x}"
            )));
        }
        Ok(Decimal::from_parts(lo, mid, hi, flags & SIGN_MASK != 0, scale))
    }

    pub(super) fn register(registry: &Registry) {
        registry.builtin::<Decimal, _, _>(|| {
            StandardTypeSerializer::<Decimal>::new(
                16,
                |v, buf| {
                    buf.put_u128_ne(decimal_to_bits(v));
                    Ok(())
                },
                |buf| bits_to_decimal(buf.get_u128_ne()),
            )
        });
    }

}

#[cfg(feature = "indexmap")]
mod indexmap_support {
    use crate::info::{MapKind, MapType, SequenceKind, SequenceType, TypeInfo, Typed};
    use crate::{Result, SerializationError};
    use indexmap::{IndexMap, IndexSet};
    use std::hash::{BuildHasher, Hash};

    impl<K, V, S> Typed for IndexMap<K, V, S>
    where
        K: Typed + Eq + Hash,
        V: Typed,
        S: BuildHasher + Default + Send + Sync + 'static,
    {
        fn type_info() -> TypeInfo {
            TypeInfo::map::<Self>()
        }
    }

    impl<K, V, S> MapType for IndexMap<K, V, S>
    where
        K: Typed + Eq + Hash,
        V: Typed,
        S: BuildHasher + Default + Send + Sync + 'static,
    {
        type Key = K;
        type Value = V;
        const KIND: MapKind = MapKind::Indexed;

        fn entries(&self) -> Vec<(&K, &V)> {
            self.iter().collect()
        }

        fn from_entries(entries: Vec<(K, V)>) -> Result<Self> {
            let mut map = IndexMap::with_capacity_and_hasher(entries.len(), S::default());
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

    impl<T, S> Typed for IndexSet<T, S>
    where
        T: Typed + Eq + Hash,
        S: BuildHasher + Default + Send + Sync + 'static,
    {
        fn type_info() -> TypeInfo {
            TypeInfo::sequence::<Self>()
        }
    }

    impl<T, S> SequenceType for IndexSet<T, S>
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
}

#[cfg(feature = "smol_str")]
mod smol_str_support {
    use crate::core::StringSerializer;
    use crate::info::{TypeInfo, Typed};
    use crate::registry::Registry;
    use smol_str::SmolStr;

    impl Typed for SmolStr {
        fn type_info() -> TypeInfo {
            TypeInfo::opaque::<SmolStr>().nullable()
        }
    }

    pub(super) fn register(registry: &Registry) {
        registry.builtin::<SmolStr, _, _>(StringSerializer::<SmolStr>::default);
    }
}

#[allow(unused_variables)]
pub(crate) fn register_builtins(registry: &Registry) {
    #[cfg(feature = "chrono")]
    chrono_support::register(registry);
    #[cfg(feature = "uuid")]
    uuid_support::register(registry);
    #[cfg(feature = "rust_decimal")]
    decimal_support::register(registry);
    #[cfg(feature = "smol_str")]
    smol_str_support::register(registry);
}
