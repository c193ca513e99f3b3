#![cfg(feature = "chrono")]

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use wireform::{from_bytes, to_bytes, ByteOrder, SerializationContext, SerializationError};

fn little_endian() -> SerializationContext {
    SerializationContext::default()
        .with_byte_order(ByteOrder::LittleEndian)
        .with_allow_null_values(false)
}

fn big_endian() -> SerializationContext {
    SerializationContext::default().with_allow_null_values(false)
}

fn leap_day() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_micro_opt(13, 45, 30, 123_456)
        .unwrap()
}

#[tokio::test]
async fn test_unix_epoch_is_written_as_ticks() {
    let epoch = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
    let bytes = to_bytes(&epoch, &big_endian()).await.unwrap();
    assert_eq!(&bytes[..], &[0x08, 0x9f, 0x7f, 0xf5, 0xf7, 0xb5, 0x80, 0x00]);
    assert_eq!(
        from_bytes::<DateTime<Utc>>(&bytes, &big_endian()).await.unwrap(),
        epoch
    );
}

#[tokio::test]
async fn test_datetime_little_endian() {
    let bytes = to_bytes(&leap_day(), &little_endian()).await.unwrap();
    assert_eq!(&bytes[..], &[0x80, 0x0f, 0xa1, 0xb1, 0x2c, 0x39, 0xdc, 0x08]);
    assert_eq!(
        from_bytes::<NaiveDateTime>(&bytes, &little_endian())
            .await
            .unwrap(),
        leap_day()
    );
}

#[tokio::test]
async fn test_datetime_range() {
    let max = NaiveDate::from_ymd_opt(9999, 12, 31)
        .unwrap()
        .and_hms_nano_opt(23, 59, 59, 999_999_900)
        .unwrap();
    let bytes = to_bytes(&max, &big_endian()).await.unwrap();
    assert_eq!(&bytes[..], &[0x2b, 0xca, 0x28, 0x75, 0xf4, 0x37, 0x3f, 0xff]);

    let too_late = NaiveDate::from_ymd_opt(10_000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let err = to_bytes(&too_late, &big_endian()).await.unwrap_err();
    assert!(matches!(err, SerializationError::Encode(_)));

    let err = from_bytes::<NaiveDateTime>(&[0xff; 8], &big_endian())
        .await
        .unwrap_err();
    assert!(matches!(err, SerializationError::Decode(_)));
}

#[tokio::test]
async fn test_sub_tick_precision_is_truncated() {
    let precise = NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_nano_opt(0, 0, 0, 150)
        .unwrap();
    let bytes = to_bytes(&precise, &big_endian()).await.unwrap();
    let decoded = from_bytes::<NaiveDateTime>(&bytes, &big_endian())
        .await
        .unwrap();
    assert_eq!(decoded, precise - TimeDelta::nanoseconds(50));
}

#[tokio::test]
async fn test_negative_duration() {
    let value = TimeDelta::seconds(-90);
    let bytes = to_bytes(&value, &big_endian()).await.unwrap();
    assert_eq!(&bytes[..], &[0xff, 0xff, 0xff, 0xff, 0xca, 0x5b, 0x17, 0x00]);
    assert_eq!(from_bytes::<TimeDelta>(&bytes, &big_endian()).await.unwrap(), value);
}

#[tokio::test]
async fn test_date_layout() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let bytes = to_bytes(&date, &big_endian()).await.unwrap();
    assert_eq!(&bytes[..], &[0x07, 0xe8, 0x02, 0x1d]);

    let le = to_bytes(&date, &little_endian()).await.unwrap();
    assert_eq!(&le[..], &[0xe8, 0x07, 0x02, 0x1d]);
    assert_eq!(from_bytes::<NaiveDate>(&le, &little_endian()).await.unwrap(), date);

    let err = from_bytes::<NaiveDate>(&[0x07, 0xe9, 0x02, 0x1d], &big_endian())
        .await
        .unwrap_err();
    assert!(matches!(err, SerializationError::Decode(_)));
}

#[tokio::test]
async fn test_time_of_day() {
    let time = NaiveTime::from_hms_milli_opt(23, 59, 59, 500).unwrap();
    let bytes = to_bytes(&time, &little_endian()).await.unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(from_bytes::<NaiveTime>(&bytes, &little_endian()).await.unwrap(), time);
}

#[tokio::test]
async fn test_optional_dates_in_a_list() {
    let ctx = SerializationContext::default();
    let value = vec![Some(NaiveDate::from_ymd_opt(1, 1, 1).unwrap()), None];
    let bytes = to_bytes(&value, &ctx).await.unwrap();
    assert_eq!(
        &bytes[..],
        &[0x01, 0x00, 0x00, 0x00, 0x02, 0x01, 0x00, 0x01, 0x01, 0x01, 0x00]
    );
    assert_eq!(
        from_bytes::<Vec<Option<NaiveDate>>>(&bytes, &ctx).await.unwrap(),
        value
    );
}
