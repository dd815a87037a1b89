use chrono::{DateTime, Utc};

/// Seconds between 1904-01-01T00:00:00Z and the Unix epoch.
pub const PALM_EPOCH_OFFSET: i64 = 2_082_844_800;

pub fn palm_epoch() -> DateTime<Utc> {
    from_palm_timestamp(0)
}

pub fn from_palm_timestamp(timestamp: u32) -> DateTime<Utc> {
    // Every u32 second count lands well inside chrono's range.
    DateTime::from_timestamp(timestamp as i64 - PALM_EPOCH_OFFSET, 0)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Reads the 4-byte second count at `offset` and converts it to a UTC time.
pub fn get_time(buf: &[u8], offset: usize) -> byyte::Result<DateTime<Utc>> {
    Ok(from_palm_timestamp(byyte::be::get_u32(buf, offset)?))
}
