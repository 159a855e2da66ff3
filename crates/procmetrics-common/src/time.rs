use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the unix epoch, as written after exposition samples.
pub fn unix_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn unix_millis_counts_from_epoch() {
        let dt = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 1).single();
        assert_eq!(dt.map(|dt| unix_millis(&dt)), Some(1000));
    }
}
