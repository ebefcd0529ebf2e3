//! Utility functions for the session broker

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique placement ID
pub fn generate_placement_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a whole number of epoch seconds into a UTC timestamp
pub fn timestamp_from_secs(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Serde adapter for backend timestamps, which travel as fractional epoch seconds
pub mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.timestamp_millis() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", secs)))
    }

    /// Same as the parent module, for optional fields
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<f64>::deserialize(deserializer)? {
                Some(secs) => DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
                    .map(Some)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("timestamp out of range: {}", secs))
                    }),
                None => Ok(None),
            }
        }
    }
}
