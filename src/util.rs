use serde::de::Visitor;
use serde::Deserializer;

/// This helper is intended to aid deserializing numeric fields that some
/// APIs send as strings. Porkbun, for instance, reports record TTLs as
/// `"600"` rather than `600`.
///
/// For example,
/// ```
/// JSON "600" ---> 600u32
/// JSON 600   ---> 600u32
/// ```
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = u32;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a non-negative integer or a string containing one")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            u32::try_from(value).map_err(|_| E::custom(format!("{} is out of range", value)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            u32::try_from(value).map_err(|_| E::custom(format!("{} is out of range", value)))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            value
                .trim()
                .parse::<u32>()
                .map_err(|e| E::custom(format!("\"{}\" is not a number: {}", value, e)))
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
