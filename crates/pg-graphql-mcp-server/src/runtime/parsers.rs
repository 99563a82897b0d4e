use std::{fmt::Display, marker::PhantomData, str::FromStr};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserializer;

/// Deserialize any value that can be parsed from a string
pub(crate) fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    struct FromStrVisitor<Inner> {
        _phantom: PhantomData<Inner>,
    }
    impl<Inner> serde::de::Visitor<'_> for FromStrVisitor<Inner>
    where
        Inner: FromStr,
        <Inner as FromStr>::Err: Display,
    {
        type Value = Inner;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Inner::from_str(v).map_err(|e| serde::de::Error::custom(e.to_string()))
        }
    }

    deserializer.deserialize_str(FromStrVisitor {
        _phantom: PhantomData,
    })
}

/// Deserialize a map of header names to values, rejecting anything that is not a valid header
pub(crate) fn map_from_str<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
where
    D: Deserializer<'de>,
{
    struct HeaderMapVisitor;
    impl<'de> serde::de::Visitor<'de> for HeaderMapVisitor {
        type Value = HeaderMap;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a map of header string keys and values")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut parsed = HeaderMap::with_capacity(map.size_hint().unwrap_or(0));

            while let Some((key, value)) = map.next_entry::<String, String>()? {
                let key = HeaderName::from_str(&key)
                    .map_err(|e| serde::de::Error::custom(format!("header '{key}': {e}")))?;
                let value = HeaderValue::from_str(&value)
                    .map_err(|e| serde::de::Error::custom(format!("header '{key}': {e}")))?;

                parsed.insert(key, value);
            }

            Ok(parsed)
        }
    }

    deserializer.deserialize_map(HeaderMapVisitor)
}
