//! Serde support for floats that may be NaN or infinite.
//!
//! JSON has no literal for non-finite numbers, so they are written as the
//! strings `"NaN"`, `"inf"` and `"-inf"`. Finite values stay plain numbers.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Band {
//!     #[serde(with = "raster_common::nonfinite::option")]
//!     nodata: Option<f64>,
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire form of one float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FloatRepr {
    Number(f64),
    Text(String),
}

impl FloatRepr {
    pub fn encode(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else if value.is_nan() {
            Self::Text("NaN".to_string())
        } else if value > 0.0 {
            Self::Text("inf".to_string())
        } else {
            Self::Text("-inf".to_string())
        }
    }

    pub fn decode(&self) -> Result<f64, String> {
        match self {
            Self::Number(v) => Ok(*v),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "nan" => Ok(f64::NAN),
                "inf" | "+inf" | "infinity" | "+infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                other => Err(format!("expected a number, NaN or inf, got '{}'", other)),
            },
        }
    }
}

/// `Option<f64>` with non-finite support; `None` stays `null`.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(FloatRepr::encode).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Option::<FloatRepr>::deserialize(deserializer)?
            .map(|repr| repr.decode().map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Plain `f64` with non-finite support.
pub mod float {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        FloatRepr::encode(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        FloatRepr::deserialize(deserializer)?
            .decode()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "option")]
        nodata: Option<f64>,
        #[serde(with = "float")]
        value: f64,
    }

    #[test]
    fn test_non_finite_written_as_text() {
        let json = serde_json::to_string(&Holder {
            nodata: Some(f64::NAN),
            value: f64::NEG_INFINITY,
        })
        .unwrap();
        assert_eq!(json, r#"{"nodata":"NaN","value":"-inf"}"#);

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert!(back.nodata.unwrap().is_nan());
        assert_eq!(back.value, f64::NEG_INFINITY);
    }

    #[test]
    fn test_finite_and_null_unchanged() {
        let json = serde_json::to_string(&Holder {
            nodata: None,
            value: 2.5,
        })
        .unwrap();
        assert_eq!(json, r#"{"nodata":null,"value":2.5}"#);

        let back: Holder = serde_json::from_str(r#"{"nodata": 255, "value": "Infinity"}"#).unwrap();
        assert_eq!(back.nodata, Some(255.0));
        assert_eq!(back.value, f64::INFINITY);
    }

    #[test]
    fn test_unknown_text_rejected() {
        assert!(serde_json::from_str::<Holder>(r#"{"nodata": "none", "value": 1}"#).is_err());
    }
}
