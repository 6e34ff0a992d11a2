//! Conversions from a JSON [`Scalar`] into metadata destination types.
//!
//! Each conversion consumes the scalar. The numeric and string formats follow
//! the reference filter so that metadata consumers see identical values:
//! floats render in fixed notation with six fractional digits, and numeric
//! strings are trimmed of ASCII whitespace before parsing.

use crate::MAX_PAYLOAD_VALUE_LEN;
use crate::error::ConversionError;
use crate::metadata::MetadataValue;
use crate::value::Scalar;

fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

impl Scalar {
    /// Renders the scalar as text. Strings are returned unchanged.
    pub fn into_display_string(self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => format!("{f:.6}"),
            Scalar::String(s) => s,
        }
    }

    /// Converts the scalar into a number.
    ///
    /// Booleans become `0.0`/`1.0`; strings must hold a floating point literal,
    /// optionally surrounded by whitespace.
    pub fn into_number(self) -> Result<f64, ConversionError> {
        match self {
            Scalar::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
            Scalar::Int(i) => Ok(i as f64),
            Scalar::Float(f) => Ok(f),
            Scalar::String(s) => s
                .trim_matches(is_ascii_space)
                .parse::<f64>()
                .map_err(|_| ConversionError::NotANumber(s)),
        }
    }

    /// Converts the scalar into a structured metadata value.
    ///
    /// Integers are widened to `f64`; precision beyond 2^53 is lost.
    pub fn into_metadata_value(self) -> Result<MetadataValue, ConversionError> {
        match self {
            Scalar::Bool(b) => Ok(MetadataValue::Bool(b)),
            Scalar::Int(i) => Ok(MetadataValue::Number(i as f64)),
            Scalar::Float(f) => Ok(MetadataValue::Number(f)),
            Scalar::String(s) => {
                check_payload_len(&s)?;
                Ok(MetadataValue::String(s))
            }
        }
    }
}

/// Rejects strings longer than [`MAX_PAYLOAD_VALUE_LEN`] bytes.
pub fn check_payload_len(value: &str) -> Result<(), ConversionError> {
    if value.len() > MAX_PAYLOAD_VALUE_LEN {
        return Err(ConversionError::PayloadTooLarge(value.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_string() {
        assert_eq!(Scalar::Bool(true).into_display_string(), "true");
        assert_eq!(Scalar::Bool(false).into_display_string(), "false");
        assert_eq!(Scalar::Int(-12).into_display_string(), "-12");
        assert_eq!(Scalar::Float(3.5).into_display_string(), "3.500000");
        assert_eq!(Scalar::Float(0.1).into_display_string(), "0.100000");
        assert_eq!(Scalar::from(" raw ").into_display_string(), " raw ");
    }

    #[test]
    fn test_number_from_each_scalar() {
        assert_eq!(Scalar::Bool(true).into_number(), Ok(1.0));
        assert_eq!(Scalar::Bool(false).into_number(), Ok(0.0));
        assert_eq!(Scalar::Int(42).into_number(), Ok(42.0));
        assert_eq!(Scalar::Float(2.25).into_number(), Ok(2.25));
    }

    #[test]
    fn test_number_from_string_trims_whitespace() {
        assert_eq!(Scalar::from(" 3.5 ").into_number(), Ok(3.5));
        assert_eq!(Scalar::from("\t42\n").into_number(), Ok(42.0));
        assert_eq!(Scalar::from("-1e3").into_number(), Ok(-1000.0));
    }

    #[test]
    fn test_number_from_garbage_fails() {
        assert_eq!(
            Scalar::from("abc").into_number(),
            Err(ConversionError::NotANumber("abc".into()))
        );
        assert!(Scalar::from("").into_number().is_err());
        assert!(Scalar::from("4 2").into_number().is_err());
    }

    #[test]
    fn test_metadata_value() {
        assert_eq!(
            Scalar::Bool(true).into_metadata_value(),
            Ok(MetadataValue::Bool(true))
        );
        assert_eq!(
            Scalar::Int(7).into_metadata_value(),
            Ok(MetadataValue::Number(7.0))
        );
        assert_eq!(
            Scalar::from("v").into_metadata_value(),
            Ok(MetadataValue::from("v"))
        );
    }

    #[test]
    fn test_payload_limit_is_inclusive() {
        let at_limit = "x".repeat(MAX_PAYLOAD_VALUE_LEN);
        assert!(Scalar::from(at_limit).into_metadata_value().is_ok());

        let over = "x".repeat(MAX_PAYLOAD_VALUE_LEN + 1);
        assert_eq!(
            Scalar::from(over).into_metadata_value(),
            Err(ConversionError::PayloadTooLarge(MAX_PAYLOAD_VALUE_LEN + 1))
        );
    }
}
