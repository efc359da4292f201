//! The five feature switches sent with every liveness request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the request feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Compute image quality (blur, dark, grayscale).
    UseQuality,
    /// Detect image attributes (sunglasses, mask, veil).
    UseAttribute,
    /// Reject images failing the quality thresholds.
    ValidateQuality,
    /// Reject images with sunglasses or a mask.
    ValidateAttribute,
    /// Reject images with more than one face.
    ValidateNFace,
}

impl Flag {
    /// All flags in wire order.
    pub const ALL: [Flag; 5] = [
        Flag::UseQuality,
        Flag::UseAttribute,
        Flag::ValidateQuality,
        Flag::ValidateAttribute,
        Flag::ValidateNFace,
    ];

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Flag::UseQuality => "quality",
            Flag::UseAttribute => "attribute",
            Flag::ValidateQuality => "validate-quality",
            Flag::ValidateAttribute => "validate-attribute",
            Flag::ValidateNFace => "validate-nface",
        }
    }

    /// JSON key in the request body.
    pub fn wire_key(self) -> &'static str {
        match self {
            Flag::UseQuality => "is_quality",
            Flag::UseAttribute => "is_attribute",
            Flag::ValidateQuality => "validate_quality",
            Flag::ValidateAttribute => "validate_attribute",
            Flag::ValidateNFace => "validate_nface",
        }
    }

    /// Label shown next to the switch.
    pub fn label(self) -> &'static str {
        match self {
            Flag::UseQuality => "Use Quality Check",
            Flag::UseAttribute => "Use Attribute",
            Flag::ValidateQuality => "Validate Quality",
            Flag::ValidateAttribute => "Validate Attribute",
            Flag::ValidateNFace => "Validate NFace",
        }
    }

    /// One-line explanation of what the API does with the flag.
    pub fn description(self) -> &'static str {
        match self {
            Flag::UseQuality => "compute and return image quality (blur, dark, grayscale)",
            Flag::UseAttribute => "detect and return image attributes (sunglasses, mask, veil)",
            Flag::ValidateQuality => {
                "reject blurred, dark or grayscale images; liveness depends on quality"
            }
            Flag::ValidateAttribute => "reject images where sunglasses or a mask is detected",
            Flag::ValidateNFace => "reject images containing more than one face",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a flag name is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown flag `{0}` (expected one of: quality, attribute, validate-quality, validate-attribute, validate-nface)")]
pub struct UnknownFlag(pub String);

impl FromStr for Flag {
    type Err = UnknownFlag;

    /// Accepts the command-line name or the wire key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Flag::ALL
            .into_iter()
            .find(|flag| flag.name() == needle || flag.wire_key() == needle)
            .ok_or_else(|| UnknownFlag(s.to_string()))
    }
}

/// Request configuration: five independent booleans, all on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Compute image quality.
    #[serde(rename = "is_quality")]
    pub use_quality: bool,
    /// Detect face attributes.
    #[serde(rename = "is_attribute")]
    pub use_attribute: bool,
    /// Reject images of poor quality.
    pub validate_quality: bool,
    /// Reject images whose attributes fail validation.
    pub validate_attribute: bool,
    /// Reject images without exactly one face.
    pub validate_nface: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            use_quality: true,
            use_attribute: true,
            validate_quality: true,
            validate_attribute: true,
            validate_nface: true,
        }
    }
}

impl RequestConfig {
    /// Current value of a flag.
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::UseQuality => self.use_quality,
            Flag::UseAttribute => self.use_attribute,
            Flag::ValidateQuality => self.validate_quality,
            Flag::ValidateAttribute => self.validate_attribute,
            Flag::ValidateNFace => self.validate_nface,
        }
    }

    /// Sets a flag.
    pub fn set(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::UseQuality => &mut self.use_quality,
            Flag::UseAttribute => &mut self.use_attribute,
            Flag::ValidateQuality => &mut self.validate_quality,
            Flag::ValidateAttribute => &mut self.validate_attribute,
            Flag::ValidateNFace => &mut self.validate_nface,
        };
        *slot = value;
    }

    /// Flips a flag and returns its new value.
    pub fn toggle(&mut self, flag: Flag) -> bool {
        let value = !self.get(flag);
        self.set(flag, value);
        value
    }

    /// Flags paired with their values, in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Flag, bool)> + '_ {
        Flag::ALL.into_iter().map(move |flag| (flag, self.get(flag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_all_on() {
        let config = RequestConfig::default();
        assert!(config.iter().all(|(_, value)| value));
    }

    #[test]
    fn test_flags_independent() {
        let mut config = RequestConfig::default();
        assert!(!config.toggle(Flag::ValidateNFace));

        for (flag, value) in config.iter() {
            assert_eq!(value, flag != Flag::ValidateNFace, "{flag}");
        }

        config.set(Flag::ValidateNFace, true);
        assert_eq!(config, RequestConfig::default());
    }

    #[test]
    fn test_parse_names_and_wire_keys() {
        assert_eq!("quality".parse::<Flag>(), Ok(Flag::UseQuality));
        assert_eq!("is_attribute".parse::<Flag>(), Ok(Flag::UseAttribute));
        assert_eq!("Validate-NFace".parse::<Flag>(), Ok(Flag::ValidateNFace));
        assert!("sharpness".parse::<Flag>().is_err());
    }

    #[test]
    fn test_wire_keys_match_serde() {
        let json = serde_json::to_value(RequestConfig::default()).unwrap();
        let object = json.as_object().unwrap();
        for flag in Flag::ALL {
            assert!(object.contains_key(flag.wire_key()), "{}", flag.wire_key());
        }
        assert_eq!(object.len(), Flag::ALL.len());
    }
}
