use crate::{
    Result,
    constants::{TRACKING_NUMBER_BODY_LENGTH, TRACKING_NUMBER_LENGTH, TRACKING_NUMBER_PREFIX},
    error::Error,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Scanner identifier assigned by the scanner hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScannerId(u32);

impl ScannerId {
    pub fn new(id: u32) -> Self {
        ScannerId(id)
    }

    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScannerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScannerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(ScannerId)
            .map_err(|_| Error::InvalidScannerId(s.to_string()))
    }
}

/// Carrier tracking number (`1Z` followed by 16 characters of `[0-9A-Z]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Create a tracking number with validation.
    ///
    /// Surrounding whitespace is trimmed. No case folding is applied since the
    /// grammar only admits uppercase letters.
    ///
    /// # Errors
    /// Returns `Error::InvalidTrackingNumber` if the value does not match the grammar.
    pub fn new(value: &str) -> Result<Self> {
        let value = value.trim();

        if !Self::is_valid(value) {
            return Err(Error::InvalidTrackingNumber(format!(
                "expected {TRACKING_NUMBER_PREFIX} followed by {TRACKING_NUMBER_BODY_LENGTH} \
                 characters of [0-9A-Z], got {value:?}"
            )));
        }

        Ok(TrackingNumber(value.to_string()))
    }

    /// Check a candidate against the tracking number grammar.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        value.len() == TRACKING_NUMBER_LENGTH
            && value.starts_with(TRACKING_NUMBER_PREFIX)
            && value[TRACKING_NUMBER_PREFIX.len()..]
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TrackingNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TrackingNumber::new(s)
    }
}

impl TryFrom<String> for TrackingNumber {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        TrackingNumber::new(&value)
    }
}

impl From<TrackingNumber> for String {
    fn from(value: TrackingNumber) -> Self {
        value.0
    }
}

/// Base64 encoded label image, without any `data:` URI prefix.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Create a payload from base64 text, stripping a `data:*;base64,` prefix.
    ///
    /// # Errors
    /// Returns `Error::InvalidImage` if nothing remains after stripping.
    pub fn new(value: &str) -> Result<Self> {
        let value = Self::strip_data_uri(value.trim()).trim();
        if value.is_empty() {
            return Err(Error::InvalidImage("empty image payload".to_string()));
        }
        Ok(ImagePayload(value.to_string()))
    }

    /// Encode raw image bytes (e.g. a JPEG read from disk).
    ///
    /// # Errors
    /// Returns `Error::InvalidImage` if `bytes` is empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidImage("empty image file".to_string()));
        }
        Ok(ImagePayload(STANDARD.encode(bytes)))
    }

    fn strip_data_uri(value: &str) -> &str {
        if !value.starts_with("data:") {
            return value;
        }
        match value.find(";base64,") {
            Some(idx) => &value[idx + ";base64,".len()..],
            None => value,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the base64 text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Images are large; only the size is useful in logs.
impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ImagePayload({} bytes)", self.0.len())
    }
}

impl TryFrom<String> for ImagePayload {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        ImagePayload::new(&value)
    }
}

impl From<ImagePayload> for String {
    fn from(value: ImagePayload) -> Self {
        value.0
    }
}

/// Postal address as reported by the validation service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country_code: String,
    pub country: String,
}

impl Address {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Address::default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts = [
            self.address_line1.as_str(),
            self.address_line2.as_str(),
            self.city.as_str(),
            self.state_province.as_str(),
            self.postal_code.as_str(),
            self.country_code.as_str(),
        ];
        let joined: Vec<&str> = parts.into_iter().filter(|p| !p.is_empty()).collect();
        write!(f, "{}", joined.join(", "))
    }
}

/// Carrier address record attached to a tracking number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageAddress {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub attention_name: String,
    pub address: Address,
}

/// Body of a label validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<TrackingNumber>,
    pub image: ImagePayload,
}

impl ValidationRequest {
    pub fn new(tracking_number: Option<TrackingNumber>, image: ImagePayload) -> Self {
        Self {
            tracking_number,
            image,
        }
    }
}

/// Outcome of a label validation. Immutable once received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub expected_address: PackageAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_address: Option<Address>,
}

/// Identifier of one capture-validation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(Uuid);

impl CycleId {
    pub fn new() -> Self {
        CycleId(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1Z12345E0205271688")]
    #[case("1ZABCDEFGHIJKLMNOP")]
    #[case("  1Z0000000000000000 ")]
    fn test_tracking_number_valid(#[case] input: &str) {
        let tn = TrackingNumber::new(input).unwrap();
        assert_eq!(tn.as_str(), input.trim());
    }

    #[rstest]
    #[case("")]
    #[case("1Z12345E020527168")] // too short
    #[case("1Z12345E02052716889")] // too long
    #[case("1z12345E0205271688")] // lowercase prefix
    #[case("1Z12345e0205271688")] // lowercase body
    #[case("2Z12345E0205271688")] // wrong prefix
    #[case("1Z12345E02052716-8")] // punctuation
    fn test_tracking_number_invalid(#[case] input: &str) {
        assert!(TrackingNumber::new(input).is_err());
    }

    #[test]
    fn test_tracking_number_serde_rejects_invalid() {
        let result: std::result::Result<TrackingNumber, _> = serde_json::from_str("\"nope\"");
        assert!(result.is_err());
    }

    #[rstest]
    #[case("abc123==", "abc123==")]
    #[case("data:image/jpeg;base64,abc123==", "abc123==")]
    #[case("data:image/jpeg;charset=utf-8;base64,/9j/4AAQ", "/9j/4AAQ")]
    #[case("  abc\n", "abc")]
    fn test_image_payload_strips_prefix(#[case] input: &str, #[case] expected: &str) {
        let image = ImagePayload::new(input).unwrap();
        assert_eq!(image.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("data:image/png;base64,")]
    fn test_image_payload_rejects_empty(#[case] input: &str) {
        assert!(matches!(
            ImagePayload::new(input),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn test_image_payload_from_bytes() {
        let image = ImagePayload::from_bytes(&[0xff, 0xd8, 0xff]).unwrap();
        assert_eq!(image.as_str(), "/9j/");
        assert!(ImagePayload::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_image_payload_debug_hides_content() {
        let image = ImagePayload::new("QUJDRA==").unwrap();
        assert_eq!(format!("{image:?}"), "ImagePayload(8 bytes)");
    }

    #[test]
    fn test_validation_request_omits_missing_tracking_number() {
        let request = ValidationRequest::new(None, ImagePayload::new("QUJD").unwrap());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "image": "QUJD" }));

        let tn = TrackingNumber::new("1Z12345E0205271688").unwrap();
        let request = ValidationRequest::new(Some(tn), ImagePayload::new("QUJD").unwrap());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "trackingNumber": "1Z12345E0205271688", "image": "QUJD" })
        );
    }

    #[test]
    fn test_validation_result_defaults() {
        let result: ValidationResult = serde_json::from_str("{}").unwrap();
        assert!(!result.valid);
        assert!(result.expected_address.address.is_empty());
        assert!(result.scanned_address.is_none());

        let result: ValidationResult = serde_json::from_str(
            r#"{"valid":true,"expectedAddress":{"type":"DESTINATION","address":{"city":"Reno"}},
                "scannedAddress":{"addressLine1":"1 Main St","city":"Reno"}}"#,
        )
        .unwrap();
        assert!(result.valid);
        assert_eq!(result.expected_address.kind, "DESTINATION");
        assert_eq!(result.expected_address.address.city, "Reno");
        assert_eq!(
            result.scanned_address.unwrap().to_string(),
            "1 Main St, Reno"
        );
    }

    #[rstest]
    #[case("1", 1)]
    #[case(" 42 ", 42)]
    fn test_scanner_id_parse(#[case] input: &str, #[case] expected: u32) {
        let id: ScannerId = input.parse().unwrap();
        assert_eq!(id.as_u32(), expected);
    }

    #[test]
    fn test_scanner_id_parse_invalid() {
        assert!("abc".parse::<ScannerId>().is_err());
        assert!("-1".parse::<ScannerId>().is_err());
    }

    #[test]
    fn test_cycle_ids_are_unique() {
        assert_ne!(CycleId::new(), CycleId::new());
    }
}
