//! Cloud-init document model
//!
//! Each document variant carries its typed schema plus a raw bag holding
//! every field present in the source text, including fields the schema does
//! not model. The typed fields are a read-side projection of the bag; on
//! serialization they are overlaid back onto it, so unknown fields survive
//! a parse/mutate/serialize cycle untouched.

mod meta_data;
mod network;
mod user_data;

pub use meta_data::MetaData;
pub use network::{
    Ethernet, Ipv4Cidr, Match, Nameservers, NetworkConfig, NetworkError, NetworkParams,
};
pub use user_data::{User, UserData};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::merge::deep_merge;

/// Errors for document (un)marshaling
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected a mapping at the document root")]
    NotAMapping,
}

/// A cloud-init document: typed schema plus raw unknown-field bag.
///
/// Implementors provide access to the bag; marshaling, unmarshaling and
/// merging are derived from the canonical-map representation.
pub trait Document: Serialize + DeserializeOwned + Clone {
    /// Well-known file name under which this document is stored
    const FILE_NAME: &'static str;

    /// Marker line prepended to the serialized output, if any
    const HEADER: Option<&'static str> = None;

    /// The raw unknown-field bag
    fn raw(&self) -> &Mapping;

    /// Replace the raw unknown-field bag
    fn set_raw(&mut self, raw: Mapping);

    /// Parse a document from YAML text.
    ///
    /// The full input lands in the raw bag and the typed fields are decoded
    /// from the same input. Missing optional fields are never an error;
    /// empty input yields an empty document.
    fn unmarshal(data: &[u8]) -> Result<Self, ParseError> {
        let value: Value = serde_yaml::from_slice(data)?;
        let raw = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(m) => m,
            _ => return Err(ParseError::NotAMapping),
        };
        Self::from_mapping(raw)
    }

    /// Rebuild the document from a canonical map
    fn from_mapping(raw: Mapping) -> Result<Self, ParseError> {
        let mut doc: Self = serde_yaml::from_value(Value::Mapping(raw.clone()))?;
        doc.set_raw(raw);
        Ok(doc)
    }

    /// Canonical map representation: typed fields overlaid on the raw bag.
    ///
    /// Typed fields shadow same-keyed bag entries; bag entries the schema
    /// does not model are passed through verbatim.
    fn to_mapping(&self) -> Result<Mapping, ParseError> {
        let typed = serde_yaml::to_value(self)?;
        match deep_merge(Value::Mapping(self.raw().clone()), typed) {
            Value::Mapping(m) => Ok(m),
            _ => Err(ParseError::NotAMapping),
        }
    }

    /// Serialize the document to YAML text, header line first if the
    /// variant defines one
    fn marshal(&self) -> Result<Vec<u8>, ParseError> {
        let body = serde_yaml::to_string(&Value::Mapping(self.to_mapping()?))?;
        let mut out = Vec::with_capacity(body.len() + 16);
        if let Some(header) = Self::HEADER {
            out.extend_from_slice(header.as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(body.as_bytes());
        Ok(out)
    }

    /// Merge `overlay` into this document with override semantics.
    ///
    /// Both sides are rendered to their canonical maps, deep-merged, and
    /// the result is re-parsed into a fresh document that replaces `self`
    /// only after the whole merge succeeded.
    fn merge(&mut self, overlay: &Self) -> Result<(), ParseError> {
        let merged = deep_merge(
            Value::Mapping(self.to_mapping()?),
            Value::Mapping(overlay.to_mapping()?),
        );
        match merged {
            Value::Mapping(m) => {
                *self = Self::from_mapping(m)?;
                Ok(())
            }
            _ => Err(ParseError::NotAMapping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmarshal_empty_input() {
        let md = MetaData::unmarshal(b"").unwrap();
        assert!(md.hostname.is_none());
        assert!(md.raw().is_empty());
    }

    #[test]
    fn test_unmarshal_scalar_root_fails() {
        let err = MetaData::unmarshal(b"just a string").unwrap_err();
        assert!(matches!(err, ParseError::NotAMapping));
    }

    #[test]
    fn test_unmarshal_invalid_yaml_fails() {
        assert!(MetaData::unmarshal(b"a: [unclosed").is_err());
    }

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let input = b"local-hostname: web-1\nextra:\n  nested: [1, 2]\n";
        let md = MetaData::unmarshal(input).unwrap();
        let out = md.marshal().unwrap();
        let md2 = MetaData::unmarshal(&out).unwrap();

        assert_eq!(md.to_mapping().unwrap(), md2.to_mapping().unwrap());
        assert_eq!(md2.hostname.as_deref(), Some("web-1"));
    }

    #[test]
    fn test_typed_fields_shadow_bag_on_marshal() {
        let mut md = MetaData::unmarshal(b"local-hostname: old\n").unwrap();
        md.hostname = Some("new".to_string());

        let out = String::from_utf8(md.marshal().unwrap()).unwrap();
        assert!(out.contains("local-hostname: new"));
        assert!(!out.contains("old"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut md = MetaData::unmarshal(b"local-hostname: a\nextra: 1\n").unwrap();
        let before = md.to_mapping().unwrap();
        let copy = md.clone();
        md.merge(&copy).unwrap();
        assert_eq!(md.to_mapping().unwrap(), before);
    }
}
