//! XML codec boundary.
//!
//! Every entity the service exchanges is a serde type. `XmlCodec` gives them
//! a uniform `to_xml` / `from_xml` pair whose failures are mapped onto
//! `LoadTestError::Encoding` and `LoadTestError::Decoding`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LoadTestError, Result};

pub trait XmlCodec: Sized {
    /// Serialize into a request body.
    fn to_xml(&self) -> Result<String>;

    /// Parse a response body.
    fn from_xml(xml: &str) -> Result<Self>;

    /// Parse a raw response body. Bytes that are not UTF-8 are a decoding
    /// failure, same as malformed XML.
    fn from_xml_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes).map_err(|e| LoadTestError::Decoding {
            entity: entity_name::<Self>(),
            message: e.to_string(),
        })?;
        Self::from_xml(xml)
    }
}

impl<T> XmlCodec for T
where
    T: Serialize + DeserializeOwned,
{
    fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self).map_err(|e| LoadTestError::Encoding {
            entity: entity_name::<T>(),
            message: e.to_string(),
        })
    }

    fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).map_err(|e| LoadTestError::Decoding {
            entity: entity_name::<T>(),
            message: e.to_string(),
        })
    }
}

/// Short type name (`RunResponse` rather than `loadtest_core::types::RunResponse`).
fn entity_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
