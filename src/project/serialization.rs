// Serialization utilities for model system persistence

use crate::project::store::PersistenceError;
use crate::project::types::{DocumentVersion, ModelSystemDocument};
use ron::ser::PrettyConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serialize a document to pretty printed RON
pub fn serialize_to_ron(document: &ModelSystemDocument) -> Result<String, PersistenceError> {
    let pretty = PrettyConfig::new().depth_limit(64).indentor("  ".to_string());
    ron::ser::to_string_pretty(document, pretty).map_err(|e| {
        PersistenceError::Serialization(format!("Failed to serialize to RON: {}", e))
    })
}

/// Deserialize a document from RON, rejecting newer major versions
pub fn deserialize_from_ron(ron_data: &str) -> Result<ModelSystemDocument, PersistenceError> {
    let document: ModelSystemDocument = ron::from_str(ron_data).map_err(|e| {
        PersistenceError::Serialization(format!("Failed to deserialize from RON: {}", e))
    })?;
    check_version(&document.metadata.version)?;
    Ok(document)
}

/// Serialize any value to JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value).map_err(|e| {
        PersistenceError::Serialization(format!("Failed to serialize to JSON: {}", e))
    })
}

/// Deserialize any value from JSON
pub fn from_json<T: DeserializeOwned>(json_data: &str) -> Result<T, PersistenceError> {
    serde_json::from_str(json_data).map_err(|e| {
        PersistenceError::Serialization(format!("Failed to deserialize from JSON: {}", e))
    })
}

fn check_version(version: &DocumentVersion) -> Result<(), PersistenceError> {
    if version.major > DocumentVersion::current().major {
        return Err(PersistenceError::UnsupportedVersion(version.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::configured_model;

    #[test]
    fn test_ron_round_trip() {
        let document = configured_model().document();
        let text = serialize_to_ron(&document).unwrap();
        assert!(text.contains("Travel.Demand"));
        assert_eq!(deserialize_from_ron(&text).unwrap(), document);
    }

    #[test]
    fn test_newer_major_version_rejected() {
        let mut document = configured_model().document();
        document.metadata.version = DocumentVersion::new(2, 0);
        let text = serialize_to_ron(&document).unwrap();
        assert!(matches!(
            deserialize_from_ron(&text),
            Err(PersistenceError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_garbage_is_a_serialization_error() {
        assert!(matches!(
            deserialize_from_ron("not a document"),
            Err(PersistenceError::Serialization(_))
        ));
        assert!(from_json::<ModelSystemDocument>("{").is_err());
    }
}
