// Types for model system persistence and copy/paste

use serde::{Deserialize, Serialize};

use crate::catalog::ModuleType;
use crate::model::tree::SlotShape;

/// Document format version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentVersion {
    pub major: u32,
    pub minor: u32,
}

impl DocumentVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn current() -> Self {
        Self::new(1, 0)
    }
}

impl std::fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Document metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Version of the document format
    pub version: DocumentVersion,
    /// Last save timestamp (RFC 3339); unset for in-memory snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            version: DocumentVersion::current(),
            modified: None,
        }
    }
}

/// Serializable parameter value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterSerializable {
    /// Name declared by the module type
    pub name: String,
    /// User facing name, when renamed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub value: String,
    #[serde(default)]
    pub quick: bool,
    #[serde(default)]
    pub hidden: bool,
}

/// Serializable snapshot of a module and its attached subtree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleSerializable {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<ModuleType>,
    /// The slot this module occupied when the snapshot was taken
    pub slot: SlotShape,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub meta_module: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterSerializable>,
    #[serde(default)]
    pub children: Vec<ModuleSerializable>,
}

impl ModuleSerializable {
    pub fn is_collection(&self) -> bool {
        self.slot.is_collection()
    }
}

/// Location of a parameter relative to some root module
///
/// `nodes` are child indexes walked from the root; `parameter` is the
/// declared parameter name on the module reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ParameterPath {
    pub nodes: Vec<usize>,
    pub parameter: String,
}

/// Serializable linked parameter group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedParameterSerializable {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub members: Vec<ParameterPath>,
}

/// Complete model system snapshot handed to a store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSystemDocument {
    #[serde(default)]
    pub metadata: DocumentMetadata,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub root: ModuleSerializable,
    #[serde(default)]
    pub linked_parameters: Vec<LinkedParameterSerializable>,
}

impl ModelSystemDocument {
    /// Number of modules in the document, counting the root
    pub fn module_count(&self) -> usize {
        fn count(module: &ModuleSerializable) -> usize {
            1 + module.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}
