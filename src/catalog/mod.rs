// Module catalog - statically registered descriptor table
//
// The editing core never inspects module implementations directly. Everything it
// needs to know about a module type (its parameters, its child slots and where it
// is allowed to live in a tree) comes from a ModuleDescriptor looked up by type.

pub mod parser;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use parser::{DefaultValueParser, ValueParser, ValueType};

/// Identifier of a concrete module type (e.g. `TMG.GTAModel.ModeChoice`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleType(String);

impl ModuleType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last dotted segment of the type name
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Generate a human readable module name from the type name
    ///
    /// `ModeChoiceModel` becomes `Mode Choice Model`. Runs of capitals are kept
    /// together so `ODCache` stays `ODCache`.
    pub fn display_name(&self) -> String {
        let short = self.short_name();
        let mut name = String::with_capacity(short.len() + 4);
        let mut last_capital = true;
        for c in short.chars() {
            if c.is_uppercase() && !last_capital {
                name.push(' ');
                last_capital = true;
            } else {
                last_capital = c.is_uppercase();
            }
            name.push(c);
        }
        name
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interface a module type can satisfy; slots and parent/root requirements are
/// expressed against these
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeConstraint(String);

impl TypeConstraint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shape of a child slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// Holds exactly one module
    Single,
    /// Holds a reorderable list of modules sharing one element constraint
    Collection,
}

/// A named child slot declared by a module type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub name: String,
    pub description: String,
    /// For collections this is the element constraint
    pub constraint: TypeConstraint,
    pub kind: SlotKind,
    pub required: bool,
}

impl SlotDescriptor {
    pub fn single(name: impl Into<String>, constraint: TypeConstraint) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            constraint,
            kind: SlotKind::Single,
            required: true,
        }
    }

    pub fn collection(name: impl Into<String>, element: TypeConstraint) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            constraint: element,
            kind: SlotKind::Collection,
            required: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A parameter declared by a module type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub description: String,
    pub value_type: ValueType,
    pub default_value: String,
    pub system: bool,
    pub hidden: bool,
    pub quick: bool,
}

impl ParameterDescriptor {
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        default_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            value_type,
            default_value: default_value.into(),
            system: false,
            hidden: false,
            quick: false,
        }
    }

    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn quick(mut self) -> Self {
        self.quick = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Everything the editor knows about one module type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub module_type: ModuleType,
    /// Interfaces this type satisfies
    pub implements: Vec<TypeConstraint>,
    pub parameters: Vec<ParameterDescriptor>,
    pub slots: Vec<SlotDescriptor>,
    /// The nearest typed ancestor must satisfy this interface
    pub required_parent: Option<TypeConstraint>,
    /// Some ancestor (or the module itself when placed at the root) must satisfy this interface
    pub required_root: Option<TypeConstraint>,
}

impl ModuleDescriptor {
    pub fn new(module_type: impl Into<String>) -> Self {
        Self {
            module_type: ModuleType::new(module_type),
            implements: Vec::new(),
            parameters: Vec::new(),
            slots: Vec::new(),
            required_parent: None,
            required_root: None,
        }
    }

    pub fn implements(mut self, constraint: impl Into<String>) -> Self {
        self.implements.push(TypeConstraint::new(constraint));
        self
    }

    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn slot(mut self, slot: SlotDescriptor) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn requires_parent(mut self, constraint: impl Into<String>) -> Self {
        self.required_parent = Some(TypeConstraint::new(constraint));
        self
    }

    pub fn requires_root(mut self, constraint: impl Into<String>) -> Self {
        self.required_root = Some(TypeConstraint::new(constraint));
        self
    }

    /// Whether this type satisfies the given constraint
    ///
    /// A type always satisfies a constraint spelled exactly like its own name.
    pub fn satisfies(&self, constraint: &TypeConstraint) -> bool {
        constraint.as_str() == self.module_type.as_str()
            || self.implements.iter().any(|c| c == constraint)
    }
}

/// Lookup interface the editing core depends on
pub trait ModuleCatalog: Send + Sync {
    /// Descriptor for a module type, if the type is known
    fn descriptor(&self, module_type: &ModuleType) -> Option<&ModuleDescriptor>;

    /// Every registered module type, in a stable order
    fn module_types(&self) -> Vec<ModuleType>;

    /// Whether `module_type` satisfies `constraint`; unknown types satisfy nothing
    fn satisfies(&self, module_type: &ModuleType, constraint: &TypeConstraint) -> bool {
        self.descriptor(module_type)
            .map(|d| d.satisfies(constraint))
            .unwrap_or(false)
    }
}

/// Descriptor table populated once at startup
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    descriptors: BTreeMap<ModuleType, ModuleDescriptor>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one for the same type
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> &mut Self {
        self.descriptors
            .insert(descriptor.module_type.clone(), descriptor);
        self
    }

    pub fn with(mut self, descriptor: ModuleDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl ModuleCatalog for StaticCatalog {
    fn descriptor(&self, module_type: &ModuleType) -> Option<&ModuleDescriptor> {
        self.descriptors.get(module_type)
    }

    fn module_types(&self) -> Vec<ModuleType> {
        self.descriptors.keys().cloned().collect()
    }
}
