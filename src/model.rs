//! The intermediate model handed from the resolver and extractor to the emitter.
//!
//! Class and enum nodes live in a [`ClassRegistry`] arena keyed by normalized name.
//! Every reference to a class from a [`TypeNode`] is a [`ClassId`] into that arena,
//! so self-referential graphs never own themselves and `set_writable` mutates a single
//! slot no matter how many nodes point at it.

use crate::error::{Error, Result};
use crate::metadata::Annotation;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Tag describing the shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeIdentifier {
    Object,
    Enum,
    String,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    DateTime,
    Guid,
    TimeSpan,
    Byte,
    Any,
    Union,
    GenericParameter,
}

/// A structural wrapper applied before reaching the base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeModifier {
    Array,
    Dictionary,
}

/// Stable index of a class in the [`ClassRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub usize);

/// Shape of a value.
///
/// `modifiers` are ordered outermost first: a dictionary of lists of int is
/// `[Dictionary, Array]` over `Int`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub identifier: TypeIdentifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassId>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub modifiers: Vec<TypeModifier>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_arguments: Option<Vec<TypeNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union: Option<Vec<TypeNode>>,
}

impl TypeNode {
    pub fn new(identifier: TypeIdentifier) -> Self {
        Self {
            identifier,
            class: None,
            modifiers: Vec::new(),
            nullable: false,
            optional: false,
            generic_arguments: None,
            generic_name: None,
            union: None,
        }
    }

    pub fn any() -> Self {
        Self::new(TypeIdentifier::Any)
    }

    pub fn is_collection(&self) -> bool {
        self.modifiers.first() == Some(&TypeModifier::Array)
    }

    pub fn is_dictionary(&self) -> bool {
        self.modifiers.first() == Some(&TypeModifier::Dictionary)
    }

    /// Whether the value is a bare object, without any modifier.
    pub fn is_plain_object(&self) -> bool {
        self.identifier == TypeIdentifier::Object && self.modifiers.is_empty()
    }

    /// The referenced class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingClassReference`] when the node is tagged Object or Enum
    /// but carries no class. Any other tag yields `Ok(None)`.
    pub fn class_id(&self) -> Result<Option<ClassId>> {
        match (self.identifier, self.class) {
            (TypeIdentifier::Object | TypeIdentifier::Enum, None) => {
                Err(Error::MissingClassReference {
                    type_name: format!("{:?}", self.identifier),
                })
            }
            (_, class) => Ok(class),
        }
    }
}

/// Value format hint used for validation emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    None,
    Email,
}

/// Validation hints carried by parameters and properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare: Option<String>,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub required: bool,
}

impl Constraints {
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut constraints = Self::default();
        for annotation in annotations {
            match annotation {
                Annotation::Required => constraints.required = true,
                Annotation::StringLength { maximum, minimum } => {
                    constraints.max_length = Some(*maximum);
                    if minimum.is_some() {
                        constraints.min_length = *minimum;
                    }
                }
                Annotation::MinLength { length } => constraints.min_length = Some(*length),
                Annotation::MaxLength { length } => constraints.max_length = Some(*length),
                Annotation::Range { minimum, maximum } => {
                    constraints.minimum = Some(*minimum);
                    constraints.maximum = Some(*maximum);
                }
                Annotation::Compare { other_property } => {
                    constraints.compare = Some(crate::naming::to_camel_case(other_property))
                }
                Annotation::EmailAddress => constraints.format = Format::Email,
                _ => {}
            }
        }
        constraints
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One class member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyNode {
    /// Lower-camel name
    pub name: String,
    pub type_node: TypeNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub is_read_only: bool,
    #[serde(skip_serializing_if = "Constraints::is_empty", default)]
    pub constraints: Constraints,
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueNode {
    pub name: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Members of a class: properties for objects, values for enums. Never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassBody {
    Object(Vec<PropertyNode>),
    Enum(Vec<EnumValueNode>),
}

/// Canonical node for one named object or enum type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNode {
    /// Normalized name
    pub name: String,
    /// Full name of the source type that registered the node
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub body: ClassBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_parameters: Option<Vec<String>>,
    pub is_read_only: bool,
    pub is_observable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ClassNode {
    /// A read-only object placeholder without properties.
    pub fn object(name: String, source_name: String) -> Self {
        Self {
            name,
            source_name,
            documentation: None,
            body: ClassBody::Object(Vec::new()),
            generic_parameters: None,
            is_read_only: true,
            is_observable: false,
            version: None,
        }
    }

    pub fn enumeration(name: String, source_name: String, values: Vec<EnumValueNode>) -> Self {
        Self {
            body: ClassBody::Enum(values),
            ..Self::object(name, source_name)
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.body, ClassBody::Enum(_))
    }

    pub fn properties(&self) -> &[PropertyNode] {
        match &self.body {
            ClassBody::Object(properties) => properties,
            ClassBody::Enum(_) => &[],
        }
    }

    pub fn values(&self) -> &[EnumValueNode] {
        match &self.body {
            ClassBody::Enum(values) => values,
            ClassBody::Object(_) => &[],
        }
    }
}

/// Arena of class nodes keyed by normalized name, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassNode>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.classes.get_index_of(name).map(ClassId)
    }

    /// Registers a node under its name. An existing node keeps its slot and is replaced.
    pub fn register(&mut self, node: ClassNode) -> ClassId {
        let (index, _) = self.classes.insert_full(node.name.clone(), node);
        ClassId(index)
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassNode> {
        self.classes.get_index(id.0).map(|(_, node)| node)
    }

    pub fn by_name(&self, name: &str) -> Option<&ClassNode> {
        self.classes.get(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassNode)> {
        self.classes.values().enumerate().map(|(i, node)| (ClassId(i), node))
    }

    /// Flips a class to writable and cascades into the classes of its object-typed
    /// properties. Already-writable classes are left alone, which stops cycles.
    pub fn set_writable(&mut self, id: ClassId) {
        let Some((_, node)) = self.classes.get_index_mut(id.0) else {
            return;
        };
        if !node.is_read_only {
            return;
        }
        node.is_read_only = false;
        debug!("Marked class {} as writable", node.name);

        let nested: Vec<ClassId> = node
            .properties()
            .iter()
            .filter(|p| p.type_node.identifier == TypeIdentifier::Object)
            .filter_map(|p| p.type_node.class)
            .collect();
        for class in nested {
            self.set_writable(class);
        }
    }
}

impl Index<ClassId> for ClassRegistry {
    type Output = ClassNode;

    fn index(&self, id: ClassId) -> &ClassNode {
        &self.classes[id.0]
    }
}

impl IndexMut<ClassId> for ClassRegistry {
    fn index_mut(&mut self, id: ClassId) -> &mut ClassNode {
        &mut self.classes[id.0]
    }
}

/// HTTP verb of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Unknown,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Unknown => "UNKNOWN",
        }
    }
}

/// How a parameter receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterPosition {
    Path,
    Query,
    Body,
}

/// Authorization requirement of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Authorization {
    Policy(String),
    Roles(String),
    /// Any authenticated user
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterNode {
    pub name: String,
    pub type_node: TypeNode,
    pub is_required: bool,
    pub position: ParameterPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Constraints::is_empty", default)]
    pub constraints: Constraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnNode {
    pub type_node: TypeNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// One HTTP-exposed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    /// Original method name
    pub name: String,
    pub verb: HttpVerb,
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Authorization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub parameters: Vec<ParameterNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_node: Option<ReturnNode>,
    /// Name of the owning controller
    pub controller: String,
}

/// One controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionsGroupNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub actions: Vec<ActionNode>,
}

impl ActionsGroupNode {
    pub fn new(name: String) -> Self {
        Self {
            name,
            documentation: None,
            actions: Vec::new(),
        }
    }

    /// Actions ordered by name then parameter count, paired with a client-side name.
    /// Names shared by several actions get a 1-based positional suffix.
    pub fn unique_action_names(&self) -> Vec<(String, &ActionNode)> {
        let mut ordered: Vec<&ActionNode> = self.actions.iter().collect();
        ordered.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.parameters.len().cmp(&b.parameters.len()))
        });

        let mut named = Vec::with_capacity(ordered.len());
        let mut index = 0;
        for (i, action) in ordered.iter().enumerate() {
            let shared = ordered.iter().filter(|a| a.name == action.name).count() > 1;
            if i > 0 && ordered[i - 1].name == action.name {
                index += 1;
            } else {
                index = 1;
            }
            let name = if shared {
                format!("{}{}", action.name, index)
            } else {
                action.name.clone()
            };
            named.push((name, *action));
        }
        named
    }
}

/// Two source types that normalized to the same class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCollision {
    pub name: String,
    pub first: String,
    pub second: String,
}

/// Root of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyNode {
    pub controllers: Vec<ActionsGroupNode>,
    pub types: ClassRegistry,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub name_collisions: Vec<NameCollision>,
}

impl AssemblyNode {
    /// Checks that every Object/Enum node in the graph references a registered class.
    pub fn validate(&self) -> Result<()> {
        fn check(node: &TypeNode, registry: &ClassRegistry) -> Result<()> {
            if let Some(id) = node.class_id()? {
                if registry.get(id).is_none() {
                    return Err(Error::MissingClassReference {
                        type_name: format!("#{}", id.0),
                    });
                }
            }
            for child in node
                .generic_arguments
                .iter()
                .flatten()
                .chain(node.union.iter().flatten())
            {
                check(child, registry)?;
            }
            Ok(())
        }

        for controller in &self.controllers {
            for action in &controller.actions {
                for parameter in &action.parameters {
                    check(&parameter.type_node, &self.types)?;
                }
                if let Some(returned) = &action.return_node {
                    check(&returned.type_node, &self.types)?;
                }
            }
        }
        for (_, class) in self.types.iter() {
            for property in class.properties() {
                check(&property.type_node, &self.types)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_property(name: &str, class: ClassId) -> PropertyNode {
        let mut type_node = TypeNode::new(TypeIdentifier::Object);
        type_node.class = Some(class);
        PropertyNode {
            name: name.to_string(),
            type_node,
            documentation: None,
            is_read_only: false,
            constraints: Constraints::default(),
        }
    }

    fn action(name: &str, parameters: usize) -> ActionNode {
        ActionNode {
            name: name.to_string(),
            verb: HttpVerb::Get,
            route: "test".to_string(),
            version: None,
            authorization: None,
            documentation: None,
            parameters: (0..parameters)
                .map(|i| ParameterNode {
                    name: format!("p{}", i),
                    type_node: TypeNode::new(TypeIdentifier::Int),
                    is_required: true,
                    position: ParameterPosition::Query,
                    documentation: None,
                    constraints: Constraints::default(),
                })
                .collect(),
            return_node: None,
            controller: "Test".to_string(),
        }
    }

    #[test]
    fn test_set_writable_cascades_through_cycles() {
        let mut registry = ClassRegistry::new();
        let a = registry.register(ClassNode::object("A".into(), "App.A".into()));
        let b = registry.register(ClassNode::object("B".into(), "App.B".into()));
        let unrelated = registry.register(ClassNode::object("C".into(), "App.C".into()));
        registry[a].body = ClassBody::Object(vec![object_property("b", b)]);
        registry[b].body = ClassBody::Object(vec![object_property("a", a)]);

        registry.set_writable(a);

        assert!(!registry[a].is_read_only);
        assert!(!registry[b].is_read_only);
        assert!(registry[unrelated].is_read_only);
    }

    #[test]
    fn test_register_keeps_slot_for_same_name() {
        let mut registry = ClassRegistry::new();
        let first = registry.register(ClassNode::object("A".into(), "App.A".into()));
        let second = registry.register(ClassNode::object("A".into(), "App.A".into()));
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_class_id_reports_missing_reference() {
        let node = TypeNode::new(TypeIdentifier::Object);
        assert!(matches!(node.class_id(), Err(Error::MissingClassReference { .. })));
        assert_eq!(TypeNode::new(TypeIdentifier::Int).class_id().unwrap(), None);
    }

    #[test]
    fn test_unique_action_names_disambiguates_overloads() {
        let mut group = ActionsGroupNode::new("Test".to_string());
        group.actions = vec![action("Get", 1), action("Post", 1), action("Get", 0)];

        let names: Vec<(String, usize)> = group
            .unique_action_names()
            .into_iter()
            .map(|(name, action)| (name, action.parameters.len()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Get1".to_string(), 0),
                ("Get2".to_string(), 1),
                ("Post".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_constraints_from_annotations() {
        let constraints = Constraints::from_annotations(&[
            Annotation::Required,
            Annotation::StringLength {
                maximum: 20,
                minimum: Some(2),
            },
            Annotation::EmailAddress,
            Annotation::Compare {
                other_property: "Password".to_string(),
            },
        ]);
        assert!(constraints.required);
        assert_eq!(constraints.min_length, Some(2));
        assert_eq!(constraints.max_length, Some(20));
        assert_eq!(constraints.format, Format::Email);
        assert_eq!(constraints.compare.as_deref(), Some("password"));
    }

    #[test]
    fn test_validate_detects_dangling_class() {
        let mut assembly = AssemblyNode::default();
        let mut group = ActionsGroupNode::new("Test".to_string());
        let mut broken = action("Get", 0);
        broken.return_node = Some(ReturnNode {
            type_node: TypeNode::new(TypeIdentifier::Enum),
            documentation: None,
        });
        group.actions.push(broken);
        assembly.controllers.push(group);
        assert!(assembly.validate().is_err());
    }
}
