use crate::adapter::ApiAdapter;
use crate::documentation::Documentation;
use crate::metadata::{
    Annotation, PropertyDescriptor, TypeCatalog, TypeDefinition, TypeRef, DICTIONARY_CONTRACTS,
    NULLABLE_TYPE, OPTIONAL_WRAPPER, SEQUENCE_CONTRACTS,
};
use crate::model::{
    ClassBody, ClassId, ClassNode, ClassRegistry, Constraints, EnumValueNode, NameCollision,
    PropertyNode, TypeIdentifier, TypeModifier, TypeNode,
};
use crate::naming::{normalize_class_name, simple_name, to_camel_case};
use log::{debug, warn};

/// Type resolver - turns type expressions into deduplicated type nodes
///
/// Every named object or enum type is registered once in a [`ClassRegistry`], keyed by
/// its normalized name. A class is registered before its properties are resolved so
/// that self-referencing graphs terminate.
pub struct TypeResolver<'a> {
    catalog: &'a TypeCatalog,
    adapter: &'a dyn ApiAdapter,
    documentation: &'a Documentation,
    /// Classes and enums seen so far in this run
    registry: ClassRegistry,
    /// Distinct source types that normalized to an already registered name
    name_collisions: Vec<NameCollision>,
}

impl<'a> TypeResolver<'a> {
    /// Create a new TypeResolver over a catalog
    pub fn new(
        catalog: &'a TypeCatalog,
        adapter: &'a dyn ApiAdapter,
        documentation: &'a Documentation,
    ) -> Self {
        debug!(
            "Initializing TypeResolver with {} type definitions ({} convention)",
            catalog.len(),
            adapter.name()
        );
        Self {
            catalog,
            adapter,
            documentation,
            registry: ClassRegistry::new(),
            name_collisions: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn name_collisions(&self) -> &[NameCollision] {
        &self.name_collisions
    }

    /// Consumes the resolver, returning the registry and the recorded collisions
    pub fn into_parts(self) -> (ClassRegistry, Vec<NameCollision>) {
        (self.registry, self.name_collisions)
    }

    /// Resolve a type expression
    ///
    /// # Arguments
    ///
    /// * `ty` - The type to resolve
    /// * `parents` - Full names of the classes whose properties are being resolved
    ///   above this call
    /// * `version` - API version recorded on newly registered classes
    pub fn resolve(&mut self, ty: &TypeRef, parents: &[String], version: Option<&str>) -> TypeNode {
        self.resolve_member(ty, false, parents, version)
    }

    /// Resolve a parameter or property type, folding in its nullability metadata
    pub fn resolve_member(
        &mut self,
        ty: &TypeRef,
        nullable: bool,
        parents: &[String],
        version: Option<&str>,
    ) -> TypeNode {
        let mut node = TypeNode::any();
        node.nullable = nullable;

        let mut current = ty;
        if let Some(inner) = nullable_inner(current) {
            node.nullable = true;
            current = inner;
        }

        // Peel one modifier per layer; dictionaries win over sequences
        loop {
            match current {
                TypeRef::Array(element) => {
                    node.modifiers.push(TypeModifier::Array);
                    current = element;
                }
                TypeRef::Named { name, args } if !args.is_empty() => {
                    if args.len() >= 2 && self.catalog.implements(name, DICTIONARY_CONTRACTS) {
                        node.modifiers.push(TypeModifier::Dictionary);
                        current = &args[1];
                    } else if self.catalog.implements(name, SEQUENCE_CONTRACTS) {
                        node.modifiers.push(TypeModifier::Array);
                        // Inherited contracts carry no argument mapping; assume the first
                        let position = self
                            .catalog
                            .contract_argument(name, SEQUENCE_CONTRACTS)
                            .unwrap_or(0);
                        current = args.get(position).unwrap_or(&args[0]);
                    } else if simple_name(name) == OPTIONAL_WRAPPER {
                        node.optional = true;
                        current = &args[0];
                    } else if name == NULLABLE_TYPE {
                        if node.modifiers.is_empty() {
                            node.nullable = true;
                        }
                        current = &args[0];
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }

        match current {
            TypeRef::Void | TypeRef::Array(_) => node.identifier = TypeIdentifier::Any,
            TypeRef::GenericParameter(name) => {
                node.identifier = TypeIdentifier::GenericParameter;
                node.generic_name = Some(name.clone());
            }
            TypeRef::Named { name, args } => {
                if let Some(primitive) = primitive_identifier(name) {
                    node.identifier = primitive;
                } else {
                    let catalog = self.catalog;
                    match catalog.get(name) {
                        Some(definition) if definition.is_enum() => {
                            node.identifier = TypeIdentifier::Enum;
                            node.class = Some(self.resolve_enum(definition));
                        }
                        Some(definition) => {
                            // Only object types carry generic arguments
                            if !args.is_empty() {
                                let arguments = args
                                    .iter()
                                    .map(|arg| self.resolve(arg, parents, version))
                                    .collect();
                                node.generic_arguments = Some(arguments);
                            }
                            node.identifier = TypeIdentifier::Object;
                            node.class = Some(self.resolve_class(definition, parents, version));
                        }
                        None => {
                            warn!("Type {} is not described by any manifest, using any", name);
                            node.identifier = TypeIdentifier::Any;
                        }
                    }
                }
            }
        }

        node
    }

    /// Marks the class behind a type node writable, cascading into nested objects
    pub fn set_writable(&mut self, node: &TypeNode) {
        if node.identifier == TypeIdentifier::Object {
            if let Some(class) = node.class {
                self.registry.set_writable(class);
            }
        }
        for argument in node.generic_arguments.iter().flatten() {
            self.set_writable(argument);
        }
    }

    /// Returns the registered node for a normalized name, recording a collision when a
    /// different source type got there first
    fn existing(&mut self, name: &str, source_name: &str) -> Option<ClassId> {
        let id = self.registry.id_of(name)?;
        let first = &self.registry[id].source_name;
        if first != source_name {
            let collision = NameCollision {
                name: name.to_string(),
                first: first.clone(),
                second: source_name.to_string(),
            };
            if !self.name_collisions.contains(&collision) {
                warn!(
                    "Types {} and {} both normalize to {}; using {}",
                    collision.first, collision.second, collision.name, collision.first
                );
                self.name_collisions.push(collision);
            }
        }
        Some(id)
    }

    fn resolve_enum(&mut self, definition: &TypeDefinition) -> ClassId {
        let name = normalize_class_name(&definition.name);
        if let Some(id) = self.existing(&name, &definition.name) {
            return id;
        }

        debug!("Registering enum {} as {}", definition.name, name);
        let values = definition
            .values
            .iter()
            .map(|value| EnumValueNode {
                name: value.name.clone(),
                value: value.value,
                documentation: self.documentation.enum_value_summary(&definition.name, &value.name),
            })
            .collect();
        let mut node = ClassNode::enumeration(name, definition.name.clone(), values);
        node.documentation = self.documentation.type_summary(&definition.name);
        self.registry.register(node)
    }

    fn resolve_class(
        &mut self,
        definition: &'a TypeDefinition,
        parents: &[String],
        version: Option<&str>,
    ) -> ClassId {
        let name = normalize_class_name(&definition.name);
        if let Some(id) = self.existing(&name, &definition.name) {
            return id;
        }

        debug!("Registering class {} as {}", definition.name, name);
        let mut node = ClassNode::object(name, definition.name.clone());
        node.documentation = self.documentation.type_summary(&definition.name);
        node.is_observable = self.adapter.is_observable(definition);
        node.version = version.map(str::to_string);
        if !definition.generic_parameters.is_empty() {
            node.generic_parameters = Some(definition.generic_parameters.clone());
        }
        let id = self.registry.register(node);

        if parents.iter().any(|p| p == &definition.name) {
            return id;
        }

        let mut chain = parents.to_vec();
        chain.push(definition.name.clone());

        let catalog = self.catalog;
        let mut properties = Vec::new();
        for (declaring, property) in catalog.all_properties(definition) {
            if property
                .annotations
                .iter()
                .any(|a| matches!(a, Annotation::JsonIgnore))
            {
                debug!("Skipping ignored property {}.{}", definition.name, property.name);
                continue;
            }
            properties.push(self.resolve_property(declaring, property, &chain, version));
        }

        if let ClassBody::Object(slot) = &mut self.registry[id].body {
            *slot = properties;
        }
        id
    }

    fn resolve_property(
        &mut self,
        declaring: &TypeDefinition,
        property: &PropertyDescriptor,
        parents: &[String],
        version: Option<&str>,
    ) -> PropertyNode {
        let mut type_node = self.resolve_member(&property.ty, property.nullable, parents, version);

        let hints = self.adapter.union_types(property);
        if type_node.identifier == TypeIdentifier::Any && !hints.is_empty() {
            let alternatives = hints
                .iter()
                .map(|hint| self.resolve(hint, parents, version))
                .collect();
            type_node.identifier = TypeIdentifier::Union;
            type_node.union = Some(alternatives);
        }

        let is_read_only = property.annotations.iter().any(|a| {
            matches!(
                a,
                Annotation::ReadOnly { value: true } | Annotation::Editable { allow_edit: false }
            )
        });

        PropertyNode {
            name: to_camel_case(&property.name),
            type_node,
            documentation: self
                .documentation
                .property_summary(&declaring.name, &property.name),
            is_read_only,
            constraints: Constraints::from_annotations(&property.annotations),
        }
    }
}

fn nullable_inner(ty: &TypeRef) -> Option<&TypeRef> {
    match ty {
        TypeRef::Named { name, args } if name == NULLABLE_TYPE && args.len() == 1 => Some(&args[0]),
        _ => None,
    }
}

/// Classifies framework primitives. Names are accepted with or without the `System.` namespace.
fn primitive_identifier(name: &str) -> Option<TypeIdentifier> {
    let short = name.strip_prefix("System.").unwrap_or(name);
    let identifier = match short {
        "Boolean" => TypeIdentifier::Boolean,
        "Int32" | "Int16" | "UInt16" | "SByte" => TypeIdentifier::Int,
        "Int64" | "UInt32" | "UInt64" => TypeIdentifier::Long,
        "Single" => TypeIdentifier::Float,
        "Double" => TypeIdentifier::Double,
        "Byte" => TypeIdentifier::Byte,
        "String" | "Char" => TypeIdentifier::String,
        "Guid" => TypeIdentifier::Guid,
        "DateTime" | "DateTimeOffset" => TypeIdentifier::DateTime,
        "TimeSpan" => TypeIdentifier::TimeSpan,
        "Decimal" => TypeIdentifier::Decimal,
        "Object" => TypeIdentifier::Any,
        _ => return None,
    };
    Some(identifier)
}
