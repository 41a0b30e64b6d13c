//! Metadata descriptors for server-side types, as supplied by the host application.
//!
//! The generator never reflects over a live runtime. Instead the host exports a manifest
//! describing its controllers and the types they reference, and everything downstream
//! works from the strongly-typed records defined here:
//!
//! - [`TypeRef`] - a use-site type expression (`List<int>`, `Order[]`, `$T`)
//! - [`TypeDefinition`] - a declared class, struct, interface or enum
//! - [`MethodDescriptor`], [`ParameterDescriptor`], [`PropertyDescriptor`]
//! - [`Annotation`] - the closed set of attributes the adapters understand
//! - [`TypeCatalog`] - lookup of definitions by name, pre-seeded with the well-known
//!   framework collection types so manifests only need to describe application types

use crate::error::{Error, Result};
use crate::naming::simple_name;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Full name of the nullable value wrapper.
pub const NULLABLE_TYPE: &str = "System.Nullable`1";

/// Contract names (simple name with arity) that make a generic type a dictionary.
pub const DICTIONARY_CONTRACTS: &[&str] = &["IDictionary`2", "IReadOnlyDictionary`2"];

/// Contract names that make a generic type a sequence.
pub const SEQUENCE_CONTRACTS: &[&str] = &["IEnumerable`1"];

/// Simple name of the wrapper marking a value that may be absent from a payload.
pub const OPTIONAL_WRAPPER: &str = "Optional`1";

/// A use-site type expression.
///
/// In manifests a `TypeRef` is written as a string in C#-like syntax:
///
/// - `int`, `string`, `System.Guid`, `MyApp.Views.UserView`
/// - `List<int>`, `Dictionary<string, List<int>>` (the arity marker is added automatically)
/// - `Order[]`, `int?` (nullable value)
/// - `$T` for a generic parameter bound by the enclosing definition
/// - `void`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// A named type, possibly generic (`name` carries the arity marker, e.g. ``List`1``)
    Named { name: String, args: Vec<TypeRef> },
    /// A single-dimension array
    Array(Box<TypeRef>),
    /// A free generic parameter such as `T`
    GenericParameter(String),
    /// No value
    Void,
}

impl TypeRef {
    /// A non-generic named type. C# keyword aliases are expanded (`int` -> `System.Int32`).
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            name: canonical_name(name).to_string(),
            args: Vec::new(),
        }
    }

    /// A constructed generic type. The arity marker is appended when missing.
    pub fn generic(name: &str, args: Vec<TypeRef>) -> Self {
        let name = if name.contains('`') || args.is_empty() {
            name.to_string()
        } else {
            format!("{}`{}", name, args.len())
        };
        TypeRef::Named { name, args }
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn generic_parameter(name: &str) -> Self {
        TypeRef::GenericParameter(name.to_string())
    }

    /// Parses a type expression such as `Dictionary<string, List<int>>[]`.
    pub fn parse(expression: &str) -> Result<Self> {
        let mut parser = TypeExpressionParser::new(expression);
        let parsed = parser.parse_type()?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(parsed)
    }

    /// Full name for named types, `None` otherwise.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Generic arguments of a named type (empty for everything else).
    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Whether this is a constructed generic type.
    pub fn is_generic(&self) -> bool {
        !self.args().is_empty()
    }

    /// Whether this is a named type whose simple name (with arity) equals `simple`.
    pub fn is_named(&self, simple: &str) -> bool {
        self.name().map(|name| simple_name(name) == simple).unwrap_or(false)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, args } if name == NULLABLE_TYPE && args.len() == 1 => {
                write!(f, "{}?", args[0])
            }
            TypeRef::Named { name, args } => {
                if args.is_empty() {
                    return write!(f, "{}", name);
                }
                write!(f, "{}<", crate::naming::strip_arity(name))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            TypeRef::Array(element) => write!(f, "{}[]", element),
            TypeRef::GenericParameter(name) => write!(f, "${}", name),
            TypeRef::Void => write!(f, "void"),
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

/// Expands C# keyword aliases to their framework type names.
pub fn canonical_name(name: &str) -> &str {
    match name {
        "bool" => "System.Boolean",
        "byte" => "System.Byte",
        "sbyte" => "System.SByte",
        "short" => "System.Int16",
        "ushort" => "System.UInt16",
        "int" => "System.Int32",
        "uint" => "System.UInt32",
        "long" => "System.Int64",
        "ulong" => "System.UInt64",
        "float" => "System.Single",
        "double" => "System.Double",
        "decimal" => "System.Decimal",
        "char" => "System.Char",
        "string" => "System.String",
        "object" => "System.Object",
        other => other,
    }
}

/// Recursive-descent parser for the manifest type syntax.
struct TypeExpressionParser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl<'s> TypeExpressionParser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::InvalidTypeExpression {
            expression: self.source.to_string(),
            message: format!("{} at position {}", message, self.pos),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map(char::is_whitespace).unwrap_or(false) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '`' | '+') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        self.skip_whitespace();
        let mut parsed = if self.eat('$') {
            TypeRef::GenericParameter(self.identifier()?)
        } else {
            let name = self.identifier()?;
            if name == "void" {
                TypeRef::Void
            } else if self.eat('<') {
                let mut args = vec![self.parse_type()?];
                while self.eat(',') {
                    args.push(self.parse_type()?);
                }
                if !self.eat('>') {
                    return Err(self.error("expected '>'"));
                }
                TypeRef::generic(canonical_name(&name), args)
            } else {
                TypeRef::named(&name)
            }
        };

        loop {
            if self.eat('[') {
                if !self.eat(']') {
                    return Err(self.error("expected ']'"));
                }
                parsed = TypeRef::array(parsed);
            } else if self.eat('?') {
                parsed = TypeRef::Named {
                    name: NULLABLE_TYPE.to_string(),
                    args: vec![parsed],
                };
            } else {
                break;
            }
        }
        Ok(parsed)
    }
}

/// The closed set of attributes the adapters understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "annotation")]
pub enum Annotation {
    Route {
        #[serde(default)]
        template: Option<String>,
    },
    RoutePrefix {
        name: String,
    },
    HttpGet {
        #[serde(default)]
        template: Option<String>,
    },
    HttpPost {
        #[serde(default)]
        template: Option<String>,
    },
    HttpPut {
        #[serde(default)]
        template: Option<String>,
    },
    HttpDelete {
        #[serde(default)]
        template: Option<String>,
    },
    HttpPatch {
        #[serde(default)]
        template: Option<String>,
    },
    NonAction,
    ApiExplorerSettings {
        #[serde(default)]
        ignore_api: bool,
    },
    FromQuery,
    FromUri,
    FromBody,
    FromRoute,
    Authorize {
        #[serde(default)]
        policy: Option<String>,
        #[serde(default)]
        roles: Option<String>,
    },
    AllowAnonymous,
    JsonIgnore,
    ReadOnly {
        #[serde(default = "default_true")]
        value: bool,
    },
    Editable {
        allow_edit: bool,
    },
    Required,
    StringLength {
        maximum: u32,
        #[serde(default)]
        minimum: Option<u32>,
    },
    MinLength {
        length: u32,
    },
    MaxLength {
        length: u32,
    },
    Range {
        minimum: f64,
        maximum: f64,
    },
    Compare {
        other_property: String,
    },
    EmailAddress,
    UnionType {
        types: Vec<TypeRef>,
    },
    ReturnType {
        return_type: TypeRef,
    },
    Json {
        #[serde(default = "default_true")]
        observable: bool,
    },
}

fn default_true() -> bool {
    true
}

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
}

/// A declared type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDefinition {
    /// Full name including namespace and arity marker (``MyApp.Views.PageView`1``)
    pub name: String,
    pub kind: DefinitionKind,
    /// Direct base type, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeRef>,
    /// Names of the generic parameters when this is a generic definition
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generic_parameters: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
    /// Enum members in declaration order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<EnumValueDescriptor>,
}

impl TypeDefinition {
    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn enumeration(name: &str, values: &[(&str, i64)]) -> Self {
        Self {
            name: name.to_string(),
            kind: DefinitionKind::Enum,
            values: values
                .iter()
                .map(|(name, value)| EnumValueDescriptor {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn is_enum(&self) -> bool {
        self.kind == DefinitionKind::Enum
    }
}

/// A public method of a controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default = "void_type")]
    pub return_type: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Compiler-generated accessors and operators
    #[serde(default)]
    pub is_special: bool,
}

fn void_type() -> TypeRef {
    TypeRef::Void
}

impl MethodDescriptor {
    pub fn new(name: &str, return_type: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type,
            annotations: Vec::new(),
            is_public: true,
            is_special: false,
        }
    }
}

/// A method parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// The parameter declares a default value
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ParameterDescriptor {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            ty,
            is_optional: false,
            nullable: false,
            annotations: Vec::new(),
        }
    }
}

/// A public property of a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl PropertyDescriptor {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            ty,
            nullable: false,
            annotations: Vec::new(),
        }
    }
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub value: i64,
}

/// Well-known framework collection and action result types with the contracts they implement.
const SYSTEM_TYPES: &[(&str, &[&str])] = &[
    ("System.Collections.Generic.IEnumerable`1", &[]),
    ("System.Collections.Generic.ICollection`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.IList`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.IReadOnlyCollection`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.IReadOnlyList`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.ISet`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.List`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.HashSet`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.SortedSet`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.LinkedList`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.Queue`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.Stack`1", &["IEnumerable`1"]),
    ("System.Collections.ObjectModel.Collection`1", &["IEnumerable`1"]),
    ("System.Collections.ObjectModel.ReadOnlyCollection`1", &["IEnumerable`1"]),
    ("System.Collections.Immutable.ImmutableArray`1", &["IEnumerable`1"]),
    ("System.Collections.Immutable.ImmutableList`1", &["IEnumerable`1"]),
    ("System.Collections.Generic.IDictionary`2", &["IEnumerable`1"]),
    ("System.Collections.Generic.IReadOnlyDictionary`2", &["IEnumerable`1"]),
    ("System.Collections.Generic.Dictionary`2", DICTIONARY_CONTRACTS),
    ("System.Collections.Generic.SortedDictionary`2", DICTIONARY_CONTRACTS),
    ("System.Collections.Concurrent.ConcurrentDictionary`2", DICTIONARY_CONTRACTS),
    ("System.Collections.ObjectModel.ReadOnlyDictionary`2", DICTIONARY_CONTRACTS),
    ("System.Collections.Immutable.ImmutableDictionary`2", DICTIONARY_CONTRACTS),
    ("Microsoft.AspNetCore.Mvc.IActionResult", &[]),
    ("Microsoft.AspNetCore.Mvc.ActionResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.StatusCodeResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.OkResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.NoContentResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.NotFoundResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.BadRequestResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.ObjectResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.OkObjectResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.JsonResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.ContentResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.FileResult", &["IActionResult"]),
    ("Microsoft.AspNetCore.Mvc.RedirectResult", &["IActionResult"]),
    ("System.Web.Http.IHttpActionResult", &[]),
];

/// Lookup of type definitions by name.
///
/// Application definitions keep their insertion order, which becomes the controller
/// discovery order. Lookups accept a full name or, when unambiguous, a simple name.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    definitions: IndexMap<String, TypeDefinition>,
    system: HashMap<String, TypeDefinition>,
    simple_names: HashMap<String, Vec<String>>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCatalog {
    /// Creates a catalog holding only the well-known framework types.
    pub fn new() -> Self {
        let mut catalog = Self {
            definitions: IndexMap::new(),
            system: HashMap::new(),
            simple_names: HashMap::new(),
        };

        for (name, contracts) in SYSTEM_TYPES {
            let arity = name
                .split_once('`')
                .and_then(|(_, a)| a.parse::<usize>().ok())
                .unwrap_or(0);
            let definition = TypeDefinition {
                name: name.to_string(),
                kind: if simple_name(name).starts_with('I') {
                    DefinitionKind::Interface
                } else {
                    DefinitionKind::Class
                },
                interfaces: contracts.iter().map(|c| TypeRef::named(c)).collect(),
                generic_parameters: match arity {
                    0 => Vec::new(),
                    1 => vec!["T".to_string()],
                    _ => vec!["TKey".to_string(), "TValue".to_string()],
                },
                ..Default::default()
            };
            catalog.index_simple_name(name);
            catalog.system.insert(name.to_string(), definition);
        }

        catalog
    }

    /// Creates a catalog from application definitions.
    pub fn from_definitions(definitions: impl IntoIterator<Item = TypeDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    fn index_simple_name(&mut self, full_name: &str) {
        let entry = self
            .simple_names
            .entry(simple_name(full_name).to_string())
            .or_default();
        if !entry.iter().any(|n| n == full_name) {
            entry.push(full_name.to_string());
        }
    }

    /// Adds (or replaces) an application definition.
    pub fn insert(&mut self, definition: TypeDefinition) {
        debug!("Registering type definition: {}", definition.name);
        self.index_simple_name(&definition.name);
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Application definitions in insertion order.
    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Finds a definition by full name, falling back to an unambiguous simple name.
    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        if let Some(definition) = self.definitions.get(name).or_else(|| self.system.get(name)) {
            return Some(definition);
        }
        match self.simple_names.get(simple_name(name)) {
            Some(candidates) if candidates.len() == 1 => {
                let full = &candidates[0];
                self.definitions.get(full).or_else(|| self.system.get(full))
            }
            _ => None,
        }
    }

    /// The definition followed by its known base types, most derived first.
    pub fn hierarchy<'c>(&'c self, definition: &'c TypeDefinition) -> Vec<&'c TypeDefinition> {
        let mut chain = vec![definition];
        let mut seen: HashSet<&str> = HashSet::from([definition.name.as_str()]);
        let mut current = definition;
        while let Some(base) = current.base_type.as_deref().and_then(|b| self.get(b)) {
            if !seen.insert(base.name.as_str()) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    /// Simple names of the base types, most derived first. Bases missing from the
    /// catalog still contribute their own name but end the chain.
    pub fn base_names(&self, definition: &TypeDefinition) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut next = definition.base_type.clone();
        while let Some(base) = next {
            let simple = crate::naming::strip_arity(simple_name(&base)).to_string();
            if !seen.insert(base.clone()) {
                break;
            }
            names.push(simple);
            next = self.get(&base).and_then(|d| d.base_type.clone());
        }
        names
    }

    /// Whether the type named `name` is, or transitively implements or derives from, one
    /// of `contracts` (simple names with arity, e.g. ``IEnumerable`1``).
    pub fn implements(&self, name: &str, contracts: &[&str]) -> bool {
        let mut visited = HashSet::new();
        self.implements_inner(name, contracts, &mut visited)
    }

    fn implements_inner(
        &self,
        name: &str,
        contracts: &[&str],
        visited: &mut HashSet<String>,
    ) -> bool {
        if contracts.contains(&simple_name(name)) {
            return true;
        }
        if !visited.insert(name.to_string()) {
            return false;
        }
        let Some(definition) = self.get(name) else {
            return false;
        };
        let parents = definition
            .interfaces
            .iter()
            .filter_map(|i| i.name().map(str::to_string))
            .chain(definition.base_type.iter().cloned())
            .collect::<Vec<_>>();
        parents
            .iter()
            .any(|parent| self.implements_inner(parent, contracts, visited))
    }

    /// Position of the type argument a generic definition passes to one of `contracts`,
    /// when it declares the contract directly (``KeyedCollection`2`` implementing
    /// `IEnumerable<TItem>` gives 1).
    pub fn contract_argument(&self, name: &str, contracts: &[&str]) -> Option<usize> {
        let definition = self.get(name)?;
        definition
            .interfaces
            .iter()
            .filter(|contract| contract.name().is_some_and(|n| contracts.contains(&simple_name(n))))
            .find_map(|contract| match contract.args().first()? {
                TypeRef::GenericParameter(parameter) => {
                    definition.generic_parameters.iter().position(|p| p == parameter)
                }
                _ => None,
            })
    }

    /// Properties declared on the definition and its known base types, base first,
    /// paired with the definition that declares them. A property redeclared in a
    /// derived type replaces the inherited one.
    pub fn all_properties<'c>(
        &'c self,
        definition: &'c TypeDefinition,
    ) -> Vec<(&'c TypeDefinition, &'c PropertyDescriptor)> {
        let mut properties: IndexMap<&str, (&TypeDefinition, &PropertyDescriptor)> =
            IndexMap::new();
        for declaring in self.hierarchy(definition).into_iter().rev() {
            for property in &declaring.properties {
                properties.insert(property.name.as_str(), (declaring, property));
            }
        }
        properties.into_values().collect()
    }

    /// Methods declared on the definition and its known base types, base first,
    /// paired with the declaring definition. Overrides (same name and parameter
    /// types) keep the most derived declaration.
    pub fn all_methods<'c>(
        &'c self,
        definition: &'c TypeDefinition,
    ) -> Vec<(&'c TypeDefinition, &'c MethodDescriptor)> {
        let mut methods: IndexMap<(String, Vec<TypeRef>), (&TypeDefinition, &MethodDescriptor)> =
            IndexMap::new();
        for declaring in self.hierarchy(definition).into_iter().rev() {
            for method in &declaring.methods {
                let key = (
                    method.name.clone(),
                    method.parameters.iter().map(|p| p.ty.clone()).collect(),
                );
                methods.insert(key, (declaring, method));
            }
        }
        methods.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_aliases() {
        assert_eq!(TypeRef::parse("int").unwrap(), TypeRef::named("System.Int32"));
        assert_eq!(TypeRef::parse("string").unwrap().name(), Some("System.String"));
        assert_eq!(TypeRef::parse("void").unwrap(), TypeRef::Void);
    }

    #[test]
    fn test_parse_nested_generics() {
        let parsed = TypeRef::parse("Dictionary<string, List<int>>").unwrap();
        assert_eq!(parsed.name(), Some("Dictionary`2"));
        assert_eq!(parsed.args().len(), 2);
        assert_eq!(parsed.args()[1].name(), Some("List`1"));
        assert_eq!(parsed.args()[1].args()[0], TypeRef::named("int"));
    }

    #[test]
    fn test_parse_array_nullable_and_generic_parameter() {
        assert_eq!(
            TypeRef::parse("MyApp.Order[]").unwrap(),
            TypeRef::array(TypeRef::named("MyApp.Order"))
        );
        let nullable = TypeRef::parse("int?").unwrap();
        assert_eq!(nullable.name(), Some(NULLABLE_TYPE));
        assert_eq!(TypeRef::parse("$T").unwrap(), TypeRef::generic_parameter("T"));
        assert_eq!(
            TypeRef::parse("List<$T>").unwrap().args()[0],
            TypeRef::generic_parameter("T")
        );
    }

    #[test]
    fn test_parse_rejects_malformed_expressions() {
        assert!(TypeRef::parse("List<int").is_err());
        assert!(TypeRef::parse("int[").is_err());
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("int int").is_err());
    }

    #[test]
    fn test_display_reparses_to_same_type() {
        let source = TypeRef::parse("Dictionary<string, List<MyApp.Order?>>[]").unwrap();
        let text = source.to_string();
        assert_eq!(TypeRef::parse(&text).unwrap(), source);
    }

    #[test]
    fn test_type_ref_deserializes_from_string() {
        let parsed: TypeRef = serde_json::from_str("\"List<int>\"").unwrap();
        assert_eq!(parsed.name(), Some("List`1"));
    }

    #[test]
    fn test_annotation_deserialization() {
        let json = r#"[{"annotation": "HttpGet", "template": "{id}"}, {"annotation": "FromBody"},
            {"annotation": "Authorize", "policy": "Admin"}]"#;
        let annotations: Vec<Annotation> = serde_json::from_str(json).unwrap();
        assert_eq!(
            annotations[0],
            Annotation::HttpGet {
                template: Some("{id}".to_string())
            }
        );
        assert_eq!(annotations[1], Annotation::FromBody);
        assert!(matches!(
            &annotations[2],
            Annotation::Authorize { policy: Some(p), roles: None } if p == "Admin"
        ));
    }

    #[test]
    fn test_catalog_contracts_for_system_types() {
        let catalog = TypeCatalog::new();
        assert!(catalog.implements("System.Collections.Generic.List`1", SEQUENCE_CONTRACTS));
        assert!(catalog.implements("List`1", SEQUENCE_CONTRACTS));
        assert!(catalog.implements("Dictionary`2", DICTIONARY_CONTRACTS));
        assert!(!catalog.implements("List`1", DICTIONARY_CONTRACTS));
        assert!(!catalog.implements("MyApp.Unknown`1", SEQUENCE_CONTRACTS));
    }

    #[test]
    fn test_catalog_contracts_through_application_types() {
        let mut paged = TypeDefinition::class("MyApp.PagedList`1");
        paged.base_type = Some("System.Collections.Generic.List`1".to_string());
        let catalog = TypeCatalog::from_definitions(vec![paged]);
        assert!(catalog.implements("MyApp.PagedList`1", SEQUENCE_CONTRACTS));
    }

    #[test]
    fn test_contract_argument_position() {
        let mut keyed = TypeDefinition::class("MyApp.KeyedCollection`2");
        keyed.generic_parameters = vec!["TKey".to_string(), "TItem".to_string()];
        keyed.interfaces = vec![TypeRef::parse("IEnumerable<$TItem>").unwrap()];
        let catalog = TypeCatalog::from_definitions(vec![keyed]);
        assert_eq!(
            catalog.contract_argument("MyApp.KeyedCollection`2", SEQUENCE_CONTRACTS),
            Some(1)
        );
        assert_eq!(catalog.contract_argument("MyApp.Missing`1", SEQUENCE_CONTRACTS), None);
    }

    #[test]
    fn test_catalog_lookup_by_simple_name() {
        let catalog =
            TypeCatalog::from_definitions(vec![TypeDefinition::class("MyApp.Views.UserView")]);
        assert!(catalog.get("UserView").is_some());
        assert!(catalog.get("MyApp.Views.UserView").is_some());
        assert!(catalog.get("Missing").is_none());
    }

    #[test]
    fn test_all_properties_includes_inherited_members() {
        let mut base = TypeDefinition::class("MyApp.Entity");
        base.properties.push(PropertyDescriptor::new("Id", TypeRef::named("int")));
        let mut derived = TypeDefinition::class("MyApp.User");
        derived.base_type = Some("MyApp.Entity".to_string());
        derived.properties.push(PropertyDescriptor::new("Name", TypeRef::named("string")));
        let catalog = TypeCatalog::from_definitions(vec![base, derived]);

        let user = catalog.get("MyApp.User").unwrap();
        let names: Vec<_> = catalog
            .all_properties(user)
            .iter()
            .map(|(declaring, p)| (declaring.name.as_str(), p.name.as_str()))
            .collect();
        assert_eq!(names, vec![("MyApp.Entity", "Id"), ("MyApp.User", "Name")]);
    }

    #[test]
    fn test_base_names_include_external_bases() {
        let mut base = TypeDefinition::class("MyApp.BaseController");
        base.base_type = Some("Microsoft.AspNetCore.Mvc.ControllerBase".to_string());
        let mut derived = TypeDefinition::class("MyApp.UserController");
        derived.base_type = Some("MyApp.BaseController".to_string());
        let catalog = TypeCatalog::from_definitions(vec![base, derived]);

        let user = catalog.get("MyApp.UserController").unwrap();
        assert_eq!(catalog.base_names(user), vec!["BaseController", "ControllerBase"]);
    }
}
