//! XML documentation lookup.
//!
//! The compiler-generated documentation file lists `<member name="...">` elements keyed
//! by a signature string:
//!
//! | Prefix | Member | Example |
//! |---|---|---|
//! | `T:` | type | `T:MyApp.Views.UserView` |
//! | `M:` | method | `M:MyApp.UserController.Get(System.Int32)` |
//! | `P:` | property | `P:MyApp.Views.UserView.Name` |
//! | `F:` | field / enum value | `F:MyApp.Role.Admin` |
//!
//! Generic arguments in method signatures are written in braces
//! (`System.Collections.Generic.List{System.Int32}`). Parameterless methods have no
//! parentheses.

use crate::error::Result;
use crate::metadata::{MethodDescriptor, TypeDefinition, TypeRef};
use crate::naming::strip_arity;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// Documentation attached to one member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDocumentation {
    pub summary: Option<String>,
    /// `<param name="...">` texts keyed by parameter name
    pub parameters: HashMap<String, String>,
    pub returns: Option<String>,
}

/// Index of member documentation keyed by signature.
#[derive(Debug, Clone, Default)]
pub struct Documentation {
    members: HashMap<String, MemberDocumentation>,
}

impl Documentation {
    /// An empty index: every lookup returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes the members of a documentation XML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not well-formed XML.
    pub fn parse(xml: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(xml)?;
        let mut members = HashMap::new();

        for member in document
            .descendants()
            .filter(|n| n.is_element() && n.has_tag_name("member"))
        {
            let Some(name) = member.attribute("name") else {
                continue;
            };

            let mut doc = MemberDocumentation::default();
            for child in member.children().filter(|n| n.is_element()) {
                let text = collapse_text(&child);
                if text.is_empty() {
                    continue;
                }
                match child.tag_name().name() {
                    "summary" => doc.summary = Some(text),
                    "returns" => doc.returns = Some(text),
                    "param" => {
                        if let Some(param) = child.attribute("name") {
                            doc.parameters.insert(param.to_string(), text);
                        }
                    }
                    _ => {}
                }
            }

            // Members documented with bare text and no <summary> element
            if doc.summary.is_none() && doc.parameters.is_empty() && doc.returns.is_none() {
                let text = collapse_text(&member);
                if !text.is_empty() {
                    doc.summary = Some(text);
                }
            }

            members.insert(name.to_string(), doc);
        }

        debug!("Indexed {} documented members", members.len());
        Ok(Self { members })
    }

    /// Reads and indexes a documentation file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading documentation from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Adds the members of another index, replacing duplicates.
    pub fn merge(&mut self, other: Documentation) {
        self.members.extend(other.members);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Looks up a member by its raw signature (`T:MyApp.User`).
    pub fn member(&self, signature: &str) -> Option<&MemberDocumentation> {
        self.members.get(signature)
    }

    pub fn type_summary(&self, type_name: &str) -> Option<String> {
        self.summary(&format!("T:{}", member_path(type_name)))
    }

    pub fn property_summary(&self, declaring_type: &str, property: &str) -> Option<String> {
        self.summary(&format!("P:{}.{}", member_path(declaring_type), property))
    }

    pub fn enum_value_summary(&self, enum_type: &str, value: &str) -> Option<String> {
        self.summary(&format!("F:{}.{}", member_path(enum_type), value))
    }

    /// Documentation of a method declared on `declaring`.
    pub fn method(
        &self,
        declaring: &TypeDefinition,
        method: &MethodDescriptor,
    ) -> Option<&MemberDocumentation> {
        let signature = method_signature(declaring, method);
        let found = self.members.get(&signature);
        if found.is_none() && method.parameters.is_empty() {
            // Some generators always emit parentheses
            return self.members.get(&format!("{}()", signature));
        }
        found
    }

    fn summary(&self, signature: &str) -> Option<String> {
        self.members.get(signature).and_then(|m| m.summary.clone())
    }
}

/// Signature key of a method: `M:Type.Method(Arg1,Arg2)`.
pub fn method_signature(declaring: &TypeDefinition, method: &MethodDescriptor) -> String {
    let mut signature = format!("M:{}.{}", member_path(&declaring.name), method.name);
    if !method.parameters.is_empty() {
        let arguments: Vec<String> = method
            .parameters
            .iter()
            .map(|p| documentation_type_name(&p.ty, &declaring.generic_parameters))
            .collect();
        signature.push('(');
        signature.push_str(&arguments.join(","));
        signature.push(')');
    }
    signature
}

fn member_path(type_name: &str) -> String {
    type_name.replace('+', ".")
}

/// Writes a type the way documentation signatures spell it.
fn documentation_type_name(ty: &TypeRef, generic_parameters: &[String]) -> String {
    match ty {
        TypeRef::Named { name, args } if args.is_empty() => member_path(name),
        TypeRef::Named { name, args } => {
            let arguments: Vec<String> = args
                .iter()
                .map(|a| documentation_type_name(a, generic_parameters))
                .collect();
            format!("{}{{{}}}", member_path(strip_arity(name)), arguments.join(","))
        }
        TypeRef::Array(element) => {
            format!("{}[]", documentation_type_name(element, generic_parameters))
        }
        TypeRef::GenericParameter(name) => match generic_parameters.iter().position(|p| p == name) {
            Some(index) => format!("`{}", index),
            None => format!("``{}", name),
        },
        TypeRef::Void => "System.Void".to_string(),
    }
}

fn collapse_text(node: &roxmltree::Node) -> String {
    let raw: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
