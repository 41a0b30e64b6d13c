//! Controller conventions.
//!
//! An [`ApiAdapter`] answers the convention-specific questions the resolver and the
//! extractor ask about a type, a method, a parameter or a property: is this a
//! controller, what is its route prefix, which verb does this method answer to, where
//! does this parameter come from. The algorithms are identical for every convention;
//! only the annotations each adapter recognizes differ.
//!
//! # Supported Conventions
//!
//! - **ASP.NET Core MVC**: See [`mvc::MvcAdapter`]
//! - **ASP.NET Web API**: See [`web_api::WebApiAdapter`]

pub mod mvc;
pub mod web_api;

use crate::metadata::{
    Annotation, MethodDescriptor, ParameterDescriptor, PropertyDescriptor, TypeCatalog,
    TypeDefinition, TypeRef,
};
use crate::model::HttpVerb;

/// Capability interface over one controller convention.
pub trait ApiAdapter {
    /// Short convention name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the type is a controller, judged from its base type chain.
    fn is_controller(&self, definition: &TypeDefinition, catalog: &TypeCatalog) -> bool;

    /// Route prefix declared on the controller type, if any.
    fn route_prefix(&self, definition: &TypeDefinition) -> Option<String>;

    /// Whether a public method may be exposed. Methods passing this check still need
    /// a verb and a route to become actions.
    fn is_action(&self, method: &MethodDescriptor) -> bool;

    /// Declared return type to use instead of the method's own return type.
    fn return_type_override(&self, method: &MethodDescriptor) -> Option<TypeRef>;

    /// Whether the parameter is explicitly bound from the query string.
    fn is_query_parameter(&self, parameter: &ParameterDescriptor) -> bool;

    /// Whether the parameter is explicitly bound from the request body.
    fn is_body_parameter(&self, parameter: &ParameterDescriptor) -> bool {
        has_annotation(&parameter.annotations, |a| matches!(a, Annotation::FromBody))
    }

    /// Alternative types hinted for a property whose declared type is opaque.
    fn union_types(&self, property: &PropertyDescriptor) -> Vec<TypeRef>;

    /// Whether classes of this type may be wrapped in observable client classes.
    fn is_observable(&self, definition: &TypeDefinition) -> bool;

    /// Verb declared by a per-verb annotation.
    fn http_verb(&self, method: &MethodDescriptor) -> Option<HttpVerb> {
        verb_annotation(method).map(|(verb, _)| verb)
    }

    /// Raw route fragment of the method.
    ///
    /// A `Route` annotation with a template wins. Otherwise the template of the
    /// per-verb annotation is used, an empty string when that annotation has none.
    /// `None` means the method declares no route at all.
    fn route_format(&self, method: &MethodDescriptor) -> Option<String> {
        let route = method.annotations.iter().find_map(|a| match a {
            Annotation::Route { template } => Some(template.clone()),
            _ => None,
        });
        match (route, verb_annotation(method)) {
            (Some(Some(template)), _) => Some(template),
            (_, Some((_, template))) => Some(template.unwrap_or_default()),
            (Some(None), None) => Some(String::new()),
            (None, None) => None,
        }
    }

    fn is_post_action(&self, method: &MethodDescriptor) -> bool {
        self.http_verb(method) == Some(HttpVerb::Post)
    }

    fn is_put_action(&self, method: &MethodDescriptor) -> bool {
        self.http_verb(method) == Some(HttpVerb::Put)
    }

    fn is_delete_action(&self, method: &MethodDescriptor) -> bool {
        self.http_verb(method) == Some(HttpVerb::Delete)
    }
}

/// Returns the first per-verb annotation of a method with its template.
pub fn verb_annotation(method: &MethodDescriptor) -> Option<(HttpVerb, Option<String>)> {
    method.annotations.iter().find_map(|a| match a {
        Annotation::HttpGet { template } => Some((HttpVerb::Get, template.clone())),
        Annotation::HttpPost { template } => Some((HttpVerb::Post, template.clone())),
        Annotation::HttpPut { template } => Some((HttpVerb::Put, template.clone())),
        Annotation::HttpDelete { template } => Some((HttpVerb::Delete, template.clone())),
        Annotation::HttpPatch { template } => Some((HttpVerb::Patch, template.clone())),
        _ => None,
    })
}

pub fn has_annotation(annotations: &[Annotation], predicate: impl Fn(&Annotation) -> bool) -> bool {
    annotations.iter().any(predicate)
}

/// Route template declared by a `Route` annotation on a type.
pub(crate) fn route_template(annotations: &[Annotation]) -> Option<String> {
    annotations.iter().find_map(|a| match a {
        Annotation::Route { template } => template.clone(),
        _ => None,
    })
}

/// Whether any base type in the chain has one of the given simple names.
pub(crate) fn has_base_type(
    definition: &TypeDefinition,
    catalog: &TypeCatalog,
    names: &[&str],
) -> bool {
    catalog
        .base_names(definition)
        .iter()
        .any(|base| names.contains(&base.as_str()))
}
