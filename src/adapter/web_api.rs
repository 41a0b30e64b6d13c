use crate::adapter::{has_annotation, has_base_type, route_template, ApiAdapter};
use crate::metadata::{
    Annotation, DefinitionKind, MethodDescriptor, ParameterDescriptor, PropertyDescriptor,
    TypeCatalog, TypeDefinition, TypeRef,
};

/// Classic ASP.NET Web API convention
pub struct WebApiAdapter;

impl ApiAdapter for WebApiAdapter {
    fn name(&self) -> &'static str {
        "web-api"
    }

    fn is_controller(&self, definition: &TypeDefinition, catalog: &TypeCatalog) -> bool {
        definition.kind == DefinitionKind::Class
            && has_base_type(definition, catalog, &["ApiController", "Controller"])
    }

    fn route_prefix(&self, definition: &TypeDefinition) -> Option<String> {
        definition
            .annotations
            .iter()
            .find_map(|a| match a {
                Annotation::RoutePrefix { name } => Some(name.clone()),
                _ => None,
            })
            .or_else(|| route_template(&definition.annotations))
    }

    /// Bare `ActionResult` methods render MVC views and are never API actions.
    fn is_action(&self, method: &MethodDescriptor) -> bool {
        !has_annotation(&method.annotations, |a| matches!(a, Annotation::NonAction))
            && !method.return_type.is_named("ActionResult")
    }

    fn return_type_override(&self, method: &MethodDescriptor) -> Option<TypeRef> {
        method.annotations.iter().find_map(|a| match a {
            Annotation::ReturnType { return_type } => Some(return_type.clone()),
            _ => None,
        })
    }

    fn is_query_parameter(&self, parameter: &ParameterDescriptor) -> bool {
        has_annotation(&parameter.annotations, |a| {
            matches!(a, Annotation::FromUri | Annotation::FromQuery)
        })
    }

    fn union_types(&self, property: &PropertyDescriptor) -> Vec<TypeRef> {
        property
            .annotations
            .iter()
            .flat_map(|a| match a {
                Annotation::UnionType { types } => types.clone(),
                Annotation::ReturnType { return_type } => vec![return_type.clone()],
                _ => Vec::new(),
            })
            .collect()
    }

    fn is_observable(&self, definition: &TypeDefinition) -> bool {
        definition
            .annotations
            .iter()
            .find_map(|a| match a {
                Annotation::Json { observable } => Some(*observable),
                _ => None,
            })
            .unwrap_or(true)
    }
}
