use crate::adapter::{has_annotation, has_base_type, route_template, ApiAdapter};
use crate::metadata::{
    Annotation, DefinitionKind, MethodDescriptor, ParameterDescriptor, PropertyDescriptor,
    TypeCatalog, TypeDefinition, TypeRef,
};

/// ASP.NET Core MVC convention
pub struct MvcAdapter;

impl ApiAdapter for MvcAdapter {
    fn name(&self) -> &'static str {
        "mvc"
    }

    fn is_controller(&self, definition: &TypeDefinition, catalog: &TypeCatalog) -> bool {
        definition.kind == DefinitionKind::Class
            && has_base_type(definition, catalog, &["Controller", "ControllerBase"])
    }

    fn route_prefix(&self, definition: &TypeDefinition) -> Option<String> {
        route_template(&definition.annotations)
    }

    fn is_action(&self, method: &MethodDescriptor) -> bool {
        !has_annotation(&method.annotations, |a| {
            matches!(
                a,
                Annotation::NonAction | Annotation::ApiExplorerSettings { ignore_api: true }
            )
        })
    }

    fn return_type_override(&self, _method: &MethodDescriptor) -> Option<TypeRef> {
        None
    }

    fn is_query_parameter(&self, parameter: &ParameterDescriptor) -> bool {
        has_annotation(&parameter.annotations, |a| matches!(a, Annotation::FromQuery))
    }

    fn union_types(&self, _property: &PropertyDescriptor) -> Vec<TypeRef> {
        Vec::new()
    }

    fn is_observable(&self, _definition: &TypeDefinition) -> bool {
        true
    }
}
