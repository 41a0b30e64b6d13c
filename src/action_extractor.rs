//! Action extraction: one controller method in, one [`ActionNode`] (or nothing) out.
//!
//! A method becomes an action only when it declares a route (through a per-verb or a
//! `Route` annotation) and an HTTP verb can be determined, either from the annotation
//! or from the method name prefix. Anything else is silently skipped; extraction never
//! fails the run.

use crate::adapter::ApiAdapter;
use crate::documentation::Documentation;
use crate::metadata::{
    Annotation, MethodDescriptor, ParameterDescriptor, TypeCatalog, TypeDefinition, TypeRef,
};
use crate::model::{
    ActionNode, Authorization, Constraints, HttpVerb, ParameterNode, ParameterPosition, ReturnNode,
};
use crate::naming::simple_name;
use crate::type_resolver::TypeResolver;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Placeholder with optional catch-all stars, constraints and optional marker:
/// `{id:int}`, `{**path}`, `{tag:minlength(2)?}`
static CONSTRAINED_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\**(\w+)(?::[^}?]*)*(\?)?\}").unwrap());

/// Normalized placeholder: `{id}` or `{tag?}`
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)(\?)?\}").unwrap());

/// `api/v2` or `api/v1.5` as whole segments
static API_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|/)api/v(\d+(?:\.\d+)?)(?:/|$)").unwrap());

/// Route prefix used when a controller declares none
pub const DEFAULT_ROUTE_PREFIX: &str = "[controller]";

/// Verb inferred from a method name prefix, checked in order
const VERB_PREFIXES: &[(&str, HttpVerb)] = &[
    ("get", HttpVerb::Get),
    ("post", HttpVerb::Post),
    ("put", HttpVerb::Put),
    ("delete", HttpVerb::Delete),
];

/// Wrappers whose single argument is the payload of an asynchronous result
const ASYNC_WRAPPERS: &[&str] = &["Task`1", "ValueTask`1"];

/// Wrappers whose single argument is the payload of a typed action result
const RESULT_WRAPPERS: &[&str] = &["ActionResult`1", "IHttpActionResult`1"];

/// Types that carry no typed payload
const NO_PAYLOAD: &[&str] = &[
    "IActionResult",
    "ActionResult",
    "IHttpActionResult",
    "Task",
    "ValueTask",
];

/// What an action needs to know about its controller
#[derive(Debug, Clone)]
pub struct ControllerContext {
    /// Normalized controller name
    pub name: String,
    pub route_prefix: Option<String>,
    /// Requirement declared on the controller type
    pub authorization: Option<Authorization>,
}

/// Action extractor
pub struct ActionExtractor<'a> {
    catalog: &'a TypeCatalog,
    adapter: &'a dyn ApiAdapter,
    documentation: &'a Documentation,
}

impl<'a> ActionExtractor<'a> {
    pub fn new(
        catalog: &'a TypeCatalog,
        adapter: &'a dyn ApiAdapter,
        documentation: &'a Documentation,
    ) -> Self {
        Self {
            catalog,
            adapter,
            documentation,
        }
    }

    /// Extracts an action from a controller method
    ///
    /// # Arguments
    ///
    /// * `resolver` - Resolver owning the class registry of this run
    /// * `controller` - The owning controller
    /// * `declaring` - The definition declaring the method (a base class for inherited actions)
    /// * `method` - The method to inspect
    ///
    /// # Returns
    ///
    /// `None` when the method has no route or no verb can be determined.
    pub fn extract(
        &self,
        resolver: &mut TypeResolver<'a>,
        controller: &ControllerContext,
        declaring: &TypeDefinition,
        method: &MethodDescriptor,
    ) -> Option<ActionNode> {
        // Step 1: verb and raw route fragment
        let Some(fragment) = self.adapter.route_format(method) else {
            debug!("{}.{} declares no route, not an action", controller.name, method.name);
            return None;
        };

        // Step 2: fall back on the method name
        let Some(verb) = self
            .adapter
            .http_verb(method)
            .or_else(|| verb_from_name(&method.name))
        else {
            debug!("{}.{} has no HTTP verb, not an action", controller.name, method.name);
            return None;
        };

        // Step 3: final route
        let route = normalize_route(
            controller.route_prefix.as_deref(),
            &fragment,
            &controller.name,
            &method.name,
        );

        // Step 4: version
        let version = api_version(&route);

        // Step 5: authorization
        let anonymous = method
            .annotations
            .iter()
            .any(|a| matches!(a, Annotation::AllowAnonymous));
        let authorization = if anonymous {
            None
        } else {
            authorization_requirement(&method.annotations)
                .or_else(|| controller.authorization.clone())
        };

        // Step 6: documentation
        let docs = self.documentation.method(declaring, method);

        // Step 7: path placeholders
        let placeholders = route_placeholders(&route);

        // Step 8: parameters
        let parameters = method
            .parameters
            .iter()
            .map(|parameter| {
                let documentation = docs.and_then(|d| d.parameters.get(&parameter.name).cloned());
                self.extract_parameter(
                    resolver,
                    parameter,
                    &placeholders,
                    version.as_deref(),
                    documentation,
                )
            })
            .collect();

        // Step 9: return type
        let declared = self
            .adapter
            .return_type_override(method)
            .unwrap_or_else(|| method.return_type.clone());
        let return_node = self.effective_return_type(&declared).map(|payload| ReturnNode {
            type_node: resolver.resolve(payload, &[], version.as_deref()),
            documentation: docs.and_then(|d| d.returns.clone()),
        });

        debug!("Extracted action {} {} -> {}", verb.as_str(), route, method.name);

        Some(ActionNode {
            name: method.name.clone(),
            verb,
            route,
            version,
            authorization,
            documentation: docs.and_then(|d| d.summary.clone()),
            parameters,
            return_node,
            controller: controller.name.clone(),
        })
    }

    fn extract_parameter(
        &self,
        resolver: &mut TypeResolver<'a>,
        parameter: &ParameterDescriptor,
        placeholders: &HashMap<String, bool>,
        version: Option<&str>,
        documentation: Option<String>,
    ) -> ParameterNode {
        let type_node = resolver.resolve_member(&parameter.ty, parameter.nullable, &[], version);
        let constraints = Constraints::from_annotations(&parameter.annotations);
        let may_be_absent = parameter.is_optional
            || parameter.nullable
            || type_node.nullable
            || type_node.optional;
        let query_required = constraints.required || !may_be_absent;

        let placeholder = placeholders.get(&parameter.name.to_lowercase());
        let (position, is_required) = if let Some(optional) = placeholder {
            (ParameterPosition::Path, !optional)
        } else if self.adapter.is_query_parameter(parameter) {
            (ParameterPosition::Query, query_required)
        } else if self.adapter.is_body_parameter(parameter) || type_node.is_plain_object() {
            (ParameterPosition::Body, true)
        } else {
            (ParameterPosition::Query, query_required)
        };

        if position == ParameterPosition::Body {
            resolver.set_writable(&type_node);
        }

        ParameterNode {
            name: parameter.name.clone(),
            type_node,
            is_required,
            position,
            documentation,
            constraints,
        }
    }

    /// Unwraps async and typed result wrappers. `None` means the action returns no payload.
    fn effective_return_type<'t>(&self, declared: &'t TypeRef) -> Option<&'t TypeRef> {
        let mut current = declared;
        if ASYNC_WRAPPERS.iter().any(|w| current.is_named(w)) {
            if let Some(inner) = current.args().first() {
                current = inner;
            }
        }
        if RESULT_WRAPPERS.iter().any(|w| current.is_named(w)) {
            if let Some(inner) = current.args().first() {
                current = inner;
            }
        }

        match current {
            TypeRef::Void => None,
            TypeRef::Named { name, args } if args.is_empty() => {
                let simple = simple_name(name);
                if NO_PAYLOAD.contains(&simple)
                    || self
                        .catalog
                        .implements(name, &["IActionResult", "IHttpActionResult"])
                {
                    None
                } else {
                    Some(current)
                }
            }
            _ => Some(current),
        }
    }
}

/// Infers a verb from a case-insensitive method name prefix
pub fn verb_from_name(method_name: &str) -> Option<HttpVerb> {
    let lower = method_name.to_lowercase();
    VERB_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, verb)| *verb)
}

/// Builds the final route of an action
///
/// Placeholder constraints are dropped, a fragment starting with `~/` or `/` ignores
/// the controller prefix, and the `[controller]` and `[action]` tokens are substituted.
pub fn normalize_route(
    prefix: Option<&str>,
    fragment: &str,
    controller: &str,
    action: &str,
) -> String {
    let absolute = fragment
        .strip_prefix("~/")
        .or_else(|| fragment.strip_prefix('/'));
    let route = if let Some(absolute) = absolute {
        absolute.to_string()
    } else {
        let prefix = prefix.unwrap_or(DEFAULT_ROUTE_PREFIX).trim_end_matches('/');
        if prefix.is_empty() {
            fragment.to_string()
        } else {
            format!("{}/{}", prefix, fragment)
        }
    };

    CONSTRAINED_PLACEHOLDER
        .replace_all(&route, "{${1}${2}}")
        .replace("[controller]", controller)
        .replace("[action]", action)
}

/// Parses an `api/vX` or `api/vX.Y` segment
pub fn api_version(route: &str) -> Option<String> {
    API_VERSION
        .captures(route)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Maps each lower-cased placeholder name to whether it is optional
pub fn route_placeholders(route: &str) -> HashMap<String, bool> {
    PLACEHOLDER
        .captures_iter(route)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_lowercase();
            Some((name, c.get(2).is_some()))
        })
        .collect()
}

/// Requirement declared by an `Authorize` annotation; the policy wins over roles
pub fn authorization_requirement(annotations: &[Annotation]) -> Option<Authorization> {
    annotations.iter().find_map(|a| match a {
        Annotation::Authorize {
            policy: Some(policy),
            ..
        } => Some(Authorization::Policy(policy.clone())),
        Annotation::Authorize {
            roles: Some(roles), ..
        } => Some(Authorization::Roles(roles.clone())),
        Annotation::Authorize { .. } => Some(Authorization::Authenticated),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mvc::MvcAdapter;
    use crate::metadata::PropertyDescriptor;
    use crate::model::TypeIdentifier;

    fn catalog() -> TypeCatalog {
        let mut widget = TypeDefinition::class("MyApp.WidgetView");
        widget.properties = vec![PropertyDescriptor::new("Name", TypeRef::named("string"))];
        let mut controller = TypeDefinition::class("MyApp.ItemsController");
        controller.base_type = Some("Microsoft.AspNetCore.Mvc.ControllerBase".to_string());
        TypeCatalog::from_definitions(vec![widget, controller])
    }

    fn context(prefix: Option<&str>) -> ControllerContext {
        ControllerContext {
            name: "Items".to_string(),
            route_prefix: prefix.map(str::to_string),
            authorization: None,
        }
    }

    fn extract(
        catalog: &TypeCatalog,
        method: &MethodDescriptor,
        prefix: Option<&str>,
    ) -> Option<ActionNode> {
        let documentation = Documentation::new();
        let mut resolver = TypeResolver::new(catalog, &MvcAdapter, &documentation);
        let extractor = ActionExtractor::new(catalog, &MvcAdapter, &documentation);
        let definition = catalog.get("MyApp.ItemsController").unwrap();
        extractor.extract(&mut resolver, &context(prefix), definition, method)
    }

    fn method(name: &str, return_type: &str, annotations: Vec<Annotation>) -> MethodDescriptor {
        let mut method = MethodDescriptor::new(name, TypeRef::parse(return_type).unwrap());
        method.annotations = annotations;
        method
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route(Some("test"), "", "Test", "Get"), "test/");
        assert_eq!(
            normalize_route(Some("api/items/"), "{id:int}", "Items", "Get"),
            "api/items/{id}"
        );
        assert_eq!(normalize_route(Some("api/items"), "~/health", "Items", "Get"), "health");
        assert_eq!(normalize_route(Some("api/items"), "/health", "Items", "Get"), "health");
        assert_eq!(
            normalize_route(None, "[action]/{tag:alpha?}", "Items", "Find"),
            "Items/Find/{tag?}"
        );
        assert_eq!(normalize_route(Some("files"), "{**path}", "Files", "Get"), "files/{path}");
    }

    #[test]
    fn test_api_version() {
        assert_eq!(api_version("api/v2/items").as_deref(), Some("2"));
        assert_eq!(api_version("API/v1.5/items").as_deref(), Some("1.5"));
        assert_eq!(api_version("api/items"), None);
        assert_eq!(api_version("shop/api/v3").as_deref(), Some("3"));
        assert_eq!(api_version("webapi/v2/items"), None);
        assert_eq!(api_version("api/v2beta/items"), None);
    }

    #[test]
    fn test_verb_from_name() {
        assert_eq!(verb_from_name("GetAll"), Some(HttpVerb::Get));
        assert_eq!(verb_from_name("deleteItem"), Some(HttpVerb::Delete));
        assert_eq!(verb_from_name("Archive"), None);
    }

    #[test]
    fn test_path_parameter_requiredness_ignores_nullability() {
        let catalog = catalog();
        let mut m = method("Get", "void", vec![Annotation::HttpGet {
            template: Some("{id}/{tag?}".to_string()),
        }]);
        let mut id = ParameterDescriptor::new("id", TypeRef::parse("int?").unwrap());
        id.nullable = true;
        m.parameters = vec![id, ParameterDescriptor::new("tag", TypeRef::named("string"))];

        let action = extract(&catalog, &m, Some("items")).unwrap();
        assert_eq!(action.route, "items/{id}/{tag?}");
        assert_eq!(action.parameters[0].position, ParameterPosition::Path);
        assert!(action.parameters[0].is_required);
        assert_eq!(action.parameters[1].position, ParameterPosition::Path);
        assert!(!action.parameters[1].is_required);
    }

    #[test]
    fn test_parameter_binding_order() {
        let catalog = catalog();
        let mut m = method("Post", "void", vec![Annotation::HttpPost { template: None }]);
        let mut filter = ParameterDescriptor::new("filter", TypeRef::named("MyApp.WidgetView"));
        filter.annotations.push(Annotation::FromQuery);
        let mut page = ParameterDescriptor::new("page", TypeRef::named("int"));
        page.is_optional = true;
        m.parameters = vec![
            filter,
            ParameterDescriptor::new("widget", TypeRef::named("MyApp.WidgetView")),
            page,
            ParameterDescriptor::new("names", TypeRef::parse("List<string>").unwrap()),
        ];

        let action = extract(&catalog, &m, Some("items")).unwrap();
        let positions: Vec<_> = action
            .parameters
            .iter()
            .map(|p| (p.position, p.is_required))
            .collect();
        assert_eq!(
            positions,
            vec![
                (ParameterPosition::Query, true),
                (ParameterPosition::Body, true),
                (ParameterPosition::Query, false),
                (ParameterPosition::Query, true),
            ]
        );
    }

    #[test]
    fn test_body_parameter_marks_class_writable() {
        let catalog = catalog();
        let documentation = Documentation::new();
        let mut resolver = TypeResolver::new(&catalog, &MvcAdapter, &documentation);
        let extractor = ActionExtractor::new(&catalog, &MvcAdapter, &documentation);
        let definition = catalog.get("MyApp.ItemsController").unwrap();

        let mut m = method("Put", "void", vec![Annotation::HttpPut { template: None }]);
        m.parameters = vec![ParameterDescriptor::new("widget", TypeRef::named("MyApp.WidgetView"))];
        extractor
            .extract(&mut resolver, &context(None), definition, &m)
            .unwrap();

        assert!(!resolver.registry().by_name("Widget").unwrap().is_read_only);
    }

    #[test]
    fn test_return_unwrapping() {
        let catalog = catalog();
        let get = || vec![Annotation::HttpGet { template: None }];
        let bare = extract(&catalog, &method("Get", "MyApp.WidgetView", get()), None).unwrap();
        let wrapped = extract(
            &catalog,
            &method(
                "Get",
                "System.Threading.Tasks.Task<Microsoft.AspNetCore.Mvc.ActionResult<MyApp.WidgetView>>",
                get(),
            ),
            None,
        )
        .unwrap();
        assert_eq!(bare.return_node, wrapped.return_node);
        assert_eq!(
            bare.return_node.unwrap().type_node.identifier,
            TypeIdentifier::Object
        );

        for no_payload in [
            "void",
            "Microsoft.AspNetCore.Mvc.IActionResult",
            "System.Threading.Tasks.Task",
            "Task<IActionResult>",
            "Microsoft.AspNetCore.Mvc.OkResult",
        ] {
            let delete = vec![Annotation::HttpDelete { template: None }];
            let action = extract(&catalog, &method("Delete", no_payload, delete), None).unwrap();
            assert_eq!(action.return_node, None, "returning {}", no_payload);
        }
    }

    #[test]
    fn test_methods_without_route_or_verb_are_skipped() {
        let catalog = catalog();
        assert!(extract(&catalog, &method("GetAll", "void", vec![]), None).is_none());
        let route_only = vec![Annotation::Route {
            template: Some("archive".to_string()),
        }];
        assert!(extract(&catalog, &method("Archive", "void", route_only.clone()), None).is_none());
        let action = extract(&catalog, &method("GetArchive", "void", route_only), None).unwrap();
        assert_eq!(action.verb, HttpVerb::Get);
        assert_eq!(action.route, "Items/archive");
    }

    #[test]
    fn test_authorization() {
        let catalog = catalog();
        let m = method("Get", "void", vec![
            Annotation::HttpGet { template: None },
            Annotation::Authorize {
                policy: Some("Admin".to_string()),
                roles: Some("root".to_string()),
            },
        ]);
        let action = extract(&catalog, &m, None).unwrap();
        assert_eq!(action.authorization, Some(Authorization::Policy("Admin".to_string())));

        let documentation = Documentation::new();
        let mut resolver = TypeResolver::new(&catalog, &MvcAdapter, &documentation);
        let extractor = ActionExtractor::new(&catalog, &MvcAdapter, &documentation);
        let definition = catalog.get("MyApp.ItemsController").unwrap();
        let mut controller = context(None);
        controller.authorization = Some(Authorization::Roles("staff".to_string()));

        let inherited = method("Get", "void", vec![Annotation::HttpGet { template: None }]);
        let action = extractor.extract(&mut resolver, &controller, definition, &inherited).unwrap();
        assert_eq!(action.authorization, Some(Authorization::Roles("staff".to_string())));

        let anonymous = method(
            "Get",
            "void",
            vec![Annotation::HttpGet { template: None }, Annotation::AllowAnonymous],
        );
        let action = extractor.extract(&mut resolver, &controller, definition, &anonymous).unwrap();
        assert_eq!(action.authorization, None);
    }
}
