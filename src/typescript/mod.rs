//! TypeScript emission.
//!
//! [`TypeScriptWriter`] turns a finished [`AssemblyNode`] into TypeScript modules kept in
//! memory, keyed by module path without extension:
//!
//! - `split` layout: one module per controller (`user`, `order`, ...), `views` with the
//!   interfaces and const enums, `services` with the `createServices` factory, and
//!   `ko/views` with observable classes when knockout output is enabled
//! - `single` layout: everything in one `services` module
//!
//! Controllers are emitted in name order; classes in registry order.

mod knockout;

use crate::error::{Error, Result};
use crate::model::{
    ActionNode, ActionsGroupNode, AssemblyNode, ClassBody, ClassNode, ClassRegistry, ParameterNode,
    ParameterPosition, PropertyNode, TypeIdentifier, TypeModifier, TypeNode,
};
use crate::naming::to_camel_case;
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub(crate) const TAB: &str = "    ";

const GENERATED_HEADER: &str =
    "/* This is a generated file. Do not modify or all the changes will be lost. */";

/// Module names the split layout uses for its own modules
const RESERVED_MODULES: [&str; 3] = ["views", "services", "ko"];

static ROUTE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\??\}").unwrap());

/// How the generated code is split into modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleLayout {
    #[default]
    Split,
    Single,
}

/// How action parameters are passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterStyle {
    /// `get = (params: { id: number }) => ...`
    #[default]
    Object,
    /// `get = (id: number) => ...`, required parameters first
    Positional,
}

/// Emission options
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub layout: ModuleLayout,
    pub service_helpers_module: String,
    pub validation_module: String,
    pub parameter_style: ParameterStyle,
    /// Emit knockout observable classes for writable classes
    pub observable: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            layout: ModuleLayout::Split,
            service_helpers_module: "folke-service-helpers".to_string(),
            validation_module: "folke-ko-validation".to_string(),
            parameter_style: ParameterStyle::Object,
            observable: false,
        }
    }
}

/// Imports and helper functions a module turned out to need
#[derive(Debug, Default)]
pub(crate) struct Dependencies {
    pub views: bool,
    pub ko_views: bool,
    pub validation: bool,
    pub loading: bool,
    pub to_date: bool,
    pub from_date: bool,
    pub array_changed: bool,
    pub date_array_changed: bool,
}

/// How type names are spelled from inside the module being written
pub(crate) struct TypeContext<'m> {
    pub registry: &'m ClassRegistry,
    pub knockout: bool,
    pub views_prefix: &'static str,
    pub ko_prefix: &'static str,
    pub ko_suffix: &'static str,
}

impl<'m> TypeContext<'m> {
    /// Whether a class gets an observable wrapper class
    pub fn is_ko_class(&self, class: &ClassNode) -> bool {
        self.knockout
            && class.is_observable
            && !class.is_read_only
            && matches!(
                &class.body,
                ClassBody::Object(properties) if properties.iter().any(|p| !p.is_read_only)
            )
    }

    pub fn class_of(&self, node: &TypeNode) -> Result<&'m ClassNode> {
        let id = node.class_id()?.ok_or_else(|| Error::MissingClassReference {
            type_name: format!("{:?}", node.identifier),
        })?;
        self.registry.get(id).ok_or_else(|| Error::MissingClassReference {
            type_name: format!("#{}", id.0),
        })
    }

    /// Observable class name of a ko class, with the module prefix
    pub fn ko_name(&self, class: &ClassNode, deps: &mut Dependencies) -> String {
        if !self.ko_prefix.is_empty() {
            deps.ko_views = true;
        }
        format!("{}{}{}", self.ko_prefix, class.name, self.ko_suffix)
    }

    /// Writes a type. With `allow_observable`, dates are `Date` and writable classes
    /// use their observable wrapper.
    pub fn write_type(
        &self,
        node: &TypeNode,
        deps: &mut Dependencies,
        allow_observable: bool,
    ) -> Result<String> {
        let mut written = self.write_base_type(node, deps, allow_observable)?;

        for modifier in node.modifiers.iter().rev() {
            written = match modifier {
                TypeModifier::Array if written.contains(" | ") => format!("({})[]", written),
                TypeModifier::Array => format!("{}[]", written),
                TypeModifier::Dictionary => format!("{{ [key: string]: {} }}", written),
            };
        }

        if node.nullable {
            written.push_str(" | null");
        }
        Ok(written)
    }

    /// Writes the element type of a collection
    pub fn write_element_type(
        &self,
        node: &TypeNode,
        deps: &mut Dependencies,
        allow_observable: bool,
    ) -> Result<String> {
        let mut element = node.clone();
        if !element.modifiers.is_empty() {
            element.modifiers.remove(0);
        }
        element.nullable = false;
        self.write_type(&element, deps, allow_observable)
    }

    fn write_base_type(
        &self,
        node: &TypeNode,
        deps: &mut Dependencies,
        allow_observable: bool,
    ) -> Result<String> {
        let mut written = match node.identifier {
            TypeIdentifier::Boolean => "boolean".to_string(),
            TypeIdentifier::Int
            | TypeIdentifier::Long
            | TypeIdentifier::Float
            | TypeIdentifier::Double
            | TypeIdentifier::Decimal
            | TypeIdentifier::Byte => "number".to_string(),
            TypeIdentifier::String | TypeIdentifier::Guid | TypeIdentifier::TimeSpan => {
                "string".to_string()
            }
            TypeIdentifier::DateTime if allow_observable => "Date".to_string(),
            TypeIdentifier::DateTime => "string".to_string(),
            TypeIdentifier::Any => "any".to_string(),
            TypeIdentifier::GenericParameter => node
                .generic_name
                .clone()
                .unwrap_or_else(|| "any".to_string()),
            TypeIdentifier::Union => {
                let alternatives = node
                    .union
                    .iter()
                    .flatten()
                    .map(|alternative| self.write_type(alternative, deps, allow_observable))
                    .collect::<Result<Vec<_>>>()?;
                if alternatives.is_empty() {
                    "any".to_string()
                } else {
                    alternatives.join(" | ")
                }
            }
            TypeIdentifier::Object | TypeIdentifier::Enum => {
                let class = self.class_of(node)?;
                let observable = node.identifier == TypeIdentifier::Object
                    && allow_observable
                    && self.is_ko_class(class);
                if observable {
                    self.ko_name(class, deps)
                } else {
                    if !self.views_prefix.is_empty() {
                        deps.views = true;
                    }
                    format!("{}{}", self.views_prefix, class.name)
                }
            }
        };

        // Only object types take type arguments
        let arguments = match node.identifier {
            TypeIdentifier::Object => node.generic_arguments.as_ref(),
            _ => None,
        };
        if let Some(arguments) = arguments {
            let arguments = arguments
                .iter()
                .map(|argument| self.write_type(argument, deps, false))
                .collect::<Result<Vec<_>>>()?;
            written.push('<');
            written.push_str(&arguments.join(", "));
            written.push('>');
        }
        Ok(written)
    }
}

/// Appends `/** documentation */` on its own line
pub(crate) fn append_documentation(out: &mut String, indent: &str, documentation: Option<&str>) {
    if let Some(documentation) = documentation.filter(|d| !d.is_empty()) {
        out.push_str(indent);
        out.push_str("/** ");
        out.push_str(documentation);
        out.push_str(" */\n");
    }
}

pub(crate) fn generic_parameter_list(class: &ClassNode) -> String {
    match &class.generic_parameters {
        Some(parameters) if !parameters.is_empty() => format!("<{}>", parameters.join(", ")),
        _ => String::new(),
    }
}

/// TypeScript writer
pub struct TypeScriptWriter {
    options: GeneratorOptions,
    output_modules: IndexMap<String, String>,
}

impl TypeScriptWriter {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            output_modules: IndexMap::new(),
        }
    }

    /// Emitted modules keyed by path without extension (`views`, `ko/views`, `user`)
    pub fn output_modules(&self) -> &IndexMap<String, String> {
        &self.output_modules
    }

    pub fn into_output_modules(self) -> IndexMap<String, String> {
        self.output_modules
    }

    /// Writes every module of an assembly
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingClassReference`] if an Object or Enum type node has no
    /// registered class.
    pub fn write_assembly(&mut self, assembly: &AssemblyNode) -> Result<()> {
        let mut controllers: Vec<&ActionsGroupNode> = assembly.controllers.iter().collect();
        controllers.sort_by(|a, b| a.name.cmp(&b.name));

        match self.options.layout {
            ModuleLayout::Split => self.write_split(assembly, &controllers)?,
            ModuleLayout::Single => self.write_single(assembly, &controllers)?,
        }

        debug!("Emitted {} TypeScript modules", self.output_modules.len());
        Ok(())
    }

    fn write_split(
        &mut self,
        assembly: &AssemblyNode,
        controllers: &[&ActionsGroupNode],
    ) -> Result<()> {
        let registry = &assembly.types;
        let controller_context = TypeContext {
            registry,
            knockout: self.options.observable,
            views_prefix: "views.",
            ko_prefix: "koViews.",
            ko_suffix: "",
        };

        for controller in controllers {
            let mut deps = Dependencies::default();
            let body = self.write_controller(controller, &controller_context, &mut deps)?;

            let mut module = String::new();
            module.push_str(GENERATED_HEADER);
            module.push('\n');
            module.push_str(&format!(
                "import * as helpers from \"{}\";\n",
                self.options.service_helpers_module
            ));
            if deps.views {
                module.push_str("import * as views from \"./views\";\n");
            }
            if deps.ko_views {
                module.push_str("import * as koViews from \"./ko/views\";\n");
            }
            module.push('\n');
            module.push_str(&body);

            self.output_modules.insert(controller_module(controller), module);
        }

        let views_context = TypeContext {
            registry,
            knockout: false,
            views_prefix: "",
            ko_prefix: "",
            ko_suffix: "",
        };
        let mut deps = Dependencies::default();
        let mut views = String::new();
        for (_, class) in registry.iter() {
            write_type_definition(class, &views_context, &mut views, &mut deps)?;
        }
        self.output_modules.insert("views".to_string(), views);

        if self.options.observable {
            let ko_context = TypeContext {
                registry,
                knockout: true,
                views_prefix: "views.",
                ko_prefix: "",
                ko_suffix: "",
            };
            let mut deps = Dependencies::default();
            let mut body = String::new();
            for (_, class) in registry.iter().filter(|(_, c)| ko_context.is_ko_class(c)) {
                knockout::write_ko_class(class, &ko_context, &mut body, &mut deps)?;
            }

            let mut module = String::new();
            module.push_str(GENERATED_HEADER);
            module.push('\n');
            module.push_str("import * as ko from \"knockout\";\n");
            module.push_str("import * as views from \"../views\";\n");
            module.push_str(&self.knockout_imports(&deps));
            module.push_str(&knockout::helper_functions(&deps));
            module.push_str(&body);
            self.output_modules.insert("ko/views".to_string(), module);
        }

        let mut services = String::new();
        services.push_str(GENERATED_HEADER);
        services.push('\n');
        services.push_str(&format!(
            "import * as helpers from \"{}\";\n",
            self.options.service_helpers_module
        ));
        for controller in controllers {
            services.push_str(&format!(
                "import * as {}Group from \"./{}\";\n",
                to_camel_case(&controller.name),
                controller_module(controller)
            ));
        }
        services.push_str("export * from \"./views\";\n");
        services.push('\n');
        services.push_str(&self.services_factory(controllers, true));
        self.output_modules.insert("services".to_string(), services);

        Ok(())
    }

    fn write_single(
        &mut self,
        assembly: &AssemblyNode,
        controllers: &[&ActionsGroupNode],
    ) -> Result<()> {
        let registry = &assembly.types;
        let context = TypeContext {
            registry,
            knockout: self.options.observable,
            views_prefix: "",
            ko_prefix: "",
            ko_suffix: "Observable",
        };

        let mut deps = Dependencies::default();
        let mut body = String::new();
        for (_, class) in registry.iter() {
            write_type_definition(class, &context, &mut body, &mut deps)?;
        }
        for (_, class) in registry.iter().filter(|(_, c)| context.is_ko_class(c)) {
            knockout::write_ko_class(class, &context, &mut body, &mut deps)?;
        }
        body.push('\n');
        for controller in controllers {
            body.push_str(&self.write_controller(controller, &context, &mut deps)?);
        }
        body.push_str(&self.services_factory(controllers, false));

        let mut module = String::new();
        module.push_str(GENERATED_HEADER);
        module.push('\n');
        module.push_str(&format!(
            "import * as helpers from \"{}\";\n",
            self.options.service_helpers_module
        ));
        if self.options.observable && registry.iter().any(|(_, c)| context.is_ko_class(c)) {
            module.push_str("import * as ko from \"knockout\";\n");
            module.push_str(&self.knockout_imports(&deps));
            module.push_str(&knockout::helper_functions(&deps));
        }
        module.push_str(&body);
        self.output_modules.insert("services".to_string(), module);
        Ok(())
    }

    fn knockout_imports(&self, deps: &Dependencies) -> String {
        let mut imports = String::new();
        if deps.validation {
            imports.push_str(&format!(
                "import * as validation from \"{}\";\n",
                self.options.validation_module
            ));
        }
        if deps.loading {
            imports.push_str(&format!(
                "import {{ loading }} from \"{}\";\n",
                self.options.service_helpers_module
            ));
        }
        imports
    }

    fn services_factory(&self, controllers: &[&ActionsGroupNode], grouped: bool) -> String {
        let mut out = String::new();
        out.push_str("export function createServices(client: helpers.ApiClient) {\n");
        out.push_str(&format!("{}return {{\n", TAB));
        for controller in controllers {
            let module = to_camel_case(&controller.name);
            let class = if grouped {
                format!("{}Group.{}Controller", module, controller.name)
            } else {
                format!("{}Controller", controller.name)
            };
            out.push_str(&format!("{}{}{}: new {}(client),\n", TAB, TAB, module, class));
        }
        out.push_str(&format!("{}}};\n", TAB));
        out.push_str("}\n");
        out
    }

    fn write_controller(
        &self,
        controller: &ActionsGroupNode,
        context: &TypeContext,
        deps: &mut Dependencies,
    ) -> Result<String> {
        let mut out = String::new();
        append_documentation(&mut out, "", controller.documentation.as_deref());
        out.push_str(&format!("export class {}Controller {{\n", controller.name));
        out.push_str(&format!("{}constructor(private client: helpers.ApiClient) {{}}\n", TAB));

        for (name, action) in controller.unique_action_names() {
            out.push('\n');
            self.write_action(&to_camel_case(&name), action, context, deps, &mut out)?;
        }

        out.push_str("}\n\n");
        Ok(out)
    }

    fn write_action(
        &self,
        method_name: &str,
        action: &ActionNode,
        context: &TypeContext,
        deps: &mut Dependencies,
        out: &mut String,
    ) -> Result<()> {
        write_action_documentation(action, out);

        let positional = self.options.parameter_style == ParameterStyle::Positional;
        let reference = |parameter: &ParameterNode| {
            if positional {
                parameter.name.clone()
            } else {
                format!("params.{}", parameter.name)
            }
        };

        // Signature
        let mut ordered: Vec<&ParameterNode> = action.parameters.iter().collect();
        if positional {
            ordered.sort_by_key(|p| !p.is_required);
        }
        let mut declarations = Vec::with_capacity(ordered.len());
        for parameter in &ordered {
            let ty = context.write_type(&parameter.type_node, deps, context.knockout)?;
            let marker = if parameter.is_required { "" } else { "?" };
            declarations.push(format!("{}{}: {}", parameter.name, marker, ty));
        }
        let signature = if declarations.is_empty() {
            String::new()
        } else if positional {
            declarations.join(", ")
        } else {
            format!("params: {{ {} }}", declarations.join(", "))
        };

        // URL
        let has_path = action.parameters.iter().any(|p| p.position == ParameterPosition::Path);
        let mut url = if has_path {
            let interpolated = ROUTE_PLACEHOLDER.replace_all(&action.route, |captures: &Captures| {
                let placeholder = &captures[1];
                let target = action
                    .parameters
                    .iter()
                    .find(|p| {
                        p.position == ParameterPosition::Path
                            && p.name.eq_ignore_ascii_case(placeholder)
                    })
                    .map(|p| reference(p))
                    .unwrap_or_else(|| reference_name(placeholder, positional));
                format!("${{{}}}", target)
            });
            format!("`{}`", interpolated)
        } else {
            format!("\"{}\"", action.route)
        };

        let query: Vec<String> = action
            .parameters
            .iter()
            .filter(|p| p.position == ParameterPosition::Query)
            .map(|p| {
                let value = reference(p);
                let date = p.type_node.identifier == TypeIdentifier::DateTime
                    && p.type_node.modifiers.is_empty();
                if context.knockout && date {
                    format!("{}: {} && {}.toISOString()", p.name, value, value)
                } else {
                    format!("{}: {}", p.name, value)
                }
            })
            .collect();
        if !query.is_empty() {
            url.push_str(&format!(" + helpers.getQueryString({{ {} }})", query.join(", ")));
        }

        // Body
        let body = match action.parameters.iter().find(|p| p.position == ParameterPosition::Body) {
            Some(parameter) => {
                let value = reference(parameter);
                let observable = parameter.type_node.identifier == TypeIdentifier::Object
                    && context.is_ko_class(context.class_of(&parameter.type_node)?);
                if observable && parameter.type_node.is_collection() {
                    format!("JSON.stringify({}.map(x => x.toJs()))", value)
                } else if observable && parameter.type_node.modifiers.is_empty() {
                    format!("JSON.stringify({}.toJs())", value)
                } else {
                    format!("JSON.stringify({})", value)
                }
            }
            None => "undefined".to_string(),
        };

        // Call
        let call = match &action.return_node {
            None => format!("this.client.fetch({}, \"{}\", {})", url, action.verb.as_str(), body),
            Some(returned) => {
                let ty = context.write_type(&returned.type_node, deps, false)?;
                let mut call = format!(
                    "this.client.fetchJson<{}>({}, \"{}\", {})",
                    ty,
                    url,
                    action.verb.as_str(),
                    body
                );
                let node = &returned.type_node;
                if node.identifier == TypeIdentifier::Object
                    && context.is_ko_class(context.class_of(node)?)
                {
                    let class = context.ko_name(context.class_of(node)?, deps);
                    if node.modifiers.is_empty() {
                        call.push_str(&format!(".then(view => new {}(view))", class));
                    } else if node.modifiers == [TypeModifier::Array] {
                        call.push_str(&format!(
                            ".then(list => list.map(view => new {}(view)))",
                            class
                        ));
                    }
                }
                call
            }
        };

        out.push_str(&format!("{}{} = ({}) => {{\n", TAB, method_name, signature));
        out.push_str(&format!("{}{}return {};\n", TAB, TAB, call));
        out.push_str(&format!("{}}}\n", TAB));
        Ok(())
    }
}

/// Module holding a controller in the split layout. A controller named like one of the
/// generated modules gets a `Controller` suffix.
fn controller_module(controller: &ActionsGroupNode) -> String {
    let module = to_camel_case(&controller.name);
    if RESERVED_MODULES.contains(&module.as_str()) {
        format!("{}Controller", module)
    } else {
        module
    }
}

fn reference_name(name: &str, positional: bool) -> String {
    if positional {
        name.to_string()
    } else {
        format!("params.{}", name)
    }
}

fn write_action_documentation(action: &ActionNode, out: &mut String) {
    let mut lines = Vec::new();
    if let Some(summary) = &action.documentation {
        lines.push(summary.clone());
    }
    for parameter in &action.parameters {
        if let Some(documentation) = &parameter.documentation {
            lines.push(format!("@param {} {}", parameter.name, documentation));
        }
    }
    let returns = action
        .return_node
        .as_ref()
        .and_then(|r| r.documentation.as_ref());
    if let Some(documentation) = returns {
        lines.push(format!("@returns {}", documentation));
    }
    if lines.is_empty() {
        return;
    }

    out.push_str(&format!("{}/**\n", TAB));
    for line in lines {
        out.push_str(&format!("{} * {}\n", TAB, line));
    }
    out.push_str(&format!("{} */\n", TAB));
}

/// Writes an interface or a const enum
fn write_type_definition(
    class: &ClassNode,
    context: &TypeContext,
    out: &mut String,
    deps: &mut Dependencies,
) -> Result<()> {
    out.push('\n');
    append_documentation(out, "", class.documentation.as_deref());

    match &class.body {
        ClassBody::Object(properties) => {
            out.push_str(&format!(
                "export interface {}{} {{\n",
                class.name,
                generic_parameter_list(class)
            ));
            for (i, property) in properties.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                write_property(property, context, out, deps)?;
            }
            out.push_str("}\n");
        }
        ClassBody::Enum(values) => {
            out.push_str(&format!("export const enum {} {{\n", class.name));
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n\n");
                }
                append_documentation(out, TAB, value.documentation.as_deref());
                out.push_str(&format!("{}{} = {}", TAB, value.name, value.value));
            }
            out.push_str("\n}\n");
        }
    }
    Ok(())
}

fn write_property(
    property: &PropertyNode,
    context: &TypeContext,
    out: &mut String,
    deps: &mut Dependencies,
) -> Result<()> {
    append_documentation(out, TAB, property.documentation.as_deref());
    let marker = if property.type_node.optional { "?" } else { "" };
    let ty = context.write_type(&property.type_node, deps, false)?;
    out.push_str(&format!("{}{}{}: {};\n", TAB, property.name, marker, ty));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ClassId, Constraints, EnumValueNode, HttpVerb, ParameterNode, ReturnNode,
    };
    use pretty_assertions::assert_eq;

    fn primitive(identifier: TypeIdentifier) -> TypeNode {
        TypeNode::new(identifier)
    }

    fn int() -> TypeNode {
        primitive(TypeIdentifier::Int)
    }

    fn with_modifiers(mut node: TypeNode, modifiers: &[TypeModifier]) -> TypeNode {
        node.modifiers = modifiers.to_vec();
        node
    }

    fn object(class: ClassId) -> TypeNode {
        let mut node = TypeNode::new(TypeIdentifier::Object);
        node.class = Some(class);
        node
    }

    fn property(name: &str, type_node: TypeNode) -> PropertyNode {
        PropertyNode {
            name: name.to_string(),
            type_node,
            documentation: None,
            is_read_only: false,
            constraints: Constraints::default(),
        }
    }

    fn parameter(
        name: &str,
        type_node: TypeNode,
        position: ParameterPosition,
        is_required: bool,
    ) -> ParameterNode {
        ParameterNode {
            name: name.to_string(),
            type_node,
            is_required,
            position,
            documentation: None,
            constraints: Constraints::default(),
        }
    }

    fn action(
        name: &str,
        verb: HttpVerb,
        route: &str,
        parameters: Vec<ParameterNode>,
        returns: Option<TypeNode>,
    ) -> ActionNode {
        ActionNode {
            name: name.to_string(),
            verb,
            route: route.to_string(),
            version: None,
            authorization: None,
            documentation: None,
            parameters,
            return_node: returns.map(|type_node| ReturnNode {
                type_node,
                documentation: None,
            }),
            controller: "Items".to_string(),
        }
    }

    fn context(registry: &ClassRegistry) -> TypeContext<'_> {
        TypeContext {
            registry,
            knockout: false,
            views_prefix: "views.",
            ko_prefix: "koViews.",
            ko_suffix: "",
        }
    }

    fn item_assembly() -> (AssemblyNode, ClassId) {
        let mut assembly = AssemblyNode::default();
        let item = assembly
            .types
            .register(ClassNode::object("Item".to_string(), "MyApp.ItemView".to_string()));
        let name = property("name", primitive(TypeIdentifier::String));
        assembly.types[item].body = ClassBody::Object(vec![name]);
        (assembly, item)
    }

    #[test]
    fn test_type_mapping() {
        let registry = ClassRegistry::new();
        let ctx = context(&registry);
        let mut deps = Dependencies::default();

        let cases = vec![
            (primitive(TypeIdentifier::Boolean), "boolean"),
            (primitive(TypeIdentifier::Decimal), "number"),
            (primitive(TypeIdentifier::Guid), "string"),
            (primitive(TypeIdentifier::DateTime), "string"),
            (primitive(TypeIdentifier::Any), "any"),
            (with_modifiers(primitive(TypeIdentifier::Int), &[TypeModifier::Array]), "number[]"),
            (
                with_modifiers(int(), &[TypeModifier::Dictionary, TypeModifier::Array]),
                "{ [key: string]: number[] }",
            ),
            (
                with_modifiers(int(), &[TypeModifier::Array, TypeModifier::Dictionary]),
                "{ [key: string]: number }[]",
            ),
        ];
        for (node, expected) in cases {
            assert_eq!(ctx.write_type(&node, &mut deps, false).unwrap(), expected);
        }

        let mut nullable = primitive(TypeIdentifier::Int);
        nullable.nullable = true;
        assert_eq!(ctx.write_type(&nullable, &mut deps, false).unwrap(), "number | null");

        let mut union = with_modifiers(primitive(TypeIdentifier::Union), &[TypeModifier::Array]);
        union.union = Some(vec![primitive(TypeIdentifier::String), primitive(TypeIdentifier::Int)]);
        assert_eq!(ctx.write_type(&union, &mut deps, false).unwrap(), "(string | number)[]");

        let mut generic = primitive(TypeIdentifier::GenericParameter);
        generic.generic_name = Some("T".to_string());
        assert_eq!(ctx.write_type(&generic, &mut deps, false).unwrap(), "T");
    }

    #[test]
    fn test_missing_class_reference_is_an_error() {
        let registry = ClassRegistry::new();
        let ctx = context(&registry);
        let mut deps = Dependencies::default();
        let dangling = primitive(TypeIdentifier::Object);
        assert!(matches!(
            ctx.write_type(&dangling, &mut deps, false),
            Err(Error::MissingClassReference { .. })
        ));
        assert!(ctx.write_type(&object(ClassId(3)), &mut deps, false).is_err());
    }

    #[test]
    fn test_enum_definition() {
        let mut registry = ClassRegistry::new();
        let mut role = ClassNode::enumeration(
            "Role".to_string(),
            "MyApp.Role".to_string(),
            vec![
                EnumValueNode {
                    name: "User".to_string(),
                    value: 0,
                    documentation: None,
                },
                EnumValueNode {
                    name: "Admin".to_string(),
                    value: 1,
                    documentation: Some("Full access".to_string()),
                },
            ],
        );
        role.documentation = Some("A role".to_string());
        let id = registry.register(role);

        let mut out = String::new();
        let mut deps = Dependencies::default();
        write_type_definition(&registry[id], &context(&registry), &mut out, &mut deps).unwrap();
        assert_eq!(
            out,
            "\n/** A role */\nexport const enum Role {\n    User = 0,\n\n    /** Full access */\n    Admin = 1\n}\n"
        );
    }

    #[test]
    fn test_action_with_path_query_and_body() {
        let (mut assembly, item) = item_assembly();
        let mut group = ActionsGroupNode::new("Items".to_string());
        group.actions.push(action(
            "Update",
            HttpVerb::Put,
            "api/items/{id}",
            vec![
                parameter("id", primitive(TypeIdentifier::Int), ParameterPosition::Path, true),
                parameter(
                    "force",
                    primitive(TypeIdentifier::Boolean),
                    ParameterPosition::Query,
                    false,
                ),
                parameter("item", object(item), ParameterPosition::Body, true),
            ],
            None,
        ));
        assembly.controllers.push(group);

        let mut writer = TypeScriptWriter::new(GeneratorOptions::default());
        writer.write_assembly(&assembly).unwrap();
        assert_eq!(
            writer.output_modules()["items"],
            "/* This is a generated file. Do not modify or all the changes will be lost. */
import * as helpers from \"folke-service-helpers\";
import * as views from \"./views\";

export class ItemsController {
    constructor(private client: helpers.ApiClient) {}

    update = (params: { id: number, force?: boolean, item: views.Item }) => {
        return this.client.fetch(`api/items/${params.id}` + helpers.getQueryString({ force: params.force }), \"PUT\", JSON.stringify(params.item));
    }
}

"
        );
    }

    #[test]
    fn test_positional_parameters_put_required_first() {
        let (mut assembly, _) = item_assembly();
        let mut group = ActionsGroupNode::new("Items".to_string());
        group.actions.push(action(
            "Find",
            HttpVerb::Get,
            "items/{tag?}",
            vec![
                parameter("tag", primitive(TypeIdentifier::String), ParameterPosition::Path, false),
                parameter("page", primitive(TypeIdentifier::Int), ParameterPosition::Query, true),
            ],
            Some(with_modifiers(primitive(TypeIdentifier::String), &[TypeModifier::Array])),
        ));
        assembly.controllers.push(group);

        let options = GeneratorOptions {
            parameter_style: ParameterStyle::Positional,
            ..GeneratorOptions::default()
        };
        let mut writer = TypeScriptWriter::new(options);
        writer.write_assembly(&assembly).unwrap();
        let module = &writer.output_modules()["items"];
        assert!(module.contains("    find = (page: number, tag?: string) => {\n"));
        assert!(module.contains(
            "return this.client.fetchJson<string[]>(`items/${tag}` + helpers.getQueryString({ page: page }), \"GET\", undefined);"
        ));
        assert!(!module.contains("import * as views"));
    }

    #[test]
    fn test_overloads_and_documentation() {
        let (mut assembly, _) = item_assembly();
        let mut group = ActionsGroupNode::new("Items".to_string());
        let mut documented = action(
            "Get",
            HttpVerb::Get,
            "items/{id}",
            vec![parameter("id", primitive(TypeIdentifier::Int), ParameterPosition::Path, true)],
            None,
        );
        documented.documentation = Some("Gets one item".to_string());
        documented.parameters[0].documentation = Some("The id".to_string());
        group.actions.push(documented);
        group.actions.push(action("Get", HttpVerb::Get, "items", vec![], None));
        assembly.controllers.push(group);

        let mut writer = TypeScriptWriter::new(GeneratorOptions::default());
        writer.write_assembly(&assembly).unwrap();
        let module = &writer.output_modules()["items"];
        assert!(module.contains("    get1 = () => {\n"));
        assert!(module.contains(
            "    /**\n     * Gets one item\n     * @param id The id\n     */\n    get2 = (params: { id: number }) => {\n"
        ));
    }

    #[test]
    fn test_services_index() {
        let (mut assembly, _) = item_assembly();
        assembly.controllers.push({
            let mut group = ActionsGroupNode::new("Users".to_string());
            group.actions.push(action("Get", HttpVerb::Get, "users", vec![], None));
            group
        });
        assembly.controllers.push({
            let mut group = ActionsGroupNode::new("Items".to_string());
            group.actions.push(action("Get", HttpVerb::Get, "items", vec![], None));
            group
        });

        let mut writer = TypeScriptWriter::new(GeneratorOptions::default());
        writer.write_assembly(&assembly).unwrap();
        assert_eq!(
            writer.output_modules()["services"],
            "/* This is a generated file. Do not modify or all the changes will be lost. */
import * as helpers from \"folke-service-helpers\";
import * as itemsGroup from \"./items\";
import * as usersGroup from \"./users\";
export * from \"./views\";

export function createServices(client: helpers.ApiClient) {
    return {
        items: new itemsGroup.ItemsController(client),
        users: new usersGroup.UsersController(client),
    };
}
"
        );
        let keys: Vec<_> = writer.output_modules().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["items", "users", "views", "services"]);
    }

    #[test]
    fn test_controller_named_like_generated_module() {
        let (mut assembly, _) = item_assembly();
        assembly.controllers.push({
            let mut group = ActionsGroupNode::new("Views".to_string());
            group.actions.push(action("Get", HttpVerb::Get, "views", vec![], None));
            group
        });

        let mut writer = TypeScriptWriter::new(GeneratorOptions::default());
        writer.write_assembly(&assembly).unwrap();
        let keys: Vec<_> = writer.output_modules().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["viewsController", "views", "services"]);
        let controller = &writer.output_modules()["viewsController"];
        assert!(controller.contains("export class ViewsController {\n"));
        assert!(writer.output_modules()["views"].contains("export interface Item {\n"));

        let services = &writer.output_modules()["services"];
        assert!(services.contains("import * as viewsGroup from \"./viewsController\";\n"));
        assert!(services.contains("        views: new viewsGroup.ViewsController(client),\n"));
    }

    #[test]
    fn test_any_ignores_type_arguments() {
        let registry = ClassRegistry::new();
        let mut node = primitive(TypeIdentifier::Any);
        node.generic_arguments = Some(vec![primitive(TypeIdentifier::String), int()]);
        let written = context(&registry)
            .write_type(&node, &mut Dependencies::default(), false)
            .unwrap();
        assert_eq!(written, "any");
    }

    #[test]
    fn test_single_layout() {
        let (mut assembly, item) = item_assembly();
        let mut group = ActionsGroupNode::new("Items".to_string());
        group
            .actions
            .push(action("Get", HttpVerb::Get, "items", vec![], Some(object(item))));
        assembly.controllers.push(group);

        let options = GeneratorOptions {
            layout: ModuleLayout::Single,
            ..GeneratorOptions::default()
        };
        let mut writer = TypeScriptWriter::new(options);
        writer.write_assembly(&assembly).unwrap();
        assert_eq!(writer.output_modules().len(), 1);
        let module = &writer.output_modules()["services"];
        assert!(module.contains("export interface Item {\n    name: string;\n}\n"));
        assert!(
            module.contains("return this.client.fetchJson<Item>(\"items\", \"GET\", undefined);")
        );
        assert!(module.contains("        items: new ItemsController(client),\n"));
        assert!(!module.contains("views."));
    }
}
