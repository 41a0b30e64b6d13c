//! Knockout observable classes.
//!
//! Every writable, observable object class gets a wrapper class holding one observable
//! per writable property, a `changed` computed against the last loaded data, `toJs`
//! and `load` conversions, and an `isValid` computed when any property carries
//! validation constraints.

use super::{append_documentation, generic_parameter_list, Dependencies, TypeContext, TAB};
use crate::error::Result;
use crate::model::{ClassNode, Format, PropertyNode, TypeIdentifier, TypeModifier, TypeNode};

/// Shape of a property as far as observables are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Scalar,
    Collection,
    Other,
}

fn shape(node: &TypeNode) -> Shape {
    match node.modifiers.as_slice() {
        [] => Shape::Scalar,
        [TypeModifier::Array] => Shape::Collection,
        _ => Shape::Other,
    }
}

/// A property after classification
struct Member<'p> {
    property: &'p PropertyNode,
    shape: Shape,
    date: bool,
    /// Observable wrapper name when the value is a ko class
    ko_class: Option<String>,
}

impl<'p> Member<'p> {
    fn new(
        property: &'p PropertyNode,
        context: &TypeContext,
        deps: &mut Dependencies,
    ) -> Result<Self> {
        let node = &property.type_node;
        let shape = shape(node);
        let ko_class = if shape != Shape::Other && node.identifier == TypeIdentifier::Object {
            let class = context.class_of(node)?;
            if context.is_ko_class(class) {
                Some(context.ko_name(class, deps))
            } else {
                None
            }
        } else {
            None
        };
        Ok(Self {
            property,
            shape,
            date: shape != Shape::Other && node.identifier == TypeIdentifier::DateTime,
            ko_class,
        })
    }

    fn name(&self) -> &str {
        &self.property.name
    }

    fn is_observable(&self) -> bool {
        !self.property.is_read_only
    }

    fn is_validated(&self) -> bool {
        self.is_observable() && self.shape == Shape::Scalar && !self.property.constraints.is_empty()
    }
}

pub(super) fn write_ko_class(
    class: &ClassNode,
    context: &TypeContext,
    out: &mut String,
    deps: &mut Dependencies,
) -> Result<()> {
    let name = format!("{}{}{}", context.ko_prefix, class.name, context.ko_suffix);
    let generics = generic_parameter_list(class);
    let data_type = format!("{}{}{}", context.views_prefix, class.name, generics);

    let members = class
        .properties()
        .iter()
        .map(|property| Member::new(property, context, deps))
        .collect::<Result<Vec<_>>>()?;

    out.push('\n');
    append_documentation(out, "", class.documentation.as_deref());
    out.push_str(&format!("export class {}{} {{\n", name, generics));
    out.push_str(&format!("{}originalData: {};\n", TAB, data_type));
    out.push_str(&format!("{}changed: KnockoutComputed<boolean>;\n", TAB));

    for member in &members {
        out.push('\n');
        append_documentation(out, TAB, member.property.documentation.as_deref());
        out.push_str(&format!("{}{}\n", TAB, field(member, context, deps)?));
    }

    // constructor
    let changes: Vec<String> = members
        .iter()
        .filter(|m| m.is_observable())
        .map(|m| change_expression(m, deps))
        .collect();
    let changed = if changes.is_empty() {
        "false".to_string()
    } else {
        changes.join(&format!(" ||\n{}{}{}", TAB, TAB, TAB))
    };
    out.push_str(&format!("\n{}constructor(data: {}) {{\n", TAB, data_type));
    out.push_str(&format!("{}{}this.load(data);\n", TAB, TAB));
    out.push_str(&format!("{}{}this.changed = ko.pureComputed(() =>\n", TAB, TAB));
    out.push_str(&format!("{}{}{}{}\n", TAB, TAB, TAB, changed));
    out.push_str(&format!("{}{});\n", TAB, TAB));
    out.push_str(&format!("{}}}\n", TAB));

    // toJs
    out.push_str(&format!("\n{}public toJs(): {} {{\n", TAB, data_type));
    out.push_str(&format!("{}{}return {{\n", TAB, TAB));
    for member in &members {
        out.push_str(&format!(
            "{}{}{}{}: {},\n",
            TAB,
            TAB,
            TAB,
            member.name(),
            to_js_expression(member, deps)
        ));
    }
    out.push_str(&format!("{}{}}};\n", TAB, TAB));
    out.push_str(&format!("{}}}\n", TAB));

    // load
    out.push_str(&format!("\n{}public load(data: {}) {{\n", TAB, data_type));
    out.push_str(&format!("{}{}this.originalData = data;\n", TAB, TAB));
    for member in &members {
        out.push_str(&format!("{}{}{}\n", TAB, TAB, load_statement(member, deps)));
    }
    out.push_str(&format!("{}}}\n", TAB));

    let validated: Vec<&Member> = members.iter().filter(|m| m.is_validated()).collect();
    if !validated.is_empty() {
        deps.loading = true;
        let mut condition = "!loading()".to_string();
        for member in validated {
            condition.push_str(&format!(
                " && !this.{0}.validating() && !this.{0}.errorMessage()",
                member.name()
            ));
        }
        out.push_str(&format!(
            "\n{}public isValid = ko.pureComputed(() => {});\n",
            TAB, condition
        ));
    }

    out.push_str("}\n");
    Ok(())
}

fn field(member: &Member, context: &TypeContext, deps: &mut Dependencies) -> Result<String> {
    let node = &member.property.type_node;
    if !member.is_observable() {
        let ty = context.write_type(node, deps, false)?;
        return Ok(format!("{}: {};", member.name(), ty));
    }

    match member.shape {
        Shape::Collection => {
            let element = context.write_element_type(node, deps, true)?;
            Ok(format!("{} = ko.observableArray<{}>();", member.name(), element))
        }
        Shape::Scalar if member.is_validated() => {
            let ty = context.write_type(node, deps, true)?;
            deps.validation = true;
            Ok(format!(
                "{} = validation.validableObservable<{}>(){};",
                member.name(),
                ty,
                validators(member.property)
            ))
        }
        Shape::Scalar => {
            let ty = context.write_type(node, deps, true)?;
            Ok(format!("{} = ko.observable<{}>();", member.name(), ty))
        }
        Shape::Other => {
            let ty = context.write_type(node, deps, false)?;
            Ok(format!("{} = ko.observable<{}>();", member.name(), ty))
        }
    }
}

fn validators(property: &PropertyNode) -> String {
    let constraints = &property.constraints;
    let mut chain = Vec::new();
    if constraints.required {
        chain.push("validation.isRequired".to_string());
    }
    if let Some(other) = &constraints.compare {
        chain.push(format!("validation.areSame(this.{})", other));
    }
    if let Some(length) = constraints.min_length {
        chain.push(format!("validation.hasMinLength({})", length));
    }
    if let Some(length) = constraints.max_length {
        chain.push(format!("validation.hasMaxLength({})", length));
    }
    if constraints.format == Format::Email {
        chain.push("validation.isEmail".to_string());
    }
    match (constraints.minimum, constraints.maximum) {
        (Some(minimum), Some(maximum)) => {
            chain.push(format!("validation.isInRange({}, {})", minimum, maximum))
        }
        (None, Some(maximum)) => chain.push(format!("validation.isAtMost({})", maximum)),
        (Some(minimum), None) => chain.push(format!("validation.isAtLeast({})", minimum)),
        (None, None) => {}
    }
    chain
        .into_iter()
        .map(|validator| format!(".addValidator({})", validator))
        .collect()
}

fn change_expression(member: &Member, deps: &mut Dependencies) -> String {
    let name = member.name();
    match (member.shape, &member.ko_class, member.date) {
        (Shape::Collection, Some(_), _) => format!(
            "(this.{0}() != undefined \
             && (this.{0}().length !== (this.originalData.{0} || []).length \
             || this.{0}().some(x => x.changed())))",
            name
        ),
        (Shape::Collection, None, true) => {
            deps.date_array_changed = true;
            format!("dateArrayChanged(this.{0}, this.originalData.{0})", name)
        }
        (Shape::Collection, None, false) => {
            deps.array_changed = true;
            format!("arrayChanged(this.{0}, this.originalData.{0})", name)
        }
        (Shape::Scalar, Some(_), _) => {
            format!("(this.{0}() != undefined && this.{0}().changed())", name)
        }
        (Shape::Scalar, None, true) => {
            deps.from_date = true;
            format!("fromDate(this.{0}()) !== this.originalData.{0}", name)
        }
        _ => format!("this.{0}() !== this.originalData.{0}", name),
    }
}

fn to_js_expression(member: &Member, deps: &mut Dependencies) -> String {
    let name = member.name();
    if !member.is_observable() {
        return format!("this.{}", name);
    }
    match (member.shape, &member.ko_class, member.date) {
        (Shape::Scalar, Some(_), _) => {
            format!("this.{0}() ? this.{0}().toJs() : undefined", name)
        }
        (Shape::Scalar, None, true) => {
            deps.from_date = true;
            format!("fromDate(this.{}())", name)
        }
        (Shape::Collection, Some(_), _) => {
            format!("this.{0}() ? this.{0}().map(x => x.toJs()) : undefined", name)
        }
        (Shape::Collection, None, true) => {
            format!("this.{0}() && this.{0}().map(x => x.toISOString())", name)
        }
        _ => format!("this.{}()", name),
    }
}

fn load_statement(member: &Member, deps: &mut Dependencies) -> String {
    let name = member.name();
    if !member.is_observable() {
        return format!("this.{0} = data.{0};", name);
    }
    match (member.shape, &member.ko_class, member.date) {
        (Shape::Scalar, Some(class), _) => {
            format!("this.{0}(data.{0} ? new {1}(data.{0}) : undefined);", name, class)
        }
        (Shape::Scalar, None, true) => {
            deps.to_date = true;
            format!("this.{0}(toDate(data.{0}));", name)
        }
        (Shape::Collection, Some(class), _) => format!(
            "this.{0}(data.{0} ? data.{0}.map(x => new {1}(x)) : []);",
            name, class
        ),
        (Shape::Collection, None, true) => {
            format!("this.{0}(data.{0} ? data.{0}.map(x => new Date(x)) : []);", name)
        }
        (Shape::Collection, None, false) => format!("this.{0}(data.{0} || []);", name),
        _ => format!("this.{0}(data.{0});", name),
    }
}

/// Module-level helpers referenced by the emitted classes
pub(super) fn helper_functions(deps: &Dependencies) -> String {
    let mut out = String::new();
    if deps.to_date {
        out.push_str("\nfunction toDate(value: string | undefined) {\n");
        out.push_str(&format!("{}return value ? new Date(value) : undefined;\n", TAB));
        out.push_str("}\n");
    }
    if deps.from_date {
        out.push_str("\nfunction fromDate(value: Date | undefined) {\n");
        out.push_str(&format!("{}return value ? value.toISOString() : undefined;\n", TAB));
        out.push_str("}\n");
    }
    if deps.array_changed {
        out.push_str(
            "\nfunction arrayChanged<T>(array: KnockoutObservableArray<T>, original: T[] | undefined) {\n",
        );
        out.push_str(&format!("{}const values = array();\n", TAB));
        out.push_str(&format!(
            "{}if (original == undefined) return values.length > 0;\n",
            TAB
        ));
        out.push_str(&format!(
            "{}return values.length !== original.length \
             || values.some((x, i) => x !== original[i]);\n",
            TAB
        ));
        out.push_str("}\n");
    }
    if deps.date_array_changed {
        out.push_str(
            "\nfunction dateArrayChanged(\
             array: KnockoutObservableArray<Date>, original: string[] | undefined) {\n",
        );
        out.push_str(&format!("{}const values = array();\n", TAB));
        out.push_str(&format!(
            "{}if (original == undefined) return values.length > 0;\n",
            TAB
        ));
        out.push_str(&format!(
            "{}return values.length !== original.length \
             || values.some((x, i) => x.toISOString() !== original[i]);\n",
            TAB
        ));
        out.push_str("}\n");
    }
    out
}
