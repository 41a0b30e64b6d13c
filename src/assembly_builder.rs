use crate::action_extractor::{
    authorization_requirement, ActionExtractor, ControllerContext, DEFAULT_ROUTE_PREFIX,
};
use crate::adapter::ApiAdapter;
use crate::documentation::Documentation;
use crate::metadata::{TypeCatalog, TypeDefinition};
use crate::model::{ActionsGroupNode, AssemblyNode};
use crate::naming::normalize_controller_name;
use crate::type_resolver::TypeResolver;
use log::{debug, info};

/// Builder for the [`AssemblyNode`] of one generation run.
///
/// Controllers are added one at a time; each keeps the discovery order and is dropped
/// when none of its methods is an action. All controllers share one type resolver, so a
/// class referenced from several controllers is registered once.
pub struct AssemblyBuilder<'a> {
    catalog: &'a TypeCatalog,
    adapter: &'a dyn ApiAdapter,
    documentation: &'a Documentation,
    resolver: TypeResolver<'a>,
    extractor: ActionExtractor<'a>,
    controllers: Vec<ActionsGroupNode>,
}

impl<'a> AssemblyBuilder<'a> {
    pub fn new(
        catalog: &'a TypeCatalog,
        adapter: &'a dyn ApiAdapter,
        documentation: &'a Documentation,
    ) -> Self {
        Self {
            catalog,
            adapter,
            documentation,
            resolver: TypeResolver::new(catalog, adapter, documentation),
            extractor: ActionExtractor::new(catalog, adapter, documentation),
            controllers: Vec::new(),
        }
    }

    /// Adds a controller type.
    ///
    /// # Returns
    ///
    /// `true` when at least one action was extracted and the controller was kept.
    pub fn add_controller(&mut self, definition: &'a TypeDefinition) -> bool {
        let name = normalize_controller_name(&definition.name);
        let route_prefix = self.adapter.route_prefix(definition);
        if route_prefix.is_none() {
            debug!("Controller {} has no route prefix, using {}", name, DEFAULT_ROUTE_PREFIX);
        }

        let context = ControllerContext {
            name: name.clone(),
            route_prefix,
            authorization: authorization_requirement(&definition.annotations),
        };

        let mut group = ActionsGroupNode::new(name);
        group.documentation = self.documentation.type_summary(&definition.name);

        let catalog = self.catalog;
        for (declaring, method) in catalog.all_methods(definition) {
            if !method.is_public || method.is_special || !self.adapter.is_action(method) {
                debug!("Skipping method {}.{}", definition.name, method.name);
                continue;
            }
            if let Some(action) = self
                .extractor
                .extract(&mut self.resolver, &context, declaring, method)
            {
                group.actions.push(action);
            }
        }

        if group.actions.is_empty() {
            debug!("Controller {} has no actions, omitting it", group.name);
            return false;
        }

        debug!("Controller {} has {} actions", group.name, group.actions.len());
        self.controllers.push(group);
        true
    }

    /// Finalizes the assembly
    pub fn build(self) -> AssemblyNode {
        let (types, name_collisions) = self.resolver.into_parts();
        AssemblyNode {
            controllers: self.controllers,
            types,
            name_collisions,
        }
    }
}

/// Walks every controller of the catalog, in definition order.
pub fn read_controllers(
    catalog: &TypeCatalog,
    adapter: &dyn ApiAdapter,
    documentation: &Documentation,
) -> AssemblyNode {
    let mut builder = AssemblyBuilder::new(catalog, adapter, documentation);
    let mut candidates = 0;
    for definition in catalog.definitions() {
        if adapter.is_controller(definition, catalog) {
            candidates += 1;
            builder.add_controller(definition);
        }
    }

    let assembly = builder.build();
    info!(
        "Read {} controllers ({} candidates), {} types",
        assembly.controllers.len(),
        candidates,
        assembly.types.len()
    );
    assembly
}
