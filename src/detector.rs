use crate::cli::Convention;
use crate::metadata::{Annotation, TypeCatalog, TypeDefinition};
use crate::naming::{simple_name, strip_arity};
use log::debug;
use std::collections::BTreeSet;

/// Convention detector for choosing an adapter when none is given.
///
/// The `ConventionDetector` looks at every type whose base chain ends in a controller base
/// and votes by:
/// - the namespace of the base (`Microsoft.AspNetCore.*` is MVC, `System.Web.Http.*` is Web API)
/// - the simple base name (`ControllerBase` is MVC, `ApiController` is Web API)
/// - convention-specific annotations (`RoutePrefix`/`FromUri` are Web API,
///   `FromRoute`/`ApiExplorerSettings` are MVC)
///
/// A bare `Controller` base exists in both conventions and does not vote on its own.
pub struct ConventionDetector;

/// Result of convention detection.
pub struct DetectionResult {
    /// Detected conventions, without duplicates
    pub conventions: Vec<Convention>,
}

impl ConventionDetector {
    /// Detects the controller conventions used by the catalog.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cs_ts_service::detector::ConventionDetector;
    /// use cs_ts_service::metadata::TypeCatalog;
    ///
    /// let catalog = TypeCatalog::new();
    /// let result = ConventionDetector::detect(&catalog);
    /// println!("Detected {} convention(s)", result.conventions.len());
    /// ```
    pub fn detect(catalog: &TypeCatalog) -> DetectionResult {
        debug!("Detecting controller conventions in {} types", catalog.len());

        let mut detected = BTreeSet::new();
        for definition in catalog.definitions() {
            let bases = Self::base_chain(definition, catalog);
            if !bases.iter().any(|b| Self::is_controller_base(b)) {
                continue;
            }

            for base in &bases {
                if let Some(convention) = Self::convention_of_base(base) {
                    detected.insert(convention);
                }
            }
            Self::check_annotations(definition, &mut detected);
        }

        let conventions: Vec<Convention> = detected.into_iter().collect();
        debug!("Detected conventions: {:?}", conventions);

        DetectionResult { conventions }
    }

    /// Full names of the base types, most derived first
    fn base_chain(definition: &TypeDefinition, catalog: &TypeCatalog) -> Vec<String> {
        catalog
            .hierarchy(definition)
            .into_iter()
            .filter_map(|d| d.base_type.clone())
            .collect()
    }

    fn is_controller_base(base: &str) -> bool {
        matches!(
            strip_arity(simple_name(base)),
            "Controller" | "ControllerBase" | "ApiController"
        )
    }

    fn convention_of_base(base: &str) -> Option<Convention> {
        if base.starts_with("Microsoft.AspNetCore.") {
            return Some(Convention::Mvc);
        }
        if base.starts_with("System.Web.Http.") {
            return Some(Convention::WebApi);
        }
        match simple_name(base) {
            "ControllerBase" => Some(Convention::Mvc),
            "ApiController" => Some(Convention::WebApi),
            _ => None,
        }
    }

    fn check_annotations(definition: &TypeDefinition, detected: &mut BTreeSet<Convention>) {
        let method_annotations = definition.methods.iter().flat_map(|m| {
            m.annotations
                .iter()
                .chain(m.parameters.iter().flat_map(|p| p.annotations.iter()))
        });
        let annotations = definition.annotations.iter().chain(method_annotations);
        for annotation in annotations {
            match annotation {
                Annotation::RoutePrefix { .. } | Annotation::FromUri => {
                    detected.insert(Convention::WebApi);
                }
                Annotation::FromRoute | Annotation::ApiExplorerSettings { .. } => {
                    detected.insert(Convention::Mvc);
                }
                _ => {}
            }
        }
    }
}
