use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// cs-ts-service - Generate typed TypeScript service clients from web API controller metadata
#[derive(Parser, Debug)]
#[command(name = "cs-ts-service")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Manifest file, or directory scanned for manifests and XML documentation
    #[arg(value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// Directory the TypeScript modules are written to
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = "./services")]
    pub output_dir: PathBuf,

    /// Controller convention (if not specified, auto-detect)
    #[arg(short = 'a', long = "adapter", value_enum)]
    pub adapter: Option<Convention>,

    /// Module providing the api client helpers
    #[arg(long = "helpers", value_name = "MODULE", default_value = "folke-service-helpers")]
    pub helpers_module: String,

    /// Module providing the knockout validators
    #[arg(long = "validation", value_name = "MODULE", default_value = "folke-ko-validation")]
    pub validation_module: String,

    /// Module layout
    #[arg(long = "layout", value_enum, default_value = "split")]
    pub layout: Layout,

    /// How action parameters are passed
    #[arg(long = "parameter-style", value_enum, default_value = "object")]
    pub parameter_style: ParameterStyleArg,

    /// Also emit knockout observable classes
    #[arg(long = "observable")]
    pub observable: bool,

    /// Also write the resolved model next to the modules
    #[arg(long = "dump-model", value_enum)]
    pub dump_model: Option<ModelFormat>,

    /// Fail when two source types normalize to the same class name
    #[arg(long = "strict")]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Supported controller conventions
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Convention {
    /// ASP.NET Core MVC
    Mvc,
    /// ASP.NET Web API
    #[value(name = "web-api")]
    WebApi,
}

/// Module layout options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Layout {
    /// One module per controller plus views and services
    Split,
    /// Everything in one services module
    Single,
}

/// Parameter passing options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ParameterStyleArg {
    /// A single params object
    Object,
    /// One argument per parameter
    Positional,
}

/// Model dump format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModelFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

impl ModelFormat {
    fn file_name(self) -> &'static str {
        match self {
            ModelFormat::Yaml => "model.yaml",
            ModelFormat::Json => "model.json",
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.input_path.exists() {
        anyhow::bail!("Input path does not exist: {}", args.input_path.display());
    }

    if args.output_dir.is_file() {
        anyhow::bail!(
            "Output path is a file, expected a directory: {}",
            args.output_dir.display()
        );
    }

    if args.helpers_module.trim().is_empty() {
        anyhow::bail!("The helpers module name cannot be empty");
    }
    if args.observable && args.validation_module.trim().is_empty() {
        anyhow::bail!("The validation module name cannot be empty");
    }

    info!("Input path: {}", args.input_path.display());
    info!("Output directory: {}", args.output_dir.display());
    if let Some(ref adapter) = args.adapter {
        info!("Convention: {:?}", adapter);
    } else {
        info!("Convention: auto-detect");
    }
    info!("Layout: {:?}, parameters: {:?}", args.layout, args.parameter_style);

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::adapter::mvc::MvcAdapter;
    use crate::adapter::web_api::WebApiAdapter;
    use crate::adapter::ApiAdapter;
    use crate::assembly_builder::read_controllers;
    use crate::detector::ConventionDetector;
    use crate::documentation::Documentation;
    use crate::parser::{ManifestParser, ParsedManifest};
    use crate::scanner::FileScanner;
    use crate::serializer::{serialize_json, serialize_yaml, write_modules, write_to_file};
    use crate::typescript::{GeneratorOptions, ModuleLayout, ParameterStyle, TypeScriptWriter};

    info!("Starting TypeScript service generation...");

    // Step 1: Scan for manifests and documentation
    info!("Scanning input...");
    let scanner = FileScanner::new(args.input_path.clone());
    let scan_result = scanner.scan()?;

    info!(
        "Found {} manifests, {} documentation files",
        scan_result.manifest_files.len(),
        scan_result.documentation_files.len()
    );
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }

    if scan_result.manifest_files.is_empty() {
        anyhow::bail!("No type manifests found in {}", args.input_path.display());
    }

    // Step 2: Parse manifests into a catalog
    info!("Parsing manifests...");
    let manifests: Vec<ParsedManifest> = ManifestParser::parse_files(&scan_result.manifest_files)
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping manifest due to parse error: {:#}", e);
                None
            }
        })
        .collect();

    if manifests.is_empty() {
        anyhow::bail!("No manifest could be parsed successfully");
    }

    let catalog = ManifestParser::build_catalog(&manifests);
    info!("Loaded {} type definitions", catalog.len());

    // Step 3: Load documentation
    let mut documentation = Documentation::new();
    for path in &scan_result.documentation_files {
        match Documentation::load(path) {
            Ok(loaded) => {
                debug!("Loaded {} documented members from {}", loaded.len(), path.display());
                documentation.merge(loaded);
            }
            Err(e) => warn!("Skipping documentation file {}: {}", path.display(), e),
        }
    }

    // Step 4: Choose the convention (or use the user-specified one)
    let convention = if let Some(convention) = args.adapter {
        info!("Using user-specified convention: {:?}", convention);
        convention
    } else {
        info!("Detecting controller convention...");
        let detection = ConventionDetector::detect(&catalog);
        match detection.conventions.as_slice() {
            [] => anyhow::bail!(
                "No supported controller convention detected. \
                 Please specify one using --adapter option.\n\
                 Supported conventions: mvc, web-api"
            ),
            [single] => *single,
            several => anyhow::bail!(
                "Several controller conventions detected ({:?}). \
                 Please choose one using --adapter option.",
                several
            ),
        }
    };

    let adapter: Box<dyn ApiAdapter> = match convention {
        Convention::Mvc => Box::new(MvcAdapter),
        Convention::WebApi => Box::new(WebApiAdapter),
    };

    // Step 5: Build the assembly model
    info!("Reading controllers with the {} convention...", adapter.name());
    let assembly = read_controllers(&catalog, adapter.as_ref(), &documentation);
    assembly.validate()?;

    if assembly.controllers.is_empty() {
        warn!("No controllers with actions found");
    }
    if !assembly.name_collisions.is_empty() {
        for collision in &assembly.name_collisions {
            warn!(
                "Types {} and {} share the name {}",
                collision.first, collision.second, collision.name
            );
        }
        if args.strict {
            anyhow::bail!(
                "{} class name collisions found and --strict is set",
                assembly.name_collisions.len()
            );
        }
    }

    // Step 6: Emit TypeScript
    info!("Emitting TypeScript...");
    let options = GeneratorOptions {
        layout: match args.layout {
            Layout::Split => ModuleLayout::Split,
            Layout::Single => ModuleLayout::Single,
        },
        service_helpers_module: args.helpers_module.clone(),
        validation_module: args.validation_module.clone(),
        parameter_style: match args.parameter_style {
            ParameterStyleArg::Object => ParameterStyle::Object,
            ParameterStyleArg::Positional => ParameterStyle::Positional,
        },
        observable: args.observable,
    };
    let mut writer = TypeScriptWriter::new(options);
    writer.write_assembly(&assembly)?;

    // Step 7: Write modules
    info!("Writing modules to: {}", args.output_dir.display());
    let written = write_modules(writer.output_modules(), &args.output_dir)?;

    // Step 8: Dump the model if requested
    if let Some(format) = args.dump_model {
        let content = match format {
            ModelFormat::Yaml => serialize_yaml(&assembly)?,
            ModelFormat::Json => serialize_json(&assembly)?,
        };
        let path = args.output_dir.join(format.file_name());
        write_to_file(&content, &path)?;
        info!("Wrote model to {}", path.display());
    }

    // Step 9: Display summary
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Manifests parsed: {}", manifests.len());
    info!("  - Controllers: {}", assembly.controllers.len());
    info!(
        "  - Actions: {}",
        assembly.controllers.iter().map(|c| c.actions.len()).sum::<usize>()
    );
    info!("  - Classes: {}", assembly.types.len());
    info!("  - Modules written: {}", written.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = CliArgs::try_parse_from(["cs-ts-service", "metadata"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("./services"));
        assert!(args.adapter.is_none());
        assert_eq!(args.helpers_module, "folke-service-helpers");
        assert_eq!(args.validation_module, "folke-ko-validation");
        assert!(matches!(args.layout, Layout::Split));
        assert!(matches!(args.parameter_style, ParameterStyleArg::Object));
        assert!(!args.observable && !args.strict && !args.verbose);
    }

    #[test]
    fn test_parse_all_options() {
        let args = CliArgs::try_parse_from([
            "cs-ts-service",
            "metadata",
            "-o",
            "out",
            "-a",
            "web-api",
            "--layout",
            "single",
            "--parameter-style",
            "positional",
            "--observable",
            "--dump-model",
            "json",
            "--strict",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.adapter, Some(Convention::WebApi));
        assert!(matches!(args.layout, Layout::Single));
        assert!(matches!(args.parameter_style, ParameterStyleArg::Positional));
        assert!(matches!(args.dump_model, Some(ModelFormat::Json)));
        assert!(args.observable && args.strict && args.verbose);
    }

    #[test]
    fn test_validation_rejects_missing_input() {
        let args = CliArgs::try_parse_from(["cs-ts-service", "/nonexistent/metadata"]).unwrap();
        let err = parse_args_from_parsed(args).unwrap_err();
        assert!(err.to_string().contains("Input path does not exist"));
    }

    #[test]
    fn test_rejects_unknown_adapter() {
        assert!(CliArgs::try_parse_from(["cs-ts-service", "metadata", "-a", "rails"]).is_err());
    }
}
