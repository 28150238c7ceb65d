//! Charm-style CLI prompts using cliclack

use crate::config::{resolve_config_path, resolve_templates_root, ConfigService, KitConfig};
use crate::error::KitError;
use crate::generator::{GenerationOptions, GenerationReport, Selection, StackService};
use crate::ide::{Ide, OutputShape};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// CLI arguments for the generate command
///
/// Every `None` is asked interactively, or defaulted when `yes` is set.
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Templates root (defaults to `RULES_KIT_TEMPLATES`, then `./templates`)
    pub template_dir: Option<PathBuf>,

    /// Catalog file (defaults to `RULES_KIT_CONFIG`, then the templates root)
    pub config: Option<PathBuf>,

    pub stack: Option<String>,
    pub version: Option<String>,
    pub architecture: Option<String>,
    pub ide: Option<Ide>,

    /// Project to generate rules for
    pub project_path: Option<PathBuf>,

    pub app_directory: Option<String>,

    /// Cursor rules folder, relative to the project path
    pub cursor_path: Option<String>,

    /// Include the global rules
    pub global: Option<bool>,

    pub mcp_tools: Option<Vec<String>>,

    /// Back up changed files and report stale ones
    pub update: bool,

    /// Also write plain markdown copies under `docs/rules-kit`
    pub mirror_docs: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run rule generation with interactive prompts for anything not given
pub async fn run(args: GenerateArgs) -> Result<GenerationReport> {
    cliclack::intro("rules-kit")?;

    // Step 1: Load the catalog
    let (templates_root, config) = open_catalog(args.template_dir.as_deref(), args.config.as_deref())?;
    cliclack::log::info(format!("Using templates from {}", templates_root.display()))?;
    let catalog = config.get_config()?;

    // Step 2: Collect the selection
    let project_path = select_project_path(&args)?;
    let stack = select_stack(catalog, &args)?;
    let version = select_version(&config, &stack, &project_path, &args)?;
    let architecture = select_architecture(&config, &stack, &args)?;
    let ide = select_ide(&args)?;
    let include_global = select_global(catalog, &args)?;
    let mcp_tools = select_mcp_tools(catalog, &args)?;

    let service = StackService::new(&config, &templates_root);
    let meta = service.build_meta(&Selection {
        stack,
        version,
        architecture,
        project_path: project_path.clone(),
        app_directory: args.app_directory.clone(),
        cursor_path: args.cursor_path.clone(),
    })?;

    cliclack::log::success(format!(
        "{}, {} architecture, {}",
        meta.formatted_version_name.as_deref().unwrap_or_default(),
        meta.architecture.as_deref().unwrap_or_default(),
        ide
    ))?;

    let options = GenerationOptions {
        ide,
        include_global,
        update: args.update,
        mcp_tools,
        mirror_docs: args.mirror_docs,
    };

    // Step 3: Generate
    let spinner = cliclack::spinner();
    spinner.start(format!("Generating {} rules...", ide));

    let result = service
        .generate_rules(&project_path, &meta, &options, |pct| {
            spinner.set_message(format!("Generating {} rules... {}%", ide, pct))
        })
        .await;

    let report = match result {
        Ok(report) => {
            spinner.stop(format!(
                "Generated {} rules into {}",
                report.planned,
                display_relative(&report.output, &project_path)
            ));
            report
        }
        Err(e) => {
            spinner.stop("Generation failed");
            return Err(e.into());
        }
    };

    // Step 4: Summarize
    print_summary(&report, &project_path, options.update)?;

    if report.is_success() {
        cliclack::outro("Rules ready")?;
    } else {
        cliclack::outro(format!(
            "Finished with {} failed file(s)",
            report.failure_count()
        ))?;
    }

    Ok(report)
}

/// Print the catalog: stacks, versions, ranges, architectures and MCP tools
pub fn list(template_dir: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let (templates_root, service) = open_catalog(template_dir, config)?;
    let catalog = service.get_config()?;

    println!("{} {}", "Templates:".bold(), templates_root.display());
    println!("{} {}", "Catalog:".bold(), service.path().display());
    match &catalog.global.description {
        Some(description) => println!("{} {}", "Global rules:".bold(), description),
        None => println!("{} {}/", "Global rules:".bold(), catalog.global.template_root),
    }

    for (key, stack) in &catalog.stacks {
        println!();
        println!("{} ({})", stack.display_name(key).bold(), key.dimmed());

        if !stack.versions.is_empty() {
            println!("  versions:      {}", stack.versions.join(", "));
        }

        for (range_key, range) in &stack.version_ranges {
            let label = range
                .name
                .as_deref()
                .map(|n| format!(" {}", n.dimmed()))
                .unwrap_or_default();
            println!(
                "  range {}: {}-{}{}",
                range_key.cyan(),
                range.min(),
                range.max(),
                label
            );
        }

        let default_arch = service.get_default_architecture(key).ok().map(|a| a.id.as_str());
        for arch in &stack.architectures {
            let marker = if Some(arch.id.as_str()) == default_arch {
                format!(" {}", "(default)".green())
            } else {
                String::new()
            };
            println!(
                "  architecture {}: {}{}",
                arch.id.cyan(),
                arch.display_name(),
                marker
            );
        }
    }

    if !catalog.mcp_tools.is_empty() {
        println!();
        println!("{}", "MCP tools".bold());
        for (key, tool) in &catalog.mcp_tools {
            println!(
                "  {}: {}",
                key.cyan(),
                tool.description
                    .as_deref()
                    .or(tool.name.as_deref())
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn open_catalog(template_dir: Option<&Path>, config: Option<&Path>) -> Result<(PathBuf, ConfigService)> {
    let templates_root = resolve_templates_root(template_dir);
    let config_path = resolve_config_path(config, &templates_root);

    let service = ConfigService::new(config_path);
    service
        .get_config()
        .with_context(|| format!("Cannot use catalog at {}", service.path().display()))?;

    Ok((templates_root, service))
}

fn select_project_path(args: &GenerateArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let path = match &args.project_path {
        Some(dir) => absolute_from(&current_dir, dir),
        None if args.yes => current_dir,
        None => {
            let input: String = cliclack::input("Project path")
                .placeholder(".")
                .default_input(".")
                .interact()?;

            if input.is_empty() || input == "." {
                current_dir
            } else {
                absolute_from(&current_dir, Path::new(&input))
            }
        }
    };

    if !path.is_dir() {
        anyhow::bail!("Project path is not a directory: {}", path.display());
    }

    Ok(path)
}

fn select_stack(catalog: &KitConfig, args: &GenerateArgs) -> Result<String> {
    if let Some(stack) = &args.stack {
        return Ok(stack.clone());
    }

    let names = catalog.stack_names();
    match names.as_slice() {
        [] => anyhow::bail!("The catalog declares no stacks."),
        [only] => {
            cliclack::log::info(format!("Using stack: {}", only))?;
            Ok(only.to_string())
        }
        _ if args.yes => Err(KitError::NoStack).context("Pass --stack when running with --yes"),
        _ => {
            let mut select = cliclack::select("Select a stack");
            for (key, stack) in &catalog.stacks {
                select = select.item(key.clone(), stack.display_name(key), key);
            }
            Ok(select.interact()?)
        }
    }
}

fn select_version(
    config: &ConfigService,
    stack: &str,
    project_path: &Path,
    args: &GenerateArgs,
) -> Result<Option<String>> {
    if let Some(version) = &args.version {
        return Ok(Some(version.clone()));
    }

    let detected = config.detect_version(stack, project_path)?;
    if let Some(version) = &detected {
        cliclack::log::info(format!(
            "Detected {}",
            config.get_formatted_version_name(stack, Some(version.as_str()))?
        ))?;
    }

    let descriptor = config.get_stack(stack)?;
    if args.yes || descriptor.versions.is_empty() {
        return Ok(detected);
    }

    let suggested = match detected.clone() {
        Some(version) => Some(version),
        None => config.default_version(stack)?,
    };

    let mut choices = descriptor.versions.clone();
    if let Some(version) = &detected {
        if !choices.contains(version) {
            choices.push(version.clone());
        }
    }

    let mut select = cliclack::select("Select a version");
    for version in choices.iter().rev() {
        let hint = if detected.as_ref() == Some(version) {
            "detected"
        } else {
            ""
        };
        select = select.item(
            version.clone(),
            config.get_formatted_version_name(stack, Some(version.as_str()))?,
            hint,
        );
    }
    if let Some(version) = suggested {
        select = select.initial_value(version);
    }

    Ok(Some(select.interact()?))
}

fn select_architecture(config: &ConfigService, stack: &str, args: &GenerateArgs) -> Result<Option<String>> {
    if let Some(architecture) = &args.architecture {
        return Ok(Some(architecture.clone()));
    }

    let descriptor = config.get_stack(stack)?;
    let default = config.get_default_architecture(stack)?;
    if args.yes || descriptor.architectures.len() <= 1 {
        return Ok(Some(default.id.clone()));
    }

    let mut select = cliclack::select("Select an architecture");
    for arch in &descriptor.architectures {
        select = select.item(arch.id.clone(), arch.display_name(), &arch.id);
    }

    Ok(Some(select.initial_value(default.id.clone()).interact()?))
}

fn select_ide(args: &GenerateArgs) -> Result<Ide> {
    if let Some(ide) = args.ide {
        return Ok(ide);
    }
    if args.yes {
        return Ok(Ide::Cursor);
    }

    let mut select = cliclack::select("Select your AI assistant");
    for ide in Ide::ALL {
        select = select.item(ide, ide.display_name(), output_location(ide));
    }

    Ok(select.initial_value(Ide::Cursor).interact()?)
}

fn select_global(catalog: &KitConfig, args: &GenerateArgs) -> Result<bool> {
    if let Some(global) = args.global {
        return Ok(global);
    }
    if args.yes {
        return Ok(true);
    }

    let prompt = match &catalog.global.description {
        Some(description) => format!("Include global rules? ({})", description),
        None => "Include global rules?".to_string(),
    };
    Ok(cliclack::confirm(prompt).initial_value(true).interact()?)
}

fn select_mcp_tools(catalog: &KitConfig, args: &GenerateArgs) -> Result<Vec<String>> {
    if let Some(tools) = &args.mcp_tools {
        return Ok(tools.clone());
    }
    if args.yes || catalog.mcp_tools.is_empty() {
        return Ok(Vec::new());
    }

    let mut multi = cliclack::multiselect("Add MCP tool rules (optional)");
    for (key, tool) in &catalog.mcp_tools {
        multi = multi.item(
            key.clone(),
            tool.name.as_deref().unwrap_or(key),
            tool.description.as_deref().unwrap_or_default(),
        );
    }

    Ok(multi.required(false).interact()?)
}

fn print_summary(report: &GenerationReport, project_path: &Path, update: bool) -> Result<()> {
    let mut lines = vec![format!(
        "{} written, {} unchanged",
        report.written.len(),
        report.unchanged.len()
    )];
    for path in &report.written {
        lines.push(format!("{} {}", "+".green(), display_relative(path, project_path)));
    }
    cliclack::log::success(lines.join("\n"))?;

    if !report.backups.is_empty() {
        let mut lines = vec![format!("{} backup(s) created", report.backups.len())];
        for path in &report.backups {
            lines.push(format!("  {}", display_relative(path, project_path).dimmed()));
        }
        cliclack::log::info(lines.join("\n"))?;
    }

    for (path, reason) in &report.backup_warnings {
        cliclack::log::warning(format!(
            "Overwrote {} without a backup: {}",
            display_relative(path, project_path),
            reason
        ))?;
    }

    if !report.failures.is_empty() {
        let mut lines = vec![format!("{} file(s) failed", report.failures.len())];
        for failure in &report.failures {
            lines.push(format!("{} {}", "x".red(), failure.error));
        }
        cliclack::log::error(lines.join("\n"))?;
    }

    if update && !report.stale.is_empty() {
        let mut lines = vec![format!(
            "{} file(s) are no longer generated (left in place)",
            report.stale.len()
        )];
        for path in &report.stale {
            lines.push(format!("  {}", display_relative(path, project_path).yellow()));
        }
        cliclack::log::warning(lines.join("\n"))?;
    }

    Ok(())
}

/// Where an IDE's rules end up, for prompt hints
fn output_location(ide: Ide) -> String {
    match ide.output_shape(None) {
        OutputShape::Directory { root, .. } => format!("{}/", root.display()),
        OutputShape::SingleFile { path } => path.display().to_string(),
    }
}

fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
