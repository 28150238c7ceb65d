//! Rule generation: layer resolution, precedence, and output
//!
//! `StackService` decides which template folders apply to a
//! (stack, version, architecture) selection, merges them in precedence order,
//! and hands every file to `FileService`. Per-file failures are collected and
//! reported at the end; configuration errors abort before anything is written.

use crate::config::ConfigService;
use crate::error::{KitError, Result};
use crate::ide::{Ide, OutputShape, DEFAULT_CURSOR_PATH};
use crate::templates::files::{find_stale_files, BackupStatus, FileService, WriteOutcome};
use crate::templates::layers::{Layer, LayerDir, RulePlan};
use crate::templates::meta::TemplateMeta;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Folder holding a stack's base layer
pub const BASE_DIR: &str = "base";

/// Folder holding MCP tool rule sets, both in templates and output
pub const MCP_TOOLS_DIR: &str = "mcp-tools";

/// Mirror documentation folder, relative to the project path
pub const MIRROR_DOCS_DIR: &str = "docs/rules-kit";

/// What the user asked to generate
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub stack: String,
    pub version: Option<String>,
    pub architecture: Option<String>,
    pub project_path: PathBuf,
    pub app_directory: Option<String>,
    pub cursor_path: Option<String>,
}

/// Per-run output settings
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub ide: Ide,

    /// Apply the `global/` layer
    pub include_global: bool,

    /// Back up files before overwriting them and report stale files
    pub update: bool,

    /// MCP tool rule sets to add
    pub mcp_tools: Vec<String>,

    /// Write plain `.md` copies of generated rules
    pub mirror_docs: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            ide: Ide::Cursor,
            include_global: true,
            update: false,
            mcp_tools: Vec::new(),
            mirror_docs: false,
        }
    }
}

/// A file that could not be generated
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: KitError,
}

/// Outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Rules folder or aggregated file the run wrote to
    pub output: PathBuf,

    /// Number of templates in the merged plan
    pub planned: usize,

    /// Templates replaced by a later layer
    pub overridden: usize,

    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub backups: Vec<PathBuf>,

    /// Files overwritten without a backup because the copy failed
    pub backup_warnings: Vec<(PathBuf, String)>,

    pub failures: Vec<FileFailure>,

    /// Files in the run's output subtrees that no template produced
    pub stale: Vec<PathBuf>,
}

impl GenerationReport {
    fn record(&mut self, path: PathBuf, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Unchanged => self.unchanged.push(path),
            WriteOutcome::Written { backup } => {
                match backup {
                    BackupStatus::NotNeeded => {}
                    BackupStatus::Created(backup_path) => self.backups.push(backup_path),
                    BackupStatus::Failed(reason) => {
                        self.backup_warnings.push((path.clone(), reason))
                    }
                }
                self.written.push(path);
            }
        }
    }

    fn fail(&mut self, path: PathBuf, error: KitError) {
        warn!("Skipping {}: {}", path.display(), error);
        self.failures.push(FileFailure { path, error });
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Orchestrates rule generation for one catalog and templates root
pub struct StackService<'a> {
    config: &'a ConfigService,
    files: FileService,
    templates_root: PathBuf,
}

impl<'a> StackService<'a> {
    pub fn new(config: &'a ConfigService, templates_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            files: FileService::new(),
            templates_root: templates_root.into(),
        }
    }

    /// Replace the file service (e.g. to pin the backup timestamp)
    pub fn with_file_service(mut self, files: FileService) -> Self {
        self.files = files;
        self
    }

    pub fn map_version_to_range(&self, stack: &str, version: Option<&str>) -> Result<Option<String>> {
        self.config.map_version_to_range(stack, version)
    }

    pub fn get_formatted_version_name(&self, stack: &str, version: Option<&str>) -> Result<String> {
        self.config.get_formatted_version_name(stack, version)
    }

    /// Fill in placeholder values for a selection
    ///
    /// The version comes from the selection, else the project's manifest,
    /// else the stack's default. The architecture is validated, or the
    /// stack default is used.
    pub fn build_meta(&self, selection: &Selection) -> Result<TemplateMeta> {
        let stack = selection.stack.as_str();
        self.config.get_stack(stack)?;

        let version = match &selection.version {
            Some(v) => Some(v.clone()),
            None => self
                .config
                .detect_version(stack, &selection.project_path)?
                .or(self.config.default_version(stack)?),
        };
        let architecture = self
            .config
            .resolve_architecture(stack, selection.architecture.as_deref())?;

        Ok(TemplateMeta {
            project_path: Some(selection.project_path.display().to_string()),
            app_directory: selection.app_directory.clone(),
            version_range: self.map_version_to_range(stack, version.as_deref())?,
            formatted_version_name: Some(
                self.get_formatted_version_name(stack, version.as_deref())?,
            ),
            detected_version: version,
            stack: Some(stack.to_string()),
            architecture: Some(architecture.id.clone()),
            cursor_path: Some(
                selection
                    .cursor_path
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CURSOR_PATH.to_string()),
            ),
        })
    }

    /// Template folders to apply, in precedence order
    pub fn resolve_layers(&self, meta: &TemplateMeta, options: &GenerationOptions) -> Result<Vec<LayerDir>> {
        let stack = meta.stack.as_deref().ok_or(KitError::NoStack)?;
        let config = self.config.get_config()?;
        let descriptor = self.config.get_stack(stack)?;
        let architecture = self
            .config
            .resolve_architecture(stack, meta.architecture.as_deref())?;
        let range = match &meta.version_range {
            Some(range) => Some(range.clone()),
            None => self.map_version_to_range(stack, meta.detected_version.as_deref())?,
        };

        for tool in &options.mcp_tools {
            if !config.mcp_tools.contains_key(tool) {
                return Err(KitError::UnknownMcpTool {
                    name: tool.clone(),
                    available: config
                        .mcp_tools
                        .keys()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }

        let stack_dir = descriptor.template_dir(stack);
        let stack_globs = if architecture.globs.is_empty() {
            descriptor.globs.clone()
        } else {
            architecture.globs.clone()
        };
        let stack_layer = |layer: Layer, folder: &str| {
            let origin = format!("{}/{}", stack_dir, folder);
            LayerDir {
                layer,
                dir: self.templates_root.join(&origin),
                origin,
                output_prefix: stack.to_string(),
                fallback_globs: stack_globs.clone(),
            }
        };

        let mut layers = Vec::new();
        if options.include_global {
            let origin = config.global.template_root.clone();
            layers.push(LayerDir {
                layer: Layer::Global,
                dir: self.templates_root.join(&origin),
                output_prefix: origin.clone(),
                origin,
                fallback_globs: Vec::new(),
            });
        }
        layers.push(stack_layer(Layer::StackBase, BASE_DIR));
        if let Some(range) = &range {
            layers.push(stack_layer(Layer::VersionOverlay, range.as_str()));
        }
        layers.push(stack_layer(Layer::ArchitectureOverlay, architecture.id.as_str()));

        for tool in &options.mcp_tools {
            let origin = format!("{}/{}", MCP_TOOLS_DIR, tool);
            layers.push(LayerDir {
                layer: Layer::McpTool,
                dir: self.templates_root.join(&origin),
                output_prefix: origin.clone(),
                origin,
                fallback_globs: Vec::new(),
            });
        }

        debug!(
            "Layers for {}: {}",
            stack,
            layers
                .iter()
                .map(|l| l.origin.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(layers)
    }

    /// Merge the layers' templates into one plan
    ///
    /// A layer whose folder cannot be walked is recorded as a failure and the
    /// remaining layers still apply.
    pub fn plan(&self, layers: &[LayerDir]) -> (RulePlan, Vec<FileFailure>) {
        let mut plan = RulePlan::default();
        let mut failures = Vec::new();
        for layer in layers {
            match layer.discover() {
                Ok(files) => plan.push_layer(files),
                Err(error) => {
                    warn!("Cannot read layer {}: {}", layer.origin, error);
                    failures.push(FileFailure {
                        path: layer.dir.clone(),
                        error,
                    });
                }
            }
        }
        (plan, failures)
    }

    /// Generate the rule set for `meta` into `target_dir`
    ///
    /// `progress` receives a percentage after every template; the values
    /// never decrease and the last one is 100.
    pub async fn generate_rules<F>(
        &self,
        target_dir: &Path,
        meta: &TemplateMeta,
        options: &GenerationOptions,
        mut progress: F,
    ) -> Result<GenerationReport>
    where
        F: FnMut(u8),
    {
        let layers = self.resolve_layers(meta, options)?;
        let stack = meta.stack.as_deref().ok_or(KitError::NoStack)?;
        let title = format!(
            "{} rules",
            self.config.get_stack(stack)?.display_name(stack)
        );

        let (plan, discovery_failures) = self.plan(&layers);
        let total = plan.len();
        let shape = options.ide.output_shape(meta.cursor_path.as_deref());

        let mut counts: Vec<(Layer, usize)> = plan.layer_counts().into_iter().collect();
        counts.sort();
        for (layer, count) in counts {
            debug!("{}: {} rule(s)", layer, count);
        }
        if options.mirror_docs && options.ide.is_single_file() {
            debug!("Mirror docs skipped, {} output is already plain markdown", options.ide.id());
        }

        info!(
            "Generating {} rules for {} ({}) into {}",
            total,
            stack,
            options.ide.id(),
            target_dir.display()
        );

        let mut report = GenerationReport {
            planned: total,
            overridden: plan.overridden,
            ..Default::default()
        };
        for failure in discovery_failures {
            report.fail(failure.path, failure.error);
        }

        match shape {
            OutputShape::Directory { root, extension } => {
                let out_root = target_dir.join(&root);
                report.output = out_root.clone();
                let mut produced = HashSet::new();

                for (index, file) in plan.files.iter().enumerate() {
                    let dest = out_root.join(format!("{}.{}", file.target, extension));
                    match self
                        .files
                        .wrap_to_target(file, &dest, meta, options.ide, options.update)
                        .await
                    {
                        Ok((rule, outcome)) => {
                            report.record(dest.clone(), outcome);
                            if options.mirror_docs {
                                let mirror = target_dir
                                    .join(MIRROR_DOCS_DIR)
                                    .join(format!("{}.md", file.target));
                                match self
                                    .files
                                    .commit(&mirror, &rule.to_mirror(), options.update)
                                    .await
                                {
                                    Ok(outcome) => report.record(mirror, outcome),
                                    Err(error) => report.fail(mirror, error),
                                }
                            }
                        }
                        Err(error) => report.fail(file.source.clone(), error),
                    }
                    produced.insert(dest);
                    progress(percent(index + 1, total));
                }

                if options.update {
                    let mut roots: Vec<PathBuf> = layers
                        .iter()
                        .map(|l| out_root.join(&l.output_prefix))
                        .collect();
                    roots.sort();
                    roots.dedup();
                    report.stale = find_stale_files(&roots, extension, &produced);
                    for path in &report.stale {
                        warn!("Stale rule no longer generated: {}", path.display());
                    }
                }
            }
            OutputShape::SingleFile { path } => {
                let dest = target_dir.join(&path);
                report.output = dest.clone();
                let mut rules = Vec::with_capacity(total);

                for (index, file) in plan.files.iter().enumerate() {
                    match self.files.render_template(file, meta).await {
                        Ok(rule) => rules.push(rule),
                        Err(error) => report.fail(file.source.clone(), error),
                    }
                    progress(percent(index + 1, total));
                }

                if rules.is_empty() {
                    warn!("No rules rendered, leaving {} untouched", dest.display());
                } else {
                    match self
                        .files
                        .aggregate_files(&rules, &dest, &title, options.update)
                        .await
                    {
                        Ok(outcome) => report.record(dest, outcome),
                        Err(error) => report.fail(dest, error),
                    }
                }
            }
        }

        if total == 0 {
            warn!("No templates found for {}", stack);
            progress(100);
        }

        info!(
            "Wrote {} files ({} unchanged, {} failed, {} backups)",
            report.written.len(),
            report.unchanged.len(),
            report.failures.len(),
            report.backups.len()
        );
        if !report.backups.is_empty() {
            info!("Backups saved with suffix .bak-{}", self.files.backup_stamp());
        }
        Ok(report)
    }
}

fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (processed.min(total) * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KitConfig;
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
        "stacks": {
            "laravel": {
                "name": "Laravel",
                "versions": ["10", "11", "12"],
                "default_version": "12",
                "version_ranges": {
                    "v10": { "range": [10, 10] },
                    "v11-12": { "name": "Laravel 11-12", "range": [11, 12] }
                },
                "architectures": [
                    { "id": "standard", "default": true },
                    { "id": "ddd", "globs": ["src/Domain/**/*.php"] }
                ],
                "globs": ["**/*.php"],
                "detect": { "file": "composer.json", "package": "laravel/framework" }
            },
            "nextjs": {
                "name": "Next.js",
                "architectures": [{ "id": "app-router" }]
            }
        },
        "mcp_tools": { "github": { "name": "GitHub MCP" } }
    }"#;

    struct Fixture {
        templates: TempDir,
        project: TempDir,
        config: ConfigService,
    }

    impl Fixture {
        fn new() -> Self {
            let templates = TempDir::new().unwrap();
            let fixture = Self {
                config: ConfigService::from_config(KitConfig::from_json(CATALOG).unwrap()),
                templates,
                project: TempDir::new().unwrap(),
            };
            fixture.template("global/coding-style.md", "# Coding Style\n\nBe consistent.\n");
            fixture.template(
                "laravel/base/controllers.md",
                "---\ndescription: Controllers\n---\nBase controllers for {stack}\n",
            );
            fixture.template("laravel/base/models.md", "Models in {projectPath}\n");
            fixture.template("laravel/v11-12/routing.md", "Routing for {formattedVersionName}\n");
            fixture.template("laravel/v10/routing.md", "Old routing\n");
            fixture.template(
                "laravel/ddd/controllers.md",
                "---\ndescription: DDD controllers\n---\nDDD controllers\n",
            );
            fixture.template("laravel/hexagonal/ports.md", "Ports\n");
            fixture.template("nextjs/base/components.md", "Components\n");
            fixture.template("mcp-tools/github/usage.md", "Use the GitHub MCP\n");
            fixture
        }

        fn template(&self, rel: &str, content: &str) {
            let path = self.templates.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn service(&self) -> StackService<'_> {
            StackService::new(&self.config, self.templates.path())
                .with_file_service(FileService::with_stamp("20260101-000000"))
        }

        fn meta(&self, version: &str, architecture: &str) -> TemplateMeta {
            self.service()
                .build_meta(&Selection {
                    stack: "laravel".to_string(),
                    version: Some(version.to_string()),
                    architecture: Some(architecture.to_string()),
                    project_path: PathBuf::from("/app"),
                    ..Default::default()
                })
                .unwrap()
        }

        fn output(&self, rel: &str) -> PathBuf {
            self.project.path().join(rel)
        }

        fn read(&self, rel: &str) -> String {
            std::fs::read_to_string(self.output(rel)).unwrap()
        }

        async fn generate(&self, meta: &TemplateMeta, options: &GenerationOptions) -> GenerationReport {
            self.service()
                .generate_rules(self.project.path(), meta, options, |_| {})
                .await
                .unwrap()
        }
    }

    fn rules_dir() -> &'static str {
        ".cursor/rules/rules-kit"
    }

    #[test]
    fn test_build_meta() {
        let fixture = Fixture::new();
        let meta = fixture.meta("12", "ddd");

        assert_eq!(meta.stack.as_deref(), Some("laravel"));
        assert_eq!(meta.detected_version.as_deref(), Some("12"));
        assert_eq!(meta.version_range.as_deref(), Some("v11-12"));
        assert_eq!(meta.formatted_version_name.as_deref(), Some("Laravel 12.x"));
        assert_eq!(meta.architecture.as_deref(), Some("ddd"));
        assert_eq!(meta.cursor_path.as_deref(), Some(".cursor/rules/rules-kit"));
    }

    #[test]
    fn test_build_meta_detects_version_and_default_architecture() {
        let fixture = Fixture::new();
        std::fs::write(
            fixture.project.path().join("composer.json"),
            r#"{ "require": { "laravel/framework": "^10.2" } }"#,
        )
        .unwrap();

        let meta = fixture
            .service()
            .build_meta(&Selection {
                stack: "laravel".to_string(),
                project_path: fixture.project.path().to_path_buf(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(meta.detected_version.as_deref(), Some("10"));
        assert_eq!(meta.version_range.as_deref(), Some("v10"));
        assert_eq!(meta.architecture.as_deref(), Some("standard"));
    }

    #[test]
    fn test_build_meta_rejects_unknown_stack() {
        let fixture = Fixture::new();
        let err = fixture
            .service()
            .build_meta(&Selection {
                stack: "rails".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_laravel_12_ddd_uses_expected_layers() {
        let fixture = Fixture::new();
        let report = fixture
            .generate(&fixture.meta("12", "ddd"), &GenerationOptions::default())
            .await;

        assert!(report.is_success());
        let mut written: Vec<String> = report
            .written
            .iter()
            .map(|p| {
                p.strip_prefix(fixture.output(rules_dir()))
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        written.sort();
        assert_eq!(
            written,
            vec![
                "global/coding-style.mdc",
                "laravel/controllers.mdc",
                "laravel/models.mdc",
                "laravel/routing.mdc",
            ]
        );

        let routing = fixture.read(&format!("{}/laravel/routing.mdc", rules_dir()));
        assert!(routing.contains("Routing for Laravel 12.x"));
        assert!(!routing.contains("Old routing"));
        assert!(!fixture
            .output(&format!("{}/laravel/ports.mdc", rules_dir()))
            .exists());
        assert!(!fixture.output(&format!("{}/nextjs", rules_dir())).exists());
    }

    #[tokio::test]
    async fn test_architecture_overrides_base() {
        let fixture = Fixture::new();
        let report = fixture
            .generate(&fixture.meta("12", "ddd"), &GenerationOptions::default())
            .await;

        assert_eq!(report.overridden, 1);
        let controllers = fixture.read(&format!("{}/laravel/controllers.mdc", rules_dir()));
        assert!(controllers.contains("DDD controllers"));
        assert!(!controllers.contains("Base controllers"));
        assert!(controllers.contains("globs: src/Domain/**/*.php\n"));
    }

    #[tokio::test]
    async fn test_placeholders_substituted_in_output() {
        let fixture = Fixture::new();
        fixture
            .generate(&fixture.meta("11", "standard"), &GenerationOptions::default())
            .await;

        let models = fixture.read(&format!("{}/laravel/models.mdc", rules_dir()));
        assert!(models.ends_with("Models in /app\n"));
        assert!(models.contains("globs: **/*.php\n"));
        let controllers = fixture.read(&format!("{}/laravel/controllers.mdc", rules_dir()));
        assert!(controllers.contains("Base controllers for laravel"));
    }

    #[tokio::test]
    async fn test_regeneration_is_idempotent() {
        let fixture = Fixture::new();
        let meta = fixture.meta("12", "ddd");
        let options = GenerationOptions {
            update: true,
            ..Default::default()
        };

        let first = fixture.generate(&meta, &options).await;
        let snapshot: Vec<(PathBuf, Vec<u8>)> = first
            .written
            .iter()
            .map(|p| (p.clone(), std::fs::read(p).unwrap()))
            .collect();

        let second = fixture.generate(&meta, &options).await;

        assert!(second.written.is_empty());
        assert_eq!(second.unchanged.len(), first.written.len());
        assert!(second.backups.is_empty());
        for (path, bytes) in snapshot {
            assert_eq!(std::fs::read(&path).unwrap(), bytes);
        }
    }

    #[tokio::test]
    async fn test_update_backs_up_changed_file() {
        let fixture = Fixture::new();
        let meta = fixture.meta("12", "standard");
        let options = GenerationOptions {
            ide: Ide::Claude,
            update: true,
            ..Default::default()
        };
        std::fs::write(fixture.output("CLAUDE.md"), "A").unwrap();

        let report = fixture.generate(&meta, &options).await;

        let backup = fixture.output("CLAUDE.md.bak-20260101-000000");
        assert_eq!(report.backups, vec![backup.clone()]);
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "A");
        assert!(fixture.read("CLAUDE.md").starts_with("# Laravel rules\n"));
    }

    #[tokio::test]
    async fn test_failed_backup_is_a_warning() {
        let fixture = Fixture::new();
        std::fs::write(fixture.output("CLAUDE.md"), "A").unwrap();
        let options = GenerationOptions {
            ide: Ide::Claude,
            update: true,
            ..Default::default()
        };

        let report = StackService::new(&fixture.config, fixture.templates.path())
            .with_file_service(FileService::with_stamp("missing/20260101-000000"))
            .generate_rules(
                fixture.project.path(),
                &fixture.meta("12", "standard"),
                &options,
                |_| {},
            )
            .await
            .unwrap();

        assert!(report.is_success());
        assert!(report.backups.is_empty());
        assert_eq!(report.backup_warnings.len(), 1);
        assert_eq!(report.backup_warnings[0].0, fixture.output("CLAUDE.md"));
        assert_eq!(report.written, vec![fixture.output("CLAUDE.md")]);
        assert!(fixture.read("CLAUDE.md").starts_with("# Laravel rules\n"));
    }

    #[tokio::test]
    async fn test_frontmatter_placeholders_reach_rule_headers() {
        let fixture = Fixture::new();
        fixture.template(
            "laravel/base/intro.md",
            "---\ndescription: {formattedVersionName} conventions\nglobs: \"{appDirectory}/Models/**/*.php\"\n---\nIntro\n",
        );
        let meta = TemplateMeta {
            app_directory: Some("src".to_string()),
            ..fixture.meta("12", "standard")
        };

        let report = fixture.generate(&meta, &GenerationOptions::default()).await;

        assert!(report.is_success());
        let intro = fixture.read(&format!("{}/laravel/intro.mdc", rules_dir()));
        assert!(intro.contains("description: Laravel 12.x conventions\n"));
        assert!(intro.contains("globs: src/Models/**/*.php\n"));
    }

    #[tokio::test]
    async fn test_without_update_no_backup() {
        let fixture = Fixture::new();
        std::fs::write(fixture.output("CLAUDE.md"), "A").unwrap();
        let options = GenerationOptions {
            ide: Ide::Claude,
            ..Default::default()
        };

        let report = fixture.generate(&fixture.meta("12", "standard"), &options).await;

        assert!(report.backups.is_empty());
        assert!(!fixture.output("CLAUDE.md.bak-20260101-000000").exists());
    }

    #[tokio::test]
    async fn test_single_file_aggregation_order() {
        let fixture = Fixture::new();
        let options = GenerationOptions {
            ide: Ide::Codex,
            ..Default::default()
        };

        let report = fixture
            .generate(&fixture.meta("12", "standard"), &options)
            .await;

        assert_eq!(report.output, fixture.output("AGENTS.md"));
        let doc = fixture.read("AGENTS.md");
        let order: Vec<usize> = [
            "rules-kit:begin global/coding-style.md",
            "rules-kit:begin laravel/base/controllers.md",
            "rules-kit:begin laravel/base/models.md",
            "rules-kit:begin laravel/v11-12/routing.md",
        ]
        .iter()
        .map(|marker| doc.find(marker).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(doc.matches("rules-kit:end").count(), 4);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let fixture = Fixture::new();
        let mut values = Vec::new();

        fixture
            .service()
            .generate_rules(
                fixture.project.path(),
                &fixture.meta("12", "ddd"),
                &GenerationOptions::default(),
                |pct| values.push(pct),
            )
            .await
            .unwrap();

        assert_eq!(values.len(), 4);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_empty_plan_reports_100() {
        let fixture = Fixture::new();
        let meta = fixture
            .service()
            .build_meta(&Selection {
                stack: "nextjs".to_string(),
                ..Default::default()
            })
            .unwrap();
        std::fs::remove_dir_all(fixture.templates.path().join("nextjs")).unwrap();
        let mut values = Vec::new();
        let options = GenerationOptions {
            include_global: false,
            ..Default::default()
        };

        let report = fixture
            .service()
            .generate_rules(fixture.project.path(), &meta, &options, |pct| values.push(pct))
            .await
            .unwrap();

        assert_eq!(report.planned, 0);
        assert_eq!(values, vec![100]);
    }

    #[tokio::test]
    async fn test_bad_template_does_not_stop_run() {
        let fixture = Fixture::new();
        fixture.template("laravel/base/broken.md", "---\nglobs: [unclosed\n---\nbody\n");

        let report = fixture
            .generate(&fixture.meta("12", "standard"), &GenerationOptions::default())
            .await;

        assert_eq!(report.failure_count(), 1);
        assert!(matches!(
            report.failures[0].error,
            KitError::Frontmatter { .. }
        ));
        assert_eq!(report.written.len(), 4);
    }

    #[tokio::test]
    async fn test_global_layer_optional() {
        let fixture = Fixture::new();
        let options = GenerationOptions {
            include_global: false,
            ..Default::default()
        };

        fixture.generate(&fixture.meta("12", "standard"), &options).await;

        assert!(!fixture.output(&format!("{}/global", rules_dir())).exists());
    }

    #[tokio::test]
    async fn test_mcp_tools_use_separate_subtree() {
        let fixture = Fixture::new();
        let options = GenerationOptions {
            mcp_tools: vec!["github".to_string()],
            ..Default::default()
        };

        fixture.generate(&fixture.meta("12", "standard"), &options).await;

        let usage = fixture.read(&format!("{}/mcp-tools/github/usage.mdc", rules_dir()));
        assert!(usage.contains("alwaysApply: true"));
    }

    #[tokio::test]
    async fn test_unknown_mcp_tool_is_fatal() {
        let fixture = Fixture::new();
        let options = GenerationOptions {
            mcp_tools: vec!["jira".to_string()],
            ..Default::default()
        };

        let err = fixture
            .service()
            .generate_rules(
                fixture.project.path(),
                &fixture.meta("12", "standard"),
                &options,
                |_| {},
            )
            .await
            .unwrap_err();

        assert!(matches!(err, KitError::UnknownMcpTool { .. }));
        assert!(!fixture.output(rules_dir()).exists());
    }

    #[tokio::test]
    async fn test_mirror_docs() {
        let fixture = Fixture::new();
        let options = GenerationOptions {
            mirror_docs: true,
            ..Default::default()
        };

        fixture.generate(&fixture.meta("12", "standard"), &options).await;

        assert_eq!(
            fixture.read("docs/rules-kit/laravel/models.md"),
            "Models in /app\n"
        );
    }

    #[tokio::test]
    async fn test_update_reports_stale_files() {
        let fixture = Fixture::new();
        let stale = fixture.output(&format!("{}/laravel/removed.mdc", rules_dir()));
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old rule").unwrap();
        let options = GenerationOptions {
            update: true,
            ..Default::default()
        };

        let report = fixture.generate(&fixture.meta("12", "standard"), &options).await;

        assert_eq!(report.stale, vec![stale.clone()]);
        assert!(stale.exists());
    }

    #[tokio::test]
    async fn test_windsurf_output_location() {
        let fixture = Fixture::new();
        let options = GenerationOptions {
            ide: Ide::Windsurf,
            include_global: false,
            ..Default::default()
        };

        fixture.generate(&fixture.meta("10", "standard"), &options).await;

        let routing = fixture.read(".windsurf/rules/laravel/routing.md");
        assert!(routing.starts_with("---\ntrigger: glob\n"));
        assert!(routing.contains("Old routing"));
    }

    #[tokio::test]
    async fn test_shipped_templates_generate_cleanly() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let config = ConfigService::new(root.join("kit-config.json"));
        let service = StackService::new(&config, &root);
        let project = TempDir::new().unwrap();

        let meta = service
            .build_meta(&Selection {
                stack: "laravel".to_string(),
                project_path: project.path().to_path_buf(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(meta.version_range.as_deref(), Some("v12"));

        let report = service
            .generate_rules(project.path(), &meta, &GenerationOptions::default(), |_| {})
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.planned, 6);
        assert!(project
            .path()
            .join(".cursor/rules/rules-kit/laravel/routing.mdc")
            .exists());
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
