//! Developer harness: schema + JSON documents → validation report | locals
use std::path::{Path as FsPath, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use typeform::validation::ValidationError;
use typeform::{path_de, type_from_schema, FieldOptions, Form, FormConfig, Locals, Type};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build a form from a JSON Schema and run documents through it
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate each document and print a report per document
    Validate(ValidateOut),
    /// print the render-ready locals tree for each document
    Locals(LocalsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct FormSettings {
    /// JSON Schema describing the documents
    #[arg(long, short)]
    schema: PathBuf,

    /// field options (JSON)
    #[arg(long)]
    options: Option<PathBuf>,

    /// form config (JSON): auto, i18n, uidSeed, requiredPolicy, ...
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ValidateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    form_settings: FormSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct LocalsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    form_settings: FormSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report {
    source: String,
    valid: bool,
    value: Value,
    errors: Vec<ValidationError>,
}

#[derive(Serialize)]
struct LocalsReport {
    source: String,
    locals: Locals,
}

/// Everything needed to build one form per document.
struct Blueprint {
    ty: Type,
    schema: Value,
    options: FieldOptions,
    config: FormConfig,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(String, Value) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let json_value = read_json(&source_path)?;
            let json_value = match self.json_pointer.as_deref() {
                None => json_value,
                Some(pointer) => json_value
                    .pointer(pointer)
                    .cloned()
                    .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing in {source_path_str}"))?,
            };
            match self.jq_expr.as_ref() {
                None => apply(source_path_str, json_value)?,
                Some(jq_expr) => {
                    let results = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                        format!("failed to apply jq expression to source file ({source_path_str})")
                    })?;
                    for (i, json_value) in results.into_iter().enumerate() {
                        apply(format!("{source_path_str}#{i}"), json_value)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl FormSettings {
    fn blueprint(&self) -> Result<Blueprint> {
        let schema = read_json(&self.schema)?;
        let ty = type_from_schema(&schema).with_context(|| format!("schema {}", self.schema.display()))?;
        let options = match &self.options {
            Some(path) => path_de::from_str_with_path(&read_text(path)?)
                .with_context(|| format!("options {}", path.display()))?,
            None => FieldOptions::default(),
        };
        let config = match &self.config {
            Some(path) => FormConfig::from_json_str(&read_text(path)?)
                .with_context(|| format!("config {}", path.display()))?,
            None => FormConfig::default(),
        };
        Ok(Blueprint { ty, schema, options, config })
    }
}

impl Blueprint {
    fn form(&self, value: Value) -> Result<Form> {
        let form = Form::builder(self.ty.clone(), value)
            .options(self.options.clone())
            .config(self.config.clone())
            .original_schema(self.schema.clone())
            .build()?;
        Ok(form)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Validate(target) => {
                let blueprint = target.form_settings.blueprint()?;
                let mut reports = Vec::new();
                target.input_settings.load_process(|source, value| {
                    let mut form = blueprint.form(value)?;
                    let result = form.validate();
                    tracing::debug!(%source, errors = result.errors.len(), "validated");
                    reports.push(Report { source, valid: result.is_valid(), value: result.value, errors: result.errors });
                    Ok(())
                })?;
                let failed = reports.iter().filter(|r| !r.valid).count();
                write_output(target.out.as_deref(), &serde_json::to_string_pretty(&reports)?)?;
                let summary = format!("{} documents, {} valid, {} invalid", reports.len(), reports.len() - failed, failed);
                if failed == 0 {
                    eprintln!("{} {summary}", "✔".green().bold());
                } else {
                    eprintln!("{} {summary}", "✘".red().bold());
                }
                Ok(())
            }
            Command::Locals(target) => {
                let blueprint = target.form_settings.blueprint()?;
                let mut reports = Vec::new();
                target.input_settings.load_process(|source, value| {
                    let form = blueprint.form(value)?;
                    reports.push(LocalsReport { source, locals: form.locals() });
                    Ok(())
                })?;
                write_output(target.out.as_deref(), &serde_json::to_string_pretty(&reports)?)?;
                eprintln!("{} {} documents", "✔".green().bold(), reports.len());
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_text(path: &FsPath) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_json(path: &FsPath) -> Result<Value> {
    let source = read_text(path)?;
    serde_json::from_str(&source).with_context(|| format!("failed to parse JSON source file ({})", path.display()))
}

fn write_output(out: Option<&FsPath>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
