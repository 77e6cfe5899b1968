//! Template Tree CLI
//!
//! Usage:
//!   template-tree [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>       Settings file (TOML format)
//!   -b, --base-dir <DIR>      Template base directory (repeatable)
//!   -s, --set <KEY=VALUE>     Root placeholder; VALUE is JSON or a plain string
//!   --child <PATH=FILE>       Attach FILE as a child at a slash-separated path
//!   -m, --markers             Wrap node output in start/end comments
//!   --check                   Report syntax errors in FILE instead of rendering
//!   -v, --verbose             Debug logging
//!   -h, --help                Print help

use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use template_tree::{
    parse, Environment, NodeId, Placeholders, Settings, Template, TemplateError, ViewSpec,
};

#[derive(Parser)]
#[command(name = "template-tree")]
#[command(about = "Render hierarchical text templates with inherited placeholders")]
struct Cli {
    /// Root template, relative to the base directories (renders the settings' view if omitted)
    file: Option<String>,

    /// Settings file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template base directory, searched in the order given
    #[arg(short, long = "base-dir", value_name = "DIR")]
    base_dir: Vec<PathBuf>,

    /// Root placeholder as KEY=VALUE
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, Value)>,

    /// Attach a child template as PATH=FILE, e.g. header/nav=nav.html
    #[arg(long, value_name = "PATH=FILE", value_parser = parse_child)]
    child: Vec<(String, String)>,

    /// Wrap each node's output in start/end marker comments
    #[arg(short, long)]
    markers: bool,

    /// Check FILE for syntax errors without rendering
    #[arg(long, requires = "file")]
    check: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(message) = run(cli) {
        eprintln!("Error: {}", message);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .map_err(|e| format!("loading settings '{}': {}", path.display(), e))?,
        None => Settings::default(),
    };
    settings.base_directories.extend(cli.base_dir.iter().cloned());
    if settings.base_directories.is_empty() {
        settings.base_directories.push(PathBuf::from("."));
    }
    if cli.markers {
        settings.render.verbose = true;
    }

    let env = Arc::new(Environment::from_settings(&settings).map_err(|e| e.to_string())?);
    debug!(directories = ?env.locator().base_directories(), "environment ready");

    if cli.check {
        let file = cli.file.as_deref().unwrap_or_default();
        return check(&env, file);
    }

    let placeholders: Placeholders = cli.set.into_iter().collect();
    let mut template = match (&cli.file, &settings.view) {
        (Some(file), _) => env
            .template(file, placeholders.clone())
            .map_err(|e| e.to_string())?,
        (None, Some(view)) => build_view(&env, view, &placeholders)?,
        (None, None) => {
            return Err("no template given and the settings define no [view]".to_string())
        }
    };

    for (path, file) in &cli.child {
        attach_child(&mut template, path, file).map_err(|e| e.to_string())?;
    }

    println!("{}", template.render_root(&Placeholders::new()));
    Ok(())
}

fn build_view(env: &Arc<Environment>, view: &ViewSpec, placeholders: &Placeholders) -> Result<Template, String> {
    let mut template = view.build(Arc::clone(env)).map_err(|e| e.to_string())?;
    let root = template.root();
    for (key, value) in placeholders.iter() {
        template
            .set(root, key, value.clone())
            .map_err(|e| e.to_string())?;
    }
    Ok(template)
}

/// Attach `file` at a path like `header/nav`; every segment but the last must exist
fn attach_child(template: &mut Template, path: &str, file: &str) -> Result<(), TemplateError> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let name = segments.pop().unwrap_or(path);

    let mut parent: NodeId = template.root();
    for segment in segments {
        parent = template.child(parent, segment)?;
    }
    template.add_child_by_file(parent, name, file, Placeholders::new())?;
    Ok(())
}

fn check(env: &Environment, file: &str) -> Result<(), String> {
    let path = env.locator().resolve(file).map_err(|e| e.to_string())?;
    let source = fs::read_to_string(&path)
        .map_err(|e| format!("reading '{}': {}", path.display(), e))?;

    match parse(&source) {
        Ok(_) => {
            println!("{}: ok", file);
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("{}", error.format(&source, file));
            }
            Err(format!("{} syntax error(s) in '{}'", errors.len(), file))
        }
    }
}

fn parse_assignment(arg: &str) -> Result<(String, Value), String> {
    let (key, value) = split_pair(arg, "KEY=VALUE")?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_child(arg: &str) -> Result<(String, String), String> {
    let (path, file) = split_pair(arg, "PATH=FILE")?;
    Ok((path.to_string(), file.to_string()))
}

fn split_pair<'a>(arg: &'a str, form: &str) -> Result<(&'a str, &'a str), String> {
    match arg.split_once('=') {
        Some((left, right)) if !left.is_empty() => Ok((left, right)),
        _ => Err(format!("expected {}, got '{}'", form, arg)),
    }
}
