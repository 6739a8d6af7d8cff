mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use oax_client::Transport;
use oax_core::document::{self, OpenApiSpec};
use oax_core::extract::{self, ParsedOperation};
use oax_core::fields::{self, FieldDescriptor};
use oax_core::request::{Credentials, RequestBuilder, RequestDescription, resolve_base_url};

use config::Profile;

#[derive(Parser)]
#[command(name = "oax", about = "Generic OpenAPI operation executor", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an OpenAPI document
    Validate {
        #[command(flatten)]
        source: SpecSource,
    },

    /// List the operations a document defines
    Operations {
        #[command(flatten)]
        source: SpecSource,
    },

    /// Show the fillable fields of one operation
    Fields {
        #[command(flatten)]
        source: SpecSource,

        /// Operation id to describe
        #[arg(short, long)]
        operation: String,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Assemble a request description without sending it
    Build {
        #[command(flatten)]
        source: SpecSource,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Assemble a request and perform it
    Invoke {
        #[command(flatten)]
        source: SpecSource,

        #[command(flatten)]
        request: RequestArgs,

        /// JSON file with an array of per-item inputs: {"params": .., "body": ..}
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args)]
struct SpecSource {
    /// Path to the OpenAPI document (YAML or JSON)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// URL to fetch the OpenAPI document from
    #[arg(long)]
    url: Option<String>,

    /// Connection profile (specUrl, baseUrlOverride, credentials)
    #[arg(long)]
    profile: Option<PathBuf>,
}

#[derive(Args)]
struct RequestArgs {
    /// Operation id to execute
    #[arg(short, long)]
    operation: String,

    /// Parameter value as name=value; repeatable
    #[arg(short, long = "param")]
    param: Vec<String>,

    /// Request body as a raw JSON string
    #[arg(short = 'j', long = "json")]
    json_body: Option<String>,

    /// Body property holding binary content (multipart only)
    #[arg(long)]
    binary_property: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { source } => cmd_validate(&source),

        Commands::Operations { source } => cmd_operations(&source),

        Commands::Fields {
            source,
            operation,
            format,
        } => cmd_fields(&source, &operation, format),

        Commands::Build { source, request } => cmd_build(&source, &request),

        Commands::Invoke {
            source,
            request,
            items,
        } => cmd_invoke(&source, &request, items.as_deref()),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oax", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_validate(source: &SpecSource) -> Result<()> {
    let profile = load_profile_opt(source)?;
    let spec = load_document(source, &profile)?;
    println!(
        "{} {} is valid ({} path(s))",
        spec.info.title,
        spec.info.version,
        spec.paths.len()
    );
    Ok(())
}

fn cmd_operations(source: &SpecSource) -> Result<()> {
    let profile = load_profile_opt(source)?;
    let spec = load_document(source, &profile)?;
    let ops = extract::extract(&spec);

    for op in &ops {
        println!(
            "{:<32} {:<7} {:<40} {}",
            op.operation_id,
            op.method.as_str(),
            op.path,
            op.summary
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct FieldListing {
    parameters: Vec<FieldDescriptor>,
    body: Vec<FieldDescriptor>,
}

fn cmd_fields(source: &SpecSource, operation: &str, format: OutputFormat) -> Result<()> {
    let profile = load_profile_opt(source)?;
    let spec = load_document(source, &profile)?;
    let ops = extract::extract(&spec);
    let op = extract::find_operation(&ops, operation)?;

    let listing = FieldListing {
        parameters: fields::parameters_to_fields(&op.parameters),
        body: fields::schema_to_fields(
            op.request_body.as_ref().and_then(|b| b.schema.as_ref()),
            &op.operation_id,
        ),
    };

    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&listing)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
    }
    Ok(())
}

fn cmd_build(source: &SpecSource, request: &RequestArgs) -> Result<()> {
    let profile = load_profile_opt(source)?;
    let spec = load_document(source, &profile)?;
    let ops = extract::extract(&spec);
    let op = extract::find_operation(&ops, &request.operation)?;

    let base_url = effective_base_url(&spec, request, &profile);
    let values = parse_params(&request.param)?;
    let body = parse_body(request)?;

    let description = assemble(
        op,
        &base_url,
        &values,
        body.as_ref(),
        request.binary_property.as_deref(),
        &profile.credentials,
    )?;
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct ItemInput {
    #[serde(default)]
    params: IndexMap<String, Value>,

    #[serde(default)]
    body: Option<Value>,
}

fn cmd_invoke(source: &SpecSource, request: &RequestArgs, items: Option<&Path>) -> Result<()> {
    let profile = load_profile_opt(source)?;
    let spec = load_document(source, &profile)?;
    let ops = extract::extract(&spec);
    let op = extract::find_operation(&ops, &request.operation)?;

    let base_url = effective_base_url(&spec, request, &profile);
    let transport = Transport::new();

    let Some(items_path) = items else {
        let values = parse_params(&request.param)?;
        let body = parse_body(request)?;
        let description = assemble(
            op,
            &base_url,
            &values,
            body.as_ref(),
            request.binary_property.as_deref(),
            &profile.credentials,
        )?;
        let response = transport.execute(&description)?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    };

    let raw = fs::read_to_string(items_path)
        .with_context(|| format!("failed to read {}", items_path.display()))?;
    let batch: Vec<ItemInput> =
        serde_json::from_str(&raw).context("items file must be a JSON array")?;

    // One request per item, in order; a failed item never cancels the rest.
    let mut results = Vec::with_capacity(batch.len());
    for item in &batch {
        let outcome = assemble(
            op,
            &base_url,
            &item.params,
            item.body.as_ref(),
            request.binary_property.as_deref(),
            &profile.credentials,
        )
        .and_then(|description| transport.execute(&description).map_err(Into::into));
        results.push(match outcome {
            Ok(value) => value,
            Err(err) => json!({ "error": err.to_string() }),
        });
    }
    println!("{}", serde_json::to_string_pretty(&Value::Array(results))?);
    Ok(())
}

fn load_profile_opt(source: &SpecSource) -> Result<Profile> {
    match &source.profile {
        Some(path) => config::load_profile(path),
        None => Ok(Profile::default()),
    }
}

fn load_spec_text(source: &SpecSource, profile: &Profile) -> Result<String> {
    if let Some(path) = &source.input {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let url = source
        .url
        .as_deref()
        .or(profile.spec_url.as_deref())
        .ok_or_else(|| anyhow!("no spec source: pass --input, --url, or a profile with specUrl"))?;
    log::debug!("no local input, fetching spec from {url}");
    Ok(Transport::new().fetch_spec(url)?)
}

fn load_document(source: &SpecSource, profile: &Profile) -> Result<OpenApiSpec> {
    let text = load_spec_text(source, profile)?;
    Ok(document::load(&text)?)
}

fn effective_base_url(spec: &OpenApiSpec, request: &RequestArgs, profile: &Profile) -> String {
    let override_url = request
        .base_url
        .as_deref()
        .or(profile.base_url_override.as_deref());
    resolve_base_url(spec, override_url)
}

/// Parse repeated `name=value` pairs. Values are read as JSON scalars where
/// possible (`123`, `true`), plain strings otherwise.
fn parse_params(pairs: &[String]) -> Result<IndexMap<String, Value>> {
    let mut values = IndexMap::new();
    for pair in pairs {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --param '{pair}', expected name=value"))?;
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        values.insert(name.to_string(), value);
    }
    Ok(values)
}

fn parse_body(request: &RequestArgs) -> Result<Option<Value>> {
    request
        .json_body
        .as_deref()
        .map(|raw| serde_json::from_str::<Value>(raw).context("invalid JSON body"))
        .transpose()
}

fn assemble(
    op: &ParsedOperation,
    base_url: &str,
    values: &IndexMap<String, Value>,
    body: Option<&Value>,
    binary_property: Option<&str>,
    credentials: &Credentials,
) -> Result<RequestDescription> {
    let mut builder = RequestBuilder::new(op, base_url)
        .values(values)
        .credentials(credentials);
    if let Some(body) = body {
        builder = builder.body(body);
    }
    if let Some(name) = binary_property {
        builder = builder.binary_property(name);
    }
    Ok(builder.build()?)
}
