use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use static_site::context::DEFAULT_PROJECT_FILE;
use static_site::logging::init_logging;
use static_site::lookup::DEFAULT_CONTEXT_CACHE_FILE;
use static_site::{ContextCache, DeploymentContext, SiteApp, SynthError, SynthesizedStack};

/// Synthesizes the CloudFormation template for a static website.
#[derive(Debug, Parser)]
#[command(name = "static-site", version)]
struct Cli {
    /// more output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// write the stack template
    Synth(SynthArgs),
    /// resolve missing lookups against AWS, save them to the context cache, then synth
    #[cfg(feature = "aws-lookup")]
    Lookup(SynthArgs),
}

#[derive(Debug, Args)]
struct SynthArgs {
    /// context value, eg: -c domain=mystaticsite.com -c subdomain=www
    #[arg(short = 'c', long = "context", value_name = "KEY=VALUE")]
    context: Vec<String>,

    /// project file whose "context" section supplies values
    #[arg(long, default_value = DEFAULT_PROJECT_FILE)]
    project: PathBuf,

    /// cached lookup values
    #[arg(long, default_value = DEFAULT_CONTEXT_CACHE_FILE)]
    context_cache: PathBuf,

    /// .env style file of extra context values
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// account id used to key lookups
    #[arg(long)]
    account: Option<String>,

    /// directory the template is written to
    #[arg(short, long, default_value = "cdk.out")]
    output: PathBuf,

    /// print the template instead of writing it
    #[arg(long)]
    stdout: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("{e}");
    }
    if let Err(e) = run(cli.command) {
        eprintln!("{}", render_error(&e));
        std::process::exit(1);
    }
}

fn render_error(e: &SynthError) -> String {
    let mut out = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        out.push_str(&format!("\n{s}"));
        source = s.source();
    }
    out
}

fn load_context(args: &SynthArgs) -> Result<DeploymentContext, SynthError> {
    let mut context = DeploymentContext::from_project_file(&args.project)?;
    if let Some(env_file) = &args.env_file {
        context.merge(DeploymentContext::from_dotenv_file(env_file)?);
    }
    context.merge(DeploymentContext::from_args(&args.context)?);
    debug!(values = context.len(), "resolved deployment context");
    Ok(context)
}

fn app(args: &SynthArgs) -> SiteApp {
    match &args.account {
        Some(account) => SiteApp::default().with_account(account),
        None => SiteApp::default(),
    }
}

fn emit(stack: &SynthesizedStack, args: &SynthArgs) -> Result<(), SynthError> {
    if args.stdout {
        println!("{}", stack.template.to_json_pretty()?);
    } else {
        let path = stack.write_to(&args.output)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn run(command: Command) -> Result<(), SynthError> {
    match command {
        Command::Synth(args) => {
            let context = load_context(&args)?;
            let cache = ContextCache::load(&args.context_cache)?;
            let stack = app(&args).synth(&context, &cache)?;
            emit(&stack, &args)
        }
        #[cfg(feature = "aws-lookup")]
        Command::Lookup(args) => {
            let context = load_context(&args)?;
            let mut cache = ContextCache::load(&args.context_cache)?;
            let app = app(&args);
            let stack = match app.synth(&context, &cache) {
                Err(SynthError::MissingLookups(missing)) => {
                    let runtime = tokio::runtime::Runtime::new().map_err(SynthError::Runtime)?;
                    runtime.block_on(static_site::lookup::aws::resolve_missing(&missing, &mut cache))?;
                    cache.save(&args.context_cache)?;
                    app.synth(&context, &cache)?
                }
                other => other?,
            };
            emit(&stack, &args)
        }
    }
}
