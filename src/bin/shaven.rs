use std::{io::Write, path::PathBuf, sync::atomic::Ordering};

use anyhow::{Result, Context as _};
use clap::Parser as ClapParser;
use shaven::{TRACE, Bindings, Context, MissingBindingPolicy, Presenter, RenderConfig};

fn read_file(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("reading {:?}", path))
}

#[derive(clap::Parser, Debug)]
/// Render an HTML template, with the values from a JSON file as the
/// bindings, to stdout.
struct Args {
    /// Path to the template
    #[clap(required(true))]
    template: PathBuf,

    /// Path to a file with a JSON object; its keys are the bindings
    /// available to the template
    #[clap(long)]
    context: Option<PathBuf>,

    /// The attribute holding binding names (default: "rb")
    #[clap(long)]
    attribute: Option<String>,

    /// What to do with binding names that have no value: "fail"
    /// (default) or "skip"
    #[clap(long)]
    missing: Option<String>,

    /// Show each binding as it is resolved, on stderr
    #[clap(long)]
    trace: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    TRACE.store(args.trace, Ordering::SeqCst);

    let mut config = RenderConfig::default();
    if let Some(attribute) = &args.attribute {
        config = config.binding_attribute(attribute);
    }
    if let Some(missing) = &args.missing {
        config = config.missing(missing.parse::<MissingBindingPolicy>()?);
    }

    let template = read_file(&args.template)?;
    let context = match &args.context {
        Some(path) => {
            let json = serde_json::from_str(&read_file(path)?)
                .with_context(|| format!("parsing {:?}", path))?;
            Context::from_json(json)
                .with_context(|| format!("in {:?}", path))?
        }
        None => Context::new(),
    };

    let mut presenter = Presenter::feed_with_config(&template, Bindings::new(), config)
        .with_context(|| format!("parsing {:?}", args.template))?;
    let html = presenter.render(&context)?;

    let mut out = std::io::stdout().lock();
    out.write_all(html.as_bytes())?;
    out.flush()?;
    Ok(())
}
