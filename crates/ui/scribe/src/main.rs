mod cli;
mod config;
mod errors;
mod logging;
mod session;
mod tui;
mod view;

use clap::Parser;
use color_eyre::Result;
use schema_form::{Form, FormDriver, MemoryToolkit, SchemaDocument};
use tracing::info;

use crate::cli::{Cli, Cmd};
use crate::config::Config;
use crate::session::TerminalSession;

fn main() -> Result<()> {
    errors::init()?;
    let args = Cli::parse();
    config::ensure_data_and_config_dirs_exist()?;
    let cfg = Config::new()?;
    let _log_guard = logging::init(&cfg)?;

    match args.cmd {
        Cmd::Run {
            schema,
            root,
            title,
        } => {
            let doc = load(&schema, root)?;
            let mut settings = cfg.form.clone();
            if let Some(title) = title {
                settings.title = title;
            }
            let driver = FormDriver::new(doc.dispatcher(settings));

            let mut session = TerminalSession::new(driver.dispatcher().settings().title.clone())?;
            let outcome = driver.run(MemoryToolkit::new(), doc.root(), &mut session);
            session.exit()?;
            let outcome = outcome?;

            info!(confirmed = outcome.is_confirmed(), "form closed");
            println!("{}", serde_json::to_string_pretty(&outcome.into_values())?);
        }
        Cmd::Check { schema, root } => {
            let doc = load(&schema, root)?;
            let form = Form::build(&doc.dispatcher(cfg.form.clone()), MemoryToolkit::new(), doc.root())?;
            println!("{}", serde_json::to_string_pretty(&form.extract().to_json())?);
        }
    }
    Ok(())
}

fn load(path: &std::path::Path, root: Option<String>) -> Result<SchemaDocument> {
    let doc = SchemaDocument::load(path)?;
    info!(path = %path.display(), root = doc.root(), "schema loaded");
    Ok(match root {
        Some(root) => doc.with_root(root)?,
        None => doc,
    })
}
