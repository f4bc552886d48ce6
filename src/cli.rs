use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use regflow::{
    Config, FileStorage, FormSnapshot, HeadlessBrowser, HttpFetcher, NavOutcome, PersistenceStore,
    Region, SubmitOutcome, Submitter, WizardController,
};
use reqwest::Url;

#[derive(Parser, Debug)]
#[command(name = "regflow", version, about = "Drive a server-rendered registration wizard")]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (defaults to ~/.regflow/config.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Data directory (defaults to ~/.regflow)")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Server origin, overrides the config file")]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a page and print the current step
    Open { path: String },
    /// Load a page, then follow one of its step links
    Step { path: String, href: String },
    /// Load a page, fill fields and submit the form
    Submit {
        path: String,
        #[arg(long = "set", value_parser = parse_pair, help = "Field edit as name=value")]
        set: Vec<(String, String)>,
        #[arg(long, value_parser = parse_pair, help = "Submit control as name=value")]
        submitter: Option<(String, String)>,
    },
    /// Inspect the persisted draft
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    Show,
    Clear,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("empty field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load(),
    };
    Ok(match &cli.base_url {
        Some(base_url) => config.with_base_url(base_url.clone()),
        None => config,
    })
}

fn storage(config: &Config) -> PersistenceStore {
    PersistenceStore::new(
        Arc::new(FileStorage::new(regflow::util::drafts_dir())),
        &config.storage_key,
    )
}

async fn open(config: &Config, path: &str) -> Result<WizardController> {
    let start = Url::parse(&config.base_url)
        .and_then(|base| base.join(path))
        .with_context(|| format!("resolving {path} against {}", config.base_url))?;
    let fetcher = HttpFetcher::new(config.request_timeout)?;
    let browser = Arc::new(HeadlessBrowser::new(start));
    let controller = WizardController::new(config.clone(), Arc::new(fetcher), browser)
        .with_storage(Arc::new(FileStorage::new(regflow::util::drafts_dir())));
    controller.load().await?;
    Ok(controller)
}

fn print_region(controller: &WizardController) {
    let nav = controller.navigation();
    println!("url: {}", nav.current_url);
    let Some(region) = controller.region() else {
        println!("(no #{} container on this page)", nav.container_id);
        return;
    };
    print_fields(&region, &controller.config().step_field);
    for link in region.step_links() {
        println!("link: {} -> {}", link.label, link.href);
    }
}

fn print_fields(region: &Region, step_field: &str) {
    let Some(form) = region.form() else {
        println!("(no form)");
        return;
    };
    if let Some(step) = form.step(step_field) {
        println!("step: {step}");
    }
    for field in form.fields() {
        let marker = if field.required { "*" } else { " " };
        let state = if field.kind.is_checkable() {
            format!("{} [{}]", field.value, if field.checked { "x" } else { " " })
        } else {
            field.value.clone()
        };
        println!("{marker} {:<24} {:?} {state}", field.name, field.kind);
    }
}

fn print_outcome(outcome: &NavOutcome) {
    match outcome {
        NavOutcome::Swapped { url, history } => println!("swapped: {url} ({history:?})"),
        NavOutcome::HardNavigated { url } => println!("left the flow: {url}"),
        NavOutcome::Superseded => println!("superseded by a newer navigation"),
        NavOutcome::Ignored => println!("ignored"),
    }
}

fn print_snapshot(snapshot: &FormSnapshot) {
    if snapshot.is_empty() {
        println!("(no saved draft)");
        return;
    }
    for (name, value) in snapshot.iter() {
        println!("{name} = {value:?}");
    }
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Open { path } => {
            let controller = open(&config, &path).await?;
            print_region(&controller);
        }
        Commands::Step { path, href } => {
            let controller = open(&config, &path).await?;
            let outcome = controller.follow_step(&href).await?;
            print_outcome(&outcome);
            print_region(&controller);
        }
        Commands::Submit {
            path,
            set,
            submitter,
        } => {
            let controller = open(&config, &path).await?;
            for (name, value) in &set {
                // Re-read each time: a service selection can add fields
                let form = controller
                    .form()
                    .ok_or_else(|| anyhow!("no form on {path}"))?;
                let checkable = form
                    .field(name)
                    .is_some_and(|field| field.kind.is_checkable());
                if checkable {
                    controller.change(name, value, true).await?;
                } else {
                    controller.input(name, value)?;
                }
            }

            let submitter = submitter.map(|(name, value)| Submitter::new(name, value));
            match controller.submit(submitter).await? {
                SubmitOutcome::Invalid { fields } => {
                    println!("missing required fields: {}", fields.join(", "));
                }
                SubmitOutcome::DuplicateFound(result) => {
                    println!("existing customer found, submission dropped");
                    if let Some(customer) = &result.customer {
                        for (label, value) in customer.display_rows() {
                            println!("  {label:<14} {value}");
                        }
                        if let Some(url) = &customer.create_order_url {
                            println!("  create order: {url}");
                        }
                        if let Some(url) = &customer.detail_url {
                            println!("  view:         {url}");
                        }
                    }
                }
                SubmitOutcome::Submitted(outcome) => {
                    print_outcome(&outcome);
                    print_region(&controller);
                }
                SubmitOutcome::Superseded => println!("superseded by a newer navigation"),
            }
        }
        Commands::Draft { command } => {
            let store = storage(&config);
            match command {
                DraftCommands::Show => print_snapshot(&store.load()),
                DraftCommands::Clear => {
                    store.clear();
                    println!("draft cleared");
                }
            }
        }
    }
    Ok(())
}
