use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use url::Url;

use xinclude::fetch::FragmentFetcher;
use xinclude::storage::FileBackend;
use xinclude::{
    load_config, AppConfig, Document, FragmentLoader, FsFetcher, HttpFetcher, Page, Storage,
};

#[derive(Parser, Debug)]
#[command(
    name = "xinclude",
    version,
    about = "Resolve data-include fragments in an HTML page and print the composed document"
)]
struct Cli {
    /// HTML page to compose
    input: PathBuf,

    /// Base for fragment sources: an http(s) URL or a directory (default: the input's directory)
    #[arg(long)]
    base: Option<String>,

    /// Config file (.yaml, .yml, .json or .toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file backing persistent storage
    #[arg(long)]
    state: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hoist scripts without executing them
    #[arg(long)]
    no_scripts: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if cli.no_scripts {
        config.loader.execute_scripts = false;
    }

    let html = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let fetcher = build_fetcher(&cli, &config)?;
    tracing::info!(input = %cli.input.display(), fetcher = %fetcher.describe(), "Composing page");

    let loader = FragmentLoader::new(fetcher, config.loader.clone());
    let storage = match cli.state.as_ref().or(config.page.storage_path.as_ref()) {
        Some(path) => Storage::new(Arc::new(FileBackend::new(path))),
        None => Storage::in_memory(),
    };

    let page = Page::new(Document::parse(&html), loader)
        .with_config(config.page.clone())
        .with_storage(storage);
    let page = attach_runtime(page, &config)?;

    let report = page.init().await;
    let totals = report.load.script_totals();
    tracing::info!(
        spliced = report.load.spliced(),
        failed = report.load.failed(),
        skipped = report.load.skipped(),
        scripts_executed = totals.executed,
        scripts_failed = totals.failed,
        "Load finished"
    );

    let composed = page.into_document().to_html();
    match &cli.output {
        Some(path) => tokio::fs::write(path, composed)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", composed),
    }

    report.result?;
    Ok(())
}

fn build_fetcher(cli: &Cli, config: &AppConfig) -> anyhow::Result<Arc<dyn FragmentFetcher>> {
    let base = match &cli.base {
        Some(base) => base.clone(),
        None => {
            let dir = cli.input.parent().unwrap_or_else(|| Path::new("."));
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir
            };
            return Ok(Arc::new(FsFetcher::new(dir)));
        }
    };

    if base.starts_with("http://") || base.starts_with("https://") {
        let mut url = Url::parse(&base).with_context(|| format!("invalid base URL: {}", base))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Arc::new(HttpFetcher::new(url, &config.http)?))
    } else {
        Ok(Arc::new(FsFetcher::new(base)))
    }
}

#[cfg(feature = "builtin-script-js")]
fn attach_runtime(page: Page, config: &AppConfig) -> anyhow::Result<Page> {
    use std::cell::RefCell;
    use std::rc::Rc;

    if !config.loader.execute_scripts {
        return Ok(page);
    }
    let runtime = xinclude::BoaScriptRuntime::new(xinclude::BoaRuntimeConfig::default())?;
    Ok(page.with_runtime(Rc::new(RefCell::new(runtime))))
}

#[cfg(not(feature = "builtin-script-js"))]
fn attach_runtime(page: Page, config: &AppConfig) -> anyhow::Result<Page> {
    if config.loader.execute_scripts {
        tracing::warn!("Built without a script runtime; scripts are hoisted but not run");
    }
    Ok(page)
}
