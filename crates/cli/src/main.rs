#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use hello_translate_core::archive::{
    ArchiveBlobStore, ArchiveError, JsonFileStore, MemoryBlobStore, TranslationArchiver,
};
use hello_translate_core::config::{
    resolve_api_key, resolve_optional_string, ApiKeys, AppConfig, Environment, StdEnv,
    StoreConfig, DEFAULT_PAGE_SIZE, DEFAULT_SOURCE_LANG, ENV_AZURE_API_KEY, ENV_ENVIRONMENT,
    ENV_GOOGLE_API_KEY, ENV_STORE_URL,
};
use hello_translate_core::provider::{HttpPageFetcher, Platform, ProviderRegistry};
use hello_translate_core::service::{
    ProgressReporter, TranslateOptions, TranslatorService,
};
use hello_translate_core::store::{
    MemoryStoreBackend, RestStoreBackend, StoreBackend, StoreError, TranslationStore,
};
use hello_translate_core::translation::{LanguagePair, TranslationInput};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hello-translate")]
#[command(about = "Resolve translations through the local archive, the shared store and machine-translation providers")]
struct Args {
    /// Text to translate; pass several values for a batch.
    text: Vec<String>,

    /// Source language code.
    #[arg(long, default_value = DEFAULT_SOURCE_LANG)]
    from: String,

    /// Target language code.
    #[arg(long)]
    to: String,

    /// Translation provider: azure, deepl, google, yandex or random.
    #[arg(long, default_value = "google")]
    provider: Platform,

    #[arg(long, env = ENV_ENVIRONMENT, default_value = "development")]
    environment: Environment,

    /// Base URL of the shared translation store. Without it, a run keeps
    /// results to itself in an in-process store.
    #[arg(long)]
    store_url: Option<String>,

    /// Where to persist the local archive snapshot.
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Page size for bulk table downloads.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    #[arg(long)]
    google_api_key: Option<String>,

    #[arg(long)]
    azure_api_key: Option<String>,

    /// Download the language pair's stored table into the archive instead of
    /// translating.
    #[arg(long, default_value_t = false)]
    download: bool,

    /// Announce resolutions that take noticeably long.
    #[arg(long, default_value_t = false)]
    hud: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Progress hook for long resolutions; the terminal equivalent of a HUD.
struct LogProgress;

impl ProgressReporter for LogProgress {
    fn show(&self) {
        tracing::info!("still translating...");
    }

    fn hide(&self) {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let pair = LanguagePair::new(args.from.clone(), args.to.clone());
    let cfg = build_config(&args, &env)?;

    tracing::info!(
        environment = %cfg.environment,
        pair = %pair,
        provider = %cfg.platform,
        "config loaded"
    );

    run(cfg, pair, args).await
}

async fn run(cfg: AppConfig, pair: LanguagePair, args: Args) -> anyhow::Result<()> {
    let backend: Arc<dyn StoreBackend> = match &cfg.store.base_url {
        Some(url) => Arc::new(RestStoreBackend::new(url)?),
        None => {
            tracing::warn!("no store url configured, results will not be shared across clients");
            Arc::new(MemoryStoreBackend::new())
        }
    };
    let store = TranslationStore::new(backend, cfg.environment, cfg.store.page_size);

    let blob: Box<dyn ArchiveBlobStore> = match &cfg.archive_path {
        Some(path) => Box::new(JsonFileStore::new(path.clone())),
        None => Box::new(MemoryBlobStore::new()),
    };
    let archive = TranslationArchiver::new(blob);
    match archive.load().await {
        Ok(count) => tracing::info!(count, "archive snapshot loaded"),
        Err(ArchiveError::Empty) => {}
        Err(e) => tracing::warn!(error = %e, "could not load the archive snapshot"),
    }

    let fetcher = Arc::new(HttpPageFetcher::new()?);
    let registry = ProviderRegistry::new(&cfg.api_keys, fetcher);
    let service = TranslatorService::new(registry, store, archive)
        .with_default_platform(cfg.platform)
        .with_progress(Arc::new(LogProgress));

    if args.download {
        download_table(&service, &pair).await?;
        save_archive(&service, &cfg).await;
        return Ok(());
    }

    if args.text.is_empty() {
        anyhow::bail!("provide text to translate, or --download to fetch a stored table");
    }

    let inputs: Vec<TranslationInput> = args.text.into_iter().map(TranslationInput::new).collect();
    let options = TranslateOptions {
        platform: None,
        requires_hud: args.hud,
    };

    if let [input] = inputs.as_slice() {
        let translation = service
            .translate(input, &pair, &options)
            .await
            .with_context(|| format!("could not translate {:?}", input.value()))?;
        println!("{}", translation.output);
        save_archive(&service, &cfg).await;
        return Ok(());
    }

    let total = inputs.len();
    let outcome = service.translate_batch(&inputs, &pair, &options).await;
    let mut resolved = 0usize;
    if let Some(translations) = &outcome.translations {
        resolved = translations.len();
        for translation in translations {
            println!("{} \u{2192} {}", translation.input.value(), translation.output);
        }
    }
    if let Some(errors) = &outcome.errors {
        for (error, input) in errors {
            eprintln!("{}: {}", input.value(), error);
        }
    }
    save_archive(&service, &cfg).await;

    if resolved == 0 {
        anyhow::bail!("none of the {total} inputs could be translated");
    }
    Ok(())
}

async fn download_table(service: &TranslatorService, pair: &LanguagePair) -> anyhow::Result<()> {
    match service.store().download_table(pair, service.archive()).await {
        Ok(seeded) => {
            println!("downloaded {} translations for {}", seeded.len(), pair);
            Ok(())
        }
        Err(StoreError::NoTranslations(pair)) => {
            println!("no stored translations for {pair}");
            Ok(())
        }
        Err(e) => Err(e).context("table download failed"),
    }
}

async fn save_archive(service: &TranslatorService, cfg: &AppConfig) {
    if cfg.archive_path.is_none() {
        return;
    }
    if let Err(e) = service.archive().save().await {
        tracing::warn!(error = %e, "could not persist the archive snapshot");
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: &Args, env: &impl hello_translate_core::config::Env) -> anyhow::Result<AppConfig> {
    let google = resolve_api_key(args.google_api_key.clone(), ENV_GOOGLE_API_KEY, env)?;
    let azure = resolve_api_key(args.azure_api_key.clone(), ENV_AZURE_API_KEY, env)?;
    let store_url = resolve_optional_string(args.store_url.clone(), ENV_STORE_URL, env);
    let store = StoreConfig::new(store_url, args.page_size)?;

    Ok(AppConfig {
        environment: args.environment,
        store,
        api_keys: ApiKeys { google, azure },
        archive_path: args.archive.clone(),
        platform: args.provider,
    })
}
