use std::{io::Write, process, sync::Arc};

use resource_facets::{
    application::{
        error::AppError,
        presenter::{PresenterOptions, ResultsPresenter},
    },
    cache::{CacheConfig, ListingCache},
    config::{self, RenderArgs},
    domain::{filters::FilterState, types::AllowedTypes},
    infra::{error::InfraError, memory::InMemoryCorpus, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, summary = error.presentation_message(), "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, summary = error.presentation_message(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        InfraError::configuration(format!("failed to load configuration: {err}"))
    })?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Render(args) => run_render(settings, *args).await,
    }
}

async fn run_render(settings: config::Settings, args: RenderArgs) -> Result<(), AppError> {
    let allowed = AllowedTypes::new(args.types.iter().map(String::as_str));
    if allowed.is_empty() {
        return Err(AppError::validation("--types must name at least one type"));
    }

    let corpus = Arc::new(InMemoryCorpus::load(&args.corpus).await?);
    let cache = Arc::new(ListingCache::new(&CacheConfig::from(&settings.cache)));
    let presenter = ResultsPresenter::with_sources(
        corpus,
        cache,
        PresenterOptions::from(&settings.listing),
    );

    let state = filter_state(&args);
    info!(
        target = "resource_facets::render",
        corpus = %args.corpus.display(),
        types = allowed.len(),
        page = state.page(),
        "Rendering listing"
    );

    let rendered = presenter.render(&allowed, &state).await?;
    let json = serde_json::to_string_pretty(&rendered)
        .map_err(|err| AppError::validation(format!("failed to serialize listing: {err}")))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").map_err(InfraError::from)?;
    Ok(())
}

fn filter_state(args: &RenderArgs) -> FilterState {
    let mut builder = FilterState::builder().page(args.page);
    if let Some(category) = args.category.as_deref() {
        builder = builder.category(category);
    }
    if let Some(author) = args.author {
        builder = builder.author(author);
    }
    if let Some(content_type) = args.content_type.as_deref() {
        builder = builder.content_type(content_type);
    }
    if let Some(keyword) = args.keyword.as_deref() {
        builder = builder.keyword(keyword);
    }
    builder.build()
}
