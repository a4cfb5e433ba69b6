use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use menutree::{
    application::{
        error::AppError,
        menu::{MenuError, MenuItems, MenuTreeBuilder},
    },
    cache,
    config::{self, RenderArgs, Settings, TreeArgs},
    domain::menu::MenuId,
    infra::{error::InfraError, source::JsonFileMenuSource, telemetry},
    presentation::views::HtmlMenuRenderer,
};
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(source = report.source, error = %report, "application error");
    } else {
        let subscriber = tracing_fmt()
            .with_max_level(Level::ERROR)
            .with_writer(io::stderr)
            .finish();
        let dispatch = Dispatch::new(subscriber);
        dispatcher::with_default(&dispatch, || {
            error!(source = report.source, error = %report, "application error");
        });
    }
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match &cli_args.command {
        config::Command::Tree(args) => run_tree(&settings, args).await,
        config::Command::Render(args) => run_render(&settings, args).await,
    }
}

async fn build_menu(settings: &Settings, menu_id: u64) -> Result<MenuTreeBuilder, AppError> {
    let source = Arc::new(JsonFileMenuSource::new(&settings.source.path));
    let store = cache::open_store(&settings.cache)?;

    let mut builder = MenuTreeBuilder::new(MenuId::new(menu_id), source, store)
        .with_policy(settings.cache.policy);
    builder.fetch().await?;
    Ok(builder)
}

async fn run_tree(settings: &Settings, args: &TreeArgs) -> Result<(), AppError> {
    let builder = build_menu(settings, args.menu_id).await?;

    let output = match builder.get_items(!args.pretty)? {
        MenuItems::Json(json) => json,
        MenuItems::Structured(value) => {
            serde_json::to_string_pretty(&value).map_err(MenuError::from)?
        }
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").map_err(InfraError::from)?;
    Ok(())
}

async fn run_render(settings: &Settings, args: &RenderArgs) -> Result<(), AppError> {
    let builder = build_menu(settings, args.menu_id).await?;

    let template = args
        .template
        .as_deref()
        .unwrap_or_else(|| settings.render.default_template.name());

    let renderer = HtmlMenuRenderer::new(io::stdout());
    builder.render(&renderer, template)?;
    Ok(())
}
