use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use terminal_size::{terminal_size, Width};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use nimbus::auth::generate_password_hash;
use nimbus::catalogue::cache::CACHE_TTL;
use nimbus::catalogue::{fixtures, Language, TtlCache};
use nimbus::config;
use nimbus::config::{DEFAULT_HOST, DEFAULT_PORT};
use nimbus::notify::Notifier;
use nimbus::routes::build_router;
use nimbus::state::AppState;
use nimbus::store::{DocumentStore, MemoryStore, RemoteStore};

async fn build_state_from_env(env_file: Option<&str>) -> AppState {
    config::load_env_file(env_file);

    let client = reqwest::Client::builder()
        .user_agent(format!("Nimbus/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client");

    let store: Arc<dyn DocumentStore> = {
        let base_url = config::get_store_base_url();
        if !base_url.is_empty() {
            Arc::new(RemoteStore::new(client.clone(), base_url, config::get_store_token()))
        } else if let Some(dir) = config::get_fixtures_dir() {
            match fixtures::seed_store(std::path::Path::new(&dir), &config::get_store_collection()).await {
                Ok(seeded) => {
                    tracing::info!(%dir, "Serving the catalogue from fixture files");
                    Arc::new(seeded)
                }
                Err(e) => {
                    tracing::error!(%e, "Failed to load fixtures");
                    eprintln!("{}: {}", yansi::Paint::new("Failed to load fixtures").red(), e);
                    process::exit(1);
                }
            }
        } else {
            tracing::warn!("Neither STORE_BASE_URL nor FIXTURES_DIR configured; catalogue will be empty");
            Arc::new(MemoryStore::new())
        }
    };

    let mut cache = TtlCache::new(CACHE_TTL);
    if let Some(path) = config::get_cache_file() {
        cache = cache.with_file(path.into());
    }

    AppState::new(
        store,
        config::get_store_collection(),
        cache,
        client.clone(),
        config::get_admin_username(),
        generate_password_hash(&config::get_admin_password()),
        config::get_public_base_url(),
        Notifier::new(client, config::get_notify_webhook_url()),
    )
}

async fn start_server(mut state: AppState, host: &str, port: u16, stylesheet: Option<String>) {
    if let Some(path) = stylesheet {
        match std::fs::read_to_string(&path) {
            Ok(css) => {
                state.custom_css = Some(css);
                tracing::info!("Loaded custom stylesheet from {}", path);
            }
            Err(e) => {
                tracing::error!(%e, "Failed to read custom stylesheet");
                eprintln!("{} {}: {}", yansi::Paint::red("Failed to read custom stylesheet at"), path, e);
                process::exit(1);
            }
        }
    }

    let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(%e, "Invalid host/port format");
            eprintln!("{}: {}", yansi::Paint::red("Invalid host/port format"), e);
            process::exit(1);
        }
    };
    let app = build_router(state);
    tracing::info!(%addr, "Starting Nimbus server");
    println!(
        "{} {}",
        yansi::Paint::new("Web server running on").green(),
        yansi::Paint::new(format!("http://{}", addr)).cyan()
    );
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(%e, "Server encountered an error while running");
                eprintln!("{}: {}", yansi::Paint::new("Server error").red(), e);
                process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(%e, "Failed to bind to address; is the port already in use?");
            eprintln!(
                "{}: {}\n{}",
                yansi::Paint::new(format!("Failed to bind to {}", addr)).red(),
                e,
                yansi::Paint::new("Please stop any process using this port, or start the server with a different --port value.").yellow()
            );
            process::exit(1);
        }
    }
}

fn new_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if let Some((Width(w), _)) = terminal_size() {
        table.set_width(w - 4);
    }
    table.set_header(headers);
    table
}

fn opt_price(p: Option<f64>) -> String {
    p.map(|v| format!("{v:.2}")).unwrap_or_else(|| "—".to_string())
}

#[derive(Parser)]
#[command(
    name = "nimbus",
    author,
    version,
    about = "Nimbus storefront and catalogue tool",
    long_about = r#"Nimbus — serve the hosting storefront and manage its product catalogue.

The web server renders the public pages and the admin panel; the
catalogue subcommands inspect the same remote collection from the
terminal. Use the `--env-file` option or environment variables to
provide store credentials.

Examples:
  1) Build & run (dev):
      cargo run -- serve --host 127.0.0.1 --port 5000
  2) Inspect the catalogue:
      nimbus catalogue list
      nimbus catalogue show vps
"#,
    after_help = "Use `nimbus <subcommand> --help` to get subcommand specific options and usage examples."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
    /// Disable request/response logging
    #[arg(long, global = true)]
    silent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Host to bind to
        #[arg(long, default_value_t = String::from(DEFAULT_HOST))]
        host: String,
        /// Port to bind to
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Path to .env file
        #[arg(long)]
        env_file: Option<String>,
        /// Path to a custom stylesheet to serve instead of the default
        #[arg(long)]
        stylesheet: Option<String>,
    },
    /// Validate configuration (env vars / store credentials)
    #[command(
        about = "Validate configuration and ensure store connectivity.",
        long_about = "Validate environment variables required for the Nimbus server, and validate the configured document store by listing the catalogue collection."
    )]
    CheckConfig { env_file: Option<String> },
    /// Inspect the product catalogue
    #[command(
        about = "Inspect the product catalogue (list, show, pull)",
        long_about = "Read-only views over the same category documents the admin panel edits. `pull` forces a fresh fetch, bypassing and refreshing the local cache."
    )]
    Catalogue {
        #[command(subcommand)]
        sub: CatalogueCommands,
    },
}

#[derive(Subcommand)]
enum CatalogueCommands {
    /// List categories with product counts
    #[command(about = "List categories", long_about = "Enumerate category documents with display name, product count and last update time.")]
    List,
    /// Show one category's products
    #[command(about = "Show a category", long_about = "Show the products of one category, with prices and per-language translation presence.")]
    Show { category: String },
    /// Force a fresh fetch from the store, refreshing the local cache
    #[command(about = "Refresh the catalogue cache", long_about = "Fetch every category document from the store, bypassing the five-minute cache and rewriting the cache file when one is configured.")]
    Pull,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }

    if cli.silent {
        nimbus::store::set_silent(true);
    }

    // Commands build their own state so a custom `--env-file` can be
    // honored per command. No command means serve with defaults.
    if cli.command.is_none() {
        let state = build_state_from_env(None).await;
        start_server(state, DEFAULT_HOST, DEFAULT_PORT, None).await;
        return;
    }
    match cli.command.unwrap() {
        Commands::Serve { host, port, env_file, stylesheet } => {
            let state = build_state_from_env(env_file.as_deref()).await;
            start_server(state, &host, port, stylesheet).await;
        }
        Commands::CheckConfig { env_file } => {
            config::load_env_file(env_file.as_deref());
            let base_url = config::get_store_base_url();
            if base_url.is_empty() && config::get_fixtures_dir().is_none() {
                eprintln!(
                    "{}",
                    yansi::Paint::new("Neither STORE_BASE_URL nor FIXTURES_DIR is configured").red()
                );
                process::exit(1);
            }
            let state = build_state_from_env(env_file.as_deref()).await;
            match state.loader.load_documents(true).await {
                Ok(docs) => {
                    println!(
                        "{} ({} categories)",
                        yansi::Paint::new("Configuration looks valid").green(),
                        docs.len()
                    );
                }
                Err(e) => {
                    eprintln!("{}: {}", yansi::Paint::new("Store check failed").red(), e);
                    process::exit(1);
                }
            }
        }
        Commands::Catalogue { sub } => {
            let state = build_state_from_env(None).await;
            match sub {
                CatalogueCommands::List => {
                    let docs = match state.loader.load_documents(false).await {
                        Ok(docs) => docs,
                        Err(e) => {
                            eprintln!("{}: {}", yansi::Paint::new("Catalogue load failed").red(), e);
                            process::exit(1);
                        }
                    };
                    let mut table = new_table(vec!["Id", "Name", "Products", "Updated"]);
                    for doc in &docs {
                        table.add_row(vec![
                            doc.id.clone(),
                            if doc.display_name.is_empty() { doc.name.clone() } else { doc.display_name.clone() },
                            doc.product_count().to_string(),
                            doc.updated_at.clone().unwrap_or_else(|| "—".to_string()),
                        ]);
                    }
                    println!("\n{table}\n");
                }
                CatalogueCommands::Show { category } => {
                    let docs = match state.loader.load_documents(false).await {
                        Ok(docs) => docs,
                        Err(e) => {
                            eprintln!("{}: {}", yansi::Paint::new("Catalogue load failed").red(), e);
                            process::exit(1);
                        }
                    };
                    let Some(doc) = docs.iter().find(|d| d.id == category) else {
                        eprintln!(
                            "{} '{}' {}",
                            yansi::Paint::new("Category").red(),
                            category,
                            yansi::Paint::new("not found").red()
                        );
                        process::exit(1);
                    };
                    let mut table =
                        new_table(vec!["Id", "Name", "Tier", "Monthly", "Hourly", "Annual", "FR", "EN"]);
                    for p in &doc.products {
                        let present = |lang: Language| {
                            doc.translations
                                .for_language(lang)
                                .get(&p.id)
                                .map(|t| t.is_present())
                                .unwrap_or(false)
                        };
                        table.add_row(vec![
                            p.id.clone(),
                            p.name.clone(),
                            p.tier.clone(),
                            opt_price(p.pricing.monthly),
                            opt_price(p.pricing.hourly),
                            opt_price(p.pricing.annual),
                            if present(Language::Fr) { "✓".into() } else { "—".to_string() },
                            if present(Language::En) { "✓".into() } else { "—".to_string() },
                        ]);
                    }
                    println!("\n{table}\n");
                }
                CatalogueCommands::Pull => {
                    match state.loader.load_documents(true).await {
                        Ok(docs) => {
                            let products: usize = docs.iter().map(|d| d.product_count()).sum();
                            println!(
                                "{} {} categories, {} products",
                                yansi::Paint::new("Refreshed").green(),
                                docs.len(),
                                products
                            );
                        }
                        Err(e) => {
                            eprintln!("{}: {}", yansi::Paint::new("Pull failed").red(), e);
                            process::exit(1);
                        }
                    }
                }
            }
        }
    }
}
