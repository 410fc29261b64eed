//! Storefront command-line client.
//!
//! Browses the remote product catalogue and manages the shopper's cart,
//! which persists between invocations in the configured storage directory.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use pagination::PageRequest;
use rust_decimal::Decimal;
use serde::Serialize;
use storefront::config::StorefrontSettings;
use storefront::domain::ports::{CartStorage, CartStorageError, CatalogService};
use storefront::domain::{
    AddOutcome, AddRejection, Cart, CartStore, CatalogBrowser, CatalogQuery, CheckoutRequest,
    CheckoutService, LineItemId, OrderSummary, ProductFeed, ProductId, SortField, SortOrder,
};
use storefront::outbound::catalog::HttpCatalogService;
use storefront::outbound::storage::{FileCartStorage, InMemoryCartStorage};
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// `storefront` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "storefront",
    about = "Browse the product catalogue and manage a persistent shopping cart",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalogue products.
    Products(ListArgs),
    /// Show one product.
    Product {
        /// Catalogue product identifier.
        id: u64,
    },
    /// List category slugs.
    Categories,
    /// Inspect or change the cart.
    #[command(subcommand)]
    Cart(CartCommand),
    /// Show the order summary for the current cart.
    Summary,
    /// Place an order for the current cart and empty it.
    Checkout {
        /// JSON file holding the `shipping` and `payment` forms.
        #[arg(long, value_name = "path")]
        request: Utf8PathBuf,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    /// One-based page to start from.
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Page size. Falls back to the configured page size.
    #[arg(long)]
    limit: Option<u32>,
    /// Load this many pages from the first page into one feed instead of a
    /// single page. Cannot be combined with `--page`.
    #[arg(long, default_value_t = 1, conflicts_with = "page")]
    pages: u32,
    /// Free-text search.
    #[arg(long)]
    search: Option<String>,
    /// Category slug.
    #[arg(long)]
    category: Option<String>,
    /// Sort field: `title`, `price`, `rating` or `createdAt`.
    #[arg(long = "sort-by", default_value = "title")]
    sort_by: SortField,
    /// Sort direction: `asc` or `desc`.
    #[arg(long, default_value = "asc")]
    order: SortOrder,
    /// Inclusive lower price bound.
    #[arg(long = "min-price")]
    min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    #[arg(long = "max-price")]
    max_price: Option<Decimal>,
    /// Only list products with stock.
    #[arg(long = "in-stock")]
    in_stock: bool,
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    /// Print the cart.
    Show,
    /// Add a catalogue product.
    Add {
        /// Catalogue product identifier.
        product_id: u64,
        /// Units to add.
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a cart line.
    Remove {
        /// Line identifier as printed by `cart show`.
        line_id: LineItemId,
    },
    /// Replace the quantity of a cart line; zero removes it.
    SetQuantity {
        /// Line identifier as printed by `cart show`.
        line_id: LineItemId,
        /// New quantity.
        quantity: u32,
    },
    /// Re-fetch a product and refresh its cart line.
    Refresh {
        /// Catalogue product identifier.
        product_id: u64,
    },
    /// Empty the cart.
    Clear,
}

/// Cart storage for one invocation: the storage directory when it can be
/// opened, otherwise a cart that lives only as long as the process.
#[derive(Debug)]
enum SessionCartStorage {
    File(FileCartStorage),
    Memory(InMemoryCartStorage),
}

impl SessionCartStorage {
    fn open(dir: &Utf8Path) -> Self {
        match FileCartStorage::open(dir) {
            Ok(storage) => Self::File(storage),
            Err(error) => {
                warn!(%error, %dir, "falling back to a session-only cart");
                Self::Memory(InMemoryCartStorage::default())
            }
        }
    }
}

impl CartStorage for SessionCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        match self {
            Self::File(storage) => storage.load(),
            Self::Memory(storage) => storage.load(),
        }
    }

    fn save(&self, snapshot: &str) -> Result<(), CartStorageError> {
        match self {
            Self::File(storage) => storage.save(snapshot),
            Self::Memory(storage) => storage.save(snapshot),
        }
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        match self {
            Self::File(storage) => storage.clear(),
            Self::Memory(storage) => storage.clear(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CartView<'a> {
    cart: &'a Cart,
    summary: OrderSummary,
}

impl<'a> CartView<'a> {
    fn new(cart: &'a Cart) -> Self {
        Self {
            cart,
            summary: OrderSummary::for_cart(cart).rounded(),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let settings = StorefrontSettings::load_from_iter([OsString::from("storefront")])
        .map_err(|err| eyre!("failed to load storefront settings: {err}"))?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(cli, &settings))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json();
    if let Err(error) = subscriber.try_init() {
        warn!(%error, "tracing subscriber already initialised");
    }
}

async fn run(cli: Cli, settings: &StorefrontSettings) -> Result<()> {
    let base_url = settings.catalog_base_url()?;
    let catalog = HttpCatalogService::new(base_url, settings.request_timeout()?)
        .wrap_err("build catalogue HTTP client")?;
    let browser = CatalogBrowser::new(Arc::new(catalog));

    match cli.command {
        Command::Products(args) => list_products(&browser, args, settings.page_size()?).await,
        Command::Product { id } => {
            let product = browser.product(ProductId::new(id)).await?;
            print_json(&product)
        }
        Command::Categories => print_json(&browser.categories().await?),
        Command::Cart(command) => run_cart(&browser, open_cart(settings), command).await,
        Command::Summary => {
            let store = open_cart(settings);
            print_json(&OrderSummary::for_cart(store.cart()).rounded())
        }
        Command::Checkout { request } => {
            let request = read_checkout_request(&request)?;
            let mut store = open_cart(settings);
            let checkout = CheckoutService::new(Arc::new(DefaultClock));
            print_json(&checkout.place_order(&mut store, request)?)
        }
    }
}

fn open_cart(settings: &StorefrontSettings) -> CartStore<SessionCartStorage> {
    let storage = SessionCartStorage::open(&settings.storage_dir());
    CartStore::rehydrated(Arc::new(storage))
}

fn read_checkout_request(path: &Utf8Path) -> Result<CheckoutRequest> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("checkout request path '{path}' must name a file"))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .wrap_err_with(|| format!("open checkout request directory '{parent}'"))?;
    let raw = dir
        .read_to_string(file_name)
        .wrap_err_with(|| format!("read checkout request '{path}'"))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("decode checkout request '{path}'"))
}

async fn list_products<C>(
    browser: &CatalogBrowser<C>,
    args: ListArgs,
    page_size: u32,
) -> Result<()>
where
    C: CatalogService,
{
    let page = PageRequest::new(args.page, args.limit.unwrap_or(page_size))?;
    let mut query = CatalogQuery::default()
        .with_page(page)
        .sorted_by(args.sort_by, args.order)
        .with_price_range(args.min_price, args.max_price);
    if let Some(search) = args.search {
        query = query.with_search(search);
    }
    if let Some(category) = args.category {
        query = query.with_category(category);
    }
    if args.in_stock {
        query = query.only_in_stock();
    }

    if args.pages <= 1 {
        return print_json(&browser.list_products(&query).await?);
    }

    let mut feed = ProductFeed::new(query);
    for _ in 0..args.pages {
        if !browser.load_next(&mut feed).await? {
            break;
        }
    }
    print_json(&feed.products())
}

async fn run_cart<C, S>(
    browser: &CatalogBrowser<C>,
    mut store: CartStore<S>,
    command: CartCommand,
) -> Result<()>
where
    C: CatalogService,
    S: CartStorage,
{
    match command {
        CartCommand::Show => {}
        CartCommand::Add {
            product_id,
            quantity,
        } => {
            let product = browser.product(ProductId::new(product_id)).await?;
            match store.add(&product, quantity) {
                AddOutcome::Rejected(AddRejection::ZeroQuantity) => {
                    return Err(eyre!("quantity must be at least 1"));
                }
                AddOutcome::Rejected(AddRejection::InsufficientStock {
                    requested,
                    in_cart,
                    stock,
                }) => {
                    return Err(eyre!(
                        "cannot add {requested} of {}: {in_cart} in the cart, {stock} in stock",
                        product.title
                    ));
                }
                outcome => info!(?outcome, product_id, "cart updated"),
            }
        }
        CartCommand::Remove { line_id } => {
            ensure_line(&store, line_id)?;
            store.remove(line_id);
        }
        CartCommand::SetQuantity { line_id, quantity } => {
            ensure_line(&store, line_id)?;
            store.set_quantity(line_id, quantity);
        }
        CartCommand::Refresh { product_id } => {
            let product = browser.product(ProductId::new(product_id)).await?;
            store.refresh_product(&product);
        }
        CartCommand::Clear => store.clear(),
    }
    print_json(&CartView::new(store.cart()))
}

fn ensure_line<S>(store: &CartStore<S>, line_id: LineItemId) -> Result<()> {
    store
        .line(line_id)
        .map(|_| ())
        .ok_or_else(|| eyre!("no cart line with id {line_id}"))
}

fn print_json<T>(value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let rendered = serde_json::to_string_pretty(value).wrap_err("encode output")?;
    println!("{rendered}");
    Ok(())
}
