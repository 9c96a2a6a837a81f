use std::{
    io::{self, BufRead, Write},
    sync::{Mutex, PoisonError},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dashboard_core::{
    CatalogClient, ClientError, ConfirmationFlow, Invalidate, ListCache, MutationController,
    Navigator, Notification, NotificationKey, NotificationLevel, Notifier, OperationKind,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        format_price, parse_price, BrandId, BrandSummary, CategoryId, CategorySummary, EntityKind,
        ProductSummary,
    },
    pagination::Page,
    protocol::{BrandInput, CategoryInput, MutationResponse, ProductInput},
    query::{ListQuery, Location, PAGE_PARAM, PER_PAGE_PARAM, SEARCH_PARAM, SORT_PARAM},
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(about = "Terminal dashboard for a running catalog server")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of brands, categories or products.
    List {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[command(flatten)]
        query: ListArgs,
    },
    /// Show the products of one brand.
    BrandProducts {
        brand_id: i64,
        #[command(flatten)]
        query: ListArgs,
    },
    Create {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(long)]
        name: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Product price such as 12.99.
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        brand_id: Option<i64>,
        #[arg(long)]
        category_id: Option<i64>,
    },
    Rename {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        id: i64,
        name: String,
    },
    /// Delete one row after confirmation, then show the list again.
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(long)]
        id: Option<i64>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
        #[command(flatten)]
        query: ListArgs,
    },
}

/// List parameters as raw strings so they decode exactly like a browser URL.
#[derive(Args, Debug, Clone, Default)]
struct ListArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    per_page: Option<String>,
}

impl ListArgs {
    fn query(&self) -> ListQuery {
        let pairs = [
            (SEARCH_PARAM, &self.search),
            (SORT_PARAM, &self.sort),
            (PAGE_PARAM, &self.page),
            (PER_PAGE_PARAM, &self.per_page),
        ];
        ListQuery::decode(
            pairs
                .into_iter()
                .filter_map(|(key, value)| value.as_deref().map(|value| (key, value))),
        )
    }

    fn location(&self, kind: EntityKind) -> Location {
        let bare = Location::new(kind.dashboard_path());
        Location::parse(&self.query().encode(&bare))
    }
}

fn parse_kind(raw: &str) -> Result<EntityKind, String> {
    EntityKind::from_slug(raw).ok_or_else(|| {
        format!("unknown entity '{raw}', expected brands, categories or products")
    })
}

/// Prints toasts as status lines on stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let level = match notification.level {
            NotificationLevel::Loading => "..",
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        eprintln!("[{level}] {}", notification.message);
    }
}

/// Keeps the URL the dashboard would show, so list state survives a flow.
struct SessionNavigator {
    current: Mutex<String>,
}

impl SessionNavigator {
    fn new(location: &Location) -> Self {
        Self {
            current: Mutex::new(location.to_string()),
        }
    }

    fn location(&self) -> Location {
        Location::parse(&self.current.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Navigator for SessionNavigator {
    fn push(&self, url: &str) {
        debug!(%url, "navigate");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = url.to_string();
    }
}

/// One list cache per kind, invalidated together after a mutation.
struct Caches {
    brands: ListCache<BrandSummary>,
    categories: ListCache<CategorySummary>,
    products: ListCache<ProductSummary>,
}

impl Caches {
    fn new() -> Self {
        Self {
            brands: ListCache::new(EntityKind::Brand),
            categories: ListCache::new(EntityKind::Category),
            products: ListCache::new(EntityKind::Product),
        }
    }
}

impl Invalidate for Caches {
    fn invalidate(&self, kind: EntityKind) {
        self.brands.invalidate(kind);
        self.categories.invalidate(kind);
        self.products.invalidate(kind);
    }
}

struct Session {
    client: CatalogClient,
    caches: Caches,
}

impl Session {
    async fn fetch<T>(
        &self,
        cache: &ListCache<T>,
        query: &ListQuery,
    ) -> Result<Page<T>, ClientError>
    where
        T: DeserializeOwned + Clone + Send,
    {
        let kind = cache.kind();
        cache
            .get_or_fetch(query, || self.client.list(kind, query))
            .await
    }

    async fn show(&self, kind: EntityKind, query: &ListQuery) -> Result<()> {
        match kind {
            EntityKind::Brand => {
                print_page(&self.fetch(&self.caches.brands, query).await?, brand_line)
            }
            EntityKind::Category => {
                print_page(&self.fetch(&self.caches.categories, query).await?, category_line)
            }
            EntityKind::Product => {
                print_page(&self.fetch(&self.caches.products, query).await?, product_line)
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();
    let session = Session {
        client: CatalogClient::new(cli.server_url),
        caches: Caches::new(),
    };

    match cli.command {
        Command::List { kind, query } => session.show(kind, &query.query()).await?,
        Command::BrandProducts { brand_id, query } => {
            let listing = session
                .client
                .brand_products(BrandId(brand_id), &query.query())
                .await?;
            println!("Products of {}", listing.brand.name);
            print_page(&listing.products, product_line);
        }
        Command::Create {
            kind,
            name,
            image_url,
            description,
            price,
            brand_id,
            category_id,
        } => {
            let draft = Draft {
                name,
                image_url,
                description,
                price,
                brand_id,
                category_id,
            };
            create(&session, kind, draft).await?;
        }
        Command::Rename { kind, id, name } => rename(&session, kind, id, name).await?,
        Command::Delete {
            kind,
            id,
            yes,
            query,
        } => delete(&session, kind, id, yes, &query).await?,
    }
    Ok(())
}

struct Draft {
    name: String,
    image_url: Option<String>,
    description: Option<String>,
    price: Option<String>,
    brand_id: Option<i64>,
    category_id: Option<i64>,
}

impl Draft {
    fn product_input(&self) -> Result<ProductInput> {
        let price = self.price.as_deref().context("--price is required for products")?;
        let price_cents =
            parse_price(price).with_context(|| format!("'{price}' is not an amount like 12.99"))?;
        let brand_id = self.brand_id.context("--brand-id is required for products")?;
        Ok(ProductInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price_cents,
            brand_id: BrandId(brand_id),
            category_id: self.category_id.map(CategoryId),
            image_url: self.image_url.clone(),
        })
    }
}

async fn create(session: &Session, kind: EntityKind, draft: Draft) -> Result<()> {
    let product = match kind {
        EntityKind::Product => Some(draft.product_input()?),
        _ => None,
    };
    let controller = MutationController::new(
        NotificationKey::new(OperationKind::Create, kind),
        ConsoleNotifier,
    );
    let (client, draft, product) = (&session.client, &draft, &product);
    let response = controller
        .execute(Some(draft.name.clone()), move |_| async move {
            let created = match (kind, product) {
                (EntityKind::Product, Some(input)) => client.create(kind, input).await?,
                (EntityKind::Brand, _) => {
                    let input = BrandInput {
                        name: draft.name.clone(),
                        image_url: draft.image_url.clone(),
                    };
                    client.create(kind, &input).await?
                }
                _ => {
                    let input = CategoryInput {
                        name: draft.name.clone(),
                    };
                    client.create(kind, &input).await?
                }
            };
            println!("{} #{}", kind.label(), created.id);
            Ok::<_, ClientError>(MutationResponse::new(created.success))
        })
        .await;
    if response.is_ok() {
        session.caches.invalidate_after_change(kind);
    }
    response?;
    Ok(())
}

async fn rename(session: &Session, kind: EntityKind, id: i64, name: String) -> Result<()> {
    let controller = MutationController::new(
        NotificationKey::new(OperationKind::Update, kind),
        ConsoleNotifier,
    );
    let (client, name) = (&session.client, &name);
    let outcome = controller
        .execute(Some(id), move |id| async move {
            match kind {
                EntityKind::Brand => {
                    let current: BrandSummary = client.get(kind, id).await?;
                    let input = BrandInput {
                        name: name.clone(),
                        image_url: current.image_url,
                    };
                    client.update(kind, id, &input).await
                }
                EntityKind::Category => {
                    let input = CategoryInput { name: name.clone() };
                    client.update(kind, id, &input).await
                }
                EntityKind::Product => {
                    let current: ProductSummary = client.get(kind, id).await?;
                    let input = ProductInput {
                        name: name.clone(),
                        description: current.description,
                        price_cents: current.price_cents,
                        brand_id: current.brand_id,
                        category_id: current.category_id,
                        image_url: current.image_url,
                    };
                    client.update(kind, id, &input).await
                }
            }
        })
        .await;
    if outcome.is_ok() {
        session.caches.invalidate_after_change(kind);
    }
    outcome?;
    Ok(())
}

/// Walks the same confirmation flow as the web dialog: select, confirm or
/// cancel, then land back on the list.
async fn delete(
    session: &Session,
    kind: EntityKind,
    id: Option<i64>,
    yes: bool,
    query: &ListArgs,
) -> Result<()> {
    let navigator = SessionNavigator::new(&query.location(kind));
    session.show(kind, &query.query()).await?;

    if let Some(id) = id {
        ConfirmationFlow::new(kind, navigator.location()).request(id, &navigator);
    }
    let flow = ConfirmationFlow::new(kind, navigator.location());
    let controller = MutationController::new(NotificationKey::delete(kind), ConsoleNotifier);

    if let Some(id) = flow.selection().active_id {
        let question = format!("Delete {} #{id}? This cannot be undone.", kind.label());
        if !yes && !ask(&question)? {
            flow.cancel(&navigator);
            println!("Cancelled.");
            return Ok(());
        }
    }

    let client = &session.client;
    flow.confirm(&controller, &navigator, &session.caches, move |id| {
        client.delete(kind, id)
    })
    .await?;

    let landing = ListQuery::from_location(&navigator.location());
    session.show(kind, &landing).await
}

fn ask(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        bail!("no answer on stdin; pass --yes to skip confirmation");
    }
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_page<T>(page: &Page<T>, line: fn(&T) -> String) {
    if page.rows.is_empty() {
        println!(
            "{}",
            if page.is_past_end() {
                "No results on this page."
            } else {
                "Nothing matches the current filter."
            }
        );
    }
    for row in &page.rows {
        println!("{}", line(row));
    }
    println!(
        "-- {} result(s), page {} of {}",
        page.total_count,
        page.page,
        page.total_pages.max(1)
    );
}

fn brand_line(brand: &BrandSummary) -> String {
    format!("{:>5}  {:<32} {} product(s)", brand.id, brand.name, brand.product_count)
}

fn category_line(category: &CategorySummary) -> String {
    format!(
        "{:>5}  {:<32} {} product(s)",
        category.id, category.name, category.product_count
    )
}

fn product_line(product: &ProductSummary) -> String {
    format!(
        "{:>5}  {:<32} {:<20} {:<16} {:>10}",
        product.id,
        product.name,
        product.brand_name,
        product.category_name.as_deref().unwrap_or("-"),
        format_price(product.price_cents)
    )
}
