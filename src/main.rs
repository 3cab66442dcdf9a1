//! Bookshelf - catalog operations for a small book library.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshelf::{
    api::{self, ApiState},
    catalog::BookDraft,
    client::CatalogClient,
    store::CatalogStore,
    sync::SyncedCatalog,
};

/// Book catalog daemon and client.
#[derive(Parser)]
#[command(name = "bookshelf", about = "Book catalog daemon and client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Field flags shared by `add` and `edit`.
#[derive(clap::Args)]
struct BookFields {
    /// Book title.
    #[arg(long)]
    title: String,

    /// Author display name (created when unknown).
    #[arg(long)]
    author: String,

    /// Category display name (created when unknown).
    #[arg(long)]
    category: String,

    /// List price.
    #[arg(long, default_value_t = 0.0)]
    price: f64,

    /// ISBN.
    #[arg(long, default_value = "")]
    isbn: String,

    /// Description text.
    #[arg(long)]
    description: Option<String>,

    /// Website URL.
    #[arg(long)]
    website: Option<String>,

    /// Cover image URL.
    #[arg(long)]
    cover_url: Option<String>,

    /// Availability (defaults to true).
    #[arg(long)]
    available: Option<bool>,
}

impl BookFields {
    fn into_draft(self) -> BookDraft {
        BookDraft {
            title: self.title,
            description: self.description,
            price: self.price,
            isbn: self.isbn,
            available: self.available,
            website: self.website,
            published_at: None,
            author_name: self.author,
            category_name: self.category,
            cover_url: self.cover_url,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API daemon.
    Daemon {
        /// Address to bind the API server.
        #[arg(long, default_value = "0.0.0.0:7878", env = "BOOKSHELF_BIND")]
        bind: String,

        /// Path to the catalog database.
        #[arg(long, default_value = "bookshelf.db", env = "BOOKSHELF_DB")]
        db: std::path::PathBuf,

        /// Seed sample data when the catalog is empty.
        #[arg(long)]
        seed: bool,
    },

    /// Show daemon status.
    Status {
        /// Bookshelf API URL.
        #[arg(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:7878")]
        api_url: String,
    },

    /// List books in the catalog.
    List {
        /// Bookshelf API URL.
        #[arg(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:7878")]
        api_url: String,
    },

    /// Show a single book.
    Show {
        /// Book id.
        id: String,

        /// Bookshelf API URL.
        #[arg(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:7878")]
        api_url: String,
    },

    /// Add a book.
    Add {
        #[command(flatten)]
        fields: BookFields,

        /// Bookshelf API URL.
        #[arg(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:7878")]
        api_url: String,
    },

    /// Overwrite an existing book.
    Edit {
        /// Book id.
        id: String,

        #[command(flatten)]
        fields: BookFields,

        /// Bookshelf API URL.
        #[arg(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:7878")]
        api_url: String,
    },

    /// Remove a book.
    Remove {
        /// Book id.
        id: String,

        /// Bookshelf API URL.
        #[arg(long, env = "BOOKSHELF_API_URL", default_value = "http://localhost:7878")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { bind, db, seed } => {
            run_daemon(&bind, &db, seed).await?;
        }

        Commands::Status { api_url } => {
            show_status(&api_url).await?;
        }

        Commands::List { api_url } => {
            list_books(&api_url).await?;
        }

        Commands::Show { id, api_url } => {
            show_book(&api_url, &id).await?;
        }

        Commands::Add { fields, api_url } => {
            add_book(&api_url, fields.into_draft()).await?;
        }

        Commands::Edit { id, fields, api_url } => {
            edit_book(&api_url, &id, fields.into_draft()).await?;
        }

        Commands::Remove { id, api_url } => {
            remove_book(&api_url, &id).await?;
        }
    }

    Ok(())
}

/// Run the API daemon.
async fn run_daemon(bind: &str, db: &std::path::Path, seed: bool) -> Result<()> {
    tracing::info!("Starting bookshelf daemon...");

    let mut store = CatalogStore::open(db)?;
    tracing::info!(db = %db.display(), books = store.count_books()?, "Catalog opened");

    if seed && store.seed()? {
        tracing::info!("Seeded sample catalog data");
    }

    let state = Arc::new(ApiState::new(store));

    api::serve(state, bind).await?;

    Ok(())
}

/// Show daemon status via API.
async fn show_status(api_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/health", api_url.trim_end_matches('/'));

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to get status: {}", response.status());
    }

    let status: serde_json::Value = response.json().await?;

    println!("Bookshelf Status");
    println!("================");
    println!("Status: {}", status["status"]);
    println!("Books:  {}", status["books"]);

    Ok(())
}

/// List books through the synchronized collection.
async fn list_books(api_url: &str) -> Result<()> {
    let mut catalog = SyncedCatalog::new(CatalogClient::new(api_url));
    catalog.refresh().await?;

    if catalog.books().is_empty() {
        println!("No books in the catalog.");
        return Ok(());
    }

    println!(
        "{:<36} {:<28} {:<22} {:<18} {:>8}",
        "ID", "TITLE", "AUTHOR", "CATEGORY", "PRICE"
    );
    println!("{}", "-".repeat(116));

    for book in catalog.books() {
        println!(
            "{:<36} {:<28} {:<22} {:<18} {:>8.2}",
            book.id, book.title, book.author.name, book.category.name, book.price
        );
    }

    Ok(())
}

/// Show one book in full.
async fn show_book(api_url: &str, id: &str) -> Result<()> {
    let mut catalog = SyncedCatalog::new(CatalogClient::new(api_url));
    let book = catalog.fetch_book(id).await?;

    println!("Title:       {}", book.title);
    println!("Author:      {}", book.author.name);
    if let Some(bio) = &book.author.bio {
        println!("             {}", bio);
    }
    println!("Category:    {}", book.category.name);
    println!("Price:       {:.2}", book.price);
    println!("ISBN:        {}", book.isbn);
    println!("Available:   {}", book.available);
    println!("Published:   {}", book.published_at);
    if let Some(website) = &book.website {
        println!("Website:     {}", website);
    }
    if let Some(cover) = &book.cover_image {
        println!("Cover:       {}", cover.url);
    }
    println!("Description: {}", book.description);
    println!("ID:          {}", book.id);

    Ok(())
}

/// Add a book through the synchronized collection.
async fn add_book(api_url: &str, draft: BookDraft) -> Result<()> {
    let mut catalog = SyncedCatalog::new(CatalogClient::new(api_url));
    let book = catalog.create(&draft).await?;

    println!("Book added successfully!");
    println!("ID:       {}", book.id);
    println!("Title:    {}", book.title);
    println!("Author:   {}", book.author.name);
    println!("Category: {}", book.category.name);
    println!("Price:    {:.2}", book.price);

    Ok(())
}

/// Overwrite a book through the synchronized collection.
async fn edit_book(api_url: &str, id: &str, draft: BookDraft) -> Result<()> {
    let mut catalog = SyncedCatalog::new(CatalogClient::new(api_url));
    let book = catalog.update(id, &draft).await?;

    println!("Book updated successfully!");
    println!("ID:       {}", book.id);
    println!("Title:    {}", book.title);
    println!("Author:   {}", book.author.name);
    println!("Category: {}", book.category.name);
    println!("Price:    {:.2}", book.price);

    Ok(())
}

/// Remove a book through the synchronized collection.
async fn remove_book(api_url: &str, id: &str) -> Result<()> {
    let mut catalog = SyncedCatalog::new(CatalogClient::new(api_url));
    let confirmation = catalog.delete(id).await?;

    println!("Book removed: {}", confirmation.id);

    Ok(())
}
