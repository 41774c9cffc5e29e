use std::path::PathBuf;

use anyhow::{Context, Result};
use book_core::{Book, BookId, Credentials, Field, Library, SearchMode};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod store;
mod transport;

use config::Config;
use store::FileTokenStore;
use transport::UreqTransport;

type Client = Library<UreqTransport, FileTokenStore>;

#[derive(Parser)]
#[command(name = "books")]
#[command(about = "Browse and manage a remote book collection", long_about = None)]
struct Cli {
    /// Base URL of the book API (overrides BOOKS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides BOOKS_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the session
    Logout,
    /// Show whether a session is stored
    Whoami,
    /// List every book
    List,
    /// Search by id or category
    Search {
        /// all, id or category
        #[arg(long, default_value = "all")]
        by: SearchMode,
        #[arg(long, default_value = "")]
        value: String,
    },
    /// Add a book
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        year: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        pages: String,
    },
    /// Edit a book; only the given fields change
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        pages: Option<String>,
    },
    /// Delete a book
    Delete { id: String },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "books=info,book_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()
        .and_then(|c| c.with_api_url(cli.api_url.clone()))
        .context("load configuration")?
        .with_token_file(cli.token_file.clone());

    tracing::debug!(api_url = %config.api_url, token_file = %config.token_file.display(), "configured");

    let mut lib = Library::new(
        &config.api_url,
        UreqTransport::new(config.timeout),
        FileTokenStore::new(&config.token_file),
    );
    // Each command below issues its own read or mutation.
    lib.resume();

    run(&mut lib, cli.command)
}

fn run(lib: &mut Client, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            lib.login(&Credentials::new(email, password))?;
            println!("Logged in");
            print_books(lib.books());
        }
        Commands::Logout => {
            lib.logout()?;
            println!("Logged out");
        }
        Commands::Whoami => {
            if lib.is_authenticated() {
                println!("logged in (session at {})", lib.token_store().path().display());
            } else {
                println!("not logged in");
            }
        }
        Commands::List => {
            print_books(lib.refresh()?);
        }
        Commands::Search { by, value } => {
            lib.set_search_mode(by);
            lib.set_search_value(value);
            print_books(lib.search()?);
        }
        Commands::Add {
            title,
            author,
            year,
            category,
            pages,
        } => {
            lib.set_field(Field::Title, title);
            lib.set_field(Field::Author, author);
            lib.set_field(Field::Year, year);
            lib.set_field(Field::Category, category);
            lib.set_field(Field::Pages, pages);
            lib.submit()?;
            print_books(lib.books());
        }
        Commands::Edit {
            id,
            title,
            author,
            year,
            category,
            pages,
        } => {
            let book = find_book(lib, &BookId::new(id))?;
            lib.begin_edit(&book)?;
            let overrides = [
                (Field::Title, title),
                (Field::Author, author),
                (Field::Year, year),
                (Field::Category, category),
                (Field::Pages, pages),
            ];
            for (field, value) in overrides {
                if let Some(value) = value {
                    lib.set_field(field, value);
                }
            }
            lib.submit()?;
            print_books(lib.books());
        }
        Commands::Delete { id } => {
            lib.delete(&BookId::new(id))?;
            print_books(lib.books());
        }
    }
    Ok(())
}

/// The book as the server has it now, from the cache or a lookup by id.
fn find_book(lib: &mut Client, id: &BookId) -> Result<Book> {
    if let Some(book) = lib.books().iter().find(|b| &b.id == id) {
        return Ok(book.clone());
    }
    lib.set_search_mode(SearchMode::ById);
    lib.set_search_value(id.as_str());
    lib.search()?
        .first()
        .cloned()
        .with_context(|| format!("no book with id {id}"))
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("No books.");
        return;
    }
    for b in books {
        println!(
            "{:>6}  {} by {} ({})  [{}, {} p]",
            b.id, b.title, b.author, b.year, b.category, b.pages
        );
    }
}
