use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub year: i64,
    pub category: String,
    pub pages: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub category: String,
    pub pages: i64,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginOutput {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

/// The single account the server accepts.
#[derive(Clone, Debug)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            email: "a@b.com".to_string(),
            password: "x".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Store {
    account: Account,
    tokens: HashSet<String>,
    books: BTreeMap<u64, Book>,
    next_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_account(Account::default())
}

pub fn app_with_account(account: Account) -> Router {
    let db: Db = Arc::new(RwLock::new(Store {
        account,
        tokens: HashSet::new(),
        books: BTreeMap::new(),
        next_id: 1,
    }));
    Router::new()
        .route("/login", post(login))
        .route("/books", get(list_books).post(create_book))
        .route("/books/", get(list_books))
        .route("/books/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_account(listener, Account::default()).await
}

pub async fn run_with_account(listener: TcpListener, account: Account) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_account(account)).await
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginOutput>, StatusCode> {
    let mut store = db.write().await;
    if input.email != store.account.email || input.password != store.account.password {
        tracing::info!(email = %input.email, "login rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone());
    tracing::info!(email = %input.email, "login accepted");
    Ok(Json(LoginOutput { token }))
}

/// Reject the request unless it carries a bearer token this server issued.
fn authorize(store: &Store, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if store.tokens.contains(token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Category filtering is an exact, case-sensitive match.
async fn list_books(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Book>>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let books = store
        .books
        .values()
        .filter(|b| params.category.as_ref().map_or(true, |c| &b.category == c))
        .cloned()
        .collect();
    Ok(Json(books))
}

async fn create_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<BookInput>,
) -> Result<(StatusCode, Json<Book>), StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let id = store.next_id;
    store.next_id += 1;
    let book = Book {
        id,
        title: input.title,
        author: input.author,
        year: input.year,
        category: input.category,
        pages: input.pages,
    };
    store.books.insert(id, book.clone());
    tracing::debug!(id, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Book>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store.books.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<BookInput>,
) -> Result<Json<Book>, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let book = store.books.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    book.title = input.title;
    book.author = input.author;
    book.year = input.year;
    book.category = input.category;
    book.pages = input.pages;
    tracing::debug!(id, "book updated");
    Ok(Json(book.clone()))
}

async fn delete_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store
        .books
        .remove(&id)
        .map(|_| {
            tracing::debug!(id, "book deleted");
            StatusCode::NO_CONTENT
        })
        .ok_or(StatusCode::NOT_FOUND)
}
