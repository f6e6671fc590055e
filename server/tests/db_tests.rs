//! End-to-end tests against a real Postgres.
//!
//! Skipped unless `DATABASE_URL` is set. Each test gets a single-connection pool whose
//! connection runs inside a test transaction, so nothing is ever committed. Names carry a
//! per-test suffix so concurrent tests never wait on each other's unique keys.
//!
//! Set `INSECURE_PASSWORD_HASHING=1` to keep registration fast.

use std::io::Cursor;
use std::sync::OnceLock;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::Engine;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use foodgram_core::shopping_list::capitalize;
use foodgram_server::config::Config;
use foodgram_server::db::{create_pool, DbPool};
use foodgram_server::models::{NewIngredient, NewTag};
use foodgram_server::schema::{ingredients, tags};
use foodgram_server::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

static MIGRATED: OnceLock<()> = OnceLock::new();

#[derive(Debug)]
struct TestTransaction;

impl CustomizeConnection<PgConnection, r2d2::Error> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        conn.begin_test_transaction().map_err(r2d2::Error::QueryError)
    }
}

struct TestUser {
    id: i64,
    token: String,
}

struct TestApp {
    app: Router,
    pool: DbPool,
    suffix: String,
}

impl TestApp {
    fn new() -> Option<Self> {
        let Some(url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) else {
            eprintln!("DATABASE_URL is not set; skipping");
            return None;
        };

        MIGRATED.get_or_init(|| {
            create_pool(&url).expect("failed to run migrations");
        });

        let pool = r2d2::Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_secs(10))
            .connection_customizer(Box::new(TestTransaction))
            .build(ConnectionManager::<PgConnection>::new(&url))
            .expect("failed to build test pool");

        let config = Config::from_lookup(|name| match name {
            "DATABASE_URL" => Some(url.clone()),
            "FOODGRAM_PUBLIC_URL" => Some("http://testserver".to_string()),
            _ => None,
        })
        .unwrap();

        Some(TestApp {
            app: app(AppState::new(pool.clone(), config)),
            pool,
            suffix: Uuid::new_v4().simple().to_string()[..12].to_string(),
        })
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, token, body).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.json(Method::GET, uri, token, None).await
    }

    fn email(&self, name: &str) -> String {
        format!("{}-{}@example.com", name, self.suffix)
    }

    async fn register(&self, name: &str) -> i64 {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/users",
                None,
                Some(json!({
                    "email": self.email(name),
                    "username": format!("{}_{}", name, self.suffix),
                    "first_name": name,
                    "last_name": "Тестов",
                    "password": "Qwerty123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.json(
            Method::POST,
            "/api/auth/token/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn user(&self, name: &str) -> TestUser {
        let id = self.register(name).await;
        let (status, body) = self.login(&self.email(name), "Qwerty123").await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        TestUser {
            id,
            token: body["auth_token"].as_str().unwrap().to_string(),
        }
    }

    /// Insert an ingredient named `<name> <suffix>`.
    fn ingredient(&self, name: &str, unit: &str) -> (i64, String) {
        let name = format!("{} {}", name, self.suffix);
        let mut conn = self.pool.get().unwrap();
        let id: i32 = diesel::insert_into(ingredients::table)
            .values(NewIngredient {
                name: name.clone(),
                measurement_unit: unit.to_string(),
            })
            .returning(ingredients::id)
            .get_result(&mut conn)
            .unwrap();
        (i64::from(id), name)
    }

    fn tag(&self, slug: &str) -> (i64, String) {
        let slug = format!("{}-{}", slug, self.suffix);
        let color = format!("#{}", &Uuid::new_v4().simple().to_string()[..6]);
        let mut conn = self.pool.get().unwrap();
        let id: i32 = diesel::insert_into(tags::table)
            .values(NewTag {
                name: &slug,
                color: &color,
                slug: &slug,
            })
            .returning(tags::id)
            .get_result(&mut conn)
            .unwrap();
        (i64::from(id), slug)
    }

    async fn recipe(&self, author: &TestUser, name: &str, tag: i64, items: &[(i64, i64)]) -> i64 {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/recipes",
                Some(&author.token),
                Some(recipe_body(name, tag, items)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }
}

fn png_data_uri() -> String {
    let mut bytes = Vec::new();
    image::RgbImage::new(2, 2)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn recipe_body(name: &str, tag: i64, items: &[(i64, i64)]) -> Value {
    let ingredients: Vec<Value> = items
        .iter()
        .map(|(id, amount)| json!({ "id": id, "amount": amount }))
        .collect();
    json!({
        "ingredients": ingredients,
        "tags": [tag],
        "image": png_data_uri(),
        "name": name,
        "text": "Смешать и подать.",
        "cooking_time": 10,
    })
}

fn ids(page: &Value) -> Vec<i64> {
    page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[tokio::test]
async fn test_login_email_ignores_case() {
    let Some(t) = TestApp::new() else { return };
    t.register("Cook").await;

    let (status, body) = t.login(&t.email("Cook").to_uppercase(), "Qwerty123").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["auth_token"].is_string());

    let (status, body) = t.login(&t.email("cook"), "wrong").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_only_author_can_change_recipe() {
    let Some(t) = TestApp::new() else { return };
    let alice = t.user("alice").await;
    let bob = t.user("bob").await;
    let (tag, _) = t.tag("lunch");
    let (flour, _) = t.ingredient("мука", "г");
    let recipe = t.recipe(&alice, "Блины", tag, &[(flour, 200)]).await;
    let uri = format!("/api/recipes/{}", recipe);

    let patch = recipe_body("Чужие блины", tag, &[(flour, 1)]);
    let (status, _) = t.json(Method::PATCH, &uri, None, Some(patch.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = t.json(Method::PATCH, &uri, Some(&bob.token), Some(patch)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["detail"].is_string());
    let (status, _) = t.json(Method::DELETE, &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Блины");

    let (status, _) = t.json(Method::DELETE, &uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_replaces_ingredient_set() {
    let Some(t) = TestApp::new() else { return };
    let alice = t.user("alice").await;
    let (tag, _) = t.tag("dinner");
    let (flour, _) = t.ingredient("мука", "г");
    let (sugar, _) = t.ingredient("сахар", "г");
    let (salt, salt_name) = t.ingredient("соль", "щепотка");
    let recipe = t.recipe(&alice, "Пирог", tag, &[(flour, 300), (sugar, 100)]).await;
    let uri = format!("/api/recipes/{}", recipe);

    let (status, body) = t
        .json(
            Method::PATCH,
            &uri,
            Some(&alice.token),
            Some(recipe_body("Пирог", tag, &[(salt, 2)])),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (_, body) = t.get(&uri, None).await;
    assert_eq!(
        body["ingredients"],
        json!([{
            "id": salt,
            "name": salt_name,
            "measurement_unit": "щепотка",
            "amount": 2,
        }])
    );
}

#[tokio::test]
async fn test_favorites_flag_and_rules() {
    let Some(t) = TestApp::new() else { return };
    let alice = t.user("alice").await;
    let (tag, _) = t.tag("dessert");
    let (sugar, _) = t.ingredient("сахар", "г");
    let liked = t.recipe(&alice, "Торт", tag, &[(sugar, 100)]).await;
    let other = t.recipe(&alice, "Зефир", tag, &[(sugar, 50)]).await;
    let favorite = format!("/api/recipes/{}/favorite", liked);

    let (status, body) = t.json(Method::POST, &favorite, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], liked);
    assert_eq!(body["name"], "Торт");

    let (status, body) = t.json(Method::POST, &favorite, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Рецепт уже в избранном." }));

    let list = |flag: &str| format!("/api/recipes?author={}&is_favorited={}", alice.id, flag);
    let (_, body) = t.get(&list("1"), Some(&alice.token)).await;
    assert_eq!(ids(&body), vec![liked]);
    let (_, body) = t.get(&list("0"), Some(&alice.token)).await;
    assert_eq!(ids(&body), vec![other]);
    let (_, body) = t.get(&list("maybe"), Some(&alice.token)).await;
    assert_eq!(body["count"], 2);
    let (_, body) = t.get(&list("1"), None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = t.get(&format!("/api/recipes/{}", liked), Some(&alice.token)).await;
    assert_eq!(body["is_favorited"], true);
    assert_eq!(body["is_in_shopping_cart"], false);

    let (status, _) = t.json(Method::DELETE, &favorite, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = t.json(Method::DELETE, &favorite, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Рецепта не было в избранном." }));
}

#[tokio::test]
async fn test_shopping_cart_download_sums_across_recipes() {
    let Some(t) = TestApp::new() else { return };
    let alice = t.user("alice").await;
    let (tag, _) = t.tag("baking");
    let (flour, flour_name) = t.ingredient("мука", "г");
    let (eggs, eggs_name) = t.ingredient("яйца", "шт");
    let pancakes = t.recipe(&alice, "Блины", tag, &[(flour, 100), (eggs, 2)]).await;
    let bread = t.recipe(&alice, "Хлеб", tag, &[(flour, 200)]).await;

    let (status, body) = t
        .json(
            Method::GET,
            "/api/recipes/download_shopping_cart",
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_string());

    for recipe in [pancakes, bread] {
        let uri = format!("/api/recipes/{}/shopping_cart", recipe);
        let (status, _) = t.json(Method::POST, &uri, Some(&alice.token), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let uri = format!("/api/recipes/{}/shopping_cart", bread);
    let (status, body) = t.json(Method::POST, &uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Рецепт уже в списке покупок." }));

    let (_, body) = t
        .get(
            &format!("/api/recipes?author={}&is_in_shopping_cart=1", alice.id),
            Some(&alice.token),
        )
        .await;
    assert_eq!(body["count"], 2);

    let (status, bytes) = t
        .send(
            Method::GET,
            "/api/recipes/download_shopping_cart",
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(
        text.contains(&format!("▢ {} (г) — 300", capitalize(&flour_name))),
        "{}",
        text
    );
    assert!(
        text.contains(&format!("▢ {} (шт) — 2", capitalize(&eggs_name))),
        "{}",
        text
    );
}

#[tokio::test]
async fn test_subscription_rules_and_recipe_previews() {
    let Some(t) = TestApp::new() else { return };
    let alice = t.user("alice").await;
    let bob = t.user("bob").await;
    let (tag, _) = t.tag("snack");
    let (nuts, _) = t.ingredient("орехи", "г");
    t.recipe(&bob, "Орехи", tag, &[(nuts, 50)]).await;
    let newest = t.recipe(&bob, "Ещё орехи", tag, &[(nuts, 70)]).await;

    let own = format!("/api/users/{}/subscribe", alice.id);
    let (status, body) = t.json(Method::POST, &own, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Нельзя подписаться на самого себя." }));

    let subscribe = format!("/api/users/{}/subscribe", bob.id);
    let (status, body) = t
        .json(
            Method::POST,
            &format!("{}?recipes_limit=1", subscribe),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 2);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(body["recipes"][0]["id"], newest);

    let (status, body) = t.json(Method::POST, &subscribe, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Вы уже подписаны на этого автора." }));

    let (_, body) = t.get("/api/users/subscriptions", Some(&alice.token)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], bob.id);
    assert_eq!(body["results"][0]["recipes"].as_array().unwrap().len(), 2);

    let (status, _) = t.json(Method::DELETE, &subscribe, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = t.json(Method::DELETE, &subscribe, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Вы не были подписаны на этого автора." }));
}

#[tokio::test]
async fn test_page_past_the_end() {
    let Some(t) = TestApp::new() else { return };
    let alice = t.user("alice").await;
    let (tag, _) = t.tag("drinks");
    let (water, _) = t.ingredient("вода", "мл");
    let first = t.recipe(&alice, "Чай", tag, &[(water, 200)]).await;
    t.recipe(&alice, "Кофе", tag, &[(water, 100)]).await;

    let uri = |page: u32| format!("/api/recipes?author={}&limit=1&page={}", alice.id, page);
    let (status, body) = t.get(&uri(2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(ids(&body), vec![first]);
    assert_eq!(body["next"], Value::Null);
    assert!(body["previous"].as_str().unwrap().starts_with("http://testserver/api/recipes?"));

    let (status, body) = t.get(&uri(3), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Invalid page." }));
}

#[tokio::test]
async fn test_unknown_tag_or_author_is_rejected() {
    let Some(t) = TestApp::new() else { return };
    let alice = t.user("alice").await;
    let (tag, slug) = t.tag("breakfast");
    let (oats, _) = t.ingredient("овсянка", "г");
    let porridge = t.recipe(&alice, "Каша", tag, &[(oats, 80)]).await;

    let (status, body) = t
        .get(&format!("/api/recipes?author={}&tags={}", alice.id, slug), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![porridge]);

    let missing = format!("missing-{}", t.suffix);
    let (status, body) = t
        .get(&format!("/api/recipes?tags={}&tags={}", slug, missing), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["tags"],
        json!([format!(
            "Select a valid choice. {} is not one of the available choices.",
            missing
        )])
    );

    let (status, body) = t.get("/api/recipes?author=2147483647", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["author"].is_array());
}

#[tokio::test]
async fn test_ingredient_search_folds_case() {
    let Some(t) = TestApp::new() else { return };
    let (sugar, sugar_name) = t.ingredient("Сахар", "г");
    t.ingredient("соль", "г");

    // Cyrillic case as stored, ASCII suffix in upper case.
    let prefix = format!("Сахар {}", t.suffix.to_uppercase());
    let (status, body) = t
        .get(&format!("/api/ingredients?name={}", encode(&prefix)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{ "id": sugar, "name": sugar_name, "measurement_unit": "г" }])
    );

    let (_, body) = t
        .get(&format!("/api/ingredients?name={}", encode("%")), None)
        .await;
    assert_eq!(body, json!([]));
}
