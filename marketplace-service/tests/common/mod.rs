use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordHasher;
use marketplace_service::identity::accounts::AccountService;
use marketplace_service::identity::bootstrap::ensure_admin_exists;
use marketplace_service::identity::models::PrincipalId;
use marketplace_service::identity::models::Role;
use marketplace_service::identity::password_reset::PasswordResetService;
use marketplace_service::identity::service::AuthenticationService;
use marketplace_service::inbound::http::router::create_router;
use marketplace_service::inbound::http::router::AppState;
use marketplace_service::outbound::notifications::LoggingResetNotifier;
use marketplace_service::outbound::repositories::InMemoryPrincipalStore;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ADMIN_IDENTIFIER: &str = "0549050018";
pub const ADMIN_PASSWORD: &str = "Ned@0820";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryPrincipalStore>,
    pub authenticator: Arc<Authenticator>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryPrincipalStore::new());

        // Cheapest Argon2 parameters keep the suite fast
        let authenticator = Arc::new(Authenticator::with_hasher(
            TEST_SECRET,
            PasswordHasher::with_cost(8, 1, 1).expect("Invalid Argon2 parameters"),
        ));

        ensure_admin_exists(
            store.as_ref(),
            &authenticator,
            ADMIN_IDENTIFIER,
            ADMIN_PASSWORD,
        )
        .await
        .expect("Failed to bootstrap admin");

        let state = AppState {
            authentication: Arc::new(AuthenticationService::new(
                Arc::clone(&store),
                Arc::clone(&authenticator),
                chrono::Duration::hours(24),
                ADMIN_IDENTIFIER,
            )),
            password_reset: Arc::new(PasswordResetService::new(
                Arc::clone(&store),
                Arc::new(LoggingResetNotifier::new()),
                Arc::clone(&authenticator),
                chrono::Duration::hours(24),
            )),
            accounts: Arc::new(AccountService::new(Arc::clone(&store))),
            authenticator: Arc::clone(&authenticator),
        };

        let router = create_router(state);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            store,
            authenticator,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Token for an arbitrary principal, bypassing login.
    pub fn token_for(&self, principal_id: PrincipalId, role: Role) -> String {
        self.authenticator
            .issue_token(principal_id, role, chrono::Duration::hours(1))
            .expect("Failed to issue token")
    }

    /// Register a user and return its ID.
    pub async fn register(&self, email: &str, phone: &str, password: &str) -> String {
        let response = self
            .post("/auth/register")
            .json(&json!({
                "email": email,
                "phone": phone,
                "password": password,
                "businessName": "Pharmacie Centrale"
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["user"]["id"]
            .as_str()
            .expect("Missing user id")
            .to_string()
    }

    /// Log in and return the session token.
    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let response = self
            .post("/auth/login")
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    /// Register a user and activate it through the admin endpoint.
    pub async fn register_active(&self, email: &str, phone: &str, password: &str) -> String {
        let user_id = self.register(email, phone, password).await;
        let admin_token = self.login(ADMIN_IDENTIFIER, ADMIN_PASSWORD).await;

        let response = self
            .put_authenticated(&format!("/users/{}/status", user_id), &admin_token)
            .json(&json!({ "isActive": true }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);

        user_id
    }
}
