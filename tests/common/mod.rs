use invoice_bridge::config::{
    BrandingConfig, Config, OrderManagerConfig, ServerConfig, XeroConfig,
};
use invoice_bridge::Application;
use secrecy::Secret;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TENANT_ID: &str = "tenant-11111111";

pub struct TestOptions {
    /// Seed the token file with a usable refresh credential.
    pub seed_token: bool,
    pub webhook_key: Option<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            seed_token: true,
            webhook_key: None,
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub token_file: PathBuf,
    pub identity: MockServer,
    pub api: MockServer,
    pub orders: MockServer,
    pub client: reqwest::Client,
    _token_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let identity = MockServer::start().await;
        let api = MockServer::start().await;
        let orders = MockServer::start().await;

        let token_dir = TempDir::new().expect("Failed to create token dir");
        let token_file = token_dir.path().join("xero_token.json");

        if options.seed_token {
            let seed = json!({
                "access_token": "seed-access",
                "refresh_token": "seed-refresh",
                "expires_at": 0,
                "id_token": "seed-id",
                "scope": "accounting.transactions offline_access",
                "token_type": "Bearer"
            });
            std::fs::write(&token_file, seed.to_string()).expect("Failed to seed token file");
        }

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            xero: XeroConfig {
                client_id: "test-client-id".to_string(),
                client_secret: Secret::new("test-client-secret".to_string()),
                token_file: token_file.clone(),
                identity_base_url: identity.uri(),
                api_base_url: api.uri(),
                webhook_key: options.webhook_key.map(Secret::new),
                sales_account_code: "200".to_string(),
                payment_account_code: Some("092".to_string()),
                clearing_account_code: None,
                branding: BrandingConfig {
                    web_store: Some("theme-web".to_string()),
                    ebay: Some("theme-ebay".to_string()),
                    amazon: None,
                    etsy: None,
                },
            },
            order_manager: OrderManagerConfig {
                base_url: orders.uri(),
                api_key: Secret::new("test-api-key".to_string()),
            },
            service_name: "invoice-bridge-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to come up by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            token_file,
            identity,
            api,
            orders,
            client,
            _token_dir: token_dir,
        }
    }

    /// Mount a successful token refresh on the identity mock.
    pub async fn mock_refresh_success(&self) {
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-access",
                "refresh_token": "fresh-refresh",
                "expires_in": 1800,
                "id_token": "fresh-id",
                "scope": "accounting.transactions offline_access",
                "token_type": "Bearer"
            })))
            .mount(&self.identity)
            .await;
    }

    /// Mount a connections listing with a single organisation.
    pub async fn mock_connections(&self) {
        Mock::given(method("GET"))
            .and(path("/connections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "conn-1",
                    "tenantId": TEST_TENANT_ID,
                    "tenantType": "ORGANISATION",
                    "tenantName": "Test Org"
                }
            ])))
            .mount(&self.api)
            .await;
    }

    pub fn persisted_token(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(&self.token_file).expect("Token file missing");
        serde_json::from_str(&raw).expect("Token file is not valid JSON")
    }
}
