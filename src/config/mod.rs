use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub xero: XeroConfig,
    pub order_manager: OrderManagerConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Xero app credentials and account mapping.
#[derive(Deserialize, Clone, Debug)]
pub struct XeroConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Single-slot token file, overwritten wholesale on every refresh.
    pub token_file: PathBuf,
    pub identity_base_url: String,
    pub api_base_url: String,
    /// Webhook signing key. Signature checks are skipped when unset.
    pub webhook_key: Option<Secret<String>>,
    /// Sales account code applied to derived line items.
    pub sales_account_code: String,
    /// Clearing account used when marking invoices as paid. Two alternate
    /// sources; the first non-empty wins, else "090".
    pub payment_account_code: Option<String>,
    pub clearing_account_code: Option<String>,
    pub branding: BrandingConfig,
}

/// Branding theme ids per sales channel. All optional; the vendor's default
/// branding applies when unset.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct BrandingConfig {
    pub web_store: Option<String>,
    pub ebay: Option<String>,
    pub amazon: Option<String>,
    pub etsy: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct OrderManagerConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("BRIDGE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("BRIDGE_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse()?;

        let client_id = env::var("XERO_CLIENT_ID").expect("XERO_CLIENT_ID must be set");
        let client_secret =
            env::var("XERO_CLIENT_SECRET").expect("XERO_CLIENT_SECRET must be set");
        let token_file = env::var("XERO_TOKEN_FILE")
            .unwrap_or_else(|_| "xero_token.json".to_string())
            .into();
        let identity_base_url = env::var("XERO_IDENTITY_URL")
            .unwrap_or_else(|_| "https://identity.xero.com".to_string());
        let api_base_url =
            env::var("XERO_API_URL").unwrap_or_else(|_| "https://api.xero.com".to_string());
        let webhook_key = env::var("XERO_WEBHOOK_KEY").ok().map(Secret::new);

        let sales_account_code =
            env::var("XERO_SALES_ACCOUNT").unwrap_or_else(|_| "200".to_string());
        let payment_account_code = env::var("XERO_PAYMENT_ACCOUNT").ok();
        let clearing_account_code = env::var("CLEARING_ACCOUNT_CODE").ok();

        let branding = BrandingConfig {
            web_store: env::var("XERO_THEME_WEB").ok(),
            ebay: env::var("XERO_THEME_EBAY").ok(),
            amazon: env::var("XERO_THEME_AMAZON").ok(),
            etsy: env::var("XERO_THEME_ETSY").ok(),
        };

        let om_base_url = env::var("ORDER_MANAGER_URL").expect("ORDER_MANAGER_URL must be set");
        let om_api_key = env::var("ORDER_MANAGER_API_KEY").unwrap_or_default();

        Ok(Self {
            server: ServerConfig { host, port },
            xero: XeroConfig {
                client_id,
                client_secret: Secret::new(client_secret),
                token_file,
                identity_base_url,
                api_base_url,
                webhook_key,
                sales_account_code,
                payment_account_code,
                clearing_account_code,
                branding,
            },
            order_manager: OrderManagerConfig {
                base_url: om_base_url,
                api_key: Secret::new(om_api_key),
            },
            service_name: "invoice-bridge".to_string(),
        })
    }
}
