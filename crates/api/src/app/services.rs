//! Service wiring: stores, payment provider and the policy engine.

use std::sync::Arc;

use workify_auth::{PolicyEngine, TokenService};
use workify_infra::{
    InMemoryPaymentGateway, InMemoryStore, PaymentGateway, PaymentStore, PostgresStore,
    ReviewStore, StoreError, StripeGateway, TaskStore, UserDirectory, UserStore,
};

use crate::config::AppConfig;
use crate::cookies::CookiePolicy;

/// Everything a handler may touch. Built once at startup and shared via `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub engine: Arc<PolicyEngine>,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub cookies: CookiePolicy,
}

impl AppServices {
    /// Wire every collection to one backing store.
    ///
    /// The policy engine reads roles from the same user collection the
    /// handlers mutate, so role changes apply to the next request.
    pub fn from_store<S>(
        tokens: TokenService,
        store: Arc<S>,
        gateway: Arc<dyn PaymentGateway>,
        cookies: CookiePolicy,
    ) -> Self
    where
        S: UserStore + TaskStore + PaymentStore + ReviewStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let directory = Arc::new(UserDirectory::new(users.clone()));

        Self {
            engine: Arc::new(PolicyEngine::new(tokens, directory)),
            users,
            tasks: store.clone(),
            payments: store.clone(),
            reviews: store,
            gateway,
            cookies,
        }
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// Stripe when `STRIPE_SECRET_KEY` is set, in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);
    let cookies = CookiePolicy::new(config.environment, config.token_ttl);

    let gateway: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
        Some(key) => Arc::new(StripeGateway::new(key.clone(), config.stripe_api_base.clone())),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set; using in-memory payment provider");
            Arc::new(InMemoryPaymentGateway::new())
        }
    };

    let services = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PostgresStore::connect(url).await?);
            tracing::info!("connected to postgres document store");
            AppServices::from_store(tokens, store, gateway, cookies)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is not persisted)");
            AppServices::from_store(tokens, Arc::new(InMemoryStore::new()), gateway, cookies)
        }
    };

    Ok(services)
}
