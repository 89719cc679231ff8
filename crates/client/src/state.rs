//! Client state shared across the front end.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::services::{
    AccountService, CartStore, ChatService, ProductCatalog, SandboxService, Session, ShopService,
    TokenStore,
};
use crate::storage::{FileStore, KeyValueStore};

/// Everything a front end needs, wired over one API client and one store.
///
/// This struct is cheaply cloneable via `Arc`; clones share the cart,
/// catalog, conversation and session.
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<ClientStateInner>,
}

struct ClientStateInner {
    config: ClientConfig,
    api: ApiClient,
    cart: CartStore,
    catalog: ProductCatalog,
    session: Session<ApiClient>,
    chat: ChatService<ApiClient>,
    shop: ShopService<ApiClient>,
    sandbox: SandboxService<ApiClient>,
    account: AccountService,
}

impl ClientState {
    /// Create client state persisted under `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the HTTP
    /// client fails to build.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = FileStore::open(&config.state_dir)?;
        Self::with_storage(config, Arc::new(storage))
    }

    /// Create client state over an explicit store.
    ///
    /// Persisted cart and tokens are rehydrated immediately; call
    /// [`restore_session`](Self::restore_session) from inside the runtime to
    /// resume token refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        let tokens = TokenStore::load(Arc::clone(&storage));
        let cart = CartStore::load(storage);
        let catalog = ProductCatalog::new();

        let session = Session::new(api.clone(), tokens.clone(), config.token_refresh_interval);
        let chat = ChatService::new(api.clone(), tokens.clone(), catalog.clone());
        let shop = ShopService::new(api.clone(), cart.clone(), catalog.clone(), tokens.clone());
        let sandbox = SandboxService::new(api.clone(), tokens.clone());
        let account = AccountService::new(api.clone(), tokens);

        Ok(Self {
            inner: Arc::new(ClientStateInner {
                config,
                api,
                cart,
                catalog,
                session,
                chat,
                shop,
                sandbox,
                account,
            }),
        })
    }

    /// Resume background token refresh if persisted tokens were found.
    ///
    /// Returns whether the user is logged in.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while tokens are present.
    pub fn restore_session(&self) -> bool {
        self.inner.session.restore()
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn session(&self) -> &Session<ApiClient> {
        &self.inner.session
    }

    #[must_use]
    pub fn chat(&self) -> &ChatService<ApiClient> {
        &self.inner.chat
    }

    #[must_use]
    pub fn shop(&self) -> &ShopService<ApiClient> {
        &self.inner.shop
    }

    #[must_use]
    pub fn sandbox(&self) -> &SandboxService<ApiClient> {
        &self.inner.sandbox
    }

    #[must_use]
    pub fn account(&self) -> &AccountService {
        &self.inner.account
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glt_core::ProductId;
    use url::Url;

    use super::*;
    use crate::services::AuthTokens;

    fn config(dir: &std::path::Path) -> ClientConfig {
        let mut config = ClientConfig::new(Url::parse("http://127.0.0.1:9/").unwrap());
        config.state_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_services_share_cart_and_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let state = ClientState::new(config(dir.path())).unwrap();

        state.cart().set_quantity(ProductId::new(4), 2);
        assert_eq!(state.shop().cart().quantity(ProductId::new(4)), 2);
        assert_eq!(state.chat().catalog().len(), state.catalog().len());
    }

    #[tokio::test]
    async fn test_reopen_rehydrates_cart_and_session() {
        let dir = tempfile::tempdir().unwrap();
        {
            let state = ClientState::new(config(dir.path())).unwrap();
            state.cart().set_quantity(ProductId::new(1), 3);
            state.session().tokens().set(AuthTokens::new("access", "refresh"));
        }

        let reopened = ClientState::new(config(dir.path())).unwrap();
        assert_eq!(reopened.cart().quantity(ProductId::new(1)), 3);
        assert!(reopened.restore_session());
        assert!(reopened.session().is_refreshing());
    }
}
