//! Integration tests for the Girlz Love Tech client state core.
//!
//! The services are exercised end to end against [`FakeBackend`], an
//! in-process stand-in for the remote auth, chat, shop and sandbox services.
//! No network or server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p glt-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart persistence and invariants
//! - `conversation` - Chat send flow, ordering, fallbacks and badges
//! - `session_lifecycle` - Login, logout and background refresh
//! - `checkout` - Orders and product listings
//! - `sandbox_lifecycle` - Sandbox actions and status polling
//! - `rehydration` - Reopening state from a file-backed store

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use glt_client::api::{
    ApiError, AuthApi, ChatGateway, ChatReply, LoginTokens, RefreshedAccess, SandboxAction,
    SandboxApi, ShopApi,
};
use glt_client::services::{
    CartStore, ChatService, ProductCatalog, SandboxService, Session, ShopService, TokenStore,
};
use glt_client::storage::{KeyValueStore, MemoryStore};
use glt_core::{
    Badge, OrderConfirmation, OrderId, OrderLine, Price, Product, ProductId, SandboxDescriptor,
    SandboxStatus, SandboxUrls,
};
use tokio::sync::Notify;

/// Password the fake auth service accepts.
pub const PASSWORD: &str = "correct horse";

/// Refresh interval used by [`Harness`].
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(240);

// =============================================================================
// Fake backend
// =============================================================================

/// One queued chat outcome: a reply, or a failure when `reply` is `None`.
struct ScriptedReply {
    delay: Duration,
    reply: Option<ChatReply>,
}

#[derive(Default)]
struct BackendState {
    // Auth
    refresh_rejected: AtomicBool,
    blacklist_fails: AtomicBool,
    logins: AtomicUsize,
    refreshes: AtomicUsize,
    blacklists: AtomicUsize,

    // Chat
    script: Mutex<VecDeque<ScriptedReply>>,
    gate: Mutex<Option<Arc<Notify>>>,
    chat_messages: Mutex<Vec<String>>,

    // Shop
    products: Mutex<Vec<Product>>,
    orders_fail: AtomicBool,
    orders: Mutex<Vec<Vec<OrderLine>>>,

    // Sandbox
    sandbox: Mutex<Option<SandboxStatus>>,
    boot_polls_left: AtomicUsize,
    boot_polls: AtomicUsize,
    sandbox_actions: Mutex<Vec<SandboxAction>>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process implementation of every remote service the client uses.
///
/// Cheap to clone; clones share state so a test can keep a handle while the
/// services own another.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<BackendState>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent refresh fail with 401.
    pub fn reject_refresh(&self) {
        self.state.refresh_rejected.store(true, Ordering::SeqCst);
    }

    /// Make every blacklist call fail with 500.
    pub fn fail_blacklist(&self) {
        self.state.blacklist_fails.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn login_count(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.state.refreshes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn blacklist_count(&self) -> usize {
        self.state.blacklists.load(Ordering::SeqCst)
    }

    /// Queue a reply for the next unscripted chat call.
    ///
    /// Unscripted calls echo the message back.
    pub fn script_reply(&self, reply: ChatReply, delay: Duration) {
        lock(&self.state.script).push_back(ScriptedReply {
            delay,
            reply: Some(reply),
        });
    }

    /// Queue a failure for the next chat call.
    pub fn script_failure(&self, delay: Duration) {
        lock(&self.state.script).push_back(ScriptedReply { delay, reply: None });
    }

    /// Hold every chat reply until the returned `Notify` is signalled.
    #[must_use]
    pub fn hold_replies(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.state.gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Messages the chat endpoint received, in arrival order.
    #[must_use]
    pub fn chat_messages(&self) -> Vec<String> {
        lock(&self.state.chat_messages).clone()
    }

    /// Set the product listing.
    pub fn set_products(&self, products: Vec<Product>) {
        *lock(&self.state.products) = products;
    }

    /// Make every subsequent order fail with 400.
    pub fn fail_orders(&self, fail: bool) {
        self.state.orders_fail.store(fail, Ordering::SeqCst);
    }

    /// Orders accepted so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Vec<OrderLine>> {
        lock(&self.state.orders).clone()
    }

    /// Number of status checks a started sandbox reports `paused` before `running`.
    pub fn set_boot_polls(&self, polls: usize) {
        self.state.boot_polls.store(polls, Ordering::SeqCst);
    }

    #[must_use]
    pub fn sandbox_actions(&self) -> Vec<SandboxAction> {
        lock(&self.state.sandbox_actions).clone()
    }

    fn sandbox_descriptor(status: SandboxStatus) -> SandboxDescriptor {
        let running = status == SandboxStatus::Running;
        SandboxDescriptor {
            user_id: "1".to_string(),
            container_name: "sandbox-1".to_string(),
            status,
            urls: SandboxUrls {
                frontend: running.then(|| "https://1.sandbox.example/".to_string()),
                backend: running.then(|| "https://1.sandbox.example/api/".to_string()),
                code_server: running.then(|| "https://1.sandbox.example/code/".to_string()),
            },
        }
    }

    fn not_found() -> ApiError {
        ApiError::Api {
            status: 404,
            message: "No sandbox found for this user".to_string(),
        }
    }
}

fn require_token(token: &str) -> Result<(), ApiError> {
    if token.starts_with("access-") {
        Ok(())
    } else {
        Err(ApiError::Unauthorized(
            "Given token not valid for any token type".to_string(),
        ))
    }
}

impl AuthApi for FakeBackend {
    async fn login(&self, email: &str, password: &str) -> Result<LoginTokens, ApiError> {
        if password != PASSWORD {
            return Err(ApiError::Unauthorized(
                "No active account found with the given credentials".to_string(),
            ));
        }
        self.state.logins.fetch_add(1, Ordering::SeqCst);
        Ok(LoginTokens {
            access: "access-0".to_string(),
            refresh: format!("refresh-{email}"),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccess, ApiError> {
        if self.state.refresh_rejected.load(Ordering::SeqCst)
            || !refresh_token.starts_with("refresh-")
        {
            return Err(ApiError::Unauthorized(
                "Token is invalid or expired".to_string(),
            ));
        }
        let n = self.state.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RefreshedAccess {
            access: format!("access-{n}"),
        })
    }

    async fn blacklist(&self, _refresh_token: &str) -> Result<(), ApiError> {
        self.state.blacklists.fetch_add(1, Ordering::SeqCst);
        if self.state.blacklist_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 500,
                message: "Internal server error".to_string(),
            });
        }
        Ok(())
    }
}

impl ChatGateway for FakeBackend {
    async fn send_message(&self, access_token: &str, message: &str) -> Result<ChatReply, ApiError> {
        require_token(access_token)?;
        lock(&self.state.chat_messages).push(message.to_string());

        let scripted = lock(&self.state.script).pop_front();
        let gate = lock(&self.state.gate).clone();

        if let Some(gate) = gate {
            gate.notified().await;
        }

        match scripted {
            Some(ScriptedReply { delay, reply }) => {
                tokio::time::sleep(delay).await;
                reply.ok_or_else(|| ApiError::Api {
                    status: 503,
                    message: "Assistant unavailable".to_string(),
                })
            }
            None => Ok(ChatReply::text(format!("echo: {message}"))),
        }
    }
}

impl ShopApi for FakeBackend {
    async fn products(&self, access_token: &str) -> Result<Vec<Product>, ApiError> {
        require_token(access_token)?;
        Ok(lock(&self.state.products).clone())
    }

    async fn place_order(
        &self,
        access_token: &str,
        lines: &[OrderLine],
    ) -> Result<OrderConfirmation, ApiError> {
        require_token(access_token)?;
        if self.state.orders_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 400,
                message: "Product 3 is out of stock".to_string(),
            });
        }

        let total = {
            let products = lock(&self.state.products);
            lines
                .iter()
                .filter_map(|line| {
                    products
                        .iter()
                        .find(|p| p.id == line.product_id)
                        .map(|p| p.price * line.quantity)
                })
                .sum::<Price>()
        };

        let mut orders = lock(&self.state.orders);
        orders.push(lines.to_vec());
        Ok(OrderConfirmation {
            id: OrderId::new(i64::try_from(orders.len()).unwrap_or(i64::MAX)),
            status: Some("placed".to_string()),
            total: Some(total),
            created_at: None,
            items: lines.to_vec(),
        })
    }
}

impl SandboxApi for FakeBackend {
    async fn sandbox_status(&self, access_token: &str) -> Result<SandboxDescriptor, ApiError> {
        require_token(access_token)?;
        let mut sandbox = lock(&self.state.sandbox);
        let status = (*sandbox).ok_or_else(Self::not_found)?;

        if status == SandboxStatus::Paused
            && self
                .state
                .boot_polls_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
        {
            // Boot finished
            *sandbox = Some(SandboxStatus::Running);
            return Ok(Self::sandbox_descriptor(SandboxStatus::Running));
        }
        Ok(Self::sandbox_descriptor(status))
    }

    async fn sandbox_action(
        &self,
        access_token: &str,
        action: SandboxAction,
    ) -> Result<SandboxDescriptor, ApiError> {
        require_token(access_token)?;
        lock(&self.state.sandbox_actions).push(action);

        let mut sandbox = lock(&self.state.sandbox);
        let booting = || {
            let polls = self.state.boot_polls.load(Ordering::SeqCst);
            self.state.boot_polls_left.store(polls, Ordering::SeqCst);
            SandboxStatus::Paused
        };
        let next = match (action, *sandbox) {
            (SandboxAction::Create, _) | (SandboxAction::Reset | SandboxAction::Resume, Some(_)) => {
                booting()
            }
            (SandboxAction::Pause, Some(_)) => {
                // Paused on request stays paused
                self.state.boot_polls_left.store(usize::MAX, Ordering::SeqCst);
                SandboxStatus::Paused
            }
            (SandboxAction::Delete, Some(_)) => SandboxStatus::Deleted,
            (_, None) => return Err(Self::not_found()),
        };
        *sandbox = Some(next);
        Ok(Self::sandbox_descriptor(next))
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Services wired over one [`FakeBackend`] and one store, the way
/// `ClientState` wires them over the HTTP client.
pub struct Harness {
    pub backend: FakeBackend,
    pub storage: Arc<dyn KeyValueStore>,
    pub tokens: TokenStore,
    pub cart: CartStore,
    pub catalog: ProductCatalog,
    pub session: Session<FakeBackend>,
    pub chat: ChatService<FakeBackend>,
    pub shop: ShopService<FakeBackend>,
    pub sandbox: SandboxService<FakeBackend>,
}

impl Harness {
    /// Fresh services over in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStore::new()), FakeBackend::new())
    }

    /// Services over the given storage and backend.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn KeyValueStore>, backend: FakeBackend) -> Self {
        let tokens = TokenStore::load(Arc::clone(&storage));
        let cart = CartStore::load(Arc::clone(&storage));
        let catalog = ProductCatalog::new();

        Self {
            session: Session::new(backend.clone(), tokens.clone(), REFRESH_INTERVAL),
            chat: ChatService::new(backend.clone(), tokens.clone(), catalog.clone()),
            shop: ShopService::new(backend.clone(), cart.clone(), catalog.clone(), tokens.clone()),
            sandbox: SandboxService::new(backend.clone(), tokens.clone()),
            backend,
            storage,
            tokens,
            cart,
            catalog,
        }
    }

    /// Harness that is already logged in.
    ///
    /// # Panics
    ///
    /// Panics if the fake login fails, which only happens if [`PASSWORD`] changed.
    pub async fn logged_in() -> Self {
        let harness = Self::new();
        #[allow(clippy::expect_used)]
        harness
            .session
            .login("ada@example.org", PASSWORD)
            .await
            .expect("fake login accepts PASSWORD");
        harness
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

#[must_use]
pub fn product(id: i64, title: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        description: format!("{title} for young makers"),
        price: Price::from_cents(cents),
        image_url: None,
        in_stock: true,
    }
}

#[must_use]
pub fn badge(name: &str) -> Badge {
    Badge {
        name: name.to_string(),
        description: String::new(),
        icon: None,
        earned_at: None,
    }
}

/// Parse a chat reply from wire JSON.
///
/// # Panics
///
/// Panics if `json` is not a valid reply.
#[must_use]
pub fn reply_from_json(json: &str) -> ChatReply {
    #[allow(clippy::expect_used)]
    serde_json::from_str(json).expect("valid chat reply JSON")
}
