//! In-memory stand-ins for the browser platform and the backend.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use hub_push::notify::{NotificationOptions, PushSubscriptionCredential, RelayMessage};
use hub_push::platform::{
    ActiveNotification, AgentRegistration, AgentScope, BrowserSubscription, Capabilities,
    ClientQuery, PageRuntime, Permission, SubscribeOptions, WindowClient,
};
use hub_push::relay::RelayChannel;
use hub_push::session::{Session, SessionProbe, SessionStore};
use hub_push::subscription::SubscriptionBackend;

pub const ORIGIN: &str = "https://hub.example";

/// Ordered record of platform calls shared between fakes.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: &str) {
        self.0.lock().unwrap().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

// Page side

pub struct FakeRegistration {
    pub log: CallLog,
    pub subscription: Mutex<Option<BrowserSubscription>>,
    pub subscribe_fails: AtomicBool,
    pub last_options: Mutex<Option<SubscribeOptions>>,
    created: AtomicUsize,
}

impl FakeRegistration {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            subscription: Mutex::new(None),
            subscribe_fails: AtomicBool::new(false),
            last_options: Mutex::new(None),
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentRegistration for FakeRegistration {
    fn scope(&self) -> String {
        format!("{}/", ORIGIN)
    }

    async fn subscribe(&self, options: &SubscribeOptions) -> Result<BrowserSubscription, Error> {
        self.log.push("subscribe");
        *self.last_options.lock().unwrap() = Some(options.clone());
        if self.subscribe_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("push service unreachable"));
        }
        // Each call mints a fresh endpoint so duplicates would be visible
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        let subscription = BrowserSubscription {
            endpoint: format!("https://push.example.com/send/{}", n),
            p256dh: Some(vec![4, 1, 2, 3, n as u8]),
            auth: Some(b"secret".to_vec()),
        };
        *self.subscription.lock().unwrap() = Some(subscription.clone());
        Ok(subscription)
    }

    async fn get_subscription(&self) -> Result<Option<BrowserSubscription>, Error> {
        self.log.push("get_subscription");
        Ok(self.subscription.lock().unwrap().clone())
    }

    async fn unsubscribe(&self, subscription: &BrowserSubscription) -> Result<bool, Error> {
        self.log.push("unsubscribe");
        let mut current = self.subscription.lock().unwrap();
        match current.as_ref() {
            Some(active) if active.endpoint == subscription.endpoint => {
                *current = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub struct FakePageRuntime {
    pub log: CallLog,
    pub capabilities: Capabilities,
    pub permission: Mutex<Permission>,
    pub prompt_result: Permission,
    pub register_fails: bool,
    pub registration: Arc<FakeRegistration>,
}

impl FakePageRuntime {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            registration: Arc::new(FakeRegistration::new(log.clone())),
            log,
            capabilities: Capabilities::all(),
            permission: Mutex::new(Permission::Default),
            prompt_result: Permission::Granted,
            register_fails: false,
        }
    }
}

#[async_trait]
impl PageRuntime for FakePageRuntime {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Permission {
        self.log.push("request_permission");
        *self.permission.lock().unwrap() = self.prompt_result;
        self.prompt_result
    }

    async fn register_agent(&self, script_url: &str) -> Result<Arc<dyn AgentRegistration>, Error> {
        self.log.push(&format!("register {}", script_url));
        if self.register_fails {
            return Err(anyhow!("SecurityError: insecure origin"));
        }
        Ok(self.registration.clone() as Arc<dyn AgentRegistration>)
    }

    async fn agent_ready(&self) -> Result<Arc<dyn AgentRegistration>, Error> {
        self.log.push("ready");
        Ok(self.registration.clone() as Arc<dyn AgentRegistration>)
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub fails: bool,
    pub published: Mutex<Vec<(i64, String, PushSubscriptionCredential)>>,
}

impl FakeBackend {
    pub fn published(&self) -> Vec<(i64, String, PushSubscriptionCredential)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionBackend for FakeBackend {
    async fn publish_subscription(
        &self,
        user_id: i64,
        token: &str,
        credential: &PushSubscriptionCredential,
    ) -> Result<(), Error> {
        self.published
            .lock()
            .unwrap()
            .push((user_id, token.to_string(), credential.clone()));
        if self.fails {
            return Err(anyhow!("Failed to save subscription (500): boom"));
        }
        Ok(())
    }
}

// Agent side

/// An open page whose incoming messages land on a relay channel.
pub struct FakeWindow {
    pub url: Mutex<String>,
    pub channel: Arc<RelayChannel>,
    pub focused: AtomicBool,
    pub navigations: Mutex<Vec<String>>,
    pub rejects_messages: bool,
}

impl FakeWindow {
    pub fn new(url: &str) -> Arc<Self> {
        Self::with_channel(url, RelayChannel::new())
    }

    pub fn with_channel(url: &str, channel: Arc<RelayChannel>) -> Arc<Self> {
        Arc::new(Self {
            url: Mutex::new(url.to_string()),
            channel,
            focused: AtomicBool::new(false),
            navigations: Mutex::new(Vec::new()),
            rejects_messages: false,
        })
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl WindowClient for FakeWindow {
    fn url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    fn post_message(&self, message: &RelayMessage) -> Result<(), Error> {
        if self.rejects_messages {
            return Err(anyhow!("DataCloneError"));
        }
        self.channel.dispatch(&serde_json::to_value(message)?);
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), Error> {
        self.navigations.lock().unwrap().push(url.to_string());
        *self.url.lock().unwrap() = format!("{}{}", ORIGIN, url);
        Ok(())
    }

    async fn focus(&self) -> Result<(), Error> {
        self.focused.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeScope {
    pub log: CallLog,
    pub windows: Mutex<Vec<Arc<FakeWindow>>>,
    pub shown: Mutex<Vec<(String, NotificationOptions)>>,
    pub opened: Mutex<Vec<String>>,
    pub show_fails: bool,
    pub match_all_fails: bool,
    pub queries: Mutex<Vec<ClientQuery>>,
}

impl FakeScope {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            windows: Mutex::new(Vec::new()),
            shown: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            show_fails: false,
            match_all_fails: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn open_page(&self, window: Arc<FakeWindow>) {
        self.windows.lock().unwrap().push(window);
    }

    pub fn shown(&self) -> Vec<(String, NotificationOptions)> {
        self.shown.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentScope for FakeScope {
    fn origin(&self) -> String {
        ORIGIN.to_string()
    }

    async fn skip_waiting(&self) -> Result<(), Error> {
        self.log.push("skip_waiting");
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.log.push("claim");
        Ok(())
    }

    async fn match_all(&self, query: ClientQuery) -> Result<Vec<Arc<dyn WindowClient>>, Error> {
        self.queries.lock().unwrap().push(query);
        if self.match_all_fails {
            return Err(anyhow!("InvalidStateError: clients unavailable"));
        }
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.clone() as Arc<dyn WindowClient>)
            .collect())
    }

    async fn open_window(&self, url: &str) -> Result<(), Error> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), Error> {
        if self.show_fails {
            return Err(anyhow!("TypeError: no notification permission"));
        }
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), options.clone()));
        Ok(())
    }
}

pub struct FakeNotification {
    pub data: Option<Value>,
    pub closed: AtomicBool,
}

impl FakeNotification {
    pub fn new(data: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            data,
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ActiveNotification for FakeNotification {
    fn data(&self) -> Option<Value> {
        self.data.clone()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// Session side

pub struct FakeSessionStore {
    pub log: CallLog,
    pub session: Mutex<Option<Session>>,
}

impl FakeSessionStore {
    pub fn new(log: CallLog, session: Option<Session>) -> Self {
        Self {
            log,
            session: Mutex::new(session),
        }
    }
}

impl SessionStore for FakeSessionStore {
    fn load(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.log.push("clear_session");
        *self.session.lock().unwrap() = None;
    }
}

pub struct FakeProbe {
    pub valid: Result<bool, String>,
    pub checked: AtomicUsize,
}

impl FakeProbe {
    pub fn new(valid: Result<bool, String>) -> Self {
        Self {
            valid,
            checked: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionProbe for FakeProbe {
    async fn session_is_valid(&self, _user_id: i64, _token: &str) -> Result<bool, Error> {
        self.checked.fetch_add(1, Ordering::SeqCst);
        self.valid.clone().map_err(|e| anyhow!(e))
    }
}
