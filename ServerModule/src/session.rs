//! # UI Sessions
//!
//! A [`UiSession`] owns one widget tree and the protocol context that mirrors
//! it. Each inbound message runs one render cycle:
//!
//! 1. check the request counter
//! 2. apply inbound sets, then notifications and calls
//! 3. render disposals, creations and changes
//! 4. flush the buffer into the outbound message
//!
//! A successful flush commits the cycle and immediately captures the
//! baseline of the next one, so application changes made between requests
//! are diffed like changes made by listeners. A failed cycle is aborted and
//! resumed by the next request with the same counter.
//!
//! [`SessionStore`] keeps sessions apart; each session sits behind its own
//! mutex, so requests of one session run one at a time while different
//! sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rwt_shared::{ClientMessage, Message, ObjectId};

use crate::config::SyncConfig;
use crate::dispatch::dispatch_message;
use crate::error::{SyncError, SyncResult};
use crate::lifecycle::{self, WidgetContext};
use crate::widgets::{WidgetKey, WidgetTree};

/// Length of the random part of a session id
const SESSION_ID_LEN: usize = 16;

pub struct UiSession {
    id: String,
    protocol: WidgetContext,
    widgets: WidgetTree,
}

impl UiSession {
    pub fn new(id: impl Into<String>, config: SyncConfig) -> SyncResult<Self> {
        let mut session = Self {
            id: id.into(),
            protocol: WidgetContext::new(config)?,
            widgets: WidgetTree::new(),
        };
        session.start_cycle();
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn widgets(&self) -> &WidgetTree {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetTree {
        &mut self.widgets
    }

    pub fn protocol(&self) -> &WidgetContext {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut WidgetContext {
        &mut self.protocol
    }

    /// Id of a live widget, assigned now if it has none yet
    pub fn widget_id(&mut self, key: WidgetKey) -> SyncResult<ObjectId> {
        lifecycle::ensure_id(&mut self.widgets, key, &mut self.protocol)
    }

    /// Counter the next inbound message has to carry
    pub fn request_counter(&self) -> u64 {
        self.protocol.request_counter()
    }

    /// Run one render cycle for `message` and return the outbound message
    ///
    /// Once the outbound message is flushed the cycle is committed and the
    /// call succeeds; nothing after the commit can turn it into an error.
    pub fn process_message(&mut self, message: &ClientMessage) -> SyncResult<Message> {
        if let Err(err) = self.protocol.check_request_counter(message.head.request_counter) {
            self.log_failure(&err);
            return Err(err);
        }
        match self.run_cycle(message) {
            Ok(outbound) => {
                self.protocol.commit();
                self.widgets.purge_disposed();
                self.start_cycle();
                debug!(
                    "Session {} flushed {} operations",
                    self.id,
                    outbound.len()
                );
                Ok(outbound)
            }
            Err(err) => {
                self.log_failure(&err);
                self.protocol.abort();
                Err(err)
            }
        }
    }

    /// Render pending server-side changes without inbound data
    pub fn render(&mut self) -> SyncResult<Message> {
        let message = ClientMessage::new(self.protocol.request_counter());
        self.process_message(&message)
    }

    /// Decode, process and encode one JSON exchange
    pub fn process_json(&mut self, text: &str) -> SyncResult<String> {
        let message = ClientMessage::from_json_str(text)?;
        Ok(self.process_message(&message)?.to_json_string()?)
    }

    fn run_cycle(&mut self, message: &ClientMessage) -> SyncResult<Message> {
        if self.protocol.is_resuming() {
            self.protocol.begin_cycle();
            lifecycle::preserve_widgets(&mut self.widgets, &mut self.protocol)?;
        }
        dispatch_message(self.protocol.objects_mut(), &mut self.widgets, message)?;
        lifecycle::render_widgets(&mut self.widgets, &mut self.protocol)?;
        self.protocol.flush()
    }

    /// Capture the baseline of the next cycle
    ///
    /// A widget left without a baseline is rendered in full next time.
    fn start_cycle(&mut self) {
        self.protocol.begin_cycle();
        if let Err(err) = lifecycle::preserve_widgets(&mut self.widgets, &mut self.protocol) {
            warn!("Session {} kept a partial baseline: {}", self.id, err);
        }
    }

    fn log_failure(&self, err: &SyncError) {
        if err.is_usage_error() {
            warn!("Session {} rejected request: {}", self.id, err);
        } else {
            debug!("Session {} aborted cycle: {}", self.id, err);
        }
    }
}

/// Registry of the live sessions of a process
pub struct SessionStore {
    config: SyncConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<UiSession>>>>,
}

impl SessionStore {
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Open a new session under a fresh random id
    pub fn create_session(&self) -> SyncResult<String> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SyncError::IllegalState("session store lock poisoned".to_string()))?;
        let id = loop {
            let candidate: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(SESSION_ID_LEN)
                .map(char::from)
                .collect();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let session = UiSession::new(id.clone(), self.config.clone())?;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        info!("Opened session {}", id);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<UiSession>>> {
        self.sessions
            .read()
            .ok()
            .and_then(|sessions| sessions.get(id).cloned())
    }

    /// Run `f` with exclusive access to one session
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut UiSession) -> R) -> SyncResult<R> {
        let session = self
            .get(id)
            .ok_or_else(|| SyncError::IllegalState(format!("no session {}", id)))?;
        let mut guard: MutexGuard<'_, UiSession> = session
            .lock()
            .map_err(|_| SyncError::IllegalState(format!("session {} lock poisoned", id)))?;
        Ok(f(&mut guard))
    }

    /// Process one inbound message for session `id`
    pub fn process_message(&self, id: &str, message: &ClientMessage) -> SyncResult<Message> {
        self.with_session(id, |session| session.process_message(message))?
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .map(|mut sessions| sessions.remove(id).is_some())
            .unwrap_or(false);
        if removed {
            info!("Closed session {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
