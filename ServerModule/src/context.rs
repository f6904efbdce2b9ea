//! # Protocol Context
//!
//! Everything the synchronization protocol keeps per session: the id
//! generator, the preserved-state store, the operation buffer, the remote
//! object registry and the request counter. One context belongs to exactly
//! one session and is never shared.
//!
//! A render cycle ends only with a successful flush. An aborted cycle is
//! resumed by the next [`begin_cycle`](ProtocolContext::begin_cycle), which
//! keeps the baseline captured by the first attempt.

use log::{debug, warn};
use rwt_shared::{constants, Message, MessageHead, ObjectId, Properties};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::identity::IdGenerator;
use crate::preserve::PreservedValues;
use crate::protocol::ProtocolWriter;
use crate::remote::{OperationHandler, Phase, RemoteObject, RemoteObjects};

pub struct ProtocolContext<T: ?Sized> {
    config: SyncConfig,
    ids: IdGenerator,
    preserved: PreservedValues,
    writer: ProtocolWriter,
    objects: RemoteObjects<T>,
    request_counter: u64,
    resuming: bool,
}

impl<T: ?Sized> ProtocolContext<T> {
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            ids: IdGenerator::new(&config),
            config,
            preserved: PreservedValues::new(),
            writer: ProtocolWriter::new(),
            objects: RemoteObjects::new(),
            request_counter: 0,
            resuming: false,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Counter the next inbound message must carry
    pub fn request_counter(&self) -> u64 {
        self.request_counter
    }

    /// True while a previously aborted cycle waits to be resumed
    pub fn is_resuming(&self) -> bool {
        self.resuming
    }

    pub fn new_id(&mut self, prefix: &str) -> ObjectId {
        self.ids.new_id(prefix)
    }

    /// Issue an id and register it for an object of `type_name`
    pub fn register(&mut self, prefix: &str, type_name: &str, parent: Option<&ObjectId>) -> SyncResult<ObjectId> {
        let id = self.ids.new_id(prefix);
        self.objects.register(&id, type_name, parent)?;
        Ok(id)
    }

    /// Register a remote object that is not backed by a widget and append its
    /// Create
    pub fn create_remote_object(&mut self, type_name: &str, parent: Option<&ObjectId>) -> SyncResult<ObjectId> {
        if let Some(parent) = parent {
            if !self.objects.is_live(parent) {
                return Err(SyncError::UnknownObject(parent.clone()));
            }
        }
        let id = self.register(constants::ids::REMOTE_OBJECT_PREFIX, type_name, parent)?;
        self.remote_object(&id)?.create(Properties::new())?;
        debug!("Created remote object {} ({})", id, type_name);
        Ok(id)
    }

    /// Handle of a registered object, bound to the current buffer
    pub fn remote_object(&mut self, id: &ObjectId) -> SyncResult<RemoteObject<'_, T>> {
        self.objects.object(id, &mut self.writer)
    }

    /// Install the inbound handler of `id`
    pub fn set_handler(&mut self, id: &ObjectId, handler: Box<dyn OperationHandler<T>>) -> SyncResult<()> {
        self.remote_object(id)?.set_handler(handler)
    }

    /// Created, and the Create is no longer waiting in the buffer
    pub fn is_initialized(&self, id: &ObjectId) -> bool {
        self.objects.phase(id) == Some(Phase::Created) && !self.writer.has_pending_create(id)
    }

    pub fn objects(&self) -> &RemoteObjects<T> {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut RemoteObjects<T> {
        &mut self.objects
    }

    pub fn preserved(&self) -> &PreservedValues {
        &self.preserved
    }

    pub fn preserved_mut(&mut self) -> &mut PreservedValues {
        &mut self.preserved
    }

    pub fn writer(&self) -> &ProtocolWriter {
        &self.writer
    }

    /// Start (or resume) a render cycle
    pub fn begin_cycle(&mut self) {
        if self.resuming {
            debug!("Resuming aborted cycle {}", self.request_counter);
        } else {
            debug!("Beginning cycle {}", self.request_counter);
            self.preserved.clear_all();
        }
        self.writer.discard();
    }

    /// Check the counter of an inbound message
    pub fn check_request_counter(&self, actual: u64) -> SyncResult<()> {
        if self.config.validate_request_counter && actual != self.request_counter {
            warn!(
                "Rejecting request with counter {}, expected {}",
                actual, self.request_counter
            );
            return Err(SyncError::RequestCounter {
                expected: self.request_counter,
                actual,
            });
        }
        Ok(())
    }

    /// Take the buffer as the outbound message of this cycle
    ///
    /// The head carries the counter the client has to echo next. The cycle is
    /// not finished until [`commit`](Self::commit) is called.
    pub fn flush(&mut self) -> SyncResult<Message> {
        let head = MessageHead {
            request_counter: self.request_counter + 1,
        };
        let message = self.writer.take_message(head);
        if self.config.verify_message_order {
            message.verify_ordering()?;
        }
        Ok(message)
    }

    /// Finish the cycle after a successful flush
    pub fn commit(&mut self) {
        self.objects.commit();
        self.request_counter += 1;
        self.resuming = false;
        debug!("Committed cycle, next request counter {}", self.request_counter);
    }

    /// Abandon the cycle: discard the buffer and roll back handle states
    pub fn abort(&mut self) {
        self.writer.discard();
        self.objects.abort();
        self.resuming = true;
        debug!("Aborted cycle {}", self.request_counter);
    }
}
