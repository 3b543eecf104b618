use std::{
    any::Any,
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use passthrough_shared::{
    ClientEndpoint, ClientId, MessageKey, MessageKind, RetirementManager, RetirementTuple,
    ServerId, ServerTarget, WireMessage,
};

use crate::{
    entity::entity_container::{DispatchRequest, EntityDispatcher},
    error::PassthroughServerError,
    server::{
        client_record::{CachedReply, ClientRecord},
        server_config::ServerConfig,
    },
};

struct Inbound {
    origin: Arc<dyn ClientEndpoint>,
    raw: Vec<u8>,
}

// Everything the dispatch thread touches
struct ServerCore {
    id: ServerId,
    config: ServerConfig,
    dispatcher: Arc<dyn EntityDispatcher>,
    // Clients
    clients: Mutex<HashMap<ClientId, ClientRecord>>,
    // Retirement
    retirement: Mutex<RetirementManager<MessageKey, Arc<dyn ClientEndpoint>>>,
    // Lifecycle
    running: AtomicBool,
    halted: AtomicBool,
}

impl ServerCore {
    fn handle(&self, inbound: Inbound) {
        let Inbound { origin, raw } = inbound;
        let message = match WireMessage::from_bytes(&raw) {
            Ok(message) => message,
            Err(_) => {
                warn!("Server {:?} dropping undecodable message", self.id);
                return;
            }
        };
        if !message.kind.is_client_to_server() {
            warn!("Server {:?} received unexpected {:?}", self.id, message.kind);
            return;
        }

        let client = origin.client_id();
        let transaction_id = message.transaction_id;
        let key = MessageKey::new(client, transaction_id);
        debug!(
            "Server {:?} handling {:?} transaction {} from {:?}",
            self.id, message.kind, transaction_id, client
        );
        self.deliver(&origin, WireMessage::received(transaction_id));

        let mut deferred_until = None;
        let outcome = match message.kind {
            MessageKind::Connect => {
                info!("Server {:?} connecting client {:?}", self.id, client);
                self.clients.lock().insert(client, ClientRecord::new());
                self.dispatcher.connected(client);
                Ok(Vec::new())
            }
            MessageKind::Reconnect => {
                let known = {
                    let mut clients = self.clients.lock();
                    let known = clients.contains_key(&client);
                    clients.entry(client).or_default();
                    known
                };
                info!("Server {:?} reconnecting client {:?}", self.id, client);
                if !known {
                    self.dispatcher.connected(client);
                }
                Ok(Vec::new())
            }
            MessageKind::Disconnect => {
                info!("Server {:?} disconnecting client {:?}", self.id, client);
                self.clients.lock().remove(&client);
                self.dispatcher.disconnected(client);
                Ok(Vec::new())
            }
            _ => {
                let (outcome, deferral) = self.invoke(&origin, key, &message);
                deferred_until = deferral;
                outcome
            }
        };

        let reply = match &outcome {
            Ok(response) => WireMessage::completed(transaction_id, response.clone()),
            Err(failure) => WireMessage::failed(transaction_id, failure),
        };
        self.deliver(&origin, reply);
        self.retire(origin, key, deferred_until);
    }

    fn invoke(
        &self,
        origin: &Arc<dyn ClientEndpoint>,
        key: MessageKey,
        message: &WireMessage,
    ) -> (CachedReply, Option<MessageKey>) {
        {
            let mut clients = self.clients.lock();
            let record = clients.entry(key.client).or_insert_with(|| {
                warn!(
                    "Server {:?} invoked by unannounced client {:?}",
                    self.id, key.client
                );
                ClientRecord::new()
            });
            record.observe(key.transaction_id, message.oldest_transaction_id);
            if let Some(cached) = record.cached_reply(key.transaction_id) {
                debug!(
                    "Server {:?} replaying cached reply for transaction {}",
                    self.id, key.transaction_id
                );
                return (cached.clone(), None);
            }
        }

        let outcome = self.dispatcher.dispatch(DispatchRequest {
            client: key.client,
            transaction_id: key.transaction_id,
            oldest_transaction_id: message.oldest_transaction_id,
            payload: &message.payload,
        });

        for intermediate in outcome.intermediates {
            self.deliver(origin, WireMessage::monitor(key.transaction_id, intermediate));
        }
        if self.config.reply_cache {
            if let Some(record) = self.clients.lock().get_mut(&key.client) {
                record.cache_reply(key.transaction_id, outcome.result.clone());
            }
        }
        let deferral = outcome
            .deferred_until
            .filter(|blocker| self.must_wait_for(blocker, &key));
        (outcome.result, deferral)
    }

    // A blocker this server already handled can never resolve a deferral
    fn must_wait_for(&self, blocker: &MessageKey, current: &MessageKey) -> bool {
        if blocker == current {
            return false;
        }
        let handled = self
            .clients
            .lock()
            .get(&blocker.client)
            .is_some_and(|record| record.has_seen(blocker.transaction_id));
        if handled {
            debug!(
                "Server {:?} not deferring behind already handled {:?}",
                self.id, blocker
            );
        }
        !handled
    }

    fn retire(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        key: MessageKey,
        deferred_until: Option<MessageKey>,
    ) {
        let released = {
            let mut retirement = self.retirement.lock();
            if let Some(blocker) = deferred_until {
                retirement.defer_current_message(blocker);
            }
            let retired = WireMessage::retired(key.transaction_id).to_bytes();
            retirement.add_retirement_tuple(RetirementTuple::new(origin, retired));
            retirement.retireable_list_after_message_done(Some(&key))
        };
        for tuple in released {
            tuple.origin.deliver(self.id, tuple.response);
        }
    }

    fn deliver(&self, origin: &Arc<dyn ClientEndpoint>, message: WireMessage) {
        origin.deliver(self.id, message.to_bytes());
    }
}

/// One simulated server instance hosting a single active entity. Incoming
/// invocations are queued and served one at a time by a dedicated
/// dispatch thread, which answers with received / completed / retired
/// acknowledgments.
pub struct ServerProcess {
    core: Arc<ServerCore>,
    sender: Mutex<Option<flume::Sender<Inbound>>>,
    dispatch_thread: Mutex<Option<JoinHandle<()>>>,
}

impl ServerProcess {
    /// Spawn the dispatch thread and return the running server
    pub fn start(
        id: ServerId,
        config: ServerConfig,
        dispatcher: Arc<dyn EntityDispatcher>,
    ) -> Result<Arc<Self>, PassthroughServerError> {
        let (sender, receiver) = flume::unbounded::<Inbound>();
        let thread_name = config.dispatch_thread_name.clone();
        let core = Arc::new(ServerCore {
            id,
            config,
            dispatcher,
            clients: Mutex::new(HashMap::new()),
            retirement: Mutex::new(RetirementManager::new()),
            running: AtomicBool::new(true),
            halted: AtomicBool::new(false),
        });

        let thread_core = core.clone();
        let handle = thread::Builder::new().name(thread_name).spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                for inbound in receiver.iter() {
                    if thread_core.halted.load(Ordering::Acquire) {
                        break;
                    }
                    thread_core.handle(inbound);
                }
            }));
            thread_core.running.store(false, Ordering::Release);
            if let Err(payload) = result {
                error!(
                    "Server {:?} dispatch thread panicked: {}",
                    thread_core.id,
                    panic_message(payload.as_ref())
                );
                if thread_core.config.abort_on_dispatch_panic {
                    process::abort();
                }
            }
        })?;

        info!("Server {:?} started", id);
        Ok(Arc::new(Self {
            core,
            sender: Mutex::new(Some(sender)),
            dispatch_thread: Mutex::new(Some(handle)),
        }))
    }

    pub fn id(&self) -> ServerId {
        self.core.id
    }

    pub fn is_running(&self) -> bool {
        self.core.running.load(Ordering::Acquire)
    }

    pub fn client_count(&self) -> usize {
        self.core.clients.lock().len()
    }

    pub fn cached_reply_count(&self, client: ClientId) -> usize {
        self.core
            .clients
            .lock()
            .get(&client)
            .map_or(0, |record| record.cached_reply_count())
    }

    /// Copy entity state for every synchronized concurrency key, and the
    /// per-client records, onto `other`
    pub fn synchronize_to(&self, other: &ServerProcess) {
        info!("Synchronizing server {:?} to {:?}", self.id(), other.id());
        for key in self.core.dispatcher.synchronization_keys() {
            let payloads = self.core.dispatcher.synchronize_key(key);
            debug!("Synchronizing key {} ({} payloads)", key, payloads.len());
            other.core.dispatcher.load_synchronized(key, payloads);
        }
        if self.core.config.reply_cache && other.core.config.reply_cache {
            let clients = self.core.clients.lock().clone();
            other.core.clients.lock().extend(clients);
        }
    }

    /// Stop accepting messages, serve what is already queued, then stop
    pub fn shutdown(&self) {
        self.stop();
        info!("Server {:?} shut down", self.id());
    }

    /// Stop immediately. Queued messages are discarded without any
    /// acknowledgment, as if the process had died.
    pub fn crash(&self) {
        self.core.halted.store(true, Ordering::Release);
        self.stop();
        info!("Server {:?} crashed", self.id());
    }

    fn stop(&self) {
        self.sender.lock().take();
        let handle = self.dispatch_thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Server {:?} dispatch thread ended with a panic", self.id());
            }
        }
    }
}

impl ServerTarget for ServerProcess {
    fn server_id(&self) -> ServerId {
        self.core.id
    }

    fn send_message_to_server(&self, origin: Arc<dyn ClientEndpoint>, raw: Vec<u8>) {
        let sender = self.sender.lock();
        let delivered = sender
            .as_ref()
            .is_some_and(|sender| sender.send(Inbound { origin, raw }).is_ok());
        if !delivered {
            debug!("Server {:?} is stopped, dropping message", self.core.id);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
