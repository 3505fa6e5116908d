//! Explicit session context.
//!
//! Owns the transport, validator, state manager, event bus and notifier for
//! one connection to a compose server. Nothing is global: two sessions can
//! talk to two servers side by side.

use abr_bus::{EventFilter, EventStream, InMemoryEventBus, Subscription};
use std::sync::Arc;
use tracing::info;

use crate::adapters::http::HttpTransport;
use crate::domain::config::ClientConfig;
use crate::domain::error::{ClientError, ClientResult};
use crate::notifier::Notifier;
use crate::ports::inbound::InvalidationHandler;
use crate::ports::outbound::{StateTransport, SystemTimeSource, TimeSource};
use crate::state::{RefreshOutcome, ServerLibrary, StateManager, ThumbnailPoller};
use crate::validator::SchemaValidator;

pub struct Session {
    config: ClientConfig,
    bus: Arc<InMemoryEventBus>,
    validator: Arc<SchemaValidator>,
    state: Arc<StateManager>,
    library: ServerLibrary,
    notifier: Notifier,
}

impl Session {
    /// Session over HTTP, with the schema taken from the configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config.server)?);
        let validator = SchemaValidator::new(config.schema_url(), transport.clone());
        Self::assemble(config, transport, validator, Arc::new(SystemTimeSource))
    }

    /// Session over any transport (tests, proxies).
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn StateTransport>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let validator = SchemaValidator::new(config.schema_url(), transport.clone());
        Self::assemble(config, transport, validator, Arc::new(SystemTimeSource))
    }

    /// Session with a caller-supplied validator, e.g. one built from a local
    /// schema file.
    pub fn with_validator(
        config: ClientConfig,
        transport: Arc<dyn StateTransport>,
        validator: SchemaValidator,
    ) -> ClientResult<Self> {
        config.validate()?;
        Self::assemble(config, transport, validator, Arc::new(SystemTimeSource))
    }

    fn assemble(
        config: ClientConfig,
        transport: Arc<dyn StateTransport>,
        validator: SchemaValidator,
        clock: Arc<dyn TimeSource>,
    ) -> ClientResult<Self> {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus.capacity));
        let validator = Arc::new(validator);

        let thumbnails = Arc::new(ThumbnailPoller::new(
            transport.clone(),
            bus.clone(),
            clock,
            config.thumbnail.clone(),
        ));
        let state = Arc::new(StateManager::new(
            transport.clone(),
            validator.clone(),
            bus.clone(),
            thumbnails,
            config.refresh.ordering,
        ));
        let library = ServerLibrary::new(transport);
        let notifier = Notifier::new(config.ws_url()?, &config.notifier, bus.clone());

        Ok(Self {
            config,
            bus,
            validator,
            state,
            library,
            notifier,
        })
    }

    /// Open the push channel, wait until it is ready, then load the state.
    pub async fn connect(&self) -> ClientResult<RefreshOutcome> {
        let handler: Arc<dyn InvalidationHandler> = self.state.clone();
        self.notifier.start(handler);

        tokio::time::timeout(self.config.notifier.ready_timeout, self.notifier.ready())
            .await
            .map_err(|_| {
                ClientError::WebSocket(format!(
                    "push channel not ready after {:?}",
                    self.config.notifier.ready_timeout
                ))
            })??;

        let outcome = self.state.refresh_state().await?;
        info!(server = %self.config.server.base_url, "Session connected");
        Ok(outcome)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state
    }

    pub fn library(&self) -> &ServerLibrary {
        &self.library
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn validator(&self) -> &Arc<SchemaValidator> {
        &self.validator
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.bus.event_stream(filter)
    }

    /// Close the push channel and stop background polling.
    pub async fn shutdown(&self) {
        self.notifier.shutdown().await;
        self.state.stop_background();
        info!("Session shut down");
    }
}
