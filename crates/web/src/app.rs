use convodeck_core::{
    DeckStore, IdRng, KeyValueStorage, OrderNotifier, OrderRepository, PaymentGateway,
    StoreConfig,
};
use time::OffsetDateTime;

pub type Clock = Box<dyn Fn() -> OffsetDateTime>;

/// Everything one server instance shares between requests.
pub struct AppState {
    pub store: StoreConfig,
    pub deck: DeckStore<Box<dyn KeyValueStorage>>,
    pub orders: Box<dyn OrderRepository>,
    pub gateway: Option<Box<dyn PaymentGateway>>,
    pub notifier: Box<dyn OrderNotifier>,
    pub rng: IdRng,
    /// Public origin used to build payment callback links.
    pub public_url: String,
    pub clock: Clock,
}

impl AppState {
    pub fn new(
        store: StoreConfig,
        storage: Box<dyn KeyValueStorage>,
        orders: Box<dyn OrderRepository>,
        notifier: Box<dyn OrderNotifier>,
    ) -> Self {
        Self {
            store,
            deck: DeckStore::new(storage),
            orders,
            gateway: None,
            notifier,
            rng: IdRng::from_entropy(),
            public_url: "http://localhost:7878".to_string(),
            clock: Box::new(OffsetDateTime::now_utc),
        }
    }

    pub fn with_gateway(mut self, gateway: Box<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into();
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: IdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }
}
