use game_notifier_api::Application;
use game_notifier_infra::{ISys, InMemoryEventBus, InMemoryMessagingClient, NotifyContext};
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

/// Clock that only moves when told to
pub struct ManualSys(AtomicI64);

impl ManualSys {
    pub fn new(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl ISys for ManualSys {
    fn get_timestamp_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct TestContext {
    pub ctx: NotifyContext,
    pub sys: Arc<ManualSys>,
    pub messaging: Arc<InMemoryMessagingClient>,
    pub event_bus: Arc<InMemoryEventBus>,
}

pub fn setup_context(now: i64) -> TestContext {
    let mut ctx = NotifyContext::create_inmemory();
    let sys = Arc::new(ManualSys::new(now));
    let messaging = Arc::new(InMemoryMessagingClient::new());
    let event_bus = Arc::new(InMemoryEventBus::new(sys.clone()));
    ctx.sys = sys.clone();
    ctx.messaging = messaging.clone();
    ctx.event_bus = event_bus.clone();

    TestContext {
        ctx,
        sys,
        messaging,
        event_bus,
    }
}

// Launch the application as a background task
pub async fn spawn_app() -> String {
    let mut ctx = NotifyContext::create_inmemory();
    ctx.config.port = 0; // Random port

    let application = Application::new(ctx)
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    address
}
