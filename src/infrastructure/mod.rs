pub mod chrome_session;
pub mod js_executor;
pub mod network_monitor;
pub mod session;

pub use chrome_session::{ChromeSession, ChromeSessionProvider};
pub use js_executor::JsExecutor;
pub use network_monitor::NetworkMonitor;
pub use session::{ObservedResponse, ResponseStream, Session, SessionProvider};
