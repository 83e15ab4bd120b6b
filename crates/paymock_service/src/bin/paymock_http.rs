#![forbid(unsafe_code)]

use std::time::Duration;

use paymock_service::telemetry::init_tracing;
use paymock_service::{LifecycleState, MockConfig, MockServer};
use tracing::info;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = MockConfig::from_env()?;
    let server = MockServer::start(config)?;

    println!("paymock_http listening on {}", server.base_url());
    for (key, value) in server.environment() {
        println!("export {key}={value}");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(STOP_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupt received");
                break;
            }
            _ = ticker.tick() => {
                if server.state() == LifecycleState::Stopped {
                    break;
                }
            }
        }
    }

    tokio::task::spawn_blocking(move || {
        let mut server = server;
        server.stop()
    })
    .await??;
    Ok(())
}
