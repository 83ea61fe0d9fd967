use actix_web::{rt, web};
use log::{info, warn};
use std::time::Duration;

use super::session::SessionManager;

/// Starts a background task that deletes expired sessions every `period`.
///
/// Must be called from within the actix system. Expired tokens are still rejected and
/// deleted on use whether or not the sweeper runs.
pub fn spawn_expiry_sweeper(sessions: web::Data<SessionManager>, period: Duration) {
    info!("Sweeping expired sessions every {}s", period.as_secs());
    rt::spawn(async move {
        let mut ticker = rt::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = sessions.sweep_expired().await {
                warn!("Session sweep failed: {}", e);
            }
        }
    });
}
