use std::fs;
use std::path::Path;
use std::time::{ Duration, SystemTime };
use tokio::time;

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Resolves once the modification time of `path` moves past the one observed
/// when polling started. A file that disappears and reappears counts as a change.
pub async fn wait_for_change(path: &Path, poll: Duration) {
    let baseline = modified_at(path);
    let mut ticker = time::interval(poll);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let current = modified_at(path);
        let changed = match (baseline, current) {
            (Some(before), Some(now)) => now > before,
            (None, Some(_)) => true,
            _ => false,
        };
        if changed {
            return;
        }
    }
}
