//! Data-source collaborators that hand UserQuery a full directory snapshot.
//!
//! A source is called from a worker thread, so implementations may block.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::FetchError;
use crate::model::User;

const BUNDLED_USERS: &str = include_str!("../assets/users.json");

/// Latency the bundled source waits before answering.
pub const SIMULATED_DELAY: Duration = Duration::from_millis(800);

pub const SIMULATED_ERROR_MESSAGE: &str = "Failed to fetch users. Please try again.";

pub trait UserSource: Send + Sync {
    /// Return the full user collection or a failure carrying a readable message.
    fn fetch_users(&self) -> Result<Vec<User>, FetchError>;
}

impl<F> UserSource for F
where
    F: Fn() -> Result<Vec<User>, FetchError> + Send + Sync,
{
    fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
        self()
    }
}

/// Parse the directory shipped inside the binary.
pub fn bundled_users() -> Result<Vec<User>, FetchError> {
    serde_json::from_str(BUNDLED_USERS)
        .map_err(|e| FetchError::new(format!("bundled directory is malformed: {e}")))
}

/// The built-in directory, answered after a simulated delay.
#[derive(Debug)]
pub struct BundledSource {
    delay: Duration,
    simulate_error: AtomicBool,
}

impl BundledSource {
    pub fn new() -> Self {
        Self::with_delay(SIMULATED_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            simulate_error: AtomicBool::new(false),
        }
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_simulate_error(&self, value: bool) {
        self.simulate_error.store(value, Ordering::Relaxed);
    }

    pub fn simulate_error(&self) -> bool {
        self.simulate_error.load(Ordering::Relaxed)
    }
}

impl Default for BundledSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UserSource for BundledSource {
    fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.simulate_error() {
            tracing::debug!("bundled source rejecting fetch (error simulation on)");
            return Err(FetchError::new(SIMULATED_ERROR_MESSAGE));
        }
        bundled_users()
    }
}

/// Reads a JSON array of users from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UserSource for FileSource {
    fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
        let display = self.path.display();
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| FetchError::new(format!("failed to read {display}: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| FetchError::new(format!("failed to parse {display}: {e}")))
    }
}
