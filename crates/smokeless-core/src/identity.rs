// User identity for this device
// Format: "smokeless-<uuid>"

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::IdentityError;

const USER_ID_FILE: &str = "user_id.txt";
const USER_ID_PREFIX: &str = "smokeless-";

/// Supplies the opaque, stable id all per-user data is keyed by.
pub trait IdentityProvider {
    /// Return the user id, creating one on first use. Safe to call every
    /// session start.
    fn ensure_identity(&self) -> Result<String, IdentityError>;
}

/// Anonymous identity persisted as a file in the data directory.
#[derive(Debug, Clone)]
pub struct FileIdentity {
    dir: PathBuf,
}

impl FileIdentity {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl IdentityProvider for FileIdentity {
    fn ensure_identity(&self) -> Result<String, IdentityError> {
        get_or_create_user_id_at(&self.dir)
    }
}

/// A fixed id, for tests and scripted sessions.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

impl IdentityProvider for StaticIdentity {
    fn ensure_identity(&self) -> Result<String, IdentityError> {
        Ok(self.0.clone())
    }
}

/// Get or create the user id stored under `path`.
///
/// # Arguments
/// * `path` - Directory where user_id.txt is stored
pub fn get_or_create_user_id_at(path: &Path) -> Result<String, IdentityError> {
    let id_path = path.join(USER_ID_FILE);

    if id_path.exists() {
        let content = fs::read_to_string(&id_path)?;
        let user_id = content.trim().to_string();

        if user_id.starts_with(USER_ID_PREFIX) {
            return Ok(user_id);
        }
        return Err(IdentityError::InvalidFormat(user_id));
    }

    let user_id = format!("{}{}", USER_ID_PREFIX, Uuid::new_v4());

    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let mut file = fs::File::create(&id_path)?;
    writeln!(file, "{}", user_id)?;
    tracing::info!(%user_id, "created new anonymous identity");

    Ok(user_id)
}
