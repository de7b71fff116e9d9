use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlagFile {
    completed: bool,
    user_id: String,
}

/// Local record of which user finished onboarding, kept in a small JSON
/// file. Advisory only: the preferences document stays authoritative.
#[derive(Debug)]
pub struct OnboardingFlags {
    path: PathBuf,
    state: Mutex<FlagFile>,
}

impl OnboardingFlags {
    /// A missing or unreadable file starts out empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(txt) => serde_json::from_str(&txt).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring malformed onboarding flags");
                FlagFile::default()
            }),
            Err(_) => FlagFile::default(),
        };
        Self { path, state: Mutex::new(state) }
    }

    pub fn is_complete(&self, user_id: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let done = state.completed && state.user_id == user_id;
        debug!(
            user_id = %user_id,
            cached_for = %state.user_id,
            done = done,
            "onboarding flag check"
        );
        done
    }

    pub fn mark(&self, user_id: &str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = FlagFile { completed: true, user_id: user_id.to_string() };
        write_file(&self.path, &state)
    }

    pub fn clear(&self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = FlagFile::default();
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

fn write_file(path: &Path, state: &FlagFile) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let txt = serde_json::to_string(state).map_err(io::Error::other)?;
    fs::write(path, txt)
}
