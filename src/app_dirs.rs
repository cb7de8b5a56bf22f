use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "mathmania";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/mathmania`, falling back to the platform data-local dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("scores.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("mathmania.log"))
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("mathmania_config.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_files_share_a_directory() {
        if let (Some(db), Some(log)) = (AppDirs::db_path(), AppDirs::log_path()) {
            assert_eq!(db.parent(), log.parent());
            assert!(db.ends_with("scores.db"));
            assert!(log.ends_with("mathmania.log"));
        }
    }

    #[test]
    fn test_config_path_is_json() {
        let path = AppDirs::config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    }
}
