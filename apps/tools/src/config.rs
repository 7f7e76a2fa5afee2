use std::{collections::HashMap, fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Settings {
    /// JSON snapshot the CLI loads on start and writes back after mutating
    /// commands. Without it every run starts from an empty board.
    pub data_path: Option<PathBuf>,
    /// Default author for comments posted from the CLI.
    pub operator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: None,
            operator: "municipal-desk".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("board.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("data_path") {
                settings.data_path = Some(PathBuf::from(v));
            }
            if let Some(v) = file_cfg.get("operator") {
                settings.operator = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("BOARD_DATA_PATH") {
        settings.data_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("BOARD_OPERATOR") {
        settings.operator = v;
    }

    settings
}
