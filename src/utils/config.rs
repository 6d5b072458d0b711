use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub log_to_stderr: bool,
}

impl Config {
    fn get_history_file() -> PathBuf {
        match env::var("HOME") {
            Ok(home) if !home.is_empty() => PathBuf::from(home).join(".minishell_history"),
            _ => PathBuf::from(".minishell_history"),
        }
    }

    fn get_logger_dir() -> PathBuf {
        match env::var("HOME") {
            Ok(home) if !home.is_empty() => PathBuf::from(home).join(".cache/minishell"),
            _ => PathBuf::from("/tmp/minishell"),
        }
    }

    fn defaults() -> Self {
        Config {
            name: String::from("minishell"),
            theme: String::from("default"),
            history_file: Self::get_history_file(),
            editor_mode: String::from("emacs"),
            logger_level: String::from("warn"),
            logger_dir: Self::get_logger_dir(),
            log_to_stderr: false,
        }
    }

    pub fn new() -> Self {
        // 优先加载 .env 文件
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::defaults();

        if let Ok(theme) = env::var("MINISHELL_THEME") {
            config.theme = theme;
        }

        if let Ok(editor) = env::var("MINISHELL_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(history) = env::var("MINISHELL_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Ok(level) = env::var("MINISHELL_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("MINISHELL_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        config.log_to_stderr = env::var_os("MINISHELL_LOG_STDERR").is_some();

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::defaults()
    }
}
