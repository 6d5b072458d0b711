use colored::Colorize;

pub struct Theme {
    pub prompt: String,
    pub continuation_prompt: String,
    pub heredoc_prompt: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: format!("{} ", "minishell$".bright_cyan().bold()),
            continuation_prompt: format!("{} ", ">".bright_black()),
            heredoc_prompt: format!("{} ", ">".bright_black()),
        }
    }
}

impl Theme {
    pub fn plain() -> Self {
        Theme {
            prompt: String::from("minishell$ "),
            continuation_prompt: String::from("> "),
            heredoc_prompt: String::from("> "),
        }
    }
}

pub fn load_theme(theme_name: &str) -> Theme {
    match theme_name {
        "plain" => Theme::plain(),
        _ => Theme::default(),
    }
}
