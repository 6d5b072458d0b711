use std::env;
use std::fs::File;
use std::io::{self, BufReader, Cursor, IsTerminal};
use std::process;

use log::{debug, warn};
use minishell::shell::readline::{LineSource, ReadlineManager, ReaderSource};
use minishell::shell::Shell;
use minishell::utils::config::Config;
use minishell::utils::error::{io_error_text, report_message, EXIT_NOT_FOUND};
use minishell::utils::log::init_logger;

const EXIT_USAGE: i32 = 2;

fn input_source(config: &Config) -> (Box<dyn LineSource>, bool) {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("-c") => match args.next() {
            Some(line) => (Box::new(ReaderSource::new(Cursor::new(line))), false),
            None => {
                report_message("-c: option requires an argument");
                process::exit(EXIT_USAGE);
            }
        },
        Some(path) => match File::open(path) {
            Ok(file) => (Box::new(ReaderSource::new(BufReader::new(file))), false),
            Err(err) => {
                report_message(format!("{}: {}", path, io_error_text(&err)));
                process::exit(EXIT_NOT_FOUND);
            }
        },
        None if io::stdin().is_terminal() => match ReadlineManager::new(config) {
            Ok(readline) => (Box::new(readline), true),
            Err(err) => {
                warn!("初始化行编辑器失败，改用标准输入: {}", err);
                (Box::new(ReaderSource::new(io::stdin().lock())), false)
            }
        },
        None => (Box::new(ReaderSource::new(io::stdin().lock())), false),
    }
}

fn main() {
    let config = Config::new();
    if let Err(err) = init_logger(&config) {
        report_message(format!(
            "warning: cannot open log in {}: {}",
            config.logger_dir.display(),
            err
        ));
    }
    debug!("配置加载成功，历史文件 {}", config.history_file.display());

    let (input, interactive) = input_source(&config);
    let mut shell = Shell::new(&config, input, interactive);
    let status = shell.run();
    process::exit(status);
}
