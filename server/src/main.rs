use std::process::ExitCode;

use clap::Parser;
use concurrent_runtime::ConcurrentRuntime;
use http_server::HttpServer;

mod config;
use config::{Cli, Config};

fn main() -> ExitCode {
    let cli = Cli::parse();

    logger::set_logger_target(Box::new(logger::ConsoleLogTarget));

    let mut cfg = Config::load(&cli.config);
    cfg.apply_cli(&cli);

    logger::set_logger_level(cfg.log_level);
    logger::set_logger_target(cfg.build_log_target());
    logger::set_logger_cache_capacity(cfg.capacity);

    let mut runtime = ConcurrentRuntime::new(cfg.pool_size);
    runtime.start();

    let result = HttpServer::bind(&cfg.address(), &runtime, cfg.session_settings())
        .and_then(|server| server.run());

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger::error!("Server stopped: {}", err);
            ExitCode::FAILURE
        }
    };

    logger::terminate();
    code
}
