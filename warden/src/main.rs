// This file is part of the product Warden.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{LevelFilter, info};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use warden::app_state::AppState;
use warden::config::{Config, ValidatedConfig};
use warden::iam::PermissionEnforcer;
use warden::login::GithubProvider;
use warden::routes;
use warden::store::FileStore;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the directory holding config.yaml.");
            return 1;
        }
    };

    if parsed_args.help {
        print!("{}", help_text());
        return 0;
    }

    let validated_config = match Config::load_and_validate(&parsed_args.runtime_root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    init_logging(&validated_config.logging.level);

    match System::new().block_on(run_server(validated_config)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(validated_config: ValidatedConfig) -> std::io::Result<()> {
    log_startup_info(&validated_config);

    let store = FileStore::open(validated_config.data_file.clone()).map_err(|error| {
        eprintln!("❌ Failed to open data file: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    let provider = GithubProvider::new(validated_config.oauth.clone()).map_err(|error| {
        eprintln!("❌ Failed to initialize GitHub client: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    let workers = validated_config.server.workers;
    let host = validated_config.server.host.clone();
    let port = validated_config.server.port;

    let app_state = AppState::new(validated_config, Arc::new(store), Arc::new(provider))
        .map_err(|error| {
            eprintln!("❌ Failed to build route table: {}", error);
            std::io::Error::other(error.to_string())
        })?;
    for route in app_state.registry.routes() {
        log::debug!(
            "Route {} {} [{}{}] {}",
            route.method,
            route.pattern,
            route.permissions,
            if route.self_access { ", self" } else { "" },
            route.description
        );
    }
    info!("✅ {} routes registered", app_state.registry.len());

    let app_state = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(PermissionEnforcer)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(routes::configure)
    })
    .workers(workers)
    .bind((host.as_str(), port))?
    .run()
    .await
}

fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn log_startup_info(config: &ValidatedConfig) {
    info!("Starting Warden {}", env!("CARGO_PKG_VERSION"));
    info!("Workers: {}", config.server.workers);
    info!(
        "Listening on {}:{}",
        config.server.host, config.server.port
    );
    info!("Data file: {}", config.data_file.display());
    info!(
        "GitHub login: client {} redirecting to {}",
        config.oauth.client_id, config.oauth.redirect_url
    );
}

struct ParsedArgs {
    runtime_root: PathBuf,
    help: bool,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut help = false;

    while let Some(arg) = args.next() {
        if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else if arg == "-h" || arg == "--help" {
            help = true;
        } else {
            return Err(format!("Unexpected argument '{}'", arg));
        }
    }

    Ok(ParsedArgs {
        runtime_root: make_runtime_root_absolute(runtime_root)?,
        help,
    })
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

fn help_text() -> &'static str {
    "Usage: warden [-C <root>]\n\
     \n\
     Serves the user management API using <root>/config.yaml.\n\
     The GitHub OAuth client secret is read from GITHUB_SECRET.\n"
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_current_directory() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert!(!parsed.help);
        assert!(parsed.runtime_root.is_absolute());
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "/srv/warden"])).expect("parse args");
        assert_eq!(parsed.runtime_root, std::path::PathBuf::from("/srv/warden"));
    }

    #[test]
    fn parse_args_rejects_missing_root_value() {
        assert!(parse_args_from(args(&["-C"])).is_err());
    }

    #[test]
    fn parse_args_rejects_unknown_flags() {
        assert!(parse_args_from(args(&["--daemon"])).is_err());
    }
}
