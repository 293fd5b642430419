use scale_common::db::{self, DbThreadPool};
use scale_common::token::auth_token::AuthToken;

use actix_web::web::Data;
use actix_web::{App, HttpServer};
use flexi_logger::{Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode};

mod env;
mod handlers;
mod middleware;
mod services;

use crate::middleware::auth::AuthGate;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let mut port = 9000u16;
    let mut token_identity: Option<String> = None;

    let mut args = std::env::args();

    // Eat the first argument, which is the relative path to the executable
    args.next();

    while let Some(arg) = args.next() {
        match arg.to_lowercase().as_str() {
            "--port" => {
                let port_str = match args.next() {
                    Some(s) => s,
                    None => {
                        eprintln!("ERROR: --port option specified but no port was given");
                        std::process::exit(1);
                    }
                };

                port = match port_str.parse::<u16>() {
                    Ok(p) => p,
                    Err(_) => {
                        eprintln!("ERROR: Incorrect format for port. Integer expected");
                        std::process::exit(1);
                    }
                };

                continue;
            }
            "--issue-token" => {
                token_identity = match args.next() {
                    Some(i) if !i.is_empty() => Some(i),
                    _ => {
                        eprintln!("ERROR: --issue-token option specified but no identity was given");
                        std::process::exit(1);
                    }
                };

                continue;
            }
            a => {
                eprintln!("ERROR: Invalid argument: {}", &a);
                std::process::exit(1);
            }
        }
    }

    let conf = match env::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    if let Some(identity) = token_identity {
        println!(
            "{}",
            AuthToken::issue(
                &identity,
                conf.auth_token_lifetime,
                &conf.token_signing_key
            )
        );
        return Ok(());
    }

    let base_addr = format!("127.0.0.1:{}", &port);

    let logger = match Logger::try_with_str(&conf.log_level) {
        Ok(l) => l,
        Err(_) => {
            eprintln!("ERROR: Invalid log level '{}'", &conf.log_level);
            std::process::exit(1);
        }
    };

    let _logger = logger
        .log_to_file(FileSpec::default().directory("./logs"))
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogAndCompressedFiles(60, 365),
        )
        .cleanup_in_background_thread(true)
        .duplicate_to_stdout(Duplicate::All)
        .write_mode(WriteMode::Async)
        .format(|writer, now, record| {
            write!(
                writer,
                "{:5} | {} | {}:{} | {}",
                record.level(),
                now.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
                record.module_path().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .use_utc()
        .start()
        .expect("Failed to start logger");

    let actix_workers = conf.actix_worker_count;

    // To prevent resource starvation, max connections must be at least as large as the number of
    // actix workers
    let db_max_connections = conf.db_max_connections.max(actix_workers as u32);

    log::info!("Connecting to database...");

    let db_thread_pool: DbThreadPool = match db::create_db_thread_pool(
        &conf.database_uri(),
        db_max_connections,
        conf.db_idle_timeout,
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR: Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    log::info!("Successfully connected to database");

    let auth_gate = AuthGate::new(&conf.auth_cookie_name, &conf.token_signing_key);
    let max_body_bytes = conf.max_body_bytes;

    // Nothing past this point needs the secrets
    drop(conf);

    HttpServer::new(move || {
        let auth_gate = auth_gate.clone();

        App::new()
            .app_data(Data::new(db_thread_pool.clone()))
            .configure(|cfg| {
                services::api::configure::<DbThreadPool>(cfg, auth_gate, max_body_bytes)
            })
            .wrap(actix_web::middleware::Logger::default())
    })
    .workers(actix_workers)
    .bind(base_addr)?
    .run()
    .await?;

    Ok(())
}
