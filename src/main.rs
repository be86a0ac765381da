// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::process::ExitCode;

use fintrack::commands::{self, App};
use fintrack::config::Config;
use fintrack::error::FinanceError;
use fintrack::{cli, db, logging};

fn run() -> Result<()> {
    let config = Config::from_env()?;
    logging::init(config.log_json);
    if config.auth.uses_dev_secret() {
        tracing::warn!("FINTRACK_JWT_SECRET is not set; using the development secret");
    }

    let matches = cli::build_cli().get_matches();
    let mut conn = db::open_or_init(&config.db_path)?;
    let app = App::new(config)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", app.config.db_path.display());
        }
        Some(("user", sub)) => commands::users::handle(&app, &mut conn, sub)?,
        Some(("currency", sub)) => commands::currencies::handle(&conn, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&app, &mut conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&app, &conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&app, &mut conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&app, &conn, sub)?,
        Some(("fx", sub)) => commands::fx::handle(&app, &conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&app, &conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<FinanceError>()
                .map(|e| e.kind().exit_code())
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
