// SAFETY: This is an interactive CLI tool where expect()/unwrap() on I/O is acceptable
// for user prompts - failures should terminate the tool. println!/eprintln! are the
// correct output mechanism for CLI tools (not tracing).
#![allow(clippy::expect_used, clippy::unwrap_used)]
#![allow(clippy::print_stdout, clippy::print_stderr)]

//! Auth Manager CLI - Issue Session
//!
//! Interactive command that prints a signed session cookie for the admin
//! pages, for setups where no login service issues one.
//! Usage: cargo run --bin issue_session

use std::io::{self, Write};
use std::process::ExitCode;

use authmgr_web::config::Config;
use authmgr_web::controllers::groups::MANAGE_GROUPS;
use authmgr_web::services::session::{SESSION_COOKIE_NAME, SessionClaims, encode_session};

fn prompt(label: &str) -> String {
    print!("{}", label);
    io::stdout().flush().unwrap();
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .expect("Failed to read input");
    input.trim().to_string()
}

fn main() -> ExitCode {
    println!("\nAuth Manager - Issue Session");
    println!("============================\n");

    // Load configuration from TOML files
    let config = Config::load().expect("Failed to load configuration from config/*.toml");

    let username = prompt("Username: ");
    if username.is_empty() {
        eprintln!("Username cannot be empty");
        return ExitCode::FAILURE;
    }

    let permissions = prompt(&format!(
        "Permissions, comma separated [{}]: ",
        MANAGE_GROUPS
    ));
    let permissions: Vec<String> = if permissions.is_empty() {
        vec![MANAGE_GROUPS.to_string()]
    } else {
        permissions
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    };

    let lifetime = time::Duration::minutes(config.security.session_lifetime_minutes);
    let claims = SessionClaims::new(username, permissions, lifetime);

    match encode_session(config.signing_key(), &claims) {
        Ok(value) => {
            println!("\nSession for {} ({}):", claims.username, claims.permissions.join(", "));
            println!("{}={}", SESSION_COOKIE_NAME, value);
            println!(
                "\nValid for {} minutes. Set it as a cookie for this host, path /.",
                config.security.session_lifetime_minutes
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to sign session: {}", e);
            ExitCode::FAILURE
        }
    }
}
