//! Session bootstrap entry point
//!
//! Registers the shared test users and establishes their persisted sessions,
//! so the suite's tests can replay an authenticated session instead of each
//! signing in through the UI. Run once before the first suite run and again
//! whenever the sessions expire:
//!
//!   cargo run --package qadrive-e2e --bin qadrive-bootstrap

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use qadrive_common::{HarnessConfig, UserProfile};
use qadrive_harness::bootstrap::establish_session;
use qadrive_harness::{ControlPlaneClient, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "qadrive-bootstrap")]
#[command(about = "Establish persisted sessions for the QADrive suite")]
struct Args {
    /// Base URL of the application under test
    #[arg(long, env = "QADRIVE_BASE_URL")]
    base_url: Option<String>,

    /// Directory for persisted session records
    #[arg(long, default_value = ".auth")]
    session_dir: PathBuf,

    /// Delete and re-register the test identities first
    #[arg(long)]
    fresh: bool,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    match rt.block_on(bootstrap(args)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn bootstrap(args: Args) -> anyhow::Result<()> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    config.session_dir = args.session_dir;
    if args.headed {
        config.headless = false;
    }

    let store = SessionStore::new(&config.session_dir);
    let users = [
        (qadrive_e2e::USER1_IDENTITY, qadrive_e2e::test_user1()),
        (qadrive_e2e::USER2_IDENTITY, qadrive_e2e::test_user2()),
    ];

    if args.fresh {
        remove_identities(&config, &users).await?;
    }

    for (identity, user) in &users {
        let record = establish_session(&config, &store, user, identity).await?;
        println!(
            "established session for {} ({} cookie(s)) at {}",
            user.email,
            record.state.cookies.len(),
            record.path.display()
        );
    }

    Ok(())
}

/// Delete existing test identities so the bootstrap starts from nothing.
/// Identities that never existed or cannot sign in are skipped.
async fn remove_identities(
    config: &HarnessConfig,
    users: &[(&str, UserProfile)],
) -> anyhow::Result<()> {
    let client = ControlPlaneClient::new(&config.base_url, &config.session_marker)?;
    for (_, user) in users {
        match client.authenticate(&user.email, &user.password).await {
            Ok(credential) => {
                let outcome = client.delete_identity(&user.email, &credential).await?;
                println!(
                    "deleted identity {} (status {})",
                    user.email, outcome.status
                );
            }
            Err(e) => {
                println!("skipping delete for {}: {e}", user.email);
            }
        }
    }
    Ok(())
}
