/// Mint an access token for an editor, for use against the admin endpoints.
///
/// Usage: issue-token --role editor [--user-id UUID] [--ttl-seconds 3600]

use clap::Parser;
use uuid::Uuid;

use breaking_news_api::{middleware::auth::issue_access_token, models::user::UserRole};

#[derive(Parser)]
#[command(name = "issue-token", about = "Issue a signed access token for the breaking news API")]
struct Args {
    /// administrator | editor | author | contributor | subscriber
    #[arg(long)]
    role: UserRole,

    /// User id to embed (random if omitted)
    #[arg(long)]
    user_id: Option<Uuid>,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    ttl_seconds: u64,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("Missing required env var: JWT_SECRET"))?;
    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);

    let token = issue_access_token(user_id, args.role, &secret, args.ttl_seconds)?;
    eprintln!("user_id: {user_id}, role: {}", args.role);
    println!("{token}");
    Ok(())
}
