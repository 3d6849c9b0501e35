use chrono::{DateTime, Utc};
use clap::Parser;

use bearer_auth::services::auth::AuthService;

/// Issue or check an HS256 bearer token with the server's signing secret.
///
/// - Issue: prints `header.payload.signature` for `--subject`
/// - Verify: `--verify <TOKEN>` prints the subject and expiry, or the
///   rejection kind
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// HMAC secret (same value as the server's JWT_SECRET)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Subject (login email) to issue the token for
    #[arg(long, required_unless_present = "verify")]
    subject: Option<String>,

    /// Validity in milliseconds
    #[arg(long, env = "JWT_EXPIRATION_MS", default_value_t = 3_600_000)]
    validity_ms: u64,

    /// Override issue time (unix seconds). Default: now.
    #[arg(long)]
    iat: Option<i64>,

    /// Verify this token instead of issuing one
    #[arg(long, value_name = "TOKEN", conflicts_with = "subject")]
    verify: Option<String>,

    /// Clock used for --verify (unix seconds). Default: now.
    #[arg(long)]
    now: Option<i64>,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.secret.is_empty() {
        return Err("secret must not be empty".into());
    }
    let service = AuthService::new(args.secret.as_bytes(), args.validity_ms);

    if let Some(token) = args.verify.as_deref() {
        let now = args.now.unwrap_or_else(|| Utc::now().timestamp());
        return match service.verify(token, now) {
            Ok(claims) => {
                println!("valid");
                println!("sub: {}", claims.sub);
                println!("iat: {}", claims.iat);
                println!("exp: {}", claims.exp);
                Ok(())
            }
            Err(err) => Err(format!("rejected: {}", err.kind()).into()),
        };
    }

    let subject = args.subject.as_deref().ok_or("--subject is required")?;
    let issued_at = match args.iat {
        Some(secs) => DateTime::<Utc>::from_timestamp(secs, 0).ok_or("iat out of range")?,
        None => Utc::now(),
    };

    let token = service.issue_token_at(subject, issued_at)?;

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    println!("token: {}", token);
    println!("sub: {}", subject);
    println!("iat: {}", issued_at.timestamp());
    if let Some(exp) = service.expires_at(&token) {
        println!("exp: {}", exp);
    }

    Ok(())
}
