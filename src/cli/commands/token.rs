use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{AuthError, AuthGate, Claims, JwtKeys, PrincipalKind};
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token with the configured secret")]
    Issue {
        #[arg(long, help = "Principal id")]
        id: i64,
        #[arg(long, help = "Principal kind: internal or client")]
        kind: String,
        #[arg(long, help = "Role claim")]
        role: Option<String>,
        #[arg(long, help = "Department claim")]
        department: Option<String>,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        ttl_hours: Option<i64>,
    },

    #[command(about = "Verify a token and print its claims")]
    Verify {
        #[arg(help = "Bearer token")]
        token: String,
    },
}

pub async fn handle(
    cmd: TokenCommands,
    config: &AppConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let keys = JwtKeys::new(&config.security.jwt_secret)?;

    match cmd {
        TokenCommands::Issue {
            id,
            kind,
            role,
            department,
            email,
            ttl_hours,
        } => {
            let kind: PrincipalKind = kind.parse()?;
            let ttl = Duration::hours(ttl_hours.unwrap_or(config.security.jwt_expiry_hours));

            let mut claims = Claims::new(id, kind.as_str(), ttl);
            if let Some(role) = role {
                claims = claims.with_role(role);
            }
            if let Some(department) = department {
                claims = claims.with_department(department);
            }
            if let Some(email) = email {
                claims = claims.with_email(email);
            }

            let token = keys.sign(&claims)?;
            output_success(
                output_format,
                &format!("Issued {} token for id {}", kind, id),
                Some(json!({ "token": token, "claims": claims })),
            )
        }
        TokenCommands::Verify { token } => match verify(keys, &token).await {
            Ok(claims) => output_success(
                output_format,
                "Token is valid",
                Some(json!({ "claims": claims })),
            ),
            Err(e) => {
                output_error(output_format, &e.to_string())?;
                anyhow::bail!("token rejected")
            }
        },
    }
}

/// Signature, expiry and kind only; record lookups need the server.
async fn verify(keys: JwtKeys, token: &str) -> Result<Claims, AuthError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
        .map_err(|_| AuthError::InvalidCredential)?;
    headers.insert(header::AUTHORIZATION, value);

    let context = AuthGate::trust_claims(keys).authenticate(&headers).await?;
    Ok(context.claims)
}
