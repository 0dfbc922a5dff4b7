//! Offline operator commands
//!
//! `candidates` and `verify-token` run without the server and without
//! touching the provider.

use std::io::Write;

use crate::config::Config;
use crate::error::Result;
use crate::provider::{candidates_for, CandidateVariation};
use crate::session::SessionIssuer;

/// Writes the candidate list the login flow will try.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_candidates<W: Write>(config: &Config, json: bool, out: &mut W) -> Result<()> {
    let candidates = candidates_for(&config.provider);

    if json {
        serde_json::to_writer_pretty(&mut *out, &candidates)?;
        writeln!(out)?;
        return Ok(());
    }

    if !config.provider.candidates.is_empty() {
        writeln!(out, "Using {} configured candidate(s)", candidates.len())?;
    }
    for (index, candidate) in candidates.iter().enumerate() {
        write_candidate(out, index + 1, candidate)?;
    }
    Ok(())
}

fn write_candidate<W: Write>(out: &mut W, position: usize, candidate: &CandidateVariation) -> Result<()> {
    writeln!(out, "{}. {}", position, candidate.label)?;
    writeln!(out, "   redirect_url: \"{}\"", candidate.redirect_url)?;
    writeln!(out, "   platform:     \"{}\"", candidate.platform)?;
    Ok(())
}

/// Verifies a session token and writes its claims as JSON.
///
/// # Errors
///
/// Returns an error if no signing secret is configured or the token does
/// not verify.
pub fn verify_token<W: Write>(config: &Config, token: &str, out: &mut W) -> Result<()> {
    let issuer = SessionIssuer::from_config(&config.session)?;
    let claims = issuer.decode(token)?;

    serde_json::to_writer_pretty(&mut *out, &claims)?;
    writeln!(out)?;
    Ok(())
}
