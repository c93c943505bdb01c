//! Credential and playlist URL resolution
//!
//! Values are resolved from an ordered list of sources: the process
//! environment first, an interactive prompt second. Both sources sit behind
//! traits ([`Env`], [`Prompter`]) so callers without a terminal (tests,
//! scripts) can substitute their own.

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::types::PlaylistId;
use std::collections::HashMap;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::debug;

/// Environment variable holding the client ID
pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the client secret
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

const CLIENT_ID_PROMPT: &str = "Enter Spotify Client ID: ";
const CLIENT_SECRET_PROMPT: &str = "Enter Spotify Client Secret: ";
const PLAYLIST_URL_PROMPT: &str = "Enter Spotify Playlist URL: ";

/// Read-only view of environment variables
pub trait Env {
    /// Value of `key`, if set
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Source of interactive answers
pub trait Prompter {
    /// Show `message` and read one line of input
    fn prompt(&mut self, message: &str) -> io::Result<String>;

    /// Like [`prompt`](Prompter::prompt), for values that should not be echoed
    fn prompt_secret(&mut self, message: &str) -> io::Result<String> {
        self.prompt(message)
    }
}

/// Prompts on stdout and reads from stdin
///
/// Secrets are read without echo when stdin is a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, message: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        stdout.write_all(message.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    fn prompt_secret(&mut self, message: &str) -> io::Result<String> {
        if io::stdin().is_terminal() {
            rpassword::prompt_password(message)
        } else {
            self.prompt(message)
        }
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// A non-empty environment variable
    Environment,
    /// An interactive prompt
    Prompt,
}

/// Credentials together with the source of each half
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    /// The credential pair
    pub credentials: Credentials,
    /// Source of the client ID
    pub client_id_source: CredentialSource,
    /// Source of the client secret
    pub client_secret_source: CredentialSource,
}

/// Resolve the client ID and then the client secret
///
/// Each value comes from its environment variable when that is set and not
/// blank, otherwise from the prompter. An empty answer is a configuration
/// error; the format of the values is not checked here.
pub fn resolve_credentials(
    env: &dyn Env,
    prompter: &mut dyn Prompter,
) -> Result<ResolvedCredentials> {
    let (client_id, client_id_source) =
        resolve_value(env, prompter, CLIENT_ID_VAR, CLIENT_ID_PROMPT, false)?;
    let (client_secret, client_secret_source) =
        resolve_value(env, prompter, CLIENT_SECRET_VAR, CLIENT_SECRET_PROMPT, true)?;

    Ok(ResolvedCredentials {
        credentials: Credentials {
            client_id,
            client_secret,
        },
        client_id_source,
        client_secret_source,
    })
}

/// Resolve the playlist to download
///
/// A URL passed on the command line wins; otherwise the user is always asked.
pub fn resolve_playlist(
    provided: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<PlaylistId> {
    let url = match provided.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => read_answer(prompter, PLAYLIST_URL_PROMPT, false, "playlist_url")?,
    };
    PlaylistId::from_url(&url)
}

fn resolve_value(
    env: &dyn Env,
    prompter: &mut dyn Prompter,
    var: &str,
    message: &str,
    secret: bool,
) -> Result<(String, CredentialSource)> {
    if let Some(value) = env.var(var)
        && !value.trim().is_empty()
    {
        debug!(var, "using credential from environment");
        return Ok((value.trim().to_string(), CredentialSource::Environment));
    }

    debug!(var, "credential not in environment, prompting");
    let value = read_answer(prompter, message, secret, &var.to_lowercase())?;
    Ok((value, CredentialSource::Prompt))
}

fn read_answer(
    prompter: &mut dyn Prompter,
    message: &str,
    secret: bool,
    key: &str,
) -> Result<String> {
    let answer = if secret {
        prompter.prompt_secret(message)
    } else {
        prompter.prompt(message)
    }
    .map_err(|e| Error::config(key, format!("failed to read input: {}", e)))?;

    let answer = answer.trim();
    if answer.is_empty() {
        return Err(Error::config(key, format!("no value entered for {}", key)));
    }
    Ok(answer.to_string())
}
