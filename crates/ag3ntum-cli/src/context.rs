//! Composition root: configuration, API client and shared caches

use crate::api::Client;
use ag3ntum_core::markdown::RenderEnv;
use ag3ntum_core::types::{is_valid_session_id, SessionList, SkillList};
use ag3ntum_core::{ConsoleConfig, ConsoleError, ExplorerOptions, FileExplorer, TtlCache};
use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

const SESSIONS_KEY: &str = "sessions";
const SKILLS_KEY: &str = "skills";

pub struct AppContext {
    pub config: ConsoleConfig,
    pub client: Arc<Client>,
    sessions: TtlCache<SessionList>,
    skills: TtlCache<SkillList>,
}

impl AppContext {
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let client = Client::from_config(&config).context("Failed to create API client")?;
        Ok(Self {
            sessions: TtlCache::new(config.cache.frequent.into()),
            skills: TtlCache::new(config.cache.reference.into()),
            client: Arc::new(client),
            config,
        })
    }

    /// Session to work on: explicit argument, then the configured default
    pub fn session_id(&self, explicit: Option<&str>) -> Result<String> {
        let session = explicit
            .map(str::to_string)
            .or_else(|| self.config.default_session.clone())
            .context("No session given; pass --session or set default_session")?;

        if !is_valid_session_id(&session) {
            anyhow::bail!(ConsoleError::InvalidSessionId(session));
        }
        Ok(session)
    }

    pub fn explorer(&self, session_id: &str) -> FileExplorer<Client> {
        FileExplorer::new(session_id, self.client.clone())
            .with_options(ExplorerOptions::from(&self.config))
            .with_error_callback(Arc::new(|path: &str, err: &ConsoleError| {
                let path = if path.is_empty() { "." } else { path };
                eprintln!("  {} {}: {}", "✗".red(), path, err);
            }))
    }

    pub fn render_env(&self, session_id: &str) -> RenderEnv {
        RenderEnv::new(session_id, self.client.clone()).with_limits(self.config.widgets)
    }

    /// Session list, served from cache; `refresh` drops the cached copy first
    pub async fn sessions(&self, refresh: bool) -> Result<SessionList> {
        if refresh {
            self.sessions.invalidate(SESSIONS_KEY);
        }
        let client = self.client.clone();
        let sessions = self
            .sessions
            .get(SESSIONS_KEY, move || async move { client.list_sessions().await }, None)
            .await?;
        Ok(sessions)
    }

    pub async fn skills(&self) -> Result<SkillList> {
        let client = self.client.clone();
        let skills = self
            .skills
            .get(SKILLS_KEY, move || async move { client.list_skills().await }, None)
            .await?;
        Ok(skills)
    }
}
