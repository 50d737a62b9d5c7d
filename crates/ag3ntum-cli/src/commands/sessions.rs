//! Session and skill listings, served through the shared caches

use crate::context::AppContext;
use ag3ntum_core::types::{SessionList, SessionStatus};
use anyhow::Result;
use colored::Colorize;

pub async fn sessions(ctx: &AppContext, refresh: bool) -> Result<()> {
    let list = ctx.sessions(refresh).await?;
    print_sessions(&list);
    Ok(())
}

pub fn print_sessions(list: &SessionList) {
    if list.sessions.is_empty() {
        println!("{}", "No sessions".dimmed());
        return;
    }

    println!("{}", format!("Sessions ({})", list.total).bold());
    for session in &list.sessions {
        let status = session.status.to_string();
        let status = match session.status {
            SessionStatus::Running | SessionStatus::Pending => status.yellow(),
            SessionStatus::Complete => status.green(),
            SessionStatus::Failed | SessionStatus::Cancelled => status.red(),
            SessionStatus::Unknown => status.dimmed(),
        };
        let task = session.task.as_deref().unwrap_or("");
        let task: String = if task.chars().count() > 60 {
            format!("{}…", task.chars().take(59).collect::<String>())
        } else {
            task.to_string()
        };
        println!("  {}  {:<10}  {}", session.id.cyan(), status, task);
    }
}

pub async fn skills(ctx: &AppContext) -> Result<()> {
    let list = ctx.skills().await?;
    if list.skills.is_empty() {
        println!("{}", "No skills available".dimmed());
        return Ok(());
    }

    println!("{}", format!("Skills ({})", list.skills.len()).bold());
    for skill in &list.skills {
        println!("  {}  {}", skill.name.cyan(), skill.description.dimmed());
    }
    Ok(())
}
