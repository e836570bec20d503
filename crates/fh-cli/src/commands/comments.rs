//! Comments command
//!
//! Read and write the comment thread of a post.

use super::AppContext;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use fh_core::comment::CommentBuilder;
use fh_core::export::ExportManager;
use fh_core::thread::CommentThread;
use fh_core::types::{Actor, CommentId, PostId, UserId};
use std::path::PathBuf;
use std::sync::Arc;

/// Comments subcommands
#[derive(Debug, Subcommand)]
pub enum CommentsCommand {
    /// Show a post's comment thread
    List {
        /// Post ID
        #[arg(long)]
        post: String,

        /// Output format (text, markdown, json, json-compact)
        #[arg(short, long)]
        format: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a top-level comment
    Add {
        /// Post ID
        #[arg(long)]
        post: String,

        /// Author user ID
        #[arg(long)]
        author: String,

        /// Comment text
        #[arg(long)]
        text: String,
    },

    /// Reply to a comment
    Reply {
        /// Post ID
        #[arg(long)]
        post: String,

        /// Comment being replied to
        #[arg(long)]
        parent: String,

        /// Author user ID
        #[arg(long)]
        author: String,

        /// Reply text
        #[arg(long)]
        text: String,
    },

    /// Change a comment's text
    Edit {
        /// Post ID
        #[arg(long)]
        post: String,

        /// Comment ID
        #[arg(long)]
        id: String,

        /// New text
        #[arg(long)]
        text: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Delete a comment and all of its replies
    Delete {
        /// Post ID
        #[arg(long)]
        post: String,

        /// Comment ID
        #[arg(long)]
        id: String,

        /// Skip confirmation
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// List everyone who commented on a post
    Authors {
        /// Post ID
        #[arg(long)]
        post: String,
    },
}

/// Who is changing a comment
#[derive(Debug, Args)]
pub struct ActorArgs {
    /// User performing the change (must be the author unless --admin)
    #[arg(long = "as", value_name = "USER")]
    pub user: String,

    /// Act as a community admin
    #[arg(long)]
    pub admin: bool,
}

impl ActorArgs {
    fn actor(&self) -> Actor {
        let user_id = UserId::from_string(&self.user);
        if self.admin {
            Actor::admin(user_id)
        } else {
            Actor::user(user_id)
        }
    }
}

/// Execute the comments command
pub fn execute(cmd: CommentsCommand, ctx: &AppContext) -> Result<()> {
    match cmd {
        CommentsCommand::List {
            post,
            format,
            output,
        } => list_comments(ctx, &post, format, output),
        CommentsCommand::Add { post, author, text } => add_comment(ctx, &post, &author, &text, None),
        CommentsCommand::Reply {
            post,
            parent,
            author,
            text,
        } => add_comment(ctx, &post, &author, &text, Some(&parent)),
        CommentsCommand::Edit {
            post,
            id,
            text,
            actor,
        } => edit_comment(ctx, &post, &id, &text, &actor.actor()),
        CommentsCommand::Delete {
            post,
            id,
            force,
            actor,
        } => delete_comment(ctx, &post, &id, force, &actor.actor()),
        CommentsCommand::Authors { post } => list_authors(ctx, &post),
    }
}

fn open_thread(ctx: &AppContext, post: &str) -> Result<CommentThread> {
    let store = Arc::new(ctx.open_store()?);
    CommentThread::open_with(store, PostId::from_string(post), &ctx.config)
        .with_context(|| format!("Failed to load comments of post '{}'", post))
}

fn list_comments(
    ctx: &AppContext,
    post: &str,
    format: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let thread = open_thread(ctx, post)?;
    let manager = ExportManager::from_config(&ctx.config.display);
    let format = format.unwrap_or_else(|| ctx.config.display.default_format.clone());

    if !manager.formats().contains(&format.as_str()) {
        anyhow::bail!(
            "Unknown format '{}'. Available: {}",
            format,
            manager.formats().join(", ")
        );
    }

    match output {
        Some(path) => {
            let written = manager
                .export_to_file(thread.post_id(), thread.forest(), &format, &path)
                .context("Failed to export comments")?;
            println!(
                "{} Exported {} comment(s) to {}",
                "✓".green(),
                thread.forest().len(),
                written.display()
            );
        }
        None => {
            let content = manager.export(thread.post_id(), thread.forest(), &format)?;
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}

fn add_comment(
    ctx: &AppContext,
    post: &str,
    author: &str,
    text: &str,
    parent: Option<&str>,
) -> Result<()> {
    let mut thread = open_thread(ctx, post)?;

    let mut builder = CommentBuilder::new(UserId::from_string(author)).text(text);
    if let Some(parent) = parent {
        let parent_id = CommentId::from_string(parent);
        if !thread.forest().contains(&parent_id) {
            eprintln!(
                "{} Comment {} is not in this thread.",
                "⚠".yellow(),
                parent.cyan()
            );
        }
        builder = builder.reply_to(parent_id);
    }

    let draft = builder.build()?;
    let posted = thread.post(draft).context("Failed to post comment")?;

    let kind = if posted.record.is_reply() { "reply" } else { "comment" };
    println!("{} Posted {} {}", "✓".green(), kind, posted.record.id);
    if !posted.visible {
        eprintln!(
            "{} The {} was saved but is hidden because its parent is gone.",
            "⚠".yellow(),
            kind
        );
    }

    Ok(())
}

fn edit_comment(ctx: &AppContext, post: &str, id: &str, text: &str, actor: &Actor) -> Result<()> {
    let mut thread = open_thread(ctx, post)?;
    let record = thread
        .edit(actor, &CommentId::from_string(id), text)
        .with_context(|| format!("Failed to edit comment '{}'", id))?;

    println!("{} Updated comment {}", "✓".green(), record.id);
    Ok(())
}

fn delete_comment(
    ctx: &AppContext,
    post: &str,
    id: &str,
    force: bool,
    actor: &Actor,
) -> Result<()> {
    let mut thread = open_thread(ctx, post)?;
    let comment_id = CommentId::from_string(id);

    if !force {
        use dialoguer::Confirm;

        let replies = thread.forest().descendant_count(&comment_id);
        let prompt = if replies == 0 {
            format!("Delete comment {}?", id)
        } else {
            format!("Delete comment {} and its {} repl(ies)?", id, replies)
        };

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = thread
        .remove(actor, &comment_id)
        .with_context(|| format!("Failed to delete comment '{}'", id))?;

    println!("{} Deleted {} comment(s)", "✓".green(), removed.len());
    Ok(())
}

fn list_authors(ctx: &AppContext, post: &str) -> Result<()> {
    let thread = open_thread(ctx, post)?;
    let authors = thread.forest().author_ids();

    if authors.is_empty() {
        println!("No comments yet.");
        return Ok(());
    }

    for author in authors {
        println!("{}", author);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> CommentsCommand {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Comments(cmd) => cmd,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply() {
        let cmd = parse(&[
            "fanhub", "comments", "reply", "--post", "p1", "--parent", "c1", "--author", "u",
            "--text", "hi",
        ]);
        match cmd {
            CommentsCommand::Reply { parent, text, .. } => {
                assert_eq!(parent, "c1");
                assert_eq!(text, "hi");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_defaults() {
        let cmd = parse(&["fanhub", "comments", "list", "--post", "p1"]);
        assert!(matches!(
            cmd,
            CommentsCommand::List {
                format: None,
                output: None,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_delete_actor() {
        let cmd = parse(&[
            "fanhub", "comments", "delete", "--post", "p1", "--id", "c1", "--as", "mod",
            "--admin", "--force",
        ]);
        match cmd {
            CommentsCommand::Delete { actor, force, .. } => {
                assert!(force);
                assert_eq!(actor.actor(), Actor::admin(UserId::from_string("mod")));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_edit_requires_actor() {
        let result = Cli::try_parse_from([
            "fanhub", "comments", "edit", "--post", "p1", "--id", "c1", "--text", "hi",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_reply_requires_parent() {
        let result = Cli::try_parse_from([
            "fanhub", "comments", "reply", "--post", "p1", "--author", "u", "--text", "hi",
        ]);
        assert!(result.is_err());
    }
}
