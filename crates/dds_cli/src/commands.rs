//! Command handlers for the `dds` binary.
//!
//! Reads print one JSON document per row; writes print a one-line summary.

use crate::{Command, LetterCommand, PostCommand, UserCommand};
use anyhow::{Context, Result};
use dds_core::db::schema::schema_status;
use dds_core::{
    HashKey, HubRepository, LetterHub, LetterSatellite, LinkRepository, ListQuery, PostLink,
    PostService, PublishRequest, SatelliteRepository, SqliteHubRepository, SqliteLinkRepository,
    SqliteSatelliteRepository, UserHub,
};
use rusqlite::Connection;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One letter with everything the vault knows about it.
#[derive(Debug, Serialize)]
struct LetterView {
    hub: LetterHub,
    content: Option<LetterSatellite>,
    posted_by: Vec<HashKey>,
}

pub fn execute(
    conn: &mut Connection,
    command: &Command,
    db_path: &Path,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Init => {
            let status = schema_status(conn)?;
            writeln!(
                out,
                "initialized {} store at {} (schema version {})",
                status.schema,
                db_path.display(),
                status.version
            )?;
        }
        Command::Status => {
            let status = schema_status(conn)?;
            serde_json::to_writer_pretty(&mut *out, &status)?;
            writeln!(out)?;
        }
        Command::User { command } => execute_user(conn, command, out)?,
        Command::Letter { command } => execute_letter(conn, command, out)?,
        Command::Post { command } => execute_post(conn, command, out)?,
    }
    Ok(())
}

fn execute_user(conn: &Connection, command: &UserCommand, out: &mut impl Write) -> Result<()> {
    let hubs = SqliteHubRepository::try_new(conn)?;
    match command {
        UserCommand::Add { id, hash } => {
            hubs.create_user(&UserHub::new(*id, hash.clone()))
                .with_context(|| format!("failed to add user {id}"))?;
            writeln!(out, "added user {id} as {hash}")?;
        }
        UserCommand::List(page) => write_rows(out, &hubs.list_users(&page.query())?)?,
    }
    Ok(())
}

fn execute_letter(
    conn: &mut Connection,
    command: &LetterCommand,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        LetterCommand::Add {
            id,
            hash,
            title,
            body,
        } => {
            let tx = conn.transaction()?;
            SqliteHubRepository::try_new(&tx)?
                .create_letter(&LetterHub::new(*id, hash.clone()))
                .with_context(|| format!("failed to add letter {id}"))?;
            if let (Some(title), Some(body)) = (title, body) {
                SqliteSatelliteRepository::try_new(&tx)?
                    .create_letter_content(&LetterSatellite::new(hash.clone(), title, body))
                    .with_context(|| format!("failed to add content for letter {id}"))?;
            }
            tx.commit()?;
            writeln!(out, "added letter {id} as {hash}")?;
        }
        LetterCommand::Show { hash } => {
            let hub = SqliteHubRepository::try_new(conn)?
                .get_letter(hash)?
                .with_context(|| format!("letter {hash} not found"))?;
            let content = SqliteSatelliteRepository::try_new(conn)?.get_letter_content(hash)?;
            let posted_by = SqliteLinkRepository::try_new(conn)?
                .list_posts_by_letter(hash, &ListQuery::default())?
                .into_iter()
                .map(|link| link.user_id_hash)
                .collect();
            let view = LetterView {
                hub,
                content,
                posted_by,
            };
            serde_json::to_writer(&mut *out, &view)?;
            writeln!(out)?;
        }
        LetterCommand::List(page) => {
            let hubs = SqliteHubRepository::try_new(conn)?;
            write_rows(out, &hubs.list_letters(&page.query())?)?;
        }
    }
    Ok(())
}

fn execute_post(conn: &mut Connection, command: &PostCommand, out: &mut impl Write) -> Result<()> {
    match command {
        PostCommand::Add { user, letter } => {
            SqliteLinkRepository::try_new(conn)?
                .create_post(&PostLink::new(user.clone(), letter.clone()))
                .context("failed to add post")?;
            writeln!(out, "linked user {user} to letter {letter}")?;
        }
        PostCommand::Publish {
            user_id,
            user_hash,
            letter_id,
            letter_hash,
            title,
            body,
        } => {
            let request = PublishRequest {
                user: UserHub::new(*user_id, user_hash.clone()),
                letter: LetterHub::new(*letter_id, letter_hash.clone()),
                letter_title: title.clone(),
                letter_body: body.clone(),
            };
            let published = PostService::new(conn)
                .publish(&request)
                .context("failed to publish letter")?;
            writeln!(
                out,
                "published letter {letter_id} by user {user_id} (new user hub: {}, new letter hub: {})",
                published.user_hub_created, published.letter_hub_created
            )?;
        }
        PostCommand::List { user, letter, page } => {
            let links = SqliteLinkRepository::try_new(conn)?;
            let query = page.query();
            let rows = match (user, letter) {
                (Some(user), _) => links.list_posts_by_user(user, &query)?,
                (None, Some(letter)) => links.list_posts_by_letter(letter, &query)?,
                (None, None) => links.list_posts(&query)?,
            };
            write_rows(out, &rows)?;
        }
    }
    Ok(())
}

fn write_rows<T: Serialize>(out: &mut impl Write, rows: &[T]) -> Result<()> {
    for row in rows {
        serde_json::to_writer(&mut *out, row)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::execute;
    use crate::Cli;
    use clap::Parser;
    use dds_core::open_db_in_memory;
    use rusqlite::Connection;

    const KEY_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const KEY_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn run(conn: &mut Connection, args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("dds").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(conn, &cli.command, &cli.db, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn publish_then_show_letter() {
        let mut conn = open_db_in_memory().unwrap();
        run(
            &mut conn,
            &[
                "post", "publish", "--user-id", "1", "--user-hash", KEY_A, "--letter-id", "7",
                "--letter-hash", KEY_B, "--title", "Hello", "--body", "Body text",
            ],
        )
        .unwrap();

        let shown = run(&mut conn, &["letter", "show", "--hash", KEY_B]).unwrap();
        let view: serde_json::Value = serde_json::from_str(shown.trim()).unwrap();
        assert_eq!(view["hub"]["letter_id"], 7);
        assert_eq!(view["content"]["letter_title"], "Hello");
        assert_eq!(view["posted_by"][0], KEY_A);
    }

    #[test]
    fn duplicate_post_add_fails_with_context() {
        let mut conn = open_db_in_memory().unwrap();
        run(&mut conn, &["user", "add", "--id", "1", "--hash", KEY_A]).unwrap();
        run(&mut conn, &["letter", "add", "--id", "1", "--hash", KEY_B]).unwrap();
        run(&mut conn, &["post", "add", "--user", KEY_A, "--letter", KEY_B]).unwrap();

        let err = run(&mut conn, &["post", "add", "--user", KEY_A, "--letter", KEY_B])
            .unwrap_err();
        assert!(format!("{err:#}").contains("unique constraint violated"));

        let listed = run(&mut conn, &["post", "list", "--user", KEY_A]).unwrap();
        assert_eq!(listed.lines().count(), 1);
    }

    #[test]
    fn status_reports_row_counts() {
        let mut conn = open_db_in_memory().unwrap();
        run(&mut conn, &["user", "add", "--id", "3", "--hash", KEY_A]).unwrap();

        let status = run(&mut conn, &["status"]).unwrap();
        let status: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(status["version"], 1);
        assert_eq!(status["tables"][0]["table"], "h_users");
        assert_eq!(status["tables"][0]["rows"], 1);
    }
}
