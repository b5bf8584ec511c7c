use super::open_store;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use readiness_core::{io, paths};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SessionSubcommand {
    /// List stored sessions, oldest first
    List,

    /// Show the full stored record of a session
    Show { id: String },

    /// Write the record and score summary of a session to a JSON file
    Export {
        id: String,
        /// Output path (default: .readiness/exports/<id>.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: SessionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SessionSubcommand::List => list(root, json),
        SessionSubcommand::Show { id } => show(root, &id, json),
        SessionSubcommand::Export { id, output } => export(root, &id, output, json),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    store.hydrate()?;
    let sessions = store.list();

    if json {
        let list: Vec<serde_json::Value> = sessions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "assessment_id": s.id(),
                    "business_name": s.profile().name,
                    "cursor": s.cursor(),
                    "complete": s.is_complete(),
                    "started_at": s.started_at(),
                })
            })
            .collect();
        return print_json(&list);
    }

    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }

    let total = store.catalog().len();
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            vec![
                s.id().to_string(),
                s.profile().name.clone(),
                format!("{}/{total}", s.cursor()),
                if s.is_complete() { "complete" } else { "in progress" }.to_string(),
                s.started_at().format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "BUSINESS", "PROGRESS", "STATE", "STARTED"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let session = store.get(id)?;

    if json {
        return print_json(&session);
    }

    println!("Assessment: {}", session.id());
    println!("Business:   {}", session.profile().name);
    println!("Industry:   {}", session.profile().industry);
    println!("Size:       {}", session.profile().size);
    println!("Location:   {}", session.profile().location);
    println!("Answers:");
    for q in &store.catalog().questions()[..session.cursor()] {
        if let Some(score) = session.answers().get(&q.id) {
            println!("  {:<28} {score}", q.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

fn export(root: &Path, id: &str, output: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let session = store.get(id)?;
    let summary = store.summary(id)?;

    let path = output.unwrap_or_else(|| paths::exports_dir(root).join(format!("{id}.json")));
    let document = serde_json::json!({
        "session": session,
        "summary": summary,
        "exported_at": chrono::Utc::now(),
    });
    io::atomic_write(&path, serde_json::to_string_pretty(&document)?.as_bytes())?;

    if json {
        print_json(&serde_json::json!({ "path": path }))
    } else {
        println!("Exported {id} to {}", path.display());
        Ok(())
    }
}
