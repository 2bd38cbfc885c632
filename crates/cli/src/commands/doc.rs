// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf doc` - Document management commands.

use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{print_document, print_documents, OutputMode};

#[derive(Args)]
pub struct DocArgs {
    #[command(subcommand)]
    pub command: DocCommand,
}

#[derive(Subcommand)]
pub enum DocCommand {
    /// Create a document
    Create {
        /// Markdown, text, or JSON content
        #[arg(long, short = 'c')]
        content: String,
        /// Document category (spec, design, runbook, adr, readme, ...)
        #[arg(long, default_value = "note")]
        category: String,
        /// Content type (text, markdown, json)
        #[arg(long = "type", default_value = "markdown")]
        content_type: String,
    },
    /// List documents
    List,
    /// Show a document
    Show { id: String },
    /// Update a document's content, creating a new version
    Update {
        id: String,
        #[arg(long, short = 'c')]
        content: String,
    },
    /// Show a document's version history
    History { id: String },
    /// Roll back a document to a prior version
    Rollback {
        id: String,
        #[arg(long)]
        version: u64,
    },
    /// Full-text search across document content
    Search { query: String },
    /// Rebuild the search index
    ///
    /// The daemon indexes documents on write; this command exists only for
    /// operator parity with other stores and is a no-op here.
    Reindex,
    /// Archive a document
    Archive { id: String },
    /// Restore an archived document
    Unarchive { id: String },
}

pub async fn run(client: &mut DaemonClient, args: DocArgs, mode: OutputMode) -> Result<(), ExitError> {
    match args.command {
        DocCommand::Create { content, category, content_type } => {
            let doc = client.doc_create(content_type, content, category).await?;
            print_document(mode, &doc);
        }
        DocCommand::List => {
            let docs = client.doc_list().await?;
            print_documents(mode, &docs);
        }
        DocCommand::Show { id } => {
            let doc = client.doc_get(id.clone()).await?.ok_or_else(|| not_found("document", &id))?;
            print_document(mode, &doc);
        }
        DocCommand::Update { id, content } => {
            let doc = client.doc_update(id, content).await?;
            print_document(mode, &doc);
        }
        DocCommand::History { id } => {
            let docs = client.doc_history(id).await?;
            print_documents(mode, &docs);
        }
        DocCommand::Rollback { id, version } => {
            let doc = client.doc_rollback(id, version).await?;
            print_document(mode, &doc);
        }
        DocCommand::Search { query } => {
            let docs = client.doc_search(query).await?;
            print_documents(mode, &docs);
        }
        DocCommand::Reindex => {
            if !mode.quiet {
                println!("documents are indexed on write; nothing to do");
            }
        }
        DocCommand::Archive { id } => {
            let doc = client.doc_archive(id).await?;
            print_document(mode, &doc);
        }
        DocCommand::Unarchive { id } => {
            let doc = client.doc_unarchive(id).await?;
            print_document(mode, &doc);
        }
    }
    Ok(())
}

fn not_found(kind: &'static str, id: &str) -> ExitError {
    ExitError::new(4, format!("{kind} not found: {id}"))
}
