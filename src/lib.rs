//! Cell tracking language server.
//!
//! Follows delimiter-separated cells (`# %%`) of documents open in the editor
//! and keeps every executed cell anchored to its current lines while the
//! document is edited.

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

pub mod cells;
mod document;
mod lsp;
pub mod settings;
pub mod tracker;

pub use document::{document_key, normalize_key, DocumentStore, LineIndex};
pub use lsp::{command_names, parse_command, run_command, Command, CommandError};
pub use settings::{build_tracker_config, discover_settings, load_settings, SettingsError};
pub use tracker::{
    BlockSnapshot, CellTracker, DocumentSnapshot, DocumentSource, Submission, TrackerConfig,
    TrackerEvent,
};

pub struct Backend {
    client: Client,
    documents: Arc<DocumentStore>,
    tracker: Mutex<CellTracker<Arc<DocumentStore>>>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        let documents = Arc::new(DocumentStore::new());
        let tracker = CellTracker::new(Arc::clone(&documents), TrackerConfig::default());
        Self {
            client,
            documents,
            tracker: Mutex::new(tracker),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Extract workspace root from params
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        if let Some(root) = workspace_root {
            // Discover settings by walking up the directory tree
            let (settings, settings_dir) = settings::discover_settings(&root);
            let config = settings::build_tracker_config(&settings);
            info!(
                "settings from {}: tracking {}",
                settings_dir.display(),
                if config.enabled { "enabled" } else { "disabled" }
            );
            self.tracker.lock().await.reconfigure(config);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: lsp::command_names(),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "cell tracking server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let key = document_key(&params.text_document.uri);
        self.documents.open(key, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let key = document_key(&params.text_document.uri);
        let Some(edits) = self.documents.apply_changes(&key, params.content_changes) else {
            debug!("change for unopened document {}", key);
            return;
        };
        self.tracker.lock().await.document_edited(&key, &edits);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let key = document_key(&params.text_document.uri);
        self.documents.close(&key);
        self.tracker.lock().await.document_closed(&key);
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let command = lsp::parse_command(params)?;
        let mut tracker = self.tracker.lock().await;
        Ok(lsp::run_command(&mut *tracker, command))
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(Backend::new)
}
