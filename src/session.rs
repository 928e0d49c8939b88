//! Session handler (C9): owns a single client conversation. Decodes inbound
//! commands, starts/cancels at most one debate task at a time, forwards the
//! debate orchestrator's output records, and injects mid-debate constraints.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::openai::OpenAIChatClient;
use crate::config::Settings;
use crate::debate::{run_debate, DebateControl, StartDebateParams};
use crate::error::{EngineError, EngineResult};
use crate::message::{is_valid_api_key, InboundCommand, OutboundRecord};

/// Single-debate-at-a-time session state for one client connection.
pub struct SessionHandler {
    settings: Arc<Settings>,
    out_tx: mpsc::Sender<OutboundRecord>,
    current: Option<RunningDebate>,
}

struct RunningDebate {
    handle: JoinHandle<()>,
    control: Arc<DebateControl>,
}

impl SessionHandler {
    pub fn new(settings: Arc<Settings>, out_tx: mpsc::Sender<OutboundRecord>) -> Self {
        SessionHandler { settings, out_tx, current: None }
    }

    /// Decode and handle one inbound JSON text frame. Parse failures and
    /// semantically invalid commands are surfaced as an `error` record; the
    /// session otherwise continues unaffected (§7 "protocol error").
    pub async fn handle_message(&mut self, text: &str) {
        let command: InboundCommand = match serde_json::from_str(text) {
            Ok(cmd) => cmd,
            Err(e) => {
                self.emit(OutboundRecord::error(&format!("Invalid message: {}", e))).await;
                return;
            }
        };

        match command {
            InboundCommand::StartDebate { query, model, previous_context, selected_agents, industry, api_key } => {
                self.start_debate(query, model, previous_context, selected_agents, industry, api_key).await;
            }
            InboundCommand::InjectConstraint { constraint } => {
                self.inject_constraint(constraint).await;
            }
        }
    }

    /// Called when the underlying transport connection closes: cancels any
    /// in-flight debate without emitting further records (§5 "session disconnect").
    pub fn disconnect(&mut self) {
        if let Some(running) = self.current.take() {
            log::debug!("session disconnected with a debate in flight; cancelling");
            running.handle.abort();
        }
    }

    async fn start_debate(
        &mut self,
        query: String,
        model: Option<String>,
        previous_context: Option<String>,
        selected_agents: Option<Vec<String>>,
        industry: Option<String>,
        api_key: Option<String>,
    ) {
        let (trimmed_query, resolved_key) = match self.validate_start_debate(&query, api_key.as_deref()) {
            Ok(v) => v,
            Err(e) => {
                self.emit(OutboundRecord::error(e.message())).await;
                return;
            }
        };

        let client = match OpenAIChatClient::new(&resolved_key, &self.settings.cerebras_base_url) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                self.emit(OutboundRecord::error(e.message())).await;
                return;
            }
        };

        if let Some(running) = self.current.take() {
            log::info!("cancelling in-flight debate to start a new one");
            running.handle.abort();
        }

        let params = StartDebateParams {
            query: trimmed_query,
            model_tier: model,
            previous_context,
            selected_agents: selected_agents.unwrap_or_default(),
            industry,
            api_key: resolved_key,
        };

        let control = Arc::new(DebateControl::new());
        let settings = self.settings.clone();
        let out_tx = self.out_tx.clone();
        let task_control = control.clone();

        let handle = tokio::spawn(async move {
            run_debate(params, settings, client, task_control, out_tx).await;
        });

        self.current = Some(RunningDebate { handle, control });
    }

    /// Validate a `start_debate` request and resolve its upstream API key, per §7's
    /// protocol/configuration error taxonomy: a non-empty (after trim) query, a
    /// well-formed `apiKey` override if supplied, and either that override or a
    /// server-configured key.
    fn validate_start_debate(&self, query: &str, api_key: Option<&str>) -> EngineResult<(String, String)> {
        let trimmed_query = query.trim();
        if trimmed_query.is_empty() {
            return Err(EngineError::Protocol("Query cannot be empty".to_string()));
        }

        if let Some(key) = api_key {
            if !is_valid_api_key(key) {
                return Err(EngineError::Protocol("Invalid API key format".to_string()));
            }
        }

        let resolved_key = self.settings.resolve_api_key(api_key)?;
        Ok((trimmed_query.to_string(), resolved_key))
    }

    async fn inject_constraint(&mut self, constraint: String) {
        let trimmed = constraint.trim();
        if trimmed.is_empty() {
            self.emit(OutboundRecord::error("Constraint cannot be empty")).await;
            return;
        }

        if let Some(running) = &self.current {
            running.control.inject_constraint(trimmed.to_string());
        }

        // Always acknowledged, regardless of whether a debate is currently running.
        self.emit(OutboundRecord::constraint_acknowledged(trimmed)).await;
    }

    async fn emit(&self, record: OutboundRecord) {
        let _ = self.out_tx.send(record).await;
    }
}
