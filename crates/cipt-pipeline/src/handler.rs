//! Inbound message handling.
//!
//! `MessagePipeline::handle_message` is the single entry point for every
//! chat message. External calls (classifier, retrieval, billing, ledger)
//! all return `Result`; the degrade decisions are made here, next to the
//! reply that each failure affects.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use cipt_billing::{
    format_document_list, format_emitted, mentions_billing, narrow_documents, BillingService,
};
use cipt_core::config::RoutingConfig;
use cipt_core::error::{CiptError, Result};
use cipt_core::types::{ChatMessage, Ticket, TicketStatus};
use cipt_knowledge::Retriever;
use cipt_llm::classifier::{classify_ticket, needs_human_contact, TicketClassification};
use cipt_llm::client::DynChatModel;
use cipt_llm::composer::AnswerComposer;
use cipt_session::{SessionStore, TicketDraft};
use cipt_ticket::{parse_responder_command, ProtocolGenerator, ResponderCommand, TicketLedger};

use crate::messages;
use crate::transport::{send_contact_with_fallback, ChatTransport};

/// A normalized inbound chat message.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Chat the message arrived in.
    pub chat_id: String,
    /// Individual sender (differs from `chat_id` in groups).
    pub sender_id: String,
    /// Sender's display name.
    pub sender_name: String,
    pub text: String,
    pub is_group: bool,
    /// Text of the message this one replies to, when quoting.
    pub quoted_text: Option<String>,
}

/// The assistant's message-handling pipeline.
pub struct MessagePipeline {
    sessions: Arc<SessionStore>,
    retriever: Arc<Retriever>,
    composer: AnswerComposer,
    classifier_model: Box<dyn DynChatModel>,
    ledger: Arc<dyn TicketLedger>,
    protocols: ProtocolGenerator,
    billing: Option<BillingService>,
    transport: Arc<dyn ChatTransport>,
    routing: RoutingConfig,
    message_log_path: Option<PathBuf>,
}

impl MessagePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<SessionStore>,
        retriever: Arc<Retriever>,
        composer: AnswerComposer,
        classifier_model: Box<dyn DynChatModel>,
        ledger: Arc<dyn TicketLedger>,
        billing: Option<BillingService>,
        transport: Arc<dyn ChatTransport>,
        routing: RoutingConfig,
        message_log_path: Option<PathBuf>,
    ) -> Self {
        Self {
            sessions,
            retriever,
            composer,
            classifier_model,
            ledger,
            protocols: ProtocolGenerator::new(),
            billing,
            transport,
            routing,
            message_log_path,
        }
    }

    /// Handle one inbound message end to end.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<()> {
        // Support-group replies to a ticket notification are status commands.
        if msg.is_group
            && !self.routing.support_group_id.is_empty()
            && msg.chat_id == self.routing.support_group_id
        {
            if let Some(quoted) = &msg.quoted_text {
                if let Some(command) = parse_responder_command(
                    quoted,
                    &msg.text,
                    &msg.sender_id,
                    &self.routing.responders,
                ) {
                    return self.apply_responder_command(msg, command).await;
                }
            }
        }

        // Groups only get answers when the bot is mentioned.
        if msg.is_group && !msg.text.to_lowercase().contains("@bot") {
            return Ok(());
        }
        let question = msg.text.to_lowercase().replace("@bot", "").trim().to_string();
        if question.is_empty() {
            return Ok(());
        }

        self.log_message(&msg.sender_name, &question);

        if self.sessions.has_pending_ticket(&msg.chat_id) {
            match question.as_str() {
                "sim" => return self.commit_ticket(msg).await,
                "não" | "nao" => {
                    self.sessions.take_pending_ticket(&msg.chat_id);
                    return self
                        .transport
                        .send_text(&msg.chat_id, messages::TICKET_CANCELLED)
                        .await;
                }
                // Anything else keeps the draft and flows on.
                _ => {}
            }
        }

        if self.sessions.has_pending_billing(&msg.chat_id) {
            if question == "sair" || question == "cancelar" {
                self.sessions.take_pending_billing(&msg.chat_id);
                return self
                    .transport
                    .send_text(&msg.chat_id, messages::BILLING_EXITED)
                    .await;
            }
            if let Ok(choice) = question.parse::<usize>() {
                return self.emit_selected_document(msg, choice).await;
            }
        }

        // Classifier failure means the message is treated as a question.
        let classification = match classify_ticket(self.classifier_model.as_ref(), &question).await
        {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Ticket classification failed, treating as question");
                TicketClassification::NotTicket
            }
        };
        if let TicketClassification::Ticket(category) = classification {
            self.sessions.set_pending_ticket(
                &msg.chat_id,
                TicketDraft {
                    description: question.clone(),
                    category,
                },
            );
            self.sessions.touch(&msg.chat_id);
            return self
                .transport
                .send_text(
                    &msg.chat_id,
                    &messages::ticket_confirmation_prompt(&question, category),
                )
                .await;
        }

        if messages::GREETING_KEYWORDS.contains(&question.as_str()) {
            self.sessions.touch(&msg.chat_id);
            return self
                .transport
                .send_text(&msg.chat_id, &messages::greeting_reply(&msg.sender_name))
                .await;
        }

        if messages::FAREWELL_KEYWORDS.contains(&question.as_str()) {
            self.sessions.clear(&msg.chat_id);
            return self
                .transport
                .send_text(&msg.chat_id, &messages::farewell_reply(&msg.sender_name))
                .await;
        }

        if self.billing.is_some() && mentions_billing(&question) {
            return self.start_billing_flow(msg, &question).await;
        }

        self.answer_question(msg, &question).await
    }

    /// Closing notice for a session the sweeper expired.
    pub async fn notify_session_closed(&self, chat_id: &str) -> Result<()> {
        self.transport.send_text(chat_id, messages::CLOSING_NOTICE).await
    }

    async fn apply_responder_command(
        &self,
        msg: &IncomingMessage,
        command: ResponderCommand,
    ) -> Result<()> {
        let origin = self
            .ledger
            .update_status(&command.protocol, command.status, &msg.sender_name)
            .await?;
        match origin {
            Some(origin_chat) => {
                self.transport
                    .send_text(
                        &msg.chat_id,
                        &messages::status_updated_group(
                            &command.protocol,
                            command.status,
                            &msg.sender_name,
                        ),
                    )
                    .await?;
                self.transport
                    .send_text(
                        &origin_chat,
                        &messages::status_updated_requester(&command.protocol, command.status),
                    )
                    .await
            }
            None => {
                warn!(protocol = %command.protocol, "Status command for unknown protocol");
                self.transport
                    .send_text(
                        &msg.chat_id,
                        &format!("⚠️ Chamado {} não encontrado.", command.protocol),
                    )
                    .await
            }
        }
    }

    async fn commit_ticket(&self, msg: &IncomingMessage) -> Result<()> {
        let Some(draft) = self.sessions.take_pending_ticket(&msg.chat_id) else {
            return Ok(());
        };
        let ticket = Ticket {
            id: uuid::Uuid::new_v4(),
            protocol: self.protocols.generate(),
            requester_name: msg.sender_name.clone(),
            requester_phone: msisdn_of(&msg.chat_id).to_string(),
            description: draft.description,
            category: draft.category,
            status: TicketStatus::Aberto,
            origin_chat_id: msg.chat_id.clone(),
            assigned_responder: None,
            opened_at: chrono::Utc::now(),
        };
        // A ledger outage must not lose the requester's confirmation.
        if let Err(e) = self.ledger.append(&ticket).await {
            warn!(protocol = %ticket.protocol, error = %e, "Failed to append ticket to ledger");
        }
        self.transport
            .send_text(
                &msg.chat_id,
                &messages::ticket_registered(&ticket.protocol, ticket.category),
            )
            .await?;
        if !self.routing.support_group_id.is_empty() {
            self.transport
                .send_text(
                    &self.routing.support_group_id,
                    &messages::support_group_menu(&ticket),
                )
                .await?;
        }
        self.sessions.touch(&msg.chat_id);
        Ok(())
    }

    async fn start_billing_flow(&self, msg: &IncomingMessage, question: &str) -> Result<()> {
        let Some(billing) = &self.billing else {
            return Ok(());
        };
        let msisdn = msisdn_of(&msg.chat_id);
        match billing.list_documents(msisdn).await {
            Ok((documents, _)) => {
                let documents =
                    narrow_documents(question, documents, chrono::Local::now().date_naive());
                if documents.is_empty() {
                    self.sessions.touch(&msg.chat_id);
                    return self
                        .transport
                        .send_text(&msg.chat_id, messages::BILLING_NONE_FOUND)
                        .await;
                }
                let listing = format_document_list(&documents);
                self.sessions.set_pending_billing(&msg.chat_id, documents);
                self.sessions.touch(&msg.chat_id);
                self.transport.send_text(&msg.chat_id, &listing).await
            }
            Err(CiptError::MsisdnNotAssociated(_)) => {
                self.transport
                    .send_text(&msg.chat_id, messages::BILLING_NOT_ASSOCIATED)
                    .await
            }
            Err(e) => {
                warn!(error = %e, "Billing listing failed");
                self.transport
                    .send_text(&msg.chat_id, messages::BILLING_UNAVAILABLE)
                    .await
            }
        }
    }

    async fn emit_selected_document(&self, msg: &IncomingMessage, choice: usize) -> Result<()> {
        let Some(billing) = &self.billing else {
            return Ok(());
        };
        let Some(documents) = self.sessions.take_pending_billing(&msg.chat_id) else {
            return Ok(());
        };
        if choice == 0 || choice > documents.len() {
            self.sessions.set_pending_billing(&msg.chat_id, documents);
            return self
                .transport
                .send_text(&msg.chat_id, messages::BILLING_INVALID_CHOICE)
                .await;
        }
        let document = &documents[choice - 1];
        match billing.emit(&document.id, msisdn_of(&msg.chat_id)).await {
            Ok(emitted) => {
                self.sessions.touch(&msg.chat_id);
                self.transport
                    .send_text(&msg.chat_id, &format_emitted(&emitted))
                    .await
            }
            Err(e) => {
                warn!(document = %document.id, error = %e, "Billing emit failed");
                self.transport
                    .send_text(&msg.chat_id, messages::BILLING_UNAVAILABLE)
                    .await
            }
        }
    }

    async fn answer_question(&self, msg: &IncomingMessage, question: &str) -> Result<()> {
        self.sessions
            .push_history(&msg.chat_id, ChatMessage::user(question));

        // Retrieval failure degrades to an answer without grounding context.
        let context = match self.retriever.retrieve(question).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "Retrieval failed, composing without context");
                String::new()
            }
        };

        let history = self.sessions.history(&msg.chat_id);
        let reply = match self.composer.compose(question, &context, &history).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Answer composition failed");
                return self
                    .transport
                    .send_text(&msg.chat_id, messages::INTERNAL_ERROR)
                    .await;
            }
        };
        self.sessions
            .push_history(&msg.chat_id, ChatMessage::assistant(&reply));

        self.maybe_send_contact(msg, question, &reply).await;

        let full_reply = format!("{}{}", reply, messages::suggestion_footer());
        self.transport.send_text(&msg.chat_id, &full_reply).await?;
        self.sessions.touch(&msg.chat_id);
        Ok(())
    }

    /// Best-effort human handoff: at most one contact card per session.
    async fn maybe_send_contact(&self, msg: &IncomingMessage, question: &str, reply: &str) {
        if self.sessions.contact_sent(&msg.chat_id) {
            return;
        }
        let wants_contact = needs_human_contact(self.classifier_model.as_ref(), question, reply)
            .await
            .unwrap_or(false);
        if !wants_contact {
            return;
        }
        let lowered = reply.to_lowercase();
        let card = if lowered.contains("auditório") {
            Some((
                self.routing.auditorium_contact_name.as_str(),
                self.routing.auditorium_contact_phone.as_str(),
            ))
        } else if lowered.contains("sala de reunião") {
            Some((
                self.routing.reception_contact_name.as_str(),
                self.routing.reception_contact_phone.as_str(),
            ))
        } else {
            None
        };
        if let Some((name, phone)) = card {
            if let Err(e) =
                send_contact_with_fallback(self.transport.as_ref(), &msg.chat_id, name, phone).await
            {
                warn!(error = %e, "Contact send failed");
            }
        }
        self.sessions.mark_contact_sent(&msg.chat_id);
        debug!(chat_id = %msg.chat_id, "Human-contact decision recorded");
    }

    fn log_message(&self, name: &str, text: &str) {
        let Some(path) = &self.message_log_path else {
            return;
        };
        let line = format!(
            "[{}] 👤 {}: 💬 {}\n",
            chrono::Local::now().format("%d/%m/%Y %H:%M:%S"),
            name,
            text
        );
        let written = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = written {
            warn!(error = %e, "Failed to append message log");
        }
    }
}

/// Phone number part of a chat id (`5582...@s.whatsapp.net`).
fn msisdn_of(chat_id: &str) -> &str {
    chat_id.split('@').next().unwrap_or(chat_id)
}
