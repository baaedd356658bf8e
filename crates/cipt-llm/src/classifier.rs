//! Intent classifiers.
//!
//! Two small structured-output calls: whether a message is a facility
//! ticket (and its category), and whether an exchange should be handed to a
//! human contact. Both return explicit `Result`s; degrade decisions belong
//! to the call site.

use serde::Deserialize;
use tracing::debug;

use cipt_core::error::{CiptError, Result};
use cipt_core::types::{ChatMessage, TicketCategory};

use crate::client::DynChatModel;

/// Outcome of the ticket intent classification.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketClassification {
    NotTicket,
    Ticket(TicketCategory),
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(rename = "ehChamado")]
    is_ticket: String,
    #[serde(rename = "categoria")]
    category: String,
}

fn classifier_instruction() -> String {
    let labels: Vec<&str> = TicketCategory::ALL.iter().map(|c| c.label()).collect();
    format!(
        "Sua tarefa é analisar a mensagem do usuário e responder em JSON: \
         {{\"ehChamado\":\"SIM ou NAO\",\"categoria\":\"Categoria Sugerida\"}}. \
         Categorias: {}. \
         Se não for um chamado, use {{\"ehChamado\":\"NAO\",\"categoria\":\"N/A\"}}.",
        labels.join(", ")
    )
}

/// Classify whether `text` asks to open a facility ticket.
///
/// Unknown category labels from the model fall back to
/// `Administrativo / Outros` rather than failing the whole classification.
pub async fn classify_ticket(
    model: &dyn DynChatModel,
    text: &str,
) -> Result<TicketClassification> {
    let messages = [
        ChatMessage::system(classifier_instruction()),
        ChatMessage::user(text),
    ];
    let reply = model.complete_boxed(&messages, 0.0, 50).await?;

    let raw: RawClassification = serde_json::from_str(reply.trim())
        .map_err(|e| CiptError::Classifier(format!("Unparseable classification '{}': {}", reply, e)))?;

    if !raw.is_ticket.trim().eq_ignore_ascii_case("SIM") {
        return Ok(TicketClassification::NotTicket);
    }
    let category =
        TicketCategory::from_label(&raw.category).unwrap_or(TicketCategory::Administrativo);
    debug!(category = %category, "Message classified as ticket");
    Ok(TicketClassification::Ticket(category))
}

/// Decide whether the last exchange calls for a human contact card.
pub async fn needs_human_contact(
    model: &dyn DynChatModel,
    question: &str,
    answer: &str,
) -> Result<bool> {
    let messages = [
        ChatMessage::system(
            "A resposta do assistente indica necessidade de contato humano \
             (reservas, problemas)? Responda só SIM ou NÃO.",
        ),
        ChatMessage::user(format!("Usuário: {}\nAssistente: {}", question, answer)),
    ];
    let reply = model.complete_boxed(&messages, 0.0, 5).await?;
    Ok(reply.trim().to_uppercase().contains("SIM"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockChatModel;

    #[tokio::test]
    async fn test_classify_ticket_positive() {
        let model =
            MockChatModel::with_replies([r#"{"ehChamado":"SIM","categoria":"Energia Elétrica"}"#]);
        let result = classify_ticket(&model, "a tomada da sala 12 queimou")
            .await
            .unwrap();
        assert_eq!(
            result,
            TicketClassification::Ticket(TicketCategory::EnergiaEletrica)
        );
    }

    #[tokio::test]
    async fn test_classify_ticket_negative() {
        let model = MockChatModel::with_replies([r#"{"ehChamado":"NAO","categoria":"N/A"}"#]);
        let result = classify_ticket(&model, "qual o horário de funcionamento?")
            .await
            .unwrap();
        assert_eq!(result, TicketClassification::NotTicket);
    }

    #[tokio::test]
    async fn test_classify_unknown_category_falls_back() {
        let model =
            MockChatModel::with_replies([r#"{"ehChamado":"SIM","categoria":"Jardinagem"}"#]);
        let result = classify_ticket(&model, "a grama está alta").await.unwrap();
        assert_eq!(
            result,
            TicketClassification::Ticket(TicketCategory::Administrativo)
        );
    }

    #[tokio::test]
    async fn test_classify_garbage_reply_is_error() {
        let model = MockChatModel::with_replies(["desculpe, não entendi"]);
        assert!(classify_ticket(&model, "algo").await.is_err());
    }

    #[tokio::test]
    async fn test_classify_instruction_lists_all_categories() {
        let model = MockChatModel::with_replies([r#"{"ehChamado":"NAO","categoria":"N/A"}"#]);
        classify_ticket(&model, "oi").await.unwrap();
        let system = model.requests()[0][0].content.clone();
        for category in TicketCategory::ALL {
            assert!(system.contains(category.label()), "missing {}", category);
        }
    }

    #[tokio::test]
    async fn test_needs_human_contact_yes() {
        let model = MockChatModel::with_replies(["SIM"]);
        assert!(needs_human_contact(&model, "como reservo?", "envie um ofício")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_needs_human_contact_no() {
        let model = MockChatModel::with_replies(["NÃO"]);
        assert!(!needs_human_contact(&model, "qual o horário?", "das 8h às 18h")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_needs_human_contact_case_insensitive() {
        let model = MockChatModel::with_replies(["sim."]);
        assert!(needs_human_contact(&model, "q", "a").await.unwrap());
    }
}
