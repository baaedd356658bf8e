//! Reply copy and keyword lists.
//!
//! All user-facing text lives here, in the Portuguese the assistant speaks.

use rand::seq::IndexedRandom;

use cipt_core::types::{Ticket, TicketCategory, TicketStatus};

pub const GREETING_KEYWORDS: [&str; 7] =
    ["oi", "olá", "ola", "bom dia", "boa tarde", "boa noite", "e aí"];

pub const FAREWELL_KEYWORDS: [&str; 6] =
    ["obrigado", "obrigada", "valeu", "tchau", "até mais", "flw"];

const GREETING_TEMPLATES: [&str; 5] = [
    "Olá, {nome}! 👋",
    "Oi, {nome}! Tudo bem? 🙂",
    "Seja bem-vindo(a), {nome}! 🌟",
    "Oi oi, {nome}! Como posso te ajudar hoje? 🤗",
    "Prazer falar com você, {nome}! 🙌",
];

const SUGGESTION_POOL: [&str; 10] = [
    "Como faço para reservar o auditório?",
    "Quais são as penalidades por descumprimento das regras?",
    "Posso levar animais para o CIPT?",
    "Quais são os horários de funcionamento?",
    "Como funciona o estacionamento do CIPT?",
    "Como faço meu cadastro para ter acesso ao espaço?",
    "Qual é a diferença entre o auditório e as salas de reunião?",
    "Quem pode usar os laboratórios do CIPT?",
    "Quais são os documentos necessários para reservar um espaço?",
    "Como funciona o restaurante-escola?",
];

pub const CLOSING_NOTICE: &str =
    "Encerrando seu atendimento por inatividade. Se precisar, é só chamar! 😉";

pub const INTERNAL_ERROR: &str =
    "Ops! Ocorreu um erro interno e não consegui processar sua solicitação. Tente novamente.";

pub const TICKET_CANCELLED: &str = "❌ Chamado cancelado.";

pub const BILLING_EXITED: &str = "Certo, saímos da consulta de guias. Se precisar, é só pedir de novo. 🙂";

pub const BILLING_NONE_FOUND: &str =
    "✅ Boa notícia: não encontrei nenhuma guia em aberto para o seu número.";

pub const BILLING_NOT_ASSOCIATED: &str =
    "Não encontrei o seu número entre os cadastros de cobrança. Se você acha que isso é um engano, procure a administração do CIPT.";

pub const BILLING_UNAVAILABLE: &str =
    "No momento não consegui consultar as guias de pagamento. Tente novamente em alguns minutos.";

pub const BILLING_INVALID_CHOICE: &str =
    "Número inválido. Responda com o *número* de uma das guias da lista ou *sair* para cancelar.";

/// Randomized greeting with the contact's display name.
pub fn greeting(name: &str) -> String {
    let mut rng = rand::rng();
    let template = GREETING_TEMPLATES
        .choose(&mut rng)
        .unwrap_or(&GREETING_TEMPLATES[0]);
    template.replace("{nome}", name)
}

/// Greeting fast-path reply: salutation plus the capability blurb.
pub fn greeting_reply(name: &str) -> String {
    format!(
        "{}\nSou a *IA do CIPT*! Posso te ajudar com dúvidas sobre acesso, reservas de espaços, regras de convivência e tudo mais do nosso regimento interno.",
        greeting(name)
    )
}

pub fn farewell_reply(name: &str) -> String {
    format!(
        "De nada, {}! Foi um prazer ajudar 🤗 Se precisar de algo mais, é só chamar.",
        name
    )
}

/// Footer with three suggested questions drawn from the pool.
pub fn suggestion_footer() -> String {
    let mut rng = rand::rng();
    let picked: Vec<&&str> = SUGGESTION_POOL.choose_multiple(&mut rng, 3).collect();
    format!(
        "\nℹ️ Você também pode me perguntar, por exemplo:\n- {}\n- {}\n- {}",
        picked[0], picked[1], picked[2]
    )
}

pub fn ticket_confirmation_prompt(description: &str, category: TicketCategory) -> String {
    format!(
        "👀 Percebi que você quer registrar um chamado. Confirma?\n\n📌 Descrição: \"{}\"\n📂 Categoria: {}\n\nResponda com *\"Sim\"* para confirmar ou *\"Não\"* para cancelar.",
        description, category
    )
}

pub fn ticket_registered(protocol: &str, category: TicketCategory) -> String {
    format!(
        "✅ Chamado registrado com sucesso!\n📌 Protocolo: {}\n📂 Categoria: {}\n\nA equipe já foi notificada.",
        protocol, category
    )
}

/// Notification posted to the support group for a new ticket.
pub fn support_group_menu(ticket: &Ticket) -> String {
    format!(
        "🚨 *Novo chamado aberto!* 🚨\n\n*Protocolo:* {}\n*Usuário:* {}\n*Telefone:* {}\n*Categoria:* {}\n*Descrição:* {}\n\n-------------------------------------\n👉 *RESPONDA a esta mensagem com o número da opção:*\n*1* - Em Atendimento\n*2* - Concluído\n*3* - Rejeitado",
        ticket.protocol,
        ticket.requester_name,
        ticket.requester_phone,
        ticket.category,
        ticket.description
    )
}

pub fn status_updated_group(protocol: &str, status: TicketStatus, responder: &str) -> String {
    format!(
        "{} Chamado {} atualizado para *{}* por {}.",
        status.emoji(),
        protocol,
        status,
        responder
    )
}

pub fn status_updated_requester(protocol: &str, status: TicketStatus) -> String {
    format!(
        "{} Seu chamado {} foi atualizado para *{}*.",
        status.emoji(),
        protocol,
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_greeting_uses_name() {
        for _ in 0..20 {
            assert!(greeting("Maria").contains("Maria"));
        }
    }

    #[test]
    fn test_greeting_reply_has_blurb() {
        let reply = greeting_reply("Maria");
        assert!(reply.contains("IA do CIPT"));
        assert!(reply.contains("regimento interno"));
    }

    #[test]
    fn test_suggestion_footer_picks_three_distinct() {
        for _ in 0..20 {
            let footer = suggestion_footer();
            let lines: Vec<&str> = footer
                .lines()
                .filter(|l| l.starts_with("- "))
                .collect();
            assert_eq!(lines.len(), 3);
            assert_ne!(lines[0], lines[1]);
            assert_ne!(lines[1], lines[2]);
            assert_ne!(lines[0], lines[2]);
            for line in lines {
                assert!(SUGGESTION_POOL.contains(&&line[2..]));
            }
        }
    }

    #[test]
    fn test_support_menu_carries_protocol_for_command_parsing() {
        let ticket = Ticket {
            id: uuid::Uuid::new_v4(),
            protocol: "CH-48291".to_string(),
            requester_name: "Maria".to_string(),
            requester_phone: "5582999990000".to_string(),
            description: "internet caiu".to_string(),
            category: TicketCategory::InternetRede,
            status: TicketStatus::Aberto,
            origin_chat_id: "5582999990000@s.whatsapp.net".to_string(),
            assigned_responder: None,
            opened_at: Utc::now(),
        };
        let menu = support_group_menu(&ticket);
        assert_eq!(
            cipt_ticket::extract_protocol(&menu).as_deref(),
            Some("CH-48291")
        );
        assert!(menu.contains("*1* - Em Atendimento"));
    }

    #[test]
    fn test_status_messages() {
        let group = status_updated_group("CH-1", TicketStatus::Concluido, "João");
        assert!(group.starts_with("✅"));
        assert!(group.contains("Concluído"));
        assert!(group.contains("João"));

        let requester = status_updated_requester("CH-1", TicketStatus::EmAtendimento);
        assert!(requester.starts_with("📌"));
        assert!(requester.contains("CH-1"));
    }
}
