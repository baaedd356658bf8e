//! Support-group responder commands.
//!
//! A responder replies to the ticket notification message (quoting it) with
//! a single option digit. The quoted text carries the protocol; the reply
//! body carries the option.

use std::sync::OnceLock;

use regex::Regex;

use cipt_core::types::TicketStatus;

fn protocol_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The notification writes the label in WhatsApp bold: `*Protocolo:* CH-…`.
    RE.get_or_init(|| Regex::new(r"Protocolo:\*?\s*(CH-\d+)").unwrap())
}

/// Extract the ticket protocol from a quoted notification message.
pub fn extract_protocol(quoted_text: &str) -> Option<String> {
    protocol_regex()
        .captures(quoted_text)
        .map(|caps| caps[1].to_string())
}

/// A parsed status command from the support group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderCommand {
    pub protocol: String,
    pub status: TicketStatus,
}

fn parse_option(body: &str) -> Option<TicketStatus> {
    match body.trim() {
        "1" => Some(TicketStatus::EmAtendimento),
        "2" => Some(TicketStatus::Concluido),
        "3" => Some(TicketStatus::Rejeitado),
        _ => None,
    }
}

/// Parse a quoted-reply pair into a status command.
///
/// `sender` must be on the responder allow-list; an empty list admits any
/// member of the support group.
pub fn parse_responder_command(
    quoted_text: &str,
    body: &str,
    sender: &str,
    responders: &[String],
) -> Option<ResponderCommand> {
    if !responders.is_empty() && !responders.iter().any(|r| r == sender) {
        return None;
    }
    let protocol = extract_protocol(quoted_text)?;
    let status = parse_option(body)?;
    Some(ResponderCommand { protocol, status })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = "🚨 *Novo chamado aberto!* 🚨\n\n*Protocolo:* CH-48291\n*Usuário:* Maria";
    const PLAIN: &str = "Protocolo: CH-48291";

    #[test]
    fn test_extract_protocol_from_menu() {
        assert_eq!(extract_protocol(MENU).as_deref(), Some("CH-48291"));
        assert_eq!(extract_protocol(PLAIN).as_deref(), Some("CH-48291"));
    }

    #[test]
    fn test_extract_protocol_bold_label() {
        assert_eq!(
            extract_protocol("*Protocolo:* CH-48291").as_deref(),
            Some("CH-48291")
        );
        assert_eq!(
            extract_protocol("*Protocolo:*CH-48291").as_deref(),
            Some("CH-48291")
        );
    }

    #[test]
    fn test_extract_protocol_absent() {
        assert_eq!(extract_protocol("mensagem qualquer"), None);
        assert_eq!(extract_protocol("Protocolo: XY-123"), None);
    }

    #[test]
    fn test_parse_options() {
        assert_eq!(parse_option("1"), Some(TicketStatus::EmAtendimento));
        assert_eq!(parse_option("2"), Some(TicketStatus::Concluido));
        assert_eq!(parse_option("3"), Some(TicketStatus::Rejeitado));
        assert_eq!(parse_option(" 2 "), Some(TicketStatus::Concluido));
        assert_eq!(parse_option("4"), None);
        assert_eq!(parse_option("sim"), None);
    }

    #[test]
    fn test_parse_command_full() {
        let cmd = parse_responder_command(PLAIN, "2", "558211112222", &[]).unwrap();
        assert_eq!(cmd.protocol, "CH-48291");
        assert_eq!(cmd.status, TicketStatus::Concluido);
    }

    #[test]
    fn test_parse_command_requires_protocol_and_option() {
        assert_eq!(parse_responder_command("sem protocolo", "1", "x", &[]), None);
        assert_eq!(parse_responder_command(PLAIN, "obrigado", "x", &[]), None);
    }

    #[test]
    fn test_allow_list_enforced() {
        let responders = vec!["558211112222".to_string()];
        assert!(parse_responder_command(PLAIN, "1", "558211112222", &responders).is_some());
        assert!(parse_responder_command(PLAIN, "1", "558233334444", &responders).is_none());
    }

    #[test]
    fn test_empty_allow_list_admits_anyone() {
        assert!(parse_responder_command(PLAIN, "3", "qualquer", &[]).is_some());
    }
}
