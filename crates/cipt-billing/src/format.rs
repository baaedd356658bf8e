//! Display formatting for billing replies.

use cipt_core::types::{BillingDocument, EmittedDocument};

fn format_amount(amount: f64) -> String {
    // Brazilian currency formatting: comma as the decimal separator.
    format!("R$ {:.2}", amount).replace('.', ",")
}

/// Numbered selection list of unpaid documents.
pub fn format_document_list(documents: &[BillingDocument]) -> String {
    let mut out = String::from("📄 Encontrei as seguintes guias em aberto:\n");
    for (index, document) in documents.iter().enumerate() {
        out.push_str(&format!(
            "\n*{}* - Competência {} | Vencimento {} | {}",
            index + 1,
            document.competence(),
            document.due_date,
            format_amount(document.amount)
        ));
    }
    out.push_str("\n\nResponda com o *número* da guia desejada ou *sair* para cancelar.");
    out
}

/// Reply for an emitted document: payment line, due date, amount and the
/// PDF link when available.
pub fn format_emitted(emitted: &EmittedDocument) -> String {
    let mut out = format!(
        "✅ Guia emitida!\n\n📅 Competência: {}\n🗓️ Vencimento: {}\n💰 Valor: {}\n\n🔢 Linha digitável:\n{}",
        emitted.competence,
        emitted.due_date,
        format_amount(emitted.amount),
        emitted.payment_line
    );
    if let Some(url) = &emitted.pdf_url {
        out.push_str(&format!("\n\n📎 PDF: {}", url));
    }
    out
}
