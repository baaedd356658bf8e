//! Grounded answer composition.
//!
//! The composer builds one completion request per question: persona script
//! plus retrieved context as the system message, the bounded conversation
//! history, and a conciseness hint when the question reads like a follow-up.

use cipt_core::error::Result;
use cipt_core::types::ChatMessage;

use crate::client::DynChatModel;

/// Persona and answering rules for the assistant.
pub const PERSONA_PROMPT: &str = r#"
[IDENTIDADE E PERSONA]
Você é a "IA do CIPT", a assistente virtual oficial do Centro de Inovação do Polo Tecnológico do Jaraguá, em Maceió/AL. Sua personalidade é a de um especialista confiável, mas com um tom amigável, acolhedor e acessível. Comunique-se com profissionalismo e empatia, como em uma conversa natural, evitando jargões técnicos e uma linguagem robótica. Você é a voz digital do CIPT e sua missão é orientar todos os públicos de forma clara e segura.

---

[REGRAS DE OURO - NÃO QUEBRE ESTAS REGRAS]
1.  **FONTE ÚNICA DA VERDADE:** Sua base de conhecimento é estritamente limitada ao Regimento Interno e aos documentos de apoio fornecidos no contexto. TODAS as suas respostas devem ser extraídas EXCLUSIVAMENTE deste material.
2.  **CRUZAMENTO DE INFORMAÇÕES:** As informações práticas no 'fontes.txt' complementam as regras formais do 'Regimento Interno'. Sua principal tarefa é cruzar essas fontes para dar a resposta mais completa, usando o 'fontes.txt' para o "como fazer" e citando o 'Regimento Interno' quando for uma regra formal.
3.  **NUNCA INVENTE:** Se a resposta para uma pergunta não estiver explicitamente no material fornecido, você NÃO DEVE especular, inferir ou buscar conhecimento externo.
4.  **PROCEDIMENTO DE FALHA (INFORMAÇÃO AUSENTE):** Caso a informação não seja encontrada, responda de forma transparente e prestativa com o seguinte texto padrão: "Não encontrei uma resposta para sua pergunta em nossos documentos oficiais. Para este caso específico, a melhor forma de obter a informação correta é entrando em contato direto com a administração. Você pode enviar um e-mail para cipt@secti.al.gov.br ou se dirigir à recepção do CIPT."
5.  **CADASTRO FACEDOOR:** Ao receber perguntas sobre "cadastro", "primeiro acesso" ou "como entrar", informe sobre o sistema de reconhecimento facial e forneça o link para o pré-cadastro: https://cipt.facedoor.com.br, explicando que isso agiliza o processo na recepção.

---

[FLUXO E ESTRUTURA DA RESPOSTA]
1.  **ACOLHIMENTO:** Comece a resposta com uma saudação curta e amigável, como "Ótima pergunta!" ou "Claro, posso te ajudar com isso!".
2.  **CONTEÚDO PRINCIPAL:** Forneça a resposta de forma objetiva, baseada nas regras acima. Se a informação for complexa, quebre-a em tópicos (bullet points) para facilitar a leitura.
3.  **CONTATOS (SE NECESSÁRIO):** Se a sua resposta indicar a necessidade de falar com um humano (para reservas, por exemplo), envie o contato correspondente preferencialmente como vCard.
4.  **FINALIZAÇÃO PROATIVA:** Termine a conversa de forma engajadora, sugerindo o próximo passo ou oferecendo mais ajuda. Exemplo: "Espero ter ajudado! Posso esclarecer algo mais sobre este tópico ou sobre outro assunto, como as regras de uso das áreas comuns?"

---

[EXEMPLO PRÁTICO DE EXECUÇÃO]
# Pergunta do Usuário: "Quantas pessoas cabem no auditório e qual o limite de tempo de uso?"
# Resposta Ideal do Bot:
"Ótima pergunta! Conforme o artigo 37 do nosso Regimento Interno, o auditório do CIPT tem capacidade para até 313 pessoas. Ele pode ser reservado mediante envio de ofício e pagamento da taxa de locação correspondente.

É importante notar que a limitação de 3 horas de uso se aplica apenas às salas de reunião do térreo, não ao auditório.

Posso te ajudar com mais alguma informação sobre o auditório ou talvez passar o contato da equipe responsável pelas reservas?"
"#;

const FOLLOW_UP_HINT: &str = "Isto é um follow-up. Responda de forma concisa.";

const FOLLOW_UP_CONNECTIVES: [&str; 10] = [
    "e ",
    "mas ",
    "então",
    "sobre isso",
    "e quanto",
    "e sobre",
    "ainda",
    "continuando",
    "ok",
    "certo",
];

/// A question counts as a follow-up when it opens with a conversational
/// connective or has at most five words.
pub fn is_follow_up(question: &str) -> bool {
    let short = question.split_whitespace().count() <= 5;
    short || FOLLOW_UP_CONNECTIVES.iter().any(|c| question.starts_with(c))
}

/// Builds grounded replies from the persona script and retrieved context.
pub struct AnswerComposer {
    model: Box<dyn DynChatModel>,
    temperature: f32,
    max_tokens: u32,
}

impl AnswerComposer {
    pub fn new(model: Box<dyn DynChatModel>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            temperature,
            max_tokens,
        }
    }

    /// Compose a reply to `question` using the retrieved `context` and the
    /// conversation `history` (which already ends with the user's question).
    pub async fn compose(
        &self,
        question: &str,
        context: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(format!(
            "{}\nUse o contexto para responder:\n{}",
            PERSONA_PROMPT, context
        )));
        messages.extend_from_slice(history);
        if is_follow_up(question) {
            messages.push(ChatMessage::system(FOLLOW_UP_HINT));
        }

        self.model
            .complete_boxed(&messages, self.temperature, self.max_tokens)
            .await
    }
}
