//! Prompt builders for the rewrite and answer steps.

use ai_llm_service::ChatMessage;

use crate::{memory::Turn, retrieve::RetrievedDoc};

/// System instructions for turning a follow-up into a standalone question.
pub const REWRITE_SYSTEM: &str = "\
Tu tarea es reformular preguntas para mejorar la recuperación de información en un sistema RAG. \
Recibes el historial de la conversación y la última pregunta del usuario, que puede depender de ese historial. \
Reescribe la pregunta para que se entienda por sí sola, sin necesidad del historial. \
No la respondas. Si ya es clara y autónoma, devuélvela sin cambios. \
Si necesita contexto previo, incorpóralo de forma breve y coherente.";

/// Answer template; `{context}` and `{question}` are substituted verbatim.
pub const ANSWER_TEMPLATE: &str = "\
Eres un asistente llamado \"Ingenierin\", que atiende las consultas de estudiantes de una fundación \
dedicada a formar profesionales emprendedores en tiendas, minimarkets y pequeños negocios.
Tu propósito es orientar de forma clara, útil y específica sobre logística, gestión de inventario, \
bodegaje y reabastecimiento. Al responder:
1. Usa un lenguaje formal pero cercano y amigable, propio de un entorno educativo y práctico.
2. Incluye emojis relevantes para que las respuestas sean más visuales y comprensibles.
3. Limítate a logística, finanzas, inventario, bodegaje y reabastecimiento. \
Si la consulta trata otro tema, indica amablemente y en pocas palabras que no puedes responderla.
{context}


Pregunta: {question}
Respuesta:";

/// Messages for the rewrite step: system, prior turns, then the new question.
pub fn build_rewrite_messages(history: &[Turn], question: &str) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(history.len() * 2 + 2);
    out.push(ChatMessage::system(REWRITE_SYSTEM));
    for t in history {
        out.push(ChatMessage::user(t.question.as_str()));
        out.push(ChatMessage::assistant(t.answer.as_str()));
    }
    out.push(ChatMessage::user(question.trim()));
    out
}

/// Fills [`ANSWER_TEMPLATE`] with the retrieved documents and the question.
///
/// Documents are joined by a blank line in ranking order.
pub fn build_answer_prompt(docs: &[RetrievedDoc], question: &str) -> String {
    let context = docs
        .iter()
        .map(|d| d.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    // Substitute `{question}` first so braces inside documents are left alone.
    ANSWER_TEMPLATE
        .replacen("{question}", question.trim(), 1)
        .replacen("{context}", &context, 1)
}
