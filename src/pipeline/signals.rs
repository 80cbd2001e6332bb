//! Keyword tables for the lexical scorer.
//!
//! Keywords are matched as literal substrings of lowercased text, so
//! multi-word phrases and accented forms are written exactly as they appear
//! in mail.

/// Which way a signal pushes the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

/// Keyword family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Ask,
    Action,
    Status,
    Attachment,
    Date,
    Greeting,
    SmallTalk,
}

/// Families in scan order.
pub const SCAN_ORDER: [SignalKind; 7] = [
    SignalKind::Ask,
    SignalKind::Action,
    SignalKind::Status,
    SignalKind::Attachment,
    SignalKind::Date,
    SignalKind::Greeting,
    SignalKind::SmallTalk,
];

const ASK: &[&str] = &[
    "poderia",
    "pode",
    "poderiam",
    "poderia me ajudar",
    "pode verificar",
    "como faço",
    "como proceder",
    "posso",
    "consigo",
    "tem como",
    "é possível",
    "poderia informar",
    "qual o status",
    "preciso de",
    "segue em anexo",
    "consegue",
    "pode me enviar",
];

const ACTION: &[&str] = &[
    "atualizar",
    "regularizar",
    "concluir",
    "autorizar",
    "confirmar",
    "validar",
    "emitir",
    "reativar",
    "ajustar",
    "corrigir",
    "revisar",
    "enviar",
    "agendar",
    "cancelar",
    "solicitar",
    "abrir chamado",
    "responder",
    "retornar",
    "providenciar",
];

const STATUS: &[&str] = &[
    "status",
    "andamento",
    "previsão",
    "prazo",
    "pendência",
    "aberto",
    "em análise",
    "fila",
    "retorno",
    "protocolo",
    "chamado",
    "ticket",
];

const ATTACHMENT: &[&str] = &["anexo", "anexei", "em anexo", "segue anexo", "segue em anexo"];

const DATE: &[&str] = &[
    "hoje",
    "amanhã",
    "vencimento",
    "até",
    "prazo",
    "data",
    "segunda",
    "terça",
    "quarta",
    "quinta",
    "sexta",
    "sábado",
    "domingo",
    "dia",
    "às",
    "as",
    "hora",
];

const GREETING: &[&str] = &[
    "bom dia",
    "boa tarde",
    "boa noite",
    "feliz natal",
    "feliz ano novo",
    "boas festas",
    "parabéns",
    "obrigado",
    "obrigada",
    "agradeço",
    "valeu",
];

const SMALL_TALK: &[&str] = &[
    "apenas para avisar",
    "somente para informar",
    "sem necessidade de retorno",
    "quando puder",
    "obrigado pelo atendimento",
    "obrigada pelo atendimento",
];

impl SignalKind {
    pub fn weight(self) -> f64 {
        match self {
            Self::Ask | Self::Action => 1.2,
            Self::Status | Self::Attachment => 1.0,
            Self::Date => 0.6,
            Self::Greeting | Self::SmallTalk => 1.0,
        }
    }

    pub fn polarity(self) -> Polarity {
        match self {
            Self::Greeting | Self::SmallTalk => Polarity::Negative,
            _ => Polarity::Positive,
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Ask => ASK,
            Self::Action => ACTION,
            Self::Status => STATUS,
            Self::Attachment => ATTACHMENT,
            Self::Date => DATE,
            Self::Greeting => GREETING,
            Self::SmallTalk => SMALL_TALK,
        }
    }
}

/// A keyword tagged with its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTerm {
    pub keyword: &'static str,
    pub kind: SignalKind,
}

impl SignalTerm {
    pub fn weight(&self) -> f64 {
        self.kind.weight()
    }
}

/// Every keyword, family by family in scan order.
pub fn signal_terms() -> impl Iterator<Item = SignalTerm> {
    SCAN_ORDER.into_iter().flat_map(|kind| {
        kind.keywords()
            .iter()
            .map(move |&keyword| SignalTerm { keyword, kind })
    })
}
