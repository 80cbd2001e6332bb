//! Portuguese stopwords, accent-folded so they match transliterated tokens.

use std::collections::HashSet;
use std::sync::LazyLock;

const PORTUGUESE: &[&str] = &[
    "a", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "ate", "com",
    "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois", "do", "dos", "e",
    "ela", "elas", "ele", "eles", "em", "entre", "era", "eram", "eramos", "essa", "essas",
    "esse", "esses", "esta", "estamos", "estao", "estar", "estas", "estava", "estavam",
    "estavamos", "este", "esteja", "estejam", "estejamos", "estes", "esteve", "estive",
    "estivemos", "estiver", "estivera", "estiveram", "estiveramos", "estiverem", "estivermos",
    "estivesse", "estivessem", "estivessemos", "estou", "eu", "foi", "fomos", "for", "fora",
    "foram", "foramos", "forem", "formos", "fosse", "fossem", "fossemos", "fui", "ha", "haja",
    "hajam", "hajamos", "hao", "havemos", "haver", "hei", "houve", "houvemos", "houver",
    "houvera", "houveram", "houveramos", "houverao", "houverei", "houverem",
    "houveremos", "houveria", "houveriam", "houveriamos", "houvermos", "houvesse",
    "houvessem", "houvessemos", "isso", "isto", "ja", "lhe", "lhes", "mais", "mas", "me",
    "mesmo", "meu", "meus", "minha", "minhas", "muito", "na", "nao", "nas", "nem", "no", "nos",
    "nossa", "nossas", "nosso", "nossos", "num", "numa", "o", "os", "ou", "para", "pela",
    "pelas", "pelo", "pelos", "por", "qual", "quando", "que", "quem", "sao", "se", "seja",
    "sejam", "sejamos", "sem", "ser", "sera", "serao", "serei", "seremos", "seria", "seriam",
    "seriamos", "seu", "seus", "so", "somos", "sou", "sua", "suas", "tambem", "te", "tem",
    "temos", "tenha", "tenham", "tenhamos", "tenho", "tera", "terao", "terei", "teremos",
    "teria", "teriam", "teriamos", "teu", "teus", "teve", "tinha", "tinham", "tinhamos",
    "tive", "tivemos", "tiver", "tivera", "tiveram", "tiveramos", "tiverem", "tivermos",
    "tivesse", "tivessem", "tivessemos", "tu", "tua", "tuas", "um", "uma", "voce", "voces",
    "vos",
];

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| PORTUGUESE.iter().copied().collect());

/// Whether `token` (lowercase, unaccented) is a Portuguese stopword.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}
