//! Portuguese word lists used by the feature extractor and detectors
//!
//! Multi-word markers ("uma vez que", "por exemplo") are matched as token
//! sequences against lowercased tokens, so every list entry is lowercase and
//! space separated.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Minimum character count for a word to be treated as complex
pub const COMPLEX_WORD_MIN_CHARS: usize = 13;

pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "à", "às", "ao", "aos", "as", "o", "os", "um", "uma", "uns", "umas", "de", "do",
        "da", "dos", "das", "em", "no", "na", "nos", "nas", "num", "numa", "por", "pelo", "pela",
        "pelos", "pelas", "para", "pra", "com", "sem", "sob", "sobre", "entre", "até", "e", "ou",
        "mas", "nem", "que", "se", "como", "mais", "menos", "muito", "muita", "muitos", "muitas",
        "já", "não", "sim", "também", "só", "é", "são", "foi", "foram", "ser", "era", "eram",
        "está", "estão", "estava", "ter", "tem", "têm", "tinha", "há", "houve", "seu", "sua",
        "seus", "suas", "ele", "ela", "eles", "elas", "isso", "isto", "aquilo", "este", "esta",
        "esse", "essa", "lhe", "lhes", "me", "te", "nós", "vos", "eu", "tu", "você", "vocês",
        "quando", "onde", "qual", "quais", "cujo", "cuja", "então", "assim", "ainda", "bem",
    ]
    .into_iter()
    .collect()
});

/// Subordinating conjunctions and structural connectives
pub const SUBORDINATION_MARKERS: &[&str] = &[
    "que",
    "embora",
    "porque",
    "porquanto",
    "conquanto",
    "portanto",
    "contudo",
    "entretanto",
    "todavia",
    "no entanto",
    "não obstante",
    "uma vez que",
    "visto que",
    "dado que",
    "posto que",
    "já que",
    "ainda que",
    "mesmo que",
    "de modo que",
    "de forma que",
    "a fim de que",
    "à medida que",
    "enquanto",
    "caso",
    "conforme",
    "consoante",
    "mediante",
    "cujo",
    "cuja",
    "cujos",
    "cujas",
    "o qual",
    "a qual",
    "os quais",
    "as quais",
    "onde",
    "quando",
    "pois",
    "logo",
    "ademais",
    "outrossim",
];

/// Auxiliaries that introduce analytic passive voice
pub static PASSIVE_AUXILIARIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "é", "são", "foi", "foram", "era", "eram", "será", "serão", "seria", "seriam", "sido",
        "ser", "sendo", "fora", "foras", "fosse", "fossem", "for", "forem", "seja", "sejam",
        "está", "estão", "esteve", "estava", "estavam",
    ]
    .into_iter()
    .collect()
});

/// Past participle endings (regular forms)
pub const PARTICIPLE_SUFFIXES: &[&str] = &[
    "ado", "ada", "ados", "adas", "ido", "ida", "idos", "idas", "ído", "ída", "ídos", "ídas",
];

/// Irregular participles common in passive constructions
pub static IRREGULAR_PARTICIPLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "feito", "feita", "feitos", "feitas", "dito", "dita", "escrito", "escrita", "aberto",
        "aberta", "posto", "posta", "visto", "vista", "coberto", "coberta", "eleito", "eleita",
        "preso", "presa", "aceito", "aceita", "entregue", "pago", "paga", "ganho", "gasto",
        "morto", "morta", "suspenso", "suspensa",
    ]
    .into_iter()
    .collect()
});

/// Explicitation / clarification discourse markers
pub const EXPLICIT_MARKERS: &[&str] = &[
    "por exemplo",
    "isto é",
    "ou seja",
    "quer dizer",
    "em outras palavras",
    "a saber",
    "vale dizer",
    "ou melhor",
    "significa",
    "significa que",
    "chamado",
    "chamada",
    "chamados",
    "chamadas",
    "conhecido como",
    "conhecida como",
    "que é",
    "que são",
    "como",
];

/// Sequential / ordering markers
pub const SEQUENTIAL_MARKERS: &[&str] = &[
    "primeiro",
    "primeiramente",
    "inicialmente",
    "em primeiro lugar",
    "segundo",
    "em segundo lugar",
    "depois",
    "em seguida",
    "logo após",
    "após",
    "antes",
    "então",
    "finalmente",
    "por fim",
    "por último",
];

/// Personal, demonstrative, possessive and relative pronouns
pub const PRONOUNS: &[&str] = &[
    "ele", "ela", "eles", "elas", "lhe", "lhes", "isso", "isto", "aquilo", "este", "esta",
    "estes", "estas", "esse", "essa", "esses", "essas", "aquele", "aquela", "aqueles",
    "aquelas", "dele", "dela", "deles", "delas", "nele", "nela", "neles", "nelas", "deste",
    "desta", "desse", "dessa", "daquele", "daquela", "disso", "disto", "daquilo", "nisso",
    "nisto", "seu", "sua", "seus", "suas", "o qual", "a qual", "os quais", "as quais",
];

/// Domain technical and formal-register terms
pub static TECHNICAL_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "metodologia", "paradigma", "implementação", "infraestrutura", "supramencionado",
        "supracitado", "concomitantemente", "outrossim", "mormente", "hodierno", "jurisprudência",
        "exegese", "epistemológico", "hermenêutica", "sobremaneira", "doravante", "precipuamente",
        "consubstanciar", "parâmetro", "parâmetros", "algoritmo", "algoritmos", "legislação",
        "regulamentação", "conformidade", "diagnóstico", "patologia", "patologias",
        "terapêutico", "terapêutica", "socioeconômico", "socioeconômica", "sustentabilidade",
        "governança", "otimização", "viabilidade", "ademais", "preponderante", "intrínseco",
        "intrínseca", "inerente", "subsequente", "subsequentemente", "mitigação", "mitigar",
        "dispositivo", "dispositivos", "normativo", "normativa", "prerrogativa", "efetivação",
        "fomentar", "fomento", "incumbência", "outorga", "deliberação", "homologação",
        "fisiológico", "fisiológica", "etiologia", "prognóstico", "profilaxia", "epidemiológico",
        "epidemiológica", "macroeconômico", "macroeconômica", "inflacionário", "fiscal",
        "tributário", "tributária", "orçamentário", "orçamentária", "empírico", "empírica",
        "hipótese", "variável", "variáveis", "correlação", "estatístico", "estatística",
        "sintetizar", "catalisador", "molécula", "moléculas", "ecossistema", "biodiversidade",
        "antropogênico", "antropogênica", "fotossíntese", "termodinâmica", "protocolo",
        "protocolos", "interoperabilidade", "escalabilidade", "vulnerabilidade",
    ]
    .into_iter()
    .collect()
});

/// Abbreviations that end with a period but do not end a sentence
pub static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "sr", "sra", "srta", "dr", "dra", "prof", "profa", "exmo", "exma", "etc", "p", "pág",
        "págs", "art", "arts", "inc", "cap", "fig", "vol", "núm", "nº", "ex", "obs", "av", "tel",
        "eng", "adv", "min", "máx", "aprox", "séc", "cia", "ltda", "s.a", "jr",
    ]
    .into_iter()
    .collect()
});

/// Token is a content word (not a stopword, longer than two chars)
pub fn is_content_word(token: &str) -> bool {
    token.chars().count() > 2 && !STOPWORDS.contains(token)
}

/// Token is a recognized complex or technical term
pub fn is_complex_term(token: &str) -> bool {
    TECHNICAL_TERMS.contains(token) || token.chars().count() >= COMPLEX_WORD_MIN_CHARS
}

/// Token looks like a past participle
pub fn is_participle(token: &str) -> bool {
    IRREGULAR_PARTICIPLES.contains(token)
        || (token.chars().count() > 4
            && PARTICIPLE_SUFFIXES.iter().any(|suffix| token.ends_with(suffix)))
}

/// Count marker occurrences in a lowercased token sequence
///
/// Multi-word markers match as contiguous token runs. Overlapping matches of
/// different markers are all counted ("que" inside "uma vez que" included).
pub fn count_markers(tokens: &[String], markers: &[&str]) -> usize {
    markers
        .iter()
        .map(|marker| {
            let parts: Vec<&str> = marker.split_whitespace().collect();
            if parts.is_empty() || parts.len() > tokens.len() {
                return 0;
            }
            tokens
                .windows(parts.len())
                .filter(|window| window.iter().zip(&parts).all(|(t, p)| t == p))
                .count()
        })
        .sum()
}

/// Count analytic passive constructions (auxiliary + participle)
///
/// One intervening word is tolerated ("foi rapidamente aprovado").
pub fn count_passive_constructions(tokens: &[String]) -> usize {
    let mut count = 0;
    for (i, token) in tokens.iter().enumerate() {
        if !PASSIVE_AUXILIARIES.contains(token.as_str()) {
            continue;
        }
        let next = tokens.get(i + 1).map(|t| is_participle(t)).unwrap_or(false);
        let after_next = tokens.get(i + 2).map(|t| is_participle(t)).unwrap_or(false);
        if next || after_next {
            count += 1;
        }
    }
    count
}
