// https://www.aozora.gr.jp/accent_separation.html
// 〔〕 内の「基本ラテン文字のみによる拡張ラテン文字の分解表記」を戻す
pub trait LatinDecomposer {
    fn decompose(&self, payload: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AccentDecomposer;

impl LatinDecomposer for AccentDecomposer {
    fn decompose(&self, payload: &str) -> String {
        compose_accent(payload)
    }
}

// アクセント記号, 元の文字, 合成後の文字（元の文字と同じ順）
static ACCENTS: &[(char, &str, &str)] = &[
    ('`', "aeinouAEINOU", "àèìǹòùÀÈÌǸÒÙ"),
    ('\'', "aceilmnorsuyzACEILMNORSUYZ", "áćéíĺḿńóŕśúýźÁĆÉÍĹḾŃÓŔŚÚÝŹ"),
    ('^', "aceghijosuACEGHIJOSU", "âĉêĝĥîĵôŝûÂĈÊĜĤÎĴÔŜÛ"),
    ('~', "aeinouAEINOU", "ãẽĩñõũÃẼĨÑÕŨ"),
    (':', "aeiouyAEIOU", "äëïöüÿÄËÏÖÜ"),
    ('&', "auAUs", "åůÅŮß"),
    ('_', "aeiouAEIOU", "āēīōūĀĒĪŌŪ"),
    (',', "cstCST", "çşţÇŞŢ"),
    ('/', "dhiloDLO", "đħɨłøĐŁØ"),
];

// 合字
static LIGATURES: &[(&str, char)] = &[("ae&", 'æ'), ("AE&", 'Æ'), ("oe&", 'œ'), ("OE&", 'Œ')];

pub fn compose_accent(s: &str) -> String {
    let chars: Vec<_> = s.chars().collect();
    let mut ret = String::with_capacity(s.len());

    let mut i = 0;
    while i < chars.len() {
        let rest = &chars[i..];

        if let Some(c) = ligature_of(rest) {
            ret.push(c);
            i += 3;
            continue;
        }

        if let [c, accent, ..] = rest {
            if let Some(c) = accent_of(*c, *accent) {
                ret.push(c);
                i += 2;
                continue;
            }
        }

        ret.push(chars[i]);
        i += 1;
    }

    ret
}

fn ligature_of(rest: &[char]) -> Option<char> {
    LIGATURES.iter().find_map(|&(decomposed, c)| {
        let n = decomposed.chars().count();
        (rest.len() >= n && rest[..n].iter().copied().eq(decomposed.chars())).then_some(c)
    })
}

// e' → é
fn accent_of(c: char, accent: char) -> Option<char> {
    let &(_, bases, composed) = ACCENTS.iter().find(|(a, _, _)| *a == accent)?;
    let index = bases.chars().position(|b| b == c)?;
    composed.chars().nth(index)
}
