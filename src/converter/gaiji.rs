use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{converter::latin::LatinDecomposer, utility::str::is_half};

// 外字注記の付加情報から文字列を得る
pub trait GaijiResolver {
    fn resolve(&self, payload: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct JisX0213Entry {
    plane: usize,
    row: usize,
    cell: usize,
    char: String,
}

// JIS X 0213 の面区点 → 文字
#[derive(Debug, Default)]
pub struct JisX0213Table {
    chars: HashMap<(usize, usize, usize), String>,
}

impl JisX0213Table {
    // [{ "plane": 1, "row": 84, "cell": 77, "char": "…" }, ...]
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<JisX0213Entry> =
            serde_json::from_str(json).context("Failed to parse JIS X 0213 table")?;
        Ok(Self {
            chars: entries
                .into_iter()
                .map(|e| ((e.plane, e.row, e.cell), e.char))
                .collect(),
        })
    }

    pub fn get(&self, plane: usize, row: usize, cell: usize) -> Option<&str> {
        self.chars.get(&(plane, row, cell)).map(|s| s.as_str())
    }
}

impl FromIterator<((usize, usize, usize), String)> for JisX0213Table {
    fn from_iter<I: IntoIterator<Item = ((usize, usize, usize), String)>>(iter: I) -> Self {
        Self {
            chars: iter.into_iter().collect(),
        }
    }
}

// コード表記から文字を得る
#[derive(Debug, Default)]
pub struct CodeGaijiResolver {
    jis: Option<JisX0213Table>,
}

impl CodeGaijiResolver {
    pub fn new() -> Self {
        Self { jis: None }
    }

    pub fn with_jis_x_0213(jis: JisX0213Table) -> Self {
        Self { jis: Some(jis) }
    }
}

impl GaijiResolver for CodeGaijiResolver {
    fn resolve(&self, payload: &str) -> Option<String> {
        // U+6DB6, unicode6DB6
        static REGEX_UNICODE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(?:U\+|unicode)(?P<unicode>[0-9A-Fa-f]{4,6})$").unwrap());
        if let Some(caps) = REGEX_UNICODE.captures(payload) {
            let unicode = u32::from_str_radix(&caps["unicode"], 16).ok()?;
            return char::from_u32(unicode).map(|c| c.to_string());
        }

        // 第3水準1-84-77, 1-2-22
        static REGEX_JIS: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^(?:第[3-4]水準)?(?P<plane>[0-9]+)-(?P<row>[0-9]+)-(?P<cell>[0-9]+)$")
                .unwrap()
        });
        if let Some(caps) = REGEX_JIS.captures(payload) {
            let jis = self.jis.as_ref()?;
            let plane = caps["plane"].parse().ok()?;
            let row = caps["row"].parse().ok()?;
            let cell = caps["cell"].parse().ok()?;
            return jis.get(plane, row, cell).map(|c| c.to_owned());
        }

        // 変体仮名
        static REGEX_HENTAIGANA: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^変体仮名(?P<kana>.).*$").unwrap());
        if let Some(caps) = REGEX_HENTAIGANA.captures(payload) {
            return Some(caps["kana"].to_owned());
        }

        None
    }
}

// 外字変換の結果がルビや注記の記号と区別できなくなるもの
pub const RESERVED_GLYPHS: [char; 4] = ['《', '》', '｜', '＃'];

pub const ESCAPE_MARKER: char = '※';

// 行内の外字注記・アクセント分解・くの字点を文字に変換する
// escape が true なら変換結果の特殊文字の前に ※ を付ける
pub fn convert_gaiji(
    line: &str,
    escape: bool,
    gaiji: &dyn GaijiResolver,
    latin: &dyn LatinDecomposer,
) -> String {
    static REGEX_GAIJI: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(※［＃.+?］)|(〔.+?〕)|(／″?＼)").unwrap());

    if !REGEX_GAIJI.is_match(line) {
        return line.to_owned();
    }

    let mut buf = String::with_capacity(line.len());
    let mut begin = 0;
    for m in REGEX_GAIJI.find_iter(line) {
        buf.push_str(&line[begin..m.start()]);
        let chuki = m.as_str();

        if let Some(payload) = chuki
            .strip_prefix("※［＃")
            .and_then(|c| c.strip_suffix('］'))
        {
            match resolve_gaiji(payload, gaiji) {
                Some(resolved) => {
                    let mut chars = resolved.chars();
                    if let (Some(c), None) = (chars.next(), chars.next()) {
                        if escape && RESERVED_GLYPHS.contains(&c) {
                            buf.push(ESCAPE_MARKER);
                        }
                    }
                    buf.push_str(&resolved);
                }
                None => {
                    tracing::warn!(gaiji = chuki, "Unresolved gaiji");
                    let name = payload.split('、').next().unwrap_or(payload);
                    buf.push_str(&format!("〓［＃行右小書き］（{}）［＃行右小書き終わり］", name));
                }
            }
        } else if let Some(inner) = chuki.strip_prefix('〔').and_then(|c| c.strip_suffix('〕')) {
            // 〔 の次が半角ならアクセント分解
            if inner.chars().next().map_or(false, is_half) {
                buf.push_str(&latin.decompose(inner));
            } else {
                buf.push_str(chuki);
            }
        } else if chuki.contains('″') {
            buf.push_str("〴〵");
        } else {
            buf.push_str("〳〵");
        }

        begin = m.end();
    }
    buf.push_str(&line[begin..]);

    buf
}

// 注記名，コード（最大 3 つ），注記名の順に試す
fn resolve_gaiji(payload: &str, gaiji: &dyn GaijiResolver) -> Option<String> {
    let values: Vec<&str> = payload.split('、').collect();
    let name = values[0];

    gaiji
        .resolve(name)
        .or_else(|| values.iter().skip(1).take(3).find_map(|code| gaiji.resolve(code)))
        .or_else(|| {
            // 「さんずい＋垂」 のように括られた名称
            let stripped = name.strip_prefix('「')?.strip_suffix('」')?;
            gaiji.resolve(stripped)
        })
}
