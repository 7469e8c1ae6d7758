use anyhow::{bail, Result};

// 青空文庫に向けた文字種別
// 仝々〆〇ヶ は漢字扱い (https://www.aozora.gr.jp/annotation/etc.html#ruby)
#[derive(Debug, PartialEq, Eq)]
pub enum CharType {
    LatinAlphabet,
    Hiragana,
    Katakana,
    Kanji,
    Other,
}

impl CharType {
    pub fn from(c: char) -> Self {
        let u = c as u32;

        if 0x0041 <= u && u <= 0x005a || 0x0061 <= u && u <= 0x007a {
            // 小文字・大文字
            Self::LatinAlphabet
        } else if 0x00c0 <= u && u <= 0x024f && u != 0x00d7 && u != 0x00f7 {
            // アクセント記号付き
            Self::LatinAlphabet
        } else if 0x3040 <= u && u <= 0x309f {
            Self::Hiragana
        } else if c == 'ヶ' || c == 'ヵ' {
            // 前後によって漢字になる
            Self::Kanji
        } else if 0x30a0 <= u && u <= 0x30ff {
            Self::Katakana
        } else if 0x3400 <= u && u <= 0x4dbf
            || 0x4e00 <= u && u <= 0x9fff
            || 0xf900 <= u && u <= 0xfaff
            || 0x20000 <= u && u <= 0x2ffff
            || c == '仝'
            || c == '々'
            || c == '〆'
            || c == '〇'
            || c == '〻'
            || c == '〓'
        {
            Self::Kanji
        } else {
            Self::Other
        }
    }
}

// ルビの親文字になる漢字か
// ヶ ヵ は前後どちらかが漢字のときだけ漢字扱い（"三ヶ月" など）
pub fn is_kanji(prev: Option<char>, c: char, next: Option<char>) -> bool {
    if CharType::from(c) != CharType::Kanji {
        return false;
    }

    if c == 'ヶ' || c == 'ヵ' {
        let is_neighbor_kanji = |n: Option<char>| {
            n.map_or(false, |n| n != 'ヶ' && n != 'ヵ' && CharType::from(n) == CharType::Kanji)
        };
        return is_neighbor_kanji(prev) || is_neighbor_kanji(next);
    }

    true
}

// 半角文字（空白・記号・アクセント付きラテン文字を含む）
pub fn is_half(c: char) -> bool {
    let u = c as u32;
    (0x0020 <= u && u <= 0x007e) || CharType::from(c) == CharType::LatinAlphabet
}

pub fn parse_number(s: &str) -> Result<usize> {
    if s.is_empty() {
        bail!("Failed to parse empty number");
    }

    let mut ret: usize = 0;
    for c in s.chars() {
        let zero = match c {
            '0'..='9' => '0',
            '０'..='９' => '０',
            _ => bail!("Failed to parse {:?}", s),
        } as usize;

        let d = (c as usize) - zero;

        ret = match ret.checked_mul(10).and_then(|r| r.checked_add(d)) {
            Some(r) => r,
            None => bail!("Number is too large: {:?}", s),
        };
    }
    Ok(ret)
}
