use std::ops::Range;

use crate::{
    converter::{
        char_mapper::CharMapper,
        dictionary::AnnotationDictionary,
        gaiji::{ESCAPE_MARKER, RESERVED_GLYPHS},
    },
    utility::str::{is_half, is_kanji},
};

// 本文をルビ・縦中横のタグ付きで出力する
//
// 前｜漢字《かんじ》 → 前<ruby>漢字<rt>かんじ</rt></ruby>
// 漢字《かんじ》 のように ｜ がなければ直前の漢字（または半角英字）の連続がルビの親文字になる
pub struct RubyPrinter<'a> {
    dictionary: &'a AnnotationDictionary,
    mapper: &'a CharMapper<'a>,
    auto_yoko: bool,
}

impl<'a> RubyPrinter<'a> {
    pub fn new(
        dictionary: &'a AnnotationDictionary,
        mapper: &'a CharMapper<'a>,
        auto_yoko: bool,
    ) -> Self {
        Self {
            dictionary,
            mapper,
            auto_yoko,
        }
    }

    // chars[range] を buf に出力する
    // ※ によるエスケープを外すため chars を書き換える
    // suppressed ならルビは親文字のみ出力し，縦中横にもしない
    pub fn print(
        &self,
        buf: &mut String,
        chars: &mut [char],
        range: Range<usize>,
        suppressed: bool,
    ) {
        let Range { start: begin, end } = range;

        // 親文字の開始位置
        let mut base_start: Option<usize> = None;
        // 《 の位置
        let mut reading_start: Option<usize> = None;
        // ｜ の後か 《 の後
        let mut in_ruby = false;
        // 英字の親文字
        let mut alphabetic = false;

        let mut i = begin;
        while i < end {
            let mut escaped = false;

            let c = chars[i];
            match c {
                // ※《 ※》 ※｜ ※＃ は記号そのもの
                // 開いている親文字・ルビを 1 文字後ろにずらして ※ を詰める
                ESCAPE_MARKER if i + 1 < end && RESERVED_GLYPHS.contains(&chars[i + 1]) => {
                    if let Some(anchor) = base_start.or(reading_start) {
                        chars.copy_within(anchor..i, anchor + 1);
                        base_start = base_start.map(|s| s + 1);
                        reading_start = reading_start.map(|s| s + 1);
                    }
                    i += 1;
                    escaped = true;
                }

                '0'..='9' | '!' | '?' if self.auto_yoko && !suppressed && !in_ruby => {
                    if self.is_yoko_pair(chars, i, end) {
                        if let Some(start) = base_start.take() {
                            self.print_range(buf, chars, start..i);
                        }
                        buf.push_str(self.dictionary.tag("縦中横"));
                        buf.push(chars[i]);
                        buf.push(chars[i + 1]);
                        buf.push_str(self.dictionary.tag("縦中横終わり"));
                        i += 2;
                        continue;
                    }
                }

                '｜' if reading_start.is_none() => {
                    if let Some(start) = base_start {
                        self.print_range(buf, chars, start..i);
                    }
                    base_start = Some(i + 1);
                    in_ruby = true;
                    i += 1;
                    continue;
                }

                '《' if reading_start.is_none() => {
                    reading_start = Some(i);
                    in_ruby = true;
                    i += 1;
                    continue;
                }

                _ => {}
            }

            let prev = if i == 0 { None } else { chars.get(i - 1).copied() };
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if in_ruby {
                if c == '》' && !escaped {
                    match (base_start, reading_start) {
                        (Some(base), Some(reading)) => {
                            let reading_range = (reading + 1)..i;
                            self.print_ruby(buf, chars, base..reading, reading_range, suppressed);
                        }
                        // 親文字のないルビと 《 のない ｜…》 は本文
                        (Some(start), None) | (None, Some(start)) => {
                            self.print_range(buf, chars, start..(i + 1));
                        }
                        (None, None) => self.mapper.push(buf, chars, i),
                    }
                    base_start = None;
                    reading_start = None;
                    in_ruby = false;
                }
            } else {
                match base_start {
                    None => {
                        if is_kanji(prev, c, next) {
                            base_start = Some(i);
                            alphabetic = false;
                        } else if is_half(c) {
                            base_start = Some(i);
                            alphabetic = true;
                        } else {
                            self.mapper.push(buf, chars, i);
                        }
                    }
                    Some(start) => {
                        // 漢字（英字の親文字なら半角も）でなければルビにならないので出力
                        if !is_kanji(prev, c, next) && !(alphabetic && is_half(c)) {
                            self.print_range(buf, chars, start..(i + 1));
                            base_start = None;
                        }
                    }
                }
            }

            i += 1;
        }

        // 閉じていない親文字・ルビはそのまま出力
        if let Some(start) = base_start.or(reading_start) {
            self.print_range(buf, chars, start..end);
        }
    }

    // 前後に半角のない半角数字 2 文字か !? 2 文字
    fn is_yoko_pair(&self, chars: &[char], i: usize, end: usize) -> bool {
        if i + 1 >= end {
            return false;
        }
        let (c, next) = (chars[i], chars[i + 1]);
        let paired = match c {
            '0'..='9' => next.is_ascii_digit(),
            _ => next == '!' || next == '?',
        };
        if !paired {
            return false;
        }
        if i > 0 && is_half(chars[i - 1]) {
            return false;
        }
        if chars.get(i + 2).map_or(false, |&c| is_half(c)) {
            return false;
        }
        true
    }

    fn print_ruby(
        &self,
        buf: &mut String,
        chars: &[char],
        base: Range<usize>,
        reading: Range<usize>,
        suppressed: bool,
    ) {
        // 《》 の中が空ならルビにしない
        if reading.is_empty() {
            self.print_range(buf, chars, base);
            buf.push_str("《》");
            return;
        }

        if suppressed {
            self.print_range(buf, chars, base);
            return;
        }

        // 同じ長さなら 1 文字ずつルビを振る
        if base.len() == reading.len() {
            for (b, r) in base.zip(reading) {
                buf.push_str(self.dictionary.tag("ルビ前"));
                self.mapper.push(buf, chars, b);
                buf.push_str(self.dictionary.tag("ルビ"));
                self.mapper.push(buf, chars, r);
                buf.push_str(self.dictionary.tag("ルビ後"));
            }
            return;
        }

        buf.push_str(self.dictionary.tag("ルビ前"));
        self.print_range(buf, chars, base);
        buf.push_str(self.dictionary.tag("ルビ"));
        self.print_range(buf, chars, reading);
        buf.push_str(self.dictionary.tag("ルビ後"));
    }

    fn print_range(&self, buf: &mut String, chars: &[char], range: Range<usize>) {
        for i in range {
            self.mapper.push(buf, chars, i);
        }
    }
}
