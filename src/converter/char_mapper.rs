use crate::converter::dictionary::ReplacementTable;

// 本文の文字を出力用に置換する
// 縦書きと横書きで置換が異なる
pub struct CharMapper<'a> {
    replacements: Option<&'a ReplacementTable>,
    vertical: bool,
}

impl<'a> CharMapper<'a> {
    pub fn new(replacements: Option<&'a ReplacementTable>, vertical: bool) -> Self {
        Self {
            replacements,
            vertical,
        }
    }

    // chars[index] を buf に出力する
    // 前後の文字を見るので行全体を渡す
    pub fn push(&self, buf: &mut String, chars: &[char], index: usize) {
        let c = chars[index];

        // 置換表にあればそれだけを使う
        if let Some(replaced) = self.replacements.and_then(|r| r.get(c)) {
            buf.push_str(replaced);
            return;
        }

        match c {
            '&' => buf.push_str("&amp;"),

            '<' | '>' if !self.vertical => buf.push_str(if c == '<' { "&lt;" } else { "&gt;" }),

            // << >> のように 2 つだけ並んでいたら 《 》 にする
            '<' | '>' => {
                let (escaped, collapsed) = if c == '<' { ("&lt;", '《') } else { ("&gt;", '》') };
                if is_pair_end(chars, index) && buf.ends_with(escaped) {
                    buf.truncate(buf.len() - escaped.len());
                    buf.push(collapsed);
                } else {
                    buf.push_str(escaped);
                }
            }

            '＜' | '＞' => {
                let collapsed = if c == '＜' { '《' } else { '》' };
                if is_pair_end(chars, index) && buf.ends_with(c) {
                    buf.pop();
                    buf.push(collapsed);
                } else {
                    buf.push(c);
                }
            }

            '≪' if self.vertical => buf.push('《'),
            '≫' if self.vertical => buf.push('》'),
            '“' if self.vertical => buf.push('〝'),
            '”' if self.vertical => buf.push('〟'),
            '―' if self.vertical => buf.push('─'),

            c => buf.push(c),
        }
    }
}

// chars[index] がちょうど 2 つ並んだ同じ文字の 2 つ目か
fn is_pair_end(chars: &[char], index: usize) -> bool {
    let c = chars[index];
    index > 0
        && chars[index - 1] == c
        && (index < 2 || chars[index - 2] != c)
        && chars.get(index + 1) != Some(&c)
}
