use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    converter::dictionary::{AnnotationDictionary, AnnotationRule},
    utility::str::parse_number,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndentDirective {
    // ［＃ここから○字下げ、折り返して●字下げ］
    Wrap { indent: usize, wrap: usize },
    // ［＃ここから○字下げ、●字詰め］
    WidthLimited { indent: usize, width: usize },
    // ［＃ここから○字下げ、…］ は字下げのみ
    Compound { indent: usize },
    // ［＃ここで字下げ終わり、…］
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'d> {
    // 注記以外の本文
    Literal,
    DictionaryAnnotation {
        name: String,
        rule: &'d AnnotationRule,
    },
    IndentDirective(IndentDirective),
    // ［＃表紙（表紙.jpg）］, <img src="…">
    ImageReference {
        src: String,
        title: String,
    },
    // ［＃（ス）］
    CorrectiveReading(String),
    // 変換されずに残った ［＃「○○」…］
    ForwardReference {
        target: String,
        name: String,
    },
    // <a …>, </a>
    PassthroughTag(String),
    // 画像のパスが取れない注記
    Malformed(String),
    Unknown(String),
}

// start..end は行の文字位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToken<'d> {
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind<'d>,
}

// 行を本文と注記に分ける
pub fn tokenize_line<'d>(
    chars: &[char],
    dictionary: &'d AnnotationDictionary,
) -> Vec<LineToken<'d>> {
    let mut tokens = Vec::new();

    let mut literal_start = 0;
    let mut i = 0;
    while i < chars.len() {
        let (end, kind) = match chars[i] {
            '［' if chars.get(i + 1) == Some(&'＃') => {
                // 空の注記 "［＃］" は本文
                if chars.get(i + 2) == Some(&'］') {
                    i += 3;
                    continue;
                }
                let Some(end) = find_char(chars, i + 3, '］') else {
                    i += 1;
                    continue;
                };
                let name: String = chars[(i + 2)..end].iter().collect();
                (end + 1, Some(classify_annotation(name, dictionary)))
            }

            '<' => {
                let Some(end) = find_char(chars, i + 2, '>') else {
                    i += 1;
                    continue;
                };
                let text: String = chars[i..=end].iter().collect();
                (end + 1, classify_tag(text))
            }

            _ => {
                i += 1;
                continue;
            }
        };

        match kind {
            Some(kind) => {
                if literal_start < i {
                    tokens.push(LineToken {
                        start: literal_start,
                        end: i,
                        kind: TokenKind::Literal,
                    });
                }
                tokens.push(LineToken {
                    start: i,
                    end,
                    kind,
                });
                literal_start = end;
            }
            // <img> <a> 以外のタグは本文として扱う
            None => {}
        }
        i = end;
    }

    if literal_start < chars.len() {
        tokens.push(LineToken {
            start: literal_start,
            end: chars.len(),
            kind: TokenKind::Literal,
        });
    }

    tokens
}

fn find_char(chars: &[char], from: usize, target: char) -> Option<usize> {
    chars
        .get(from..)?
        .iter()
        .position(|&c| c == target)
        .map(|p| p + from)
}

// ［＃ と ］ に囲まれた部分
fn classify_annotation(name: String, dictionary: &AnnotationDictionary) -> TokenKind<'_> {
    if let Some(rule) = dictionary.get(&name) {
        return TokenKind::DictionaryAnnotation { name, rule };
    }

    // 画像と訓点送り仮名
    if let Some(image_start) = name.find('（') {
        let inner = &name[(image_start + '（'.len_utf8())..];

        // 訓点送り仮名は ＃ の直後が （ で . を含まない
        if image_start == 0 && inner.ends_with('）') && !name.contains('.') {
            let value = &inner[..(inner.len() - '）'.len_utf8())];
            return TokenKind::CorrectiveReading(value.to_owned());
        }

        let Some(close) = inner.find('）') else {
            return TokenKind::Malformed(format!("［＃{}］", name));
        };
        let path_end = inner.find('、').map_or(close, |comma| comma.min(close));
        let src = inner[..path_end].trim();
        if src.is_empty() {
            return TokenKind::Malformed(format!("［＃{}］", name));
        }

        let caption = name[..image_start].trim_start_matches('「').trim_end_matches('」');
        let title = if caption.is_empty() {
            file_name_of(src)
        } else {
            caption
        };

        return TokenKind::ImageReference {
            src: src.to_owned(),
            title: title.to_owned(),
        };
    }

    if let Some(directive) = parse_indent_directive(&name) {
        return TokenKind::IndentDirective(directive);
    }

    static REGEX_FORWARD_REFERENCE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^「(?P<target>[^」]+)」(?P<name>.+)$").unwrap());
    if let Some(caps) = REGEX_FORWARD_REFERENCE.captures(&name) {
        return TokenKind::ForwardReference {
            target: caps["target"].to_owned(),
            name: caps["name"].to_owned(),
        };
    }

    TokenKind::Unknown(name)
}

fn parse_indent_directive(name: &str) -> Option<IndentDirective> {
    static REGEX_WRAP: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^ここから(?P<indent>[0-9０-９]+)字下げ、折り返して(?P<wrap>[0-9０-９]+)字下げ.*$")
            .unwrap()
    });
    if let Some(caps) = REGEX_WRAP.captures(name) {
        let indent = parse_number(&caps["indent"]).ok()?;
        let wrap = parse_number(&caps["wrap"]).ok()?;
        return Some(IndentDirective::Wrap { indent, wrap });
    }

    static REGEX_WIDTH_LIMITED: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^ここから(?P<indent>[0-9０-９]+)字下げ、(?P<width>[0-9０-９]+)字詰め.*$").unwrap()
    });
    if let Some(caps) = REGEX_WIDTH_LIMITED.captures(name) {
        let indent = parse_number(&caps["indent"]).ok()?;
        let width = parse_number(&caps["width"]).ok()?;
        return Some(IndentDirective::WidthLimited { indent, width });
    }

    static REGEX_COMPOUND: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^ここから(?P<indent>[0-9０-９]+)字下げ、.*$").unwrap());
    if let Some(caps) = REGEX_COMPOUND.captures(name) {
        let indent = parse_number(&caps["indent"]).ok()?;
        return Some(IndentDirective::Compound { indent });
    }

    if name.starts_with("ここで字下げ終わり、") {
        return Some(IndentDirective::End);
    }

    None
}

// <img>, <a>, </a> 以外は None
fn classify_tag(text: String) -> Option<TokenKind<'static>> {
    let lower = text.to_lowercase();

    if lower.starts_with("<a ") || lower.starts_with("</a>") {
        return Some(TokenKind::PassthroughTag(text));
    }

    if !lower.starts_with("<img ") {
        return None;
    }

    static REGEX_SRC: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?i)\ssrc=(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).unwrap());
    static REGEX_ALT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?i)\salt=(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).unwrap());

    let quoted = |regex: &Regex| {
        let caps = regex.captures(&text)?;
        caps.name("dq")
            .or_else(|| caps.name("sq"))
            .map(|m| m.as_str().trim().to_owned())
    };

    let Some(src) = quoted(&*REGEX_SRC).filter(|s| !s.is_empty()) else {
        return Some(TokenKind::Malformed(text));
    };

    let title = quoted(&*REGEX_ALT)
        .filter(|alt| !alt.is_empty())
        .unwrap_or_else(|| file_name_of(&src).to_owned());

    Some(TokenKind::ImageReference { src, title })
}

fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
