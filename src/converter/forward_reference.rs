use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::converter::{dictionary::ForwardReferenceDictionary, gaiji::RESERVED_GLYPHS};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SegmentKind<'a> {
    // 数える対象の文字
    Plain,
    // ｜ と エスケープの ※
    Marker,
    // 《…》
    Reading,
    // ［＃…］
    OpenTag(&'a str),
    // ［＃…終わり］ は 終わり を除いた名前
    CloseTag(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<'a> {
    kind: SegmentKind<'a>,
    // text 中のバイト位置
    start: usize,
}

fn segment(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();

    let mut iter = text.char_indices().peekable();
    while let Some((start, c)) = iter.next() {
        let rest = &text[start..];
        let kind = match c {
            '｜' => SegmentKind::Marker,

            '※' => match iter.peek() {
                Some((_, next)) if RESERVED_GLYPHS.contains(next) => {
                    // ※ の次の文字は本文として数える
                    segments.push(Segment {
                        kind: SegmentKind::Marker,
                        start,
                    });
                    let Some((next_start, _)) = iter.next() else {
                        break;
                    };
                    segments.push(Segment {
                        kind: SegmentKind::Plain,
                        start: next_start,
                    });
                    continue;
                }
                _ => SegmentKind::Plain,
            },

            '《' => match rest.find('》') {
                Some(end) => {
                    skip_to(&mut iter, start + end);
                    SegmentKind::Reading
                }
                None => SegmentKind::Marker,
            },

            '》' => SegmentKind::Marker,

            '［' if rest.starts_with("［＃") => match rest.find('］') {
                Some(end) => {
                    let name = &rest["［＃".len()..end];
                    skip_to(&mut iter, start + end);
                    match name.strip_suffix("終わり") {
                        Some(name) => SegmentKind::CloseTag(name),
                        None => SegmentKind::OpenTag(name),
                    }
                }
                None => SegmentKind::Plain,
            },

            _ => SegmentKind::Plain,
        };
        segments.push(Segment { kind, start });
    }

    segments
}

// position の文字まで読み飛ばす
fn skip_to<I: Iterator<Item = (usize, char)>>(iter: &mut std::iter::Peekable<I>, position: usize) {
    while let Some((i, _)) = iter.next() {
        if i >= position {
            break;
        }
    }
}

// 前タグを入れる位置と，後ろに本文が続くときの後タグの位置（バイト位置）
// target が見つかればその末尾から，なければ末尾から target の文字数分を対象にする
fn find_target_span(text: &str, target: &str) -> (usize, Option<usize>) {
    let segments = segment(text);

    let plain: Vec<(usize, char)> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind == SegmentKind::Plain)
        .filter_map(|(i, s)| text[s.start..].chars().next().map(|c| (i, c)))
        .collect();
    let target: Vec<char> = target.chars().collect();

    let found = if target.len() <= plain.len() {
        (0..=(plain.len() - target.len())).rev().find(|&p| {
            plain[p..(p + target.len())]
                .iter()
                .map(|&(_, c)| c)
                .eq(target.iter().copied())
        })
    } else {
        None
    };

    let mut remaining = target.len();
    let mut boundary = text.len();
    let mut index = segments.len();
    let mut target_end = None;

    // 後ろに本文が残るなら target の直後で閉じる
    if let Some(p) = found {
        let last = p + target.len();
        if last < plain.len() {
            let (i, c) = plain[last - 1];
            boundary = segments[i].start + c.len_utf8();
            index = i + 1;
            target_end = Some(boundary);
        }
    }
    // target_end の後ろで次に見るセグメント
    let mut forward = index;

    let mut stack: Vec<&str> = Vec::new();

    while remaining > 0 && index > 0 {
        let segment = &segments[index - 1];
        match segment.kind {
            SegmentKind::Plain => remaining -= 1,
            SegmentKind::Marker | SegmentKind::Reading => {}
            SegmentKind::CloseTag(name) => stack.push(name),
            SegmentKind::OpenTag(name) => {
                if stack.last() == Some(&name) {
                    stack.pop();
                } else {
                    // 入れ子が崩れているのでこのタグの後ろで止める
                    return (boundary, target_end);
                }
            }
        }
        boundary = segment.start;
        index -= 1;
    }

    // 直前で開いているタグとマーカーは含める
    // target の直後で閉じているタグは後タグもその外に出す
    while index > 0 {
        let segment = &segments[index - 1];
        match segment.kind {
            SegmentKind::OpenTag(name) if stack.last() == Some(&name) => {
                stack.pop();
            }
            SegmentKind::OpenTag(name)
                if target_end.is_some()
                    && stack.is_empty()
                    && segments.get(forward).map(|s| &s.kind)
                        == Some(&SegmentKind::CloseTag(name)) =>
            {
                forward += 1;
                target_end = Some(segments.get(forward).map_or(text.len(), |s| s.start));
            }
            SegmentKind::Marker => {}
            _ => break,
        }
        boundary = segment.start;
        index -= 1;
    }

    (boundary, target_end)
}

// ［＃「○○」に傍点］ などの前方参照注記を前後のタグに置き換える
// ○○［＃「○○」に傍点］ → ［＃傍点］○○［＃傍点終わり］
pub fn resolve_forward_references(line: &str, dictionary: &ForwardReferenceDictionary) -> String {
    static REGEX_FORWARD_REFERENCE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"［＃「(?P<target>[^」]+)」(?P<name>.+?)］").unwrap());

    let mut buf = line.to_owned();
    // 置換で変わった buf と line の位置のずれ
    let mut offset: isize = 0;

    for caps in REGEX_FORWARD_REFERENCE.captures_iter(line) {
        let (Some(whole), Some(target), Some(name)) =
            (caps.get(0), caps.name("target"), caps.name("name"))
        else {
            continue;
        };

        let Some(rule) = dictionary.get(name.as_str()) else {
            debug!(annotation = whole.as_str(), "Unregistered forward reference");
            continue;
        };

        let start = (whole.start() as isize + offset) as usize;
        let end = (whole.end() as isize + offset) as usize;

        let (target_begin, target_end) = find_target_span(&buf[..start], target.as_str());

        let after = rule
            .after_tag
            .as_ref()
            .map(|tag| format!("［＃{}］", tag))
            .unwrap_or_default();
        let before = format!("［＃{}］", rule.before_tag);

        match target_end {
            Some(target_end) => {
                buf.replace_range(start..end, "");
                buf.insert_str(target_end, &after);
            }
            None => buf.replace_range(start..end, &after),
        }
        buf.insert_str(target_begin, &before);

        offset += (before.len() + after.len()) as isize - whole.as_str().len() as isize;
    }

    buf
}

