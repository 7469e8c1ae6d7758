use std::io::Write;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::converter::{
    char_mapper::CharMapper,
    context::ConversionContext,
    dictionary::{AnnotationDictionary, AnnotationFlag, ForwardReferenceDictionary},
    forward_reference::resolve_forward_references,
    gaiji::{convert_gaiji, GaijiResolver},
    latin::LatinDecomposer,
    ruby::RubyPrinter,
    section::SectionSink,
    tokenizer::{tokenize_line, IndentDirective, TokenKind},
};

// 章名の最大文字数
pub const CHAPTER_NAME_LENGTH: usize = 64;

// 1 行を XHTML に変換して書き出す
pub struct LineWriter<'a> {
    pub(crate) annotations: &'a AnnotationDictionary,
    pub(crate) forward_references: &'a ForwardReferenceDictionary,
    pub(crate) gaiji: &'a dyn GaijiResolver,
    pub(crate) latin: &'a dyn LatinDecomposer,
    pub(crate) mapper: &'a CharMapper<'a>,
    pub(crate) ruby: &'a RubyPrinter<'a>,
    pub(crate) with_mark_id: bool,
}

impl<'a> LineWriter<'a> {
    // block が true なら <p> で括らず改行タグも出さない
    pub fn write_line(
        &self,
        out: &mut dyn Write,
        line: &str,
        line_number: usize,
        mut block: bool,
        context: &mut ConversionContext,
        sink: &mut dyn SectionSink,
    ) -> Result<()> {
        let line = convert_gaiji(line, true, self.gaiji, self.latin);
        let line = resolve_forward_references(&line, self.forward_references);

        let mut chars: Vec<char> = line.chars().collect();
        let tokens = tokenize_line(&chars, self.annotations);

        let mut buf = String::new();
        // 行末に出力する閉じタグ
        let mut suffix = String::new();
        // ルビ・縦中横を止める注記の深さ
        let mut suppress_level: isize = 0;

        for token in tokens {
            match token.kind {
                TokenKind::Literal => {
                    context.touch_bookmark(line_number);

                    let text: String = chars[token.start..token.end].iter().collect();
                    let suppressed = suppress_level > 0;
                    self.ruby.print(&mut buf, &mut chars, token.start..token.end, suppressed);

                    // 改ページ後の最初の本文を章名にする
                    if !context.chapter_started {
                        self.capture_chapter_name(&text, context, sink);
                    }
                }

                TokenKind::DictionaryAnnotation { name, rule } => {
                    if rule.has_flag(AnnotationFlag::RubySuppressStart) {
                        suppress_level += 1;
                    } else if rule.has_flag(AnnotationFlag::RubySuppressEnd) {
                        suppress_level -= 1;
                    }

                    // 改ページ
                    // 画像が先頭に移動されるなどで何も出力していなければ改ページしない
                    if rule.has_flag(AnnotationFlag::PageBreak) {
                        self.print_line(out, &buf, block, true, context)?;
                        context.section_char_length += buf.chars().count();
                        if context.section_char_length > 0 {
                            sink.next_section(out, line_number)?;
                            context.start_section();
                            // 行末の改ページなら残りは改行しない
                            block = token.end == chars.len();
                        }
                        buf.clear();
                    }

                    if name.ends_with("字下げ") {
                        if context.in_indent {
                            buf.push_str(self.annotations.tag("字下げ省略"));
                        }
                        // 閉じタグがあれば 1 行のみの字下げ
                        context.in_indent = rule.close_tag.is_none();
                    } else if name == "ここで字下げ終わり" {
                        context.in_indent = false;
                    }

                    buf.push_str(&rule.open_tag);
                    if let Some(close_tag) = &rule.close_tag {
                        suffix.insert_str(0, close_tag);
                    }

                    if rule.has_flag(AnnotationFlag::NoBreak) {
                        block = true;
                    }
                }

                TokenKind::IndentDirective(directive) => {
                    if directive != IndentDirective::End {
                        if context.in_indent {
                            buf.push_str(self.annotations.tag("字下げ省略"));
                        }
                        context.in_indent = true;
                    }
                    self.push_indent(&mut buf, &directive, context);
                    block = true;
                }

                TokenKind::ImageReference { src, title } => {
                    block = true;
                    // 先頭に移動するなどでここに出力しない画像は None
                    if let Some(path) = sink.image_file_path(&src) {
                        buf.push_str(self.annotations.tag("画像開始"));
                        buf.push_str(&path);
                        buf.push_str(self.annotations.tag("画像終了"));
                        // 本文がなければ画像のタイトルを章名にする
                        if !context.chapter_started {
                            sink.update_chapter_name(&truncate(&title, CHAPTER_NAME_LENGTH));
                        }
                    }
                }

                TokenKind::CorrectiveReading(text) => {
                    buf.push_str(self.annotations.tag("行右小書き"));
                    buf.push_str(&text);
                    buf.push_str(self.annotations.tag("行右小書き終わり"));
                }

                TokenKind::PassthroughTag(tag) => buf.push_str(&tag),

                TokenKind::Malformed(annotation) => {
                    warn!(line = line_number, annotation = %annotation, "Malformed annotation");
                    for i in token.start..token.end {
                        self.mapper.push(&mut buf, &chars, i);
                    }
                }

                TokenKind::ForwardReference { target, name } => {
                    warn!(
                        line = line_number,
                        target = %target,
                        annotation = %name,
                        "Unresolved forward reference"
                    );
                }

                TokenKind::Unknown(annotation) => {
                    warn!(line = line_number, annotation = %annotation, "Unknown annotation");
                }
            }
        }

        buf.push_str(&suffix);
        self.print_line(out, &buf, block, false, context)?;
        context.section_char_length += buf.chars().count();

        Ok(())
    }

    // 行頭が改ページの注記か
    pub fn starts_with_page_break(&self, line: &str) -> bool {
        let Some(rest) = line.strip_prefix("［＃") else {
            return false;
        };
        let Some(end) = rest.find('］') else {
            return false;
        };
        self.annotations.has_flag(&rest[..end], AnnotationFlag::PageBreak)
    }

    fn push_indent(
        &self,
        buf: &mut String,
        directive: &IndentDirective,
        context: &mut ConversionContext,
    ) {
        let tag = |name: &str| self.annotations.tag(name);

        match *directive {
            IndentDirective::Wrap { indent, wrap } => {
                // 折り返し位置からの 1 行目のずれは負になりうる
                let first = indent as isize - wrap as isize;
                buf.push_str(&format!(
                    "{}{}{}{}{}",
                    tag("折り返し1"),
                    wrap,
                    tag("折り返し2"),
                    first,
                    tag("折り返し3"),
                ));
            }
            IndentDirective::WidthLimited { indent, width } => {
                buf.push_str(&format!(
                    "{}{}{}{}{}",
                    tag("字下げ字詰め1"),
                    indent,
                    tag("字下げ字詰め2"),
                    width,
                    tag("字下げ字詰め3"),
                ));
            }
            IndentDirective::Compound { indent } => {
                buf.push_str(&format!("{}{}{}", tag("字下げ複合1"), indent, tag("字下げ複合2")));
            }
            IndentDirective::End => {
                buf.push_str(tag("ここで字下げ終わり"));
                context.in_indent = false;
            }
        }
    }

    // page_end なら空でも改行タグを出さない
    fn print_line(
        &self,
        out: &mut dyn Write,
        buf: &str,
        block: bool,
        page_end: bool,
        context: &ConversionContext,
    ) -> Result<()> {
        if block {
            out.write_all(buf.as_bytes())?;
            return Ok(());
        }

        if buf.is_empty() {
            if !page_end {
                writeln!(out, "{}", self.annotations.tag("改行"))?;
            }
            return Ok(());
        }

        if self.with_mark_id {
            write!(out, "<p id=\"kobo.{}.1\">", context.bookmark_id)?;
        } else {
            out.write_all(b"<p>")?;
        }
        out.write_all(buf.as_bytes())?;
        out.write_all(b"</p>\n")?;

        Ok(())
    }

    fn capture_chapter_name(
        &self,
        text: &str,
        context: &mut ConversionContext,
        sink: &mut dyn SectionSink,
    ) {
        let name = to_plain(text);
        let name = name.trim_matches(|c| matches!(c, '=' | '-' | '―' | '─' | '|'));
        if name.is_empty() {
            return;
        }

        context.chapter_started = true;
        sink.update_chapter_name(&truncate(name, CHAPTER_NAME_LENGTH));
    }
}

// タグ・ルビ・注記を取り除いた文字列
pub fn to_plain(text: &str) -> String {
    static REGEX_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
    static REGEX_READING: Lazy<Regex> = Lazy::new(|| Regex::new(r"《[^》]+》").unwrap());
    static REGEX_ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"［＃.+?］").unwrap());
    static REGEX_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[｜※]").unwrap());

    let text = REGEX_TAG.replace_all(text, "");
    let text = REGEX_READING.replace_all(&text, "");
    let text = REGEX_ANNOTATION.replace_all(&text, "");
    let text = REGEX_MARKER.replace_all(&text, "");

    text.trim_matches(|c| c == ' ' || c == '　').to_owned()
}

fn truncate(s: &str, length: usize) -> String {
    s.chars().take(length).collect()
}
