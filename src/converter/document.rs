use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use regex::Regex;

use crate::{
    config::ConverterConfig,
    converter::{context::ConversionContext, line::LineWriter, section::SectionSink},
    metadata::BookMetadata,
};

// この行から次の同じ行までをコメントとして出力しない
pub const COMMENT_BLOCK_DELIMITER: &str = "-------------------------------------------------------";

// 強制改ページの条件
pub struct ForcePageBreak<'a> {
    // 改ページからの行数がこれを超えたら対象（0 なら強制改ページしない）
    pub threshold: usize,
    pub empty_lines: usize,
    pub pattern: Option<&'a Regex>,
}

impl<'a> ForcePageBreak<'a> {
    pub fn new(config: &ConverterConfig, pattern: Option<&'a Regex>) -> Self {
        Self {
            threshold: config.force_page_break,
            empty_lines: config.force_page_break_empty_line,
            pattern,
        }
    }

    fn is_active(&self, context: &ConversionContext) -> bool {
        self.threshold > 0 && context.page_line_number > self.threshold
    }

    fn matches(&self, empty_lines: usize, next_line: &str) -> bool {
        self.empty_lines <= empty_lines && self.pattern.map_or(true, |p| p.is_match(next_line))
    }
}

#[allow(clippy::too_many_arguments)]
pub fn convert_document<R: BufRead>(
    src: R,
    out: &mut dyn Write,
    metadata: &BookMetadata,
    writer: &LineWriter,
    force_page_break: &ForcePageBreak,
    hide_comment_block: bool,
    context: &mut ConversionContext,
    sink: &mut dyn SectionSink,
) -> Result<()> {
    sink.begin_section(out, 0)?;

    let mut lines = src.lines();
    // 次に読む行の番号
    let mut next_line_number = 0;
    let mut in_comment = false;
    // 空行の先読みで読んだ行（行番号と行）
    let mut pending: Option<(usize, String)> = None;

    loop {
        let (line_number, line) = match pending.take() {
            Some(pending) => pending,
            None => {
                let Some(line) = lines.next() else {
                    break;
                };
                let line =
                    line.with_context(|| format!("Failed to read line {}", next_line_number))?;
                let line_number = next_line_number;
                next_line_number += 1;
                context.page_line_number += 1;
                (line_number, line)
            }
        };

        // 表題・副題・著者
        let heading = if Some(line_number) == metadata.title_line {
            Some(("表題前", "表題後"))
        } else if Some(line_number) == metadata.subtitle_line
            && writer.annotations.contains("副題前")
        {
            Some(("副題前", "副題後"))
        } else if Some(line_number) == metadata.author_line {
            Some(("著者前", "著者後"))
        } else {
            None
        };
        if let Some((before, after)) = heading {
            out.write_all(writer.annotations.tag(before).as_bytes())?;
            writer.write_line(out, &line, line_number, true, context, sink)?;
            out.write_all(writer.annotations.tag(after).as_bytes())?;
            out.write_all(b"\n")?;
            // 章はまだ始まっていない
            context.chapter_started = false;
            continue;
        }

        if hide_comment_block {
            if line.starts_with(COMMENT_BLOCK_DELIMITER) {
                in_comment = !in_comment;
                continue;
            }
            if in_comment {
                continue;
            }
        }

        // 一定行数を超えた後の空行で強制改ページ
        if force_page_break.is_active(context) && line.is_empty() {
            let mut empty_lines = 1;
            let (next_number, next) = loop {
                let Some(next) = lines.next() else {
                    // 空行のまま終わったら出力しない
                    return Ok(());
                };
                let next =
                    next.with_context(|| format!("Failed to read line {}", next_line_number))?;
                let number = next_line_number;
                next_line_number += 1;
                context.page_line_number += 1;
                if !next.is_empty() {
                    break (number, next);
                }
                empty_lines += 1;
            };

            if force_page_break.matches(empty_lines, &next) {
                // 次の行が改ページならそちらで改ページする
                if !writer.starts_with_page_break(&next) {
                    sink.next_section(out, next_number)?;
                    context.start_section();
                }
            } else {
                for _ in 0..empty_lines {
                    writer.write_line(out, "", next_number, false, context, sink)?;
                }
            }

            // 空行の後の行も表題・コメントの判定を通す
            pending = Some((next_number, next));
            continue;
        }

        writer.write_line(out, &line, line_number, false, context, sink)?;
    }

    Ok(())
}
