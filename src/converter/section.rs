use std::io::Write;

use anyhow::Result;
use serde::Serialize;

// 変換結果の出力先
// セクション（ファイル）の切り替えと目次・画像の管理を受け持つ
pub trait SectionSink {
    fn begin_section(&mut self, _out: &mut dyn Write, _line_number: usize) -> Result<()> {
        Ok(())
    }

    fn next_section(&mut self, out: &mut dyn Write, line_number: usize) -> Result<()>;

    fn update_chapter_name(&mut self, name: &str);

    // 出力に使う画像のパス
    // 画像を別の場所（表紙など）に移して本文に出さないなら None
    fn image_file_path(&mut self, src: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub start_line: usize,
    pub chapter_name: Option<String>,
    // 画像のみのページ
    pub image_only: bool,
}

// 全セクションを 1 つの出力に区切り付きで書き出す
#[derive(Debug)]
pub struct SingleFileSink {
    separator: String,
    image_prefix: String,
    // 本文に出さない画像
    skipped_images: Vec<String>,
    image_section_lines: Vec<usize>,

    sections: Vec<Section>,
    images: Vec<String>,
}

impl SingleFileSink {
    pub fn new() -> Self {
        Self {
            separator: "<hr class=\"page-break\"/>\n".to_owned(),
            image_prefix: String::new(),
            skipped_images: Vec::new(),
            image_section_lines: Vec::new(),
            sections: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_owned();
        self
    }

    pub fn with_image_prefix(mut self, prefix: &str) -> Self {
        self.image_prefix = prefix.to_owned();
        self
    }

    pub fn skip_image(mut self, src: &str) -> Self {
        self.skipped_images.push(src.to_owned());
        self
    }

    // BookMetadata::image_section_lines
    pub fn with_image_section_lines(mut self, lines: &[usize]) -> Self {
        self.image_section_lines = lines.to_vec();
        self
    }

    fn push_section(&mut self, line_number: usize) {
        self.sections.push(Section {
            start_line: line_number,
            chapter_name: None,
            image_only: self.image_section_lines.contains(&line_number),
        });
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }
}

impl Default for SingleFileSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionSink for SingleFileSink {
    fn begin_section(&mut self, _out: &mut dyn Write, line_number: usize) -> Result<()> {
        self.push_section(line_number);
        Ok(())
    }

    fn next_section(&mut self, out: &mut dyn Write, line_number: usize) -> Result<()> {
        out.write_all(self.separator.as_bytes())?;
        self.push_section(line_number);
        Ok(())
    }

    fn update_chapter_name(&mut self, name: &str) {
        if let Some(section) = self.sections.last_mut() {
            section.chapter_name = Some(name.to_owned());
        }
    }

    fn image_file_path(&mut self, src: &str) -> Option<String> {
        if self.skipped_images.iter().any(|s| s == src) {
            return None;
        }
        self.images.push(src.to_owned());
        Some(format!("{}{}", self.image_prefix, src))
    }
}
