use serde::{Deserialize, Serialize};

// 冒頭の解析で得られた表題・著者の情報
// 行番号は 0 始まりで，変換時にその行を表題・著者のタグで括る
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub title_line: Option<usize>,
    pub author: Option<String>,
    pub author_line: Option<usize>,
    pub subtitle: Option<String>,
    pub subtitle_line: Option<usize>,

    pub vertical: bool,

    // 画像だけのセクションの開始行
    pub image_section_lines: Vec<usize>,
}

impl BookMetadata {
    pub fn new(vertical: bool) -> Self {
        Self {
            vertical,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: &str, line: usize) -> Self {
        self.title = Some(title.to_owned());
        self.title_line = Some(line);
        self
    }

    pub fn with_author(mut self, author: &str, line: usize) -> Self {
        self.author = Some(author.to_owned());
        self.author_line = Some(line);
        self
    }

    pub fn with_subtitle(mut self, subtitle: &str, line: usize) -> Self {
        self.subtitle = Some(subtitle.to_owned());
        self.subtitle_line = Some(line);
        self
    }
}
