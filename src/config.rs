use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConverterConfig {
    // 半角 2 文字の数字と !? を縦中横にする
    pub auto_yoko: bool,

    // 栞用の id を行頭の <p> に付ける
    pub with_mark_id: bool,

    // "-----" で囲まれたコメントブロックを出力しない
    pub hide_comment_block: bool,

    // 改ページからこの行数を超えたら空行で強制改ページ（0 で無効）
    pub force_page_break: usize,
    // 強制改ページの対象になる連続した空行数
    pub force_page_break_empty_line: usize,
    // 空行の後の行がこれに一致するときだけ強制改ページ
    pub force_page_break_pattern: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            auto_yoko: true,
            with_mark_id: false,
            hide_comment_block: true,
            force_page_break: 500,
            force_page_break_empty_line: 2,
            force_page_break_pattern: None,
        }
    }
}

impl ConverterConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid config: {}", path.display()))
    }
}
