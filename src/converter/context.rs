// 1 回の変換の間だけ使う状態
// 変換ごとに作り直し，複数の変換で共有しない
#[derive(Debug)]
pub struct ConversionContext {
    // 改ページ後の行数
    pub page_line_number: usize,
    // セクション内の出力文字数（空ページの判定用）
    pub section_char_length: usize,

    // 栞用 id の連番と，最後に番号を振った行
    pub bookmark_id: usize,
    pub bookmark_id_line: Option<usize>,

    // ブロックの字下げ中（入れ子にはしない）
    pub in_indent: bool,

    // 改ページ後に章名を取得済み
    pub chapter_started: bool,

    pub vertical: bool,
}

impl ConversionContext {
    pub fn new(vertical: bool) -> Self {
        Self {
            page_line_number: 0,
            section_char_length: 0,
            bookmark_id: 0,
            bookmark_id_line: None,
            in_indent: false,
            chapter_started: false,
            vertical,
        }
    }

    // 本文を出力する行ごとに栞用 id を進める
    pub fn touch_bookmark(&mut self, line_number: usize) {
        if self.bookmark_id_line != Some(line_number) {
            self.bookmark_id += 1;
            self.bookmark_id_line = Some(line_number);
        }
    }

    pub fn start_section(&mut self) {
        self.page_line_number = 0;
        self.section_char_length = 0;
        self.chapter_started = false;
    }
}
