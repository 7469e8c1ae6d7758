pub mod char_mapper;
pub mod context;
pub mod dictionary;
pub mod document;
pub mod forward_reference;
pub mod gaiji;
pub mod latin;
pub mod line;
pub mod ruby;
pub mod section;
pub mod tokenizer;

use std::{
    fs,
    io::{BufRead, Write},
    path::Path,
};

use anyhow::{ensure, Context, Result};
use regex::Regex;

use crate::{
    config::ConverterConfig,
    converter::{
        char_mapper::CharMapper,
        context::ConversionContext,
        dictionary::{AnnotationDictionary, ForwardReferenceDictionary, ReplacementTable},
        document::{convert_document, ForcePageBreak},
        gaiji::{CodeGaijiResolver, GaijiResolver, JisX0213Table},
        latin::{AccentDecomposer, LatinDecomposer},
        line::LineWriter,
        ruby::RubyPrinter,
        section::SectionSink,
    },
    metadata::BookMetadata,
};

static CHUKI_TAG: &str = include_str!("../resources/chuki_tag.txt");
static CHUKI_TAG_SUF: &str = include_str!("../resources/chuki_tag_suf.txt");

// 変換結果の出力に必ず使う注記
static REQUIRED_ANNOTATIONS: &[&str] = &[
    "改行",
    "ルビ前",
    "ルビ",
    "ルビ後",
    "縦中横",
    "縦中横終わり",
    "画像開始",
    "画像終了",
    "行右小書き",
    "行右小書き終わり",
    "字下げ省略",
    "折り返し1",
    "折り返し2",
    "折り返し3",
    "字下げ字詰め1",
    "字下げ字詰め2",
    "字下げ字詰め3",
    "字下げ複合1",
    "字下げ複合2",
    "ここで字下げ終わり",
    "表題前",
    "表題後",
    "著者前",
    "著者後",
];

// 変換に使う辞書一式
// 一度作ったら変更せず，複数の変換で共有できる
pub struct Dictionaries {
    pub annotations: AnnotationDictionary,
    pub forward_references: ForwardReferenceDictionary,
    pub replacements: Option<ReplacementTable>,
    pub gaiji: Box<dyn GaijiResolver + Send + Sync>,
    pub latin: Box<dyn LatinDecomposer + Send + Sync>,
}

impl Dictionaries {
    // resources/ に同梱の辞書
    pub fn builtin() -> Self {
        Self {
            annotations: AnnotationDictionary::from_reader(CHUKI_TAG.as_bytes(), "chuki_tag.txt"),
            forward_references: ForwardReferenceDictionary::from_reader(
                CHUKI_TAG_SUF.as_bytes(),
                "chuki_tag_suf.txt",
            ),
            replacements: None,
            gaiji: Box::new(CodeGaijiResolver::new()),
            latin: Box::new(AccentDecomposer),
        }
    }

    // dir/chuki_tag.txt, dir/chuki_tag_suf.txt, dir/replace.txt, dir/jis_x_0213.json
    // replace.txt と jis_x_0213.json はなくてもよい
    pub fn load(dir: &Path) -> Result<Self> {
        let annotations = AnnotationDictionary::from_file(&dir.join("chuki_tag.txt"))?;
        let forward_references =
            ForwardReferenceDictionary::from_file(&dir.join("chuki_tag_suf.txt"))?;
        let replacements = ReplacementTable::from_file_if_exists(&dir.join("replace.txt"))?;

        let jis_path = dir.join("jis_x_0213.json");
        let gaiji = if jis_path.exists() {
            let json = fs::read_to_string(&jis_path)
                .with_context(|| format!("Failed to read {}", jis_path.display()))?;
            CodeGaijiResolver::with_jis_x_0213(JisX0213Table::from_json(&json)?)
        } else {
            CodeGaijiResolver::new()
        };

        Ok(Self {
            annotations,
            forward_references,
            replacements,
            gaiji: Box::new(gaiji),
            latin: Box::new(AccentDecomposer),
        })
    }

    pub fn with_replacements(mut self, replacements: ReplacementTable) -> Self {
        self.replacements = Some(replacements);
        self
    }

    pub fn with_gaiji_resolver(mut self, gaiji: Box<dyn GaijiResolver + Send + Sync>) -> Self {
        self.gaiji = gaiji;
        self
    }
}

pub struct Converter<'a> {
    dictionaries: &'a Dictionaries,
    config: ConverterConfig,
    force_page_break_pattern: Option<Regex>,
}

impl<'a> Converter<'a> {
    pub fn new(dictionaries: &'a Dictionaries, config: &ConverterConfig) -> Result<Self> {
        for name in REQUIRED_ANNOTATIONS {
            ensure!(
                dictionaries.annotations.contains(name),
                "Annotation dictionary has no entry for {:?}",
                name
            );
        }

        let force_page_break_pattern = config
            .force_page_break_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("Invalid forcePageBreakPattern")?;

        Ok(Self {
            dictionaries,
            config: config.clone(),
            force_page_break_pattern,
        })
    }

    // src の青空文庫テキストを XHTML の本文にして out に書き出す
    pub fn convert<R: BufRead, W: Write, S: SectionSink>(
        &self,
        src: R,
        out: &mut W,
        metadata: &BookMetadata,
        sink: &mut S,
    ) -> Result<()> {
        let dictionaries = self.dictionaries;

        let mapper = CharMapper::new(dictionaries.replacements.as_ref(), metadata.vertical);
        let ruby = RubyPrinter::new(&dictionaries.annotations, &mapper, self.config.auto_yoko);
        let writer = LineWriter {
            annotations: &dictionaries.annotations,
            forward_references: &dictionaries.forward_references,
            gaiji: dictionaries.gaiji.as_ref(),
            latin: dictionaries.latin.as_ref(),
            mapper: &mapper,
            ruby: &ruby,
            with_mark_id: self.config.with_mark_id,
        };
        let force_page_break =
            ForcePageBreak::new(&self.config, self.force_page_break_pattern.as_ref());

        let mut context = ConversionContext::new(metadata.vertical);

        convert_document(
            src,
            out,
            metadata,
            &writer,
            &force_page_break,
            self.config.hide_comment_block,
            &mut context,
            sink,
        )?;
        out.flush()?;

        Ok(())
    }
}
