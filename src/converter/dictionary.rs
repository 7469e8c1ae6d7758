use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::Read,
    path::Path,
};

use anyhow::{bail, ensure, Context, Result};
use csv::StringRecord;

// タブ区切りの設定ファイルを 1 行ずつ読む
// '#' で始まる行と空行は飛ばす．壊れた行はログに出して読み込みを続ける
fn read_tsv_records<R: Read>(reader: R, source: &str) -> Vec<(u64, StringRecord)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut records = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line());
                records.push((line, record));
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                tracing::error!(source, line, error = %e, "Failed to read dictionary line");
            }
        }
    }
    records
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationFlag {
    NoBreak,           // 1: 行を <p> で括らない
    RubySuppressStart, // 2: ルビ・縦中横の自動変換を止める
    RubySuppressEnd,   // 3: 止めていた変換を戻す
    PageBreak,         // P: 改ページ
}

impl AnnotationFlag {
    pub fn of(c: char) -> Result<Self> {
        match c {
            '1' => Ok(Self::NoBreak),
            '2' => Ok(Self::RubySuppressStart),
            '3' => Ok(Self::RubySuppressEnd),
            'P' => Ok(Self::PageBreak),
            c => bail!("Unknown annotation flag: {:?}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRule {
    pub name: String,
    pub open_tag: String,
    // 行末に出力するタグ
    pub close_tag: Option<String>,
    pub flags: HashSet<AnnotationFlag>,
}

impl AnnotationRule {
    pub fn new(name: &str, open_tag: &str, close_tag: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            open_tag: open_tag.to_owned(),
            close_tag: close_tag.map(|t| t.to_owned()),
            flags: HashSet::new(),
        }
    }

    pub fn with_flag(mut self, flag: AnnotationFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn has_flag(&self, flag: AnnotationFlag) -> bool {
        self.flags.contains(&flag)
    }

    fn from_record(record: &StringRecord) -> Result<Self> {
        let name = record.get(0).unwrap_or_default();
        ensure!(!name.is_empty(), "Annotation name is empty");
        let open_tag = record
            .get(1)
            .with_context(|| format!("Open tag is missing: {:?}", name))?;
        let close_tag = record.get(2).filter(|t| !t.is_empty());

        let mut rule = Self::new(name, open_tag, close_tag);
        if let Some(flags) = record.get(3) {
            for c in flags.chars() {
                rule.flags.insert(AnnotationFlag::of(c)?);
            }
        }
        Ok(rule)
    }
}

// 注記名 → タグ
#[derive(Debug, Default)]
pub struct AnnotationDictionary {
    rules: HashMap<String, AnnotationRule>,
}

impl AnnotationDictionary {
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Self {
        let mut rules = HashMap::new();
        for (line, record) in read_tsv_records(reader, source) {
            match AnnotationRule::from_record(&record) {
                Ok(rule) => {
                    rules.insert(rule.name.clone(), rule);
                }
                Err(e) => {
                    tracing::error!(source, line, error = %e, "Malformed annotation rule");
                }
            }
        }
        Self { rules }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::from_reader(file, &path.display().to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&AnnotationRule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn has_flag(&self, name: &str, flag: AnnotationFlag) -> bool {
        self.get(name).map_or(false, |rule| rule.has_flag(flag))
    }

    // 出力用の内部タグ
    // Converter::new で存在を確認しているので見つからなければ空文字列
    pub fn tag(&self, name: &str) -> &str {
        self.get(name).map_or("", |rule| rule.open_tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<AnnotationRule> for AnnotationDictionary {
    fn from_iter<I: IntoIterator<Item = AnnotationRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardReferenceRule {
    pub name: String,
    pub before_tag: String,
    pub after_tag: Option<String>,
    pub alias: Option<String>,
}

impl ForwardReferenceRule {
    fn from_record(record: &StringRecord) -> Result<Self> {
        let name = record.get(0).unwrap_or_default();
        ensure!(!name.is_empty(), "Forward reference name is empty");
        let before_tag = record
            .get(1)
            .filter(|t| !t.is_empty())
            .with_context(|| format!("Before tag is missing: {:?}", name))?;

        Ok(Self {
            name: name.to_owned(),
            before_tag: before_tag.to_owned(),
            after_tag: record.get(2).filter(|t| !t.is_empty()).map(|t| t.to_owned()),
            alias: record.get(3).filter(|t| !t.is_empty()).map(|t| t.to_owned()),
        })
    }
}

// ［＃「○○」は太字］ の "は太字" → 前後の注記名
#[derive(Debug, Default)]
pub struct ForwardReferenceDictionary {
    rules: HashMap<String, ForwardReferenceRule>,
}

impl ForwardReferenceDictionary {
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Self {
        let mut dictionary = Self::default();
        for (line, record) in read_tsv_records(reader, source) {
            match ForwardReferenceRule::from_record(&record) {
                Ok(rule) => dictionary.insert(rule),
                Err(e) => {
                    tracing::error!(source, line, error = %e, "Malformed forward reference rule");
                }
            }
        }
        dictionary
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::from_reader(file, &path.display().to_string()))
    }

    fn insert(&mut self, rule: ForwardReferenceRule) {
        // 別名は "別名 + 注記名" でも引けるようにする
        if let Some(alias) = &rule.alias {
            self.rules.insert(format!("{}{}", alias, rule.name), rule.clone());
        }
        self.rules.insert(rule.name.clone(), rule);
    }

    pub fn get(&self, name: &str) -> Option<&ForwardReferenceRule> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<ForwardReferenceRule> for ForwardReferenceDictionary {
    fn from_iter<I: IntoIterator<Item = ForwardReferenceRule>>(iter: I) -> Self {
        let mut dictionary = Self::default();
        for rule in iter {
            dictionary.insert(rule);
        }
        dictionary
    }
}

// 1 文字 → 置換文字列
#[derive(Debug, Default)]
pub struct ReplacementTable {
    map: HashMap<char, String>,
}

impl ReplacementTable {
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Self {
        let mut map = HashMap::new();
        for (line, record) in read_tsv_records(reader, source) {
            let key = record.get(0).unwrap_or_default();
            let mut chars = key.chars();
            let c = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    tracing::error!(source, line, key, "Replacement key is not a single char");
                    continue;
                }
            };
            match record.get(1) {
                Some(value) => {
                    map.insert(c, value.to_owned());
                }
                None => {
                    tracing::error!(source, line, key, "Replacement value is missing");
                }
            }
        }
        Self { map }
    }

    // ファイルがなければ None
    pub fn from_file_if_exists(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Some(Self::from_reader(file, &path.display().to_string())))
    }

    pub fn get(&self, c: char) -> Option<&str> {
        self.map.get(&c).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(char, String)> for ReplacementTable {
    fn from_iter<I: IntoIterator<Item = (char, String)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
