use anyhow::Result;
use pretty_assertions::assert_eq;

use aozora_epub3::{
    config::ConverterConfig,
    converter::{
        char_mapper::CharMapper, dictionary::ReplacementTable, section::SingleFileSink,
        Converter, Dictionaries,
    },
    metadata::BookMetadata,
};

fn map(mapper: &CharMapper, s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut buf = String::new();
    for i in 0..chars.len() {
        mapper.push(&mut buf, &chars, i);
    }
    buf
}

#[test]
fn test_horizontal() {
    let mapper = CharMapper::new(None, false);

    assert_eq!(map(&mapper, "a<b>&c"), "a&lt;b&gt;&amp;c");
    assert_eq!(map(&mapper, "<<注>>"), "&lt;&lt;注&gt;&gt;");
    assert_eq!(map(&mapper, "“引用”≪注≫―"), "“引用”≪注≫―");
    assert_eq!(map(&mapper, "＜＜注＞＞"), "《注》");
}

#[test]
fn test_vertical() {
    let mapper = CharMapper::new(None, true);

    assert_eq!(map(&mapper, "“引用”≪注≫―"), "〝引用〟《注》─");
    assert_eq!(map(&mapper, "<<注>>"), "《注》");
    // 2 つちょうどでなければまとめない
    assert_eq!(map(&mapper, "<<<a>"), "&lt;&lt;&lt;a&gt;");
    assert_eq!(map(&mapper, "＜＜＜"), "＜＜＜");
    assert_eq!(map(&mapper, "&"), "&amp;");
}

#[test]
fn test_replacement_table() {
    let table: ReplacementTable = [('＊', "※".to_owned()), ('&', "＆".to_owned())]
        .into_iter()
        .collect();
    let mapper = CharMapper::new(Some(&table), true);

    // 置換表が優先
    assert_eq!(map(&mapper, "＊&“"), "※＆〝");
}

#[test]
fn test_replacement_table_in_converter() -> Result<()> {
    let table: ReplacementTable = [('＊', "★".to_owned())].into_iter().collect();
    let dictionaries = Dictionaries::builtin().with_replacements(table);
    let converter = Converter::new(&dictionaries, &ConverterConfig::default())?;

    let mut out = Vec::new();
    converter.convert(
        "＊印＊".as_bytes(),
        &mut out,
        &BookMetadata::default(),
        &mut SingleFileSink::new(),
    )?;
    assert_eq!(String::from_utf8(out)?, "<p>★印★</p>\n");

    Ok(())
}
