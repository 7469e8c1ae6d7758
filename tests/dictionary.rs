use anyhow::Result;
use pretty_assertions::assert_eq;

use aozora_epub3::{
    config::ConverterConfig,
    converter::{
        dictionary::{
            AnnotationDictionary, AnnotationFlag, ForwardReferenceDictionary, ReplacementTable,
        },
        Converter, Dictionaries,
    },
};

#[test]
fn test_annotation_dictionary() -> Result<()> {
    let tsv = "\
# コメント
太字\t<span class=\"b\">\t</span>

壊れた行
改ページ\t\t\tP
縦中横\t<span class=\"tcy\">\t\t2
不明なフラグ\t<x>\t\tZ
";
    let dictionary = AnnotationDictionary::from_reader(tsv.as_bytes(), "test");
    assert_eq!(dictionary.len(), 3);

    let rule = dictionary.get("太字").unwrap();
    assert_eq!(rule.open_tag, "<span class=\"b\">");
    assert_eq!(rule.close_tag.as_deref(), Some("</span>"));
    assert!(rule.flags.is_empty());

    let rule = dictionary.get("改ページ").unwrap();
    assert_eq!(rule.open_tag, "");
    assert_eq!(rule.close_tag, None);
    assert!(rule.has_flag(AnnotationFlag::PageBreak));

    assert!(dictionary.has_flag("縦中横", AnnotationFlag::RubySuppressStart));
    assert!(!dictionary.has_flag("太字", AnnotationFlag::NoBreak));
    assert!(!dictionary.contains("壊れた行"));
    assert!(!dictionary.contains("不明なフラグ"));

    assert_eq!(dictionary.tag("太字"), "<span class=\"b\">");
    assert_eq!(dictionary.tag("なし"), "");

    Ok(())
}

#[test]
fn test_forward_reference_dictionary() -> Result<()> {
    let tsv = "\
に傍点\t傍点\t傍点終わり\tの右
は地付き\t地付き
は太字
";
    let dictionary = ForwardReferenceDictionary::from_reader(tsv.as_bytes(), "test");

    let rule = dictionary.get("に傍点").unwrap();
    assert_eq!(rule.before_tag, "傍点");
    assert_eq!(rule.after_tag.as_deref(), Some("傍点終わり"));
    // 別名でも引ける
    assert_eq!(dictionary.get("の右に傍点"), Some(rule));

    assert_eq!(dictionary.get("は地付き").unwrap().after_tag, None);
    assert!(dictionary.get("は太字").is_none());

    Ok(())
}

#[test]
fn test_replacement_table() -> Result<()> {
    let tsv = "“\t〝\nab\tx\n”\n";
    let table = ReplacementTable::from_reader(tsv.as_bytes(), "test");

    assert_eq!(table.len(), 1);
    assert_eq!(table.get('“'), Some("〝"));
    assert_eq!(table.get('a'), None);

    Ok(())
}

#[test]
fn test_converter_requires_tags() -> Result<()> {
    let dictionaries = Dictionaries::builtin();
    assert!(Converter::new(&dictionaries, &ConverterConfig::default()).is_ok());

    let mut dictionaries = Dictionaries::builtin();
    dictionaries.annotations = AnnotationDictionary::default();
    assert!(Converter::new(&dictionaries, &ConverterConfig::default()).is_err());

    let dictionaries = Dictionaries::builtin();
    let config = ConverterConfig {
        force_page_break_pattern: Some("(".to_owned()),
        ..ConverterConfig::default()
    };
    assert!(Converter::new(&dictionaries, &config).is_err());

    Ok(())
}

#[test]
fn test_config_defaults() -> Result<()> {
    let config: ConverterConfig = serde_json::from_str(r#"{ "forcePageBreak": 100 }"#)?;
    assert_eq!(
        config,
        ConverterConfig {
            force_page_break: 100,
            ..ConverterConfig::default()
        }
    );

    let config: ConverterConfig =
        serde_json::from_str(r#"{ "autoYoko": false, "forcePageBreakPattern": "^第" }"#)?;
    assert!(!config.auto_yoko);
    assert_eq!(config.force_page_break_pattern.as_deref(), Some("^第"));
    assert_eq!(config.force_page_break_empty_line, 2);

    Ok(())
}
