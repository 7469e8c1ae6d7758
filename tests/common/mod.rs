#![allow(dead_code)]

use anyhow::Result;

use aozora_epub3::{
    config::ConverterConfig,
    converter::{section::SingleFileSink, Converter, Dictionaries},
    metadata::BookMetadata,
};

pub static BODY: &str = "<p>本文</p>\n";
pub static SEPARATOR: &str = "<hr class=\"page-break\"/>\n";

pub fn convert(txt: &str) -> Result<String> {
    convert_with(
        txt,
        &BookMetadata::default(),
        &ConverterConfig::default(),
        &mut SingleFileSink::new(),
    )
}

pub fn convert_vertical(txt: &str) -> Result<String> {
    convert_with(
        txt,
        &BookMetadata::new(true),
        &ConverterConfig::default(),
        &mut SingleFileSink::new(),
    )
}

pub fn convert_with(
    txt: &str,
    metadata: &BookMetadata,
    config: &ConverterConfig,
    sink: &mut SingleFileSink,
) -> Result<String> {
    let dictionaries = Dictionaries::builtin();
    let converter = Converter::new(&dictionaries, config)?;

    let mut out = Vec::new();
    converter.convert(txt.as_bytes(), &mut out, metadata, sink)?;
    Ok(String::from_utf8(out)?)
}

// "本文" が count 行
pub fn body_lines(count: usize) -> Vec<String> {
    vec!["本文".to_owned(); count]
}
