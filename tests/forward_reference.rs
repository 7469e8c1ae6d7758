mod common;

use anyhow::Result;
use pretty_assertions::assert_eq;

use aozora_epub3::converter::{
    dictionary::ForwardReferenceDictionary, forward_reference::resolve_forward_references,
};

use common::convert;

static CHUKI_TAG_SUF: &str = "\
は小さな文字\t小さな文字\t小さな文字終わり
に傍点\t傍点\t傍点終わり\tの右
は太字\t太字\t太字終わり
は地付き\t地付き
";

fn dictionary() -> ForwardReferenceDictionary {
    ForwardReferenceDictionary::from_reader(CHUKI_TAG_SUF.as_bytes(), "test")
}

#[test]
fn test_forward_reference_quoted_phrase() -> Result<()> {
    let dictionary = dictionary();

    assert_eq!(
        resolve_forward_references("「見出し」［＃「見出し」は小さな文字］", &dictionary),
        "「［＃小さな文字］見出し［＃小さな文字終わり］」"
    );
    assert_eq!(
        resolve_forward_references("吾輩は猫［＃「猫」に傍点］", &dictionary),
        "吾輩は［＃傍点］猫［＃傍点終わり］"
    );

    assert_eq!(
        convert("「見出し」［＃「見出し」は小さな文字］")?,
        "<p>「<span class=\"small\">見出し</span>」</p>\n"
    );

    Ok(())
}

#[test]
fn test_forward_reference_surrounding_tags() -> Result<()> {
    let dictionary = dictionary();

    // 既にある注記を分断しない
    assert_eq!(
        resolve_forward_references("［＃太字］見出し［＃太字終わり］［＃「見出し」に傍点］", &dictionary),
        "［＃傍点］［＃太字］見出し［＃太字終わり］［＃傍点終わり］"
    );
    // 括弧の中で閉じている注記ごと括る
    assert_eq!(
        resolve_forward_references(
            "「［＃太字］見出し［＃太字終わり］」［＃「見出し」は小さな文字］",
            &dictionary
        ),
        "「［＃小さな文字］［＃太字］見出し［＃太字終わり］［＃小さな文字終わり］」"
    );
    // 親文字より前から始まる注記は分断しない
    assert_eq!(
        resolve_forward_references(
            "［＃太字］前見出し［＃太字終わり］」［＃「見出し」は小さな文字］",
            &dictionary
        ),
        "［＃太字］前［＃小さな文字］見出し［＃小さな文字終わり］［＃太字終わり］」"
    );
    // ルビと ｜ は数えない
    assert_eq!(
        resolve_forward_references("前｜漢字《かんじ》［＃「漢字」に傍点］", &dictionary),
        "前［＃傍点］｜漢字《かんじ》［＃傍点終わり］"
    );

    assert_eq!(
        convert("「［＃太字］見出し［＃太字終わり］」［＃「見出し」は大見出し］")?,
        "「<h3 class=\"o-midashi\"><span class=\"b\">見出し</span></h3>」"
    );

    Ok(())
}

#[test]
fn test_forward_reference_multiple() -> Result<()> {
    let dictionary = dictionary();

    assert_eq!(
        resolve_forward_references("猫は［＃「猫」に傍点］犬［＃「犬」は太字］", &dictionary),
        "［＃傍点］猫［＃傍点終わり］は［＃太字］犬［＃太字終わり］"
    );
    // 別名
    assert_eq!(
        resolve_forward_references("猫［＃「猫」の右に傍点］", &dictionary),
        "［＃傍点］猫［＃傍点終わり］"
    );
    // 後ろの注記がなければ前だけ
    assert_eq!(
        resolve_forward_references("著者名［＃「著者名」は地付き］", &dictionary),
        "［＃地付き］著者名"
    );

    Ok(())
}

#[test]
fn test_forward_reference_unregistered() -> Result<()> {
    let dictionary = dictionary();

    assert_eq!(
        resolve_forward_references("猫［＃「猫」は未登録］犬［＃「犬」は太字］", &dictionary),
        "猫［＃「猫」は未登録］［＃太字］犬［＃太字終わり］"
    );

    // 残った注記は出力しない
    assert_eq!(convert("猫［＃「猫」は未登録］")?, "<p>猫</p>\n");

    Ok(())
}
