use pretty_assertions::assert_eq;

use aozora_epub3::converter::{
    tokenizer::{tokenize_line, IndentDirective, LineToken, TokenKind},
    Dictionaries,
};

fn kinds(line: &str) -> Vec<(usize, usize, String)> {
    let dictionaries = Dictionaries::builtin();
    let chars: Vec<char> = line.chars().collect();
    tokenize_line(&chars, &dictionaries.annotations)
        .into_iter()
        .map(|LineToken { start, end, kind }| (start, end, format!("{:?}", kind)))
        .collect()
}

#[test]
fn test_tokenize_literal() {
    assert_eq!(kinds("吾輩は猫である"), [(0, 7, "Literal".to_owned())]);
    // 空の注記と閉じていない注記は本文
    assert_eq!(kinds("あ［＃］い"), [(0, 5, "Literal".to_owned())]);
    assert_eq!(kinds("あ［＃い"), [(0, 4, "Literal".to_owned())]);
    assert_eq!(kinds("<span>"), [(0, 6, "Literal".to_owned())]);
}

#[test]
fn test_tokenize_annotations() {
    let dictionaries = Dictionaries::builtin();
    let chars: Vec<char> = "前［＃改ページ］後".chars().collect();
    let tokens = tokenize_line(&chars, &dictionaries.annotations);

    assert_eq!(tokens.len(), 3);
    assert_eq!((tokens[0].start, tokens[0].end), (0, 1));
    assert!(matches!(
        &tokens[1].kind,
        TokenKind::DictionaryAnnotation { name, .. } if name == "改ページ"
    ));
    assert_eq!((tokens[1].start, tokens[1].end), (1, 8));
    assert_eq!(tokens[2].kind, TokenKind::Literal);

    let chars: Vec<char> = "返［＃（ス）］".chars().collect();
    let tokens = tokenize_line(&chars, &dictionaries.annotations);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].kind, TokenKind::CorrectiveReading("ス".to_owned()));
    assert_eq!(tokens[1].end, 7);

    let chars: Vec<char> = "猫［＃「猫」は未登録］".chars().collect();
    let tokens = tokenize_line(&chars, &dictionaries.annotations);
    assert_eq!(
        tokens[1].kind,
        TokenKind::ForwardReference {
            target: "猫".to_owned(),
            name: "は未登録".to_owned(),
        }
    );

    let chars: Vec<char> = "［＃ほげ］".chars().collect();
    let tokens = tokenize_line(&chars, &dictionaries.annotations);
    assert_eq!(tokens[0].kind, TokenKind::Unknown("ほげ".to_owned()));
}

#[test]
fn test_tokenize_indent_directive() {
    let dictionaries = Dictionaries::builtin();
    let directive = |line: &str| {
        let chars: Vec<char> = line.chars().collect();
        tokenize_line(&chars, &dictionaries.annotations)
            .into_iter()
            .next()
            .map(|token| token.kind)
    };

    assert_eq!(
        directive("［＃ここから３字下げ、折り返して１字下げ］"),
        Some(TokenKind::IndentDirective(IndentDirective::Wrap {
            indent: 3,
            wrap: 1
        }))
    );
    assert_eq!(
        directive("［＃ここから2字下げ、12字詰め］"),
        Some(TokenKind::IndentDirective(IndentDirective::WidthLimited {
            indent: 2,
            width: 12
        }))
    );
    assert_eq!(
        directive("［＃ここから４字下げ、地付き］"),
        Some(TokenKind::IndentDirective(IndentDirective::Compound { indent: 4 }))
    );
    assert_eq!(
        directive("［＃ここで字下げ終わり、地付き終わり］"),
        Some(TokenKind::IndentDirective(IndentDirective::End))
    );
}

#[test]
fn test_tokenize_image() {
    let dictionaries = Dictionaries::builtin();
    let image = |line: &str| {
        let chars: Vec<char> = line.chars().collect();
        tokenize_line(&chars, &dictionaries.annotations)
            .into_iter()
            .next()
            .map(|token| token.kind)
    };

    assert_eq!(
        image("［＃表紙（表紙.jpg）］"),
        Some(TokenKind::ImageReference {
            src: "表紙.jpg".to_owned(),
            title: "表紙".to_owned(),
        })
    );
    assert_eq!(
        image("［＃（img/fig01.png、横320×縦240）入る］"),
        Some(TokenKind::ImageReference {
            src: "img/fig01.png".to_owned(),
            title: "fig01.png".to_owned(),
        })
    );
    assert_eq!(
        image("<IMG SRC='fig.png' ALT=\"挿絵\">"),
        Some(TokenKind::ImageReference {
            src: "fig.png".to_owned(),
            title: "挿絵".to_owned(),
        })
    );

    assert_eq!(
        image("［＃挿絵（fig.png入る］"),
        Some(TokenKind::Malformed("［＃挿絵（fig.png入る］".to_owned()))
    );
    assert_eq!(
        image("<img alt=\"図\">"),
        Some(TokenKind::Malformed("<img alt=\"図\">".to_owned()))
    );
    assert_eq!(
        image("<a href=\"x.html\">"),
        Some(TokenKind::PassthroughTag("<a href=\"x.html\">".to_owned()))
    );
}
