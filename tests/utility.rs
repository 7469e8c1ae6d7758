use anyhow::Result;
use pretty_assertions::assert_eq;

use aozora_epub3::utility::str::parse_number;

#[test]
fn test_parse_number() -> Result<()> {
    assert_eq!(parse_number("12")?, 12);
    assert_eq!(parse_number("１２")?, 12);
    assert_eq!(parse_number("1２")?, 12);

    assert!(parse_number("").is_err());
    assert!(parse_number("一").is_err());
    assert!(parse_number("99999999999999999999").is_err());

    Ok(())
}
