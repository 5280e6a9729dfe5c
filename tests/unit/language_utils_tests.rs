/*!
 * Tests for language code utilities
 */

use sub2anki::language_utils::{
    LanguageCodeType, get_language_name, normalize_to_part2t, validate_language_code, validate_target_language,
};

#[test]
fn test_validate_language_code_withPart1_shouldReturnPart1() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code(" HE ").unwrap(), LanguageCodeType::Part1);
}

#[test]
fn test_validate_language_code_withPart2T_shouldReturnPart2T() {
    assert_eq!(validate_language_code("heb").unwrap(), LanguageCodeType::Part2T);
}

#[test]
fn test_validate_target_language_withGoogleChineseVariants_shouldPass() {
    assert!(validate_target_language("zh-CN").is_ok());
    assert!(validate_target_language("zh-TW").is_ok());
}

#[test]
fn test_normalize_to_part2t_withVariousForms_shouldConverge() {
    assert_eq!(normalize_to_part2t("he").unwrap(), "heb");
    assert_eq!(normalize_to_part2t("iw").unwrap(), "heb");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert!(normalize_to_part2t("xyz1").is_err());
}

#[test]
fn test_get_language_name_shouldReturnEnglishName() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("de").unwrap(), "German");
}
