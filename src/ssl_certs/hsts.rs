//! # HSTS 字段推导
//!
//! 只接受 `on`/`off` 两个开关值；未开启 HSTS 时其余字段一律使用默认值

use super::types::HstsSettings;

const ON: &str = "on";
const OFF: &str = "off";

fn switch(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::trim) {
        Some(ON) => Some(true),
        Some(OFF) => Some(false),
        _ => None,
    }
}

fn max_age(raw: Option<&str>) -> Option<i32> {
    let raw = raw.map(str::trim)?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// 从提交的原始值推导 HSTS 设置
#[must_use]
pub fn derive_hsts(
    allow_hsts: Option<&str>,
    hsts_max_age: Option<&str>,
    hsts_include_subdomains: Option<&str>,
) -> HstsSettings {
    let allow_hsts = switch(allow_hsts).unwrap_or(false);
    if !allow_hsts {
        return HstsSettings::default();
    }

    HstsSettings {
        allow_hsts,
        max_age: max_age(hsts_max_age).unwrap_or(HstsSettings::DEFAULT_MAX_AGE),
        include_subdomains: switch(hsts_include_subdomains).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, None, false, 31_536_000, false)]
    #[case(Some("off"), Some("600"), Some("on"), false, 31_536_000, false)]
    #[case(Some("yes"), Some("600"), Some("on"), false, 31_536_000, false)]
    #[case(Some("on"), None, None, true, 31_536_000, false)]
    #[case(Some("on"), Some("600"), Some("on"), true, 600, true)]
    #[case(Some("on"), Some("0"), Some("off"), true, 0, false)]
    #[case(Some("on"), Some("-5"), Some("maybe"), true, 31_536_000, false)]
    #[case(Some("on"), Some("12abc"), None, true, 31_536_000, false)]
    #[case(Some("on"), Some("99999999999"), None, true, 31_536_000, false)]
    #[case(Some(" on "), Some(" 86400 "), Some(" on "), true, 86_400, true)]
    fn derivation_table(
        #[case] allow: Option<&str>,
        #[case] age: Option<&str>,
        #[case] include: Option<&str>,
        #[case] expected_allow: bool,
        #[case] expected_age: i32,
        #[case] expected_include: bool,
    ) {
        assert_eq!(
            derive_hsts(allow, age, include),
            HstsSettings {
                allow_hsts: expected_allow,
                max_age: expected_age,
                include_subdomains: expected_include,
            }
        );
    }
}
