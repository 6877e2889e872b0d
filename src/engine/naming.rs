use std::collections::BTreeMap;

const GROUP_SEPARATOR: &str = " - ";

/// `"<label> <n>"`, with `" - <group>"` appended when a dominant group is known.
pub fn auto_name(label: &str, number: u32, dominant: Option<&str>) -> String {
    match dominant {
        Some(group) => format!("{label} {number}{GROUP_SEPARATOR}{group}"),
        None => format!("{label} {number}"),
    }
}

/// Sequence number of a name produced by [`auto_name`], or `None` if the
/// name does not follow the pattern.
pub fn parse_auto_name(name: &str, label: &str) -> Option<u32> {
    let rest = name.strip_prefix(label)?.strip_prefix(' ')?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let number = rest[..digits_end].parse().ok()?;
    match &rest[digits_end..] {
        "" => Some(number),
        tail => {
            let group = tail.strip_prefix(GROUP_SEPARATOR)?;
            (!group.is_empty()).then_some(number)
        }
    }
}

/// Next free sequence number among auto-named tables.
pub fn next_number<'a>(names: impl IntoIterator<Item = &'a str>, label: &str) -> u32 {
    names
        .into_iter()
        .filter_map(|n| parse_auto_name(n, label))
        .max()
        .map_or(1, |n| n + 1)
}

/// Group with the largest summed headcount. Ties go to the
/// lexicographically smallest label; guests without a group are ignored.
pub fn dominant_group<'a>(seated: impl IntoIterator<Item = (Option<&'a str>, u32)>) -> Option<String> {
    let mut totals: BTreeMap<&str, u32> = BTreeMap::new();
    for (group, count) in seated {
        if let Some(group) = group
            && count > 0
        {
            *totals.entry(group).or_default() += count;
        }
    }
    let mut best: Option<(&str, u32)> = None;
    for (group, total) in totals {
        if best.is_none_or(|(_, t)| total > t) {
            best = Some((group, total));
        }
    }
    best.map(|(g, _)| g.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_names_parse_back() {
        assert_eq!(parse_auto_name(&auto_name("Table", 3, None), "Table"), Some(3));
        assert_eq!(
            parse_auto_name(&auto_name("Table", 12, Some("Family")), "Table"),
            Some(12)
        );
    }

    #[test]
    fn manual_names_do_not_parse() {
        for name in ["Head table", "Table", "Table x", "Table 3b", "Table 3 - ", "Tables 3", "table 3"] {
            assert_eq!(parse_auto_name(name, "Table"), None, "{name}");
        }
    }

    #[test]
    fn next_number_skips_manual_names() {
        let names = ["Table 1", "Table 4 - Work", "VIP"];
        assert_eq!(next_number(names, "Table"), 5);
        assert_eq!(next_number(["VIP"], "Table"), 1);
    }

    #[test]
    fn dominant_group_sums_headcount() {
        let seated = [(Some("work"), 2), (Some("family"), 1), (Some("family"), 2), (None, 9)];
        assert_eq!(dominant_group(seated).as_deref(), Some("family"));
    }

    #[test]
    fn dominant_group_tie_is_lexicographic() {
        let seated = [(Some("work"), 3), (Some("family"), 3)];
        assert_eq!(dominant_group(seated).as_deref(), Some("family"));
        assert_eq!(dominant_group([(None, 4)]), None);
    }
}
