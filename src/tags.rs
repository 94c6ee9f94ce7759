/// An OSM tag that may carry a single value or several.
///
/// Multi-valued tags come out of the PBF as `"2;3"`; they are split once at
/// load time so every consumer only ever asks for the first value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Single(String),
    Multiple(Vec<String>),
}

impl TagValue {
    /// Parse a raw OSM tag value, splitting on `;`.
    pub fn parse(raw: &str) -> Self {
        if raw.contains(';') {
            TagValue::Multiple(raw.split(';').map(|v| v.trim().to_string()).collect())
        } else {
            TagValue::Single(raw.trim().to_string())
        }
    }

    /// First value, or `None` for an empty list.
    pub fn first(&self) -> Option<&str> {
        match self {
            TagValue::Single(v) => Some(v.as_str()),
            TagValue::Multiple(vs) => vs.first().map(String::as_str),
        }
    }

    pub fn first_or<'a>(tag: Option<&'a TagValue>, default: &'a str) -> &'a str {
        tag.and_then(TagValue::first).unwrap_or(default)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Single(value.to_string())
    }
}

impl From<Vec<&str>> for TagValue {
    fn from(values: Vec<&str>) -> Self {
        TagValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_semicolon_lists() {
        let tag = TagValue::parse("2;3");
        assert_eq!(tag, TagValue::Multiple(vec!["2".into(), "3".into()]));
        assert_eq!(tag.first(), Some("2"));
    }

    #[test]
    fn missing_or_empty_tags_use_default() {
        assert_eq!(TagValue::first_or(None, "2"), "2");
        let empty = TagValue::Multiple(vec![]);
        assert_eq!(TagValue::first_or(Some(&empty), "2"), "2");
        let single = TagValue::from("primary");
        assert_eq!(TagValue::first_or(Some(&single), ""), "primary");
    }
}
