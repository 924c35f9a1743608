/// Auth Manager - Submitted form data.
///
/// Forms are parsed from `application/x-www-form-urlencoded` bytes so that
/// repeated fields such as `entities[]` keep every value.
use url::form_urlencoded;

/// Default return location after removing groups.
pub const GROUP_LIST_URL: &str = "/groups/";

/// Strip HTML tags from user input, keeping only the text content.
///
/// The text comes back as typed: entities in ammonia's output are decoded.
pub fn sanitize(value: &str) -> String {
    if !value.contains('<') {
        return value.to_string();
    }
    let cleaned = ammonia::Builder::new()
        .tags(std::collections::HashSet::new())
        .clean(value)
        .to_string();
    unescape_text(&cleaned)
}

/// Decode the entities the HTML serializer writes in text nodes.
fn unescape_text(escaped: &str) -> String {
    const ENTITIES: [(&str, char); 4] =
        [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>'), ("&nbsp;", '\u{a0}')];

    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_list_key(key: &str, field: &str) -> bool {
    key == field || key.strip_prefix(field) == Some("[]")
}

/// Create or edit a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupForm {
    pub name: String,
    pub token: String,
}

impl GroupForm {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in form_urlencoded::parse(bytes) {
            match key.as_ref() {
                "name" => form.name = sanitize(&value).trim().to_string(),
                "token" => form.token = value.into_owned(),
                _ => {}
            }
        }
        form
    }
}

/// Groups selected for removal, from the query string or the confirmation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveForm {
    pub entities: Vec<String>,
    pub token: String,
    pub original_url: Option<String>,
}

impl RemoveForm {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in form_urlencoded::parse(bytes) {
            match key.as_ref() {
                k if is_list_key(k, "entities") => form.entities.push(value.into_owned()),
                "token" => form.token = value.into_owned(),
                "originalUrl" => form.original_url = Some(value.into_owned()),
                _ => {}
            }
        }
        form
    }

    /// Where to go once the removal is handled.
    ///
    /// Only local paths are followed; anything else returns to the group list.
    pub fn return_url(&self) -> String {
        self.original_url
            .as_deref()
            .filter(|url| is_local_path(url))
            .unwrap_or(GROUP_LIST_URL)
            .to_string()
    }
}

/// Add or remove permissions of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionUpdateForm {
    pub permission_ids: Vec<i32>,
    pub operation: String,
    pub token: String,
}

impl PermissionUpdateForm {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in form_urlencoded::parse(bytes) {
            match key.as_ref() {
                k if is_list_key(k, "permissionIds") => {
                    if let Ok(id) = value.trim().parse() {
                        form.permission_ids.push(id);
                    }
                }
                "operation" => form.operation = value.into_owned(),
                "token" => form.token = value.into_owned(),
                _ => {}
            }
        }
        form
    }
}

/// `/path` but not `//host` or `/\host`, which browsers treat as another origin.
pub fn is_local_path(url: &str) -> bool {
    url.starts_with('/')
        && !url.starts_with("//")
        && !url.starts_with("/\\")
        && !url.chars().any(char::is_control)
}

/// Reduce a `Referer` header to the path and query of the referring page.
pub fn referer_path(referer: Option<&str>) -> String {
    let Some(referer) = referer.map(str::trim).filter(|r| !r.is_empty()) else {
        return GROUP_LIST_URL.to_string();
    };

    if is_local_path(referer) {
        return referer.to_string();
    }

    match url::Url::parse(referer) {
        Ok(parsed) if parsed.has_host() => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        _ => GROUP_LIST_URL.to_string(),
    }
}

/// Encode a group name as a path segment, spaces as `+`.
pub fn encode_name(name: &str) -> String {
    form_urlencoded::byte_serialize(name.as_bytes()).collect()
}

/// Decode a path segment produced by `encode_name` or typed by hand.
pub fn decode_name(segment: &str) -> String {
    form_urlencoded::parse(format!("n={}", segment.replace('&', "%26")).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
