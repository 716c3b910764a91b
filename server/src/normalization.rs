use serde::{Deserialize, Deserializer};

/// Normalizes a display name by stripping surrounding whitespace and
/// recomposing it into Unicode Normalization Form C.
///
/// ```
/// use backend::normalization::normalize_name;
/// assert_eq!(normalize_name(" hï "), "hï");
/// ```
pub fn normalize_name(name: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    name.as_ref().trim().nfc().to_string()
}

/// Normalizes an email address: NFC, surrounding whitespace stripped,
/// case-folded. Uniqueness checks and lookups both go through this, so
/// `A@b.c` and `a@B.C` address the same account.
pub fn normalize_email(email: impl AsRef<str>) -> String {
    normalize_name(email).to_lowercase()
}

/// Deserializes a `String` after running it through `normalize_name`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(normalize_name(s))
}

/// Deserializes an optional `String` after running it through `normalize_name`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let o: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(o.map(normalize_name))
}

/// Deserializes an optional `String` after running it through `normalize_email`.
pub fn deserialize_email_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let o: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(o.map(normalize_email))
}
