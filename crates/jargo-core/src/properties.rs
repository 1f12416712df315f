//! The `${name}` expansion primitive.
//!
//! Name lookup is supplied by the caller so the same rules apply whether the
//! names come from a project node chain or from a descriptor being parsed.

use jargo_util::errors::JargoError;

/// Substitutions allowed for one input before it is treated as recursive.
const MAX_SUBSTITUTIONS: usize = 256;

/// Expand every `${name}` reference in `input`.
///
/// - A reference spanning the whole string that cannot be resolved yields
///   `Ok(None)`.
/// - An unresolved reference inside a larger string expands to "".
/// - A `${` without a matching `}` is an error.
///
/// Values are expanded again, so properties may refer to other properties.
pub fn expand_with<F>(input: &str, mut lookup: F) -> miette::Result<Option<String>>
where
    F: FnMut(&str) -> miette::Result<Option<String>>,
{
    let mut result = input.to_string();
    for _ in 0..MAX_SUBSTITUTIONS {
        let Some(start) = result.find("${") else {
            return Ok(Some(result));
        };
        let Some(len) = result[start + 2..].find('}') else {
            return Err(JargoError::PropertyExpansion {
                input: input.to_string(),
                message: "missing '}'".to_string(),
            }
            .into());
        };
        let end = start + 2 + len;
        let value = match lookup(&result[start + 2..end])? {
            Some(v) => v,
            None if start == 0 && end == result.len() - 1 => return Ok(None),
            None => String::new(),
        };
        result.replace_range(start..=end, &value);
    }
    Err(JargoError::PropertyExpansion {
        input: input.to_string(),
        message: "property refers to itself".to_string(),
    }
    .into())
}

/// Expand an optional string; `None` stays `None`.
pub fn expand_opt<F>(input: Option<&str>, lookup: F) -> miette::Result<Option<String>>
where
    F: FnMut(&str) -> miette::Result<Option<String>>,
{
    match input {
        Some(s) => expand_with(s, lookup),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn expand(input: &str, props: &BTreeMap<String, String>) -> miette::Result<Option<String>> {
        expand_with(input, |name| Ok(props.get(name).cloned()))
    }

    #[test]
    fn plain_string_unchanged() {
        let props = table(&[]);
        assert_eq!(expand("1.0", &props).unwrap().as_deref(), Some("1.0"));
    }

    #[test]
    fn nested_references() {
        let props = table(&[("a", "${b}-x"), ("b", "B")]);
        assert_eq!(
            expand("v${a}/${b}", &props).unwrap().as_deref(),
            Some("vB-x/B")
        );
    }

    #[test]
    fn whole_string_unresolved_is_absent() {
        let props = table(&[]);
        assert_eq!(expand("${nope}", &props).unwrap(), None);
    }

    #[test]
    fn embedded_unresolved_is_empty() {
        let props = table(&[]);
        assert_eq!(
            expand("pre-${nope}-post", &props).unwrap().as_deref(),
            Some("pre--post")
        );
    }

    #[test]
    fn unterminated_is_error() {
        let props = table(&[("a", "1")]);
        let err = expand("${a", &props).unwrap_err();
        assert!(err.to_string().contains("Invalid property expression"));
    }

    #[test]
    fn self_reference_is_error() {
        let props = table(&[("a", "x${a}")]);
        assert!(expand("${a}", &props).is_err());
    }
}
