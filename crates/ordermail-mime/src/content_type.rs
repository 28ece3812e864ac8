//! MIME content type handling.

use std::fmt;

/// A single `key=value` content type parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Parameter {
    key: String,
    value: String,
    quoted: bool,
}

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "application", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "pdf", "mixed").
    pub sub_type: String,
    parameters: Vec<Parameter>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a `text/plain; charset=UTF-8` content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "UTF-8")
    }

    /// Creates an `application/pdf` content type carrying the file name.
    #[must_use]
    pub fn application_pdf(name: impl Into<String>) -> Self {
        Self::new("application", "pdf").with_quoted_parameter("name", name)
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_quoted_parameter("boundary", boundary)
    }

    /// Adds a parameter, quoting the value only if it contains special characters.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let quoted = needs_quoting(&value);
        self.parameters.push(Parameter {
            key: key.into(),
            value,
            quoted,
        });
        self
    }

    /// Adds a parameter whose value is always written in double quotes.
    #[must_use]
    pub fn with_quoted_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.parameters.push(Parameter {
            key: key.into(),
            value: value.into(),
            quoted: true,
        });
        self
    }
}

/// Renders `value` as an RFC 2045 quoted-string, escaping `\` and `"`.
pub(crate) fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c))
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for Parameter {
            key,
            value,
            quoted: is_quoted,
        } in &self.parameters
        {
            if *is_quoted {
                write!(f, "; {key}={}", quoted(value))?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_type() {
        let ct = ContentType::new("application", "octet-stream");
        assert_eq!(ct.main_type, "application");
        assert_eq!(ct.sub_type, "octet-stream");
        assert_eq!(ct.to_string(), "application/octet-stream");
    }

    #[test]
    fn test_text_plain() {
        assert_eq!(
            ContentType::text_plain().to_string(),
            "text/plain; charset=UTF-8"
        );
    }

    #[test]
    fn test_application_pdf() {
        let ct = ContentType::application_pdf("order-123.pdf");
        assert_eq!(ct.to_string(), "application/pdf; name=\"order-123.pdf\"");
    }

    #[test]
    fn test_multipart_mixed() {
        let ct = ContentType::multipart_mixed("----=_NextPart_1");
        assert_eq!(
            ct.to_string(),
            "multipart/mixed; boundary=\"----=_NextPart_1\""
        );
    }

    #[test]
    fn test_parameter_quoted_only_when_needed() {
        let ct = ContentType::new("text", "plain")
            .with_parameter("charset", "iso-8859-2")
            .with_parameter("format", "a b")
            .with_parameter("delsp", "");

        assert_eq!(
            ct.to_string(),
            "text/plain; charset=iso-8859-2; format=\"a b\"; delsp=\"\""
        );
    }

    #[test]
    fn test_quoted_values_are_escaped() {
        let ct = ContentType::application_pdf(r#"order "123" \ final.pdf"#);
        assert_eq!(
            ct.to_string(),
            r#"application/pdf; name="order \"123\" \\ final.pdf""#
        );
    }
}
