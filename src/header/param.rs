use std::fmt::{Display, Formatter, Result as FmtResult, Write};
use std::slice::Iter;

/// Structured header parameter (`name=value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    #[inline]
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Parameter {
            name: name.into(),
            value: value.into(),
        }
    }
}

// Values made of these characters only are emitted bare
fn is_bare(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

// RFC 2231 attribute-char minus the percent sign itself
fn is_attr_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b)
}

/// Longest percent-encoded segment of an extended value
const MAX_SEGMENT_LENGTH: usize = 60;

// Percent-encoded value split into RFC 2231 continuation segments
fn extended_segments(value: &str) -> Vec<String> {
    let mut segments = vec![String::new()];
    for b in value.bytes() {
        let mut encoded = String::with_capacity(3);
        if is_attr_char(b) {
            encoded.push(b as char);
        } else {
            let _ = write!(encoded, "%{b:02X}");
        }

        match segments.last_mut() {
            Some(segment) if segment.len() + encoded.len() <= MAX_SEGMENT_LENGTH => {
                segment.push_str(&encoded)
            }
            _ => segments.push(encoded),
        }
    }
    segments
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        if !self.value.is_ascii() {
            let segments = extended_segments(&self.value);
            if let [segment] = &segments[..] {
                return write!(f, "{}*=utf-8''{}", self.name, segment);
            }

            for (index, segment) in segments.iter().enumerate() {
                if index == 0 {
                    write!(f, "{}*0*=utf-8''{}", self.name, segment)?;
                } else {
                    write!(f, "; {}*{}*={}", self.name, index, segment)?;
                }
            }
            return Ok(());
        }

        if is_bare(&self.value) {
            return write!(f, "{}={}", self.name, self.value);
        }

        f.write_str(&self.name)?;
        f.write_str("=\"")?;
        for ch in self.value.chars() {
            match ch {
                '"' | '\\' => {
                    f.write_char('\\')?;
                    f.write_char(ch)?;
                }
                '\r' | '\n' => f.write_char(' ')?,
                _ => f.write_char(ch)?,
            }
        }
        f.write_char('"')
    }
}

/// Ordered list of parameters rendered as `a=1; b="x y"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<Parameter>);

impl Parameters {
    #[inline]
    pub fn new() -> Self {
        Parameters(Vec::new())
    }

    /// Add parameter and move the list
    #[inline]
    pub fn with<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.push(Parameter::new(name, value));
        self
    }

    #[inline]
    pub fn push(&mut self, param: Parameter) {
        self.0.push(param);
    }

    /// Value of the first parameter with the given name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|param| param.name.eq_ignore_ascii_case(name))
            .map(|param| param.value.as_str())
    }

    #[inline]
    pub fn iter(&self) -> Iter<Parameter> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<Parameter> for Parameters {
    fn extend<T: IntoIterator<Item = Parameter>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Parameter> for Parameters {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        Parameters(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Parameters {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let mut iter = self.iter();

        if let Some(param) = iter.next() {
            param.fmt(f)?;

            for param in iter {
                f.write_str("; ")?;
                param.fmt(f)?;
            }
        }

        Ok(())
    }
}

/// Render `value; param=...` the way structured headers are written
pub fn with_params(value: &str, params: &Parameters) -> String {
    if params.is_empty() {
        value.into()
    } else {
        format!("{}; {}", value, params)
    }
}

#[cfg(test)]
mod test {
    use super::{with_params, Parameter, Parameters};

    #[test]
    fn format_bare_value() {
        assert_eq!(Parameter::new("charset", "utf-8").to_string(), "charset=utf-8");
    }

    #[test]
    fn format_quoted_value() {
        assert_eq!(
            Parameter::new("filename", "report.pdf").to_string(),
            "filename=\"report.pdf\""
        );
        assert_eq!(
            Parameter::new("name", "say \"hi\"").to_string(),
            "name=\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn format_extended_value() {
        assert_eq!(
            Parameter::new("filename", "отчёт.pdf").to_string(),
            "filename*=utf-8''%D0%BE%D1%82%D1%87%D1%91%D1%82.pdf"
        );
    }

    #[test]
    fn format_long_extended_value_in_segments() {
        let value = format!("{}.pdf", "я".repeat(19));
        let text = Parameter::new("filename", value).to_string();

        let expected = format!(
            "filename*0*=utf-8''{}; filename*1*={}.pdf",
            "%D1%8F".repeat(10),
            "%D1%8F".repeat(9)
        );
        assert_eq!(text, expected);
        assert!(text.split("; ").all(|segment| segment.len() < 78));
    }

    #[test]
    fn format_list() {
        let params = Parameters::new()
            .with("type", "reply")
            .with("uid", "42")
            .with("folder", "SU5CT1g=");
        assert_eq!(params.to_string(), "type=reply; uid=42; folder=\"SU5CT1g=\"");
        assert_eq!(params.get("UID"), Some("42"));
        assert_eq!(
            with_params("text/plain", &Parameters::new().with("charset", "utf-8")),
            "text/plain; charset=utf-8"
        );
        assert_eq!(with_params("inline", &Parameters::new()), "inline");
    }
}
