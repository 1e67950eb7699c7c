//! Header collections used for both request input and response output.

/// Capability interface the engine reads request headers from and writes
/// response headers to.
pub trait HeaderCollection {
    fn count(&self) -> Result<usize, HeaderError>;

    /// Name and value of the header at `index`, in insertion order.
    fn get(&self, index: usize) -> Result<(&str, &str), HeaderError>;

    fn add(&mut self, name: &str, value: &str) -> Result<(), HeaderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("no header at index {0}")]
    IndexOutOfRange(usize),

    #[error("invalid header name {0:?}")]
    InvalidName(String),

    #[error("value of header {0:?} contains a line break")]
    InvalidValue(String),

    #[error("header collection rejected the entry")]
    Rejected,
}

/// Ordered name/value list.
///
/// Adding a name that is already present (compared ASCII case-insensitively)
/// appends the new value to the existing one, separated by `", "`, so each
/// name occupies a single slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets `name` to `value`, dropping any earlier value.
    pub fn replace(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        validate_name(name)?;
        validate_value(name, value)?;
        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HeaderCollection for HeaderList {
    fn count(&self) -> Result<usize, HeaderError> {
        Ok(self.entries.len())
    }

    fn get(&self, index: usize) -> Result<(&str, &str), HeaderError> {
        self.entries
            .get(index)
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .ok_or(HeaderError::IndexOutOfRange(index))
    }

    fn add(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        validate_name(name)?;
        validate_value(name, value)?;
        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => {
                entry.1.push_str(", ");
                entry.1.push_str(value);
            }
            None => self.entries.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), HeaderError> {
    let bad = |b: u8| b <= b' ' || b == b':' || b == 0x7f;
    if name.is_empty() || name.bytes().any(bad) {
        return Err(HeaderError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_value(name: &str, value: &str) -> Result<(), HeaderError> {
    if value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0) {
        return Err(HeaderError::InvalidValue(name.to_string()));
    }
    Ok(())
}
