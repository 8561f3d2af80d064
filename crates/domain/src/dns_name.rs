use crate::DomainError;
use std::fmt;
use std::str::FromStr;

/// Maximum length of a single label on the wire.
pub const MAX_LABEL_LEN: usize = 63;

/// Maximum length of an encoded name, length octets and root label included.
pub const MAX_NAME_LEN: usize = 255;

/// A domain name as an ordered sequence of labels, root label implied.
///
/// Case is preserved exactly as received. Derived equality is therefore
/// case-sensitive; use [`DomainName::eq_ignore_case`] wherever two names
/// from different records have to be matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DomainName {
    labels: Vec<Box<[u8]>>,
}

impl DomainName {
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a name from raw labels, enforcing the wire-format limits.
    pub fn from_labels<I, L>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut out = Vec::new();
        let mut wire_len = 1;

        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(DomainError::InvalidDomainName(
                    "empty label".to_string(),
                ));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(DomainError::InvalidDomainName(format!(
                    "label of {} bytes exceeds {}",
                    label.len(),
                    MAX_LABEL_LEN
                )));
            }
            wire_len += 1 + label.len();
            if wire_len > MAX_NAME_LEN {
                return Err(DomainError::InvalidDomainName(format!(
                    "name exceeds {} bytes",
                    MAX_NAME_LEN
                )));
            }
            out.push(Box::from(label));
        }

        Ok(Self { labels: out })
    }

    pub fn labels(&self) -> impl ExactSizeIterator<Item = &[u8]> {
        self.labels.iter().map(|label| &**label)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of bytes this name takes when written without compression.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| 1 + l.len()).sum::<usize>() + 1
    }

    /// ASCII case-insensitive comparison (RFC 4343).
    pub fn eq_ignore_case(&self, other: &DomainName) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(&other.labels)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}

impl FromStr for DomainName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_labels(trimmed.split('.'))
            .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", s, e)))
    }
}
