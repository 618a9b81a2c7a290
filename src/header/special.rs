use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeVersion {
    pub major: u8,
    pub minor: u8,
}

pub const MIME_VERSION_1_0: MimeVersion = MimeVersion { major: 1, minor: 0 };

impl Default for MimeVersion {
    fn default() -> Self {
        MIME_VERSION_1_0
    }
}

impl Display for MimeVersion {
    fn fmt(&self, f: &mut FmtFormatter) -> FmtResult {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Message importance carried by `X-Priority:`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High = 1,
    Normal = 3,
    Low = 5,
}

impl Priority {
    /// Look up the priority by its numeric level
    ///
    /// Levels outside of the known ones give `None`.
    pub fn from_level(level: i32) -> Option<Self> {
        use self::Priority::*;
        match level {
            1 => Some(High),
            3 => Some(Normal),
            5 => Some(Low),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut FmtFormatter) -> FmtResult {
        use self::Priority::*;
        f.write_str(match *self {
            High => "1 (Highest)",
            Normal => "3 (Normal)",
            Low => "5 (Lowest)",
        })
    }
}

/// Message sensitivity carried by `Sensitivity:`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Confidential = 1,
    Personal = 2,
    Private = 3,
}

impl Sensitivity {
    /// Look up the sensitivity by its numeric level
    pub fn from_level(level: i32) -> Option<Self> {
        use self::Sensitivity::*;
        match level {
            1 => Some(Confidential),
            2 => Some(Personal),
            3 => Some(Private),
            _ => None,
        }
    }
}

impl Display for Sensitivity {
    fn fmt(&self, f: &mut FmtFormatter) -> FmtResult {
        use self::Sensitivity::*;
        f.write_str(match *self {
            Confidential => "Company-Confidential",
            Personal => "Personal",
            Private => "Private",
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Priority, Sensitivity, MIME_VERSION_1_0};

    #[test]
    fn mime_version() {
        assert_eq!(MIME_VERSION_1_0.to_string(), "1.0");
    }

    #[test]
    fn priority_levels() {
        assert_eq!(Priority::from_level(1), Some(Priority::High));
        assert_eq!(Priority::from_level(5).map(|p| p.to_string()), Some("5 (Lowest)".into()));
        assert_eq!(Priority::from_level(2), None);
        assert_eq!(Priority::from_level(99), None);
    }

    #[test]
    fn sensitivity_levels() {
        assert_eq!(
            Sensitivity::from_level(1).map(|s| s.to_string()),
            Some("Company-Confidential".into())
        );
        assert_eq!(Sensitivity::from_level(3), Some(Sensitivity::Private));
        assert_eq!(Sensitivity::from_level(0), None);
    }
}
