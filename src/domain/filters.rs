//! Filter objects accepted by the repository `list` operations.

use uuid::Uuid;

/// Single-column ordering parsed from `field` or `-field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    /// Parses an ordering expression; a leading `-` marks descending order.
    ///
    /// Returns `None` for an empty field name.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Zero-based pagination plus optional ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub order_by: Option<OrderBy>,
}

impl Page {
    /// Rows to skip: `page * size`, only when both are set.
    pub fn offset(&self) -> Option<i64> {
        match (self.page, self.size) {
            (Some(page), Some(size)) => Some(i64::from(page) * i64::from(size)),
            _ => None,
        }
    }

    /// Maximum rows to return. A zero size means no limit.
    pub fn limit(&self) -> Option<i64> {
        self.size.filter(|size| *size > 0).map(i64::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFilter {
    pub id_eq: Option<Uuid>,
    pub page: Page,
}

impl PropertyFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id_eq: Some(id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationFilter {
    pub id_eq: Option<Uuid>,
    pub key_eq: Option<String>,
    pub key_in: Option<Vec<String>>,
    pub page: Page,
}

impl ConfigurationFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id_eq: Some(id),
            ..Default::default()
        }
    }

    pub fn key_eq(key: impl Into<String>) -> Self {
        Self {
            key_eq: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn key_in<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_in: Some(keys.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Whether `key` passes the key constraints of this filter.
    pub fn matches_key(&self, key: &str) -> bool {
        if self.key_eq.as_deref().is_some_and(|expected| expected != key) {
            return false;
        }
        if let Some(keys) = &self.key_in {
            return keys.iter().any(|k| k == key);
        }
        true
    }
}
