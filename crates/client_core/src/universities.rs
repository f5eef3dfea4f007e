//! Read-only university lookup table used by the organization field.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStatus {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct University {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct UniversityDirectory {
    status: LookupStatus,
    universities: Vec<University>,
}

impl UniversityDirectory {
    pub fn loading() -> Self {
        Self {
            status: LookupStatus::Loading,
            universities: Vec::new(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: LookupStatus::Failed(reason.into()),
            universities: Vec::new(),
        }
    }

    /// Build the directory from CSV text. The first line is a header, names
    /// come from the first column and blank lines are skipped.
    pub fn from_csv(csv: &str) -> Self {
        let universities = csv
            .lines()
            .skip(1)
            .filter_map(first_column)
            .map(|name| University { name })
            .collect();
        Self {
            status: LookupStatus::Loaded,
            universities,
        }
    }

    pub fn status(&self) -> &LookupStatus {
        &self.status
    }

    pub fn len(&self) -> usize {
        self.universities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universities.is_empty()
    }

    /// Case-insensitive substring search, in file order, capped at `limit`.
    /// An empty query matches everything.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&University> {
        let needle = query.trim().to_lowercase();
        self.universities
            .iter()
            .filter(|university| university.name.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.universities
            .iter()
            .any(|university| university.name.eq_ignore_ascii_case(name))
    }
}

impl Default for UniversityDirectory {
    fn default() -> Self {
        Self::loading()
    }
}

fn first_column(line: &str) -> Option<String> {
    let line = line.trim();
    let name = match line.strip_prefix('"') {
        Some(quoted) => unquote(quoted),
        None => line.split(',').next().unwrap_or_default().to_string(),
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Read a quoted field up to its closing quote. `""` is a literal quote.
fn unquote(quoted: &str) -> String {
    let mut field = String::with_capacity(quoted.len());
    let mut chars = quoted.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '"' {
            field.push(ch);
        } else if chars.next_if_eq(&'"').is_some() {
            field.push('"');
        } else {
            break;
        }
    }
    field
}

#[cfg(test)]
#[path = "tests/universities_tests.rs"]
mod tests;
