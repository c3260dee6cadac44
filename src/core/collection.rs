use std::fmt;

/// Named document collections backing the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Students,
    StudentDetails,
    Accounts,
    Collections,
}

impl Collection {
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::StudentDetails => "student_details",
            Collection::Accounts => "accounts",
            Collection::Collections => "collections",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
