use serde::{Deserialize, Serialize};

/// CRUD-shaped operation a resource guard is asked to admit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Get,
    Filter,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Filter => "filter",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Action segment checked for this operation. Listing is a read, so
    /// `filter` is checked against `get`.
    pub fn policy_action(self) -> &'static str {
        match self {
            Operation::Filter => Operation::Get.as_str(),
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Operation::Create),
            "get" => Ok(Operation::Get),
            "filter" => Ok(Operation::Filter),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(()),
        }
    }
}
