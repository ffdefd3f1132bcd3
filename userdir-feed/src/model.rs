use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub title: String,
}

/// One entry of the directory, as returned by the list endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Avatar URL.
    pub image: String,
    pub university: String,
    pub company: Company,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Avatar fallback: first letter of each name.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .next()
            .into_iter()
            .chain(self.last_name.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// JSON body of `GET <base>/GetUsersList`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEnvelope {
    pub users: Vec<UserRecord>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

/// A fetched batch of users plus its offset metadata.
///
/// Pages are immutable once built; the cache owns them for the rest of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub users: Vec<UserRecord>,
    pub skip: u64,
    pub limit: u64,
    pub total: u64,
}

impl Page {
    pub fn from_envelope(index: usize, envelope: PageEnvelope) -> Self {
        Self {
            index,
            users: envelope.users,
            skip: envelope.skip,
            limit: envelope.limit,
            total: envelope.total,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
