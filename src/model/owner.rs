use serde::ser::{Serialize, SerializeMap, Serializer};

/// Account type shown on a profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Registered,
    Moderator,
    Unregistered,
    DoesNotExist,
}

/// A fully resolved profile
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RegisteredOwner {
    pub account_id: i64,
    pub reputation: i64,
    pub user_id: i64,
    pub user_type: UserType,
    pub profile_image: String,
    pub display_name: String,
    pub link: String,
}

/// The attributed author of a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// The profile page was reached and read
    Registered(RegisteredOwner),

    /// The post has no profile link and was not migrated
    DoesNotExist { display_name: String },

    /// A migrated post whose owner could not be followed back to this site
    NameOnly { display_name: String },
}

impl Owner {
    pub fn display_name(&self) -> &str {
        match self {
            Owner::Registered(owner) => &owner.display_name,
            Owner::DoesNotExist { display_name } | Owner::NameOnly { display_name } => display_name,
        }
    }
}

impl Serialize for Owner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Owner::Registered(owner) => owner.serialize(serializer),
            Owner::DoesNotExist { display_name } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("user_type", &UserType::DoesNotExist)?;
                map.serialize_entry("display_name", display_name)?;
                map.end()
            }
            Owner::NameOnly { display_name } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("display_name", display_name)?;
                map.end()
            }
        }
    }
}
