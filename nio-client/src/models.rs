use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation that is never granted. Checks against it are denied locally.
pub const IMPOSSIBLE: &str = "impossible";

/// The conventional inheritance edge between an object and its parent.
pub const PARENT: &str = "parent";

/// Placeholder relation for user sets where the relation carries no meaning.
pub const UNSPECIFIED: &str = "...";

/// Root sentinel shared by namespaces and objects.
pub const ROOT: &str = "root";

/// Principal handed to handlers of public resources when no session exists.
pub const ANONYMOUS: &str = "anonymous";

/// Consistency token with no freshness requirement.
pub const EPOCH: &str = "1:0000000000000";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// A namespace partitions objects by type, e.g. `article`.
    Ns
);
string_id!(
    /// An object inside a namespace.
    Obj
);
string_id!(
    /// A relation on an object, e.g. `article.get` or `parent`.
    Rel
);
string_id!(
    /// The subject asking for access, usually a session token.
    UserId
);
string_id!(
    /// The subject the backend names as the grantor of a relation.
    Principal
);
string_id!(
    /// Consistency token of the form `<version>:<revision>`.
    Timestamp
);

impl Ns {
    pub fn root() -> Self {
        Self::new(ROOT)
    }
}

impl Obj {
    pub fn root() -> Self {
        Self::new(ROOT)
    }
}

impl Rel {
    pub fn impossible() -> Self {
        Self::new(IMPOSSIBLE)
    }

    pub fn parent() -> Self {
        Self::new(PARENT)
    }

    pub fn unspecified() -> Self {
        Self::new(UNSPECIFIED)
    }

    pub fn is_impossible(&self) -> bool {
        self.0 == IMPOSSIBLE
    }
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS)
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS
    }
}

impl From<&Principal> for UserId {
    fn from(principal: &Principal) -> Self {
        Self(principal.0.clone())
    }
}

impl Timestamp {
    pub fn epoch() -> Self {
        Self::new(EPOCH)
    }

    /// Builds a timestamp from an optional hint where an empty hint means epoch.
    pub fn from_hint(hint: &str) -> Self {
        if hint.is_empty() {
            Self::epoch()
        } else {
            Self::new(hint)
        }
    }
}

/// All users holding `rel` on `obj` in `ns`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSet {
    pub ns: Ns,
    pub obj: Obj,
    pub rel: Rel,
}

impl UserSet {
    pub fn new(ns: impl Into<Ns>, obj: impl Into<Obj>, rel: impl Into<Rel>) -> Self {
        Self {
            ns: ns.into(),
            obj: obj.into(),
            rel: rel.into(),
        }
    }
}

impl fmt::Display for UserSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.ns, self.obj, self.rel)
    }
}

/// Subject side of a relationship tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TupleUser {
    UserId(UserId),
    UserSet(UserSet),
}

impl TupleUser {
    /// Reads `ns:obj#rel` as a user set and anything else as a user id.
    pub fn parse(s: &str) -> Self {
        let user_set = s.split_once(':').and_then(|(ns, rest)| {
            let (obj, rel) = rest.split_once('#')?;
            (!ns.is_empty() && !obj.is_empty() && !rel.is_empty())
                .then(|| UserSet::new(ns, obj, rel))
        });
        match user_set {
            Some(user_set) => TupleUser::UserSet(user_set),
            None => TupleUser::UserId(UserId::new(s)),
        }
    }
}

impl fmt::Display for TupleUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TupleUser::UserId(user_id) => write!(f, "{user_id}"),
            TupleUser::UserSet(user_set) => write!(f, "{user_set}"),
        }
    }
}

/// Relationship fact: `user` has `rel` on `obj` in `ns`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuple {
    pub ns: Ns,
    pub obj: Obj,
    pub rel: Rel,
    pub user: TupleUser,
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}@{}", self.ns, self.obj, self.rel, self.user)
    }
}

/// Outcome of a successful check round trip.
///
/// An allowed decision always names its principal. A denial may carry the
/// principal the backend reported as partial information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed(Principal),
    Denied(Option<Principal>),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Decision::Allowed(principal) => Some(principal),
            Decision::Denied(principal) => principal.as_ref(),
        }
    }
}
