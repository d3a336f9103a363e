use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Numeric identity assigned by the master index.
///
/// Ids are allocated from a monotonically increasing sequence and are never
/// reused, even when the transaction that allocated them rolls back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasterId(pub i64);

impl MasterId {
    /// Placeholder carried by records that have not been written yet.
    pub const UNASSIGNED: MasterId = MasterId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for MasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Foreign reference from a domain record to its master entity.
///
/// `master_id` and `master_uuid` are immutable once assigned and are the
/// only columns other tables may hold to point at a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterRef {
    pub master_id: MasterId,
    pub master_uuid: Uuid,
}

impl MasterRef {
    pub fn new(master_id: MasterId, master_uuid: Uuid) -> Self {
        Self {
            master_id,
            master_uuid,
        }
    }

    /// The reference a record holds before its creation transaction runs.
    pub fn unassigned() -> Self {
        Self::default()
    }

    pub fn is_assigned(&self) -> bool {
        self.master_id.is_assigned() && !self.master_uuid.is_nil()
    }

    /// Parse the UUID half from its hyphenated string form.
    pub fn parse_uuid(s: &str) -> Result<Uuid, TypeError> {
        Uuid::from_str(s).map_err(|_| TypeError::InvalidUuid(s.to_string()))
    }
}

impl fmt::Display for MasterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "master:{}/{}", self.master_id, self.master_uuid)
    }
}

/// Tenant / campaign scoping dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub i64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CampaignId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
