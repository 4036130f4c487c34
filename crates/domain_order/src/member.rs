//! Member entity

use serde::{Deserialize, Serialize};

use core_kernel::MemberId;

use crate::address::Address;

/// A shop member who places orders
///
/// The member's orders are not navigable from here; orders point at their
/// member, never the other way round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub address: Address,
}

/// A member that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDraft {
    pub name: String,
    pub address: Address,
}

impl MemberDraft {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    /// Attaches the key assigned by the store
    pub fn into_member(self, id: MemberId) -> Member {
        Member {
            id,
            name: self.name,
            address: self.address,
        }
    }
}
