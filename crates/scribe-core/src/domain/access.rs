//! Blog-level authorization decisions.
//!
//! The actor's role is resolved once per operation; callers then ask the
//! resolved [`BlogAccess`] for typed decisions instead of comparing ids inline.

use uuid::Uuid;

use super::blog::{Blog, BlogMember, MemberRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

/// An actor's resolved standing on one blog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlogAccess {
    pub blog_id: Uuid,
    pub actor_id: Uuid,
    pub role: Role,
}

impl BlogAccess {
    /// Resolve the actor's role. `None` means the actor may not see the blog at all.
    pub fn resolve(blog: &Blog, actor_id: Uuid, membership: Option<&BlogMember>) -> Option<Self> {
        let role = if blog.owner_id == actor_id {
            Role::Owner
        } else {
            match membership {
                Some(member)
                    if member.blog_id == blog.id
                        && member.user_id == actor_id
                        && member.role == MemberRole::Editor =>
                {
                    Role::Editor
                }
                _ => return None,
            }
        };

        Some(Self {
            blog_id: blog.id,
            actor_id,
            role,
        })
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// Only owners may move a post into PUBLISHED.
    pub fn can_transition_to_published(&self) -> AccessDecision {
        self.owner_only()
    }

    /// Only owners may delete posts.
    pub fn can_delete(&self) -> AccessDecision {
        self.owner_only()
    }

    fn owner_only(&self) -> AccessDecision {
        if self.is_owner() {
            AccessDecision::Allowed
        } else {
            AccessDecision::Denied
        }
    }
}
