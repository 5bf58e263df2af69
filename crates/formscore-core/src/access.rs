//! Permission resolution: decide view/edit/respond capability for a
//! principal against a form.
//!
//! Resolution never fails. An unresolvable principal yields all
//! capabilities false; callers turn `can_edit == false` or
//! `can_respond == false` into a rejection before any write reaches the
//! engine.

use serde::{Deserialize, Serialize};

use crate::model::FormDefinition;

/// The standing the identity provider reports for the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Standing {
    /// Elevated standing: may preview any form, may not respond.
    Admin,
    /// Logged-in user.
    Authenticated,
    /// No identity.
    Anonymous,
}

/// The caller attempting an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub standing: Standing,
}

impl Principal {
    pub fn authenticated(email: &str) -> Self {
        Self {
            email: email.into(),
            standing: Standing::Authenticated,
        }
    }

    pub fn admin(email: &str) -> Self {
        Self {
            email: email.into(),
            standing: Standing::Admin,
        }
    }
}

/// What the caller may do with a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_respond: bool,
}

fn email_matches(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn email_in(list: &[String], email: &str) -> bool {
    list.iter().any(|entry| email_matches(entry, email))
}

/// Resolve the capabilities of `principal` (optionally presenting an
/// access token) against `form`.
///
/// Edit is ownership-based: owner or collaborator, case-insensitive.
/// Public forms are viewable and respondable by everyone. Private forms
/// require edit rights, an allow-list match, or the form's access token;
/// token access needs no principal and never grants edit. Admin standing
/// may view any form for inspection but is barred from responding.
pub fn resolve(
    principal: Option<&Principal>,
    presented_token: Option<&str>,
    form: &FormDefinition,
) -> Capabilities {
    let can_edit = principal.is_some_and(|p| {
        email_matches(&p.email, &form.owner_id) || email_in(&form.collaborators, &p.email)
    });

    let is_admin = principal.is_some_and(|p| p.standing == Standing::Admin);

    let token_ok = presented_token
        .is_some_and(|t| !form.access_token.is_empty() && t == form.access_token);

    let has_access = if form.is_private {
        can_edit
            || token_ok
            || principal.is_some_and(|p| email_in(&form.allowed_users, &p.email))
    } else {
        true
    };

    let can_view = has_access || is_admin;
    // Admin preview is inspection, not participation.
    let can_respond = has_access && !is_admin;

    Capabilities {
        can_view,
        can_edit,
        can_respond,
    }
}
