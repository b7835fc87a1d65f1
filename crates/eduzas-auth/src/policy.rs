//! Authorization decisions.
//!
//! Services look up the caller's relation to a resource (class membership,
//! ownership, authorship) and ask these functions whether the action is
//! allowed. Keeping the decisions free of I/O makes every rule testable
//! without a database.

use uuid::Uuid;

use crate::role::Role;

/// The caller's relation to one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassAccess {
    /// The caller is listed in `class_professors`.
    pub is_professor: bool,
    /// The caller is an owner professor of the class.
    pub is_owner: bool,
    /// The caller is enrolled in `class_students`.
    pub is_enrolled: bool,
}

/// Who may author tests, resources and classes.
pub fn can_create_content(role: Role) -> bool {
    matches!(role, Role::Professor | Role::Admin)
}

/// Class update, delete and professor management.
pub fn can_manage_class(role: Role, access: ClassAccess) -> bool {
    role.is_admin() || (role.is_professor() && access.is_owner)
}

pub fn can_view_class(role: Role, access: ClassAccess) -> bool {
    role.is_admin() || access.is_professor || access.is_enrolled
}

/// Acting on a class as one of its teachers: roster, notifications, answers.
pub fn can_moderate_class(role: Role, access: ClassAccess) -> bool {
    role.is_admin() || (role.is_professor() && access.is_professor)
}

/// Removing `student_id` from a class.
pub fn can_unenroll(role: Role, caller: Uuid, student_id: Uuid, access: ClassAccess) -> bool {
    caller == student_id || can_moderate_class(role, access)
}

pub fn can_view_user(role: Role, is_self: bool) -> bool {
    is_self || matches!(role, Role::Admin | Role::Professor)
}

/// Update or delete of a test or resource.
pub fn can_manage_owned(role: Role, is_owner: bool) -> bool {
    role.is_admin() || is_owner
}

/// Attaching an owned test or resource to a class.
pub fn can_assign_to_class(role: Role, is_owner: bool, access: ClassAccess) -> bool {
    role.is_admin() || (is_owner && access.is_professor)
}

pub fn can_view_answer(role: Role, is_author: bool, access: ClassAccess) -> bool {
    is_author || can_moderate_class(role, access)
}

/// Restriction forced onto a search depending on who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// No restriction.
    Everything,
    /// Only rows related to this student.
    Student(Uuid),
    /// Only rows related to this professor.
    Professor(Uuid),
}

pub fn scope_for(role: Role, user_id: Uuid) -> SearchScope {
    match role {
        Role::Admin => SearchScope::Everything,
        Role::Professor => SearchScope::Professor(user_id),
        Role::Student => SearchScope::Student(user_id),
    }
}
