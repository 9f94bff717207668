//! Pure validation rules applied before a user is persisted.

use crate::entity::User;

use super::{IdentityError, Result};

/// Checks the shape of a user about to be created.
pub fn validate_user(user: &User) -> Result<()> {
    if user.user_name.trim().is_empty() {
        return Err(IdentityError::InvalidUser("user name is empty".to_string()));
    }
    if !user.email.contains('@') {
        return Err(IdentityError::InvalidUser(format!(
            "'{}' is not an email address",
            user.email
        )));
    }
    if user.audit.is_persisted() {
        return Err(IdentityError::InvalidUser(
            "user is already persisted".to_string(),
        ));
    }
    Ok(())
}

/// Rejects `candidate` if its user name or email is taken by `existing`.
pub fn ensure_unique_user(existing: &[User], candidate: &User) -> Result<()> {
    for user in existing {
        if user.normalized_user_name == candidate.normalized_user_name {
            return Err(IdentityError::DuplicateUserName(candidate.user_name.clone()));
        }
        if user.normalized_email == candidate.normalized_email {
            return Err(IdentityError::DuplicateEmail(candidate.email.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_accepts_new_user() {
        let user = User::new("alice", "alice@example.com", "system");
        assert!(validate_user(&user).is_ok());
    }

    #[test]
    fn test_validate_user_rejects_blank_name() {
        let user = User::new("  ", "alice@example.com", "system");
        assert!(matches!(
            validate_user(&user),
            Err(IdentityError::InvalidUser(_))
        ));
    }

    #[test]
    fn test_validate_user_rejects_bad_email() {
        let user = User::new("alice", "alice.example.com", "system");
        assert!(validate_user(&user).is_err());
    }

    #[test]
    fn test_validate_user_rejects_persisted_user() {
        let mut user = User::new("alice", "alice@example.com", "system");
        user.audit.id = Some(1);
        assert!(validate_user(&user).is_err());
    }

    #[test]
    fn test_duplicate_user_name_is_case_insensitive() {
        let existing = vec![User::new("Alice", "a@example.com", "system")];
        let candidate = User::new("alice", "other@example.com", "system");

        assert_eq!(
            ensure_unique_user(&existing, &candidate),
            Err(IdentityError::DuplicateUserName("alice".to_string()))
        );
    }

    #[test]
    fn test_duplicate_email() {
        let existing = vec![User::new("alice", "a@example.com", "system")];
        let candidate = User::new("bob", "A@Example.com", "system");

        assert_eq!(
            ensure_unique_user(&existing, &candidate),
            Err(IdentityError::DuplicateEmail("A@Example.com".to_string()))
        );
    }

    #[test]
    fn test_unique_user_passes() {
        let existing = vec![User::new("alice", "a@example.com", "system")];
        let candidate = User::new("bob", "b@example.com", "system");

        assert!(ensure_unique_user(&existing, &candidate).is_ok());
    }
}
