use std::collections::BTreeSet;

use crate::domain::UserId;

// ============== Authorization ==============

pub fn is_authorized(user_id: Option<UserId>, allowed_users: &BTreeSet<i64>) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    allowed_users.contains(&user_id.0)
}

/// Authorization gate. Rejections are logged and otherwise silent.
pub fn authorize(user_id: Option<UserId>, allowed_users: &BTreeSet<i64>) -> bool {
    if is_authorized(user_id, allowed_users) {
        return true;
    }
    match user_id {
        Some(id) => tracing::warn!(user_id = id.0, "Unauthorized access attempt by user {id}"),
        None => tracing::warn!("Unauthorized access attempt without a sender"),
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture::CapturedLogs;

    #[test]
    fn members_are_authorized() {
        let allowed = BTreeSet::from([1, 2, 3]);
        assert!(is_authorized(Some(UserId(2)), &allowed));
        assert!(authorize(Some(UserId(3)), &allowed));
    }

    #[test]
    fn strangers_and_missing_senders_are_rejected() {
        let allowed = BTreeSet::from([1]);
        assert!(!is_authorized(Some(UserId(9)), &allowed));
        assert!(!is_authorized(None, &allowed));
        assert!(!authorize(Some(UserId(-1)), &allowed));
    }

    #[test]
    fn rejection_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        {
            let _guard = logs.install();
            assert!(!authorize(Some(UserId(4242)), &BTreeSet::from([1])));
            assert!(!authorize(None, &BTreeSet::from([1])));
            assert!(authorize(Some(UserId(1)), &BTreeSet::from([1])));
        }

        let warnings = logs.lines_at("WARN");
        assert_eq!(warnings.len(), 2, "{}", logs.contents());
        assert!(warnings[0].contains("4242"));
        assert!(warnings[1].contains("without a sender"));
    }

    #[test]
    fn empty_allow_list_rejects_everyone() {
        assert!(!is_authorized(Some(UserId(1)), &BTreeSet::new()));
    }
}
