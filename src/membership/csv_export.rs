use bson::oid::ObjectId;
use chrono::SecondsFormat;

use crate::{
    membership::user_view_model::UserViewModel,
    utils::csv_utils::{CsvValue, write_rows},
};

fn date_field(date: &Option<chrono::DateTime<chrono::Utc>>) -> CsvValue {
    CsvValue::Str(
        date.map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
    )
}

fn is_managed_by(user: &UserViewModel, group_id: &ObjectId) -> bool {
    user.enrollment
        .as_ref()
        .and_then(|enrollment| enrollment.managed_by)
        .map(|managed_by| managed_by == *group_id)
        .unwrap_or(false)
}

fn has_sso_linkage(user: &UserViewModel, group_id: &ObjectId) -> bool {
    user.enrollment
        .as_ref()
        .and_then(|enrollment| enrollment.sso.as_ref())
        .map(|linkages| linkages.iter().any(|l| l.group_id == *group_id))
        .unwrap_or(false)
}

/// Builds the members export. The `managed` column appears when the group has
/// managed users enabled, the `sso` column when the group carries an SSO
/// config; both compare each member's enrollment against the group id.
pub fn build_members_csv(
    users: &[UserViewModel],
    group_id: Option<ObjectId>,
    managed_users_active: bool,
    sso_active: bool,
) -> String {
    let mut header = vec![
        CsvValue::Str("email".to_string()),
        CsvValue::Str("last_logged_in_at".to_string()),
        CsvValue::Str("last_active_at".to_string()),
    ];
    if managed_users_active {
        header.push(CsvValue::Str("managed".to_string()));
    }
    if sso_active {
        header.push(CsvValue::Str("sso".to_string()));
    }

    let mut rows = vec![header];
    for user in users {
        let mut row = vec![
            CsvValue::Str(user.email.clone().unwrap_or_default()),
            date_field(&user.last_logged_in_at),
            date_field(&user.last_active_at),
        ];
        if managed_users_active {
            let managed = group_id
                .as_ref()
                .map(|id| is_managed_by(user, id))
                .unwrap_or(false);
            row.push(CsvValue::Bool(managed));
        }
        if sso_active {
            let sso = group_id
                .as_ref()
                .map(|id| has_sso_linkage(user, id))
                .unwrap_or(false);
            row.push(CsvValue::Bool(sso));
        }
        rows.push(row);
    }

    write_rows(&rows)
}
