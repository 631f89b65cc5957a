//! Resource query operations.
//!
//! Every status transition is a single conditional `UPDATE ... WHERE
//! status = ?`, so two workers racing on the same resource cannot both win:
//! the loser observes zero affected rows instead of overwriting.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use stellar_common::{PlanetId, ResourceId, ResourceKind, ResourceStatus, UserId};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::models::Resource;
use crate::queries::{parse_timestamp, parse_uuid};

const RESOURCE_COLUMNS: &str = "id, kind, status, user_id, planet_id, prompt, output_path, \
                                error_message, created_at, updated_at";

fn map_resource(row: &Row<'_>) -> rusqlite::Result<Resource> {
    let id = parse_uuid(0, &row.get::<_, String>(0)?)?;
    let kind: ResourceKind = row.get::<_, String>(1)?.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;
    let status: ResourceStatus = row.get::<_, String>(2)?.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;
    let user_id = match row.get::<_, Option<String>>(3)? {
        Some(s) => Some(UserId::from(parse_uuid(3, &s)?)),
        None => None,
    };
    let planet_id = match row.get::<_, Option<String>>(4)? {
        Some(s) => Some(PlanetId::from(parse_uuid(4, &s)?)),
        None => None,
    };

    Ok(Resource {
        id: ResourceId::from(id),
        kind,
        status,
        user_id,
        planet_id,
        prompt: row.get(5)?,
        output_path: row.get(6)?,
        error_message: row.get(7)?,
        created_at: parse_timestamp(&row.get::<_, String>(8)?),
        updated_at: parse_timestamp(&row.get::<_, String>(9)?),
    })
}

/// Create a new resource in `pending` status.
pub fn create_resource(
    conn: &Connection,
    kind: ResourceKind,
    user_id: Option<UserId>,
    planet_id: Option<PlanetId>,
    prompt: &str,
) -> Result<Resource> {
    let id = ResourceId::from(Uuid::new_v4());
    let now = Utc::now();

    conn.execute(
        "INSERT INTO resources (id, kind, status, user_id, planet_id, prompt, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            id.to_string(),
            kind.to_string(),
            ResourceStatus::Pending.to_string(),
            user_id.map(|u| u.to_string()),
            planet_id.map(|p| p.to_string()),
            prompt,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ],
    )
    .map_err(|e| DbError::database(e.to_string()))?;

    Ok(Resource {
        id,
        kind,
        status: ResourceStatus::Pending,
        user_id,
        planet_id,
        prompt: prompt.to_string(),
        output_path: None,
        error_message: None,
        created_at: now,
        updated_at: now,
    })
}

/// Get a resource by ID.
pub fn get_resource(conn: &Connection, id: ResourceId) -> Result<Resource> {
    conn.query_row(
        &format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?"),
        [id.to_string()],
        map_resource,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("resource"),
        _ => DbError::database(e.to_string()),
    })
}

/// Transition `pending -> generating`.
///
/// Returns `true` if this call won the transition, `false` if the resource
/// was not in `pending` (or does not exist).
pub fn mark_generating(conn: &Connection, id: ResourceId) -> Result<bool> {
    let now = Utc::now();
    let affected = conn
        .execute(
            "UPDATE resources SET status = 'generating', error_message = NULL, updated_at = ?
             WHERE id = ? AND status = 'pending'",
            params![now.to_rfc3339(), id.to_string()],
        )
        .map_err(|e| DbError::database(e.to_string()))?;

    Ok(affected > 0)
}

/// Transition `generating -> approved`, recording the output path.
///
/// Returns `false` without touching the row when the resource is no longer
/// in `generating`.
pub fn approve(conn: &Connection, id: ResourceId, output_path: &str) -> Result<bool> {
    let now = Utc::now();
    let affected = conn
        .execute(
            "UPDATE resources SET status = 'approved', output_path = ?, error_message = NULL,
             updated_at = ?
             WHERE id = ? AND status = 'generating'",
            params![output_path, now.to_rfc3339(), id.to_string()],
        )
        .map_err(|e| DbError::database(e.to_string()))?;

    Ok(affected > 0)
}

/// Transition `generating -> pending`, recording the failure message so the
/// resource becomes eligible for retry or manual review.
///
/// Returns `false` without touching the row when the resource is no longer
/// in `generating`.
pub fn revert_to_pending(conn: &Connection, id: ResourceId, error_message: &str) -> Result<bool> {
    let now = Utc::now();
    let affected = conn
        .execute(
            "UPDATE resources SET status = 'pending', error_message = ?, updated_at = ?
             WHERE id = ? AND status = 'generating'",
            params![error_message, now.to_rfc3339(), id.to_string()],
        )
        .map_err(|e| DbError::database(e.to_string()))?;

    Ok(affected > 0)
}

/// Revert every `generating` resource to `pending`.
///
/// Run at worker startup: a resource still in `generating` at that point was
/// stranded by a previous session.
pub fn reset_orphaned(conn: &Connection) -> Result<usize> {
    let now = Utc::now();
    let affected = conn
        .execute(
            "UPDATE resources SET status = 'pending',
             error_message = 'Interrupted by worker shutdown', updated_at = ?
             WHERE status = 'generating'",
            params![now.to_rfc3339()],
        )
        .map_err(|e| DbError::database(e.to_string()))?;

    Ok(affected)
}

/// List resources in the given status, oldest first.
pub fn list_by_status(
    conn: &Connection,
    status: ResourceStatus,
    limit: i64,
) -> Result<Vec<Resource>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE status = ?
             ORDER BY created_at ASC LIMIT ?"
        ))
        .map_err(|e| DbError::database(e.to_string()))?;

    let rows = stmt
        .query_map(params![status.to_string(), limit], map_resource)
        .map_err(|e| DbError::database(e.to_string()))?;

    let mut resources = Vec::new();
    for row in rows {
        resources.push(row.map_err(|e| DbError::database(e.to_string()))?);
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_and_get_resource() {
        let conn = setup_test_db();
        let user = UserId::new();

        let resource = create_resource(
            &conn,
            ResourceKind::AvatarImage,
            Some(user),
            None,
            "an explorer in a worn vac suit",
        )
        .unwrap();

        let fetched = get_resource(&conn, resource.id).unwrap();
        assert_eq!(fetched.kind, ResourceKind::AvatarImage);
        assert_eq!(fetched.status, ResourceStatus::Pending);
        assert_eq!(fetched.user_id, Some(user));
        assert_eq!(fetched.planet_id, None);
        assert_eq!(fetched.prompt, "an explorer in a worn vac suit");
        assert_eq!(fetched.output_path, None);
    }

    #[test]
    fn test_get_missing_resource() {
        let conn = setup_test_db();
        let err = get_resource(&conn, ResourceId::new()).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn test_mark_generating_only_from_pending() {
        let conn = setup_test_db();
        let resource =
            create_resource(&conn, ResourceKind::PlanetImage, None, Some(PlanetId::new()), "x")
                .unwrap();

        assert!(mark_generating(&conn, resource.id).unwrap());
        assert_eq!(
            get_resource(&conn, resource.id).unwrap().status,
            ResourceStatus::Generating
        );

        // Second claim loses: the resource is no longer pending.
        assert!(!mark_generating(&conn, resource.id).unwrap());
    }

    #[test]
    fn test_approve_only_from_generating() {
        let conn = setup_test_db();
        let resource = create_resource(&conn, ResourceKind::PlanetVideo, None, None, "x").unwrap();

        // Not yet generating: approval affects nothing.
        assert!(!approve(&conn, resource.id, "/media/out.mp4").unwrap());
        assert_eq!(
            get_resource(&conn, resource.id).unwrap().status,
            ResourceStatus::Pending
        );

        mark_generating(&conn, resource.id).unwrap();
        assert!(approve(&conn, resource.id, "/media/out.mp4").unwrap());

        let fetched = get_resource(&conn, resource.id).unwrap();
        assert_eq!(fetched.status, ResourceStatus::Approved);
        assert_eq!(fetched.output_path, Some("/media/out.mp4".to_string()));

        // Approving again is a lost race, not an overwrite.
        assert!(!approve(&conn, resource.id, "/media/other.mp4").unwrap());
    }

    #[test]
    fn test_revert_to_pending_records_error() {
        let conn = setup_test_db();
        let resource = create_resource(&conn, ResourceKind::PlanetImage, None, None, "x").unwrap();
        mark_generating(&conn, resource.id).unwrap();

        assert!(revert_to_pending(&conn, resource.id, "Image generation failed.").unwrap());

        let fetched = get_resource(&conn, resource.id).unwrap();
        assert_eq!(fetched.status, ResourceStatus::Pending);
        assert_eq!(
            fetched.error_message,
            Some("Image generation failed.".to_string())
        );

        // Already pending: nothing to revert.
        assert!(!revert_to_pending(&conn, resource.id, "again").unwrap());
    }

    #[test]
    fn test_reset_orphaned_only_touches_generating() {
        let conn = setup_test_db();
        let a = create_resource(&conn, ResourceKind::AvatarImage, None, None, "a").unwrap();
        let b = create_resource(&conn, ResourceKind::PlanetImage, None, None, "b").unwrap();
        let c = create_resource(&conn, ResourceKind::PlanetVideo, None, None, "c").unwrap();

        mark_generating(&conn, a.id).unwrap();
        mark_generating(&conn, b.id).unwrap();
        approve(&conn, b.id, "/media/b.png").unwrap();

        assert_eq!(reset_orphaned(&conn).unwrap(), 1);
        assert_eq!(
            get_resource(&conn, a.id).unwrap().status,
            ResourceStatus::Pending
        );
        assert_eq!(
            get_resource(&conn, b.id).unwrap().status,
            ResourceStatus::Approved
        );
        assert_eq!(
            get_resource(&conn, c.id).unwrap().status,
            ResourceStatus::Pending
        );
    }

    #[test]
    fn test_list_by_status() {
        let conn = setup_test_db();
        let a = create_resource(&conn, ResourceKind::AvatarImage, None, None, "a").unwrap();
        let _b = create_resource(&conn, ResourceKind::PlanetImage, None, None, "b").unwrap();
        mark_generating(&conn, a.id).unwrap();

        let pending = list_by_status(&conn, ResourceStatus::Pending, 10).unwrap();
        assert_eq!(pending.len(), 1);
        let generating = list_by_status(&conn, ResourceStatus::Generating, 10).unwrap();
        assert_eq!(generating.len(), 1);
        assert_eq!(generating[0].id, a.id);
    }
}
