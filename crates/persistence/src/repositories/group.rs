//! Group repository for database operations.
//!
//! Also hosts the membership guard queries (`is_member`, `is_admin`) that
//! every privileged operation consults. Admin is not a role column: the
//! group's creator is the sole admin.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    GroupEntity, GroupMembershipEntity, GroupWithCountEntity, MemberWithUserEntity,
};
use crate::metrics::QueryTimer;

/// Repository for group-related database operations.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new group, adding the creator and any initial members.
    ///
    /// Group row and membership rows are inserted in one transaction so a
    /// group can never exist without its creator as a member.
    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: Uuid,
        initial_members: &[Uuid],
    ) -> Result<GroupEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_group");

        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, GroupEntity>(
            r#"
            INSERT INTO groups (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_by, is_active, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO group_memberships (group_id, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(group.id)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

        for member_id in initial_members {
            if *member_id == created_by {
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO group_memberships (group_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (group_id, user_id) DO NOTHING
                "#,
            )
            .bind(group.id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(group)
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_by_id");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, description, created_by, is_active, created_at, updated_at
            FROM groups
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a group with its member count.
    pub async fn find_with_member_count(
        &self,
        id: Uuid,
    ) -> Result<Option<GroupWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_group_with_member_count");
        let result = sqlx::query_as::<_, GroupWithCountEntity>(
            r#"
            SELECT
                g.id, g.name, g.description, g.created_by, g.created_at,
                (SELECT COUNT(*) FROM group_memberships WHERE group_id = g.id) as member_count
            FROM groups g
            WHERE g.id = $1 AND g.is_active = true
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find all groups a user belongs to, most recently joined first.
    pub async fn find_user_groups(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<GroupWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_groups");
        let result = sqlx::query_as::<_, GroupWithCountEntity>(
            r#"
            SELECT
                g.id, g.name, g.description, g.created_by, g.created_at,
                (SELECT COUNT(*) FROM group_memberships WHERE group_id = g.id) as member_count
            FROM groups g
            JOIN group_memberships gm ON g.id = gm.group_id
            WHERE gm.user_id = $1 AND g.is_active = true
            ORDER BY gm.joined_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Get a user's membership in a group.
    pub async fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_group_membership");
        let result = sqlx::query_as::<_, GroupMembershipEntity>(
            r#"
            SELECT id, group_id, user_id, joined_at
            FROM group_memberships
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Check whether a user is a member of a group.
    pub async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("check_is_member");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM group_memberships
                WHERE group_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Check whether a user is the group's admin (its creator).
    pub async fn is_admin(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("check_is_admin");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM groups
                WHERE id = $1 AND created_by = $2 AND is_active = true
            )
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Add a member to a group directly (admin action, bypasses invites).
    ///
    /// A duplicate insert surfaces as a unique violation; callers map it to
    /// a conflict error.
    pub async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<GroupMembershipEntity, sqlx::Error> {
        let timer = QueryTimer::new("add_group_member");
        let result = sqlx::query_as::<_, GroupMembershipEntity>(
            r#"
            INSERT INTO group_memberships (group_id, user_id)
            VALUES ($1, $2)
            RETURNING id, group_id, user_id, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove a member from a group.
    ///
    /// Callers must block removal of the group creator before calling this.
    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("remove_group_member");
        let result = sqlx::query(
            r#"
            DELETE FROM group_memberships
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// List members of a group with user display info, oldest first.
    pub async fn list_members(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<MemberWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_group_members");
        let result = sqlx::query_as::<_, MemberWithUserEntity>(
            r#"
            SELECT gm.user_id, u.name, u.email, gm.joined_at
            FROM group_memberships gm
            JOIN users u ON gm.user_id = u.id
            WHERE gm.group_id = $1
            ORDER BY gm.joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count members of a group.
    pub async fn count_members(&self, group_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_group_members");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM group_memberships WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Soft delete a group.
    pub async fn delete_group(&self, group_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_group");
        let result = sqlx::query(
            r#"
            UPDATE groups
            SET is_active = false, updated_at = NOW()
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(group_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    // GroupRepository tests require a database connection and are covered by
    // the integration tests in crates/api/tests.
}
