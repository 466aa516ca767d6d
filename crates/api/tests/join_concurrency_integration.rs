//! Concurrency tests for invite redemption.
//!
//! These drive `InviteRepository::redeem` directly with many tasks racing on
//! one token and assert the admission bound holds exactly.
//!
//! Requires a running PostgreSQL instance; set TEST_DATABASE_URL to enable.

mod common;

use common::{try_test_pool, unique_test_email};
use persistence::repositories::{GroupRepository, InviteRepository, RedeemOutcome};
use sqlx::PgPool;
use uuid::Uuid;

const LOCK_TIMEOUT_MS: u64 = 5000;

async fn insert_user(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(unique_test_email())
        .execute(pool)
        .await
        .expect("Failed to insert user");
    id
}

/// Set up a group with one bounded invite; returns the invite token.
async fn setup_bounded_invite(pool: &PgPool, creator: Uuid, max_uses: i32) -> String {
    let group_repo = GroupRepository::new(pool.clone());
    let invite_repo = InviteRepository::new(pool.clone());

    let group = group_repo
        .create_group("Race group", None, creator, &[])
        .await
        .expect("Failed to create group");

    let token = shared::token::generate_invite_token();
    invite_repo
        .create_invite(group.id, &token, None, Some(max_uses), creator)
        .await
        .expect("Failed to create invite");

    token
}

/// Redeem `token` once per user concurrently and collect the outcomes.
async fn race_redeem(pool: &PgPool, token: &str, users: Vec<Uuid>) -> Vec<RedeemOutcome> {
    let mut handles = Vec::with_capacity(users.len());
    for user_id in users {
        let repo = InviteRepository::new(pool.clone());
        let token = token.to_string();
        handles.push(tokio::spawn(async move {
            repo.redeem(&token, user_id, LOCK_TIMEOUT_MS).await
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await.unwrap().expect("redeem returned an error"));
    }
    outcomes
}

fn count_joined(outcomes: &[RedeemOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| matches!(o, RedeemOutcome::Joined { .. }))
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_single_use_invite_admits_exactly_one_of_ten() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let creator = insert_user(&pool, "Creator").await;
    let token = setup_bounded_invite(&pool, creator, 1).await;

    let mut users = Vec::new();
    for i in 0..10 {
        users.push(insert_user(&pool, &format!("Racer {}", i)).await);
    }

    let outcomes = race_redeem(&pool, &token, users).await;

    assert_eq!(count_joined(&outcomes), 1);
    for outcome in &outcomes {
        assert!(
            matches!(
                outcome,
                RedeemOutcome::Joined { .. }
                    | RedeemOutcome::Rejected(
                        domain::services::invite_policy::InviteRejection::Exhausted
                    )
            ),
            "unexpected outcome: {:?}",
            outcome
        );
    }

    // Counter and membership rows agree with the admission bound
    let invite_repo = InviteRepository::new(pool.clone());
    let invite = invite_repo
        .find_by_token(&token)
        .await
        .unwrap()
        .expect("invite should exist");
    assert_eq!(invite.current_uses, 1);

    let group_repo = GroupRepository::new(pool.clone());
    let member_count = group_repo.count_members(invite.group_id).await.unwrap();
    assert_eq!(member_count, 2); // creator + the one winner
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_three_use_invite_admits_exactly_three_of_five() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let creator = insert_user(&pool, "Creator").await;
    let token = setup_bounded_invite(&pool, creator, 3).await;

    let mut users = Vec::new();
    for i in 0..5 {
        users.push(insert_user(&pool, &format!("Racer {}", i)).await);
    }

    let outcomes = race_redeem(&pool, &token, users).await;

    assert_eq!(count_joined(&outcomes), 3);

    let invite_repo = InviteRepository::new(pool.clone());
    let invite = invite_repo
        .find_by_token(&token)
        .await
        .unwrap()
        .expect("invite should exist");
    assert_eq!(invite.current_uses, 3);

    let group_repo = GroupRepository::new(pool.clone());
    let member_count = group_repo.count_members(invite.group_id).await.unwrap();
    assert_eq!(member_count, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_user_racing_joins_once() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let creator = insert_user(&pool, "Creator").await;
    let token = setup_bounded_invite(&pool, creator, 10).await;
    let user = insert_user(&pool, "Eager").await;

    let outcomes = race_redeem(&pool, &token, vec![user; 5]).await;

    assert_eq!(count_joined(&outcomes), 1);
    let already = outcomes
        .iter()
        .filter(|o| matches!(o, RedeemOutcome::AlreadyMember))
        .count();
    assert_eq!(already, 4);

    // Only the winning attempt consumed a use
    let invite_repo = InviteRepository::new(pool.clone());
    let invite = invite_repo
        .find_by_token(&token)
        .await
        .unwrap()
        .expect("invite should exist");
    assert_eq!(invite.current_uses, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_lock_timeout_yields_busy_not_error() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let creator = insert_user(&pool, "Creator").await;
    let token = setup_bounded_invite(&pool, creator, 100).await;
    let blocked_user = insert_user(&pool, "Blocked").await;

    // Hold the invite row lock in a raw transaction
    let mut holder = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM group_invites WHERE token = $1 FOR UPDATE")
        .bind(&token)
        .fetch_one(&mut *holder)
        .await
        .unwrap();

    // A redeem with a tiny lock timeout gives up as Busy while the lock is held
    let invite_repo = InviteRepository::new(pool.clone());
    let outcome = invite_repo
        .redeem(&token, blocked_user, 100)
        .await
        .expect("redeem should not error on lock timeout");
    assert!(matches!(outcome, RedeemOutcome::Busy));

    holder.rollback().await.unwrap();

    // Once the lock is released the same user joins fine
    let outcome = invite_repo
        .redeem(&token, blocked_user, LOCK_TIMEOUT_MS)
        .await
        .unwrap();
    assert!(matches!(outcome, RedeemOutcome::Joined { .. }));
}
